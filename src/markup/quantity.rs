// src/markup/quantity.rs

//! Quantity grammar for inline bracket expressions and ingredient fields
//!
//! Recognized forms (text between `[` and `]`):
//! - Single: `8g`, `8,5 ml`, `- 450`
//! - Range: `2-8.5 g`
//! - Multiplication: `4x6 cm`, `4 × 6 cm`
//!
//! Both `.` and `,` are accepted as decimal separators. Anything that does
//! not match is handed back unchanged; the parser never fails.

use super::Target;
use super::units::UnitTable;
use regex::Regex;
use std::sync::LazyLock;

/// Multiplication form: `num [xX×] num [unit]`
static PRODUCT_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:[.,]\d+)?)\s*[xX×]\s*(\d+(?:[.,]\d+)?)\s*([\p{L}°]+)?$")
        .expect("product pattern is valid")
});

/// Range or single form: `num[-num] [unit]`
static RANGE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d+(?:[.,]\d+)?)\s*(?:-\s*(\d+(?:[.,]\d+)?))?\s*([\p{L}°]+)?$")
        .expect("range pattern is valid")
});

/// Narrow no-break space used between value and unit in HTML
pub const HTML_THIN_SPACE: &str = "&#x202F;";

/// A decimal amount kept in its textual form with `.` as separator
#[derive(Debug, Clone, PartialEq)]
pub struct Amount(String);

impl Amount {
    /// Normalize a matched number (`8,5` or `8.5`)
    fn parse(raw: &str) -> Self {
        Self(raw.replace(',', "."))
    }

    /// Build an amount from a stored floating point value
    ///
    /// Trailing zeros are dropped (`2.0` → `2`, `8.50` → `8.5`).
    pub fn from_f64(value: f64) -> Self {
        let mut text = format!("{:.6}", value);
        if text.contains('.') {
            text = text.trim_end_matches('0').trim_end_matches('.').to_string();
        }
        if text == "-0" {
            text = "0".to_string();
        }
        Self(text)
    }

    /// Numeric value of the amount
    pub fn value(&self) -> f64 {
        self.0.parse().unwrap_or(0.0)
    }

    /// Canonical text with `.` separator
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Text using the decimal separator of `target`
    pub fn display(&self, target: Target) -> String {
        self.0.replace('.', target.decimal_separator())
    }
}

/// Shape of a parsed quantity
#[derive(Debug, Clone, PartialEq)]
pub enum QuantityKind {
    Single(Amount),
    Range(Amount, Amount),
    Product(Amount, Amount),
}

/// A parsed quantity with its optional unit token (original casing)
#[derive(Debug, Clone, PartialEq)]
pub struct Quantity {
    pub kind: QuantityKind,
    pub unit: Option<String>,
}

impl Quantity {
    /// Quantity built from structured ingredient fields
    ///
    /// Returns `None` when neither bound is present.
    pub fn from_bounds(min: Option<f64>, max: Option<f64>, unit: Option<&str>) -> Option<Self> {
        let kind = match (min, max) {
            (Some(min), Some(max)) if min == max => QuantityKind::Single(Amount::from_f64(min)),
            (Some(min), Some(max)) => {
                QuantityKind::Range(Amount::from_f64(min), Amount::from_f64(max))
            }
            (Some(value), None) | (None, Some(value)) => {
                QuantityKind::Single(Amount::from_f64(value))
            }
            (None, None) => return None,
        };

        Some(Self {
            kind,
            unit: unit.filter(|u| !u.is_empty()).map(str::to_string),
        })
    }

    /// Format for `target`, resolving the unit through `units`
    ///
    /// HTML keeps the unit exactly as written; LaTeX substitutes the
    /// resolved macro (or the literal token on a miss).
    pub fn format(&self, target: Target, units: &UnitTable) -> String {
        match target {
            Target::Html => self.format_html(self.unit.as_deref()),
            Target::Latex => {
                let unit = self.unit.as_deref().map(|u| units.resolve(u));
                self.format_latex(unit.as_deref())
            }
        }
    }

    /// HTML form with an explicit unit string
    pub fn format_html(&self, unit: Option<&str>) -> String {
        let target = Target::Html;
        let body = match &self.kind {
            QuantityKind::Single(v) => v.display(target),
            QuantityKind::Range(a, b) => {
                format!("{}&ndash;{}", a.display(target), b.display(target))
            }
            QuantityKind::Product(a, b) => format!(
                "{}{sep}×{sep}{}",
                a.display(target),
                b.display(target),
                sep = HTML_THIN_SPACE
            ),
        };

        match unit {
            Some(unit) if !unit.is_empty() => format!("{}{}{}", body, HTML_THIN_SPACE, unit),
            _ => body,
        }
    }

    /// LaTeX (siunitx) form with an already resolved unit command
    pub fn format_latex(&self, unit: Option<&str>) -> String {
        let target = Target::Latex;
        let unit = unit.filter(|u| !u.is_empty());

        match (&self.kind, unit) {
            (QuantityKind::Single(v), Some(unit)) => {
                format!("\\SI{{{}}}{{{}}}", v.display(target), unit)
            }
            (QuantityKind::Single(v), None) => format!("\\num{{{}}}", v.display(target)),
            (QuantityKind::Range(a, b), Some(unit)) => format!(
                "\\SIrange{{{}}}{{{}}}{{{}}}",
                a.display(target),
                b.display(target),
                unit
            ),
            (QuantityKind::Range(a, b), None) => format!(
                "\\numrange{{{}}}{{{}}}",
                a.display(target),
                b.display(target)
            ),
            (QuantityKind::Product(a, b), Some(unit)) => format!(
                "\\qtyproduct[product-units = single]{{{} x {}}}{{{}}}",
                a.display(target),
                b.display(target),
                unit
            ),
            (QuantityKind::Product(a, b), None) => format!(
                "\\numproduct{{{} x {}}}",
                a.display(target),
                b.display(target)
            ),
        }
    }
}

/// Parse the inside of a bracket pair
///
/// A hyphen directly in front of the first number is a bullet, not an open
/// range, and is dropped before matching.
pub fn parse_quantity(text: &str) -> Option<Quantity> {
    let mut text = text.trim();
    if let Some(rest) = text.strip_prefix('-') {
        let rest = rest.trim_start();
        if rest.starts_with(|c: char| c.is_ascii_digit()) {
            text = rest;
        }
    }

    if let Some(caps) = PRODUCT_RE.captures(text) {
        return Some(Quantity {
            kind: QuantityKind::Product(Amount::parse(&caps[1]), Amount::parse(&caps[2])),
            unit: caps.get(3).map(|m| m.as_str().to_string()),
        });
    }

    let caps = RANGE_RE.captures(text)?;
    let min = Amount::parse(&caps[1]);
    let kind = match caps.get(2) {
        Some(max) => QuantityKind::Range(min, Amount::parse(max.as_str())),
        None => QuantityKind::Single(min),
    };

    Some(Quantity {
        kind,
        unit: caps.get(3).map(|m| m.as_str().to_string()),
    })
}

/// Parse and format bracket content, returning the input unchanged on a
/// grammar mismatch
pub fn format_quantity(text: &str, target: Target, units: &UnitTable) -> String {
    match parse_quantity(text) {
        Some(quantity) => quantity.format(target, units),
        None => text.to_string(),
    }
}

/// Format structured ingredient fields
///
/// `unit_symbol` is shown in HTML; `unit_command` is placed inside the
/// siunitx macro for LaTeX. Without any amount only the unit remains, set
/// with `\unit` on the LaTeX side.
pub fn format_ingredient_quantity(
    amount_min: Option<f64>,
    amount_max: Option<f64>,
    unit_symbol: Option<&str>,
    unit_command: Option<&str>,
    target: Target,
) -> String {
    let Some(quantity) = Quantity::from_bounds(amount_min, amount_max, unit_symbol) else {
        return match target {
            Target::Html => unit_symbol.unwrap_or_default().to_string(),
            Target::Latex => unit_command
                .or(unit_symbol)
                .filter(|u| !u.is_empty())
                .map(|u| format!("\\unit{{{}}}", u))
                .unwrap_or_default(),
        };
    };

    match target {
        Target::Html => quantity.format_html(unit_symbol),
        Target::Latex => quantity.format_latex(unit_command.or(unit_symbol)),
    }
}
