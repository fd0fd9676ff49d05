// src/document/units.rs

//! siunitx commands for persisted units

use crate::db::models::{Unit, UnitKind};
use crate::markup::escape_latex;

/// Macro name for a free-text unit, without the backslash
///
/// ASCII letters of the LaTeX code, or of the symbol if the code has none,
/// or `customunit` as a last resort.
pub fn unit_macro_name(unit: &Unit) -> String {
    let letters = |s: &str| -> String { s.chars().filter(char::is_ascii_alphabetic).collect() };

    let name = letters(&unit.latex_code);
    if !name.is_empty() {
        return name;
    }
    let name = letters(&unit.symbol);
    if !name.is_empty() {
        return name;
    }
    "customunit".to_string()
}

/// Command used inside siunitx macros for `unit`
pub fn unit_command(unit: &Unit) -> String {
    match unit.kind {
        UnitKind::Si if !unit.latex_code.is_empty() => unit.latex_code.clone(),
        UnitKind::Si => escape_latex(&unit.symbol),
        UnitKind::Text => format!("\\{}", unit_macro_name(unit)),
    }
}

/// `\DeclareSIUnit` statements for every distinct free-text unit
///
/// Units sharing a macro name are declared once, with the first symbol.
pub fn unit_definitions<'a>(units: impl IntoIterator<Item = &'a Unit>) -> Vec<String> {
    let mut declared: Vec<String> = Vec::new();
    let mut lines = Vec::new();

    for unit in units.into_iter().filter(|u| u.kind == UnitKind::Text) {
        let name = unit_macro_name(unit);
        if declared.contains(&name) {
            continue;
        }
        lines.push(format!(
            "\\DeclareSIUnit{{\\{}}}{{{}}}",
            name,
            escape_latex(&unit.symbol)
        ));
        declared.push(name);
    }

    lines
}
