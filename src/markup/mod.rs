// src/markup/mod.rs

//! Recipe markup transpiler
//!
//! Free text in recipes uses a small markup language: `**bold**`, `*italic*`,
//! `^sup^`, `_sub_`, `"quotes"`, `[quantity]` brackets, emoticon shortcodes
//! and plain line breaks. This module turns it into HTML for the live view
//! or into LaTeX for the typeset document.
//!
//! Text is tokenized once, paired into spans, then rendered per target. The
//! HTML output additionally goes through a Markdown pass.
//!
//! LaTeX input must be escaped with [`escape_latex`] exactly once before it
//! is transpiled; [`Transpiler::render_typeset`] enforces this through
//! [`EscapedText`].

mod emoticon;
mod escape;
mod inline;
mod lexer;
mod quantity;
mod render;
mod units;

pub use emoticon::{Emoticon, EmoticonTable};
pub use escape::{EscapedText, escape_latex};
pub use quantity::{
    Amount, HTML_THIN_SPACE, Quantity, QuantityKind, format_ingredient_quantity, format_quantity,
    parse_quantity,
};
pub use units::UnitTable;

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::LazyLock;

static DEFAULT_EMOTICONS: LazyLock<EmoticonTable> = LazyLock::new(EmoticonTable::default);

/// Output flavour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    Html,
    Latex,
}

impl Target {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Html => "html",
            Self::Latex => "latex",
        }
    }

    /// Decimal separator for displayed amounts (German locale)
    pub fn decimal_separator(&self) -> &'static str {
        ","
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "html" => Ok(Self::Html),
            "latex" | "tex" => Ok(Self::Latex),
            other => Err(Error::ConfigError(format!("unknown render target: {}", other))),
        }
    }
}

/// Transpiler bound to a unit table and an emoticon table
#[derive(Debug, Clone, Default)]
pub struct Transpiler {
    units: UnitTable,
    emoticons: EmoticonTable,
}

impl Transpiler {
    pub fn new(units: UnitTable) -> Self {
        Self {
            units,
            emoticons: EmoticonTable::default(),
        }
    }

    /// Replace the emoticon table
    pub fn with_emoticons(mut self, emoticons: EmoticonTable) -> Self {
        self.emoticons = emoticons;
        self
    }

    pub fn units(&self) -> &UnitTable {
        &self.units
    }

    /// Transpile `text` for `target`
    pub fn render(&self, text: &str, target: Target) -> String {
        render_with(text, target, &self.units, &self.emoticons)
    }

    /// Transpile for the live view
    pub fn render_html(&self, text: &str) -> String {
        self.render(text, Target::Html)
    }

    /// Transpile already escaped text for the typeset document
    pub fn render_typeset(&self, text: &EscapedText) -> String {
        self.render(text.as_str(), Target::Latex)
    }

    /// Transpile a short field (ingredient item, note) for the live view
    ///
    /// Same as [`render_html`](Self::render_html) without the wrapping
    /// paragraph when the result is a single paragraph.
    pub fn render_inline_html(&self, text: &str) -> String {
        let html = self.render_html(text);
        match html
            .strip_prefix("<p>")
            .and_then(|rest| rest.strip_suffix("</p>\n"))
        {
            Some(inner) if !inner.contains("<p>") => inner.to_string(),
            _ => html,
        }
    }
}

/// Transpile with the built-in emoticon table
///
/// Empty input yields an empty string. Text is trimmed and line endings are
/// normalized before tokenizing.
pub fn render(text: &str, target: Target, units: &UnitTable) -> String {
    render_with(text, target, units, &DEFAULT_EMOTICONS)
}

fn render_with(text: &str, target: Target, units: &UnitTable, emoticons: &EmoticonTable) -> String {
    let text = text.trim();
    if text.is_empty() {
        return String::new();
    }

    let tokens = lexer::tokenize(text, target, emoticons);
    let nodes = inline::parse(tokens);
    let body = render::render_nodes(&nodes, target, units);

    match target {
        Target::Html => render::markdown_to_html(&body),
        Target::Latex => body,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn html(text: &str) -> String {
        render(text, Target::Html, &UnitTable::default())
    }

    fn latex(text: &str) -> String {
        render(&escape_latex(text), Target::Latex, &UnitTable::default())
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(html(""), "");
        assert_eq!(html("   \n "), "");
        assert_eq!(latex(""), "");
    }

    #[test]
    fn test_bold_both_targets() {
        assert_eq!(html("**Mix** well"), "<p><strong>Mix</strong> well</p>\n");
        assert_eq!(latex("**Mix** well"), "\\textbf{Mix} well");
    }

    #[test]
    fn test_italic_sup_sub() {
        assert_eq!(latex("*fein* H_2_O m^2^"), "\\textit{fein} H\\textsubscript{2}O m\\textsuperscript{2}");
        let out = html("*fein* H_2_O m^2^");
        assert!(out.contains("<em>fein</em>"));
        assert!(out.contains("H<sub>2</sub>O"));
        assert!(out.contains("m<sup>2</sup>"));
    }

    #[test]
    fn test_quotes_and_dash() {
        assert_eq!(latex("\"gut\" -- sehr"), "\\enquote{gut} -- sehr");
        let out = html("\"gut\" -- sehr");
        assert!(out.contains('\u{ab}'), "{}", out);
        assert!(out.contains('\u{bb}'));
        assert!(out.contains('\u{2013}'));
    }

    #[test]
    fn test_quantity_bracket() {
        assert_eq!(latex("Add [2-8.5 g] salt"), "Add \\SIrange{2}{8,5}{\\gram} salt");
        assert_eq!(latex("[a pinch]"), "a pinch");
        let out = html("Add [8g] sugar");
        assert!(out.contains("8\u{202F}g"), "{}", out);
    }

    #[test]
    fn test_emoticons() {
        assert_eq!(latex("Vorsicht !!"), "Vorsicht \\picon{E4E2}");
        let out = html("lecker :)");
        assert!(out.contains("<span class=\"ph-emo\">"), "{}", out);
        assert!(out.contains('\u{E436}'));
    }

    #[test]
    fn test_line_breaks() {
        assert_eq!(latex("a\nb"), "a\\newline b");
        assert_eq!(latex("a\r\n\r\nb"), "a\\addlinespace[0.5em] b");
        assert!(html("a\nb").contains("<br>"));
        assert!(html("a\n\nb").contains("<br class=\"mb-3\">"));
    }

    #[test]
    fn test_html_block_syntax_survives_breaks() {
        let table = html("| a | b |\n|---|---|\n| 1 | 2 |");
        assert!(table.starts_with("<table>"), "{}", table);
        assert!(table.contains("<td>2</td>"));
        assert!(!table.contains("<br"));

        assert_eq!(
            html("```\nline one\nline two\n```"),
            "<pre><code>line one\nline two\n</code></pre>\n"
        );
        assert_eq!(html("a\n\n\nb"), "<p>a<br class=\"mb-3\">\nb</p>\n");
    }

    #[test]
    fn test_html_raw_markup_is_escaped() {
        let out = html("**Mix** <script>alert(1)</script>");
        assert!(out.starts_with("<p><strong>Mix</strong> "), "{}", out);
        assert!(out.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
    }

    #[test]
    fn test_unit_spacing_and_temperature() {
        assert_eq!(latex("200 g Mehl bei 180 °C"), "200\\,g Mehl bei \\qty{180}{\\degreeCelsius}");
        assert_eq!(latex("5 lemons"), "5 lemons");
    }

    #[test]
    fn test_escaped_specials_survive() {
        assert_eq!(latex("50% & mehr"), "50\\% \\& mehr");
        assert_eq!(latex("a\\b"), "a\\textbackslash{}b");
    }

    #[test]
    fn test_unclosed_delimiter_is_literal() {
        assert_eq!(latex("5 * 3"), "5 * 3");
        assert_eq!(latex("**a\nb**"), "**a\\newline b**");
    }

    #[test]
    fn test_emoticon_inside_bold_not_rematched() {
        assert_eq!(latex("**:)**"), "\\textbf{\\picon{E436}}");
    }

    #[test]
    fn test_transpiler_uses_persisted_units() {
        use crate::db::models::{Unit, UnitKind};
        let units = UnitTable::from_units(&[Unit::new(
            "Esslöffel".into(),
            "EL".into(),
            "EL".into(),
            UnitKind::Text,
        )]);
        let t = Transpiler::new(units);
        assert_eq!(t.render_typeset(&EscapedText::new("[2 el]")), "\\SI{2}{EL}");
    }

    #[test]
    fn test_inline_html_drops_single_paragraph() {
        let t = Transpiler::default();
        assert_eq!(t.render_inline_html("*fein* gehackt"), "<em>fein</em> gehackt");
        assert_eq!(t.render_inline_html(""), "");
        let table = "| a |\n|---|\n| 1 |";
        assert!(t.render_inline_html(table).starts_with("<table>"));
    }

    #[test]
    fn test_target_from_str() {
        assert_eq!("html".parse::<Target>().unwrap(), Target::Html);
        assert_eq!("LaTeX".parse::<Target>().unwrap(), Target::Latex);
        assert!("pdf".parse::<Target>().is_err());
    }
}
