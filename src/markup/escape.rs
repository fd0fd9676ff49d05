// src/markup/escape.rs

//! Escaping for the LaTeX target
//!
//! User text must pass through [`escape_latex`] exactly once before it is
//! transpiled. [`EscapedText`] is the only way to feed text into the typeset
//! rendering helpers, so a field cannot be escaped twice on that path.

use std::fmt;

/// Replacement for a single special character, or `None` if it is literal-safe
fn replacement(c: char) -> Option<&'static str> {
    match c {
        '\\' => Some("\\textbackslash{}"),
        '{' => Some("\\{"),
        '}' => Some("\\}"),
        '%' => Some("\\%"),
        '$' => Some("\\$"),
        '&' => Some("\\&"),
        '#' => Some("\\#"),
        '_' => Some("\\_"),
        '^' => Some("\\textasciicircum{}"),
        '~' => Some("\\textasciitilde{}"),
        _ => None,
    }
}

/// Escape LaTeX special characters in a single pass
///
/// Not idempotent: escaping already escaped text changes it again.
pub fn escape_latex(text: &str) -> String {
    let mut out = String::with_capacity(text.len() + text.len() / 8);
    for c in text.chars() {
        match replacement(c) {
            Some(rep) => out.push_str(rep),
            None => out.push(c),
        }
    }
    out
}

/// Text that has been escaped for LaTeX exactly once
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EscapedText(String);

impl EscapedText {
    /// Escape raw user text
    pub fn new(raw: &str) -> Self {
        Self(escape_latex(raw))
    }

    /// Escape optional text, mapping `None` to an empty string
    pub fn from_option(raw: Option<&str>) -> Self {
        raw.map(Self::new).unwrap_or_default()
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for EscapedText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}
