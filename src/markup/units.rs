// src/markup/units.rs

//! Unit resolution table
//!
//! Maps unit symbols to the LaTeX command used inside siunitx macros.
//! Persisted unit definitions are registered under their original symbol
//! and its lowercase form; a small set of defaults is added for symbols the
//! database does not define.

use crate::db::models::Unit;
use std::collections::HashMap;

/// Defaults that resolve even with an empty unit table in the database
const DEFAULT_UNITS: &[(&str, &str)] = &[
    ("g", "\\gram"),
    ("kg", "\\kilogram"),
    ("ml", "\\milli\\liter"),
    ("l", "\\liter"),
];

/// Symbol → LaTeX command lookup
#[derive(Debug, Clone)]
pub struct UnitTable {
    /// Exact-case symbols from persisted units
    exact: HashMap<String, String>,
    /// Lowercased symbols (persisted first, then defaults)
    folded: HashMap<String, String>,
}

impl UnitTable {
    /// Table containing only the static defaults
    pub fn new() -> Self {
        Self::from_units(&[])
    }

    /// Build the table from persisted unit records
    ///
    /// Units without a LaTeX code are skipped. When two persisted symbols
    /// fold to the same lowercase key, the first one registered keeps it;
    /// defaults never replace a persisted entry.
    pub fn from_units(units: &[Unit]) -> Self {
        let mut exact = HashMap::new();
        let mut folded = HashMap::new();

        for unit in units {
            if unit.symbol.is_empty() || unit.latex_code.is_empty() {
                continue;
            }
            exact
                .entry(unit.symbol.clone())
                .or_insert_with(|| unit.latex_code.clone());
            folded
                .entry(unit.symbol.to_lowercase())
                .or_insert_with(|| unit.latex_code.clone());
        }

        for (symbol, code) in DEFAULT_UNITS {
            folded
                .entry((*symbol).to_string())
                .or_insert_with(|| (*code).to_string());
        }

        Self { exact, folded }
    }

    /// Look up a symbol: exact case first, then case-insensitively
    pub fn lookup(&self, symbol: &str) -> Option<&str> {
        self.exact
            .get(symbol)
            .or_else(|| self.folded.get(&symbol.to_lowercase()))
            .map(String::as_str)
    }

    /// Resolve a symbol, falling back to the symbol itself on a miss
    pub fn resolve<'a>(&'a self, symbol: &'a str) -> &'a str {
        self.lookup(symbol).unwrap_or(symbol)
    }

    /// Number of distinct case-folded symbols
    pub fn len(&self) -> usize {
        self.folded.len()
    }

    pub fn is_empty(&self) -> bool {
        self.folded.is_empty()
    }
}

impl Default for UnitTable {
    fn default() -> Self {
        Self::new()
    }
}
