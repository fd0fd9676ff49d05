// src/markup/emoticon.rs

//! Emoticon shortcodes mapped to icon-font codepoints
//!
//! Codepoints refer to the Phosphor icon font. The HTML target renders them
//! as character references, the LaTeX target through the `\picon` macro
//! defined in the document template.

/// Built-in shortcodes
const DEFAULT_EMOTICONS: &[(&str, &str)] = &[
    (":)", "E436"),  // smiley
    (":(", "E43E"),  // sad
    (";)", "E666"),  // wink
    ("(y)", "E48E"), // thumbs up
    ("<3", "E2A8"),  // heart
    ("!!", "E4E2"),  // warning
    ("@@", "E19A"),  // clock
    ("!t", "E5CC"),  // thermometer
    ("PP", "E4D6"),  // people
];

/// A single shortcode rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emoticon {
    pub code: String,
    pub codepoint: String,
}

/// Shortcode table, kept sorted longest code first
#[derive(Debug, Clone)]
pub struct EmoticonTable {
    entries: Vec<Emoticon>,
}

impl EmoticonTable {
    /// Empty table
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add or replace a shortcode
    pub fn with(mut self, code: &str, codepoint: &str) -> Self {
        self.insert(code, codepoint);
        self
    }

    /// Add or replace a shortcode in place
    pub fn insert(&mut self, code: &str, codepoint: &str) {
        if code.is_empty() {
            return;
        }
        self.entries.retain(|e| e.code != code);
        self.entries.push(Emoticon {
            code: code.to_string(),
            codepoint: codepoint.to_string(),
        });
        self.entries
            .sort_by(|a, b| b.code.chars().count().cmp(&a.code.chars().count()));
    }

    /// Longest shortcode that starts at byte offset `pos` of `text`
    ///
    /// A code beginning (ending) with an alphanumeric character only matches
    /// if the text before (after) it is not alphanumeric, so `PP` does not
    /// fire inside `SHOPPING`.
    pub fn match_at(&self, text: &str, pos: usize) -> Option<&Emoticon> {
        let rest = &text[pos..];
        let before = text[..pos].chars().next_back();

        self.entries.iter().find(|e| {
            if !rest.starts_with(e.code.as_str()) {
                return false;
            }
            let first = e.code.chars().next();
            let last = e.code.chars().next_back();
            let after = rest[e.code.len()..].chars().next();

            let open_ok = !(first.is_some_and(char::is_alphanumeric)
                && before.is_some_and(char::is_alphanumeric));
            let close_ok = !(last.is_some_and(char::is_alphanumeric)
                && after.is_some_and(char::is_alphanumeric));
            open_ok && close_ok
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for EmoticonTable {
    fn default() -> Self {
        DEFAULT_EMOTICONS
            .iter()
            .fold(Self::empty(), |table, (code, cp)| table.with(code, cp))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_longest_match_wins() {
        let table = EmoticonTable::empty()
            .with("!", "0001")
            .with("!!", "E4E2")
            .with("!t", "E5CC");

        assert_eq!(table.match_at("!!", 0).unwrap().codepoint, "E4E2");
        assert_eq!(table.match_at("!t ", 0).unwrap().codepoint, "E5CC");
        assert_eq!(table.match_at("! ", 0).unwrap().codepoint, "0001");
    }

    #[test]
    fn test_word_boundary_for_alphanumeric_codes() {
        let table = EmoticonTable::default();
        assert!(table.match_at("SHOPPING", 3).is_none());
        let text = "für 4 PP";
        let pos = text.find("PP").unwrap();
        assert!(table.match_at(text, pos).is_some());
        // "!t" followed by letters is part of a word
        assert!(table.match_at("!toll", 0).is_none());
        assert!(table.match_at("!t", 0).is_some());
    }

    #[test]
    fn test_default_table() {
        let table = EmoticonTable::default();
        assert_eq!(table.len(), 9);
        assert_eq!(table.match_at("<3", 0).unwrap().codepoint, "E2A8");
        assert_eq!(table.match_at("(y)", 0).unwrap().codepoint, "E48E");
    }

    #[test]
    fn test_insert_replaces() {
        let mut table = EmoticonTable::default();
        table.insert(":)", "FFFF");
        assert_eq!(table.len(), 9);
        assert_eq!(table.match_at(":)", 0).unwrap().codepoint, "FFFF");
    }
}
