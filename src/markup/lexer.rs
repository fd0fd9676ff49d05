// src/markup/lexer.rs

//! Tokenizer for recipe markup
//!
//! Splits free text into typed tokens in a single left-to-right scan.
//! Quantity brackets, emoticons and unit measures become opaque tokens, so
//! nothing emitted for them can be matched again by later rules.

use super::Target;
use super::emoticon::EmoticonTable;
use super::quantity::{Quantity, parse_quantity};

/// Short units that get a non-breaking separator after a number
///
/// Longest first so `kg` is preferred over `g`.
const SHORT_UNITS: &[&str] = &["kg", "ml", "g", "l"];

/// Escaped caret as produced by the LaTeX escaping layer
const ESCAPED_CARET: &str = "\\textasciicircum{}";
/// Escaped underscore as produced by the LaTeX escaping layer
const ESCAPED_UNDERSCORE: &str = "\\_";

/// Paired inline delimiters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delim {
    Bold,
    Italic,
    Sup,
    Sub,
    Quote,
}

/// A lexical token borrowing from the source text
#[derive(Debug, Clone, PartialEq)]
pub enum Token<'a> {
    /// Plain text run
    Text(&'a str),
    /// Successfully parsed `[...]` quantity
    Quantity(Quantity),
    /// Emoticon shortcode resolved to its codepoint
    Emoticon(String),
    /// Span delimiter with its source spelling
    Delim(Delim, &'a str),
    /// Number followed by a short unit (`200 g`)
    Measure { value: &'a str, unit: &'a str },
    /// Number followed by `°C`
    Temperature(&'a str),
    /// Standalone `--`
    EnDash,
    /// Run of newlines (1 = soft break, 2+ = paragraph break)
    Break(usize),
}

/// Tokenize `src` for `target`
///
/// `src` is expected to be trimmed already; for LaTeX it must already be
/// escaped.
pub fn tokenize<'a>(src: &'a str, target: Target, emoticons: &EmoticonTable) -> Vec<Token<'a>> {
    let mut lexer = Lexer {
        src,
        target,
        emoticons,
        tokens: Vec::new(),
    };
    lexer.lex(0, src.len());
    lexer.tokens
}

struct Lexer<'a, 'e> {
    src: &'a str,
    target: Target,
    emoticons: &'e EmoticonTable,
    tokens: Vec<Token<'a>>,
}

impl<'a> Lexer<'a, '_> {
    fn lex(&mut self, start: usize, end: usize) {
        let src = self.src;
        let mut pos = start;
        let mut run = start;

        while pos < end {
            let rest = &src[pos..end];
            let Some(c) = rest.chars().next() else {
                break;
            };

            // Newlines
            if c == '\n' || c == '\r' {
                self.flush(run, pos);
                let mut count = 0;
                while pos < end {
                    let r = &src[pos..end];
                    if r.starts_with("\r\n") {
                        pos += 2;
                    } else if r.starts_with('\n') || r.starts_with('\r') {
                        pos += 1;
                    } else {
                        break;
                    }
                    count += 1;
                }
                self.tokens.push(Token::Break(count));
                run = pos;
                continue;
            }

            // Quantity brackets
            if c == '[' {
                if let Some(close) = rest[1..].find(']').map(|i| pos + 1 + i) {
                    if close > pos + 1 {
                        self.flush(run, pos);
                        let inner = &src[pos + 1..close];
                        match parse_quantity(inner) {
                            Some(quantity) => self.tokens.push(Token::Quantity(quantity)),
                            // Brackets are dropped, the content is ordinary text
                            None => self.lex(pos + 1, close),
                        }
                        pos = close + 1;
                        run = pos;
                        continue;
                    }
                }
                pos += 1;
                continue;
            }

            // Emoticons (longest code first)
            if let Some(emo) = self.emoticons.match_at(&src[..end], pos) {
                self.flush(run, pos);
                self.tokens.push(Token::Emoticon(emo.codepoint.clone()));
                pos += emo.code.len();
                run = pos;
                continue;
            }

            // Delimiters
            if let Some((delim, len)) = self.delimiter_at(rest) {
                self.flush(run, pos);
                self.tokens.push(Token::Delim(delim, &src[pos..pos + len]));
                pos += len;
                run = pos;
                continue;
            }

            // Dash runs: exactly two hyphens form an en-dash
            if c == '-' {
                let len = rest.len() - rest.trim_start_matches('-').len();
                if len == 2 {
                    self.flush(run, pos);
                    self.tokens.push(Token::EnDash);
                    pos += 2;
                    run = pos;
                } else {
                    pos += len;
                }
                continue;
            }

            // Numbers with a trailing unit or temperature
            if c.is_ascii_digit() {
                let num_len = number_len(rest);
                if let Some((token, consumed)) = self.measure_at(pos, num_len, end) {
                    self.flush(run, pos);
                    self.tokens.push(token);
                    pos += consumed;
                    run = pos;
                } else {
                    pos += num_len;
                }
                continue;
            }

            pos += c.len_utf8();
        }

        self.flush(run, pos.min(end));
    }

    fn flush(&mut self, start: usize, end: usize) {
        if end > start {
            self.tokens.push(Token::Text(&self.src[start..end]));
        }
    }

    fn delimiter_at(&self, rest: &str) -> Option<(Delim, usize)> {
        if self.target == Target::Latex {
            if rest.starts_with(ESCAPED_CARET) {
                return Some((Delim::Sup, ESCAPED_CARET.len()));
            }
            if rest.starts_with(ESCAPED_UNDERSCORE) {
                return Some((Delim::Sub, ESCAPED_UNDERSCORE.len()));
            }
        }

        if rest.starts_with("**") {
            return Some((Delim::Bold, 2));
        }
        match rest.chars().next()? {
            '*' => Some((Delim::Italic, 1)),
            '^' => Some((Delim::Sup, 1)),
            '_' => Some((Delim::Sub, 1)),
            '"' => Some((Delim::Quote, 1)),
            _ => None,
        }
    }

    /// Recognize `<number> [spaces] unit` starting at `pos`
    ///
    /// Returns the token and the number of bytes it covers.
    fn measure_at(&self, pos: usize, num_len: usize, end: usize) -> Option<(Token<'a>, usize)> {
        let src = self.src;
        let value = &src[pos..pos + num_len];
        let after_num = &src[pos + num_len..end];
        let tail = after_num.trim_start_matches([' ', '\t', '\u{a0}']);
        let gap = after_num.len() - tail.len();

        if let Some(after) = tail.strip_prefix("°C") {
            if !starts_alphanumeric(after) {
                return Some((Token::Temperature(value), num_len + gap + "°C".len()));
            }
        }

        SHORT_UNITS.iter().find_map(|unit| {
            let after = tail.strip_prefix(unit)?;
            if starts_alphanumeric(after) {
                return None;
            }
            let start = pos + num_len + gap;
            Some((
                Token::Measure {
                    value,
                    unit: &src[start..start + unit.len()],
                },
                num_len + gap + unit.len(),
            ))
        })
    }
}

/// Length of the number at the start of `s` (`\d+([.,]\d+)?`)
fn number_len(s: &str) -> usize {
    let int_len = s.len() - s.trim_start_matches(|c: char| c.is_ascii_digit()).len();
    let rest = &s[int_len..];
    let mut chars = rest.chars();
    match (chars.next(), chars.next()) {
        (Some('.' | ','), Some(d)) if d.is_ascii_digit() => {
            let frac = &rest[1..];
            let frac_len = frac.len() - frac.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            int_len + 1 + frac_len
        }
        _ => int_len,
    }
}

fn starts_alphanumeric(s: &str) -> bool {
    s.chars().next().is_some_and(char::is_alphanumeric)
}
