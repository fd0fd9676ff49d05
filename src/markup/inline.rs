// src/markup/inline.rs

//! Span structure on top of the token stream
//!
//! Delimiters are paired within a single line. An opener only counts if a
//! matching closer follows before the next break and the same delimiter is
//! not already open; otherwise it stays literal text. Spans never cross
//! line breaks.

use super::lexer::{Delim, Token};

/// Parsed inline node
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    /// Any non-delimiter token, or a delimiter that did not pair up
    Leaf(Token<'a>),
    /// Paired delimiters with their content
    Span(Delim, Vec<Node<'a>>),
}

/// Build the node tree for a token stream
pub fn parse(tokens: Vec<Token<'_>>) -> Vec<Node<'_>> {
    let mut parser = Parser {
        tokens,
        pos: 0,
        open: Vec::new(),
    };
    parser.parse_until(None).0
}

struct Parser<'a> {
    tokens: Vec<Token<'a>>,
    pos: usize,
    open: Vec<Delim>,
}

impl<'a> Parser<'a> {
    /// Parse nodes until `closer` is consumed, a break ends the span, or the
    /// stream ends
    ///
    /// The flag reports whether the closer was found.
    fn parse_until(&mut self, closer: Option<Delim>) -> (Vec<Node<'a>>, bool) {
        let mut nodes = Vec::new();

        while self.pos < self.tokens.len() {
            let token = self.tokens[self.pos].clone();

            match token {
                Token::Delim(delim, _) if closer == Some(delim) => {
                    self.pos += 1;
                    return (nodes, true);
                }
                Token::Delim(delim, literal) => {
                    self.pos += 1;
                    if !self.open.contains(&delim) && self.has_closer(delim) {
                        self.open.push(delim);
                        let (children, closed) = self.parse_until(Some(delim));
                        self.open.pop();
                        if closed {
                            nodes.push(Node::Span(delim, children));
                        } else {
                            nodes.push(Node::Leaf(Token::Delim(delim, literal)));
                            nodes.extend(children);
                        }
                    } else {
                        nodes.push(Node::Leaf(Token::Delim(delim, literal)));
                    }
                }
                Token::Break(_) if closer.is_some() => return (nodes, false),
                other => {
                    self.pos += 1;
                    nodes.push(Node::Leaf(other));
                }
            }
        }

        (nodes, closer.is_none())
    }

    /// Whether a `delim` token follows on the current line
    fn has_closer(&self, delim: Delim) -> bool {
        self.tokens[self.pos..]
            .iter()
            .take_while(|t| !matches!(t, Token::Break(_)))
            .any(|t| matches!(t, Token::Delim(d, _) if *d == delim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> Node<'_> {
        Node::Leaf(Token::Text(s))
    }

    #[test]
    fn test_simple_span() {
        let nodes = parse(vec![
            Token::Delim(Delim::Bold, "**"),
            Token::Text("Mix"),
            Token::Delim(Delim::Bold, "**"),
            Token::Text(" well"),
        ]);
        assert_eq!(
            nodes,
            vec![Node::Span(Delim::Bold, vec![text("Mix")]), text(" well")]
        );
    }

    #[test]
    fn test_unclosed_opener_is_literal() {
        let nodes = parse(vec![Token::Delim(Delim::Italic, "*"), Token::Text("a")]);
        assert_eq!(
            nodes,
            vec![Node::Leaf(Token::Delim(Delim::Italic, "*")), text("a")]
        );
    }

    #[test]
    fn test_span_does_not_cross_break() {
        let nodes = parse(vec![
            Token::Delim(Delim::Bold, "**"),
            Token::Text("a"),
            Token::Break(1),
            Token::Text("b"),
            Token::Delim(Delim::Bold, "**"),
        ]);
        assert_eq!(
            nodes,
            vec![
                Node::Leaf(Token::Delim(Delim::Bold, "**")),
                text("a"),
                Node::Leaf(Token::Break(1)),
                text("b"),
                Node::Leaf(Token::Delim(Delim::Bold, "**")),
            ]
        );
    }

    #[test]
    fn test_nested_spans() {
        let nodes = parse(vec![
            Token::Delim(Delim::Bold, "**"),
            Token::Text("a "),
            Token::Delim(Delim::Italic, "*"),
            Token::Text("b"),
            Token::Delim(Delim::Italic, "*"),
            Token::Delim(Delim::Bold, "**"),
        ]);
        assert_eq!(
            nodes,
            vec![Node::Span(
                Delim::Bold,
                vec![text("a "), Node::Span(Delim::Italic, vec![text("b")])]
            )]
        );
    }

    #[test]
    fn test_crossed_spans_flatten_outer() {
        let nodes = parse(vec![
            Token::Delim(Delim::Bold, "**"),
            Token::Text("a "),
            Token::Delim(Delim::Italic, "*"),
            Token::Text("b"),
            Token::Delim(Delim::Bold, "**"),
            Token::Text(" c"),
            Token::Delim(Delim::Italic, "*"),
        ]);
        assert_eq!(
            nodes,
            vec![
                Node::Leaf(Token::Delim(Delim::Bold, "**")),
                text("a "),
                Node::Span(
                    Delim::Italic,
                    vec![
                        text("b"),
                        Node::Leaf(Token::Delim(Delim::Bold, "**")),
                        text(" c"),
                    ]
                ),
            ]
        );
    }

    #[test]
    fn test_quote_pairs_with_itself() {
        let nodes = parse(vec![
            Token::Delim(Delim::Quote, "\""),
            Token::Text("hi"),
            Token::Delim(Delim::Quote, "\""),
            Token::Text(" and \""),
        ]);
        assert_eq!(
            nodes,
            vec![Node::Span(Delim::Quote, vec![text("hi")]), text(" and \"")]
        );
    }
}
