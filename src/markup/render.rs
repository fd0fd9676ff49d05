// src/markup/render.rs

//! Node tree → target text

use super::Target;
use super::inline::Node;
use super::lexer::{Delim, Token};
use super::quantity::HTML_THIN_SPACE;
use super::units::UnitTable;
use pulldown_cmark::{Event, Options, Parser, Tag, TagEnd, html};

/// Render nodes for `target`
pub(crate) fn render_nodes(nodes: &[Node<'_>], target: Target, units: &UnitTable) -> String {
    let mut out = String::new();
    for node in nodes {
        match target {
            Target::Html => html_node(node, units, &mut out),
            Target::Latex => latex_node(node, units, &mut out),
        }
    }
    out
}

fn html_node(node: &Node<'_>, units: &UnitTable, out: &mut String) {
    match node {
        Node::Span(delim, children) => {
            let (open, close) = match delim {
                Delim::Bold => ("<strong>", "</strong>"),
                Delim::Italic => ("<em>", "</em>"),
                Delim::Sup => ("<sup>", "</sup>"),
                Delim::Sub => ("<sub>", "</sub>"),
                Delim::Quote => ("&laquo;", "&raquo;"),
            };
            out.push_str(open);
            for child in children {
                html_node(child, units, out);
            }
            out.push_str(close);
        }
        Node::Leaf(token) => match token {
            Token::Text(text) => out.push_str(text),
            Token::Delim(_, literal) => out.push_str(literal),
            Token::Quantity(q) => out.push_str(&q.format(Target::Html, units)),
            Token::Emoticon(cp) => {
                out.push_str("<span class=\"ph-emo\">&#x");
                out.push_str(cp);
                out.push_str(";</span>");
            }
            Token::Measure { value, unit } => {
                out.push_str(value);
                out.push_str(HTML_THIN_SPACE);
                out.push_str(unit);
            }
            Token::Temperature(value) => {
                out.push_str(value);
                out.push_str(HTML_THIN_SPACE);
                out.push_str("°C");
            }
            Token::EnDash => out.push_str("&ndash;"),
            // Styled in the Markdown pass so block syntax still parses
            Token::Break(1) => out.push('\n'),
            Token::Break(_) => out.push_str("\n\n"),
        },
    }
}

fn latex_node(node: &Node<'_>, units: &UnitTable, out: &mut String) {
    match node {
        Node::Span(delim, children) => {
            let command = match delim {
                Delim::Bold => "\\textbf{",
                Delim::Italic => "\\textit{",
                Delim::Sup => "\\textsuperscript{",
                Delim::Sub => "\\textsubscript{",
                Delim::Quote => "\\enquote{",
            };
            out.push_str(command);
            for child in children {
                latex_node(child, units, out);
            }
            out.push('}');
        }
        Node::Leaf(token) => match token {
            Token::Text(text) => out.push_str(text),
            Token::Delim(_, literal) => out.push_str(literal),
            Token::Quantity(q) => out.push_str(&q.format(Target::Latex, units)),
            Token::Emoticon(cp) => {
                out.push_str("\\picon{");
                out.push_str(cp);
                out.push('}');
            }
            Token::Measure { value, unit } => {
                out.push_str(value);
                out.push_str("\\,");
                out.push_str(unit);
            }
            Token::Temperature(value) => {
                out.push_str("\\qty{");
                out.push_str(&value.replace('.', ","));
                out.push_str("}{\\degreeCelsius}");
            }
            Token::EnDash => out.push_str("--"),
            Token::Break(1) => out.push_str("\\newline "),
            Token::Break(_) => out.push_str("\\addlinespace[0.5em] "),
        },
    }
}

/// Inline tags the HTML renderer emits; any other raw HTML is shown as text
const ALLOWED_TAGS: &[&str] = &[
    "<strong>",
    "</strong>",
    "<em>",
    "</em>",
    "<sup>",
    "</sup>",
    "<sub>",
    "</sub>",
    "<span class=\"ph-emo\">",
    "</span>",
];

const SOFT_BREAK: &str = "<br>\n";
const PARAGRAPH_BREAK: &str = "<br class=\"mb-3\">\n";

/// Final Markdown pass for the HTML target
///
/// Inline tags produced by the transpiler pass through as raw HTML. Entity
/// references in text come out as the characters they name. Soft breaks
/// become `<br>` and adjacent paragraphs are joined with a spaced break.
pub(crate) fn markdown_to_html(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_FOOTNOTES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let mut events: Vec<Event<'_>> = Vec::new();
    for event in Parser::new_ext(text, options) {
        match event {
            Event::SoftBreak => events.push(Event::InlineHtml(SOFT_BREAK.into())),
            Event::Html(raw) | Event::InlineHtml(raw) if !ALLOWED_TAGS.contains(&&*raw) => {
                events.push(Event::Text(raw))
            }
            Event::Start(Tag::Paragraph)
                if matches!(events.last(), Some(Event::End(TagEnd::Paragraph))) =>
            {
                events.pop();
                events.push(Event::InlineHtml(PARAGRAPH_BREAK.into()));
            }
            other => events.push(other),
        }
    }

    let mut out = String::with_capacity(text.len() + text.len() / 2);
    html::push_html(&mut out, events.into_iter());
    out
}
