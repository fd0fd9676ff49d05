// src/build/template.rs

//! LaTeX document template rendering
//!
//! Templates use Jinja syntax with delimiters that cannot clash with TeX:
//! `<% block %>`, `<< variable >>`, `<# comment #>`. Block tags swallow the
//! following newline and leading indentation. Values are inserted verbatim:
//! the render model is already escaped for LaTeX.

use crate::document::RenderModel;
use crate::error::{Error, Result};
use minijinja::syntax::SyntaxConfig;
use minijinja::{AutoEscape, Environment, context};
use std::path::Path;

/// Name under which the template is registered for error messages
const TEMPLATE_NAME: &str = "master.tex";

fn environment() -> Result<Environment<'static>> {
    let mut env = Environment::new();
    let syntax = SyntaxConfig::builder()
        .block_delimiters("<%", "%>")
        .variable_delimiters("<<", ">>")
        .comment_delimiters("<#", "#>")
        .build()?;
    env.set_syntax(syntax);
    env.set_trim_blocks(true);
    env.set_lstrip_blocks(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
    Ok(env)
}

/// Render template `source` with `model`
///
/// The model is exposed as `recipe`, `steps`, `unit_definitions` and
/// `current_date`.
pub fn render_template(source: &str, model: &RenderModel) -> Result<String> {
    let env = environment()?;
    let ctx = context! {
        recipe => &model.recipe,
        steps => &model.steps,
        unit_definitions => &model.unit_definitions,
        current_date => &model.generated_on,
    };
    Ok(env.render_named_str(TEMPLATE_NAME, source, ctx)?)
}

/// Read and render the template file at `path`
pub fn render_template_file(path: &Path, model: &RenderModel) -> Result<String> {
    let source = std::fs::read_to_string(path).map_err(|e| Error::fs(path, e))?;
    render_template(&source, model)
}
