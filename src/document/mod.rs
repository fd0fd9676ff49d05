// src/document/mod.rs

//! Render model assembly
//!
//! Turns a [`RecipeAggregate`] into a [`RenderModel`] for one target. For
//! HTML, free-text fields are transpiled directly. For LaTeX every field is
//! escaped exactly once; metadata stays escaped text, markup fields are then
//! transpiled. Free-text units get `\DeclareSIUnit` statements so they can
//! be used inside siunitx macros.

mod units;

pub use units::{unit_command, unit_definitions, unit_macro_name};

use crate::error::{Error, Result};
use crate::markup::{EscapedText, Target, Transpiler, UnitTable, format_ingredient_quantity};
use crate::store::{IngredientRow, RecipeAggregate, RecipeStore, StepAggregate};
use chrono::Local;
use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

/// Recipe header fields, rendered for the target
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RecipeView {
    pub id: i64,
    pub name: String,
    pub author: String,
    pub source: String,
    pub preamble: String,
    pub updated_at: Option<String>,
}

/// One ingredient line
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IngredientView {
    /// Formatted amount including the unit
    pub quantity: String,
    /// Unit symbol (HTML) or unit command (LaTeX)
    pub unit: String,
    pub item: String,
    pub note: String,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
}

/// One step with its presentation attributes
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StepView {
    pub position: i64,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub category: Option<String>,
    pub show_ingredients: bool,
    pub text: String,
    pub ingredients: Vec<IngredientView>,
}

/// Everything a template needs to render one recipe
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RenderModel {
    pub target: Target,
    pub recipe: RecipeView,
    pub steps: Vec<StepView>,
    /// `\DeclareSIUnit` preamble lines (LaTeX only)
    pub unit_definitions: Vec<String>,
    /// Local date in `DD.MM.YYYY`
    pub generated_on: String,
}

/// Builds render models from a [`RecipeStore`]
#[derive(Clone)]
pub struct DocumentAssembler {
    store: Arc<dyn RecipeStore>,
}

impl DocumentAssembler {
    pub fn new(store: Arc<dyn RecipeStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn RecipeStore> {
        &self.store
    }

    /// Transpiler bound to the current unit definitions
    pub fn transpiler(&self) -> Result<Transpiler> {
        let units = self.store.units()?;
        Ok(Transpiler::new(UnitTable::from_units(&units)))
    }

    /// Load and assemble recipe `id` for `target`
    pub fn assemble(&self, id: i64, target: Target) -> Result<RenderModel> {
        let aggregate = self
            .store
            .load_recipe(id)?
            .ok_or(Error::RecipeNotFound(id))?;
        let transpiler = self.transpiler()?;

        debug!(
            "Assembling recipe {} for {} ({} steps)",
            id,
            target,
            aggregate.steps.len()
        );
        Ok(build_model(&aggregate, target, &transpiler))
    }
}

/// Assemble a render model from an already loaded aggregate
pub fn build_model(aggregate: &RecipeAggregate, target: Target, transpiler: &Transpiler) -> RenderModel {
    let recipe = &aggregate.recipe;
    let preamble = recipe.preamble.as_deref();

    let view = RecipeView {
        id: recipe.id.unwrap_or_default(),
        name: metadata(Some(&recipe.name), target),
        author: metadata(recipe.author.as_deref(), target),
        source: metadata(recipe.source.as_deref(), target),
        preamble: match target {
            Target::Html => transpiler.render_html(preamble.unwrap_or_default()),
            Target::Latex => transpiler.render_typeset(&EscapedText::from_option(preamble)),
        },
        updated_at: recipe.updated_at.clone(),
    };

    let steps = aggregate
        .steps
        .iter()
        .map(|step| step_view(step, target, transpiler))
        .collect();

    let unit_definitions = match target {
        Target::Html => Vec::new(),
        Target::Latex => unit_definitions(aggregate.referenced_units()),
    };

    RenderModel {
        target,
        recipe: view,
        steps,
        unit_definitions,
        generated_on: Local::now().format("%d.%m.%Y").to_string(),
    }
}

fn metadata(value: Option<&str>, target: Target) -> String {
    match target {
        Target::Html => value.unwrap_or_default().to_string(),
        Target::Latex => EscapedText::from_option(value).into_string(),
    }
}

fn step_view(aggregate: &StepAggregate, target: Target, transpiler: &Transpiler) -> StepView {
    let category = aggregate.category.as_ref();
    let text = &aggregate.step.markdown_text;

    StepView {
        position: aggregate.step.position,
        icon: category.and_then(|c| c.icon.clone()).filter(|i| !i.is_empty()),
        color: category.and_then(|c| c.color.clone()).filter(|c| !c.is_empty()),
        category: category.map(|c| metadata(Some(&c.label), target)),
        show_ingredients: category.is_none_or(|c| c.show_ingredients),
        text: match target {
            Target::Html => transpiler.render_html(text),
            Target::Latex => transpiler.render_typeset(&EscapedText::new(text)),
        },
        ingredients: aggregate
            .ingredients
            .iter()
            .map(|row| ingredient_view(row, target, transpiler))
            .collect(),
    }
}

fn ingredient_view(row: &IngredientRow, target: Target, transpiler: &Transpiler) -> IngredientView {
    let ingredient = &row.ingredient;
    let symbol = row.unit.as_ref().map(|u| u.symbol.as_str());

    let (unit, item, note) = match target {
        Target::Html => (
            symbol.unwrap_or_default().to_string(),
            transpiler.render_inline_html(&ingredient.item),
            transpiler.render_inline_html(ingredient.note.as_deref().unwrap_or_default()),
        ),
        Target::Latex => (
            row.unit.as_ref().map(unit_command).unwrap_or_default(),
            transpiler.render_typeset(&EscapedText::new(&ingredient.item)),
            transpiler.render_typeset(&EscapedText::from_option(ingredient.note.as_deref())),
        ),
    };

    let quantity = match target {
        Target::Html => format_ingredient_quantity(
            ingredient.amount_min,
            ingredient.amount_max,
            symbol,
            None,
            target,
        ),
        Target::Latex => format_ingredient_quantity(
            ingredient.amount_min,
            ingredient.amount_max,
            symbol,
            Some(unit.as_str()).filter(|u| !u.is_empty()),
            target,
        ),
    };

    IngredientView {
        quantity,
        unit,
        item,
        note,
        amount_min: ingredient.amount_min,
        amount_max: ingredient.amount_max,
    }
}
