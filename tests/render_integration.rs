// tests/render_integration.rs

//! Render models assembled from a real database.

mod common;

use common::{seed_recipe, setup};
use rezept::db::models::{Recipe, Unit, UnitKind};
use rezept::markup::EscapedText;
use rezept::{Error, Target};

#[test]
fn test_html_step_end_to_end() {
    let env = setup();
    let id = seed_recipe(&env);

    let model = env.assembler().assemble(id, Target::Html).unwrap();
    assert_eq!(model.target, Target::Html);
    assert_eq!(model.recipe.name, "Omas Brot");
    assert_eq!(model.recipe.author, "Oma");
    assert!(model.recipe.preamble.contains("ph-emo"));
    assert!(model.unit_definitions.is_empty());
    assert_eq!(model.steps.len(), 2);

    let mix = &model.steps[0];
    assert_eq!(mix.position, 1);
    assert_eq!(mix.text, "<p><strong>Mix</strong> well</p>\n");
    assert!(mix.show_ingredients);
    assert_eq!(mix.category.as_deref(), Some("Zubereitung"));

    let flour = &mix.ingredients[0];
    assert_eq!(flour.quantity, "2&ndash;8,5&#x202F;g");
    assert_eq!(flour.unit, "g");
    assert_eq!(flour.item, "Flour");
    assert_eq!(flour.amount_min, Some(2.0));
    assert_eq!(flour.amount_max, Some(8.5));
    assert_eq!(mix.ingredients[1].quantity, "1&#x202F;EL");

    let warning = &model.steps[1];
    assert!(!warning.show_ingredients);
    assert_eq!(warning.icon.as_deref(), Some("E4E0"));
    assert_eq!(warning.color.as_deref(), Some("#FF0000"));
    assert_eq!(warning.category.as_deref(), Some("Achtung"));
}

#[test]
fn test_latex_model_end_to_end() {
    let env = setup();
    let id = seed_recipe(&env);

    let model = env.assembler().assemble(id, Target::Latex).unwrap();
    assert_eq!(model.recipe.preamble, "Für 4 \\picon{E4D6}");
    assert_eq!(model.unit_definitions, vec!["\\DeclareSIUnit{\\EL}{EL}".to_string()]);

    let mix = &model.steps[0];
    assert_eq!(mix.text, "\\textbf{Mix} well");
    assert_eq!(mix.ingredients[0].quantity, "\\SIrange{2}{8,5}{\\gram}");
    assert_eq!(mix.ingredients[0].unit, "\\gram");
    assert_eq!(mix.ingredients[1].quantity, "\\SI{1}{\\EL}");
}

#[test]
fn test_metadata_escaped_only_for_latex() {
    let env = setup();
    let conn = env.conn();
    let mut recipe = Recipe::new("Brot & Butter 100%".to_string());
    let id = recipe.insert(&conn).unwrap();

    let html = env.assembler().assemble(id, Target::Html).unwrap();
    assert_eq!(html.recipe.name, "Brot & Butter 100%");
    assert!(html.steps.is_empty());

    let latex = env.assembler().assemble(id, Target::Latex).unwrap();
    assert_eq!(latex.recipe.name, "Brot \\& Butter 100\\%");
}

#[test]
fn test_missing_recipe() {
    let env = setup();
    let err = env.assembler().assemble(99, Target::Html).unwrap_err();
    assert!(matches!(err, Error::RecipeNotFound(99)));
    assert!(err.is_not_found());
}

#[test]
fn test_transpiler_uses_persisted_units() {
    let env = setup();
    let transpiler = env.assembler().transpiler().unwrap();

    // Case-folded lookup of a persisted symbol
    assert_eq!(transpiler.render_typeset(&EscapedText::new("[2 el]")), "\\SI{2}{EL}");
    assert_eq!(
        transpiler.render_typeset(&EscapedText::new("[500 ml] Milch")),
        "\\SI{500}{\\milli\\liter} Milch"
    );
}

#[test]
fn test_custom_unit_is_declared() {
    let env = setup();
    let id = seed_recipe(&env);
    let conn = env.conn();

    let mut bund = Unit::new(
        "Bund".to_string(),
        "Bund".to_string(),
        "Bund".to_string(),
        UnitKind::Text,
    );
    let bund_id = bund.insert(&conn).unwrap();

    let step_id = rezept::db::models::Step::find_by_recipe(&conn, id).unwrap()[0]
        .id
        .unwrap();
    let mut parsley = rezept::db::models::Ingredient::new(step_id, 3, "Petersilie".to_string());
    parsley.amount_min = Some(1.0);
    parsley.unit_id = Some(bund_id);
    parsley.insert(&conn).unwrap();

    let model = env.assembler().assemble(id, Target::Latex).unwrap();
    assert_eq!(
        model.unit_definitions,
        vec![
            "\\DeclareSIUnit{\\EL}{EL}".to_string(),
            "\\DeclareSIUnit{\\Bund}{Bund}".to_string(),
        ]
    );
    assert_eq!(model.steps[0].ingredients[2].quantity, "\\SI{1}{\\Bund}");
}
