// src/store.rs

//! Recipe loading seam between persistence and rendering
//!
//! The assembler and the build service only see [`RecipeStore`]; the SQLite
//! implementation opens a short-lived connection per call so it can be
//! shared across blocking build tasks.

use crate::db::{
    self,
    models::{Category, Ingredient, Recipe, Step, Unit},
};
use crate::error::Result;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// An ingredient with its resolved unit
#[derive(Debug, Clone, PartialEq)]
pub struct IngredientRow {
    pub ingredient: Ingredient,
    pub unit: Option<Unit>,
}

/// A step with its category and ordered ingredients
#[derive(Debug, Clone, PartialEq)]
pub struct StepAggregate {
    pub step: Step,
    pub category: Option<Category>,
    pub ingredients: Vec<IngredientRow>,
}

/// Everything needed to render one recipe
#[derive(Debug, Clone, PartialEq)]
pub struct RecipeAggregate {
    pub recipe: Recipe,
    pub steps: Vec<StepAggregate>,
}

impl RecipeAggregate {
    /// Distinct units referenced by any ingredient, in first-use order
    pub fn referenced_units(&self) -> Vec<&Unit> {
        let mut seen = Vec::new();
        let units = self
            .steps
            .iter()
            .flat_map(|s| s.ingredients.iter())
            .filter_map(|row| row.unit.as_ref());
        for unit in units {
            if !seen.iter().any(|u: &&Unit| u.symbol == unit.symbol) {
                seen.push(unit);
            }
        }
        seen
    }
}

/// Read access to recipes and reference data
pub trait RecipeStore: Send + Sync {
    /// Load a recipe with its steps, categories, ingredients and units
    ///
    /// Returns `Ok(None)` if no recipe has this id.
    fn load_recipe(&self, id: i64) -> Result<Option<RecipeAggregate>>;

    /// Only the recipe header, for cheap staleness checks
    fn recipe(&self, id: i64) -> Result<Option<Recipe>>;

    /// All unit definitions
    fn units(&self) -> Result<Vec<Unit>>;
}

/// [`RecipeStore`] backed by the SQLite database
#[derive(Debug, Clone)]
pub struct SqliteStore {
    db_path: PathBuf,
}

impl SqliteStore {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: db_path.into(),
        }
    }

    pub fn db_path(&self) -> &Path {
        &self.db_path
    }
}

impl RecipeStore for SqliteStore {
    fn load_recipe(&self, id: i64) -> Result<Option<RecipeAggregate>> {
        let conn = db::open(&self.db_path)?;

        let Some(recipe) = Recipe::find_by_id(&conn, id)? else {
            return Ok(None);
        };

        let units: HashMap<i64, Unit> = Unit::list_all(&conn)?
            .into_iter()
            .filter_map(|u| u.id.map(|id| (id, u)))
            .collect();
        let categories: HashMap<i64, Category> = Category::list_all(&conn)?
            .into_iter()
            .filter_map(|c| c.id.map(|id| (id, c)))
            .collect();

        let mut steps = Vec::new();
        for step in Step::find_by_recipe(&conn, id)? {
            let ingredients = match step.id {
                Some(step_id) => Ingredient::find_by_step(&conn, step_id)?
                    .into_iter()
                    .map(|ingredient| IngredientRow {
                        unit: ingredient.unit_id.and_then(|uid| units.get(&uid).cloned()),
                        ingredient,
                    })
                    .collect(),
                None => Vec::new(),
            };
            let category = step.category_id.and_then(|cid| categories.get(&cid).cloned());

            steps.push(StepAggregate {
                step,
                category,
                ingredients,
            });
        }

        Ok(Some(RecipeAggregate { recipe, steps }))
    }

    fn recipe(&self, id: i64) -> Result<Option<Recipe>> {
        let conn = db::open(&self.db_path)?;
        Recipe::find_by_id(&conn, id)
    }

    fn units(&self) -> Result<Vec<Unit>> {
        let conn = db::open(&self.db_path)?;
        Unit::list_all(&conn)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_missing_recipe() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rezept.db");
        db::init(&db_path).unwrap();

        let store = SqliteStore::new(&db_path);
        assert!(store.load_recipe(42).unwrap().is_none());
        assert!(store.recipe(42).unwrap().is_none());
        assert_eq!(store.units().unwrap().len(), 13);
    }

    #[test]
    fn test_load_aggregate() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("rezept.db");
        db::init(&db_path).unwrap();
        let conn = db::open(&db_path).unwrap();

        let recipe_id = Recipe::new("Brot".to_string()).insert(&conn).unwrap();
        let mut step = Step::new(recipe_id, 1, "Mischen".to_string());
        step.category_id = Some(1);
        let step_id = step.insert(&conn).unwrap();

        let el = Unit::find_by_symbol(&conn, "EL").unwrap().unwrap();
        for (pos, item) in [(2, "Salz"), (1, "Öl")] {
            let mut ing = Ingredient::new(step_id, pos, item.to_string());
            ing.unit_id = el.id;
            ing.insert(&conn).unwrap();
        }

        let store = SqliteStore::new(&db_path);
        let agg = store.load_recipe(recipe_id).unwrap().unwrap();
        assert_eq!(agg.recipe.name, "Brot");
        assert_eq!(agg.steps.len(), 1);
        assert_eq!(
            agg.steps[0].category.as_ref().map(|c| c.name.as_str()),
            Some("default")
        );
        let items: Vec<_> = agg.steps[0]
            .ingredients
            .iter()
            .map(|r| r.ingredient.item.as_str())
            .collect();
        assert_eq!(items, ["Öl", "Salz"]);
        assert_eq!(agg.referenced_units().len(), 1);
    }
}
