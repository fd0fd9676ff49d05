// src/db/models/step.rs

//! Recipe step model

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone, PartialEq)]
pub struct Step {
    pub id: Option<i64>,
    pub recipe_id: i64,
    /// Order within the recipe, unique per recipe
    pub position: i64,
    /// Step body in recipe markup
    pub markdown_text: String,
    pub category_id: Option<i64>,
}

impl Step {
    pub fn new(recipe_id: i64, position: i64, markdown_text: String) -> Self {
        Self {
            id: None,
            recipe_id,
            position,
            markdown_text,
            category_id: None,
        }
    }

    /// Insert this step into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO steps (recipe_id, category_id, position, markdown_text)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                self.recipe_id,
                self.category_id,
                self.position,
                &self.markdown_text,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a step by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, recipe_id, category_id, position, markdown_text FROM steps WHERE id = ?1",
        )?;

        let step = stmt.query_row([id], Self::from_row).optional()?;
        Ok(step)
    }

    /// All steps of a recipe ordered by position
    pub fn find_by_recipe(conn: &Connection, recipe_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, recipe_id, category_id, position, markdown_text
             FROM steps WHERE recipe_id = ?1 ORDER BY position",
        )?;

        let steps = stmt
            .query_map([recipe_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(steps)
    }

    /// Replace the step text
    pub fn update_text(conn: &Connection, id: i64, markdown_text: &str) -> Result<()> {
        conn.execute(
            "UPDATE steps SET markdown_text = ?1 WHERE id = ?2",
            params![markdown_text, id],
        )?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            recipe_id: row.get(1)?,
            category_id: row.get(2)?,
            position: row.get(3)?,
            markdown_text: row.get(4)?,
        })
    }
}
