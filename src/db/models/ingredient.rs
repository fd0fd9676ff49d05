// src/db/models/ingredient.rs

//! Ingredient model
//!
//! Amounts are structured: `amount_min` alone is a single value, both bounds
//! form a range. The database rejects `amount_min > amount_max`.

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone, PartialEq)]
pub struct Ingredient {
    pub id: Option<i64>,
    pub step_id: i64,
    /// Order within the step
    pub position: i64,
    pub amount_min: Option<f64>,
    pub amount_max: Option<f64>,
    pub unit_id: Option<i64>,
    /// Ingredient name in recipe markup
    pub item: String,
    pub note: Option<String>,
}

impl Ingredient {
    pub fn new(step_id: i64, position: i64, item: String) -> Self {
        Self {
            id: None,
            step_id,
            position,
            amount_min: None,
            amount_max: None,
            unit_id: None,
            item,
            note: None,
        }
    }

    /// Insert this ingredient into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO ingredients (step_id, unit_id, position, amount_min, amount_max, item, note)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                self.step_id,
                self.unit_id,
                self.position,
                self.amount_min,
                self.amount_max,
                &self.item,
                &self.note,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find an ingredient by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, step_id, unit_id, position, amount_min, amount_max, item, note
             FROM ingredients WHERE id = ?1",
        )?;

        let ingredient = stmt.query_row([id], Self::from_row).optional()?;
        Ok(ingredient)
    }

    /// All ingredients of a step ordered by position
    pub fn find_by_step(conn: &Connection, step_id: i64) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, step_id, unit_id, position, amount_min, amount_max, item, note
             FROM ingredients WHERE step_id = ?1 ORDER BY position",
        )?;

        let ingredients = stmt
            .query_map([step_id], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(ingredients)
    }

    /// Replace both amount bounds
    pub fn update_amounts(
        conn: &Connection,
        id: i64,
        amount_min: Option<f64>,
        amount_max: Option<f64>,
    ) -> Result<()> {
        conn.execute(
            "UPDATE ingredients SET amount_min = ?1, amount_max = ?2 WHERE id = ?3",
            params![amount_min, amount_max, id],
        )?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            step_id: row.get(1)?,
            unit_id: row.get(2)?,
            position: row.get(3)?,
            amount_min: row.get(4)?,
            amount_max: row.get(5)?,
            item: row.get(6)?,
            note: row.get(7)?,
        })
    }
}
