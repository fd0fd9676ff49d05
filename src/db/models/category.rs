// src/db/models/category.rs

//! Step category model
//!
//! Categories decide how a step is presented: regular preparation steps show
//! their ingredients, while notes such as warnings or tips show an icon on a
//! colored background instead.

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: Option<i64>,
    /// Stable machine name (`warning`)
    pub name: String,
    /// Display label (`Achtung`)
    pub label: String,
    /// Icon font codepoint in hex (`E4E0`)
    pub icon: Option<String>,
    /// CSS color for the step background
    pub color: Option<String>,
    pub show_ingredients: bool,
}

impl Category {
    pub fn new(name: String, label: String) -> Self {
        Self {
            id: None,
            name,
            label,
            icon: None,
            color: None,
            show_ingredients: false,
        }
    }

    /// Insert this category into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO step_categories (name, label, icon, color, show_ingredients)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                &self.name,
                &self.label,
                &self.icon,
                &self.color,
                self.show_ingredients as i32,
            ],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a category by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, label, icon, color, show_ingredients
             FROM step_categories WHERE id = ?1",
        )?;

        let category = stmt.query_row([id], Self::from_row).optional()?;
        Ok(category)
    }

    /// Find a category by its machine name
    pub fn find_by_name(conn: &Connection, name: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, label, icon, color, show_ingredients
             FROM step_categories WHERE name = ?1",
        )?;

        let category = stmt.query_row([name], Self::from_row).optional()?;
        Ok(category)
    }

    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, label, icon, color, show_ingredients
             FROM step_categories ORDER BY id",
        )?;

        let categories = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            label: row.get(2)?,
            icon: row.get(3)?,
            color: row.get(4)?,
            show_ingredients: row.get::<_, i32>(5)? != 0,
        })
    }
}
