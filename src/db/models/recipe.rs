// src/db/models/recipe.rs

//! Recipe model

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

/// A recipe header record
///
/// Timestamps are maintained by the database in UTC
/// (`YYYY-MM-DD HH:MM:SS`).
#[derive(Debug, Clone, PartialEq)]
pub struct Recipe {
    pub id: Option<i64>,
    pub name: String,
    pub author: Option<String>,
    pub source: Option<String>,
    /// Introductory text in recipe markup
    pub preamble: Option<String>,
    pub folder_id: Option<i64>,
    pub owner_id: Option<i64>,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl Recipe {
    pub fn new(name: String) -> Self {
        Self {
            id: None,
            name,
            author: None,
            source: None,
            preamble: None,
            folder_id: None,
            owner_id: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// Insert this recipe; the database assigns both timestamps
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO recipes (name, author, source, preamble, folder_id, owner_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                &self.name,
                &self.author,
                &self.source,
                &self.preamble,
                self.folder_id,
                self.owner_id,
            ],
        )?;

        let id = conn.last_insert_rowid();
        let (created_at, updated_at): (String, String) = conn.query_row(
            "SELECT created_at, updated_at FROM recipes WHERE id = ?1",
            [id],
            |row| Ok((row.get(0)?, row.get(1)?)),
        )?;

        self.id = Some(id);
        self.created_at = Some(created_at);
        self.updated_at = Some(updated_at);
        Ok(id)
    }

    /// Find a recipe by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, author, source, preamble, folder_id, owner_id, created_at, updated_at
             FROM recipes WHERE id = ?1",
        )?;

        let recipe = stmt.query_row([id], Self::from_row).optional()?;
        Ok(recipe)
    }

    /// List all recipes ordered by name
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, author, source, preamble, folder_id, owner_id, created_at, updated_at
             FROM recipes ORDER BY name",
        )?;

        let recipes = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(recipes)
    }

    /// Replace the preamble text
    pub fn update_preamble(conn: &Connection, id: i64, preamble: Option<&str>) -> Result<()> {
        conn.execute(
            "UPDATE recipes SET preamble = ?1 WHERE id = ?2",
            params![preamble, id],
        )?;
        Ok(())
    }

    /// Overwrite the modification timestamp
    pub fn set_updated_at(conn: &Connection, id: i64, updated_at: &str) -> Result<()> {
        conn.execute(
            "UPDATE recipes SET updated_at = ?1 WHERE id = ?2",
            params![updated_at, id],
        )?;
        Ok(())
    }

    /// Delete a recipe with its steps and ingredients
    pub fn delete(conn: &Connection, id: i64) -> Result<()> {
        conn.execute("DELETE FROM recipes WHERE id = ?1", [id])?;
        Ok(())
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            author: row.get(2)?,
            source: row.get(3)?,
            preamble: row.get(4)?,
            folder_id: row.get(5)?,
            owner_id: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }
}
