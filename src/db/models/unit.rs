// src/db/models/unit.rs

//! Measurement unit model

use crate::error::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use std::fmt;
use std::str::FromStr;

/// Whether a unit is a physical siunitx unit or free text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKind {
    /// Physical unit with a real siunitx command (`\gram`)
    Si,
    /// Free-text unit (`EL`, `Prise`) that needs a declared macro
    Text,
}

impl UnitKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            UnitKind::Si => "si",
            UnitKind::Text => "text",
        }
    }
}

impl FromStr for UnitKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "si" => Ok(UnitKind::Si),
            "text" => Ok(UnitKind::Text),
            _ => Err(format!("Invalid unit kind: {s}")),
        }
    }
}

impl fmt::Display for UnitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A unit definition
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub id: Option<i64>,
    /// Display name (`Gramm`)
    pub name: String,
    /// Symbol as written in recipes (`g`)
    pub symbol: String,
    /// siunitx command or text for the typeset target (`\gram`)
    pub latex_code: String,
    pub kind: UnitKind,
}

impl Unit {
    pub fn new(name: String, symbol: String, latex_code: String, kind: UnitKind) -> Self {
        Self {
            id: None,
            name,
            symbol,
            latex_code,
            kind,
        }
    }

    /// Insert this unit into the database
    pub fn insert(&mut self, conn: &Connection) -> Result<i64> {
        conn.execute(
            "INSERT INTO units (name, symbol, latex_code, kind) VALUES (?1, ?2, ?3, ?4)",
            params![&self.name, &self.symbol, &self.latex_code, self.kind.as_str()],
        )?;

        let id = conn.last_insert_rowid();
        self.id = Some(id);
        Ok(id)
    }

    /// Find a unit by ID
    pub fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, symbol, latex_code, kind FROM units WHERE id = ?1",
        )?;

        let unit = stmt.query_row([id], Self::from_row).optional()?;
        Ok(unit)
    }

    /// Find a unit by its exact symbol
    pub fn find_by_symbol(conn: &Connection, symbol: &str) -> Result<Option<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, symbol, latex_code, kind FROM units WHERE symbol = ?1",
        )?;

        let unit = stmt.query_row([symbol], Self::from_row).optional()?;
        Ok(unit)
    }

    /// List all units in insertion order
    pub fn list_all(conn: &Connection) -> Result<Vec<Self>> {
        let mut stmt = conn.prepare(
            "SELECT id, name, symbol, latex_code, kind FROM units ORDER BY id",
        )?;

        let units = stmt
            .query_map([], Self::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(units)
    }

    fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let kind_str: String = row.get(4)?;

        Ok(Self {
            id: Some(row.get(0)?),
            name: row.get(1)?,
            symbol: row.get(2)?,
            latex_code: row.get(3)?,
            kind: kind_str.parse().unwrap_or(UnitKind::Text),
        })
    }
}
