// src/db/schema.rs

//! Database schema definitions and migrations
//!
//! Version 1 creates the recipe tables, version 2 adds the triggers that keep
//! `recipes.updated_at` current whenever a recipe, one of its steps or one of
//! its ingredients changes. That column drives PDF cache staleness.

use crate::error::{Error, Result};
use rusqlite::{Connection, params};
use tracing::{debug, info};

/// Current schema version
pub const SCHEMA_VERSION: i32 = 2;

/// Reference units: (name, symbol, latex code, kind)
const SEED_UNITS: &[(&str, &str, &str, &str)] = &[
    ("Gramm", "g", "\\gram", "si"),
    ("Kilogramm", "kg", "\\kilogram", "si"),
    ("Milliliter", "ml", "\\milli\\liter", "si"),
    ("Deziliter", "dl", "\\deci\\liter", "si"),
    ("Liter", "l", "\\liter", "si"),
    ("Grad Celsius", "°C", "\\degreeCelsius", "si"),
    ("Esslöffel", "EL", "EL", "text"),
    ("Teelöffel", "TL", "TL", "text"),
    ("Prise", "Prise", "Prise", "text"),
    ("Messerspitze", "Msp.", "Msp.", "text"),
    ("Stück", "Stk.", "Stk", "text"),
    ("Packung", "Pkg.", "Pkg.", "text"),
    ("Tropfen", "Tr.", "Tr", "text"),
];

/// Step categories: (id, name, label, icon codepoint, color, show ingredients)
const SEED_CATEGORIES: &[(i64, &str, &str, Option<&str>, Option<&str>, bool)] = &[
    (1, "default", "Zubereitung", None, None, true),
    (2, "warning", "Achtung", Some("E4E0"), Some("#FF0000"), false),
    (3, "info", "Info", Some("E2CE"), Some("#006EFF"), false),
    (4, "variation", "Variante", Some("E422"), Some("#7B00FF"), false),
    (5, "tip", "Tipp", Some("E2DC"), Some("#FFCC00"), false),
];

/// Initialize the schema version tracking table
fn init_schema_version(conn: &Connection) -> Result<()> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;
    Ok(())
}

/// Get the current schema version from the database
pub fn get_schema_version(conn: &Connection) -> Result<i32> {
    init_schema_version(conn)?;

    let version: Option<i32> = conn.query_row(
        "SELECT MAX(version) FROM schema_version",
        [],
        |row| row.get(0),
    )?;

    Ok(version.unwrap_or(0))
}

fn set_schema_version(conn: &Connection, version: i32) -> Result<()> {
    conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    Ok(())
}

/// Apply all pending migrations to bring the database up to date
pub fn migrate(conn: &Connection) -> Result<()> {
    let current_version = get_schema_version(conn)?;
    debug!("Current schema version: {}", current_version);

    if current_version >= SCHEMA_VERSION {
        return Ok(());
    }

    for version in (current_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration to version {}", version);
        apply_migration(conn, version)?;
        set_schema_version(conn, version)?;
    }

    info!("Schema migration complete. Now at version {}", SCHEMA_VERSION);
    Ok(())
}

fn apply_migration(conn: &Connection, version: i32) -> Result<()> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(Error::InitError(format!(
            "Unknown migration version: {}",
            version
        ))),
    }
}

/// Initial schema - Version 1
///
/// - units: measurement units with their siunitx command
/// - step_categories: presentation of step kinds
/// - recipes / steps / ingredients: recipe content
fn migrate_v1(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 1");

    conn.execute_batch(
        "
        CREATE TABLE units (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL,
            symbol TEXT NOT NULL UNIQUE,
            latex_code TEXT NOT NULL DEFAULT '',
            kind TEXT NOT NULL DEFAULT 'text' CHECK(kind IN ('si', 'text'))
        );

        CREATE TABLE step_categories (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            name TEXT NOT NULL UNIQUE,
            label TEXT NOT NULL,
            icon TEXT,
            color TEXT,
            show_ingredients INTEGER NOT NULL DEFAULT 0
        );

        CREATE TABLE recipes (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            folder_id INTEGER,
            owner_id INTEGER,
            name TEXT NOT NULL,
            author TEXT,
            source TEXT,
            preamble TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        );

        CREATE INDEX idx_recipes_name ON recipes(name);

        CREATE TABLE steps (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recipe_id INTEGER NOT NULL,
            category_id INTEGER,
            position INTEGER NOT NULL,
            markdown_text TEXT NOT NULL DEFAULT '',
            UNIQUE(recipe_id, position),
            FOREIGN KEY (recipe_id) REFERENCES recipes(id) ON DELETE CASCADE,
            FOREIGN KEY (category_id) REFERENCES step_categories(id)
        );

        CREATE INDEX idx_steps_recipe_id ON steps(recipe_id);

        CREATE TABLE ingredients (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            step_id INTEGER NOT NULL,
            unit_id INTEGER,
            position INTEGER NOT NULL,
            amount_min REAL,
            amount_max REAL,
            item TEXT NOT NULL,
            note TEXT,
            CHECK(amount_min IS NULL OR amount_max IS NULL OR amount_min <= amount_max),
            FOREIGN KEY (step_id) REFERENCES steps(id) ON DELETE CASCADE,
            FOREIGN KEY (unit_id) REFERENCES units(id)
        );

        CREATE INDEX idx_ingredients_step_id ON ingredients(step_id);
        ",
    )?;

    info!("Schema version 1 created successfully");
    Ok(())
}

/// Version 2: `updated_at` maintenance triggers
fn migrate_v2(conn: &Connection) -> Result<()> {
    debug!("Creating schema version 2");

    conn.execute_batch(
        "
        CREATE TRIGGER recipes_touch_au
        AFTER UPDATE ON recipes
        WHEN NEW.updated_at = OLD.updated_at
        BEGIN
            UPDATE recipes SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.id;
        END;

        CREATE TRIGGER steps_touch_ai AFTER INSERT ON steps
        BEGIN
            UPDATE recipes SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.recipe_id;
        END;

        CREATE TRIGGER steps_touch_au AFTER UPDATE ON steps
        BEGIN
            UPDATE recipes SET updated_at = CURRENT_TIMESTAMP WHERE id = NEW.recipe_id;
        END;

        CREATE TRIGGER steps_touch_ad AFTER DELETE ON steps
        BEGIN
            UPDATE recipes SET updated_at = CURRENT_TIMESTAMP WHERE id = OLD.recipe_id;
        END;

        CREATE TRIGGER ingredients_touch_ai AFTER INSERT ON ingredients
        BEGIN
            UPDATE recipes SET updated_at = CURRENT_TIMESTAMP
            WHERE id = (SELECT recipe_id FROM steps WHERE id = NEW.step_id);
        END;

        CREATE TRIGGER ingredients_touch_au AFTER UPDATE ON ingredients
        BEGIN
            UPDATE recipes SET updated_at = CURRENT_TIMESTAMP
            WHERE id = (SELECT recipe_id FROM steps WHERE id = NEW.step_id);
        END;

        CREATE TRIGGER ingredients_touch_ad AFTER DELETE ON ingredients
        BEGIN
            UPDATE recipes SET updated_at = CURRENT_TIMESTAMP
            WHERE id = (SELECT recipe_id FROM steps WHERE id = OLD.step_id);
        END;
        ",
    )?;

    info!("Schema version 2 created successfully");
    Ok(())
}

/// Insert reference units and step categories that are not present yet
pub fn seed(conn: &Connection) -> Result<()> {
    let mut units = 0;
    for (name, symbol, latex_code, kind) in SEED_UNITS {
        units += conn.execute(
            "INSERT OR IGNORE INTO units (name, symbol, latex_code, kind) VALUES (?1, ?2, ?3, ?4)",
            params![name, symbol, latex_code, kind],
        )?;
    }

    let mut categories = 0;
    for (id, name, label, icon, color, show_ingredients) in SEED_CATEGORIES {
        categories += conn.execute(
            "INSERT OR IGNORE INTO step_categories (id, name, label, icon, color, show_ingredients)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![id, name, label, icon, color, *show_ingredients as i32],
        )?;
    }

    if units + categories > 0 {
        info!("Seeded {} units and {} step categories", units, categories);
    }
    Ok(())
}
