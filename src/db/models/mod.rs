// src/db/models/mod.rs

//! Data models for recipe database entities
//!
//! Each struct corresponds to a table and provides methods for creating and
//! reading records.

mod category;
mod ingredient;
mod recipe;
mod step;
mod unit;

pub use category::Category;
pub use ingredient::Ingredient;
pub use recipe::Recipe;
pub use step::Step;
pub use unit::{Unit, UnitKind};
