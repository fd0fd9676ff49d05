// src/lib.rs

//! Recipe rendering
//!
//! Turns stored recipes into two outputs:
//!
//! - an HTML render model for the live view
//! - a typeset PDF compiled from a LaTeX template, cached per recipe
//!
//! # Architecture
//!
//! - `markup`: quantity grammar, unit resolution, escaping and the step
//!   markup transpiler (pure, no I/O)
//! - `document`: turns a loaded recipe into a per-target render model
//! - `build`: template rendering, compiler invocation and the PDF cache
//! - `db` / `store`: SQLite persistence behind the `RecipeStore` trait

pub mod build;
pub mod config;
pub mod db;
pub mod document;
mod error;
pub mod markup;
pub mod store;

#[cfg(feature = "server")]
pub mod server;

pub use error::{Error, Result};
pub use markup::{Target, Transpiler};
