/*!
# Rust Language Module

This Rust module provides the BASIC error model and the parser for the
DRAW statement's command language.

*/

#[macro_use]
mod error;
pub mod draw;

pub use error::Error;
pub use error::ErrorCode;

/// Source line an error is attributed to. `None` when unknown.
pub type LineNumber = Option<u32>;
