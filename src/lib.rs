//! A programmatic edit engine for KiCad-style schematic and board files,
//! driven over a line-delimited JSON transport (§1, §6).

pub mod board;
pub mod check;
pub mod component;
pub mod config;
pub mod error;
pub mod gr;
pub mod inject;
pub mod library;
pub mod netlist;
pub mod pins;
pub mod schema;
pub mod sx;
pub mod transport;
pub mod wires;

pub use error::{Error, Result};
pub use schema::Schema;

/// Generate a fresh lowercase-hyphenated UUID v4, the form every element
/// identifier in a document takes (§3).
pub fn new_uuid() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Round to the precision KiCad documents are written at, avoiding the
/// float noise a raw `f32` rotation/trig computation accumulates.
pub fn round(v: f32) -> f32 {
    (v * 1_000_000.0).round() / 1_000_000.0
}
