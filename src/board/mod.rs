//! Board document model and BoardOpShim (§4.8).
//!
//! Mirrors `schema::mod` at a smaller scale: the board document shares
//! the SX discipline but has its own element set (footprints, tracks,
//! vias) rather than schematic symbols/wires.

pub mod reader;
pub mod shim;
pub mod writer;

use std::path::Path;

use crate::error::Result;
use crate::gr::{Pos, Property};
use crate::sx::SexpTree;

pub const DOCUMENT_TAG: &str = "kicad_pcb";
pub const BOARD_VERSION: &str = "20231120";
pub const GENERATOR: &str = "recad_mcp";

#[derive(Debug, Clone, PartialEq)]
pub struct Footprint {
    pub footprint_id: String,
    pub pos: Pos,
    pub layer: String,
    pub locked: bool,
    pub uuid: String,
    pub props: Vec<Property>,
}

impl Footprint {
    pub fn reference(&self) -> String {
        self.props.iter().find(|p| p.key == "Reference").map(|p| p.value.clone()).unwrap_or_default()
    }

    pub fn set_property(&mut self, key: &str, value: &str) {
        if let Some(p) = self.props.iter_mut().find(|p| p.key == key) {
            p.value = value.to_string();
        } else {
            self.props.push(Property::new(key, value));
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    pub start: crate::gr::Pt,
    pub end: crate::gr::Pt,
    pub width: f32,
    pub layer: String,
    pub net: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Via {
    pub at: crate::gr::Pt,
    pub drill: f32,
    pub layers: (String, String),
    pub net: i64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Board {
    pub version: String,
    pub generator: String,
    pub uuid: String,
    pub footprints: Vec<Footprint>,
    pub tracks: Vec<(Track, String)>,
    pub vias: Vec<(Via, String)>,
}

impl Board {
    pub fn new() -> Self {
        Board {
            version: BOARD_VERSION.to_string(),
            generator: GENERATOR.to_string(),
            uuid: crate::new_uuid(),
            ..Default::default()
        }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let tree = SexpTree::parse(&text)?;
        reader::read(&tree)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let text = writer::write(self);
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = dir.join(format!(
            ".{}.tmp",
            path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| "board".to_string())
        ));
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn footprint(&self, reference: &str) -> Option<&Footprint> {
        self.footprints.iter().find(|f| f.reference() == reference)
    }
}
