//! Schema document model (§3, §4.1 magic/version invariant).
//!
//! Grounded in the teacher's `schema.rs`: the same struct shapes
//! (`LibrarySymbol`, `Pin`, `Symbol`, `Wire`, `LocalLabel`, `GlobalLabel`,
//! `Junction`, `NoConnect`), trimmed to what the edit engine needs and
//! extended with the template/instance bookkeeping of §4.3/§4.4.

pub mod reader;
pub mod writer;

use std::path::Path;

use crate::error::{Error, Result};
use crate::gr::{Effects, GraphicItem, PaperSize, Pos, Property, Pts, Stroke, TitleBlock};
use crate::sx::constants::el;
use crate::sx::SexpTree;

/// Magic tag and fixed version/generator the system always writes,
/// regardless of what was read (§4.1, §6).
pub const DOCUMENT_TAG: &str = "kicad_sch";
pub const SCHEMA_VERSION: &str = "20231120";
pub const GENERATOR: &str = "recad_mcp";

/// Reserved prefix identifying a [`TemplateInstance`] (§3).
pub const TEMPLATE_PREFIX: &str = "_TEMPLATE_";

/// Grid the system snaps wire/label coordinates to (§3).
pub const GRID: f32 = 0.5;

#[derive(Clone, Debug, Default, PartialEq)]
pub struct PinProperty {
    pub name: String,
    pub effects: Effects,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum ElectricalType {
    Input,
    Output,
    #[default]
    Bidirectional,
    TriState,
    Passive,
    Free,
    Unspecified,
    PowerIn,
    PowerOut,
    OpenCollector,
    OpenEmitter,
    NoConnect,
}

impl From<&str> for ElectricalType {
    fn from(s: &str) -> Self {
        match s {
            "input" => Self::Input,
            "output" => Self::Output,
            "bidirectional" => Self::Bidirectional,
            "tri_state" => Self::TriState,
            "passive" => Self::Passive,
            "free" => Self::Free,
            "power_in" => Self::PowerIn,
            "power_out" => Self::PowerOut,
            "open_collector" => Self::OpenCollector,
            "open_emitter" => Self::OpenEmitter,
            "no_connect" => Self::NoConnect,
            _ => Self::Unspecified,
        }
    }
}

impl std::fmt::Display for ElectricalType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Input => "input",
            Self::Output => "output",
            Self::Bidirectional => "bidirectional",
            Self::TriState => "tri_state",
            Self::Passive => "passive",
            Self::Free => "free",
            Self::Unspecified => "unspecified",
            Self::PowerIn => "power_in",
            Self::PowerOut => "power_out",
            Self::OpenCollector => "open_collector",
            Self::OpenEmitter => "open_emitter",
            Self::NoConnect => "no_connect",
        };
        write!(f, "{s}")
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum PinGraphicalStyle {
    #[default]
    Line,
    Inverted,
    Clock,
    InvertedClock,
    InputLow,
    ClockLow,
    OutputLow,
    EdgeClockHigh,
    NonLogic,
}

impl From<&str> for PinGraphicalStyle {
    fn from(s: &str) -> Self {
        match s {
            "inverted" => Self::Inverted,
            "clock" => Self::Clock,
            "inverted_clock" => Self::InvertedClock,
            "input_low" => Self::InputLow,
            "clock_low" => Self::ClockLow,
            "output_low" => Self::OutputLow,
            "edge_clock_high" => Self::EdgeClockHigh,
            "nonlogic" => Self::NonLogic,
            _ => Self::Line,
        }
    }
}

impl std::fmt::Display for PinGraphicalStyle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Line => "line",
            Self::Inverted => "inverted",
            Self::Clock => "clock",
            Self::InvertedClock => "inverted_clock",
            Self::InputLow => "input_low",
            Self::ClockLow => "clock_low",
            Self::OutputLow => "output_low",
            Self::EdgeClockHigh => "edge_clock_high",
            Self::NonLogic => "nonlogic",
        };
        write!(f, "{s}")
    }
}

/// A pin definition local to a [`LibrarySymbol`] (§3 `PinDefinition`).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PinDefinition {
    pub electrical_type: ElectricalType,
    pub graphical_style: PinGraphicalStyle,
    pub pos: Pos,
    pub length: f32,
    pub hide: bool,
    pub name: PinProperty,
    pub number: PinProperty,
}

/// A reusable symbol definition (§3 `SymbolDefinition`).
#[derive(Debug, Clone, PartialEq)]
pub struct LibrarySymbol {
    pub lib_id: String,
    pub extends: Option<String>,
    pub power: bool,
    pub pin_numbers: bool,
    pub pin_names: bool,
    pub pin_names_offset: Option<f32>,
    pub in_bom: bool,
    pub on_board: bool,
    pub exclude_from_sim: bool,
    pub props: Vec<Property>,
    pub graphics: Vec<GraphicItem>,
    pub pins: Vec<PinDefinition>,
}

impl LibrarySymbol {
    pub fn pin(&self, id: &str) -> std::result::Result<Option<&PinDefinition>, Error> {
        let by_number: Vec<&PinDefinition> =
            self.pins.iter().filter(|p| p.number.name == id).collect();
        if by_number.len() > 1 {
            return Err(Error::AmbiguousReference(id.to_string(), by_number.len()));
        }
        if let Some(p) = by_number.first() {
            return Ok(Some(p));
        }
        let by_name: Vec<&PinDefinition> = self.pins.iter().filter(|p| p.name.name == id).collect();
        if by_name.len() > 1 {
            return Err(Error::AmbiguousReference(id.to_string(), by_name.len()));
        }
        Ok(by_name.first().copied())
    }
}

/// One project/path/reference/unit grouping (§3, KiCad 6+ `instances` block).
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Instance {
    pub project: String,
    pub path: String,
    pub reference: String,
    pub unit: u8,
}

/// A placed symbol instance (§3 `SymbolInstance`/`TemplateInstance`).
#[derive(Clone, Debug, PartialEq)]
pub struct Symbol {
    pub lib_id: String,
    pub pos: Pos,
    pub mirror: Option<String>,
    pub unit: u8,
    pub in_bom: bool,
    pub on_board: bool,
    pub exclude_from_sim: bool,
    pub dnp: bool,
    pub uuid: String,
    pub props: Vec<Property>,
    pub pins: Vec<(String, String)>,
    pub instances: Vec<Instance>,
}

impl Default for Symbol {
    fn default() -> Self {
        Symbol {
            lib_id: String::new(),
            pos: Pos::default(),
            mirror: None,
            unit: 1,
            in_bom: true,
            on_board: true,
            exclude_from_sim: false,
            dnp: false,
            uuid: crate::new_uuid(),
            props: Vec::new(),
            pins: Vec::new(),
            instances: Vec::new(),
        }
    }
}

impl Symbol {
    pub fn property(&self, key: &str) -> String {
        self.props
            .iter()
            .find(|p| p.key == key)
            .map(|p| p.value.clone())
            .unwrap_or_default()
    }

    pub fn set_property(&mut self, key: &str, value: &str) {
        if let Some(p) = self.props.iter_mut().find(|p| p.key == key) {
            p.value = value.to_string();
        } else {
            self.props.push(Property::new(key, value));
        }
    }

    pub fn reference(&self) -> String {
        self.property(el::PROPERTY_REFERENCE)
    }

    /// Is this the reserved off-sheet clone source for `lib_id` (§3)?
    pub fn is_template(&self) -> bool {
        self.reference().starts_with(TEMPLATE_PREFIX)
    }
}

pub fn template_reference(library: &str, symbol: &str) -> String {
    format!("{TEMPLATE_PREFIX}{library}_{symbol}")
}

#[derive(Debug, Clone, PartialEq)]
pub struct Wire {
    pub pts: Pts,
    pub stroke: Stroke,
    pub uuid: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelKind {
    Local,
    Global,
    Hierarchical,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub pos: Pos,
    pub effects: Effects,
    pub kind: LabelKind,
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Junction {
    pub pos: Pos,
    pub diameter: f32,
    pub uuid: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NoConnect {
    pub pos: Pos,
    pub uuid: String,
}

/// The schematic document (§3 `Document`).
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub version: String,
    pub generator: String,
    pub generator_version: Option<String>,
    pub uuid: String,
    pub paper: PaperSize,
    pub title_block: TitleBlock,
    pub library_symbols: Vec<LibrarySymbol>,
    pub junctions: Vec<Junction>,
    pub no_connects: Vec<NoConnect>,
    pub wires: Vec<Wire>,
    pub labels: Vec<Label>,
    pub symbols: Vec<Symbol>,
}

impl Default for Schema {
    fn default() -> Self {
        Schema {
            version: SCHEMA_VERSION.to_string(),
            generator: GENERATOR.to_string(),
            generator_version: None,
            uuid: crate::new_uuid(),
            paper: PaperSize::A4,
            title_block: TitleBlock::default(),
            library_symbols: Vec::new(),
            junctions: Vec::new(),
            no_connects: Vec::new(),
            wires: Vec::new(),
            labels: Vec::new(),
            symbols: Vec::new(),
        }
    }
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let tree = SexpTree::parse(&text)?;
        let mut schema = reader::read(&tree)?;
        schema.discard_corrupt_templates();
        Ok(schema)
    }

    /// Parse-mutate-serialize-write atomically: write to a temp file in
    /// the same directory, then rename over the target (§9 design notes).
    pub fn save(&self, path: &Path) -> Result<()> {
        let text = self.serialize();
        let dir = path.parent().unwrap_or_else(|| Path::new("."));
        let tmp = dir.join(format!(
            ".{}.tmp",
            path.file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| "schema".to_string())
        ));
        std::fs::write(&tmp, text)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }

    pub fn serialize(&self) -> String {
        writer::write(self)
    }

    pub fn symbol(&self, reference: &str, unit: u8) -> Option<&Symbol> {
        self.symbols
            .iter()
            .find(|s| s.reference() == reference && s.unit == unit)
    }

    pub fn symbols_by_reference(&self, reference: &str) -> Vec<&Symbol> {
        self.symbols.iter().filter(|s| s.reference() == reference).collect()
    }

    pub fn library_symbol(&self, lib_id: &str) -> Option<&LibrarySymbol> {
        self.library_symbols.iter().find(|s| s.lib_id == lib_id)
    }

    pub fn has_library_symbol(&self, lib_id: &str) -> bool {
        self.library_symbol(lib_id).is_some()
    }

    pub fn template(&self, library: &str, symbol: &str) -> Option<&Symbol> {
        let reference = template_reference(library, symbol);
        self.symbols.iter().find(|s| s.reference() == reference)
    }

    pub fn template_count(&self) -> usize {
        self.symbols.iter().filter(|s| s.is_template()).count()
    }

    /// Discard any template subtree whose `lib_id` parses as a bare
    /// number — the historical defect the injector (§4.3) must never
    /// reproduce. Defense-in-depth: `reader::read_symbol_instance` already
    /// rejects this at parse time, but a document assembled in memory
    /// (rather than read from disk) bypasses that check.
    pub fn discard_corrupt_templates(&mut self) {
        self.symbols
            .retain(|s| !(s.is_template() && s.lib_id.trim().parse::<f64>().is_ok()));
    }
}
