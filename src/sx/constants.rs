//! Element-name constants, grounded in the teacher's `sexp::constants::el`
//! module (referenced throughout `sexp/mod.rs`/`schema_reader.rs` as
//! `el::WIRE`, `el::UUID`, etc. instead of bare string literals).

pub mod el {
    pub const UUID: &str = "uuid";
    pub const GENERATOR: &str = "generator";
    pub const VERSION: &str = "version";
    pub const PAPER: &str = "paper";
    pub const TITLE_BLOCK: &str = "title_block";
    pub const TITLE_BLOCK_TITLE: &str = "title";
    pub const TITLE_BLOCK_DATE: &str = "date";
    pub const TITLE_BLOCK_REV: &str = "rev";
    pub const TITLE_BLOCK_COMPANY: &str = "company";
    pub const TITLE_BLOCK_COMMENT: &str = "comment";

    pub const LIB_SYMBOLS: &str = "lib_symbols";
    pub const SYMBOL: &str = "symbol";
    pub const LIB_ID: &str = "lib_id";
    pub const EXTENDS: &str = "extends";
    pub const POWER: &str = "power";
    pub const PIN_NUMBERS: &str = "pin_numbers";
    pub const PIN_NAMES: &str = "pin_names";
    pub const OFFSET: &str = "offset";
    pub const IN_BOM: &str = "in_bom";
    pub const ON_BOARD: &str = "on_board";
    pub const EXCLUDE_FROM_SIM: &str = "exclude_from_sim";
    pub const PROPERTY: &str = "property";
    pub const PIN: &str = "pin";
    pub const NAME: &str = "name";
    pub const NUMBER: &str = "number";
    pub const LENGTH: &str = "length";
    pub const HIDE: &str = "hide";
    pub const AT: &str = "at";
    pub const SYMBOL_UNIT: &str = "unit";
    pub const MIRROR: &str = "mirror";
    pub const DNP: &str = "dnp";
    pub const INSTANCES: &str = "instances";
    pub const PROJECT: &str = "project";
    pub const PATH: &str = "path";
    pub const REFERENCE: &str = "reference";

    pub const WIRE: &str = "wire";
    pub const PTS: &str = "pts";
    pub const XY: &str = "xy";
    pub const STROKE: &str = "stroke";
    pub const WIDTH: &str = "width";
    pub const TYPE: &str = "type";
    pub const FILL: &str = "fill";
    pub const COLOR: &str = "color";

    pub const LABEL: &str = "label";
    pub const GLOBAL_LABEL: &str = "global_label";
    pub const SHAPE: &str = "shape";
    pub const JUNCTION: &str = "junction";
    pub const DIAMETER: &str = "diameter";
    pub const NO_CONNECT: &str = "no_connect";
    pub const FIELDS_AUTOPLACED: &str = "fields_autoplaced";
    pub const EFFECTS: &str = "effects";
    pub const FONT: &str = "font";
    pub const SIZE: &str = "size";
    pub const ITALIC: &str = "italic";
    pub const BOLD: &str = "bold";
    pub const JUSTIFY: &str = "justify";

    pub const YES: &str = "yes";
    pub const NO: &str = "no";

    pub const PROPERTY_REFERENCE: &str = "Reference";
    pub const PROPERTY_VALUE: &str = "Value";
    pub const PROPERTY_FOOTPRINT: &str = "Footprint";
    pub const PROPERTY_DATASHEET: &str = "Datasheet";

    pub const START: &str = "start";
    pub const MID: &str = "mid";
    pub const END: &str = "end";
    pub const CENTER: &str = "center";
    pub const RADIUS: &str = "radius";
    pub const ARC: &str = "arc";
    pub const CIRCLE: &str = "circle";
    pub const RECTANGLE: &str = "rectangle";
    pub const POLYLINE: &str = "polyline";
    pub const LINE: &str = "line";
    pub const TEXT: &str = "text";

    // board document
    pub const FOOTPRINT: &str = "footprint";
    pub const LAYER: &str = "layer";
    pub const SEGMENT: &str = "segment";
    pub const VIA: &str = "via";
    pub const NET: &str = "net";
    pub const DRILL: &str = "drill";
    pub const TSTAMP: &str = "tstamp";
}
