//! Graphical primitives shared by the schematic and board data models.
//!
//! Grounded in the teacher's `gr` module (referenced throughout
//! `sexp/mod.rs` and `schema.rs`): small plain-data structs with no
//! behavior beyond geometry helpers.

use std::fmt::Display;

use crate::error::{Error, Result};

/// Bound on any coordinate this crate will accept from a caller (§7
/// `BadCoordinate`). Generous enough for any realistic sheet or board —
/// KiCad documents stay well within a few hundred units — while still
/// catching obviously-garbage input (NaN, overflow, a misplaced unit
/// conversion) before it reaches a document.
pub const COORDINATE_LIMIT: f32 = 10_000.0;

/// A 2-D point in document coordinates.
#[derive(Debug, Clone, Copy, Default)]
pub struct Pt {
    pub x: f32,
    pub y: f32,
}

impl Pt {
    pub fn new(x: f32, y: f32) -> Self {
        Pt { x, y }
    }

    /// Snap to the schematic grid, cancelling representation drift.
    pub fn snap(&self, grid: f32) -> Pt {
        Pt {
            x: (self.x / grid).round() * grid,
            y: (self.y / grid).round() * grid,
        }
    }

    /// Snap to the grid, rejecting coordinates that can't be validated:
    /// non-finite values, or values outside [`COORDINATE_LIMIT`] (§7
    /// `BadCoordinate`).
    pub fn try_snap(&self, grid: f32) -> Result<Pt> {
        if !self.x.is_finite() || !self.y.is_finite() {
            return Err(Error::BadCoordinate(format!("non-finite coordinate ({}, {})", self.x, self.y)));
        }
        if self.x.abs() > COORDINATE_LIMIT || self.y.abs() > COORDINATE_LIMIT {
            return Err(Error::BadCoordinate(format!(
                "({}, {}) lies outside the plausible range of +/-{COORDINATE_LIMIT}",
                self.x, self.y
            )));
        }
        Ok(self.snap(grid))
    }

    /// Equality under a coordinate tolerance (grid-snap comparisons).
    pub fn close(&self, other: &Pt, tolerance: f32) -> bool {
        (self.x - other.x).abs() <= tolerance && (self.y - other.y).abs() <= tolerance
    }
}

/// Validate a bare `(x, y)` pair against [`COORDINATE_LIMIT`] without
/// grid-snapping it (§7 `BadCoordinate`), for placements — symbol
/// instances, footprints, tracks, vias — that carry their own angle/layer
/// fields rather than routing through [`Pt::try_snap`].
pub fn validate_coordinate(x: f32, y: f32) -> Result<()> {
    if !x.is_finite() || !y.is_finite() {
        return Err(Error::BadCoordinate(format!("non-finite coordinate ({x}, {y})")));
    }
    if x.abs() > COORDINATE_LIMIT || y.abs() > COORDINATE_LIMIT {
        return Err(Error::BadCoordinate(format!(
            "({x}, {y}) lies outside the plausible range of +/-{COORDINATE_LIMIT}"
        )));
    }
    Ok(())
}

/// Bitwise equality, not numeric equality: the wire graph keys on `Pt`
/// after every coordinate has passed through [`Pt::snap`], so exact bit
/// patterns are what matters, not general float comparison.
impl PartialEq for Pt {
    fn eq(&self, other: &Self) -> bool {
        self.x.to_bits() == other.x.to_bits() && self.y.to_bits() == other.y.to_bits()
    }
}

impl Eq for Pt {}

impl std::hash::Hash for Pt {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.x.to_bits().hash(state);
        self.y.to_bits().hash(state);
    }
}

/// A polyline: an ordered list of points.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Pts(pub Vec<Pt>);

/// Position plus rotation angle, in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Pos {
    pub x: f32,
    pub y: f32,
    pub angle: f32,
}

impl Pos {
    pub fn new(x: f32, y: f32, angle: f32) -> Self {
        Pos { x, y, angle }
    }

    pub fn point(&self) -> Pt {
        Pt {
            x: self.x,
            y: self.y,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StrokeType {
    #[default]
    Default,
    Solid,
    Dash,
    DashDot,
    DashDotDot,
    Dot,
}

impl From<&str> for StrokeType {
    fn from(s: &str) -> Self {
        match s {
            "solid" => Self::Solid,
            "dash" => Self::Dash,
            "dash_dot" => Self::DashDot,
            "dash_dot_dot" => Self::DashDotDot,
            "dot" => Self::Dot,
            _ => Self::Default,
        }
    }
}

impl Display for StrokeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Solid => "solid",
            Self::Dash => "dash",
            Self::DashDot => "dash_dot",
            Self::DashDotDot => "dash_dot_dot",
            Self::Dot => "dot",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stroke {
    pub width: f32,
    pub stroke_type: Option<StrokeType>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    None,
    Rgb(u8, u8, u8),
    Rgba(u8, u8, u8, u8),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FillType {
    #[default]
    None,
    Outline,
    Background,
}

impl From<&str> for FillType {
    fn from(s: &str) -> Self {
        match s {
            "outline" => Self::Outline,
            "background" => Self::Background,
            _ => Self::None,
        }
    }
}

impl Display for FillType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::None => "none",
            Self::Outline => "outline",
            Self::Background => "background",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justify {
    Left,
    Right,
    Top,
    Bottom,
    Mirror,
}

impl From<String> for Justify {
    fn from(s: String) -> Self {
        match s.as_str() {
            "right" => Self::Right,
            "top" => Self::Top,
            "bottom" => Self::Bottom,
            "mirror" => Self::Mirror,
            _ => Self::Left,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Font {
    pub face: Option<String>,
    pub size: (f32, f32),
    pub thickness: Option<f32>,
    pub bold: bool,
    pub italic: bool,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Effects {
    pub font: Font,
    pub justify: Vec<Justify>,
    pub hide: bool,
}

/// A key/value field attached to a symbol or footprint instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub key: String,
    pub value: String,
    pub pos: Pos,
    pub effects: Effects,
}

impl Property {
    pub fn new(key: &str, value: &str) -> Self {
        Property {
            key: key.to_string(),
            value: value.to_string(),
            pos: Pos::default(),
            effects: Effects::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PaperSize {
    #[default]
    A4,
    A3,
    A2,
    A1,
    A0,
}

impl From<&str> for PaperSize {
    fn from(s: &str) -> Self {
        match s {
            "A3" => Self::A3,
            "A2" => Self::A2,
            "A1" => Self::A1,
            "A0" => Self::A0,
            _ => Self::A4,
        }
    }
}

impl Display for PaperSize {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::A4 => "A4",
            Self::A3 => "A3",
            Self::A2 => "A2",
            Self::A1 => "A1",
            Self::A0 => "A0",
        };
        write!(f, "{name}")
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TitleBlock {
    pub title: Option<String>,
    pub date: Option<String>,
    pub revision: Option<String>,
    pub company_name: Option<String>,
    pub comment: Vec<(u8, String)>,
}

/// A graphical sub-symbol primitive, as found inside a `LibrarySymbol`.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphicItem {
    Line(Polyline),
    Polyline(Polyline),
    Rectangle(Rectangle),
    Circle(Circle),
    Arc(Arc),
}

#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub pts: Pts,
    pub stroke: Stroke,
    pub fill: FillType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rectangle {
    pub start: Pt,
    pub end: Pt,
    pub stroke: Stroke,
    pub fill: FillType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Circle {
    pub center: Pt,
    pub radius: f32,
    pub stroke: Stroke,
    pub fill: FillType,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arc {
    pub start: Pt,
    pub mid: Pt,
    pub end: Pt,
    pub stroke: Stroke,
    pub fill: FillType,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn try_snap_rejects_out_of_range_coordinates() {
        let err = Pt::new(COORDINATE_LIMIT + 1.0, 0.0).try_snap(0.5).unwrap_err();
        assert!(matches!(err, Error::BadCoordinate(_)));
    }

    #[test]
    fn try_snap_rejects_non_finite_coordinates() {
        let err = Pt::new(f32::NAN, 0.0).try_snap(0.5).unwrap_err();
        assert!(matches!(err, Error::BadCoordinate(_)));
    }

    #[test]
    fn try_snap_accepts_plausible_coordinates() {
        let pt = Pt::new(12.3, 45.6).try_snap(0.5).unwrap();
        assert_eq!(pt, Pt::new(12.5, 45.5));
    }

    #[test]
    fn validate_coordinate_rejects_out_of_range() {
        assert!(validate_coordinate(0.0, -COORDINATE_LIMIT - 1.0).is_err());
        assert!(validate_coordinate(1.0, 2.0).is_ok());
    }
}
