//! WireManager (§4.6): emit wire and label records.

use std::path::Path;

use crate::error::Result;
use crate::gr::{Effects, Pos, Pt, Pts, Stroke};
use crate::pins::PinLocator;
use crate::schema::{Label, LabelKind, Schema, Wire, GRID};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStyle {
    Direct,
    OrthogonalH,
    OrthogonalV,
}

pub struct WireManager<'a> {
    pins: &'a PinLocator,
}

impl<'a> WireManager<'a> {
    pub fn new(pins: &'a PinLocator) -> Self {
        WireManager { pins }
    }

    pub fn add_wire(&self, schematic_path: &Path, a: Pt, b: Pt, stroke: Option<Stroke>) -> Result<()> {
        let mut schema = Schema::load(schematic_path)?;
        self.push_wire(&mut schema, a, b, stroke.unwrap_or_default())?;
        schema.save(schematic_path)
    }

    fn push_wire(&self, schema: &mut Schema, a: Pt, b: Pt, stroke: Stroke) -> Result<()> {
        schema.wires.push(Wire {
            pts: Pts(vec![a.try_snap(GRID)?, b.try_snap(GRID)?]),
            stroke,
            uuid: crate::new_uuid(),
        });
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub fn add_connection(
        &self,
        schematic_path: &Path,
        ref_a: &str,
        pin_a: &str,
        ref_b: &str,
        pin_b: &str,
        style: ConnectionStyle,
    ) -> Result<()> {
        let a = self.pins.locate(schematic_path, ref_a, pin_a)?;
        let b = self.pins.locate(schematic_path, ref_b, pin_b)?;

        let mut schema = Schema::load(schematic_path)?;
        match style {
            ConnectionStyle::Direct => self.push_wire(&mut schema, a, b, Stroke::default())?,
            ConnectionStyle::OrthogonalH => {
                let corner = Pt::new(b.x, a.y);
                self.push_wire(&mut schema, a, corner, Stroke::default())?;
                self.push_wire(&mut schema, corner, b, Stroke::default())?;
            }
            ConnectionStyle::OrthogonalV => {
                let corner = Pt::new(a.x, b.y);
                self.push_wire(&mut schema, a, corner, Stroke::default())?;
                self.push_wire(&mut schema, corner, b, Stroke::default())?;
            }
        }
        schema.save(schematic_path)
    }

    pub fn add_label(
        &self,
        schematic_path: &Path,
        text: &str,
        at: Pt,
        kind: LabelKind,
        orientation: f32,
    ) -> Result<()> {
        let at = at.try_snap(GRID)?;
        let mut schema = Schema::load(schematic_path)?;
        schema.labels.push(Label {
            text: text.to_string(),
            pos: Pos::new(at.x, at.y, orientation),
            effects: Effects::default(),
            kind,
            uuid: crate::new_uuid(),
        });
        schema.save(schematic_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn orthogonal_h_routes_through_the_horizontal_corner() {
        let pins = PinLocator::new();
        let manager = WireManager::new(&pins);
        let mut schema = Schema::new();
        manager.push_wire(&mut schema, Pt::new(0.0, 0.0), Pt::new(0.0, 0.0), Stroke::default()).unwrap();
        schema.wires.clear();

        let a = Pt::new(0.0, 0.0);
        let b = Pt::new(10.0, 10.0);
        let corner = Pt::new(b.x, a.y);
        manager.push_wire(&mut schema, a, corner, Stroke::default()).unwrap();
        manager.push_wire(&mut schema, corner, b, Stroke::default()).unwrap();
        assert_eq!(2, schema.wires.len());
        assert_eq!(corner, schema.wires[0].pts.0[1]);
    }
}
