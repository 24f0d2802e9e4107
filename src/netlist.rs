//! NetTracer (§4.7): follow a net from its labels through the wire graph
//! to the pins it touches.
//!
//! Grounded in the teacher's `netlist.rs`: collect every wire endpoint
//! into an `IndexMap<Pt, Vec<Pt>>` adjacency, then do an explicit-stack
//! traversal from the label points rather than modelling the graph with
//! owning cycles.

use std::path::Path;

use indexmap::IndexMap;

use crate::error::Result;
use crate::gr::Pt;
use crate::pins::PinLocator;
use crate::schema::{Schema, GRID};

const FALLBACK_RADIUS: f32 = 10.0;

pub struct NetTracer<'a> {
    pins: &'a PinLocator,
}

impl<'a> NetTracer<'a> {
    pub fn new(pins: &'a PinLocator) -> Self {
        NetTracer { pins }
    }

    /// Returns `(reference, pin)` pairs connected to `net_name`, sorted.
    pub fn get_net_connections(
        &self,
        schematic_path: &Path,
        net_name: &str,
        allow_nearest_fallback: bool,
    ) -> Result<Vec<(String, String)>> {
        let schema = Schema::load(schematic_path)?;

        let label_points: Vec<Pt> = schema
            .labels
            .iter()
            .filter(|l| l.text == net_name)
            .map(|l| l.pos.point().snap(GRID))
            .collect();
        if label_points.is_empty() {
            return Ok(Vec::new());
        }

        let graph = build_wire_graph(&schema);
        let component = connected_component(&graph, &label_points);

        let mut matched = Vec::new();
        let mut unmatched_component_points: Vec<Pt> = component.to_vec();
        let mut all_pins: Vec<(String, String, Pt)> = Vec::new();

        for symbol in schema.symbols.iter().filter(|s| !s.is_template()) {
            let Some(definition) = schema.library_symbol(&symbol.lib_id) else {
                continue;
            };
            for pin in &definition.pins {
                let id = if !pin.number.name.is_empty() { pin.number.name.clone() } else { pin.name.name.clone() };
                let Ok(point) = self.pins.locate(schematic_path, &symbol.reference(), &id) else {
                    continue;
                };
                if component.iter().any(|p| p.close(&point, 0.01)) {
                    matched.push((symbol.reference(), id.clone()));
                    unmatched_component_points.retain(|p| !p.close(&point, 0.01));
                } else {
                    all_pins.push((symbol.reference(), id, point));
                }
            }
        }

        if allow_nearest_fallback {
            for component_point in &unmatched_component_points {
                if let Some((reference, pin, _)) = all_pins
                    .iter()
                    .filter(|(_, _, p)| p.close(component_point, FALLBACK_RADIUS))
                    .min_by(|(_, _, a), (_, _, b)| {
                        distance(a, component_point)
                            .partial_cmp(&distance(b, component_point))
                            .unwrap()
                    })
                {
                    matched.push((reference.clone(), pin.clone()));
                }
            }
        }

        matched.sort();
        matched.dedup();
        Ok(matched)
    }
}

fn distance(a: &Pt, b: &Pt) -> f32 {
    ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
}

fn build_wire_graph(schema: &Schema) -> IndexMap<Pt, Vec<Pt>> {
    let mut graph: IndexMap<Pt, Vec<Pt>> = IndexMap::new();
    for wire in &schema.wires {
        for pair in wire.pts.0.windows(2) {
            let (a, b) = (pair[0].snap(GRID), pair[1].snap(GRID));
            graph.entry(a).or_default().push(b);
            graph.entry(b).or_default().push(a);
        }
    }
    graph
}

fn connected_component(graph: &IndexMap<Pt, Vec<Pt>>, seeds: &[Pt]) -> Vec<Pt> {
    let mut visited: Vec<Pt> = Vec::new();
    let mut stack: Vec<Pt> = seeds.to_vec();
    while let Some(point) = stack.pop() {
        if visited.iter().any(|p| p.close(&point, 0.01)) {
            continue;
        }
        visited.push(point);
        if let Some(neighbors) = graph.get(&point) {
            stack.extend(neighbors.iter().copied());
        }
    }
    visited
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gr::{Effects, Pos, Pts, Stroke};
    use crate::schema::{Label, LabelKind, LibrarySymbol, PinDefinition, PinProperty, Symbol, Wire};
    use std::fs;

    fn resistor_definition(lib_id: &str) -> LibrarySymbol {
        LibrarySymbol {
            lib_id: lib_id.to_string(),
            extends: None,
            power: false,
            pin_numbers: true,
            pin_names: true,
            pin_names_offset: None,
            in_bom: true,
            on_board: true,
            exclude_from_sim: false,
            props: Vec::new(),
            graphics: Vec::new(),
            pins: vec![
                PinDefinition {
                    electrical_type: Default::default(),
                    graphical_style: Default::default(),
                    pos: Pos::new(0.0, 3.81, 0.0),
                    length: 0.0,
                    hide: false,
                    name: PinProperty { name: "~".into(), effects: Effects::default() },
                    number: PinProperty { name: "1".into(), effects: Effects::default() },
                },
                PinDefinition {
                    electrical_type: Default::default(),
                    graphical_style: Default::default(),
                    pos: Pos::new(0.0, -3.81, 0.0),
                    length: 0.0,
                    hide: false,
                    name: PinProperty { name: "~".into(), effects: Effects::default() },
                    number: PinProperty { name: "2".into(), effects: Effects::default() },
                },
            ],
        }
    }

    fn placed(reference: &str, lib_id: &str, pos: Pos) -> Symbol {
        let mut s = Symbol { lib_id: lib_id.to_string(), pos, ..Symbol::default() };
        s.set_property("Reference", reference);
        s
    }

    #[test]
    fn scenario_c_traces_a_three_pin_net() {
        let mut schema = Schema::new();
        schema.library_symbols.push(resistor_definition("Device:R"));
        schema.library_symbols.push(resistor_definition("Device:C"));

        let r1 = placed("R1", "Device:R", Pos::new(0.0, 0.0, 0.0));
        let r2 = placed("R2", "Device:R", Pos::new(20.0, 0.0, 0.0));
        let c1 = placed("C1", "Device:C", Pos::new(10.0, 10.0, 0.0));
        schema.symbols.extend([r1, r2, c1]);

        // R1.pin2 at (0,-3.81) -> corner -> C1.pin1 at (10, 13.81)
        schema.wires.push(Wire {
            pts: Pts(vec![Pt::new(0.0, -3.81), Pt::new(10.0, -3.81)]),
            stroke: Stroke::default(),
            uuid: crate::new_uuid(),
        });
        schema.wires.push(Wire {
            pts: Pts(vec![Pt::new(10.0, -3.81), Pt::new(10.0, 13.81)]),
            stroke: Stroke::default(),
            uuid: crate::new_uuid(),
        });
        // R2.pin1 at (20, 3.81) joins the same network.
        schema.wires.push(Wire {
            pts: Pts(vec![Pt::new(20.0, 3.81), Pt::new(10.0, -3.81)]),
            stroke: Stroke::default(),
            uuid: crate::new_uuid(),
        });

        schema.labels.push(Label {
            text: "VCC".into(),
            pos: Pos::new(10.0, 13.81, 0.0),
            effects: Effects::default(),
            kind: LabelKind::Global,
            uuid: crate::new_uuid(),
        });

        let dir = std::env::temp_dir().join(format!("recad_mcp_net_{}", crate::new_uuid()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("c.kicad_sch");
        schema.save(&path).unwrap();

        let pins = PinLocator::new();
        let tracer = NetTracer::new(&pins);
        let result = tracer.get_net_connections(&path, "VCC", false).unwrap();

        assert_eq!(
            vec![
                ("C1".to_string(), "1".to_string()),
                ("R1".to_string(), "2".to_string()),
                ("R2".to_string(), "1".to_string()),
            ],
            result
        );
    }

    #[test]
    fn unknown_net_name_returns_empty() {
        let dir = std::env::temp_dir().join(format!("recad_mcp_net_{}", crate::new_uuid()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join("empty.kicad_sch");
        Schema::new().save(&path).unwrap();

        let pins = PinLocator::new();
        let tracer = NetTracer::new(&pins);
        assert!(tracer.get_net_connections(&path, "GND", false).unwrap().is_empty());
    }
}
