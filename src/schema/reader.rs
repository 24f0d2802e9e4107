//! Parse a [`SexpTree`] into a [`Schema`].
//!
//! Grounded in the teacher's `schema_reader.rs`: walk the tree node by
//! node with the `SexpValue` accessors, never panicking on a missing or
//! malformed field — every gap becomes a `Result::Err` or a sensible
//! default, since this reader runs on files the system did not write.

use crate::error::{Error, Result};
use crate::gr::{
    Arc, Circle, Effects, Font, GraphicItem, Justify, Pos, Property, Pt, Pts, Polyline,
    Rectangle, Stroke, StrokeType, TitleBlock,
};
use crate::sx::constants::el;
use crate::sx::{Sexp, SexpTree};

use super::{
    DOCUMENT_TAG, ElectricalType, Instance, Junction, Label, LabelKind, LibrarySymbol,
    NoConnect, PinDefinition, PinGraphicalStyle, PinProperty, Schema, Symbol, Wire,
};

pub fn read(tree: &SexpTree) -> Result<Schema> {
    let root = tree.root();
    if root.name != DOCUMENT_TAG {
        return Err(Error::BadGrammar(
            "schema".into(),
            format!("expected a `{DOCUMENT_TAG}` document, found `{}`", root.name),
        ));
    }

    let version = root
        .first::<i64>(el::VERSION)
        .map(|v| v.to_string())
        .unwrap_or_else(|| super::SCHEMA_VERSION.to_string());
    let generator = root
        .first::<String>(el::GENERATOR)
        .unwrap_or_else(|| super::GENERATOR.to_string());
    let generator_version = root.find_first("generator_version").and_then(|n| n.get(0));
    let uuid = root.first::<String>(el::UUID).unwrap_or_else(crate::new_uuid);
    let paper = root
        .find_first(el::PAPER)
        .and_then(|n| n.get::<String>(0))
        .map(|s| s.as_str().into())
        .unwrap_or_default();
    let title_block = root
        .find_first(el::TITLE_BLOCK)
        .map(read_title_block)
        .unwrap_or_default();

    let library_symbols = root
        .find_first(el::LIB_SYMBOLS)
        .map(|n| n.query(el::SYMBOL).map(read_library_symbol).collect::<Result<Vec<_>>>())
        .transpose()?
        .unwrap_or_default();

    let mut junctions = Vec::new();
    let mut no_connects = Vec::new();
    let mut wires = Vec::new();
    let mut labels = Vec::new();
    let mut symbols = Vec::new();

    for node in root.nodes() {
        match node.name.as_str() {
            tag if tag == el::WIRE => wires.push(read_wire(node)?),
            tag if tag == el::JUNCTION => junctions.push(read_junction(node)),
            tag if tag == el::NO_CONNECT => no_connects.push(read_no_connect(node)),
            tag if tag == el::LABEL => labels.push(read_label(node, LabelKind::Local)),
            tag if tag == el::GLOBAL_LABEL => labels.push(read_label(node, LabelKind::Global)),
            tag if tag == el::SYMBOL => symbols.push(read_symbol_instance(node)?),
            _ => {}
        }
    }

    Ok(Schema {
        version,
        generator,
        generator_version,
        uuid,
        paper,
        title_block,
        library_symbols,
        junctions,
        no_connects,
        wires,
        labels,
        symbols,
    })
}

fn read_title_block(node: &Sexp) -> TitleBlock {
    let mut comment = Vec::new();
    for c in node.query(el::TITLE_BLOCK_COMMENT) {
        if let (Some(n), Some(text)) = (c.get::<u8>(0), c.get::<String>(1)) {
            comment.push((n, text));
        }
    }
    TitleBlock {
        title: node.first(el::TITLE_BLOCK_TITLE),
        date: node.first(el::TITLE_BLOCK_DATE),
        revision: node.first(el::TITLE_BLOCK_REV),
        company_name: node.first(el::TITLE_BLOCK_COMPANY),
        comment,
    }
}

fn read_pos(node: &Sexp, tag: &str) -> Pos {
    node.find_first(tag)
        .map(|n| Pos::new(n.get(0).unwrap_or_default(), n.get(1).unwrap_or_default(), n.get(2).unwrap_or_default()))
        .unwrap_or_default()
}

fn read_stroke(node: &Sexp) -> Stroke {
    node.find_first(el::STROKE)
        .map(|n| Stroke {
            width: n.first(el::WIDTH).unwrap_or_default(),
            stroke_type: n
                .find_first(el::TYPE)
                .and_then(|t| t.get::<String>(0))
                .map(|s| StrokeType::from(s.as_str())),
        })
        .unwrap_or_default()
}

fn read_fill(node: &Sexp) -> crate::gr::FillType {
    node.find_first(el::FILL)
        .and_then(|n| n.find_first(el::TYPE))
        .and_then(|t| t.get::<String>(0))
        .map(|s| s.as_str().into())
        .unwrap_or_default()
}

fn read_effects(node: &Sexp) -> Effects {
    let Some(effects) = node.find_first(el::EFFECTS) else {
        return Effects::default();
    };
    let font = effects
        .find_first(el::FONT)
        .map(|f| Font {
            face: None,
            size: f
                .find_first(el::SIZE)
                .map(|s| (s.get(0).unwrap_or(1.27), s.get(1).unwrap_or(1.27)))
                .unwrap_or((1.27, 1.27)),
            thickness: None,
            bold: f.has_flag(el::BOLD),
            italic: f.has_flag(el::ITALIC),
        })
        .unwrap_or_default();
    let justify = effects
        .find_first(el::JUSTIFY)
        .map(|j| j.leaf_strings().into_iter().map(Justify::from).collect())
        .unwrap_or_default();
    Effects {
        font,
        justify,
        hide: effects.has_flag(el::HIDE),
    }
}

fn read_property(node: &Sexp) -> Property {
    Property {
        key: node.get::<String>(0).unwrap_or_default(),
        value: node.get::<String>(1).unwrap_or_default(),
        pos: read_pos(node, el::AT),
        effects: read_effects(node),
    }
}

fn read_pts(node: &Sexp) -> Pts {
    node.find_first(el::PTS)
        .map(|p| {
            Pts(p
                .query(el::XY)
                .map(|xy| Pt::new(xy.get(0).unwrap_or_default(), xy.get(1).unwrap_or_default()))
                .collect())
        })
        .unwrap_or_default()
}

fn read_graphic_item(node: &Sexp) -> Option<GraphicItem> {
    let stroke = read_stroke(node);
    let fill = read_fill(node);
    match node.name.as_str() {
        tag if tag == el::POLYLINE => Some(GraphicItem::Polyline(Polyline { pts: read_pts(node), stroke, fill })),
        tag if tag == el::RECTANGLE => Some(GraphicItem::Rectangle(Rectangle {
            start: read_pos(node, el::START).point(),
            end: read_pos(node, el::END).point(),
            stroke,
            fill,
        })),
        tag if tag == el::CIRCLE => Some(GraphicItem::Circle(Circle {
            center: read_pos(node, el::CENTER).point(),
            radius: node.first(el::RADIUS).unwrap_or_default(),
            stroke,
            fill,
        })),
        tag if tag == el::ARC => Some(GraphicItem::Arc(Arc {
            start: read_pos(node, el::START).point(),
            mid: read_pos(node, el::MID).point(),
            end: read_pos(node, el::END).point(),
            stroke,
            fill,
        })),
        _ => None,
    }
}

fn read_pin_property(node: Option<&Sexp>) -> PinProperty {
    match node {
        Some(n) => PinProperty {
            name: n.get(0).unwrap_or_default(),
            effects: read_effects(n),
        },
        None => PinProperty::default(),
    }
}

fn read_pin_definition(node: &Sexp) -> PinDefinition {
    PinDefinition {
        electrical_type: node.get::<String>(0).map(|s| ElectricalType::from(s.as_str())).unwrap_or_default(),
        graphical_style: node.get::<String>(1).map(|s| PinGraphicalStyle::from(s.as_str())).unwrap_or_default(),
        pos: read_pos(node, el::AT),
        length: node.find_first(el::LENGTH).and_then(|n| n.get(0)).unwrap_or(2.54),
        hide: node.has_flag(el::HIDE),
        name: read_pin_property(node.find_first(el::NAME)),
        number: read_pin_property(node.find_first(el::NUMBER)),
    }
}

/// Entry point for [`crate::library::SymbolLibraryIndex`]: parse one
/// `SymbolDefinition` subtree in isolation, outside a full document read.
pub fn read_library_symbol_public(node: &Sexp) -> Result<LibrarySymbol> {
    read_library_symbol(node)
}

fn read_library_symbol(node: &Sexp) -> Result<LibrarySymbol> {
    let lib_id = node.get::<String>(0).unwrap_or_default();
    let mut graphics = Vec::new();
    for n in node.nodes() {
        if let Some(g) = read_graphic_item(n) {
            graphics.push(g);
        }
    }
    let props = node.query(el::PROPERTY).map(read_property).collect();
    let mut pins: Vec<PinDefinition> = node.query(el::PIN).map(read_pin_definition).collect();
    // unit sub-symbols (`lib_id_0_1`) nest their own pins/graphics under child `symbol` blocks.
    for child in node.query(el::SYMBOL) {
        for n in child.nodes() {
            if let Some(g) = read_graphic_item(n) {
                graphics.push(g);
            }
        }
        pins.extend(child.query(el::PIN).map(read_pin_definition));
    }

    Ok(LibrarySymbol {
        lib_id,
        extends: node.first(el::EXTENDS),
        power: node.has_flag(el::POWER),
        pin_numbers: node.find_first(el::PIN_NUMBERS).map(|n| !n.has_flag(el::HIDE)).unwrap_or(true),
        pin_names: node.find_first(el::PIN_NAMES).map(|n| !n.has_flag(el::HIDE)).unwrap_or(true),
        pin_names_offset: node.find_first(el::PIN_NAMES).and_then(|n| n.first(el::OFFSET)),
        in_bom: node.first(el::IN_BOM).unwrap_or(true),
        on_board: node.first(el::ON_BOARD).unwrap_or(true),
        exclude_from_sim: node.first(el::EXCLUDE_FROM_SIM).unwrap_or(false),
        props,
        graphics,
        pins,
    })
}

fn read_instance(node: &Sexp) -> Vec<Instance> {
    let project = node.get::<String>(0).unwrap_or_default();
    node.query(el::PATH)
        .map(|p| Instance {
            project: project.clone(),
            path: p.get::<String>(0).unwrap_or_default(),
            reference: p.first(el::REFERENCE).unwrap_or_default(),
            unit: p.first(el::SYMBOL_UNIT).unwrap_or(1),
        })
        .collect()
}

fn read_symbol_instance(node: &Sexp) -> Result<Symbol> {
    if crate::sx::string_field_is_numeric(node, el::LIB_ID) {
        return Err(Error::BadGrammar(
            "schema".into(),
            "symbol instance lib_id must be a string, found a bare number".into(),
        ));
    }
    let lib_id = node.first(el::LIB_ID).unwrap_or_default();
    let pins = node
        .query(el::PIN)
        .map(|p| (p.get::<String>(0).unwrap_or_default(), p.first(el::UUID).unwrap_or_default()))
        .collect();
    let instances = node
        .find_first(el::INSTANCES)
        .map(|n| n.query(el::PROJECT).flat_map(read_instance).collect())
        .unwrap_or_default();

    Ok(Symbol {
        lib_id,
        pos: read_pos(node, el::AT),
        mirror: node.find_first(el::MIRROR).and_then(|n| n.get(0)),
        unit: node.first(el::SYMBOL_UNIT).unwrap_or(1),
        in_bom: node.first(el::IN_BOM).unwrap_or(true),
        on_board: node.first(el::ON_BOARD).unwrap_or(true),
        exclude_from_sim: node.first(el::EXCLUDE_FROM_SIM).unwrap_or(false),
        dnp: node.first(el::DNP).unwrap_or(false),
        uuid: node.first(el::UUID).unwrap_or_else(crate::new_uuid),
        props: node.query(el::PROPERTY).map(read_property).collect(),
        pins,
        instances,
    })
}

fn read_wire(node: &Sexp) -> Result<Wire> {
    Ok(Wire {
        pts: read_pts(node),
        stroke: read_stroke(node),
        uuid: node.first(el::UUID).unwrap_or_else(crate::new_uuid),
    })
}

fn read_junction(node: &Sexp) -> Junction {
    Junction {
        pos: read_pos(node, el::AT),
        diameter: node.first(el::DIAMETER).unwrap_or_default(),
        uuid: node.first(el::UUID).unwrap_or_else(crate::new_uuid),
    }
}

fn read_no_connect(node: &Sexp) -> NoConnect {
    NoConnect {
        pos: read_pos(node, el::AT),
        uuid: node.first(el::UUID).unwrap_or_else(crate::new_uuid),
    }
}

fn read_label(node: &Sexp, kind: LabelKind) -> Label {
    Label {
        text: node.get(0).unwrap_or_default(),
        pos: read_pos(node, el::AT),
        effects: read_effects(node),
        kind,
        uuid: node.first(el::UUID).unwrap_or_else(crate::new_uuid),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_kicad_sch_root() {
        let tree = SexpTree::parse("(kicad_pcb (version 1))").unwrap();
        let err = read(&tree).unwrap_err();
        assert!(matches!(err, Error::BadGrammar(_, _)));
    }

    #[test]
    fn reads_minimal_document() {
        let text = "(kicad_sch (version 20231120) (generator recad_mcp) (paper \"A4\"))";
        let tree = SexpTree::parse(text).unwrap();
        let schema = read(&tree).unwrap();
        assert_eq!("20231120", schema.version);
        assert!(schema.symbols.is_empty());
    }

    #[test]
    fn rejects_numeric_lib_id() {
        let text = "(kicad_sch (version 1) (symbol (lib_id -100) (at 0 0 0) (uuid \"a\")))";
        let tree = SexpTree::parse(text).unwrap();
        assert!(read(&tree).is_err());
    }
}
