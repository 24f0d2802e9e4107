//! Serialize a [`Schema`] back to `.kicad_sch` text.
//!
//! Grounded in the teacher's `schema_writer.rs` (builder-driven, one
//! `Builder::push`/`end` pair per element). The magic tag and version are
//! always the crate's own fixed constants (§4.1 invariant), never whatever
//! was read from the source file.

use crate::gr::{Effects, GraphicItem, Pos, Property, Pts, Stroke};
use crate::sx::builder::Builder;
use crate::sx::constants::el;

use super::{
    DOCUMENT_TAG, GENERATOR, Label, LabelKind, LibrarySymbol, Schema, Symbol, Wire, SCHEMA_VERSION,
};

pub fn write(schema: &Schema) -> String {
    let mut b = Builder::new();
    b.push(DOCUMENT_TAG);
    b.push(el::VERSION).int(SCHEMA_VERSION.parse().unwrap_or(0)).end();
    b.push(el::GENERATOR).value(GENERATOR).end();
    b.push(el::UUID).text(&schema.uuid).end();
    b.push(el::PAPER).text(&schema.paper.to_string()).end();

    write_title_block(&mut b, schema);

    b.push(el::LIB_SYMBOLS);
    for sym in &schema.library_symbols {
        write_library_symbol(&mut b, sym);
    }
    b.end();

    for wire in &schema.wires {
        write_wire(&mut b, wire);
    }
    for junction in &schema.junctions {
        b.push(el::JUNCTION);
        write_pos(&mut b, el::AT, junction.pos);
        b.push(el::DIAMETER).float(junction.diameter).end();
        b.push(el::UUID).text(&junction.uuid).end();
        b.end();
    }
    for nc in &schema.no_connects {
        b.push(el::NO_CONNECT);
        write_pos(&mut b, el::AT, nc.pos);
        b.push(el::UUID).text(&nc.uuid).end();
        b.end();
    }
    for label in &schema.labels {
        write_label(&mut b, label);
    }
    for sym in &schema.symbols {
        write_symbol_instance(&mut b, sym);
    }

    b.end();
    b.sexp().map(|root| crate::sx::SexpTree::new(root).serialize()).unwrap_or_default()
}

fn write_title_block(b: &mut Builder, schema: &Schema) {
    let tb = &schema.title_block;
    if tb.title.is_none() && tb.date.is_none() && tb.revision.is_none() && tb.company_name.is_none() && tb.comment.is_empty() {
        return;
    }
    b.push(el::TITLE_BLOCK);
    if let Some(t) = &tb.title {
        b.push(el::TITLE_BLOCK_TITLE).text(t).end();
    }
    if let Some(d) = &tb.date {
        b.push(el::TITLE_BLOCK_DATE).text(d).end();
    }
    if let Some(r) = &tb.revision {
        b.push(el::TITLE_BLOCK_REV).text(r).end();
    }
    if let Some(c) = &tb.company_name {
        b.push(el::TITLE_BLOCK_COMPANY).text(c).end();
    }
    for (n, text) in &tb.comment {
        b.push(el::TITLE_BLOCK_COMMENT).int(*n as i64).text(text).end();
    }
    b.end();
}

fn write_pos(b: &mut Builder, tag: &str, pos: Pos) {
    b.push(tag).float(pos.x).float(pos.y);
    if pos.angle != 0.0 {
        b.float(pos.angle);
    } else {
        b.int(0);
    }
    b.end();
}

fn write_pts(b: &mut Builder, pts: &Pts) {
    b.push(el::PTS);
    for pt in &pts.0 {
        b.push(el::XY).float(pt.x).float(pt.y).end();
    }
    b.end();
}

fn write_stroke(b: &mut Builder, stroke: &Stroke) {
    b.push(el::STROKE);
    b.push(el::WIDTH).float(stroke.width).end();
    b.push(el::TYPE).value(&stroke.stroke_type.unwrap_or_default().to_string()).end();
    b.end();
}

fn write_fill(b: &mut Builder, fill: crate::gr::FillType) {
    b.push(el::FILL);
    b.push(el::TYPE).value(&fill.to_string()).end();
    b.end();
}

fn write_effects(b: &mut Builder, effects: &Effects) {
    b.push(el::EFFECTS);
    b.push(el::FONT);
    b.push(el::SIZE).float(effects.font.size.0).float(effects.font.size.1).end();
    if effects.font.bold {
        b.value(el::BOLD);
    }
    if effects.font.italic {
        b.value(el::ITALIC);
    }
    b.end();
    if !effects.justify.is_empty() {
        b.push(el::JUSTIFY);
        for j in &effects.justify {
            b.value(justify_str(*j));
        }
        b.end();
    }
    if effects.hide {
        b.value(el::HIDE);
    }
    b.end();
}

fn justify_str(j: crate::gr::Justify) -> &'static str {
    use crate::gr::Justify::*;
    match j {
        Left => "left",
        Right => "right",
        Top => "top",
        Bottom => "bottom",
        Mirror => "mirror",
    }
}

fn write_property(b: &mut Builder, prop: &Property) {
    b.push(el::PROPERTY).text(&prop.key).text(&prop.value);
    write_pos(b, el::AT, prop.pos);
    write_effects(b, &prop.effects);
    b.end();
}

fn write_graphic_item(b: &mut Builder, item: &GraphicItem) {
    match item {
        GraphicItem::Line(p) | GraphicItem::Polyline(p) => {
            b.push(el::POLYLINE);
            write_pts(b, &p.pts);
            write_stroke(b, &p.stroke);
            write_fill(b, p.fill);
            b.end();
        }
        GraphicItem::Rectangle(r) => {
            b.push(el::RECTANGLE);
            write_pos(b, el::START, Pos::new(r.start.x, r.start.y, 0.0));
            write_pos(b, el::END, Pos::new(r.end.x, r.end.y, 0.0));
            write_stroke(b, &r.stroke);
            write_fill(b, r.fill);
            b.end();
        }
        GraphicItem::Circle(c) => {
            b.push(el::CIRCLE);
            write_pos(b, el::CENTER, Pos::new(c.center.x, c.center.y, 0.0));
            b.push(el::RADIUS).float(c.radius).end();
            write_stroke(b, &c.stroke);
            write_fill(b, c.fill);
            b.end();
        }
        GraphicItem::Arc(a) => {
            b.push(el::ARC);
            write_pos(b, el::START, Pos::new(a.start.x, a.start.y, 0.0));
            write_pos(b, el::MID, Pos::new(a.mid.x, a.mid.y, 0.0));
            write_pos(b, el::END, Pos::new(a.end.x, a.end.y, 0.0));
            write_stroke(b, &a.stroke);
            write_fill(b, a.fill);
            b.end();
        }
    }
}

fn write_library_symbol(b: &mut Builder, sym: &LibrarySymbol) {
    b.push(el::SYMBOL).text(&sym.lib_id);
    if let Some(extends) = &sym.extends {
        b.push(el::EXTENDS).text(extends).end();
    }
    if sym.power {
        b.push(el::POWER).end();
    }
    b.push(el::PIN_NUMBERS);
    if !sym.pin_numbers {
        b.value(el::HIDE);
    }
    b.end();
    b.push(el::PIN_NAMES);
    if let Some(offset) = sym.pin_names_offset {
        b.push(el::OFFSET).float(offset).end();
    }
    if !sym.pin_names {
        b.value(el::HIDE);
    }
    b.end();
    b.push(el::IN_BOM).value(yesno(sym.in_bom)).end();
    b.push(el::ON_BOARD).value(yesno(sym.on_board)).end();
    for prop in &sym.props {
        write_property(b, prop);
    }
    for item in &sym.graphics {
        write_graphic_item(b, item);
    }
    for pin in &sym.pins {
        write_pin_definition(b, pin);
    }
    b.end();
}

fn write_pin_definition(b: &mut Builder, pin: &super::PinDefinition) {
    b.push(el::PIN)
        .value(&pin.electrical_type.to_string())
        .value(&pin.graphical_style.to_string());
    write_pos(b, el::AT, pin.pos);
    b.push(el::LENGTH).float(pin.length).end();
    if pin.hide {
        b.value(el::HIDE);
    }
    b.push(el::NAME).text(&pin.name.name);
    write_effects(b, &pin.name.effects);
    b.end();
    b.push(el::NUMBER).text(&pin.number.name);
    write_effects(b, &pin.number.effects);
    b.end();
    b.end();
}

fn write_wire(b: &mut Builder, wire: &Wire) {
    b.push(el::WIRE);
    write_pts(b, &wire.pts);
    write_stroke(b, &wire.stroke);
    b.push(el::UUID).text(&wire.uuid).end();
    b.end();
}

fn write_label(b: &mut Builder, label: &Label) {
    let tag = match label.kind {
        LabelKind::Local => el::LABEL,
        LabelKind::Global | LabelKind::Hierarchical => el::GLOBAL_LABEL,
    };
    b.push(tag).text(&label.text);
    write_pos(b, el::AT, label.pos);
    write_effects(b, &label.effects);
    b.push(el::UUID).text(&label.uuid).end();
    b.end();
}

fn write_symbol_instance(b: &mut Builder, sym: &Symbol) {
    b.push(el::SYMBOL);
    b.push(el::LIB_ID).text(&sym.lib_id).end();
    write_pos(b, el::AT, sym.pos);
    if let Some(mirror) = &sym.mirror {
        b.push(el::MIRROR).value(mirror).end();
    }
    b.push(el::SYMBOL_UNIT).int(sym.unit as i64).end();
    b.push(el::IN_BOM).value(yesno(sym.in_bom)).end();
    b.push(el::ON_BOARD).value(yesno(sym.on_board)).end();
    b.push(el::EXCLUDE_FROM_SIM).value(yesno(sym.exclude_from_sim)).end();
    if sym.dnp {
        b.push(el::DNP).value(el::YES).end();
    }
    b.push(el::UUID).text(&sym.uuid).end();
    for prop in &sym.props {
        write_property(b, prop);
    }
    for (number, uuid) in &sym.pins {
        b.push(el::PIN).text(number);
        b.push(el::UUID).text(uuid).end();
        b.end();
    }
    if !sym.instances.is_empty() {
        b.push(el::INSTANCES);
        for (project, insts) in group_by_project(&sym.instances) {
            b.push(el::PROJECT).text(project);
            for inst in insts {
                b.push(el::PATH).text(&inst.path);
                b.push(el::REFERENCE).text(&inst.reference).end();
                b.push(el::SYMBOL_UNIT).int(inst.unit as i64).end();
                b.end();
            }
            b.end();
        }
        b.end();
    }
    b.end();
}

fn group_by_project(instances: &[super::Instance]) -> Vec<(&str, Vec<&super::Instance>)> {
    let mut groups: Vec<(&str, Vec<&super::Instance>)> = Vec::new();
    for inst in instances {
        if let Some(g) = groups.iter_mut().find(|(p, _)| *p == inst.project.as_str()) {
            g.1.push(inst);
        } else {
            groups.push((inst.project.as_str(), vec![inst]));
        }
    }
    groups
}

fn yesno(v: bool) -> &'static str {
    if v {
        el::YES
    } else {
        el::NO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_is_stable() {
        let schema = Schema::new();
        let text = write(&schema);
        let tree = crate::sx::SexpTree::parse(&text).unwrap();
        let reparsed = super::super::reader::read(&tree).unwrap();
        assert_eq!(schema.uuid, reparsed.uuid);

        // re-serializing what we just re-read must land on the exact same
        // text; a diff here means the writer is lossy in some field.
        let second_pass = write(&reparsed);
        if text != second_pass {
            let diff = similar::TextDiff::from_lines(&text, &second_pass);
            panic!("round trip drifted:\n{}", diff.unified_diff());
        }
    }

    #[test]
    fn fixed_version_and_generator_always_written() {
        let mut schema = Schema::new();
        schema.version = "1".to_string();
        schema.generator = "someone_elses_tool".to_string();
        let text = write(&schema);
        assert!(text.contains(&format!("(version {SCHEMA_VERSION})")));
        assert!(text.contains(&format!("(generator {GENERATOR})")));
    }
}
