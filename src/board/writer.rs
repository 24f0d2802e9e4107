//! Serialize a [`super::Board`] back to `.kicad_pcb` text.

use crate::gr::{Pos, Property};
use crate::sx::builder::Builder;
use crate::sx::constants::el;

use super::{Board, Footprint, Track, Via, DOCUMENT_TAG, BOARD_VERSION, GENERATOR};

pub fn write(board: &Board) -> String {
    let mut b = Builder::new();
    b.push(DOCUMENT_TAG);
    b.push(el::VERSION).int(BOARD_VERSION.parse().unwrap_or(0)).end();
    b.push(el::GENERATOR).value(GENERATOR).end();
    b.push(el::UUID).text(&board.uuid).end();

    for fp in &board.footprints {
        write_footprint(&mut b, fp);
    }
    for (track, uuid) in &board.tracks {
        write_track(&mut b, track, uuid);
    }
    for (via, uuid) in &board.vias {
        write_via(&mut b, via, uuid);
    }

    b.end();
    b.sexp().map(|root| crate::sx::SexpTree::new(root).serialize()).unwrap_or_default()
}

fn write_pos(b: &mut Builder, pos: Pos) {
    b.push(el::AT).float(pos.x).float(pos.y);
    if pos.angle != 0.0 {
        b.float(pos.angle);
    }
    b.end();
}

fn write_property(b: &mut Builder, prop: &Property) {
    b.push(el::PROPERTY).text(&prop.key).text(&prop.value).end();
}

fn write_footprint(b: &mut Builder, fp: &Footprint) {
    b.push(el::FOOTPRINT).text(&fp.footprint_id);
    b.push(el::LAYER).text(&fp.layer).end();
    if fp.locked {
        b.value("locked");
    }
    b.push(el::TSTAMP).text(&fp.uuid).end();
    write_pos(b, fp.pos);
    for prop in &fp.props {
        write_property(b, prop);
    }
    b.end();
}

fn write_track(b: &mut Builder, track: &Track, uuid: &str) {
    b.push(el::SEGMENT);
    b.push(el::START).float(track.start.x).float(track.start.y).end();
    b.push(el::END).float(track.end.x).float(track.end.y).end();
    b.push(el::WIDTH).float(track.width).end();
    b.push(el::LAYER).text(&track.layer).end();
    b.push(el::NET).int(track.net).end();
    b.push(el::TSTAMP).text(uuid).end();
    b.end();
}

fn write_via(b: &mut Builder, via: &Via, uuid: &str) {
    b.push(el::VIA);
    b.push(el::AT).float(via.at.x).float(via.at.y).end();
    b.push(el::DRILL).float(via.drill).end();
    b.push(el::LAYER).text(&via.layers.0).text(&via.layers.1).end();
    b.push(el::NET).int(via.net).end();
    b.push(el::TSTAMP).text(uuid).end();
    b.end();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip_preserves_footprint_count() {
        let mut board = Board::new();
        board.footprints.push(Footprint {
            footprint_id: "Resistor_SMD:R_0603".into(),
            pos: Pos::new(10.0, 10.0, 0.0),
            layer: "F.Cu".into(),
            locked: false,
            uuid: crate::new_uuid(),
            props: vec![Property::new("Reference", "R1")],
        });
        let text = write(&board);
        let tree = crate::sx::SexpTree::parse(&text).unwrap();
        let reparsed = super::super::reader::read(&tree).unwrap();
        assert_eq!(1, reparsed.footprints.len());
        assert_eq!("R1", reparsed.footprints[0].reference());
    }
}
