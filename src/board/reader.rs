//! Parse a [`super::Board`] from a [`SexpTree`].

use crate::error::{Error, Result};
use crate::gr::{Pos, Property};
use crate::sx::constants::el;
use crate::sx::{Sexp, SexpTree};

use super::{Board, Footprint, Track, Via, DOCUMENT_TAG};

pub fn read(tree: &SexpTree) -> Result<Board> {
    let root = tree.root();
    if root.name != DOCUMENT_TAG {
        return Err(Error::BadGrammar(
            "board".into(),
            format!("expected a `{DOCUMENT_TAG}` document, found `{}`", root.name),
        ));
    }

    let version = root.first::<i64>(el::VERSION).map(|v| v.to_string()).unwrap_or_else(|| super::BOARD_VERSION.to_string());
    let generator = root.first(el::GENERATOR).unwrap_or_else(|| super::GENERATOR.to_string());
    let uuid = root.first(el::UUID).unwrap_or_else(crate::new_uuid);

    let mut footprints = Vec::new();
    let mut tracks = Vec::new();
    let mut vias = Vec::new();

    for node in root.nodes() {
        match node.name.as_str() {
            tag if tag == el::FOOTPRINT => footprints.push(read_footprint(node)),
            tag if tag == el::SEGMENT => tracks.push(read_track(node)),
            tag if tag == el::VIA => vias.push(read_via(node)),
            _ => {}
        }
    }

    Ok(Board { version, generator, uuid, footprints, tracks, vias })
}

fn read_pos(node: &Sexp) -> Pos {
    node.find_first(el::AT)
        .map(|n| Pos::new(n.get(0).unwrap_or_default(), n.get(1).unwrap_or_default(), n.get(2).unwrap_or_default()))
        .unwrap_or_default()
}

fn read_property(node: &Sexp) -> Property {
    Property {
        key: node.get(0).unwrap_or_default(),
        value: node.get(1).unwrap_or_default(),
        pos: Pos::default(),
        effects: Default::default(),
    }
}

fn read_footprint(node: &Sexp) -> Footprint {
    Footprint {
        footprint_id: node.get(0).unwrap_or_default(),
        pos: read_pos(node),
        layer: node.find_first(el::LAYER).and_then(|n| n.get(0)).unwrap_or_default(),
        locked: node.has_flag("locked"),
        uuid: node.first(el::TSTAMP).or_else(|| node.first(el::UUID)).unwrap_or_else(crate::new_uuid),
        props: node.query(el::PROPERTY).map(read_property).collect(),
    }
}

fn read_track(node: &Sexp) -> (Track, String) {
    let track = Track {
        start: node.find_first(el::START).map(|n| crate::gr::Pt::new(n.get(0).unwrap_or_default(), n.get(1).unwrap_or_default())).unwrap_or_default(),
        end: node.find_first(el::END).map(|n| crate::gr::Pt::new(n.get(0).unwrap_or_default(), n.get(1).unwrap_or_default())).unwrap_or_default(),
        width: node.first(el::WIDTH).unwrap_or_default(),
        layer: node.find_first(el::LAYER).and_then(|n| n.get(0)).unwrap_or_default(),
        net: node.first(el::NET).unwrap_or_default(),
    };
    let uuid = node.first(el::TSTAMP).or_else(|| node.first(el::UUID)).unwrap_or_else(crate::new_uuid);
    (track, uuid)
}

fn read_via(node: &Sexp) -> (Via, String) {
    let layers_node = node.find_first(el::LAYER);
    let layers = layers_node
        .map(|n| (n.get::<String>(0).unwrap_or_default(), n.get::<String>(1).unwrap_or_default()))
        .unwrap_or_default();
    let via = Via {
        at: node.find_first(el::AT).map(|n| crate::gr::Pt::new(n.get(0).unwrap_or_default(), n.get(1).unwrap_or_default())).unwrap_or_default(),
        drill: node.first(el::DRILL).unwrap_or_default(),
        layers,
        net: node.first(el::NET).unwrap_or_default(),
    };
    let uuid = node.first(el::TSTAMP).or_else(|| node.first(el::UUID)).unwrap_or_else(crate::new_uuid);
    (via, uuid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_non_board_root() {
        let tree = SexpTree::parse("(kicad_sch (version 1))").unwrap();
        assert!(read(&tree).is_err());
    }
}
