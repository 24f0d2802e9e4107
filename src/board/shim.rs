//! BoardOpShim (§4.8): the board-side analogue of ComponentEditor/WireManager.

use std::path::{Path, PathBuf};

use crate::error::{Error, Result};
use crate::gr::{validate_coordinate, Pos, Property, Pt};

use super::{Board, Footprint, Track, Via};

/// Analogue of [`crate::library::SymbolLibraryIndex`] over footprint
/// `.pretty` libraries: footprints are not cloned from an off-board
/// template the way symbols are (a PCB footprint carries its own full
/// definition inline), so this index only needs to confirm existence.
pub struct FootprintLibraryIndex {
    dirs: Vec<PathBuf>,
}

impl FootprintLibraryIndex {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        FootprintLibraryIndex { dirs }
    }

    pub fn locate(&self, library: &str, footprint: &str) -> Result<PathBuf> {
        for dir in &self.dirs {
            let pretty = dir.join(format!("{library}.pretty"));
            let candidate = pretty.join(format!("{footprint}.kicad_mod"));
            if candidate.is_file() {
                return Ok(candidate);
            }
        }
        Err(Error::SymbolNotFound(library.to_string(), footprint.to_string(), String::new()))
    }
}

pub struct FootprintInfo {
    pub reference: String,
    pub footprint_id: String,
    pub x: f32,
    pub y: f32,
    pub rotation: f32,
    pub layer: String,
}

pub struct BoardOpShim<'a> {
    footprints: &'a FootprintLibraryIndex,
}

impl<'a> BoardOpShim<'a> {
    pub fn new(footprints: &'a FootprintLibraryIndex) -> Self {
        BoardOpShim { footprints }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn place_footprint(
        &self,
        board_path: &Path,
        library: &str,
        footprint: &str,
        reference: &str,
        value: &str,
        x: f32,
        y: f32,
        rotation: f32,
        layer: &str,
    ) -> Result<String> {
        validate_coordinate(x, y)?;
        self.footprints.locate(library, footprint)?;
        let mut board = Board::load(board_path).unwrap_or_else(|_| Board::new());
        let uuid = crate::new_uuid();
        board.footprints.push(Footprint {
            footprint_id: format!("{library}:{footprint}"),
            pos: Pos::new(x, y, rotation),
            layer: layer.to_string(),
            locked: false,
            uuid: uuid.clone(),
            props: vec![Property::new("Reference", reference), Property::new("Value", value)],
        });
        board.save(board_path)?;
        Ok(uuid)
    }

    pub fn move_footprint(&self, board_path: &Path, reference: &str, x: f32, y: f32, rotation: f32) -> Result<()> {
        validate_coordinate(x, y)?;
        let mut board = Board::load(board_path)?;
        let fp = board
            .footprints
            .iter_mut()
            .find(|f| f.reference() == reference)
            .ok_or_else(|| Error::InstanceNotFound(reference.to_string()))?;
        fp.pos = Pos::new(x, y, rotation);
        board.save(board_path)
    }

    pub fn delete_footprint(&self, board_path: &Path, reference: &str) -> Result<()> {
        let mut board = Board::load(board_path)?;
        let before = board.footprints.len();
        board.footprints.retain(|f| f.reference() != reference);
        if board.footprints.len() == before {
            return Err(Error::InstanceNotFound(reference.to_string()));
        }
        board.save(board_path)
    }

    pub fn get_footprints(&self, board_path: &Path) -> Result<Vec<FootprintInfo>> {
        let board = Board::load(board_path)?;
        Ok(board
            .footprints
            .into_iter()
            .map(|f| FootprintInfo {
                reference: f.reference(),
                footprint_id: f.footprint_id,
                x: f.pos.x,
                y: f.pos.y,
                rotation: f.pos.angle,
                layer: f.layer,
            })
            .collect())
    }

    pub fn add_track(&self, board_path: &Path, start: Pt, end: Pt, width: f32, layer: &str, net: i64) -> Result<()> {
        validate_coordinate(start.x, start.y)?;
        validate_coordinate(end.x, end.y)?;
        let mut board = Board::load(board_path).unwrap_or_else(|_| Board::new());
        board.tracks.push((Track { start, end, width, layer: layer.to_string(), net }, crate::new_uuid()));
        board.save(board_path)
    }

    pub fn add_via(&self, board_path: &Path, at: Pt, drill: f32, layers: (&str, &str), net: i64) -> Result<()> {
        validate_coordinate(at.x, at.y)?;
        let mut board = Board::load(board_path).unwrap_or_else(|_| Board::new());
        board.vias.push((
            Via { at, drill, layers: (layers.0.to_string(), layers.1.to_string()), net },
            crate::new_uuid(),
        ));
        board.save(board_path)
    }

    /// §4.8 iterator-invalidation rule: snapshot the matching indices
    /// before deleting any of them.
    pub fn delete_tracks(&self, board_path: &Path, filter: impl Fn(&Track) -> bool) -> Result<usize> {
        let mut board = Board::load(board_path)?;
        let mut indices: Vec<usize> = board
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, (t, _))| filter(t))
            .map(|(i, _)| i)
            .collect();
        let deleted = indices.len();
        indices.sort_unstable();
        for i in indices.into_iter().rev() {
            board.tracks.remove(i);
        }
        board.save(board_path)?;
        Ok(deleted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn tempdir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("recad_mcp_board_{}", crate::new_uuid()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn resistor_footprint_library(dir: &Path) -> FootprintLibraryIndex {
        let pretty = dir.join("Resistor_SMD.pretty");
        fs::create_dir_all(&pretty).unwrap();
        fs::write(pretty.join("R_0603_1608Metric.kicad_mod"), "(footprint)").unwrap();
        FootprintLibraryIndex::new(vec![dir.to_path_buf()])
    }

    #[test]
    fn place_move_delete_footprint() {
        let dir = tempdir();
        let board_path = dir.join("b.kicad_pcb");
        let index = resistor_footprint_library(&dir);
        let shim = BoardOpShim::new(&index);

        shim.place_footprint(&board_path, "Resistor_SMD", "R_0603_1608Metric", "R1", "10k", 10.0, 10.0, 0.0, "F.Cu").unwrap();
        assert_eq!(1, shim.get_footprints(&board_path).unwrap().len());

        shim.move_footprint(&board_path, "R1", 20.0, 20.0, 90.0).unwrap();
        let fp = shim.get_footprints(&board_path).unwrap().into_iter().next().unwrap();
        assert_eq!((20.0, 20.0, 90.0), (fp.x, fp.y, fp.rotation));

        shim.delete_footprint(&board_path, "R1").unwrap();
        assert!(shim.get_footprints(&board_path).unwrap().is_empty());
    }

    #[test]
    fn delete_tracks_snapshots_before_mutating() {
        let dir = tempdir();
        let board_path = dir.join("b.kicad_pcb");
        let index = FootprintLibraryIndex::new(vec![]);
        let shim = BoardOpShim::new(&index);

        for i in 0..5 {
            shim.add_track(&board_path, Pt::new(0.0, i as f32), Pt::new(10.0, i as f32), 0.25, "F.Cu", 1).unwrap();
        }
        let deleted = shim.delete_tracks(&board_path, |t| t.net == 1).unwrap();
        assert_eq!(5, deleted);
        assert!(Board::load(&board_path).unwrap().tracks.is_empty());
    }
}
