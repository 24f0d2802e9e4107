//! ComponentEditor (§4.4): place, delete, and edit placed symbol instances.

use std::path::Path;

use crate::error::{Error, Result};
use crate::gr::{validate_coordinate, Pos};
use crate::inject::SymbolInjector;
use crate::library::SymbolLibraryIndex;
use crate::schema::Schema;
use crate::sx::constants::el;

pub struct PlacedComponent {
    pub reference: String,
    pub uuid: String,
}

#[derive(Default)]
pub struct EditedProperties<'a> {
    pub new_reference: Option<&'a str>,
    pub value: Option<&'a str>,
    pub footprint: Option<&'a str>,
}

pub struct ComponentEditor<'a> {
    index: &'a SymbolLibraryIndex,
}

impl<'a> ComponentEditor<'a> {
    pub fn new(index: &'a SymbolLibraryIndex) -> Self {
        ComponentEditor { index }
    }

    #[allow(clippy::too_many_arguments)]
    pub fn place_symbol(
        &self,
        schematic_path: &Path,
        library: &str,
        symbol: &str,
        reference: &str,
        value: &str,
        footprint: &str,
        datasheet: &str,
        x: f32,
        y: f32,
        rotation: f32,
    ) -> Result<PlacedComponent> {
        validate_coordinate(x, y)?;
        let injector = SymbolInjector::new(self.index);
        let mut schema = Schema::load(schematic_path)?;
        let template_ref = injector.ensure_present_in(&mut schema, library, symbol)?;

        let template = schema
            .symbols
            .iter()
            .find(|s| s.reference() == template_ref)
            .ok_or_else(|| Error::InstanceNotFound(template_ref.clone()))?;

        let mut placed = template.clone();
        placed.uuid = crate::new_uuid();
        placed.pos = Pos::new(x, y, rotation);
        placed.in_bom = true;
        placed.on_board = true;
        placed.dnp = false;
        placed.set_property(el::PROPERTY_REFERENCE, reference);
        placed.set_property(el::PROPERTY_VALUE, value);
        placed.set_property(el::PROPERTY_FOOTPRINT, footprint);
        placed.set_property(el::PROPERTY_DATASHEET, datasheet);

        let uuid = placed.uuid.clone();
        schema.symbols.push(placed);
        schema.save(schematic_path)?;

        Ok(PlacedComponent {
            reference: reference.to_string(),
            uuid,
        })
    }

    /// Enumerate first, delete second (§4.4): collecting every matching
    /// index before mutating, then removing in reverse order, is what
    /// keeps later removals from shifting the positions of earlier ones.
    pub fn delete_by_reference(&self, schematic_path: &Path, reference: &str) -> Result<usize> {
        let mut schema = Schema::load(schematic_path)?;
        let mut indices: Vec<usize> = schema
            .symbols
            .iter()
            .enumerate()
            .filter(|(_, s)| s.reference() == reference)
            .map(|(i, _)| i)
            .collect();
        let deleted = indices.len();
        indices.sort_unstable();
        for i in indices.into_iter().rev() {
            schema.symbols.remove(i);
        }
        schema.save(schematic_path)?;
        Ok(deleted)
    }

    pub fn edit_properties(
        &self,
        schematic_path: &Path,
        reference: &str,
        edits: EditedProperties,
    ) -> Result<String> {
        let mut schema = Schema::load(schematic_path)?;
        let matches: Vec<usize> = schema
            .symbols
            .iter()
            .enumerate()
            .filter(|(_, s)| s.reference() == reference)
            .map(|(i, _)| i)
            .collect();
        let idx = match matches.len() {
            0 => return Err(Error::InstanceNotFound(reference.to_string())),
            1 => matches[0],
            n => return Err(Error::AmbiguousReference(reference.to_string(), n)),
        };

        let symbol = &mut schema.symbols[idx];
        if let Some(new_reference) = edits.new_reference {
            symbol.set_property(el::PROPERTY_REFERENCE, new_reference);
        }
        if let Some(value) = edits.value {
            symbol.set_property(el::PROPERTY_VALUE, value);
        }
        if let Some(footprint) = edits.footprint {
            symbol.set_property(el::PROPERTY_FOOTPRINT, footprint);
        }
        let uuid = symbol.uuid.clone();
        schema.save(schematic_path)?;
        Ok(uuid)
    }

    pub fn get_components(&self, schematic_path: &Path) -> Result<Vec<crate::schema::Symbol>> {
        let schema = Schema::load(schematic_path)?;
        Ok(schema.symbols.into_iter().filter(|s| !s.is_template()).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LibrarySymbol;
    use std::fs;

    fn empty_schema_file(dir: &std::path::Path) -> std::path::PathBuf {
        let path = dir.join("a.kicad_sch");
        Schema::new().save(&path).unwrap();
        path
    }

    fn library_with_resistor(dir: &std::path::Path) -> SymbolLibraryIndex {
        let lib_path = dir.join("Device.kicad_sym");
        fs::write(
            &lib_path,
            r#"(kicad_symbol_lib (version 20231120) (generator recad_mcp)
  (symbol "R" (pin_numbers) (pin_names) (in_bom yes) (on_board yes)
    (property "Reference" "R" (at 0 0 0))
    (pin passive line (at 0 3.81 270) (length 1.27) (name "~" (effects)) (number "1" (effects)))
    (pin passive line (at 0 -3.81 90) (length 1.27) (name "~" (effects)) (number "2" (effects)))
  )
)"#,
        )
        .unwrap();
        SymbolLibraryIndex::new(vec![dir.to_path_buf()])
    }

    #[allow(dead_code)]
    fn unused(_: LibrarySymbol) {}

    #[test]
    fn scenario_a_place_duplicate_delete_verify_count() {
        let dir = tempdir();
        let path = empty_schema_file(&dir);
        let index = library_with_resistor(&dir);
        let editor = ComponentEditor::new(&index);

        editor
            .place_symbol(&path, "Device", "R", "R1", "10k", "R_0603", "", 50.8, 50.8, 0.0)
            .unwrap();
        editor
            .place_symbol(&path, "Device", "R", "R1", "10k", "R_0603", "", 60.0, 50.8, 0.0)
            .unwrap();

        let deleted = editor.delete_by_reference(&path, "R1").unwrap();
        assert_eq!(2, deleted);
        assert!(editor.get_components(&path).unwrap().is_empty());
    }

    #[test]
    fn scenario_b_dynamic_load_of_uncommon_symbol() {
        let dir = tempdir();
        let path = dir.join("b.kicad_sch");
        Schema::new().save(&path).unwrap();
        let lib_path = dir.join("Device.kicad_sym");
        fs::write(
            &lib_path,
            r#"(kicad_symbol_lib (version 20231120) (generator recad_mcp)
  (symbol "Transformer_1P_1S" (pin_numbers) (pin_names) (in_bom yes) (on_board yes)
    (property "Reference" "T" (at 0 0 0))
    (pin passive line (at 0 0 0) (length 1.27) (name "~" (effects)) (number "1" (effects)))
  )
)"#,
        )
        .unwrap();
        let index = SymbolLibraryIndex::new(vec![dir.clone()]);
        let editor = ComponentEditor::new(&index);

        editor
            .place_symbol(&path, "Device", "Transformer_1P_1S", "T1", "XFMR", "", "", 100.0, 100.0, 0.0)
            .unwrap();

        let schema = Schema::load(&path).unwrap();
        assert_eq!(1, schema.library_symbols.iter().filter(|s| s.lib_id == "Device:Transformer_1P_1S").count());
        let template = schema.template("Device", "Transformer_1P_1S").unwrap();
        assert!(template.dnp);
        let placed = schema.symbols.iter().find(|s| s.reference() == "T1").unwrap();
        assert_eq!((100.0, 100.0), (placed.pos.x, placed.pos.y));
    }

    #[test]
    fn footprint_argument_is_propagated_not_dropped() {
        let dir = tempdir();
        let path = empty_schema_file(&dir);
        let index = library_with_resistor(&dir);
        let editor = ComponentEditor::new(&index);

        editor
            .place_symbol(&path, "Device", "R", "R1", "10k", "R_0603", "", 0.0, 0.0, 0.0)
            .unwrap();

        let schema = Schema::load(&path).unwrap();
        let placed = schema.symbols.iter().find(|s| s.reference() == "R1").unwrap();
        assert_eq!("R_0603", placed.property(el::PROPERTY_FOOTPRINT));
    }

    fn tempdir() -> std::path::PathBuf {
        let dir = std::env::temp_dir().join(format!("recad_mcp_test_{}", crate::new_uuid()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }
}
