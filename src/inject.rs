//! SymbolInjector (§4.3): make a library symbol usable inside a document.

use std::path::Path;

use crate::error::Result;
use crate::gr::Pos;
use crate::library::SymbolLibraryIndex;
use crate::schema::{template_reference, Schema, Symbol};
use crate::sx::constants::el;

pub struct SymbolInjector<'a> {
    index: &'a SymbolLibraryIndex,
}

impl<'a> SymbolInjector<'a> {
    pub fn new(index: &'a SymbolLibraryIndex) -> Self {
        SymbolInjector { index }
    }

    /// §4.3 contract: idempotent, never removes an existing definition or
    /// instance, never places a template inside the sheet area.
    pub fn ensure_present(&self, schematic_path: &Path, library: &str, symbol: &str) -> Result<String> {
        let mut schema = Schema::load(schematic_path)?;
        self.ensure_present_in(&mut schema, library, symbol)?;
        schema.save(schematic_path)?;
        Ok(template_reference(library, symbol))
    }

    /// The in-memory half of [`Self::ensure_present`], exposed so
    /// `ComponentEditor::place_symbol` can perform the injection and the
    /// clone against the same loaded tree (§4.4 step 2 re-parses; this
    /// lets us serve that contract either way).
    pub fn ensure_present_in(&self, schema: &mut Schema, library: &str, symbol: &str) -> Result<String> {
        let fq = format!("{library}:{symbol}");

        if !schema.has_library_symbol(&fq) {
            let def = self.index.extract_definition(library, symbol)?;
            schema.library_symbols.push(def);
        }

        if schema.template(library, symbol).is_none() {
            let k = schema.template_count();
            let mut template = Symbol {
                lib_id: fq,
                pos: Pos::new(-100.0, -100.0 - 10.0 * k as f32, 0.0),
                in_bom: false,
                on_board: false,
                dnp: true,
                ..Symbol::default()
            };
            let reference = template_reference(library, symbol);
            template.set_property(el::PROPERTY_REFERENCE, &reference);
            template.set_property(el::PROPERTY_VALUE, symbol);
            template.set_property(el::PROPERTY_FOOTPRINT, "");
            template.set_property(el::PROPERTY_DATASHEET, "");
            schema.symbols.push(template);
        }

        Ok(template_reference(library, symbol))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LibrarySymbol;

    fn stub_library_symbol(lib_id: &str) -> LibrarySymbol {
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
            pins: Vec::new(),
        }
    }

    #[test]
    fn injection_is_idempotent() {
        let mut schema = Schema::new();
        schema.library_symbols.push(stub_library_symbol("Device:R"));
        let k0 = schema.template_count();

        let index = SymbolLibraryIndex::new(vec![]);
        let injector = SymbolInjector::new(&index);

        // calling ensure_present_in twice in a row on the same schema must
        // not add a second template instance.
        injector.ensure_present_in(&mut schema, "Device", "R").unwrap();
        assert_eq!(schema.template_count(), k0 + 1);
        injector.ensure_present_in(&mut schema, "Device", "R").unwrap();
        assert_eq!(schema.template_count(), k0 + 1);
    }

    #[test]
    fn template_placed_off_sheet_with_reserved_reference() {
        let mut schema = Schema::new();
        schema.library_symbols.push(stub_library_symbol("Device:R"));
        let index = SymbolLibraryIndex::new(vec![]);
        let injector = SymbolInjector::new(&index);
        injector.ensure_present_in(&mut schema, "Device", "R").unwrap();

        let template = schema.template("Device", "R").unwrap();
        assert_eq!("_TEMPLATE_Device_R", template.reference());
        assert!(template.pos.x < 0.0 && template.pos.y < 0.0);
        assert!(!template.in_bom);
        assert!(!template.on_board);
        assert!(template.dnp);
    }
}
