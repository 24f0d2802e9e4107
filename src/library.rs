//! SymbolLibraryIndex (§4.2): locate and cache `.kicad_sym` libraries.
//!
//! Grounded in the teacher's file-path-keyed caching pattern, generalized
//! to hold a name index separate from the fully parsed tree so discovery
//! stays cheap: opening every library in the search path is unavoidable,
//! but building the full typed `LibrarySymbol` model for every entry in
//! it is not.

use std::cell::RefCell;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::schema::reader;
use crate::schema::LibrarySymbol;
use crate::sx::constants::el;
use crate::sx::SexpTree;

const LIBRARY_EXTENSION: &str = "kicad_sym";

struct CachedLibrary {
    mtime: Option<SystemTime>,
    names: Vec<String>,
    tree: SexpTree,
}

pub struct SymbolLibraryIndex {
    dirs: Vec<PathBuf>,
    cache: RefCell<IndexMap<PathBuf, CachedLibrary>>,
}

impl SymbolLibraryIndex {
    pub fn new(dirs: Vec<PathBuf>) -> Self {
        SymbolLibraryIndex {
            dirs,
            cache: RefCell::new(IndexMap::new()),
        }
    }

    /// Return every library file path under the search directories,
    /// loading (or reusing a cached, mtime-fresh copy of) each.
    fn library_paths(&self) -> Vec<PathBuf> {
        let mut paths = Vec::new();
        for dir in &self.dirs {
            let Ok(entries) = fs::read_dir(dir) else {
                continue;
            };
            for entry in entries.flatten() {
                let path = entry.path();
                if path.extension().and_then(|e| e.to_str()) == Some(LIBRARY_EXTENSION) {
                    paths.push(path);
                }
            }
        }
        paths
    }

    fn ensure_loaded(&self, path: &Path) -> Result<()> {
        let mtime = fs::metadata(path).and_then(|m| m.modified()).ok();
        let stale = self
            .cache
            .borrow()
            .get(path)
            .map(|c| c.mtime != mtime)
            .unwrap_or(true);
        if !stale {
            return Ok(());
        }
        let text = fs::read_to_string(path)?;
        let tree = SexpTree::parse(&text)?;
        let names = tree
            .root()
            .query(el::SYMBOL)
            .filter_map(|n| n.get::<String>(0))
            .collect();
        self.cache
            .borrow_mut()
            .insert(path.to_path_buf(), CachedLibrary { mtime, names, tree });
        Ok(())
    }

    fn library_name(path: &Path) -> String {
        path.file_stem().and_then(|s| s.to_str()).unwrap_or_default().to_string()
    }

    /// Returns the library file containing `library:symbol`.
    pub fn locate(&self, library: &str, symbol: &str) -> Result<PathBuf> {
        for path in self.library_paths() {
            if Self::library_name(&path) != library {
                continue;
            }
            self.ensure_loaded(&path)?;
            let cache = self.cache.borrow();
            if cache.get(&path).map(|c| c.names.iter().any(|n| n == symbol)).unwrap_or(false) {
                return Ok(path);
            }
        }
        Err(self.not_found(library, symbol))
    }

    fn not_found(&self, library: &str, symbol: &str) -> Error {
        let fq = format!("{library}:{symbol}");
        let suggestion = self.closest_match(&fq).unwrap_or_default();
        Error::SymbolNotFound(library.to_string(), symbol.to_string(), suggestion)
    }

    fn closest_match(&self, fq: &str) -> Option<String> {
        let mut best: Option<(usize, String)> = None;
        for path in self.library_paths() {
            if self.ensure_loaded(&path).is_err() {
                continue;
            }
            let library = Self::library_name(&path);
            let cache = self.cache.borrow();
            let Some(entry) = cache.get(&path) else { continue };
            for name in &entry.names {
                let candidate = format!("{library}:{name}");
                let dist = levenshtein(fq, &candidate);
                if dist <= 3 && best.as_ref().map(|(d, _)| dist < *d).unwrap_or(true) {
                    best = Some((dist, candidate));
                }
            }
        }
        best.map(|(_, name)| name)
    }

    /// Returns a deep copy of the named `SymbolDefinition`.
    pub fn extract_definition(&self, library: &str, symbol: &str) -> Result<LibrarySymbol> {
        let path = self.locate(library, symbol)?;
        self.ensure_loaded(&path)?;
        let cache = self.cache.borrow();
        let tree = &cache.get(&path).expect("just loaded").tree;
        let node = tree
            .root()
            .query(el::SYMBOL)
            .find(|n| n.get::<String>(0).as_deref() == Some(symbol))
            .ok_or_else(|| Error::SymbolNotFound(library.to_string(), symbol.to_string(), String::new()))?;
        let mut def = reader::read_library_symbol_public(node)?;
        // the bare `symbol` node carries only its own name; the fully
        // qualified `library:symbol` form is what schematics reference it by.
        def.lib_id = format!("{library}:{symbol}");
        Ok(def)
    }

    /// Case-insensitive substring search over symbol names, optionally
    /// restricted to one library.
    pub fn search_by_name(&self, pattern: &str, library: Option<&str>) -> Vec<String> {
        let pattern = pattern.to_lowercase();
        let mut results = Vec::new();
        for path in self.library_paths() {
            let name = Self::library_name(&path);
            if let Some(lib) = library {
                if lib != name {
                    continue;
                }
            }
            if self.ensure_loaded(&path).is_err() {
                continue;
            }
            let cache = self.cache.borrow();
            if let Some(entry) = cache.get(&path) {
                for sym in &entry.names {
                    if sym.to_lowercase().contains(&pattern) {
                        results.push(format!("{name}:{sym}"));
                    }
                }
            }
        }
        results
    }
}

/// Iterative Levenshtein distance, used for `SymbolNotFound` suggestions.
fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut row: Vec<usize> = (0..=b.len()).collect();
    for i in 1..=a.len() {
        let mut prev = row[0];
        row[0] = i;
        for j in 1..=b.len() {
            let cur = row[j];
            row[j] = if a[i - 1] == b[j - 1] {
                prev
            } else {
                1 + prev.min(row[j]).min(row[j - 1])
            };
            prev = cur;
        }
    }
    row[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn levenshtein_matches_known_distances() {
        assert_eq!(0, levenshtein("Device:R", "Device:R"));
        assert_eq!(1, levenshtein("Device:R", "Device:C"));
        assert_eq!(3, levenshtein("kitten", "sitting"));
    }

    #[test]
    fn locate_in_empty_search_path_reports_not_found() {
        let index = SymbolLibraryIndex::new(vec![]);
        let err = index.locate("Device", "R").unwrap_err();
        assert!(matches!(err, Error::SymbolNotFound(_, _, _)));
    }
}
