//! PinLocator (§4.5): resolve a placed pin's absolute connection point.
//!
//! The rotation sign below is the one direct consequence this crate
//! carries from the ambiguity flagged in §9: standard counter-clockwise
//! rotation, the same convention the teacher's own rotation test uses
//! (rotating `(0,5)` by 90° lands at `(-5,0)`).

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use indexmap::IndexMap;

use crate::error::{Error, Result};
use crate::gr::Pt;
use crate::schema::{Schema, GRID};

struct CachedSchema {
    mtime: Option<SystemTime>,
    schema: Schema,
    /// instance uuid -> pin identifier (as looked up) -> absolute point
    points: IndexMap<String, IndexMap<String, Pt>>,
}

#[derive(Default)]
pub struct PinLocator {
    cache: RefCell<HashMap<PathBuf, CachedSchema>>,
}

impl PinLocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Absolute connection point of `pin_id` (number or name) on the
    /// instance with reference `reference`.
    pub fn locate(&self, schematic_path: &Path, reference: &str, pin_id: &str) -> Result<Pt> {
        self.ensure_loaded(schematic_path)?;
        let schema = self.cached_schema(schematic_path);
        let instance = schema
            .symbol(reference, 1)
            .or_else(|| schema.symbols.iter().find(|s| s.reference() == reference))
            .ok_or_else(|| Error::InstanceNotFound(reference.to_string()))?;

        if let Some(pt) = self.cached_point(schematic_path, &instance.uuid, pin_id) {
            return Ok(pt);
        }

        let definition = schema
            .library_symbol(&instance.lib_id)
            .ok_or_else(|| Error::SymbolNotFound(instance.lib_id.clone(), pin_id.to_string(), String::new()))?;
        let pin = definition
            .pin(pin_id)?
            .ok_or_else(|| Error::InstanceNotFound(format!("{reference}.{pin_id}")))?;

        let point = Self::compute(instance.pos, pin.pos, pin.length);
        self.store(schematic_path, &instance.uuid, pin_id, point);
        Ok(point)
    }

    /// §4.5 step 3-5: local attachment point, rotate by instance angle,
    /// translate, snap to grid.
    fn compute(instance: crate::gr::Pos, pin_local: crate::gr::Pos, length: f32) -> Pt {
        let alpha = pin_local.angle.to_radians();
        let local_x = pin_local.x + length * alpha.cos();
        let local_y = pin_local.y + length * alpha.sin();

        let theta = instance.angle.to_radians();
        let (cos, sin) = (crate::round(theta.cos()), crate::round(theta.sin()));
        let abs_x = instance.x + local_x * cos - local_y * sin;
        let abs_y = instance.y + local_x * sin + local_y * cos;

        Pt::new(abs_x, abs_y).snap(GRID)
    }

    /// §4.5's cache is mandatory, not advisory: a fresh cache entry must
    /// skip re-reading and re-parsing the document entirely, since
    /// `NetTracer::get_net_connections` calls `locate` once per pin on
    /// every symbol in the schematic.
    fn ensure_loaded(&self, path: &Path) -> Result<()> {
        let mtime = std::fs::metadata(path).and_then(|m| m.modified()).ok();
        let stale = self
            .cache
            .borrow()
            .get(path)
            .map(|c| c.mtime != mtime)
            .unwrap_or(true);
        if stale {
            let schema = Schema::load(path)?;
            self.cache.borrow_mut().insert(
                path.to_path_buf(),
                CachedSchema { mtime, schema, points: IndexMap::new() },
            );
        }
        Ok(())
    }

    fn cached_schema(&self, path: &Path) -> Schema {
        self.cache
            .borrow()
            .get(path)
            .expect("ensure_loaded just populated this entry")
            .schema
            .clone()
    }

    fn cached_point(&self, path: &Path, instance_uuid: &str, pin_id: &str) -> Option<Pt> {
        self.cache
            .borrow()
            .get(path)
            .and_then(|c| c.points.get(instance_uuid))
            .and_then(|pins| pins.get(pin_id))
            .copied()
    }

    fn store(&self, path: &Path, instance_uuid: &str, pin_id: &str, point: Pt) {
        if let Some(entry) = self.cache.borrow_mut().get_mut(path) {
            entry
                .points
                .entry(instance_uuid.to_string())
                .or_default()
                .insert(pin_id.to_string(), point);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gr::Pos;

    #[test]
    fn pin_location_is_rotation_equivariant() {
        let pin_local = Pos::new(0.0, 5.0, 0.0);
        let p0 = PinLocator::compute(Pos::new(0.0, 0.0, 0.0), pin_local, 0.0);
        let p90 = PinLocator::compute(Pos::new(0.0, 0.0, 90.0), pin_local, 0.0);
        // rotating (0,5) by 90 degrees counter-clockwise lands at (-5,0).
        assert!((p90.x - (-5.0)).abs() < 0.01);
        assert!((p90.y - 0.0).abs() < 0.01);
        assert!((p0.x - 0.0).abs() < 0.01);
        assert!((p0.y - 5.0).abs() < 0.01);
    }

    #[test]
    fn pin_attachment_point_follows_local_angle_and_length() {
        let pt = PinLocator::compute(Pos::new(0.0, 0.0, 0.0), Pos::new(0.0, 0.0, 90.0), 2.5);
        assert!((pt.x - 0.0).abs() < 0.01);
        assert!((pt.y - 2.5).abs() < 0.01);
    }
}
