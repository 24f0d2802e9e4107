//! Line-delimited JSON request/response transport (§6).

use std::io::{BufRead, Write};
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::board::shim::{BoardOpShim, FootprintLibraryIndex};
use crate::check::ExternalCheckRunner;
use crate::component::{ComponentEditor, EditedProperties};
use crate::config::Config;
use crate::error::Error;
use crate::gr::Pt;
use crate::library::SymbolLibraryIndex;
use crate::netlist::NetTracer;
use crate::pins::PinLocator;
use crate::schema::LabelKind;
use crate::wires::{ConnectionStyle, WireManager};

#[derive(Debug, Deserialize)]
pub struct Request {
    pub command: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub kind: String,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Response {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorBody>,
}

impl Response {
    fn ok(result: Value) -> Self {
        Response { success: true, result: Some(result), error: None }
    }

    fn err(error: Error) -> Self {
        Response { success: false, result: None, error: Some(ErrorBody { kind: error_kind(&error), message: error.to_string() }) }
    }
}

fn error_kind(error: &Error) -> String {
    match error {
        Error::BadGrammar(_, _) => "BadGrammar",
        Error::SymbolNotFound(_, _, _) => "SymbolNotFound",
        Error::InstanceNotFound(_) => "InstanceNotFound",
        Error::AmbiguousReference(_, _) => "AmbiguousReference",
        Error::BadCoordinate(_) => "BadCoordinate",
        Error::CheckFailed(_, _) => "CheckFailed",
        Error::IoError(_) => "IOError",
    }
    .to_string()
}

/// Holds every piece of process-wide state a request might touch: the
/// two library indexes, the pin-location cache, and the configuration
/// governing the external checker (§5: these are the only cross-call
/// state, gated by the single-threaded request loop rather than a lock).
pub struct Server {
    config: Config,
    symbols: SymbolLibraryIndex,
    footprints: FootprintLibraryIndex,
    pins: PinLocator,
}

impl Server {
    pub fn new(config: Config) -> Self {
        let symbols = SymbolLibraryIndex::new(config.symbol_library_dirs.clone());
        let footprints = FootprintLibraryIndex::new(config.footprint_library_dirs.clone());
        Server { config, symbols, footprints, pins: PinLocator::new() }
    }

    /// Read one line-delimited JSON request per line from `input`, write
    /// one line-delimited JSON response per line to `output`, until EOF.
    pub fn serve(&self, input: impl BufRead, mut output: impl Write) -> std::io::Result<()> {
        for line in input.lines() {
            let line = line?;
            if line.trim().is_empty() {
                continue;
            }
            let response = match serde_json::from_str::<Request>(&line) {
                Ok(request) => self.dispatch(request),
                Err(e) => Response::err(Error::BadGrammar("transport".into(), e.to_string())),
            };
            writeln!(output, "{}", serde_json::to_string(&response).unwrap_or_default())?;
            output.flush()?;
        }
        Ok(())
    }

    fn dispatch(&self, request: Request) -> Response {
        log::info!("handling command {}", request.command);
        match self.handle(&request.command, &request.params) {
            Ok(result) => Response::ok(result),
            Err(e) => Response::err(e),
        }
    }

    fn handle(&self, command: &str, p: &Value) -> crate::error::Result<Value> {
        match command {
            "place_symbol" => {
                let editor = ComponentEditor::new(&self.symbols);
                let placed = editor.place_symbol(
                    &path(p, "schematicPath")?,
                    &str_field(p, "library")?,
                    &str_field(p, "symbol")?,
                    &str_field(p, "reference")?,
                    &str_field(p, "value")?,
                    &str_field(p, "footprint")?,
                    &str_field(p, "datasheet")?,
                    f32_field(p, "x")?,
                    f32_field(p, "y")?,
                    f32_field(p, "rotation")?,
                )?;
                Ok(serde_json::json!({"reference": placed.reference, "uuid": placed.uuid}))
            }
            "delete_symbol" => {
                let editor = ComponentEditor::new(&self.symbols);
                let count = editor.delete_by_reference(&path(p, "schematicPath")?, &str_field(p, "reference")?)?;
                Ok(serde_json::json!({"deletedCount": count}))
            }
            "delete_component" => {
                let shim = BoardOpShim::new(&self.footprints);
                shim.delete_footprint(&path(p, "boardPath")?, &str_field(p, "reference")?)?;
                Ok(Value::Null)
            }
            "edit_symbol" => {
                let editor = ComponentEditor::new(&self.symbols);
                let new_reference = opt_str_field(p, "newReference");
                let value = opt_str_field(p, "value");
                let footprint = opt_str_field(p, "footprint");
                let uuid = editor.edit_properties(
                    &path(p, "schematicPath")?,
                    &str_field(p, "reference")?,
                    EditedProperties {
                        new_reference: new_reference.as_deref(),
                        value: value.as_deref(),
                        footprint: footprint.as_deref(),
                    },
                )?;
                Ok(serde_json::json!({"uuid": uuid}))
            }
            "get_components" => {
                let editor = ComponentEditor::new(&self.symbols);
                let components = editor.get_components(&path(p, "schematicPath")?)?;
                Ok(serde_json::json!(components
                    .iter()
                    .map(|s| serde_json::json!({
                        "reference": s.reference(),
                        "libId": s.lib_id,
                        "x": s.pos.x, "y": s.pos.y, "rotation": s.pos.angle,
                    }))
                    .collect::<Vec<_>>()))
            }
            "add_wire" => {
                let manager = WireManager::new(&self.pins);
                manager.add_wire(
                    &path(p, "schematicPath")?,
                    Pt::new(f32_field(p, "x1")?, f32_field(p, "y1")?),
                    Pt::new(f32_field(p, "x2")?, f32_field(p, "y2")?),
                    None,
                )?;
                Ok(Value::Null)
            }
            "add_connection" => {
                let manager = WireManager::new(&self.pins);
                let style = match str_field(p, "style")?.as_str() {
                    "orthogonalH" => ConnectionStyle::OrthogonalH,
                    "orthogonalV" => ConnectionStyle::OrthogonalV,
                    _ => ConnectionStyle::Direct,
                };
                manager.add_connection(
                    &path(p, "schematicPath")?,
                    &str_field(p, "refA")?,
                    &str_field(p, "pinA")?,
                    &str_field(p, "refB")?,
                    &str_field(p, "pinB")?,
                    style,
                )?;
                Ok(Value::Null)
            }
            "add_label" => {
                let manager = WireManager::new(&self.pins);
                let kind = match str_field(p, "kind")?.as_str() {
                    "global" => LabelKind::Global,
                    "hierarchical" => LabelKind::Hierarchical,
                    _ => LabelKind::Local,
                };
                manager.add_label(
                    &path(p, "schematicPath")?,
                    &str_field(p, "text")?,
                    Pt::new(f32_field(p, "x")?, f32_field(p, "y")?),
                    kind,
                    p.get("orientation").and_then(Value::as_f64).unwrap_or(0.0) as f32,
                )?;
                Ok(Value::Null)
            }
            "get_net_connections" => {
                let tracer = NetTracer::new(&self.pins);
                let fallback = p.get("allowNearestFallback").and_then(Value::as_bool).unwrap_or(false);
                let pairs = tracer.get_net_connections(&path(p, "schematicPath")?, &str_field(p, "netName")?, fallback)?;
                Ok(serde_json::json!(pairs
                    .into_iter()
                    .map(|(r, pin)| serde_json::json!({"reference": r, "pin": pin}))
                    .collect::<Vec<_>>()))
            }
            "place_component" => {
                let shim = BoardOpShim::new(&self.footprints);
                let uuid = shim.place_footprint(
                    &path(p, "boardPath")?,
                    &str_field(p, "library")?,
                    &str_field(p, "footprint")?,
                    &str_field(p, "reference")?,
                    &str_field(p, "value")?,
                    f32_field(p, "x")?,
                    f32_field(p, "y")?,
                    f32_field(p, "rotation")?,
                    &str_field(p, "layer")?,
                )?;
                Ok(serde_json::json!({"uuid": uuid}))
            }
            "move_component" => {
                let shim = BoardOpShim::new(&self.footprints);
                shim.move_footprint(&path(p, "boardPath")?, &str_field(p, "reference")?, f32_field(p, "x")?, f32_field(p, "y")?, f32_field(p, "rotation")?)?;
                Ok(Value::Null)
            }
            "add_track" => {
                let shim = BoardOpShim::new(&self.footprints);
                shim.add_track(
                    &path(p, "boardPath")?,
                    Pt::new(f32_field(p, "x1")?, f32_field(p, "y1")?),
                    Pt::new(f32_field(p, "x2")?, f32_field(p, "y2")?),
                    f32_field(p, "width")?,
                    &str_field(p, "layer")?,
                    p.get("net").and_then(Value::as_i64).unwrap_or(0),
                )?;
                Ok(Value::Null)
            }
            "add_via" => {
                let shim = BoardOpShim::new(&self.footprints);
                shim.add_via(
                    &path(p, "boardPath")?,
                    Pt::new(f32_field(p, "x")?, f32_field(p, "y")?),
                    f32_field(p, "drill")?,
                    (&str_field(p, "layerA")?, &str_field(p, "layerB")?),
                    p.get("net").and_then(Value::as_i64).unwrap_or(0),
                )?;
                Ok(Value::Null)
            }
            "delete_tracks" => {
                let shim = BoardOpShim::new(&self.footprints);
                let net = p.get("net").and_then(Value::as_i64);
                let count = shim.delete_tracks(&path(p, "boardPath")?, |t| net.map(|n| t.net == n).unwrap_or(true))?;
                Ok(serde_json::json!({"deletedCount": count}))
            }
            "run_check" | "export" => {
                let tool = self.config.external_check_tool.clone().ok_or_else(|| {
                    Error::CheckFailed(1, "EXTERNAL_CHECK_TOOL is not configured".to_string())
                })?;
                let mut runner = ExternalCheckRunner::new(tool);
                let report = runner.run_check(&path(p, "documentPath")?, &[])?;
                Ok(serde_json::json!({
                    "violations": report.violations.iter().map(|v| serde_json::json!({
                        "kind": v.kind, "location": v.location, "message": v.message,
                    })).collect::<Vec<_>>(),
                }))
            }
            other => Err(Error::BadGrammar("transport".into(), format!("unrecognized command `{other}`"))),
        }
    }
}

fn str_field(p: &Value, key: &str) -> crate::error::Result<String> {
    p.get(key)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| Error::BadGrammar("transport".into(), format!("missing string field `{key}`")))
}

fn opt_str_field(p: &Value, key: &str) -> Option<String> {
    p.get(key).and_then(Value::as_str).map(str::to_string)
}

fn f32_field(p: &Value, key: &str) -> crate::error::Result<f32> {
    p.get(key)
        .and_then(Value::as_f64)
        .map(|v| v as f32)
        .ok_or_else(|| Error::BadGrammar("transport".into(), format!("missing numeric field `{key}`")))
}

fn path(p: &Value, key: &str) -> crate::error::Result<PathBuf> {
    str_field(p, key).map(PathBuf::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unrecognized_command_is_bad_grammar() {
        let server = Server::new(Config { symbol_library_dirs: vec![], footprint_library_dirs: vec![], external_check_tool: None, log_level: "error".into() });
        let err = server.handle("not_a_command", &Value::Null).unwrap_err();
        assert!(matches!(err, Error::BadGrammar(_, _)));
    }

    #[test]
    fn serve_handles_one_request_per_line() {
        let server = Server::new(Config { symbol_library_dirs: vec![], footprint_library_dirs: vec![], external_check_tool: None, log_level: "error".into() });
        let dir = std::env::temp_dir().join(format!("recad_mcp_transport_{}", crate::new_uuid()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("x.kicad_sch");
        crate::schema::Schema::new().save(&path).unwrap();

        let request = serde_json::json!({"command": "get_components", "params": {"schematicPath": path.to_string_lossy()}});
        let input = format!("{}\n", request);
        let mut output = Vec::new();
        server.serve(input.as_bytes(), &mut output).unwrap();
        let response: Response = serde_json::from_slice(&output).unwrap_or(Response { success: false, result: None, error: None });
        let text = String::from_utf8(output).unwrap();
        assert!(text.contains("\"success\":true"));
        let _ = response;
    }

    #[test]
    fn delete_component_is_routed_to_the_board_not_the_schematic() {
        let server = Server::new(Config { symbol_library_dirs: vec![], footprint_library_dirs: vec![], external_check_tool: None, log_level: "error".into() });
        let dir = std::env::temp_dir().join(format!("recad_mcp_transport_{}", crate::new_uuid()));
        std::fs::create_dir_all(&dir).unwrap();
        let board_path = dir.join("x.kicad_pcb");
        let mut board = crate::board::Board::new();
        board.footprints.push(crate::board::Footprint {
            footprint_id: "Resistor_SMD:R_0603".into(),
            pos: crate::gr::Pos::new(1.0, 2.0, 0.0),
            layer: "F.Cu".into(),
            locked: false,
            uuid: crate::new_uuid(),
            props: vec![crate::gr::Property::new("Reference", "R1")],
        });
        board.save(&board_path).unwrap();

        let params = serde_json::json!({"boardPath": board_path.to_string_lossy(), "reference": "R1"});
        let result = server.handle("delete_component", &params).unwrap();
        assert_eq!(result, Value::Null);

        let board = crate::board::Board::load(&board_path).unwrap();
        assert!(board.footprints.is_empty());
    }
}
