//! Process bootstrap: environment-variable configuration (§6).

use std::env;
use std::path::PathBuf;

const DEFAULT_SYMBOL_DIRS: &[&str] = &["/usr/share/kicad/symbols"];
const DEFAULT_FOOTPRINT_DIRS: &[&str] = &["/usr/share/kicad/footprints"];

#[derive(Debug, Clone)]
pub struct Config {
    pub symbol_library_dirs: Vec<PathBuf>,
    pub footprint_library_dirs: Vec<PathBuf>,
    pub external_check_tool: Option<PathBuf>,
    pub log_level: String,
}

impl Config {
    /// Read from the process environment (§6 table). Never fails; an
    /// absent `EXTERNAL_CHECK_TOOL` just disables `run_check`/`export`.
    pub fn from_env() -> Self {
        Config {
            symbol_library_dirs: split_dirs("SYMBOL_LIBRARY_DIRS", DEFAULT_SYMBOL_DIRS),
            footprint_library_dirs: split_dirs("FOOTPRINT_LIBRARY_DIRS", DEFAULT_FOOTPRINT_DIRS),
            external_check_tool: env::var("EXTERNAL_CHECK_TOOL").ok().map(PathBuf::from),
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
        }
    }

    pub fn init_logging(&self) {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(&self.log_level))
            .init();
    }
}

fn split_dirs(var: &str, defaults: &[&str]) -> Vec<PathBuf> {
    let mut dirs: Vec<PathBuf> = env::var(var)
        .ok()
        .map(|raw| raw.split(':').filter(|s| !s.is_empty()).map(PathBuf::from).collect())
        .unwrap_or_default();
    dirs.extend(defaults.iter().map(PathBuf::from));
    dirs
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepends_env_dirs_to_defaults() {
        std::env::set_var("SYMBOL_LIBRARY_DIRS", "/a:/b");
        let cfg = Config::from_env();
        assert_eq!(cfg.symbol_library_dirs[0], PathBuf::from("/a"));
        assert_eq!(cfg.symbol_library_dirs[1], PathBuf::from("/b"));
        std::env::remove_var("SYMBOL_LIBRARY_DIRS");
    }
}
