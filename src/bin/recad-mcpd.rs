//! Process entry point: bootstrap configuration, then serve the
//! line-delimited JSON transport over stdin/stdout until EOF (§6).

use std::io::{self, BufReader};

use recad_mcp::config::Config;
use recad_mcp::transport::Server;

fn main() {
    let config = Config::from_env();
    config.init_logging();

    if config.symbol_library_dirs.is_empty() {
        log::error!("no symbol library search path could be established");
        std::process::exit(1);
    }

    let server = Server::new(config);
    let stdin = io::stdin();
    if let Err(e) = server.serve(BufReader::new(stdin.lock()), io::stdout()) {
        log::error!("transport loop ended with an error: {e}");
        std::process::exit(1);
    }
}
