//! OpalChess - UCI Chess Engine
//!
//! Usage:
//!     opal_chess
//!
//! The engine reads UCI commands from stdin and writes responses to stdout.
//! Diagnostics go to stderr through `env_logger`; set `RUST_LOG=debug` to see
//! per-search summaries.

use opal_chess::uci::UCIProtocol;

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let mut uci = UCIProtocol::new();
    uci.run();
}
