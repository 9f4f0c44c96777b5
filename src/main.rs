//! Gambit - UCI Chess Engine
//!
//! Reads UCI commands from stdin and answers on stdout. Logs go to stderr,
//! filtered by `RUST_LOG` (default `gambit=info`).

use std::io;

use gambit::uci::UCIProtocol;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gambit=info".into()),
        )
        .with_writer(io::stderr)
        .init();

    tracing::info!("gambit v{} ready", env!("CARGO_PKG_VERSION"));

    let mut uci = UCIProtocol::new();
    uci.run(io::stdin().lock());
}
