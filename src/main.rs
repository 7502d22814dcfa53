//! trail-scout CLI entry point
//!
//! Trail search and export - CLI + web API

use trail_scout::cli;

#[tokio::main]
async fn main() {
    if let Err(e) = cli::run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
