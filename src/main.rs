// fuzzkit - fuzz test bundling
// Entry point; everything else lives in the library

use clap::Parser;
use fuzzkit::cli::{Cli, CliHandler};

fn main() {
    let cli = Cli::parse();
    let verbose = cli.verbose;

    if let Err(e) = CliHandler::new().run(cli) {
        // Silent errors were reported where they happened.
        if !e.is_silent() {
            eprintln!("❌ Error: {}", e.format_detailed(verbose));
        }
        std::process::exit(1);
    }
}
