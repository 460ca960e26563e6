//! LedgerLens CLI binary entrypoint.

fn main() {
    if let Err(err) = ledgerlens_cli::app::run() {
        eprintln!("{}", err);
        std::process::exit(1);
    }
}
