//! Validate an RSD stream from stdin and report the outcome.
//!
//! Usage: cargo run --example stdin_parse < scene.rsd
//!
//! Archives are resolved relative to the current directory.

use rsd_core::{FileResolver, NullHandler, Outcome, Session};

fn main() {
    let mut session = Session::new(NullHandler, FileResolver::new("."));
    session
        .push_root(Box::new(std::io::stdin()), "<stdin>")
        .expect("push root");

    let summary = session.run();
    for diagnostic in session.diagnostics() {
        eprintln!("{diagnostic}");
    }
    match summary.outcome {
        Outcome::Exhausted => {
            println!(
                "ok: {} request(s) dispatched, {} failed",
                summary.dispatched, summary.failed
            );
        }
        Outcome::Fatal(error) => {
            eprintln!("fatal: {error}");
            std::process::exit(1);
        }
    }
}
