use clap::Parser;
use optjournal::cli::{run, Cli};

fn main() -> std::process::ExitCode {
    run(Cli::parse())
}
