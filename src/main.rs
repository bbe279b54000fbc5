use clap::Parser;

mod cli;

/// §6's CLI exit-code contract is preserved here, not inside the library:
/// `cli::run_with` returns the mapped code (`AnalysisError::exit_code`, or
/// 0 on success) and this is the only place that calls `process::exit`.
fn main() {
    let cli = cli::Cli::parse();
    testintel::logging::init(cli.verbose);
    std::process::exit(cli::run_with(cli));
}
