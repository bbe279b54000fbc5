//! Maps each [`Commands`] variant onto the corresponding `testintel::api`
//! operation and hands the typed result to [`display`] for rendering.

use super::{display, Cli, Commands};
use std::io::Read;
use testintel::api::{self, BuildCallGraphOptions};
use testintel::diff::DiffSource;
use testintel::error::{AnalysisError, Result};

/// Resolve a `--diff-file`/`--revision-command` pair (mutually exclusive,
/// enforced by `clap`) to a [`DiffSource`]. `--diff-file -` reads the
/// literal diff text from stdin rather than treating `-` as a path.
fn diff_source<'a>(
    diff_file: &'a Option<std::path::PathBuf>,
    revision_command: &'a Option<String>,
    stdin_buf: &'a mut String,
) -> Result<DiffSource<'a>> {
    if let Some(cmd) = revision_command {
        return Ok(DiffSource::RevisionCommand(cmd));
    }
    match diff_file {
        Some(path) if path.as_os_str() == "-" => {
            std::io::stdin()
                .read_to_string(stdin_buf)
                .map_err(AnalysisError::Io)?;
            Ok(DiffSource::Literal(stdin_buf))
        }
        Some(path) => Ok(DiffSource::FilePath(path)),
        None => {
            std::io::stdin()
                .read_to_string(stdin_buf)
                .map_err(AnalysisError::Io)?;
            Ok(DiffSource::Literal(stdin_buf))
        }
    }
}

pub fn dispatch(cli: Cli) -> Result<String> {
    let json = cli.json;
    match cli.command {
        Commands::Analyze { workspace } => {
            let report = api::analyze(&workspace)?;
            Ok(display::render(&report, json))
        }
        Commands::BuildGraph { workspace, max_methods } => {
            let options = BuildCallGraphOptions {
                verbose: cli.verbose,
                max_methods,
            };
            let digest = api::build_call_graph(&workspace, options)?;
            Ok(display::render(&digest, json))
        }
        Commands::FindTests { pattern, workspace } => {
            let (results, diagnostics) = api::find_tests(&pattern, &workspace)?;
            Ok(display::render_coverage_list(&results, &diagnostics, json))
        }
        Commands::Trace {
            test_id,
            workspace,
            max_depth,
        } => {
            let trace = api::trace_execution(&test_id, &workspace, max_depth)?;
            Ok(display::render(&trace, json))
        }
        Commands::DiffImpact {
            workspace,
            diff_file,
            revision_command,
            confidence_level,
        } => {
            let mut stdin_buf = String::new();
            let source = diff_source(&diff_file, &revision_command, &mut stdin_buf)?;
            let (impacted, diagnostics) = api::diff_impact(source, &workspace, confidence_level.into())?;
            Ok(display::render_impacted_list(&impacted, &diagnostics, json))
        }
        Commands::Coverage {
            workspace,
            test_ids,
            diff_file,
            revision_command,
        } => {
            let mut stdin_buf = String::new();
            let source = diff_source(&diff_file, &revision_command, &mut stdin_buf)?;
            let report = api::analyze_coverage(&workspace, &test_ids, source)?;
            Ok(display::render(&report, json))
        }
        Commands::Cache { workspace, action } => {
            let report = api::cache(&workspace, action.into())?;
            Ok(display::render(&report, json))
        }
    }
}
