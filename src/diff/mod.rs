//! Diff Parser (§4.4): reduces any of the three input modalities (literal
//! unified-diff text, a file path to one, or the stdout of a user-supplied
//! revision-control command) to a [`crate::model::DiffSet`].

mod parse;
mod vcs;

pub use parse::parse_unified_diff;

use crate::error::AnalysisError;
use crate::model::DiffSet;
use std::path::Path;

/// What the caller handed `diff_impact`/`analyze_coverage` as their diff
/// source (§6 "diffs are unified-diff text").
pub enum DiffSource<'a> {
    Literal(&'a str),
    FilePath(&'a Path),
    RevisionCommand(&'a str),
}

/// Resolve any `DiffSource` to a `DiffSet`, rooted at `workspace_root` for
/// the revision-command modality (its current directory is pinned there
/// per §4.4).
pub fn resolve(source: DiffSource<'_>, workspace_root: &Path) -> Result<DiffSet, AnalysisError> {
    let (text, hint) = match source {
        DiffSource::Literal(text) => (text.to_string(), "literal".to_string()),
        DiffSource::FilePath(path) => {
            let text = std::fs::read_to_string(path)?;
            (text, path.display().to_string())
        }
        DiffSource::RevisionCommand(cmd) => {
            let text = vcs::run(cmd, workspace_root)?;
            (text, cmd.to_string())
        }
    };

    let records = parse_unified_diff(&text);
    Ok(DiffSet {
        records,
        source_hint: hint,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn resolve_reads_diff_text_from_a_file() {
        let dir = TempDir::new().unwrap();
        let diff_path = dir.path().join("change.diff");
        std::fs::write(
            &diff_path,
            "--- a/A.cs\n+++ b/A.cs\n@@ -1,2 +1,2 @@\n-old\n+new\n",
        )
        .unwrap();

        let set = resolve(DiffSource::FilePath(&diff_path), dir.path()).unwrap();
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.source_hint, diff_path.display().to_string());
    }

    #[test]
    fn resolve_accepts_literal_text_directly() {
        let set = resolve(DiffSource::Literal("--- a/x\n+++ b/x\n@@ -1 +1 @@\n-a\n+b\n"), Path::new(".")).unwrap();
        assert_eq!(set.records.len(), 1);
        assert_eq!(set.source_hint, "literal");
    }
}
