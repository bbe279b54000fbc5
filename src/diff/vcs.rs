//! Revision-control command modality (§4.4): run a user-supplied command
//! (e.g. `git diff HEAD~1`) with its working directory pinned to the
//! workspace root, and feed its stdout through the same literal-text path
//! as the other two modalities.

use crate::error::AnalysisError;
use std::path::Path;
use std::process::Command;

pub fn run(command: &str, workspace_root: &Path) -> Result<String, AnalysisError> {
    let parts = shell_words::split(command)
        .map_err(|e| AnalysisError::Internal(format!("invalid diff command {command:?}: {e}")))?;
    let Some((program, args)) = parts.split_first() else {
        return Err(AnalysisError::Internal("empty diff command".to_string()));
    };

    let output = Command::new(program)
        .args(args)
        .current_dir(workspace_root)
        .output()?;

    if !output.status.success() {
        tracing::warn!(
            "diff command {command:?} exited with {:?}; using stdout as-is",
            output.status.code()
        );
    }

    String::from_utf8(output.stdout)
        .map_err(|e| AnalysisError::Internal(format!("diff command output was not UTF-8: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn runs_a_command_with_the_workspace_root_as_cwd() {
        let dir = TempDir::new().unwrap();
        let out = run("echo hello", dir.path()).unwrap();
        assert!(out.trim() == "hello");
    }

    #[test]
    fn rejects_an_empty_command() {
        let dir = TempDir::new().unwrap();
        assert!(run("", dir.path()).is_err());
    }
}
