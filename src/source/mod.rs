//! Source Acquirer (§4.1): resolves an input (directory, solution/project
//! manifest, or explicit file list) into an immutable `WorkspaceSnapshot`.
//!
//! Grounded on the filesystem-walking source this module replaces, which
//! used `ignore::WalkBuilder` to respect `.gitignore` and skipped
//! oversized/non-UTF8 files. That source fed a single indexing pipeline;
//! here it is generalized into the one entry point every other component
//! reads from (`resolve`).

mod fingerprint;

pub use fingerprint::fingerprint_files;

use crate::error::AnalysisError;
use crate::model::{SourceFile, WorkspaceKind, WorkspaceRoot, WorkspaceSnapshot};
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

/// Maximum single-file size considered for analysis, matching the parser's
/// own 50MB ceiling (§4.2) so the Source Acquirer never hands the parser
/// something it would reject anyway.
const MAX_FILE_SIZE: u64 = 50 * 1024 * 1024;

/// Manifest file names that identify a workspace root more specifically
/// than a bare directory.
const SOLUTION_MANIFESTS: &[&str] = &[".sln"];
const PROJECT_MANIFESTS: &[&str] = &[".csproj", ".fsproj", "Cargo.toml", "go.mod", "pom.xml"];

/// Extensions that mark a file as an explicit file-list manifest (one path
/// per line, relative to the manifest's own directory unless absolute)
/// rather than a single source file — the third §4.1 input modality
/// ("if input is a list of files, include them verbatim").
const FILE_LIST_MANIFESTS: &[&str] = &["filelist", "rsp"];

/// Resolve `input` (a directory, a solution/project manifest, a file-list
/// manifest, or a single source file) into a `WorkspaceSnapshot`. Returns
/// `AnalysisError::WorkspaceInvalid` if no source files are discovered,
/// per §7.
pub fn resolve(input: &Path) -> Result<WorkspaceSnapshot, AnalysisError> {
    if !input.exists() {
        return Err(AnalysisError::WorkspaceInvalid(format!(
            "path does not exist: {}",
            input.display()
        )));
    }

    let canonical = dunce::canonicalize(input)
        .map_err(|e| AnalysisError::WorkspaceInvalid(format!("{}: {e}", input.display())))?;

    if canonical.is_file()
        && canonical
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| FILE_LIST_MANIFESTS.contains(&ext))
    {
        return resolve_file_list(&canonical);
    }

    let (scan_root, kind) = classify(&canonical);
    let files = enumerate_files(&scan_root)?;

    if files.is_empty() {
        return Err(AnalysisError::WorkspaceInvalid(format!(
            "no supported source files found under {}",
            scan_root.display()
        )));
    }

    let fingerprint = fingerprint_files(&files);

    Ok(WorkspaceSnapshot {
        root: WorkspaceRoot {
            canonical_path: scan_root,
            kind,
            fingerprint,
        },
        files,
    })
}

/// §4.1 "if input is a list of files, include them verbatim": `manifest`
/// is a text file with one path per line (blank lines and `#`-prefixed
/// comments ignored), relative paths resolved against the manifest's own
/// directory. Unlike directory enumeration, listed files are included
/// regardless of registered extension or `.gitignore` status — the caller
/// named them explicitly.
fn resolve_file_list(manifest: &Path) -> Result<WorkspaceSnapshot, AnalysisError> {
    let base = manifest.parent().unwrap_or_else(|| Path::new("."));
    let text = std::fs::read_to_string(manifest)?;

    let mut files = Vec::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let candidate = PathBuf::from(line);
        let abs = if candidate.is_absolute() { candidate.clone() } else { base.join(&candidate) };
        let Ok(content) = std::fs::read_to_string(&abs) else {
            tracing::debug!("file-list entry unreadable, skipping: {}", abs.display());
            continue;
        };
        let content = content.replace("\r\n", "\n");
        let content_hash = blake3::hash(content.as_bytes()).to_hex().to_string();
        files.push(SourceFile {
            path: candidate,
            size: content.len() as u64,
            content,
            content_hash,
        });
    }
    files.sort_by(|a, b| a.path.cmp(&b.path));

    if files.is_empty() {
        return Err(AnalysisError::WorkspaceInvalid(format!(
            "no readable files listed in {}",
            manifest.display()
        )));
    }

    let fingerprint = fingerprint_files(&files);
    Ok(WorkspaceSnapshot {
        root: WorkspaceRoot {
            canonical_path: base.to_path_buf(),
            kind: WorkspaceKind::FileList,
            fingerprint,
        },
        files,
    })
}

fn classify(path: &Path) -> (PathBuf, WorkspaceKind) {
    if path.is_file() {
        let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        if SOLUTION_MANIFESTS.iter().any(|ext| name.ends_with(ext)) {
            return (dir, WorkspaceKind::SolutionManifest);
        }
        if PROJECT_MANIFESTS.iter().any(|ext| name.ends_with(ext)) {
            return (dir, WorkspaceKind::ProjectManifest);
        }
        return (dir, WorkspaceKind::FileList);
    }
    (path.to_path_buf(), WorkspaceKind::Directory)
}

fn enumerate_files(root: &Path) -> Result<Vec<SourceFile>, AnalysisError> {
    let mut files = Vec::new();

    let walker = WalkBuilder::new(root)
        .hidden(false)
        .git_ignore(true)
        .git_global(true)
        .git_exclude(true)
        .build();

    for entry in walker.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");
        if crate::language::REGISTRY.from_extension(ext).is_none() {
            continue;
        }

        let meta = match path.metadata() {
            Ok(m) => m,
            Err(_) => continue,
        };
        if meta.len() > MAX_FILE_SIZE {
            tracing::debug!("skipping oversized file: {} ({} bytes)", path.display(), meta.len());
            continue;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::InvalidData => {
                tracing::debug!("skipping non-UTF8 file: {}", path.display());
                continue;
            }
            Err(e) => return Err(AnalysisError::Io(e)),
        };
        let content = content.replace("\r\n", "\n");
        let content_hash = blake3::hash(content.as_bytes()).to_hex().to_string();

        let rel_path = path.strip_prefix(root).unwrap_or(path).to_path_buf();
        let _mtime = meta
            .modified()
            .ok()
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs());

        files.push(SourceFile {
            path: rel_path,
            size: content.len() as u64,
            content,
            content_hash,
        });
    }

    files.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn resolve_rejects_a_missing_path() {
        let err = resolve(Path::new("/does/not/exist/at/all")).unwrap_err();
        assert!(matches!(err, AnalysisError::WorkspaceInvalid(_)));
    }

    #[test]
    fn resolve_rejects_an_empty_workspace() {
        let dir = TempDir::new().unwrap();
        let err = resolve(dir.path()).unwrap_err();
        assert!(matches!(err, AnalysisError::WorkspaceInvalid(_)));
    }

    #[test]
    fn resolve_finds_supported_files_and_skips_others() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("main.rs"), "fn main() {}").unwrap();
        fs::write(dir.path().join("notes.txt"), "not code").unwrap();

        let snapshot = resolve(dir.path()).unwrap();
        assert_eq!(snapshot.files.len(), 1);
        assert_eq!(snapshot.files[0].path, PathBuf::from("main.rs"));
        assert_eq!(snapshot.root.kind, WorkspaceKind::Directory);
    }

    #[test]
    fn resolve_is_deterministic_in_file_ordering() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("b.rs"), "fn b() {}").unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();

        let snapshot = resolve(dir.path()).unwrap();
        let paths: Vec<_> = snapshot.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("a.rs"), PathBuf::from("b.rs")]);
    }

    #[test]
    fn resolve_includes_exactly_the_files_named_in_a_file_list_manifest() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.rs"), "fn a() {}").unwrap();
        fs::write(dir.path().join("b.rs"), "fn b() {}").unwrap();
        // Not a registered source extension, but a file-list entry includes it verbatim.
        fs::write(dir.path().join("c.txt"), "not code").unwrap();
        fs::write(
            dir.path().join("manifest.filelist"),
            "a.rs\n# comment\n\nc.txt\n",
        )
        .unwrap();

        let snapshot = resolve(&dir.path().join("manifest.filelist")).unwrap();
        assert_eq!(snapshot.root.kind, WorkspaceKind::FileList);
        let paths: Vec<_> = snapshot.files.iter().map(|f| f.path.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("a.rs"), PathBuf::from("c.txt")]);
    }

    #[test]
    fn file_list_manifest_rejects_when_nothing_is_readable() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("manifest.filelist"), "missing.rs\n").unwrap();
        let err = resolve(&dir.path().join("manifest.filelist")).unwrap_err();
        assert!(matches!(err, AnalysisError::WorkspaceInvalid(_)));
    }
}
