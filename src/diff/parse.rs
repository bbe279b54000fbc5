//! Unified-diff parsing (§4.4), grounded on the hunk-header regex this
//! crate's diff tooling always used (`@@ ... +start[,count] @@`), extended
//! two ways the original only partly covered: the removed (`-`) side's
//! line range is captured in addition to the added side, and hunk bodies
//! are scanned for best-effort method/type signature hints.

use crate::model::{ChangeKind, ChangeRecord, LineRange};
use regex::Regex;
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::LazyLock;

static HUNK_HEADER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@@ -(\d+)(?:,(\d+))? \+(\d+)(?:,(\d+))? @@").unwrap());

static OLD_FILE_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^--- (?:a/)?(\S+)").unwrap());
static NEW_FILE_HEADER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\+\+\+ (?:b/)?(\S+)").unwrap());

/// Best-effort signature patterns across the supported language family.
/// `methods` capture a callable name; `types` capture a class/struct/
/// interface/trait name. Never authoritative — see §4.4.
static METHOD_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\bfn\s+(\w+)").unwrap(),
        Regex::new(r"\bdef\s+(\w+)").unwrap(),
        Regex::new(r"\bfunction\s+(\w+)").unwrap(),
        Regex::new(r"(?:public|private|protected|internal|static)[\w<>\[\],\s]*\s(\w+)\s*\(").unwrap(),
    ]
});

static TYPE_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    vec![
        Regex::new(r"\bclass\s+(\w+)").unwrap(),
        Regex::new(r"\bstruct\s+(\w+)").unwrap(),
        Regex::new(r"\binterface\s+(\w+)").unwrap(),
        Regex::new(r"\btrait\s+(\w+)").unwrap(),
        Regex::new(r"\bimpl\s+(?:\w+\s+for\s+)?(\w+)").unwrap(),
    ]
});

struct PendingFile {
    path: PathBuf,
    is_new: bool,
    is_deleted: bool,
    line_ranges: Vec<LineRange>,
    changed_methods: Vec<String>,
    changed_types: Vec<String>,
}

impl PendingFile {
    fn into_record(self) -> ChangeRecord {
        let kind = if self.is_new {
            ChangeKind::Added
        } else if self.is_deleted {
            ChangeKind::Deleted
        } else {
            ChangeKind::Modified
        };
        ChangeRecord {
            file: self.path,
            kind,
            line_ranges: self.line_ranges,
            changed_methods: dedup(self.changed_methods),
            changed_types: dedup(self.changed_types),
        }
    }
}

fn dedup(items: Vec<String>) -> Vec<String> {
    let mut seen = HashSet::new();
    items.into_iter().filter(|i| seen.insert(i.clone())).collect()
}

/// Parse unified-diff text into one `ChangeRecord` per file section.
/// Git-style "rename from"/"rename to" lines are recognized; plain POSIX
/// `diff -u` output (no git extended headers) is treated as `Modified`.
pub fn parse_unified_diff(text: &str) -> Vec<ChangeRecord> {
    let mut records = Vec::new();
    let mut current: Option<PendingFile> = None;
    let mut renamed = false;

    for line in text.lines() {
        if let Some(caps) = OLD_FILE_HEADER.captures(line) {
            let is_new = &caps[1] == "dev/null";
            if let Some(file) = current.take() {
                records.push(file.into_record());
            }
            current = Some(PendingFile {
                path: PathBuf::from(&caps[1]),
                is_new,
                is_deleted: false,
                line_ranges: Vec::new(),
                changed_methods: Vec::new(),
                changed_types: Vec::new(),
            });
            continue;
        }

        if let Some(caps) = NEW_FILE_HEADER.captures(line) {
            if let Some(file) = current.as_mut() {
                if &caps[1] == "dev/null" {
                    file.is_deleted = true;
                } else if file.is_new {
                    file.path = PathBuf::from(&caps[1]);
                }
            }
            continue;
        }

        if line.starts_with("rename from ") || line.starts_with("rename to ") {
            renamed = true;
            if let Some(file) = current.as_mut() {
                if let Some(path) = line.strip_prefix("rename to ") {
                    file.path = PathBuf::from(path);
                }
            }
            continue;
        }

        if let Some(caps) = HUNK_HEADER.captures(line) {
            let old_start: u32 = caps[1].parse().unwrap_or(1);
            let old_count: u32 = caps.get(2).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);
            let new_start: u32 = caps[3].parse().unwrap_or(1);
            let new_count: u32 = caps.get(4).and_then(|m| m.as_str().parse().ok()).unwrap_or(1);

            if let Some(file) = current.as_mut() {
                if old_count > 0 {
                    file.line_ranges.push(LineRange {
                        start: old_start,
                        end: old_start + old_count.saturating_sub(1),
                    });
                }
                if new_count > 0 {
                    file.line_ranges.push(LineRange {
                        start: new_start,
                        end: new_start + new_count.saturating_sub(1),
                    });
                }
            }
            continue;
        }

        let Some(file) = current.as_mut() else {
            continue;
        };

        match line.chars().next() {
            Some('+') if !line.starts_with("+++") => scan_signature(&line[1..], file),
            Some('-') if !line.starts_with("---") => scan_signature(&line[1..], file),
            _ => {}
        }
    }

    if let Some(file) = current.take() {
        let mut record = file.into_record();
        if renamed && matches!(record.kind, ChangeKind::Modified) {
            record.kind = ChangeKind::Renamed;
        }
        records.push(record);
    }

    records
}

fn scan_signature(line: &str, file: &mut PendingFile) {
    for pattern in METHOD_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(line) {
            file.changed_methods.push(caps[1].to_string());
        }
    }
    for pattern in TYPE_PATTERNS.iter() {
        if let Some(caps) = pattern.captures(line) {
            file.changed_types.push(caps[1].to_string());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_single_hunk_with_added_and_removed_ranges() {
        let diff = "--- a/A.cs\n+++ b/A.cs\n@@ -10,2 +15,3 @@\n-old line\n+new line\n+another\n context\n";
        let records = parse_unified_diff(diff);
        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.file, PathBuf::from("A.cs"));
        assert_eq!(r.kind, ChangeKind::Modified);
        assert!(r.line_ranges.contains(&LineRange { start: 10, end: 11 }));
        assert!(r.line_ranges.contains(&LineRange { start: 15, end: 17 }));
    }

    #[test]
    fn recognizes_a_new_file() {
        let diff = "--- /dev/null\n+++ b/New.cs\n@@ -0,0 +1,2 @@\n+public class Foo {}\n+}\n";
        let records = parse_unified_diff(diff);
        assert_eq!(records[0].kind, ChangeKind::Added);
    }

    #[test]
    fn recognizes_a_deleted_file() {
        let diff = "--- a/Old.cs\n+++ /dev/null\n@@ -1,2 +0,0 @@\n-public class Foo {}\n-}\n";
        let records = parse_unified_diff(diff);
        assert_eq!(records[0].kind, ChangeKind::Deleted);
    }

    #[test]
    fn extracts_best_effort_method_and_type_signatures() {
        let diff = "--- a/A.cs\n+++ b/A.cs\n@@ -1,1 +1,2 @@\n+public class Widget {\n+    public void Foo() {}\n";
        let records = parse_unified_diff(diff);
        assert!(records[0].changed_types.contains(&"Widget".to_string()));
        assert!(records[0].changed_methods.contains(&"Foo".to_string()));
    }

    #[test]
    fn a_hunk_with_no_recognizable_signature_yields_an_empty_method_list() {
        let diff = "--- a/data.json\n+++ b/data.json\n@@ -1,1 +1,1 @@\n-{\"a\": 1}\n+{\"a\": 2}\n";
        let records = parse_unified_diff(diff);
        assert!(records[0].changed_methods.is_empty());
    }
}
