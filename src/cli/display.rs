//! Text/JSON output formatting (§6: "text (human-readable) and a canonical
//! JSON schema"). Grounded on the wider example ecosystem's `colored`-based
//! result printers — `[✓]`/`[!]` markers, cyan identifiers, green/yellow
//! status — applied here to the seven `api` report types instead of search
//! hits.

use colored::Colorize;
use serde::Serialize;
use testintel::error::{AnalysisError, Diagnostics};
use testintel::model::{CoverageInfo, ExecutedMethod, ExecutionTrace};
use testintel::{
    api::{AnalysisReport, CacheReport, CallGraphDigest, CoverageReport},
    impact::ImpactedTest,
};

/// Render one report value as either pretty JSON or its `Text` impl.
pub fn render<T: Serialize + Text>(value: &T, json: bool) -> String {
    if json {
        serde_json::to_string_pretty(value).unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    } else {
        value.as_text()
    }
}

/// Streamed-then-drained `find_tests` results don't share a single struct
/// with the others, so they get a dedicated renderer alongside a
/// `diagnostics` block.
pub fn render_coverage_list(results: &[CoverageInfo], diagnostics: &Diagnostics, json: bool) -> String {
    if json {
        #[derive(Serialize)]
        struct Wire<'a> {
            results: &'a [CoverageInfo],
            diagnostics: &'a Diagnostics,
        }
        serde_json::to_string_pretty(&Wire { results, diagnostics })
            .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    } else if results.is_empty() {
        format!("no covering tests found ({diagnostics})")
    } else {
        let mut out = String::new();
        for info in results {
            out.push_str(&format!(
                "{} {} (confidence {:.2}, {:?})\n",
                "[✓]".green(),
                info.test_id.raw().cyan(),
                info.confidence,
                info.test_type
            ));
            let path: Vec<&str> = info.call_path.iter().map(|id| id.raw()).collect();
            out.push_str(&format!("    {}\n", path.join(" -> ")));
        }
        if !diagnostics.is_clean() {
            out.push_str(&format!("{} {diagnostics}\n", "[!]".yellow()));
        }
        out.trim_end().to_string()
    }
}

pub fn render_impacted_list(impacted: &[ImpactedTest], diagnostics: &Diagnostics, json: bool) -> String {
    if json {
        #[derive(Serialize)]
        struct Wire<'a> {
            impacted: &'a [ImpactedTest],
            diagnostics: &'a Diagnostics,
        }
        serde_json::to_string_pretty(&Wire { impacted, diagnostics })
            .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
    } else if impacted.is_empty() {
        format!("no tests impacted ({diagnostics})")
    } else {
        let mut out = String::new();
        for entry in impacted {
            out.push_str(&format!(
                "{} {} covers changed method {} (confidence {:.2})\n",
                "[✓]".green(),
                entry.coverage.test_id.raw().cyan(),
                entry.changed_method.raw(),
                entry.coverage.confidence
            ));
        }
        if !diagnostics.is_clean() {
            out.push_str(&format!("{} {diagnostics}\n", "[!]".yellow()));
        }
        out.trim_end().to_string()
    }
}

pub fn error_json(err: &AnalysisError) -> String {
    #[derive(Serialize)]
    struct ErrWire<'a> {
        error: String,
        #[serde(rename = "exitCode")]
        exit_code: i32,
        #[serde(skip_serializing_if = "Option::is_none")]
        message: Option<&'a str>,
    }
    let _ = err;
    serde_json::to_string(&ErrWire {
        error: err.to_string(),
        exit_code: err.exit_code(),
        message: None,
    })
    .unwrap_or_else(|e| format!("{{\"error\":\"{e}\"}}"))
}

/// Human-readable rendering for a report type, used by [`render`] in the
/// non-JSON path.
pub trait Text {
    fn as_text(&self) -> String;
}

impl Text for AnalysisReport {
    fn as_text(&self) -> String {
        let mut out = format!(
            "{} {}: {} methods, {} test candidates\n",
            "[✓]".green(),
            self.workspace.display(),
            self.total_methods,
            self.test_candidates
        );
        let mut kinds: Vec<(&String, &usize)> = self.by_test_type.iter().collect();
        kinds.sort_by_key(|(k, _)| k.clone());
        for (kind, count) in kinds {
            out.push_str(&format!("    {kind}: {count}\n"));
        }
        if !self.diagnostics.is_clean() {
            out.push_str(&format!("{} {}\n", "[!]".yellow(), self.diagnostics));
        }
        out.trim_end().to_string()
    }
}

impl Text for CallGraphDigest {
    fn as_text(&self) -> String {
        let mut out = format!(
            "{} {} nodes, {} edges\n",
            "[✓]".green(),
            self.node_count,
            self.edge_count
        );
        for id in &self.sampled_nodes {
            out.push_str(&format!("    {}\n", id.cyan()));
        }
        if !self.diagnostics.is_clean() {
            out.push_str(&format!("{} {}\n", "[!]".yellow(), self.diagnostics));
        }
        out.trim_end().to_string()
    }
}

impl Text for ExecutionTrace {
    fn as_text(&self) -> String {
        let mut out = format!(
            "{} {}: {} methods executed ({} production), estimated complexity {:.1}\n",
            "[✓]".green(),
            self.test_id.raw().cyan(),
            self.total_called,
            self.production_called,
            self.estimated_complexity
        );
        for m in &self.executed {
            out.push_str(&render_executed(m));
        }
        out.trim_end().to_string()
    }
}

fn render_executed(m: &ExecutedMethod) -> String {
    format!(
        "    [{}] {} ({:?}, depth {})\n",
        if m.is_production { "prod" } else { "test" },
        m.id.raw(),
        m.category,
        m.call_depth
    )
}

impl Text for CoverageReport {
    fn as_text(&self) -> String {
        let mut out = format!(
            "{} {} covered, {} uncovered\n",
            "[✓]".green(),
            self.covered.len(),
            self.uncovered_tests.len()
        );
        for entry in &self.covered {
            out.push_str(&format!(
                "    {} -> {}\n",
                entry.coverage.test_id.raw().cyan(),
                entry.changed_method.raw()
            ));
        }
        for id in &self.uncovered_tests {
            out.push_str(&format!("    {} {}\n", "[!]".yellow(), id.raw()));
        }
        if !self.diagnostics.is_clean() {
            out.push_str(&format!("{} {}\n", "[!]".yellow(), self.diagnostics));
        }
        out.trim_end().to_string()
    }
}

impl Text for CacheReport {
    fn as_text(&self) -> String {
        format!(
            "{} tier1: {} hits / {} misses ({} entries, {} bytes)\n    tier2: {} hits / {} misses ({} entries, {} bytes, {:.2}x compression)",
            "[✓]".green(),
            self.tier1_hits,
            self.tier1_misses,
            self.tier1_entries,
            self.tier1_bytes,
            self.tier2_hits,
            self.tier2_misses,
            self.tier2_entries,
            self.tier2_bytes,
            self.avg_compression_ratio
        )
    }
}
