//! Layered configuration for the core's tunables.
//!
//! Config files are loaded in order (later overrides earlier), the same
//! convention the codebase this crate descends from uses for its own
//! config: `~/.config/testintel/config.toml` (user defaults), then
//! `.testintel.toml` in the workspace root (project overrides). Two
//! environment variables additionally override the depth/breadth bounds at
//! process level, per §6.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Precedence used by `find_tests` pattern resolution (§9 Open Questions:
/// the source exhibited two ambiguous fuzzy-matching strategies; default to
/// the §4.3 normalization rules only).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum MatchPrecedence {
    #[default]
    Normalized,
}

/// Configuration options loaded from config files, overridable by
/// environment variables and then by explicit call-site options.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// §4.5 `find_tests` bound (default 12, clamped to [2, 200] by `TI_MAX_PATH_DEPTH`).
    pub max_depth: Option<usize>,
    /// §4.5 visited-node bound (default 2000, clamped to [100, 100000] by
    /// `TI_MAX_VISITED_NODES`).
    pub max_visited: Option<usize>,
    /// §4.5 `trace` depth bound (default 20).
    pub trace_max_depth: Option<usize>,
    /// §4.5 `trace` per-expansion breadth cap (default 50).
    pub trace_max_breadth: Option<usize>,
    /// §4.7 `diff_impact` reverse-closure expansion bound (default 12).
    pub max_expansion_depth: Option<usize>,
    /// §5 worker pool size (default `min(cpu_count, 4)`).
    pub worker_threads: Option<usize>,
    /// §4.8 Tier 2 default entry TTL in seconds (default 7 days).
    pub cache_ttl_secs: Option<u64>,
    /// §6 persisted cache root (default platform cache dir / "testintel").
    pub cache_root: Option<std::path::PathBuf>,
    pub match_precedence: Option<MatchPrecedence>,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_depth: None,
            max_visited: None,
            trace_max_depth: None,
            trace_max_breadth: None,
            max_expansion_depth: None,
            worker_threads: None,
            cache_ttl_secs: None,
            cache_root: None,
            match_precedence: None,
        }
    }
}

impl Config {
    pub const DEFAULT_MAX_DEPTH: usize = 12;
    pub const DEFAULT_MAX_VISITED: usize = 2000;
    pub const DEFAULT_TRACE_MAX_DEPTH: usize = 20;
    pub const DEFAULT_TRACE_MAX_BREADTH: usize = 50;
    pub const DEFAULT_MAX_EXPANSION_DEPTH: usize = 12;
    pub const DEFAULT_CACHE_TTL_SECS: u64 = 7 * 24 * 3600;

    const MIN_PATH_DEPTH: usize = 2;
    const MAX_PATH_DEPTH: usize = 200;
    const MIN_VISITED_NODES: usize = 100;
    const MAX_VISITED_NODES: usize = 100_000;

    /// Load configuration layered user-config < project-config < env vars.
    pub fn load(workspace_root: &Path) -> Self {
        let user_config = dirs::config_dir()
            .map(|d| d.join("testintel/config.toml"))
            .and_then(|p| Self::load_file(&p))
            .unwrap_or_default();

        let project_config =
            Self::load_file(&workspace_root.join(".testintel.toml")).unwrap_or_default();

        let mut merged = user_config.override_with(project_config);
        merged.apply_env_overrides();
        tracing::debug!(
            max_depth = merged.max_depth,
            max_visited = merged.max_visited,
            worker_threads = merged.worker_threads,
            "effective config after merge"
        );
        merged
    }

    fn load_file(path: &Path) -> Option<Self> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
            Err(e) => {
                tracing::warn!("failed to read config {}: {}", path.display(), e);
                return None;
            }
        };
        match toml::from_str::<Self>(&content) {
            Ok(config) => Some(config),
            Err(e) => {
                tracing::warn!("failed to parse config {}: {}", path.display(), e);
                None
            }
        }
    }

    fn override_with(self, other: Self) -> Self {
        Config {
            max_depth: other.max_depth.or(self.max_depth),
            max_visited: other.max_visited.or(self.max_visited),
            trace_max_depth: other.trace_max_depth.or(self.trace_max_depth),
            trace_max_breadth: other.trace_max_breadth.or(self.trace_max_breadth),
            max_expansion_depth: other.max_expansion_depth.or(self.max_expansion_depth),
            worker_threads: other.worker_threads.or(self.worker_threads),
            cache_ttl_secs: other.cache_ttl_secs.or(self.cache_ttl_secs),
            cache_root: other.cache_root.or(self.cache_root),
            match_precedence: other.match_precedence.or(self.match_precedence),
        }
    }

    /// `TI_MAX_PATH_DEPTH` / `TI_MAX_VISITED_NODES`, clamped per §6. Invalid
    /// values fall back to the prior value (ultimately the default) with a
    /// warning, per §6's "invalid values fall back to defaults with a warning".
    fn apply_env_overrides(&mut self) {
        if let Ok(raw) = std::env::var("TI_MAX_PATH_DEPTH") {
            match raw.parse::<usize>() {
                Ok(v) => {
                    let clamped = v.clamp(Self::MIN_PATH_DEPTH, Self::MAX_PATH_DEPTH);
                    if clamped != v {
                        tracing::warn!(
                            "TI_MAX_PATH_DEPTH={v} out of range [{},{}], clamped to {clamped}",
                            Self::MIN_PATH_DEPTH,
                            Self::MAX_PATH_DEPTH
                        );
                    }
                    self.max_depth = Some(clamped);
                }
                Err(_) => {
                    tracing::warn!("TI_MAX_PATH_DEPTH={raw:?} is not a valid integer, ignoring");
                }
            }
        }
        if let Ok(raw) = std::env::var("TI_MAX_VISITED_NODES") {
            match raw.parse::<usize>() {
                Ok(v) => {
                    let clamped = v.clamp(Self::MIN_VISITED_NODES, Self::MAX_VISITED_NODES);
                    if clamped != v {
                        tracing::warn!(
                            "TI_MAX_VISITED_NODES={v} out of range [{},{}], clamped to {clamped}",
                            Self::MIN_VISITED_NODES,
                            Self::MAX_VISITED_NODES
                        );
                    }
                    self.max_visited = Some(clamped);
                }
                Err(_) => {
                    tracing::warn!("TI_MAX_VISITED_NODES={raw:?} is not a valid integer, ignoring");
                }
            }
        }
    }

    pub fn max_depth_or_default(&self) -> usize {
        self.max_depth.unwrap_or(Self::DEFAULT_MAX_DEPTH)
    }
    pub fn max_visited_or_default(&self) -> usize {
        self.max_visited.unwrap_or(Self::DEFAULT_MAX_VISITED)
    }
    pub fn trace_max_depth_or_default(&self) -> usize {
        self.trace_max_depth.unwrap_or(Self::DEFAULT_TRACE_MAX_DEPTH)
    }
    pub fn trace_max_breadth_or_default(&self) -> usize {
        self.trace_max_breadth
            .unwrap_or(Self::DEFAULT_TRACE_MAX_BREADTH)
    }
    pub fn max_expansion_depth_or_default(&self) -> usize {
        self.max_expansion_depth
            .unwrap_or(Self::DEFAULT_MAX_EXPANSION_DEPTH)
    }
    pub fn worker_threads_or_default(&self) -> usize {
        self.worker_threads
            .unwrap_or_else(|| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1).min(4))
    }
    pub fn cache_ttl_or_default(&self) -> u64 {
        self.cache_ttl_secs.unwrap_or(Self::DEFAULT_CACHE_TTL_SECS)
    }
    pub fn cache_root_or_default(&self) -> std::path::PathBuf {
        self.cache_root.clone().unwrap_or_else(|| {
            dirs::cache_dir()
                .unwrap_or_else(std::env::temp_dir)
                .join("testintel")
        })
    }
    pub fn match_precedence_or_default(&self) -> MatchPrecedence {
        self.match_precedence.unwrap_or_default()
    }
}
