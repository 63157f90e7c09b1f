use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use glob::Pattern;

use super::BatchError;

/// One baseline/current pair, keyed by relative path without `.png`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Pair {
    pub id: String,
    pub baseline: PathBuf,
    pub current: PathBuf,
}

/// Pairs found under two directory trees.
#[derive(Debug, Default)]
pub struct BatchPlan {
    pub pairs: Vec<Pair>,
    /// Baseline exists, current capture does not.
    pub missing_current: Vec<String>,
    /// Current capture has no baseline yet.
    pub missing_baseline: Vec<String>,
}

impl BatchPlan {
    /// Walk both trees and pair `.png` files by relative path.
    ///
    /// `filter` is a glob matched against the id. A pattern without glob
    /// metacharacters matches as a substring.
    pub fn plan(
        baseline_dir: &Path,
        current_dir: &Path,
        filter: Option<&str>,
    ) -> Result<Self, BatchError> {
        for dir in [baseline_dir, current_dir] {
            if !dir.is_dir() {
                return Err(BatchError::NotADirectory(dir.to_path_buf()));
            }
        }
        let pattern = filter.map(compile_filter).transpose()?;
        let keep = |id: &String| pattern.as_ref().is_none_or(|p| p.matches(id));

        let baseline_ids: BTreeSet<String> =
            list_png_ids(baseline_dir).into_iter().filter(keep).collect();
        let current_ids: BTreeSet<String> =
            list_png_ids(current_dir).into_iter().filter(keep).collect();

        let pairs = baseline_ids
            .intersection(&current_ids)
            .map(|id| Pair {
                id: id.clone(),
                baseline: png_path(baseline_dir, id),
                current: png_path(current_dir, id),
            })
            .collect();

        Ok(Self {
            pairs,
            missing_current: baseline_ids.difference(&current_ids).cloned().collect(),
            missing_baseline: current_ids.difference(&baseline_ids).cloned().collect(),
        })
    }

    pub fn total(&self) -> usize {
        self.pairs.len()
    }
}

fn compile_filter(raw: &str) -> Result<Pattern, BatchError> {
    let raw = raw.strip_suffix(".png").unwrap_or(raw);
    let glob = if raw.contains(['*', '?', '[']) {
        raw.to_string()
    } else {
        format!("*{raw}*")
    };
    Pattern::new(&glob).map_err(|e| BatchError::Filter(format!("{raw}: {e}")))
}

fn png_path(dir: &Path, id: &str) -> PathBuf {
    dir.join(format!("{id}.png"))
}

/// Recursively collect `.png` files under `dir` as ids: the relative path
/// with `/` separators and no extension.
pub fn list_png_ids(dir: &Path) -> BTreeSet<String> {
    let mut ids = BTreeSet::new();
    collect_png_ids(dir, dir, &mut ids);
    ids
}

fn collect_png_ids(base: &Path, dir: &Path, ids: &mut BTreeSet<String>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            collect_png_ids(base, &path, ids);
        } else if path
            .extension()
            .is_some_and(|e| e.eq_ignore_ascii_case("png"))
            && let Ok(rel) = path.strip_prefix(base)
        {
            let id = rel
                .with_extension("")
                .components()
                .map(|c| c.as_os_str().to_string_lossy())
                .collect::<Vec<_>>()
                .join("/");
            ids.insert(id);
        }
    }
}
