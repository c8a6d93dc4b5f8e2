//! JSON task manifests and the incremental mtime cache
//!
//! A manifest lists format and compress tasks over directories, with
//! optional path-prefix exclusions. Files whose mtime matches the cache
//! are skipped; the cache itself is a flat path → seconds-since-epoch
//! map rewritten atomically after every run. All format tasks complete
//! before any compress task starts.

use crate::driver::{collect_lua_files, process_files};
use crate::error::{Error, Result};
use crate::Mode;
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::info;

/// Cache file name, resolved against the working directory.
pub const CACHE_FILE: &str = ".lunafmt_cache.json";

#[derive(Debug, Deserialize)]
pub struct Manifest {
    #[serde(default)]
    pub params: Params,
    pub tasks: Vec<TaskEntry>,
}

#[derive(Debug, Default, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub format: FormatStyle,
}

/// Pretty-printing style selected by `params.format`.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormatStyle {
    #[default]
    Auto,
    Manual,
}

impl FormatStyle {
    pub fn mode(self) -> Mode {
        match self {
            FormatStyle::Auto => Mode::Auto,
            FormatStyle::Manual => Mode::Manual,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct TaskEntry {
    #[serde(rename = "type")]
    pub kind: TaskKind,
    pub directory: PathBuf,
    #[serde(default)]
    pub exclude: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskKind {
    Format,
    Compress,
}

type FileCache = HashMap<String, i64>;

/// Execute a task manifest against the working directory's cache.
pub fn run_manifest(manifest_path: &Path) -> Result<()> {
    run_manifest_with_cache(manifest_path, Path::new(CACHE_FILE))
}

/// Like [`run_manifest`], with an explicit cache location.
pub fn run_manifest_with_cache(manifest_path: &Path, cache_path: &Path) -> Result<()> {
    let text = fs::read_to_string(manifest_path).map_err(|e| Error::io(manifest_path, e))?;
    let manifest: Manifest = serde_json::from_str(&text).map_err(|e| {
        Error::Config(format!(
            "{}: invalid task manifest: {e}",
            manifest_path.display()
        ))
    })?;

    let mut cache = load_cache(cache_path);

    let mut format_tasks: Vec<PathBuf> = Vec::new();
    let mut compress_tasks: Vec<PathBuf> = Vec::new();

    for task in &manifest.tasks {
        let bucket = match task.kind {
            TaskKind::Format => &mut format_tasks,
            TaskKind::Compress => &mut compress_tasks,
        };
        for file in collect_lua_files(&task.directory)? {
            let key = file.display().to_string();
            if !should_process(&key, &cache) {
                continue;
            }
            if task.exclude.iter().any(|prefix| key.starts_with(prefix)) {
                continue;
            }
            bucket.push(file);
        }
    }

    info!("{} files to format collected", format_tasks.len());
    info!("{} files to compress collected", compress_tasks.len());

    process_files(&format_tasks, manifest.params.format.mode());
    process_files(&compress_tasks, Mode::Compress);

    for file in format_tasks.iter().chain(compress_tasks.iter()) {
        if let Some(mtime) = mtime_seconds(file) {
            cache.insert(file.display().to_string(), mtime);
        }
    }
    store_cache(cache_path, &cache)
}

/// An unreadable or malformed cache is treated as empty.
fn load_cache(path: &Path) -> FileCache {
    fs::read_to_string(path)
        .ok()
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or_default()
}

/// Write-then-rename so a crashed run never leaves a truncated cache.
fn store_cache(path: &Path, cache: &FileCache) -> Result<()> {
    let text = serde_json::to_string(cache)
        .map_err(|e| Error::Config(format!("failed to serialize cache: {e}")))?;
    let tmp = path.with_extension("json.tmp");
    fs::write(&tmp, text).map_err(|e| Error::io(&tmp, e))?;
    fs::rename(&tmp, path).map_err(|e| Error::io(path, e))?;
    Ok(())
}

fn mtime_seconds(path: &Path) -> Option<i64> {
    let modified = fs::metadata(path).ok()?.modified().ok()?;
    let secs = modified.duration_since(UNIX_EPOCH).ok()?.as_secs();
    Some(secs as i64)
}

/// A file is scheduled when its mtime cannot be read or differs from
/// the cached value.
fn should_process(key: &str, cache: &FileCache) -> bool {
    match mtime_seconds(Path::new(key)) {
        Some(mtime) => cache.get(key) != Some(&mtime),
        None => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_with_params_and_excludes() {
        let manifest: Manifest = serde_json::from_str(
            r#"{
                "params": {"format": "manual"},
                "tasks": [
                    {"type": "format", "directory": "scripts", "exclude": ["scripts/vendor"]},
                    {"type": "compress", "directory": "dist"}
                ]
            }"#,
        )
        .expect("manifest should parse");

        assert_eq!(manifest.params.format, FormatStyle::Manual);
        assert_eq!(manifest.tasks.len(), 2);
        assert_eq!(manifest.tasks[0].kind, TaskKind::Format);
        assert_eq!(manifest.tasks[0].exclude, vec!["scripts/vendor"]);
        assert_eq!(manifest.tasks[1].kind, TaskKind::Compress);
        assert!(manifest.tasks[1].exclude.is_empty());
    }

    #[test]
    fn params_default_to_auto() {
        let manifest: Manifest =
            serde_json::from_str(r#"{"tasks": []}"#).expect("manifest should parse");
        assert_eq!(manifest.params.format, FormatStyle::Auto);
        assert_eq!(manifest.params.format.mode(), Mode::Auto);
    }

    #[test]
    fn unknown_task_type_is_rejected() {
        let result: std::result::Result<Manifest, _> =
            serde_json::from_str(r#"{"tasks": [{"type": "lint", "directory": "x"}]}"#);
        assert!(result.is_err());
    }

    #[test]
    fn unknown_files_are_always_scheduled() {
        let cache = FileCache::new();
        assert!(should_process("does/not/exist.lua", &cache));
    }
}
