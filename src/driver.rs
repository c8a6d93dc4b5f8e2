//! File and directory processing
//!
//! One file runs the whole pipeline on one thread; directories fan the
//! collected file list out over a rayon pool, each job owning its own
//! lexer, arena and printer. Per-file syntax or I/O errors are logged
//! and skipped so one broken file cannot abort a batch.

use crate::error::{Error, Result};
use crate::{parse_chunk, Mode};
use rayon::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{error, info};
use walkdir::WalkDir;

/// Rewrite one file in place. The output file is only opened (and
/// truncated) after a successful parse, so a file with syntax errors is
/// left untouched on disk.
pub fn process_file(path: &Path, mode: Mode) -> Result<()> {
    let source = fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
    let file_name = path.display().to_string();
    let chunk = parse_chunk(source, &file_name, mode)?;

    let out = fs::File::create(path).map_err(|e| Error::io(path, e))?;
    chunk.write(mode, out).map_err(|e| Error::io(path, e))?;
    Ok(())
}

pub fn format_file(path: &Path, style: Mode) -> Result<()> {
    process_file(path, style)
}

pub fn compress_file(path: &Path) -> Result<()> {
    process_file(path, Mode::Compress)
}

pub fn format_directory(dir: &Path, style: Mode) -> Result<()> {
    process_directory(dir, style)
}

pub fn compress_directory(dir: &Path) -> Result<()> {
    process_directory(dir, Mode::Compress)
}

/// Collect every `*.lua` regular file under `dir`, recursively.
pub fn collect_lua_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir) {
        let entry = entry.map_err(|e| Error::io(dir, e.into()))?;
        if entry.file_type().is_file() && entry.path().extension().is_some_and(|ext| ext == "lua")
        {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn process_directory(dir: &Path, mode: Mode) -> Result<()> {
    let files = collect_lua_files(dir)?;
    info!("{} .lua files collected", files.len());
    process_files(&files, mode);
    Ok(())
}

/// Process a batch of files in parallel. Failures are logged per file
/// and do not stop the batch.
pub fn process_files(files: &[PathBuf], mode: Mode) {
    files.par_iter().for_each(|path| {
        if let Err(err) = process_file(path, mode) {
            error!("{err}");
        }
    });
}
