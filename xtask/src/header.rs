// Licensed under the Apache-2.0 license

use crate::PROJECT_ROOT;
use anyhow::{anyhow, bail, Context, Result};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use walkdir::DirEntry;

const REQUIRED_TEXT: &str = "Licensed under the Apache-2.0 license";
const HEADER_LINES: usize = 3;
const EXTENSIONS: &[&str] = &["rs", "toml", "sh", "py", "yml", "yaml"];
const IGNORED_DIRS: &[&str] = &[".git", "examples", "out", "target"];

pub(crate) fn fix() -> Result<()> {
    println!("Running: license header fix");

    let mut failed = false;
    for file in find_files(&PROJECT_ROOT, EXTENSIONS)?.iter() {
        if check_file(file).is_err() {
            println!("Fixing header in {}", remove_root(file));
            fix_file(file)?;
        }
        if let Err(e) = check_file(file) {
            println!("{e}");
            failed = true;
        }
    }
    if failed {
        bail!("License header fix failed; please fix the above files manually.");
    }
    Ok(())
}

pub(crate) fn check() -> Result<()> {
    println!("Running: license header check");

    let mut failed = false;
    for file in find_files(&PROJECT_ROOT, EXTENSIONS)?.iter() {
        if let Err(e) = check_file(file) {
            println!("{e}");
            failed = true;
        }
    }
    if failed {
        bail!("Some files are missing the license header; to fix, run \"cargo xtask header-fix\" from the repo root");
    }
    Ok(())
}

fn remove_root(path: &Path) -> String {
    path.strip_prefix(&*PROJECT_ROOT)
        .unwrap_or(path)
        .display()
        .to_string()
}

fn check_file_contents(path: &Path, contents: impl BufRead) -> Result<()> {
    for line in contents.lines().take(HEADER_LINES) {
        let line = line.with_context(|| format!("{:?}", remove_root(path)))?;
        if line.contains(REQUIRED_TEXT) {
            return Ok(());
        }
    }
    Err(anyhow!(
        "File {:?} doesn't contain {REQUIRED_TEXT:?} in the first {HEADER_LINES} lines",
        remove_root(path)
    ))
}

fn check_file(path: &Path) -> Result<()> {
    let file = File::open(path).with_context(|| format!("{:?}", remove_root(path)))?;
    check_file_contents(path, BufReader::new(file))
}

fn comment_for(path: &Path) -> Result<String> {
    match path.extension().and_then(|s| s.to_str()) {
        Some("rs") => Ok(format!("// {REQUIRED_TEXT}\n")),
        Some("toml" | "sh" | "py" | "yaml" | "yml") => Ok(format!("# {REQUIRED_TEXT}\n")),
        other => bail!("Unknown extension {other:?}"),
    }
}

fn fix_file(path: &Path) -> Result<()> {
    let mut contents = comment_for(path)?.into_bytes();
    let mut prev_contents =
        std::fs::read(path).with_context(|| format!("{:?}", remove_root(path)))?;
    if prev_contents.first() != Some(&b'\n') {
        contents.push(b'\n');
    }
    contents.append(&mut prev_contents);
    std::fs::write(path, contents)?;
    Ok(())
}

fn allow(file: &DirEntry) -> bool {
    if !file.file_type().is_dir() {
        return true;
    }
    file.file_name()
        .to_str()
        .map_or(true, |name| !IGNORED_DIRS.contains(&name))
}

pub(crate) fn find_files(dir: &Path, extensions: &[&str]) -> Result<Vec<PathBuf>> {
    let mut result = vec![];
    for file in walkdir::WalkDir::new(dir).into_iter().filter_entry(allow) {
        let file = file.with_context(|| format!("{:?}", remove_root(dir)))?;
        let is_source = file
            .path()
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if file.file_type().is_file() && is_source {
            result.push(file.into_path());
        }
    }
    result.sort();
    Ok(result)
}
