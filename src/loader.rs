//! Input loader.
//!
//! Turns paths given on the command line into text ready for ingestion.
//! Directories are walked recursively and filtered by the `[loader]`
//! include/exclude globs; explicitly named files are always read.
//! `.zip` files are expanded into `(entry name, text)` pairs. Anything
//! that is not valid UTF-8 is skipped with a warning.

use anyhow::{bail, Context, Result};
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::LoaderConfig;

/// Maximum decompressed bytes read from a single archive entry.
const MAX_ENTRY_BYTES: u64 = 50 * 1024 * 1024;

/// One loaded input.
#[derive(Debug, Clone, PartialEq)]
pub enum LoadedInput {
    Text {
        /// Path relative to the walked root, or the file name.
        name: String,
        content: String,
    },
    Archive {
        /// File name of the `.zip` itself.
        name: String,
        entries: Vec<(String, String)>,
    },
}

impl LoadedInput {
    pub fn name(&self) -> &str {
        match self {
            LoadedInput::Text { name, .. } | LoadedInput::Archive { name, .. } => name,
        }
    }
}

/// Load every input under `paths`, in argument order. Directory contents
/// are sorted by relative path.
pub fn load_inputs(paths: &[PathBuf], config: &LoaderConfig) -> Result<Vec<LoadedInput>> {
    let mut inputs = Vec::new();
    for path in paths {
        if path.is_dir() {
            inputs.extend(scan_directory(path, config)?);
        } else if path.is_file() {
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().to_string())
                .unwrap_or_else(|| path.display().to_string());
            if let Some(input) = load_file(path, name)? {
                inputs.push(input);
            }
        } else {
            bail!("Input path does not exist: {}", path.display());
        }
    }
    Ok(inputs)
}

fn scan_directory(root: &Path, config: &LoaderConfig) -> Result<Vec<LoadedInput>> {
    let include_set = build_globset(&config.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(config.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut candidates = Vec::new();
    for entry in WalkDir::new(root).follow_links(config.follow_symlinks) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }
        candidates.push((rel_str, path.to_path_buf()));
    }

    candidates.sort_by(|a, b| a.0.cmp(&b.0));

    let mut inputs = Vec::new();
    for (rel_str, path) in candidates {
        if let Some(input) = load_file(&path, rel_str)? {
            inputs.push(input);
        }
    }
    Ok(inputs)
}

fn load_file(path: &Path, name: String) -> Result<Option<LoadedInput>> {
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;

    if is_zip(path) {
        let entries = read_archive(&bytes)
            .with_context(|| format!("Failed to open archive {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or(name);
        return Ok(Some(LoadedInput::Archive { name, entries }));
    }

    match String::from_utf8(bytes) {
        Ok(content) => Ok(Some(LoadedInput::Text { name, content })),
        Err(_) => {
            warn!(path = %path.display(), "skipping file that is not valid UTF-8");
            Ok(None)
        }
    }
}

fn is_zip(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("zip"))
        .unwrap_or(false)
}

/// Expand a zip archive into `(entry name, text)` pairs in archive order.
pub fn read_archive(bytes: &[u8]) -> Result<Vec<(String, String)>> {
    read_archive_bounded(bytes, MAX_ENTRY_BYTES)
}

/// Entries larger than `max_entry_bytes` once decompressed are skipped.
fn read_archive_bounded(bytes: &[u8], max_entry_bytes: u64) -> Result<Vec<(String, String)>> {
    let mut archive = zip::ZipArchive::new(Cursor::new(bytes))?;

    let mut entries = Vec::new();
    for i in 0..archive.len() {
        let file = archive.by_index(i)?;
        if file.is_dir() {
            continue;
        }
        let entry_name = file.name().to_string();

        let mut buf = Vec::new();
        file.take(max_entry_bytes + 1)
            .read_to_end(&mut buf)
            .with_context(|| format!("Failed to read archive entry {}", entry_name))?;
        if buf.len() as u64 > max_entry_bytes {
            warn!(entry = %entry_name, "skipping archive entry that exceeds the size limit");
            continue;
        }

        match String::from_utf8(buf) {
            Ok(text) => entries.push((entry_name, text)),
            Err(_) => warn!(entry = %entry_name, "skipping archive entry that is not valid UTF-8"),
        }
    }
    Ok(entries)
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;
    use zip::write::SimpleFileOptions;

    fn write_zip(path: &Path, entries: &[(&str, &[u8])]) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        for (name, body) in entries {
            zip.start_file(*name, SimpleFileOptions::default()).unwrap();
            zip.write_all(body).unwrap();
        }
        zip.finish().unwrap();
    }

    #[test]
    fn test_directory_walk_filters_and_sorts() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        std::fs::create_dir_all(root.join("sub")).unwrap();
        std::fs::create_dir_all(root.join("node_modules")).unwrap();
        std::fs::write(root.join("b.md"), "bravo").unwrap();
        std::fs::write(root.join("sub/a.txt"), "alpha").unwrap();
        std::fs::write(root.join("image.png"), [0u8, 1, 2]).unwrap();
        std::fs::write(root.join("node_modules/dep.md"), "ignored").unwrap();

        let inputs = load_inputs(&[root.to_path_buf()], &LoaderConfig::default()).unwrap();
        let names: Vec<&str> = inputs.iter().map(|i| i.name()).collect();
        assert_eq!(names, vec!["b.md", "sub/a.txt"]);
    }

    #[test]
    fn test_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("keep.md"), "keep").unwrap();
        std::fs::write(tmp.path().join("draft.md"), "drop").unwrap();

        let config = LoaderConfig {
            exclude_globs: vec!["**/draft.md".to_string(), "draft.md".to_string()],
            ..LoaderConfig::default()
        };
        let inputs = load_inputs(&[tmp.path().to_path_buf()], &config).unwrap();
        assert_eq!(inputs.len(), 1);
        assert_eq!(inputs[0].name(), "keep.md");
    }

    #[test]
    fn test_non_utf8_file_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("latin1.txt");
        std::fs::write(&path, [0xffu8, 0xfe, 0x41]).unwrap();

        let inputs = load_inputs(&[path], &LoaderConfig::default()).unwrap();
        assert!(inputs.is_empty());
    }

    #[test]
    fn test_explicit_file_ignores_globs() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("notes.rst");
        std::fs::write(&path, "restructured").unwrap();

        let inputs = load_inputs(&[path], &LoaderConfig::default()).unwrap();
        assert_eq!(
            inputs,
            vec![LoadedInput::Text {
                name: "notes.rst".to_string(),
                content: "restructured".to_string(),
            }]
        );
    }

    #[test]
    fn test_zip_is_expanded_in_order() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bundle.zip");
        write_zip(
            &path,
            &[
                ("one.txt", &b"first entry"[..]),
                ("bad.bin", &[0xffu8, 0xfe][..]),
                ("dir/two.md", &b"second entry"[..]),
            ],
        );

        let inputs = load_inputs(&[path], &LoaderConfig::default()).unwrap();
        assert_eq!(inputs.len(), 1);
        match &inputs[0] {
            LoadedInput::Archive { name, entries } => {
                assert_eq!(name, "bundle.zip");
                assert_eq!(
                    entries,
                    &vec![
                        ("one.txt".to_string(), "first entry".to_string()),
                        ("dir/two.md".to_string(), "second entry".to_string()),
                    ]
                );
            }
            other => panic!("expected archive, got {:?}", other),
        }
    }

    #[test]
    fn test_entry_size_limit_is_inclusive() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("sized.zip");
        write_zip(
            &path,
            &[
                ("exact.txt", &b"12345678"[..]),
                ("over.txt", &b"123456789"[..]),
                ("under.txt", &b"1234567"[..]),
            ],
        );
        let bytes = std::fs::read(&path).unwrap();

        let entries = read_archive_bounded(&bytes, 8).unwrap();
        let names: Vec<&str> = entries.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["exact.txt", "under.txt"]);
        assert_eq!(entries[0].1, "12345678");
    }

    #[test]
    fn test_corrupt_zip_errors() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("broken.zip");
        std::fs::write(&path, b"not a zip").unwrap();
        assert!(load_inputs(&[path], &LoaderConfig::default()).is_err());
    }

    #[test]
    fn test_missing_path_errors() {
        let err = load_inputs(&[PathBuf::from("/no/such/input")], &LoaderConfig::default())
            .unwrap_err();
        assert!(err.to_string().contains("does not exist"));
    }
}
