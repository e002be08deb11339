//! The dependency manifest (`requirements.txt`).
//!
//! Installation always hands the file itself to pip (`-r`); parsing here is only
//! for logging and the report.

use std::path::{Path, PathBuf};

use crate::error::ProvisionError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Manifest {
    path: PathBuf,
}

impl Manifest {
    /// Resolve `path` against `cwd` when it is relative.
    pub fn at(path: &Path, cwd: &Path) -> Self {
        let path = if path.is_absolute() {
            path.to_path_buf()
        } else {
            cwd.join(path)
        };
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.is_file()
    }

    /// Fail with `MissingManifest` when the file is absent.
    pub fn require(&self) -> Result<(), ProvisionError> {
        if self.exists() {
            Ok(())
        } else {
            Err(ProvisionError::MissingManifest {
                path: self.path.clone(),
            })
        }
    }

    /// Requirement lines with comments, blanks and continuations folded away.
    ///
    /// Text that pip accepts never fails here: BOM-marked UTF-16 is decoded and
    /// invalid UTF-8 is replaced lossily.
    pub fn entries(&self) -> Result<Vec<String>, ProvisionError> {
        let bytes = std::fs::read(&self.path).map_err(|source| ProvisionError::ManifestRead {
            path: self.path.clone(),
            source,
        })?;
        Ok(parse_requirements(&decode_manifest(&bytes)))
    }
}

/// Decode manifest bytes by BOM (UTF-8, UTF-16LE, UTF-16BE), else as lossy UTF-8.
pub fn decode_manifest(bytes: &[u8]) -> String {
    fn utf16(body: &[u8], from: fn([u8; 2]) -> u16) -> String {
        let units: Vec<u16> = body
            .chunks_exact(2)
            .map(|pair| from([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    }
    match bytes {
        [0xEF, 0xBB, 0xBF, rest @ ..] => String::from_utf8_lossy(rest).into_owned(),
        [0xFF, 0xFE, rest @ ..] => utf16(rest, u16::from_le_bytes),
        [0xFE, 0xFF, rest @ ..] => utf16(rest, u16::from_be_bytes),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Split requirements text into entries.
///
/// Full-line `#` comments and ` #` inline comments are dropped and lines ending
/// in `\` are joined with the next one. Option lines (`-r`, `-e`, `--index-url`)
/// are kept as entries.
pub fn parse_requirements(content: &str) -> Vec<String> {
    let mut entries = Vec::new();
    let mut pending = String::new();
    for raw in content.lines() {
        let line = strip_comment(raw);
        if let Some(head) = line.strip_suffix('\\') {
            pending.push_str(head.trim());
            pending.push(' ');
            continue;
        }
        pending.push_str(line.trim());
        let entry = pending.trim();
        if !entry.is_empty() {
            entries.push(entry.to_string());
        }
        pending.clear();
    }
    let tail = pending.trim();
    if !tail.is_empty() {
        entries.push(tail.to_string());
    }
    entries
}

fn strip_comment(line: &str) -> &str {
    let trimmed = line.trim_start();
    if trimmed.starts_with('#') {
        return "";
    }
    let bytes = line.as_bytes();
    for (i, b) in bytes.iter().enumerate() {
        if *b == b'#' && i > 0 && bytes[i - 1].is_ascii_whitespace() {
            return line[..i].trim_end();
        }
    }
    line.trim_end()
}
