//! Bundle archive access.
//!
//! A bundle is a zip archive with one top-level directory per test run.
//! Opening a bundle streams every entry once to verify the stored
//! checksums; entry contents are decompressed again only when read.

use std::collections::{BTreeSet, HashSet};
use std::io::{self, Cursor, Read};

use zip::ZipArchive;

use crate::error::{BundleError, Result};

/// Largest uncompressed entry accepted, declared or actual.
pub const MAX_ENTRY_SIZE: u64 = 256 * 1024 * 1024;

/// Capture phase of a `sysinfo` command output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CapturePhase {
    /// Captured before the test suite ran.
    #[default]
    Pre,
    /// Captured after the test suite finished.
    Post,
}

impl CapturePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pre => "pre",
            Self::Post => "post",
        }
    }
}

/// An opened, integrity-checked bundle borrowing the archive bytes.
///
/// Run identifiers are the distinct top-level directory names, sorted
/// ascending. The main run is the greatest one; captures are read from it.
#[derive(Debug)]
pub struct Bundle<'a> {
    archive: ZipArchive<Cursor<&'a [u8]>>,
    /// Entry paths in archive order.
    names: Vec<String>,
    files: HashSet<String>,
    runs: Vec<String>,
}

fn corrupt(name: &str, error: impl std::fmt::Display) -> BundleError {
    BundleError::CorruptArchive(format!("{name}: {error}"))
}

// Reads at most one byte past the limit so oversized streams are caught
// whatever size the header declares.
fn bounded<R: Read>(name: &str, declared: u64, reader: R) -> Result<io::Take<R>> {
    if declared > MAX_ENTRY_SIZE {
        return Err(corrupt(
            name,
            format!("declared size {declared} exceeds {MAX_ENTRY_SIZE} bytes"),
        ));
    }
    Ok(reader.take(MAX_ENTRY_SIZE + 1))
}

fn check_length(name: &str, length: u64) -> Result<()> {
    if length > MAX_ENTRY_SIZE {
        return Err(corrupt(name, format!("entry exceeds {MAX_ENTRY_SIZE} bytes")));
    }
    Ok(())
}

impl<'a> Bundle<'a> {
    /// Opens a bundle over raw archive bytes.
    ///
    /// # Errors
    ///
    /// Returns [`BundleError::CorruptArchive`] if the archive structure is
    /// unreadable, any entry fails its checksum or is larger than
    /// [`MAX_ENTRY_SIZE`], and [`BundleError::EmptyArchive`] if no entry
    /// lives inside a directory.
    pub fn open(bytes: &'a [u8]) -> Result<Self> {
        let mut archive = ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| BundleError::CorruptArchive(e.to_string()))?;

        let mut names = Vec::with_capacity(archive.len());
        let mut files = HashSet::with_capacity(archive.len());

        for index in 0..archive.len() {
            let file = archive
                .by_index(index)
                .map_err(|e| BundleError::CorruptArchive(e.to_string()))?;
            let name = file.name().to_string();

            if !file.is_dir() {
                let mut limited = bounded(&name, file.size(), file)?;
                let length =
                    io::copy(&mut limited, &mut io::sink()).map_err(|e| corrupt(&name, e))?;
                check_length(&name, length)?;
                files.insert(name.clone());
            }
            names.push(name);
        }

        let runs: BTreeSet<String> = names
            .iter()
            .filter_map(|name| name.split_once('/').map(|(top, _)| top.to_string()))
            .collect();
        if runs.is_empty() {
            return Err(BundleError::EmptyArchive);
        }

        Ok(Self {
            archive,
            names,
            files,
            runs: runs.into_iter().collect(),
        })
    }

    /// Run identifiers in ascending order. Never empty.
    pub fn runs(&self) -> &[String] {
        &self.runs
    }

    /// The lexicographically greatest run identifier.
    pub fn main_run(&self) -> &str {
        // `open` rejects archives without runs.
        self.runs.last().map(String::as_str).unwrap_or_default()
    }

    /// All entry paths in archive order, directories included.
    pub fn entry_names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.files.contains(path)
    }

    /// Raw bytes of one file entry, decompressed on demand.
    pub fn read_bytes(&self, path: &str) -> Result<Vec<u8>> {
        if !self.contains(path) {
            return Err(BundleError::MissingEntry(path.to_string()));
        }
        // Clones share the parsed central directory; only the cursor is copied.
        let mut archive = self.archive.clone();
        let file = archive.by_name(path).map_err(|e| corrupt(path, e))?;
        let mut data = Vec::new();
        bounded(path, file.size(), file)?
            .read_to_end(&mut data)
            .map_err(|e| corrupt(path, e))?;
        check_length(path, data.len() as u64)?;
        Ok(data)
    }

    /// Text of one file entry. Invalid UTF-8 sequences are replaced rather
    /// than rejected, since captures come from arbitrary tool output.
    pub fn read_text(&self, path: &str) -> Result<String> {
        self.read_bytes(path)
            .map(|bytes| String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Reads `<main run>/sysinfo/<phase>/<command>`.
    pub fn read_capture(&self, command: &str, phase: CapturePhase) -> Result<String> {
        self.read_text(&self.capture_path(command, phase))
    }

    /// Like [`read_capture`](Self::read_capture), but absence is not an error.
    pub fn optional_capture(&self, command: &str, phase: CapturePhase) -> Option<String> {
        self.read_capture(command, phase).ok()
    }

    fn capture_path(&self, command: &str, phase: CapturePhase) -> String {
        format!("{}/sysinfo/{}/{}", self.main_run(), phase.as_str(), command)
    }
}
