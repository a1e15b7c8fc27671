//! Directory of ingested bundle archives.
//!
//! Archives are stored under a generated name and tracked in `index.json`,
//! which maps each bundle id (the archive name without `.zip`) to its
//! identity. A main run directory can only be ingested once.

use std::collections::BTreeMap;
use std::fs;
use std::io::{BufReader, BufWriter, Cursor, Write};
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use hwgrid_bundle::Bundle;
use hwgrid_core::BundleIdentity;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{Result, StoreError};

const INDEX_FILE: &str = "index.json";
const ARCHIVE_EXTENSION: &str = "zip";

/// Index record of one stored bundle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredBundle {
    /// Storage id, also the archive file stem.
    pub id: String,
    #[serde(flatten)]
    pub identity: BundleIdentity,
    /// RFC 3339 timestamp of ingestion.
    pub ingested_at: String,
}

impl StoredBundle {
    pub fn file_name(&self) -> String {
        format!("{}.{ARCHIVE_EXTENSION}", self.id)
    }
}

// Keeps vendor strings usable as a single path component.
fn path_safe(component: &str) -> String {
    component
        .trim()
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '-'
            }
        })
        .collect()
}

/// Storage id for a bundle: `<date>_<manufacturer>_<product>_<suffix>`.
///
/// The suffix is the first 24 bits of the archive's SHA-256 digest in
/// upper-case hex, so re-ingesting identical bytes yields the same name.
///
/// # Examples
///
/// ```
/// use chrono::NaiveDate;
/// use hwgrid_core::BundleIdentity;
/// use hwgrid_store::storage_id;
///
/// let identity = BundleIdentity {
///     manufacturer: "LENOVO".into(),
///     product: "ThinkPad X1 Carbon".into(),
///     os: "Fedora 28".into(),
///     unique_identifier: "run1".into(),
/// };
/// let date = NaiveDate::from_ymd_opt(2018, 5, 4).unwrap();
/// let id = storage_id(&identity, date, b"archive bytes");
/// assert!(id.starts_with("2018-05-04_LENOVO_ThinkPad-X1-Carbon_"));
/// assert_eq!(id.len(), "2018-05-04_LENOVO_ThinkPad-X1-Carbon_".len() + 6);
/// ```
pub fn storage_id(identity: &BundleIdentity, date: NaiveDate, bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!(
        "{}_{}_{}_{:02X}{:02X}{:02X}",
        date.format("%Y-%m-%d"),
        path_safe(&identity.manufacturer),
        path_safe(&identity.product),
        digest[0],
        digest[1],
        digest[2]
    )
}

/// File-backed bundle store.
#[derive(Debug, Clone)]
pub struct BundleStore {
    dir: PathBuf,
}

impl BundleStore {
    /// Opens the store, creating its directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`Io`](StoreError::Io) if the directory cannot be created.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn index_path(&self) -> PathBuf {
        self.dir.join(INDEX_FILE)
    }

    fn load_index(&self) -> Result<BTreeMap<String, StoredBundle>> {
        let path = self.index_path();
        if !path.exists() {
            return Ok(BTreeMap::new());
        }
        let reader = BufReader::new(fs::File::open(path)?);
        Ok(serde_json::from_reader(reader)?)
    }

    fn save_index(&self, index: &BTreeMap<String, StoredBundle>) -> Result<()> {
        let tmp = self.dir.join(format!("{INDEX_FILE}.tmp"));
        {
            let mut writer = BufWriter::new(fs::File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, index)?;
            writer.flush()?;
        }
        fs::rename(tmp, self.index_path())?;
        Ok(())
    }

    /// Path of the stored archive for `id`.
    pub fn archive_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.{ARCHIVE_EXTENSION}"))
    }

    /// Stores an archive dated today. See [`ingest_on`](Self::ingest_on).
    pub fn ingest(&self, bytes: &[u8], identity: &BundleIdentity) -> Result<StoredBundle> {
        self.ingest_on(bytes, identity, chrono::Local::now().date_naive())
    }

    /// Stores an archive under its generated id.
    ///
    /// # Errors
    ///
    /// Returns [`AlreadyExists`](StoreError::AlreadyExists) if a stored
    /// bundle has the same unique identifier; nothing is written then.
    pub fn ingest_on(
        &self,
        bytes: &[u8],
        identity: &BundleIdentity,
        date: NaiveDate,
    ) -> Result<StoredBundle> {
        let mut index = self.load_index()?;
        if let Some(existing) = index
            .values()
            .find(|stored| stored.identity.unique_identifier == identity.unique_identifier)
        {
            return Err(StoreError::AlreadyExists(existing.id.clone()));
        }

        let stored = StoredBundle {
            id: storage_id(identity, date, bytes),
            identity: identity.clone(),
            ingested_at: chrono::Utc::now().to_rfc3339(),
        };
        fs::write(self.archive_path(&stored.id), bytes)?;
        index.insert(stored.id.clone(), stored.clone());
        self.save_index(&index)?;

        info!(id = %stored.id, run = %identity.unique_identifier, "Ingested bundle");
        Ok(stored)
    }

    /// Index record for `id`.
    pub fn get(&self, id: &str) -> Result<StoredBundle> {
        self.load_index()?
            .remove(id)
            .ok_or_else(|| StoreError::BundleNotFound(id.to_string()))
    }

    /// Raw archive bytes for `id`.
    pub fn read(&self, id: &str) -> Result<Vec<u8>> {
        let stored = self.get(id)?;
        fs::read(self.archive_path(&stored.id)).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StoreError::BundleNotFound(id.to_string())
            } else {
                StoreError::Io(e)
            }
        })
    }

    /// All stored bundles ordered by manufacturer, product and OS, newest
    /// first within the same machine.
    pub fn list(&self) -> Result<Vec<StoredBundle>> {
        let mut bundles: Vec<StoredBundle> = self.load_index()?.into_values().collect();
        bundles.sort_by(|a, b| {
            (&a.identity.manufacturer, &a.identity.product, &a.identity.os)
                .cmp(&(&b.identity.manufacturer, &b.identity.product, &b.identity.os))
                .then_with(|| b.ingested_at.cmp(&a.ingested_at))
        });
        Ok(bundles)
    }

    /// Bytes of one file inside the stored archive.
    pub fn extract_entry(&self, id: &str, path: &str) -> Result<Vec<u8>> {
        let bytes = self.read(id)?;
        let bundle = Bundle::open(&bytes)?;
        if !bundle.contains(path) {
            return Err(StoreError::EntryNotFound {
                id: id.to_string(),
                path: path.to_string(),
            });
        }
        Ok(bundle.read_bytes(path)?)
    }

    /// Repacks every file below `prefix` into a new zip archive, with names
    /// relative to `prefix`.
    pub fn extract_dir(&self, id: &str, prefix: &str) -> Result<Vec<u8>> {
        let bytes = self.read(id)?;
        let bundle = Bundle::open(&bytes)?;
        let prefix = if prefix.ends_with('/') {
            prefix.to_string()
        } else {
            format!("{prefix}/")
        };

        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        let options = zip::write::SimpleFileOptions::default();
        let mut copied = 0usize;

        for name in bundle.entry_names().filter(|name| name.starts_with(&prefix)) {
            if !bundle.contains(name) {
                continue;
            }
            let data = bundle.read_bytes(name)?;
            writer
                .start_file(&name[prefix.len()..], options)
                .map_err(|e| StoreError::Archive(e.to_string()))?;
            writer.write_all(&data)?;
            copied += 1;
        }

        if copied == 0 {
            return Err(StoreError::EntryNotFound {
                id: id.to_string(),
                path: prefix,
            });
        }
        debug!(id, prefix = %prefix, files = copied, "Repacked directory");

        let cursor = writer
            .finish()
            .map_err(|e| StoreError::Archive(e.to_string()))?;
        Ok(cursor.into_inner())
    }
}
