use std::io::{Cursor, Read};

use anyhow::Context as _;

use crate::error::{StageError, StageResult};

/// Canonical name of the descriptor entry inside a packaged project.
pub const DESCRIPTOR_ENTRY: &str = "project.json";

/// A pre-loaded bundle of named byte entries, substituting for network
/// fetches when a project is loaded from a local package.
///
/// Entries keep archive order and lookups scan linearly, first match wins;
/// packages are small enough that an index would not pay for itself. The
/// whole structure is read-only for the project's lifetime.
#[derive(Clone, Debug)]
pub struct ProjectArchive {
    entries: Vec<(String, Vec<u8>)>,
}

impl ProjectArchive {
    /// Open a zip package and read every entry into memory.
    pub fn open(bytes: &[u8]) -> StageResult<Self> {
        let mut zip = zip::ZipArchive::new(Cursor::new(bytes))
            .context("open project package as zip")
            .map_err(StageError::from)?;

        let mut entries = Vec::with_capacity(zip.len());
        for i in 0..zip.len() {
            let mut file = zip
                .by_index(i)
                .with_context(|| format!("read package entry {i}"))
                .map_err(StageError::from)?;
            if file.is_dir() {
                continue;
            }
            let name = file.name().to_string();
            let mut buf = Vec::with_capacity(file.size() as usize);
            file.read_to_end(&mut buf)
                .with_context(|| format!("read package entry '{name}'"))
                .map_err(StageError::from)?;
            entries.push((name, buf));
        }

        Ok(Self { entries })
    }

    /// Bytes of the first entry named `name`, if any.
    pub fn entry(&self, name: &str) -> Option<&[u8]> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, bytes)| bytes.as_slice())
    }

    /// Bytes of the canonical descriptor entry. A package without one is a
    /// descriptor error, not a silent no-op.
    pub fn descriptor_bytes(&self) -> StageResult<&[u8]> {
        self.entry(DESCRIPTOR_ENTRY).ok_or_else(|| {
            StageError::descriptor(format!("package has no '{DESCRIPTOR_ENTRY}' entry"))
        })
    }

    /// Number of file entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the package holds no file entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entry names in archive order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }
}
