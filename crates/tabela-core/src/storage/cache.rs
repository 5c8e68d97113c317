//! Best-effort local cache of the table being edited.
//!
//! The cache never reports failures: a table that cannot be stored is simply
//! not cached, and an unreadable cache loads as nothing.
//!
//! Headers are cached flattened, one `{id, text}` entry per column, and
//! regrouped on load by joining consecutive entries with the same text. Two
//! adjacent groups sharing a text therefore come back as one group.

use directories::ProjectDirs;
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::document::{FlatHeader, Grid, Headers, Table, TableCell};
use crate::error::Result;

const CACHE_FILE_NAME: &str = "tabela-cache.json";

/// Cached shape of a table.
#[derive(Debug, Serialize, Deserialize)]
struct CachedTable {
    headers: Vec<FlatHeader>,
    rows: Vec<Vec<TableCell>>,
}

fn write_cached(path: &Path, table: &Table) -> Result<()> {
    let cached = CachedTable {
        headers: table.headers.flatten(),
        rows: table.grid.rows().to_vec(),
    };
    fs::write(path, serde_json::to_string(&cached)?)?;
    Ok(())
}

fn read_cached(path: &Path) -> Result<Table> {
    let cached: CachedTable = serde_json::from_str(&fs::read_to_string(path)?)?;
    let table = Table::new(Headers::regroup(&cached.headers), Grid::new(cached.rows));
    table.validate()?;
    Ok(table)
}

#[derive(Clone, Debug)]
pub struct TableCache {
    path: PathBuf,
}

impl TableCache {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        TableCache { path: path.into() }
    }

    /// Cache file in the per-user data directory, if one can be determined.
    pub fn user_default() -> Option<Self> {
        let proj = ProjectDirs::from("", "", "tabela")?;
        Some(TableCache::new(proj.data_local_dir().join(CACHE_FILE_NAME)))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn store(&self, table: &Table) {
        if let Some(parent) = self.path.parent()
            && let Err(err) = fs::create_dir_all(parent)
        {
            warn!("cannot create cache directory {}: {}", parent.display(), err);
            return;
        }
        match write_cached(&self.path, table) {
            Ok(()) => debug!("cached table at {}", self.path.display()),
            Err(err) => warn!("cannot write cache {}: {}", self.path.display(), err),
        }
    }

    pub fn load(&self) -> Option<Table> {
        if !self.path.exists() {
            return None;
        }
        match read_cached(&self.path) {
            Ok(table) => Some(table),
            Err(err) => {
                warn!("ignoring unreadable cache {}: {}", self.path.display(), err);
                None
            }
        }
    }

    /// Forget the cached table.
    pub fn clear(&self) {
        if let Err(err) = fs::remove_file(&self.path)
            && err.kind() != std::io::ErrorKind::NotFound
        {
            warn!("cannot remove cache {}: {}", self.path.display(), err);
        }
    }
}
