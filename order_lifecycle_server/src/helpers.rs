use std::{
    fs,
    path::{Path, PathBuf},
};

use log::{debug, trace};

/// Extracts the file path from a SQLite URL such as `sqlite://data/orders.db?mode=rwc`. In-memory databases have no
/// file path.
pub fn sqlite_file_path(url: &str) -> Option<PathBuf> {
    let path = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")).unwrap_or(url);
    let path = path.split('?').next().unwrap_or_default();
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

/// SQLite will create the database file, but not the directory it lives in. This creates the directory if needed.
pub fn ensure_database_dir(url: &str) -> std::io::Result<()> {
    let Some(dir) = sqlite_file_path(url).as_deref().and_then(Path::parent).map(Path::to_path_buf) else {
        trace!("🗃️ No database directory to create for {url}");
        return Ok(());
    };
    if dir.as_os_str().is_empty() || dir.exists() {
        return Ok(());
    }
    debug!("🗃️ Creating database directory {}", dir.display());
    fs::create_dir_all(dir)
}
