//! Prefix-to-database routing table, built by scanning the workspace for
//! `.beads/beads.db` files and reading each database's prefix tag.

use std::path::{Path, PathBuf};

use dashmap::DashMap;

/// Walk `root` looking for `.beads/beads.db` files, returning each one's
/// declared prefix tag alongside the `.beads` directory it lives in.
/// Runs on a blocking thread (directory walks are sync I/O).
pub fn scan_for_beads_dirs(root: &Path) -> Vec<(String, PathBuf)> {
    let mut found = Vec::new();
    let mut stack = vec![root.to_path_buf()];

    while let Some(dir) = stack.pop() {
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(_) => continue,
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if !path.is_dir() {
                continue;
            }
            let is_beads_dir = path.file_name().map(|n| n == ".beads").unwrap_or(false);
            if is_beads_dir {
                let db_path = path.join("beads.db");
                if db_path.is_file() {
                    if let Some(prefix) = read_prefix_tag(&db_path) {
                        found.push((prefix, path));
                    }
                }
                continue;
            }
            let hidden = path
                .file_name()
                .map(|n| n.to_string_lossy().starts_with('.'))
                .unwrap_or(false);
            if !hidden {
                stack.push(path);
            }
        }
    }
    found
}

/// Read the `prefix` value out of a beads SQLite database's metadata
/// table. Best-effort: any I/O or schema mismatch yields `None` rather
/// than failing the whole scan, since the periodic refresh will retry.
fn read_prefix_tag(db_path: &Path) -> Option<String> {
    let conn = rusqlite::Connection::open_with_flags(
        db_path,
        rusqlite::OpenFlags::SQLITE_OPEN_READ_ONLY,
    )
    .ok()?;
    conn.query_row("SELECT value FROM meta WHERE key = 'prefix'", [], |row| {
        row.get::<_, String>(0)
    })
    .ok()
}

/// Thin wrapper used by the gateway; kept separate from the `DashMap` so
/// the scan function above stays pure and unit-testable.
pub fn apply_scan(map: &DashMap<String, PathBuf>, scanned: Vec<(String, PathBuf)>) {
    map.clear();
    for (prefix, path) in scanned {
        map.insert(prefix, path);
    }
}
