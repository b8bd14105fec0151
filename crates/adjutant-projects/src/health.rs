use std::path::Path;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectHealth {
    pub path_exists: bool,
    pub git_valid: bool,
    pub has_beads: bool,
}

pub fn check(path: &Path) -> ProjectHealth {
    ProjectHealth {
        path_exists: path.is_dir(),
        git_valid: path.join(".git").exists(),
        has_beads: path.join(".beads").join("beads.db").is_file(),
    }
}
