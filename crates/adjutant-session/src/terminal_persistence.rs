use std::path::{Path, PathBuf};

use adjutant_core::json_store::{read_or_default, write_atomic};
use adjutant_core::types::TerminalSessionRecord;

use crate::error::Result;

/// Whole-file JSON persistence for terminal session records, so a daemon
/// restart can re-discover tmux sessions and rebind to them.
pub struct TerminalPersistence {
    path: PathBuf,
}

impl TerminalPersistence {
    pub fn new(data_dir: &Path) -> Self {
        Self { path: data_dir.join("terminal_sessions.json") }
    }

    pub async fn save(&self, sessions: &[TerminalSessionRecord]) -> Result<()> {
        write_atomic(&self.path, &sessions.to_vec()).await?;
        Ok(())
    }

    pub async fn load(&self) -> Result<Vec<TerminalSessionRecord>> {
        Ok(read_or_default(&self.path).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adjutant_core::types::{TerminalStatus, WorkspaceType};
    use chrono::Utc;

    fn sample() -> TerminalSessionRecord {
        TerminalSessionRecord {
            id: "a".to_string(),
            name: "session".to_string(),
            tmux_target: "adjutant-a".to_string(),
            project_path: "/tmp/proj".to_string(),
            mode: "claude".to_string(),
            status: TerminalStatus::Idle,
            workspace_type: WorkspaceType::Primary,
            created_at: Utc::now(),
            last_activity: Utc::now(),
        }
    }

    #[tokio::test]
    async fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = TerminalPersistence::new(dir.path());
        assert!(persistence.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempfile::tempdir().unwrap();
        let persistence = TerminalPersistence::new(dir.path());
        persistence.save(&[sample()]).await.unwrap();
        let loaded = persistence.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].id, "a");
    }
}
