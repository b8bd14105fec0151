use std::path::{Path, PathBuf};
use std::sync::Arc;

use adjutant_core::event_bus::{Event, EventBus};
use adjutant_core::json_store::{read_or_default, write_atomic};
use adjutant_core::types::{Project, ProjectMode};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::ProjectsError;
use crate::health::{self, ProjectHealth};

/// Where a newly registered project's working copy comes from.
pub enum RegisterSource {
    /// Register an existing directory already on disk.
    Path(PathBuf),
    /// `git clone` a remote into `into` before registering it.
    CloneUrl { url: String, into: PathBuf },
    /// Create a fresh empty directory (and `git init` it) before registering.
    Empty { name: String, at: PathBuf },
}

/// On-disk registry of known projects, with an in-memory cache kept in
/// sync on every mutation. Persistence is a single JSON file, written
/// whole via temp-file-and-rename so readers never see a partial file.
pub struct ProjectRegistry {
    path: PathBuf,
    projects: RwLock<Vec<Project>>,
    events: Arc<EventBus>,
}

impl ProjectRegistry {
    pub async fn load(path: impl Into<PathBuf>, events: Arc<EventBus>) -> Result<Self, ProjectsError> {
        let path = path.into();
        let projects: Vec<Project> = read_or_default(&path).await?;
        Ok(Self { path, projects: RwLock::new(projects), events })
    }

    async fn persist(&self, projects: &[Project]) -> Result<(), ProjectsError> {
        write_atomic(&self.path, &projects.to_vec()).await?;
        Ok(())
    }

    pub async fn register(&self, source: RegisterSource) -> Result<Project, ProjectsError> {
        let path = match source {
            RegisterSource::Path(path) => {
                if !path.is_dir() {
                    return Err(ProjectsError::Validation(format!(
                        "path does not exist: {}",
                        path.display()
                    )));
                }
                path
            }
            RegisterSource::CloneUrl { url, into } => {
                let status = tokio::process::Command::new("git")
                    .arg("clone")
                    .arg(&url)
                    .arg(&into)
                    .status()
                    .await
                    .map_err(|e| ProjectsError::Storage(format!("git clone failed to start: {e}")))?;
                if !status.success() {
                    return Err(ProjectsError::Storage(format!("git clone of {url} failed")));
                }
                into
            }
            RegisterSource::Empty { name, at } => {
                let target = at.join(&name);
                tokio::fs::create_dir_all(&target).await?;
                let status = tokio::process::Command::new("git")
                    .arg("init")
                    .arg(&target)
                    .status()
                    .await
                    .map_err(|e| ProjectsError::Storage(format!("git init failed to start: {e}")))?;
                if !status.success() {
                    return Err(ProjectsError::Storage(format!("git init in {} failed", target.display())));
                }
                target
            }
        };

        let health = health::check(&path);
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());

        let project = Project {
            id: Uuid::new_v4().to_string(),
            name,
            path: path.to_string_lossy().into_owned(),
            git_remote: None,
            mode: ProjectMode::Standalone,
            active: false,
            has_beads: health.has_beads,
        };

        let mut projects = self.projects.write().await;
        projects.push(project.clone());
        self.persist(&projects).await?;
        drop(projects);

        self.events.publish(Event::ProjectRegistered(project.clone()));
        Ok(project)
    }

    pub async fn list(&self) -> Vec<Project> {
        self.projects.read().await.clone()
    }

    pub async fn activate(&self, id: &str) -> Result<Project, ProjectsError> {
        let mut projects = self.projects.write().await;
        if !projects.iter().any(|p| p.id == id) {
            return Err(ProjectsError::NotFound(id.to_string()));
        }
        for project in projects.iter_mut() {
            project.active = project.id == id;
        }
        self.persist(&projects).await?;
        let activated = projects.iter().find(|p| p.id == id).cloned().unwrap();
        drop(projects);

        self.events.publish(Event::ProjectActivated(activated.clone()));
        Ok(activated)
    }

    pub async fn unregister(&self, id: &str) -> Result<(), ProjectsError> {
        let mut projects = self.projects.write().await;
        let index = projects
            .iter()
            .position(|p| p.id == id)
            .ok_or_else(|| ProjectsError::NotFound(id.to_string()))?;
        let removed = projects.remove(index);
        self.persist(&projects).await?;
        drop(projects);

        self.events.publish(Event::ProjectUnregistered(removed));
        Ok(())
    }

    /// Scan `base_dirs` up to `max_depth` levels for `.git`/`.beads`
    /// markers. Existing entries have their `has_beads` flag refreshed;
    /// unregistered directories found this way are added as new, inactive
    /// entries.
    pub async fn discover(
        &self,
        base_dirs: Vec<PathBuf>,
        max_depth: u32,
    ) -> Result<Vec<Project>, ProjectsError> {
        let max_depth = max_depth.clamp(1, 3);
        let found = tokio::task::spawn_blocking(move || scan_markers(&base_dirs, max_depth))
            .await
            .map_err(|e| ProjectsError::Storage(e.to_string()))?;

        let mut projects = self.projects.write().await;
        let mut newly_added = Vec::new();

        for path in found {
            let health = health::check(&path);
            let path_str = path.to_string_lossy().into_owned();
            if let Some(existing) = projects.iter_mut().find(|p| p.path == path_str) {
                existing.has_beads = health.has_beads;
            } else {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path_str.clone());
                let project = Project {
                    id: Uuid::new_v4().to_string(),
                    name,
                    path: path_str,
                    git_remote: None,
                    mode: ProjectMode::Standalone,
                    active: false,
                    has_beads: health.has_beads,
                };
                projects.push(project.clone());
                newly_added.push(project);
            }
        }
        self.persist(&projects).await?;
        Ok(newly_added)
    }

    pub async fn health(&self, id: &str) -> Result<ProjectHealth, ProjectsError> {
        let projects = self.projects.read().await;
        let project = projects
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| ProjectsError::NotFound(id.to_string()))?;
        Ok(health::check(Path::new(&project.path)))
    }
}

fn scan_markers(base_dirs: &[PathBuf], max_depth: u32) -> Vec<PathBuf> {
    let mut found = Vec::new();
    for base in base_dirs {
        walk(base, max_depth, &mut found);
    }
    found
}

fn walk(dir: &Path, depth_remaining: u32, found: &mut Vec<PathBuf>) {
    if dir.join(".git").exists() || dir.join(".beads").exists() {
        found.push(dir.to_path_buf());
        return;
    }
    if depth_remaining == 0 {
        return;
    }
    let Ok(entries) = std::fs::read_dir(dir) else { return };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            walk(&path, depth_remaining - 1, found);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn registry(dir: &std::path::Path) -> ProjectRegistry {
        ProjectRegistry::load(dir.join("projects.json"), Arc::new(EventBus::new()))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn register_rejects_missing_path() {
        let dir = tempfile::tempdir().unwrap();
        let registry = registry(dir.path()).await;
        let err = registry
            .register(RegisterSource::Path(dir.path().join("nope")))
            .await
            .unwrap_err();
        assert!(matches!(err, ProjectsError::Validation(_)));
    }

    #[tokio::test]
    async fn register_then_list_persists_across_reload() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("proj");
        tokio::fs::create_dir_all(&project_dir).await.unwrap();

        let registry = registry(dir.path()).await;
        let project = registry.register(RegisterSource::Path(project_dir)).await.unwrap();
        assert_eq!(registry.list().await.len(), 1);

        let reloaded = registry(dir.path()).await;
        let reloaded_list = reloaded.list().await;
        assert_eq!(reloaded_list.len(), 1);
        assert_eq!(reloaded_list[0].id, project.id);
    }

    #[tokio::test]
    async fn activate_allows_at_most_one_active_project() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a");
        let b = dir.path().join("b");
        tokio::fs::create_dir_all(&a).await.unwrap();
        tokio::fs::create_dir_all(&b).await.unwrap();

        let registry = registry(dir.path()).await;
        let pa = registry.register(RegisterSource::Path(a)).await.unwrap();
        let pb = registry.register(RegisterSource::Path(b)).await.unwrap();

        registry.activate(&pa.id).await.unwrap();
        registry.activate(&pb.id).await.unwrap();

        let list = registry.list().await;
        let active: Vec<_> = list.iter().filter(|p| p.active).collect();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, pb.id);
    }

    #[tokio::test]
    async fn unregister_removes_entry_without_touching_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("proj");
        tokio::fs::create_dir_all(&project_dir).await.unwrap();

        let registry = registry(dir.path()).await;
        let project = registry.register(RegisterSource::Path(project_dir.clone())).await.unwrap();
        registry.unregister(&project.id).await.unwrap();

        assert!(registry.list().await.is_empty());
        assert!(project_dir.is_dir());
    }

    #[tokio::test]
    async fn discover_finds_git_marked_directories() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("group").join("repo");
        tokio::fs::create_dir_all(nested.join(".git")).await.unwrap();

        let registry = registry(dir.path()).await;
        let newly_added = registry.discover(vec![dir.path().to_path_buf()], 3).await.unwrap();
        assert_eq!(newly_added.len(), 1);
        assert_eq!(newly_added[0].path, nested.to_string_lossy());
    }

    #[tokio::test]
    async fn health_reports_missing_beads_db() {
        let dir = tempfile::tempdir().unwrap();
        let project_dir = dir.path().join("proj");
        tokio::fs::create_dir_all(&project_dir).await.unwrap();

        let registry = registry(dir.path()).await;
        let project = registry.register(RegisterSource::Path(project_dir)).await.unwrap();
        let health = registry.health(&project.id).await.unwrap();
        assert!(health.path_exists);
        assert!(!health.has_beads);
    }
}
