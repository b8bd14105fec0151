use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use adjutant_core::event_bus::{Event, EventBus};
use adjutant_core::types::{Bead, BeadStatus, BeadType, EpicProgress, EpicWithProgress};
use dashmap::DashMap;
use serde::Serialize;
use tokio::io::AsyncReadExt;
use tokio::sync::Mutex;

use crate::cascade::{epics_to_close, CascadeNode};
use crate::error::{classify_stderr, BeadsError};
use crate::graph::BeadGraph;
use crate::prefix_map::{apply_scan, scan_for_beads_dirs};

fn bead_type_str(bead_type: BeadType) -> &'static str {
    match bead_type {
        BeadType::Epic => "epic",
        BeadType::Task => "task",
        BeadType::Bug => "bug",
    }
}

#[derive(Debug, Clone, Default)]
pub struct BeadFilter {
    pub status: Option<BeadStatus>,
    pub assignee: Option<String>,
    pub bead_type: Option<BeadType>,
    pub limit: Option<u32>,
    pub rig: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct ProjectOverview {
    pub open_beads: Vec<Bead>,
    pub in_progress: Vec<Bead>,
    pub recently_closed: Vec<Bead>,
    pub epics_with_progress: Vec<EpicWithProgress>,
}

/// The single point that invokes the external `bd` CLI. All invocations
/// serialize through `invoke_lock` — the underlying CLI performs
/// non-atomic file writes on a SQLite-backed store, so concurrent
/// invocations corrupt state.
pub struct BdGateway {
    workspace_root: PathBuf,
    bd_timeout: Duration,
    actor: String,
    invoke_lock: Mutex<()>,
    prefix_map: DashMap<String, PathBuf>,
    events: Arc<EventBus>,
}

impl BdGateway {
    pub fn new(workspace_root: PathBuf, bd_timeout_ms: u64, actor: impl Into<String>, events: Arc<EventBus>) -> Self {
        Self {
            workspace_root,
            bd_timeout: Duration::from_millis(bd_timeout_ms),
            actor: actor.into(),
            invoke_lock: Mutex::new(()),
            prefix_map: DashMap::new(),
            events,
        }
    }

    /// Rebuild the prefix-to-database map by scanning the workspace. Called
    /// at startup, on the scheduled refresh interval, and on-demand when a
    /// lookup misses.
    pub async fn refresh_prefix_map(&self) -> Result<(), BeadsError> {
        let root = self.workspace_root.clone();
        let scanned = tokio::task::spawn_blocking(move || scan_for_beads_dirs(&root))
            .await
            .map_err(|e| BeadsError::Subprocess(e.to_string()))?;
        apply_scan(&self.prefix_map, scanned);
        Ok(())
    }

    async fn database_dir_for_prefix(&self, prefix: &str) -> Result<PathBuf, BeadsError> {
        if let Some(dir) = self.prefix_map.get(prefix) {
            return Ok(dir.value().clone());
        }
        self.refresh_prefix_map().await?;
        self.prefix_map
            .get(prefix)
            .map(|d| d.value().clone())
            .ok_or_else(|| BeadsError::NotFound(format!("no database for prefix {prefix}")))
    }

    /// The set of `.beads` directories to query for a given filter, per the
    /// `buildDatabaseList(rig?)` routing rule.
    fn database_list(&self, rig: Option<&str>) -> Vec<PathBuf> {
        self.prefix_map
            .iter()
            .filter(|entry| rig.map(|r| entry.key() == r).unwrap_or(true))
            .map(|entry| entry.value().clone())
            .collect()
    }

    async fn invoke(&self, args: &[String], cwd: &Path) -> Result<serde_json::Value, BeadsError> {
        let _guard = self.invoke_lock.lock().await;

        let mut cmd = tokio::process::Command::new("bd");
        cmd.args(args)
            .arg("--json")
            .current_dir(cwd)
            .env("BD_ACTOR", &self.actor)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        let mut child = cmd.spawn().map_err(|e| BeadsError::Subprocess(e.to_string()))?;
        let mut stdout = child.stdout.take().expect("stdout piped");
        let mut stderr = child.stderr.take().expect("stderr piped");

        let mut out_buf = Vec::new();
        let mut err_buf = Vec::new();
        let drain = async {
            tokio::try_join!(stdout.read_to_end(&mut out_buf), stderr.read_to_end(&mut err_buf))?;
            child.wait().await
        };

        let status = match tokio::time::timeout(self.bd_timeout, drain).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(BeadsError::Subprocess(e.to_string())),
            Err(_) => {
                let _ = child.kill().await;
                return Err(BeadsError::Timeout);
            }
        };

        if !status.success() {
            let stderr_text = String::from_utf8_lossy(&err_buf).to_string();
            return Err(classify_stderr(&stderr_text));
        }

        serde_json::from_slice(&out_buf).map_err(|e| BeadsError::Subprocess(e.to_string()))
    }

    pub async fn list(&self, filter: BeadFilter) -> Result<Vec<Bead>, BeadsError> {
        let dirs = self.database_list(filter.rig.as_deref());
        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();

        for dir in dirs {
            let mut args = vec!["list".to_string()];
            if let Some(status) = filter.status {
                args.push("--status".into());
                args.push(status.as_str().to_string());
            }
            if let Some(assignee) = &filter.assignee {
                args.push("--assignee".into());
                args.push(assignee.clone());
            }
            let value = self.invoke(&args, &dir).await?;
            let beads: Vec<Bead> = serde_json::from_value(value).unwrap_or_default();
            for bead in beads {
                if bead.is_wisp() {
                    continue;
                }
                if let Some(bead_type) = filter.bead_type {
                    if bead.bead_type != bead_type {
                        continue;
                    }
                }
                if seen.insert(bead.id.clone()) {
                    out.push(bead);
                }
            }
        }

        out.sort_by(|a, b| a.priority.cmp(&b.priority).then(b.updated_at.cmp(&a.updated_at)));
        if let Some(limit) = filter.limit {
            out.truncate(limit as usize);
        }
        Ok(out)
    }

    pub async fn list_all(&self, filter: BeadFilter) -> Result<Vec<Bead>, BeadsError> {
        self.list(BeadFilter { rig: None, ..filter }).await
    }

    pub async fn list_recently_closed(&self, hours: i64) -> Result<Vec<Bead>, BeadsError> {
        let cutoff = chrono::Utc::now() - chrono::Duration::hours(hours);
        let mut all = self
            .list_all(BeadFilter { status: Some(BeadStatus::Closed), ..Default::default() })
            .await?;
        all.retain(|b| b.closed_at.map(|c| c >= cutoff).unwrap_or(false));
        all.sort_by(|a, b| b.closed_at.cmp(&a.closed_at));
        Ok(all)
    }

    pub async fn get(&self, id: &str) -> Result<Bead, BeadsError> {
        let prefix = id.split('-').next().unwrap_or(id);
        let dir = self.database_dir_for_prefix(prefix).await?;
        let value = self.invoke(&["show".to_string(), id.to_string()], &dir).await?;
        serde_json::from_value(value).map_err(|e| BeadsError::Subprocess(e.to_string()))
    }

    /// Creates a bead in `beads_dir` directly — unlike every other operation
    /// here, there is no id yet to route by prefix, so the caller (the
    /// `create_bead` MCP tool handler) must supply the session's
    /// project-scoped beads directory.
    pub async fn create(
        &self,
        beads_dir: &Path,
        title: String,
        description: Option<String>,
        bead_type: BeadType,
        priority: u8,
    ) -> Result<Bead, BeadsError> {
        let mut args = vec!["create".to_string(), title, "--type".into(), bead_type_str(bead_type).into()];
        args.push("--priority".into());
        args.push(priority.to_string());
        if let Some(description) = description {
            args.push("--description".into());
            args.push(description);
        }

        let value = self.invoke(&args, beads_dir).await?;
        let bead: Bead = serde_json::from_value(value).map_err(|e| BeadsError::Subprocess(e.to_string()))?;
        self.events.publish(Event::BeadCreated(bead.clone()));
        Ok(bead)
    }

    pub async fn update(
        &self,
        id: &str,
        status: Option<BeadStatus>,
        title: Option<String>,
        description: Option<String>,
        assignee: Option<String>,
        priority: Option<u8>,
    ) -> Result<Bead, BeadsError> {
        if let Some(status) = status {
            if !BeadStatus::ALL.contains(&status) {
                return Err(BeadsError::Validation(format!("invalid status {status:?}")));
            }
        }
        let prefix = id.split('-').next().unwrap_or(id);
        let dir = self.database_dir_for_prefix(prefix).await?;

        let mut args = vec!["update".to_string(), id.to_string()];
        if let Some(status) = status {
            args.push("--status".into());
            args.push(status.as_str().to_string());
        }
        if let Some(title) = title {
            args.push("--title".into());
            args.push(title);
        }
        if let Some(description) = description {
            args.push("--description".into());
            args.push(description);
        }
        if let Some(assignee) = assignee {
            args.push("--assignee".into());
            args.push(assignee);
        }
        if let Some(priority) = priority {
            args.push("--priority".into());
            args.push(priority.to_string());
        }

        let value = self.invoke(&args, &dir).await?;
        let bead: Bead = serde_json::from_value(value).map_err(|e| BeadsError::Subprocess(e.to_string()))?;
        self.events.publish(Event::BeadUpdated(bead.clone()));

        if bead.status.is_closed() {
            self.run_cascade(&bead.id, &dir).await?;
        }
        Ok(bead)
    }

    pub async fn close(&self, id: &str, reason: Option<String>) -> Result<Bead, BeadsError> {
        let prefix = id.split('-').next().unwrap_or(id);
        let dir = self.database_dir_for_prefix(prefix).await?;
        let bead = self.close_via_cli(id, reason, &dir).await?;
        self.run_cascade(&bead.id, &dir).await?;
        Ok(bead)
    }

    async fn close_via_cli(&self, id: &str, reason: Option<String>, dir: &Path) -> Result<Bead, BeadsError> {
        let mut args = vec!["close".to_string(), id.to_string()];
        if let Some(reason) = reason {
            args.push("--reason".into());
            args.push(reason);
        }
        let value = self.invoke(&args, dir).await?;
        let bead: Bead = serde_json::from_value(value).map_err(|e| BeadsError::Subprocess(e.to_string()))?;
        self.events.publish(Event::BeadClosed(bead.clone()));
        Ok(bead)
    }

    /// Walk the dependency graph from `closed_id` and close any epic
    /// ancestor whose direct children are all closed. Uses
    /// [`epics_to_close`] to compute the full (already-ordered) cascade up
    /// front, then closes each one directly — no recursive `close` calls.
    async fn run_cascade(&self, closed_id: &str, dir: &Path) -> Result<(), BeadsError> {
        let graph = self.graph_in_dir(dir).await?;
        let all = self.list_all(BeadFilter::default()).await?;
        let lookup: HashMap<String, CascadeNode> = all
            .iter()
            .map(|b| (b.id.clone(), CascadeNode { bead_type: b.bead_type, status: b.status }))
            .collect();

        for epic_id in epics_to_close(&graph, &lookup, closed_id) {
            self.close_via_cli(&epic_id, Some("auto-completed: all children closed".into()), dir)
                .await?;
        }
        Ok(())
    }

    async fn graph_in_dir(&self, dir: &Path) -> Result<BeadGraph, BeadsError> {
        let value = self.invoke(&["graph".to_string()], dir).await?;
        let graph: BeadGraph = serde_json::from_value(value).map_err(|e| BeadsError::Subprocess(e.to_string()))?;
        Ok(graph.dedup())
    }

    /// The full dependency graph, optionally restricted to a single rig
    /// (prefix). With no rig, merges every known database's graph,
    /// deduplicating nodes by id and edges by `(from, to, kind)`.
    pub async fn graph(&self, rig: Option<&str>) -> Result<BeadGraph, BeadsError> {
        let dirs = self.database_list(rig);
        let mut merged = BeadGraph::default();
        for dir in dirs {
            let graph = self.graph_in_dir(&dir).await?;
            merged.nodes.extend(graph.nodes);
            merged.edges.extend(graph.edges);
        }
        Ok(merged.dedup())
    }

    pub async fn epics_with_progress(
        &self,
        status_filter: Option<BeadStatus>,
    ) -> Result<Vec<EpicWithProgress>, BeadsError> {
        let epics = self
            .list_all(BeadFilter { bead_type: Some(BeadType::Epic), status: status_filter, ..Default::default() })
            .await?;
        let all = self.list_all(BeadFilter::default()).await?;

        let mut results = Vec::new();
        for epic in epics {
            let dir = self.database_dir_for_prefix(epic.prefix()).await?;
            let graph = self.graph_in_dir(&dir).await?;
            let children = graph.children_of(&epic.id);
            let total = children.len() as u32;
            let closed = children
                .iter()
                .filter(|id| all.iter().any(|b| &b.id == *id && b.status.is_closed()))
                .count() as u32;
            results.push(EpicWithProgress {
                epic,
                progress: EpicProgress { closed_children: closed, total_children: total },
            });
        }
        results.sort_by(|a, b| b.progress.ratio().partial_cmp(&a.progress.ratio()).unwrap());
        Ok(results)
    }

    pub async fn project_overview(&self, project_path: &str) -> Result<ProjectOverview, BeadsError> {
        let _ = project_path; // routing already keyed by prefix map; kept for interface parity
        let open_beads = self.list_all(BeadFilter { status: Some(BeadStatus::Open), ..Default::default() }).await?;
        let in_progress =
            self.list_all(BeadFilter { status: Some(BeadStatus::InProgress), ..Default::default() }).await?;
        let recently_closed = self.list_recently_closed(24).await?;
        let epics_with_progress = self.epics_with_progress(None).await?;
        Ok(ProjectOverview { open_beads, in_progress, recently_closed, epics_with_progress })
    }
}
