use std::fs;
use std::path::{Path, PathBuf};

use crate::core::{
    BudgetCategory, CategoryDefault, CategoryId, DateSpan, Dependency, Project, ProjectId,
    Schedule, ScheduleId, Task, TaskId,
};
use crate::error::Result;
use crate::store::{
    DependencyEdge, MemoryStore, NewTask, ScheduleSnapshot, ScheduleStore, UpdateOutcome,
};
use crate::{clog_debug, clog_warn};

/// A [`MemoryStore`] persisted to a JSON file.
///
/// Every mutation rewrites the whole file through a temp file and a rename,
/// so the file on disk always holds a complete snapshot. Batched writes
/// rewrite it once. A mutation is applied to a staged copy and only becomes
/// visible once that copy is on disk; a failed write leaves both the file
/// and the in-memory state as they were.
#[derive(Debug)]
pub struct JsonStore {
    path: PathBuf,
    inner: MemoryStore,
}

impl JsonStore {
    /// Open a schedule file. A missing file yields an empty store; the file
    /// is created on the first write.
    pub fn open(path: &Path) -> Result<Self> {
        clog_debug!("JsonStore::open path={}", path.display());

        let inner = if path.exists() {
            let contents = fs::read_to_string(path)?;
            let snapshot: ScheduleSnapshot = serde_json::from_str(&contents)?;
            clog_debug!(
                "JsonStore loaded: {} tasks, {} dependencies",
                snapshot.tasks.len(),
                snapshot.dependencies.len()
            );
            MemoryStore::from_snapshot(snapshot)?
        } else {
            clog_debug!("Schedule file not found, starting empty");
            MemoryStore::new()
        };

        Ok(Self {
            path: path.to_path_buf(),
            inner,
        })
    }

    /// Wrap an existing store and write it to `path` immediately.
    pub fn create(path: &Path, inner: MemoryStore) -> Result<Self> {
        let store = Self {
            path: path.to_path_buf(),
            inner,
        };
        store.persist(&store.inner)?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn inner(&self) -> &MemoryStore {
        &self.inner
    }

    /// Apply `change` to a copy of the store, write the copy, then keep it.
    /// `changed` decides from the result whether anything needs writing.
    fn transact<T>(
        &mut self,
        change: impl FnOnce(&mut MemoryStore) -> Result<T>,
        changed: impl FnOnce(&T) -> bool,
    ) -> Result<T> {
        let mut staged = self.inner.clone();
        let value = change(&mut staged)?;
        if changed(&value) {
            self.persist(&staged)?;
            self.inner = staged;
        }
        Ok(value)
    }

    fn persist(&self, state: &MemoryStore) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let contents = serde_json::to_string_pretty(&state.to_snapshot())?;
        let temp_path = self.path.with_extension("json.tmp");
        if let Err(e) = fs::write(&temp_path, contents) {
            clog_warn!("JsonStore: write to {} failed: {}", temp_path.display(), e);
            return Err(e.into());
        }
        if let Err(e) = fs::rename(&temp_path, &self.path) {
            clog_warn!("JsonStore: rename into {} failed: {}", self.path.display(), e);
            let _ = fs::remove_file(&temp_path);
            return Err(e.into());
        }
        clog_debug!("JsonStore saved: {}", self.path.display());
        Ok(())
    }

    /// Copy the current file next to itself with a `.bak` extension.
    pub fn backup(&self) -> Result<Option<PathBuf>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let backup_path = self.path.with_extension("json.bak");
        fs::copy(&self.path, &backup_path)?;
        clog_debug!("JsonStore backup: {}", backup_path.display());
        Ok(Some(backup_path))
    }
}

impl ScheduleStore for JsonStore {
    fn get_task(&self, id: TaskId) -> Result<Task> {
        self.inner.get_task(id)
    }

    fn get_schedule(&self, id: ScheduleId) -> Result<Schedule> {
        self.inner.get_schedule(id)
    }

    fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.inner.get_project(id)
    }

    fn list_tasks(&self, schedule: ScheduleId) -> Result<Vec<Task>> {
        self.inner.list_tasks(schedule)
    }

    fn list_dependencies(&self, schedule: ScheduleId) -> Result<Vec<Dependency>> {
        self.inner.list_dependencies(schedule)
    }

    fn list_dependencies_by_source(&self, task: TaskId) -> Result<Vec<DependencyEdge>> {
        self.inner.list_dependencies_by_source(task)
    }

    fn list_category_defaults(&self) -> Result<Vec<CategoryDefault>> {
        self.inner.list_category_defaults()
    }

    fn list_budget_categories(&self, project: ProjectId) -> Result<Vec<BudgetCategory>> {
        self.inner.list_budget_categories(project)
    }

    fn list_tasks_by_category(&self, category: CategoryId) -> Result<Vec<Task>> {
        self.inner.list_tasks_by_category(category)
    }

    fn list_scheduled_tasks(&self, schedule: ScheduleId) -> Result<Vec<Task>> {
        self.inner.list_scheduled_tasks(schedule)
    }

    fn update_task_dates(
        &mut self,
        id: TaskId,
        span: DateSpan,
        expected: Option<DateSpan>,
    ) -> Result<UpdateOutcome> {
        self.transact(
            |store| store.update_task_dates(id, span, expected),
            |outcome| *outcome == UpdateOutcome::Applied,
        )
    }

    fn insert_task(&mut self, task: NewTask) -> Result<TaskId> {
        self.transact(|store| store.insert_task(task), |_| true)
    }

    fn update_task_dates_batch(&mut self, updates: &[(TaskId, DateSpan)]) -> Result<usize> {
        self.transact(|store| store.update_task_dates_batch(updates), |written| *written > 0)
    }

    fn insert_tasks(&mut self, tasks: Vec<NewTask>) -> Result<Vec<TaskId>> {
        self.transact(|store| store.insert_tasks(tasks), |ids| !ids.is_empty())
    }
}
