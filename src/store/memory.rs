use std::collections::HashMap;

use crate::core::{
    BudgetCategory, CategoryDefault, CategoryId, DateSpan, Dependency, Project, ProjectId,
    Schedule, ScheduleGraph, ScheduleId, Task, TaskId,
};
use crate::error::{Error, Result};
use crate::store::{DependencyEdge, NewTask, ScheduleSnapshot, ScheduleStore, UpdateOutcome};
use crate::clog_debug;

/// In-memory schedule store.
///
/// Tasks are kept in insertion order with an id index; dependencies live in
/// a [`ScheduleGraph`] so lookups by source task don't scan every edge.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    projects: HashMap<ProjectId, Project>,
    schedules: HashMap<ScheduleId, Schedule>,
    categories: Vec<BudgetCategory>,
    category_defaults: Vec<CategoryDefault>,
    tasks: Vec<Task>,
    task_index: HashMap<TaskId, usize>,
    dependencies: Vec<Dependency>,
    graph: ScheduleGraph,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from a snapshot, checking that every reference resolves.
    pub fn from_snapshot(snapshot: ScheduleSnapshot) -> Result<Self> {
        let mut store = Self::new();
        for schedule in snapshot.schedules {
            store.add_schedule(schedule);
        }
        for project in snapshot.projects {
            store.add_project(project)?;
        }
        for category in snapshot.categories {
            store.add_category(category)?;
        }
        for default in snapshot.category_defaults {
            store.add_category_default(default);
        }
        for task in snapshot.tasks {
            store.add_task(task)?;
        }
        for dep in snapshot.dependencies {
            store.add_dependency(dep)?;
        }
        Ok(store)
    }

    pub fn to_snapshot(&self) -> ScheduleSnapshot {
        let mut projects: Vec<Project> = self.projects.values().cloned().collect();
        projects.sort_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)));
        let mut schedules: Vec<Schedule> = self.schedules.values().cloned().collect();
        schedules.sort_by_key(|s| s.id);

        ScheduleSnapshot {
            projects,
            schedules,
            categories: self.categories.clone(),
            category_defaults: self.category_defaults.clone(),
            tasks: self.tasks.clone(),
            dependencies: self.dependencies.clone(),
        }
    }

    pub fn add_schedule(&mut self, schedule: Schedule) {
        self.schedules.insert(schedule.id, schedule);
    }

    /// Add a project. Its schedule is created if it doesn't exist yet.
    pub fn add_project(&mut self, project: Project) -> Result<()> {
        if let Some(existing) = self.schedules.get(&project.schedule_id) {
            if existing.project_id != project.id {
                return Err(Error::Validation(format!(
                    "schedule {} belongs to project {}, not {}",
                    existing.id, existing.project_id, project.id
                )));
            }
        } else {
            self.add_schedule(Schedule {
                id: project.schedule_id,
                project_id: project.id,
            });
        }
        self.projects.insert(project.id, project);
        Ok(())
    }

    pub fn add_category(&mut self, category: BudgetCategory) -> Result<()> {
        if !self.projects.contains_key(&category.project_id) {
            return Err(Error::ProjectNotFound(category.project_id));
        }
        self.categories.push(category);
        Ok(())
    }

    pub fn add_category_default(&mut self, default: CategoryDefault) {
        self.category_defaults.retain(|d| d.name != default.name);
        self.category_defaults.push(default);
    }

    pub fn add_task(&mut self, task: Task) -> Result<TaskId> {
        if !self.schedules.contains_key(&task.schedule_id) {
            return Err(Error::ScheduleNotFound(task.schedule_id));
        }
        if self.task_index.contains_key(&task.id) {
            return Err(Error::Validation(format!("duplicate task id {}", task.id)));
        }
        let id = task.id;
        self.graph.add_task(id);
        self.task_index.insert(id, self.tasks.len());
        self.tasks.push(task);
        Ok(id)
    }

    /// Add an edge. Both endpoints must exist; cycles are not rejected.
    pub fn add_dependency(&mut self, dep: Dependency) -> Result<()> {
        for id in [dep.source, dep.target] {
            if !self.task_index.contains_key(&id) {
                return Err(Error::TaskNotFound(id));
            }
        }
        self.graph.add_dependency(dep.clone());
        self.dependencies.push(dep);
        Ok(())
    }

    pub fn graph(&self) -> &ScheduleGraph {
        &self.graph
    }

    fn task(&self, id: TaskId) -> Result<&Task> {
        self.task_index
            .get(&id)
            .map(|&i| &self.tasks[i])
            .ok_or(Error::TaskNotFound(id))
    }

    fn task_mut(&mut self, id: TaskId) -> Result<&mut Task> {
        match self.task_index.get(&id) {
            Some(&i) => Ok(&mut self.tasks[i]),
            None => Err(Error::TaskNotFound(id)),
        }
    }
}

impl ScheduleStore for MemoryStore {
    fn get_task(&self, id: TaskId) -> Result<Task> {
        self.task(id).cloned()
    }

    fn get_schedule(&self, id: ScheduleId) -> Result<Schedule> {
        self.schedules
            .get(&id)
            .cloned()
            .ok_or(Error::ScheduleNotFound(id))
    }

    fn get_project(&self, id: ProjectId) -> Result<Project> {
        self.projects
            .get(&id)
            .cloned()
            .ok_or(Error::ProjectNotFound(id))
    }

    fn list_tasks(&self, schedule: ScheduleId) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.schedule_id == schedule)
            .cloned()
            .collect())
    }

    fn list_dependencies(&self, schedule: ScheduleId) -> Result<Vec<Dependency>> {
        let mut deps = Vec::new();
        for dep in &self.dependencies {
            if self.task(dep.source)?.schedule_id == schedule {
                deps.push(dep.clone());
            }
        }
        Ok(deps)
    }

    fn list_dependencies_by_source(&self, task: TaskId) -> Result<Vec<DependencyEdge>> {
        self.graph
            .outgoing(&task)
            .into_iter()
            .map(|dep| {
                let target = self.task(dep.target)?;
                Ok(DependencyEdge {
                    target_task_id: target.id,
                    dependency_type: dep.dependency_type,
                    lag_days: dep.lag_days,
                    target_duration: target.duration_days,
                    target_constraint: target.constraint,
                    target_current: target.span(),
                    target_schedule_id: target.schedule_id,
                })
            })
            .collect()
    }

    fn list_category_defaults(&self) -> Result<Vec<CategoryDefault>> {
        Ok(self.category_defaults.clone())
    }

    fn list_budget_categories(&self, project: ProjectId) -> Result<Vec<BudgetCategory>> {
        Ok(self
            .categories
            .iter()
            .filter(|c| c.project_id == project)
            .cloned()
            .collect())
    }

    fn list_tasks_by_category(&self, category: CategoryId) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.category_id == Some(category))
            .cloned()
            .collect())
    }

    fn list_scheduled_tasks(&self, schedule: ScheduleId) -> Result<Vec<Task>> {
        Ok(self
            .tasks
            .iter()
            .filter(|t| t.schedule_id == schedule && t.is_scheduled())
            .cloned()
            .collect())
    }

    fn update_task_dates(
        &mut self,
        id: TaskId,
        span: DateSpan,
        expected: Option<DateSpan>,
    ) -> Result<UpdateOutcome> {
        let task = self.task_mut(id)?;
        if let Some(expected) = expected {
            let current = task.span();
            if current != Some(expected) {
                clog_debug!(
                    "MemoryStore: conflict on task {} (expected {}, found {:?})",
                    id.short(),
                    expected,
                    current
                );
                return Ok(UpdateOutcome::Conflict { current });
            }
        }
        if task.duration_days.is_none() {
            task.duration_days = u32::try_from(span.len_days()).ok().filter(|d| *d > 0);
        }
        task.set_span(span);
        Ok(UpdateOutcome::Applied)
    }

    fn insert_task(&mut self, new: NewTask) -> Result<TaskId> {
        let category = self
            .categories
            .iter()
            .find(|c| c.id == new.category_id)
            .ok_or(Error::CategoryNotFound(new.category_id))?;
        let schedule_id = self
            .projects
            .get(&category.project_id)
            .map(|p| p.schedule_id)
            .ok_or(Error::ProjectNotFound(category.project_id))?;

        let duration = u32::try_from(new.span.len_days())
            .ok()
            .filter(|d| *d > 0)
            .ok_or_else(|| Error::Validation(format!("invalid span {} for new task", new.span)))?;

        let mut task = Task::new(schedule_id, &new.name)
            .in_category(new.category_id)
            .with_duration(duration);
        task.display_order = new.display_order;
        task.set_span(new.span);
        self.add_task(task)
    }
}
