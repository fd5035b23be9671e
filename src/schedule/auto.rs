//! Initial placement of a project's unscheduled work.
//!
//! Every task without a start date, plus one new task for each budget
//! category that still has money but no task, is laid end to end in
//! category display order starting at the project's start date. No
//! dependency edges are created.

use chrono::NaiveDate;

use crate::config::Config;
use crate::core::dates::{add_days, DateSpan};
use crate::core::{BudgetCategory, CategoryId, ProjectId, ScheduleId, TaskId};
use crate::error::{Error, Result};
use crate::schedule::durations::DurationResolver;
use crate::store::{NewTask, ScheduleStore};
use crate::{clog, clog_debug};

/// What a placement does to the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlacementKind {
    /// Give an existing unscheduled task its dates.
    Update(TaskId),
    /// Create a task for a category that has none.
    Insert(CategoryId),
}

/// One task's place on the timeline.
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub kind: PlacementKind,
    pub name: String,
    pub category_id: CategoryId,
    pub span: DateSpan,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AutoScheduleReport {
    pub inserted: usize,
    pub updated: usize,
    /// Placements in timeline order.
    pub placements: Vec<Placement>,
}

/// Work collected before sorting.
struct Pending {
    kind: PlacementKind,
    name: String,
    category_id: CategoryId,
    duration: u32,
    display_order: i32,
}

pub struct AutoScheduler<'a, S: ScheduleStore> {
    store: &'a mut S,
    config: &'a Config,
}

impl<'a, S: ScheduleStore> AutoScheduler<'a, S> {
    pub fn new(store: &'a mut S, config: &'a Config) -> Self {
        Self { store, config }
    }

    pub fn run(&mut self, project_id: ProjectId) -> Result<AutoScheduleReport> {
        let project = self.store.get_project(project_id)?;
        let project_start = project
            .start_date
            .ok_or(Error::MissingStartDate(project_id))?;

        clog!(
            "AutoSchedule: project '{}' ({}) from {}",
            project.name,
            project_id.short(),
            project_start
        );

        let resolver = DurationResolver::new(self.store.list_category_defaults()?, self.config);
        let categories = self.store.list_budget_categories(project_id)?;

        let mut pending = Vec::new();
        for category in &categories {
            pending.extend(self.collect(category, &resolver)?);
        }
        // Stable: equal display orders keep category order.
        pending.sort_by_key(|p| p.display_order);

        let mut cursor = project_start;
        if let Some(latest) = self.latest_scheduled_end(project.schedule_id)? {
            let after = add_days(latest, 1)?;
            if after > cursor {
                clog_debug!("AutoSchedule: existing work ends {}, starting after it", latest);
                cursor = after;
            }
        }

        let mut placements = Vec::with_capacity(pending.len());
        for item in pending {
            let span = DateSpan::starting(cursor, item.duration)?;
            cursor = add_days(span.end, 1)?;
            clog_debug!("AutoSchedule: '{}' placed at {}", item.name, span);
            placements.push(Placement {
                kind: item.kind,
                name: item.name,
                category_id: item.category_id,
                span,
            });
        }

        let updates: Vec<(TaskId, DateSpan)> = placements
            .iter()
            .filter_map(|p| match p.kind {
                PlacementKind::Update(id) => Some((id, p.span)),
                PlacementKind::Insert(_) => None,
            })
            .collect();
        let inserts: Vec<NewTask> = placements
            .iter()
            .filter(|p| matches!(p.kind, PlacementKind::Insert(_)))
            .map(|p| NewTask {
                category_id: p.category_id,
                name: p.name.clone(),
                span: p.span,
                display_order: Some(resolver.resolve(&p.name).display_order),
            })
            .collect();

        let updated = if updates.is_empty() {
            0
        } else {
            self.store.update_task_dates_batch(&updates)?
        };
        let inserted = if inserts.is_empty() {
            0
        } else {
            self.store.insert_tasks(inserts)?.len()
        };

        clog!(
            "AutoSchedule: {} task(s) updated, {} inserted",
            updated,
            inserted
        );
        Ok(AutoScheduleReport {
            inserted,
            updated,
            placements,
        })
    }

    fn collect(
        &self,
        category: &BudgetCategory,
        resolver: &DurationResolver,
    ) -> Result<Vec<Pending>> {
        let defaults = resolver.resolve(&category.name);
        let tasks = self.store.list_tasks_by_category(category.id)?;

        if tasks.is_empty() {
            if category.remaining_budget > 0.0 {
                return Ok(vec![Pending {
                    kind: PlacementKind::Insert(category.id),
                    name: category.name.clone(),
                    category_id: category.id,
                    duration: defaults.duration_days,
                    display_order: defaults.display_order,
                }]);
            }
            clog_debug!("AutoSchedule: category '{}' has no budget left, skipping", category.name);
            return Ok(Vec::new());
        }

        Ok(tasks
            .into_iter()
            .filter(|t| !t.is_scheduled())
            .map(|t| Pending {
                kind: PlacementKind::Update(t.id),
                duration: t
                    .duration_days
                    .filter(|d| *d > 0)
                    .unwrap_or(defaults.duration_days),
                name: t.name,
                category_id: category.id,
                display_order: defaults.display_order,
            })
            .collect())
    }

    fn latest_scheduled_end(&self, schedule: ScheduleId) -> Result<Option<NaiveDate>> {
        Ok(self
            .store
            .list_scheduled_tasks(schedule)?
            .iter()
            .filter_map(|t| t.end_date.or(t.start_date))
            .max())
    }
}
