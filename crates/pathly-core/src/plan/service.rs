//! Plan service layer.
//!
//! Stores a generated [`LearningPlan`] (plan row, modules, tasks) within a
//! single database transaction, and reads stored plans back with their
//! modules and tasks nested.

use std::collections::HashMap;

use anyhow::{Context, Result};
use sqlx::PgPool;
use tracing::info;
use uuid::Uuid;

use pathly_db::models::{PlanModule, PlanSource, PlanStatus, PlanTask, SkillPlan};
use pathly_db::queries::{modules as module_queries, skill_plans as plan_queries, tasks as task_queries};

use crate::roadmap::{GenerationRequest, LearningPlan, Module, Task};

/// A stored plan with its modules, each with its tasks, all in order.
#[derive(Debug, Clone)]
pub struct StoredPlan {
    pub plan: SkillPlan,
    pub modules: Vec<StoredModule>,
}

#[derive(Debug, Clone)]
pub struct StoredModule {
    pub module: PlanModule,
    pub tasks: Vec<PlanTask>,
}

impl StoredPlan {
    pub fn task_count(&self) -> usize {
        self.modules.iter().map(|m| m.tasks.len()).sum()
    }

    pub fn completed_count(&self) -> usize {
        self.modules
            .iter()
            .flat_map(|m| &m.tasks)
            .filter(|t| t.completed)
            .count()
    }

    /// Rebuild the in-memory plan, e.g. to export it.
    pub fn to_learning_plan(&self) -> LearningPlan {
        let modules = self
            .modules
            .iter()
            .map(|m| Module {
                title: m.module.title.clone(),
                week: u32::try_from(m.module.week).unwrap_or(1),
                order: u32::try_from(m.module.position).unwrap_or(0),
                objective: m.module.objective.clone(),
                tasks: m
                    .tasks
                    .iter()
                    .map(|t| Task {
                        title: t.title.clone(),
                        content_type: t.content_type.clone(),
                        description: t.description.clone(),
                        content_link: t.content_link.clone(),
                    })
                    .collect(),
            })
            .collect();
        LearningPlan { modules }
    }
}

fn to_i32(value: u32, what: &str) -> Result<i32> {
    i32::try_from(value).with_context(|| format!("{what} {value} does not fit in the database"))
}

/// Store `plan` for `req`.
///
/// Inserts the plan row, every module (position = module `order`) and every
/// task (position = index within its module) inside one transaction. If any
/// insert fails, nothing is stored.
pub async fn save_learning_plan(
    pool: &PgPool,
    req: &GenerationRequest,
    plan: &LearningPlan,
    source: PlanSource,
) -> Result<SkillPlan> {
    let mut tx = pool.begin().await.context("failed to begin transaction")?;

    // 1. Insert the plan row.
    let skill_plan = sqlx::query_as::<_, SkillPlan>(
        "INSERT INTO skill_plans (skill_name, duration_days, difficulty, daily_time_minutes, source) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(req.skill_name())
    .bind(to_i32(req.duration_days(), "duration")?)
    .bind(req.difficulty())
    .bind(to_i32(req.daily_time_minutes(), "daily time")?)
    .bind(source)
    .fetch_one(&mut *tx)
    .await
    .context("failed to insert skill plan")?;

    // 2. Insert modules, each followed by its tasks.
    for module in &plan.modules {
        let (module_id,): (Uuid,) = sqlx::query_as(
            "INSERT INTO modules (skill_plan_id, title, week, position, objective) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING id",
        )
        .bind(skill_plan.id)
        .bind(&module.title)
        .bind(to_i32(module.week, "week")?)
        .bind(to_i32(module.order, "module order")?)
        .bind(&module.objective)
        .fetch_one(&mut *tx)
        .await
        .with_context(|| format!("failed to insert module {:?}", module.title))?;

        for (position, task) in module.tasks.iter().enumerate() {
            sqlx::query(
                "INSERT INTO tasks (module_id, title, content_type, content_link, description, position) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
            )
            .bind(module_id)
            .bind(&task.title)
            .bind(&task.content_type)
            .bind(&task.content_link)
            .bind(&task.description)
            .bind(i32::try_from(position).context("too many tasks in one module")?)
            .execute(&mut *tx)
            .await
            .with_context(|| {
                format!(
                    "failed to insert task {:?} of module {:?}",
                    task.title, module.title
                )
            })?;
        }
    }

    tx.commit().await.context("failed to commit transaction")?;

    info!(
        plan_id = %skill_plan.id,
        skill = %skill_plan.skill_name,
        modules = plan.modules.len(),
        tasks = plan.task_count(),
        source = %source,
        "skill plan stored"
    );
    Ok(skill_plan)
}

/// Fetch modules and tasks for `plan` and nest them.
async fn load_nested(pool: &PgPool, plan: SkillPlan) -> Result<StoredPlan> {
    let modules = module_queries::list_modules_for_plan(pool, plan.id).await?;
    let tasks = task_queries::list_tasks_for_plan(pool, plan.id).await?;

    let mut by_module: HashMap<Uuid, Vec<PlanTask>> = HashMap::new();
    for task in tasks {
        by_module.entry(task.module_id).or_default().push(task);
    }

    let modules = modules
        .into_iter()
        .map(|module| {
            let tasks = by_module.remove(&module.id).unwrap_or_default();
            StoredModule { module, tasks }
        })
        .collect();

    Ok(StoredPlan { plan, modules })
}

/// Fetch one plan with its modules and tasks. `None` if it does not exist.
pub async fn get_plan_with_modules(pool: &PgPool, plan_id: Uuid) -> Result<Option<StoredPlan>> {
    match plan_queries::get_skill_plan(pool, plan_id).await? {
        Some(plan) => Ok(Some(load_nested(pool, plan).await?)),
        None => Ok(None),
    }
}

/// All active plans, newest first, with modules and tasks.
pub async fn list_active_plans(pool: &PgPool) -> Result<Vec<StoredPlan>> {
    let plans = plan_queries::list_skill_plans(pool, PlanStatus::Active).await?;
    let mut stored = Vec::with_capacity(plans.len());
    for plan in plans {
        stored.push(load_nested(pool, plan).await?);
    }
    Ok(stored)
}
