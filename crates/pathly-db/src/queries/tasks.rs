//! Database query functions for the `tasks` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PlanTask;

/// Completed and total task counts across a set of tasks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskCounts {
    pub total: i64,
    pub completed: i64,
}

/// List every task of a plan, ordered by module position then task position.
pub async fn list_tasks_for_plan(pool: &PgPool, skill_plan_id: Uuid) -> Result<Vec<PlanTask>> {
    sqlx::query_as::<_, PlanTask>(
        "SELECT t.* FROM tasks t \
         JOIN modules m ON m.id = t.module_id \
         WHERE m.skill_plan_id = $1 \
         ORDER BY m.position, t.position",
    )
    .bind(skill_plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list tasks for plan")
}

/// Count tasks belonging to active plans.
pub async fn count_active_tasks(pool: &PgPool) -> Result<TaskCounts> {
    let (total, completed): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COUNT(*) FILTER (WHERE t.completed) \
         FROM tasks t \
         JOIN modules m ON m.id = t.module_id \
         JOIN skill_plans p ON p.id = m.skill_plan_id \
         WHERE p.status = 'active'",
    )
    .fetch_one(pool)
    .await
    .context("failed to count active tasks")?;

    Ok(TaskCounts { total, completed })
}

