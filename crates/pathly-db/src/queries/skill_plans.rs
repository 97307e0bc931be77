//! Database query functions for the `skill_plans` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::{Difficulty, PlanSource, PlanStatus, SkillPlan};

/// Column values for a new `skill_plans` row.
#[derive(Debug, Clone)]
pub struct NewSkillPlan<'a> {
    pub skill_name: &'a str,
    pub duration_days: i32,
    pub difficulty: Difficulty,
    pub daily_time_minutes: i32,
    pub source: PlanSource,
}

/// Insert a new skill plan. Returns the row with server-generated defaults
/// (id, status, created_at).
pub async fn insert_skill_plan(pool: &PgPool, new: &NewSkillPlan<'_>) -> Result<SkillPlan> {
    sqlx::query_as::<_, SkillPlan>(
        "INSERT INTO skill_plans (skill_name, duration_days, difficulty, daily_time_minutes, source) \
         VALUES ($1, $2, $3, $4, $5) \
         RETURNING *",
    )
    .bind(new.skill_name)
    .bind(new.duration_days)
    .bind(new.difficulty)
    .bind(new.daily_time_minutes)
    .bind(new.source)
    .fetch_one(pool)
    .await
    .context("failed to insert skill plan")
}

/// Fetch a skill plan by its ID.
pub async fn get_skill_plan(pool: &PgPool, id: Uuid) -> Result<Option<SkillPlan>> {
    sqlx::query_as::<_, SkillPlan>("SELECT * FROM skill_plans WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("failed to fetch skill plan")
}

/// List plans with the given status, newest first.
pub async fn list_skill_plans(pool: &PgPool, status: PlanStatus) -> Result<Vec<SkillPlan>> {
    sqlx::query_as::<_, SkillPlan>(
        "SELECT * FROM skill_plans WHERE status = $1 ORDER BY created_at DESC",
    )
    .bind(status)
    .fetch_all(pool)
    .await
    .context("failed to list skill plans")
}

/// Update the status of a plan.
pub async fn update_skill_plan_status(pool: &PgPool, id: Uuid, status: PlanStatus) -> Result<()> {
    let result = sqlx::query("UPDATE skill_plans SET status = $1 WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(pool)
        .await
        .context("failed to update skill plan status")?;

    if result.rows_affected() == 0 {
        anyhow::bail!("skill plan {id} not found");
    }
    Ok(())
}

/// Delete a plan together with its modules and tasks (cascade).
///
/// Returns `false` when no plan with that ID exists.
pub async fn delete_skill_plan(pool: &PgPool, id: Uuid) -> Result<bool> {
    let result = sqlx::query("DELETE FROM skill_plans WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await
        .context("failed to delete skill plan")?;

    Ok(result.rows_affected() > 0)
}
