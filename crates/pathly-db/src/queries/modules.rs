//! Database query functions for the `modules` table.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::PlanModule;

/// List the modules of a plan in their global order.
pub async fn list_modules_for_plan(pool: &PgPool, skill_plan_id: Uuid) -> Result<Vec<PlanModule>> {
    sqlx::query_as::<_, PlanModule>(
        "SELECT * FROM modules WHERE skill_plan_id = $1 ORDER BY position",
    )
    .bind(skill_plan_id)
    .fetch_all(pool)
    .await
    .context("failed to list modules for plan")
}

