//! CLI handlers for `pathly plan` subcommands.
//!
//! Implements:
//! - `pathly plan generate ...`       -- run the generation pipeline
//! - `pathly plan show [plan-id]`     -- show one stored plan or list all
//! - `pathly plan archive <plan-id>`  -- hide a plan from listings and progress
//! - `pathly plan delete <plan-id>`   -- remove a plan with its modules and tasks

use anyhow::{Context, Result, bail};
use sqlx::PgPool;
use tracing::warn;
use uuid::Uuid;

use pathly_core::plan::{PlanFile, StoredPlan, get_plan_with_modules, list_active_plans, save_learning_plan};
use pathly_core::roadmap::{
    DEFAULT_DAILY_TIME_MINUTES, GenerationRequest, LearningPlan, PlanOutcome, parse_difficulty,
};
use pathly_db::models::PlanStatus;
use pathly_db::pool;
use pathly_db::queries::skill_plans as plan_queries;

use crate::config::PathlyConfig;
use crate::{GenerateArgs, PlanCommands};

// -----------------------------------------------------------------------
// Public entry point
// -----------------------------------------------------------------------

/// Dispatch a `PlanCommands` variant to the appropriate handler.
///
/// Only commands that touch stored plans open a database pool.
pub async fn run_plan_command(command: PlanCommands, config: &PathlyConfig) -> Result<()> {
    match command {
        PlanCommands::Generate(args) => cmd_generate(config, &args).await,
        PlanCommands::Show { plan_id, output } => {
            let db_pool = pool::create_pool(&config.db_config).await?;
            let result = match plan_id {
                Some(id) => cmd_show_one(&db_pool, &id, output.as_deref()).await,
                None => cmd_show_all(&db_pool).await,
            };
            db_pool.close().await;
            result
        }
        PlanCommands::Archive { plan_id } => {
            let db_pool = pool::create_pool(&config.db_config).await?;
            let result = cmd_archive(&db_pool, &plan_id).await;
            db_pool.close().await;
            result
        }
        PlanCommands::Delete { plan_id } => {
            let db_pool = pool::create_pool(&config.db_config).await?;
            let result = cmd_delete(&db_pool, &plan_id).await;
            db_pool.close().await;
            result
        }
    }
}

fn parse_plan_id(plan_id_str: &str) -> Result<Uuid> {
    plan_id_str
        .parse()
        .with_context(|| format!("invalid plan ID: {plan_id_str:?}"))
}

fn write_toml(path: &str, file: &PlanFile) -> Result<()> {
    let content = file.to_toml_string().context("failed to serialize plan")?;
    std::fs::write(path, content).with_context(|| format!("failed to write to {path}"))?;
    println!("Plan written to {path}");
    Ok(())
}

// -----------------------------------------------------------------------
// pathly plan generate
// -----------------------------------------------------------------------

fn build_request(args: &GenerateArgs) -> Result<GenerationRequest> {
    let difficulty = parse_difficulty(&args.difficulty)?;
    let daily = args
        .daily_minutes
        .unwrap_or(i64::from(DEFAULT_DAILY_TIME_MINUTES));
    Ok(GenerationRequest::with_daily_time(
        &args.skill,
        args.duration,
        difficulty,
        daily,
    )?)
}

async fn cmd_generate(config: &PathlyConfig, args: &GenerateArgs) -> Result<()> {
    let req = build_request(args)?;

    let pipeline = config.pipeline(args.offline)?;
    if pipeline.is_offline() && !args.offline {
        warn!("no API key configured; generating the offline plan");
    }

    let outcome = pipeline.generate(&req).await;
    print!("{}", render_outcome(&req, &outcome));

    let mut file = PlanFile::new(&req, &outcome.plan, outcome.source);

    if args.save {
        let db_pool = pool::create_pool(&config.db_config).await?;
        let saved = save_learning_plan(&db_pool, &req, &outcome.plan, outcome.source).await;
        db_pool.close().await;
        let saved = saved?;
        println!();
        println!("Plan saved.");
        println!("  Plan ID: {}", saved.id);
        file = file.with_id(saved.id);
    }

    if let Some(path) = &args.output {
        write_toml(path, &file)?;
    }

    Ok(())
}

/// Header, fallback notice, and week-by-week listing for a fresh plan.
fn render_outcome(req: &GenerationRequest, outcome: &PlanOutcome) -> String {
    let mut out = format!(
        "Learning plan: {} ({}, {} days, {} min/day)\n",
        req.skill_name(),
        req.difficulty().label(),
        req.duration_days(),
        req.daily_time_minutes()
    );
    out.push_str(&format!("  Source: {}\n", outcome.source));
    if let Some(reason) = &outcome.fallback_reason {
        out.push_str(&format!("  Reason: {reason}\n"));
    }
    if !outcome.violations.is_empty() {
        out.push_str("  Issues in generated roadmap:\n");
        for v in &outcome.violations {
            out.push_str(&format!("    - {v}\n"));
        }
    }
    out.push('\n');
    out.push_str(&render_plan(&outcome.plan));
    out
}

/// Week-by-week listing of modules and their tasks.
fn render_plan(plan: &LearningPlan) -> String {
    let mut out = String::new();
    let mut current_week = None;
    for module in &plan.modules {
        if current_week != Some(module.week) {
            if current_week.is_some() {
                out.push('\n');
            }
            out.push_str(&format!("Week {}\n", module.week));
            current_week = Some(module.week);
        }
        out.push_str(&format!("  {:>2}. {}\n", module.order + 1, module.title));
        if !module.objective.is_empty() {
            out.push_str(&format!("      {}\n", module.objective));
        }
        for task in &module.tasks {
            out.push_str(&format!("      - [{}] {}", task.content_type, task.title));
            if let Some(link) = &task.content_link {
                out.push_str(&format!(" <{link}>"));
            }
            out.push('\n');
        }
    }
    out.push_str(&format!(
        "\n{} modules, {} tasks\n",
        plan.modules.len(),
        plan.task_count()
    ));
    out
}

// -----------------------------------------------------------------------
// pathly plan show (list all)
// -----------------------------------------------------------------------

async fn cmd_show_all(pool: &PgPool) -> Result<()> {
    let plans = list_active_plans(pool).await?;

    if plans.is_empty() {
        println!("No plans found. Use `pathly plan generate --save` to create one.");
        return Ok(());
    }

    print!("{}", render_plan_table(&plans));
    Ok(())
}

fn render_plan_table(plans: &[StoredPlan]) -> String {
    // ID is always 36 chars (UUID); difficulty max is 12 (intermediate).
    let id_w = 36;
    let skill_w = plans
        .iter()
        .map(|p| p.plan.skill_name.len())
        .max()
        .unwrap_or(5)
        .max(5);
    let diff_w = 12;
    let days_w = 4;
    let tasks_w = 9;

    let mut out = format!(
        "{:<id_w$}  {:<skill_w$}  {:<diff_w$}  {:>days_w$}  {:>tasks_w$}  {:<9}  CREATED\n",
        "ID", "SKILL", "DIFFICULTY", "DAYS", "DONE", "SOURCE",
    );
    for stored in plans {
        let plan = &stored.plan;
        let done = format!("{}/{}", stored.completed_count(), stored.task_count());
        out.push_str(&format!(
            "{:<id_w$}  {:<skill_w$}  {:<diff_w$}  {:>days_w$}  {:>tasks_w$}  {:<9}  {}\n",
            plan.id,
            plan.skill_name,
            plan.difficulty,
            plan.duration_days,
            done,
            plan.source,
            plan.created_at.format("%Y-%m-%d %H:%M"),
        ));
    }
    out
}

// -----------------------------------------------------------------------
// pathly plan show <plan-id> [--output <file>]
// -----------------------------------------------------------------------

async fn cmd_show_one(pool: &PgPool, plan_id_str: &str, output: Option<&str>) -> Result<()> {
    let plan_id = parse_plan_id(plan_id_str)?;

    let stored = get_plan_with_modules(pool, plan_id)
        .await?
        .with_context(|| format!("plan {plan_id} not found"))?;
    let plan = &stored.plan;

    println!("Plan: {}", plan.skill_name);
    println!("  ID:           {}", plan.id);
    println!("  Status:       {}", plan.status);
    println!("  Difficulty:   {}", plan.difficulty.label());
    println!("  Duration:     {} days", plan.duration_days);
    println!("  Daily time:   {} min", plan.daily_time_minutes);
    println!("  Source:       {}", plan.source);
    println!(
        "  Created:      {}",
        plan.created_at.format("%Y-%m-%d %H:%M:%S UTC")
    );
    println!(
        "  Progress:     {}/{} tasks",
        stored.completed_count(),
        stored.task_count()
    );
    println!();

    let learning_plan = stored.to_learning_plan();
    print!("{}", render_plan(&learning_plan));

    if let Some(path) = output {
        let req = GenerationRequest::with_daily_time(
            &plan.skill_name,
            i64::from(plan.duration_days),
            plan.difficulty,
            i64::from(plan.daily_time_minutes),
        )
        .context("stored plan has invalid request fields")?;
        let file = PlanFile::new(&req, &learning_plan, plan.source).with_id(plan.id);
        write_toml(path, &file)?;
    }

    Ok(())
}

// -----------------------------------------------------------------------
// pathly plan archive <plan-id>
// -----------------------------------------------------------------------

async fn cmd_archive(pool: &PgPool, plan_id_str: &str) -> Result<()> {
    let plan_id = parse_plan_id(plan_id_str)?;
    plan_queries::update_skill_plan_status(pool, plan_id, PlanStatus::Archived).await?;
    println!("Plan {plan_id} archived.");
    Ok(())
}

// -----------------------------------------------------------------------
// pathly plan delete <plan-id>
// -----------------------------------------------------------------------

async fn cmd_delete(pool: &PgPool, plan_id_str: &str) -> Result<()> {
    let plan_id = parse_plan_id(plan_id_str)?;
    if !plan_queries::delete_skill_plan(pool, plan_id).await? {
        bail!("plan {plan_id} not found");
    }
    println!("Plan {plan_id} deleted.");
    Ok(())
}

// -----------------------------------------------------------------------
// Tests
// -----------------------------------------------------------------------
