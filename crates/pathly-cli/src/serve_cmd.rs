use std::net::SocketAddr;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::get;
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use chrono::{DateTime, Utc};
use pathly_core::plan::{StoredModule, StoredPlan, get_plan_with_modules, list_active_plans, save_learning_plan};
use pathly_core::progress::{ProgressSummary, load_progress};
use pathly_core::roadmap::{GenerationRequest, PlanPipeline, parse_difficulty};
use pathly_db::models::{Difficulty, PlanSource, PlanStatus, PlanTask};
use pathly_db::queries::skill_plans as plan_db;

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: msg.into(),
        }
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: msg.into(),
        }
    }

    pub fn internal(err: anyhow::Error) -> Self {
        tracing::error!(error = %format!("{err:#}"), "request failed");
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: format!("{err:#}"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "error": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

/// Body of `POST /api/skill-plans`. Fields are optional so that a missing
/// field is reported as a 400 with a JSON error instead of a rejection.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub skill_name: Option<String>,
    /// Days, as a number or a numeric string (web forms send strings).
    pub duration: Option<serde_json::Value>,
    pub difficulty: Option<String>,
    pub daily_time_minutes: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskResponse {
    pub id: Uuid,
    pub title: String,
    pub content_type: String,
    pub content_link: Option<String>,
    pub description: String,
    pub completed: bool,
}

impl From<PlanTask> for TaskResponse {
    fn from(t: PlanTask) -> Self {
        Self {
            id: t.id,
            title: t.title,
            content_type: t.content_type,
            content_link: t.content_link,
            description: t.description,
            completed: t.completed,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModuleResponse {
    pub id: Uuid,
    pub title: String,
    pub week: i32,
    pub order: i32,
    pub objective: String,
    pub tasks: Vec<TaskResponse>,
}

impl From<StoredModule> for ModuleResponse {
    fn from(m: StoredModule) -> Self {
        Self {
            id: m.module.id,
            title: m.module.title,
            week: m.module.week,
            order: m.module.position,
            objective: m.module.objective,
            tasks: m.tasks.into_iter().map(TaskResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub id: Uuid,
    pub skill_name: String,
    pub duration_days: i32,
    pub difficulty: Difficulty,
    pub daily_time_minutes: i32,
    pub status: PlanStatus,
    pub source: PlanSource,
    pub created_at: DateTime<Utc>,
    pub modules: Vec<ModuleResponse>,
}

impl From<StoredPlan> for PlanResponse {
    fn from(s: StoredPlan) -> Self {
        let p = s.plan;
        Self {
            id: p.id,
            skill_name: p.skill_name,
            duration_days: p.duration_days,
            difficulty: p.difficulty,
            daily_time_minutes: p.daily_time_minutes,
            status: p.status,
            source: p.source,
            created_at: p.created_at,
            modules: s.modules.into_iter().map(ModuleResponse::from).collect(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanResponse {
    pub skill_plan: PlanResponse,
    pub source: PlanSource,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub pipeline: PlanPipeline,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/api/skill-plans", get(list_plans).post(create_plan))
        .route("/api/skill-plans/{id}", get(get_plan).delete(delete_plan))
        .route("/api/progress", get(progress))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(state: AppState, bind: &str, port: u16) -> Result<()> {
    let offline = state.pipeline.is_offline();
    let app = build_router(state);
    let addr: SocketAddr = format!("{bind}:{port}").parse()?;
    tracing::info!(offline, "pathly serve listening on http://{addr}");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("pathly serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl+C");
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

fn parse_duration(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Validate the body into a [`GenerationRequest`].
fn request_from_body(body: &CreatePlanRequest) -> Result<GenerationRequest, AppError> {
    let (Some(skill), Some(duration), Some(difficulty)) =
        (&body.skill_name, &body.duration, &body.difficulty)
    else {
        return Err(AppError::bad_request("Missing required fields"));
    };
    let duration = parse_duration(duration)
        .ok_or_else(|| AppError::bad_request("duration must be a whole number of days"))?;
    let difficulty = parse_difficulty(difficulty).map_err(|e| AppError::bad_request(e.to_string()))?;

    let result = match body.daily_time_minutes {
        Some(minutes) => GenerationRequest::with_daily_time(skill, duration, difficulty, minutes),
        None => GenerationRequest::new(skill, duration, difficulty),
    };
    result.map_err(|e| AppError::bad_request(e.to_string()))
}

async fn create_plan(
    State(state): State<AppState>,
    body: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Result<axum::response::Response, AppError> {
    let Json(body) = body.map_err(|e| AppError::bad_request(e.body_text()))?;
    let req = request_from_body(&body)?;

    let outcome = state.pipeline.generate(&req).await;
    let saved = save_learning_plan(&state.pool, &req, &outcome.plan, outcome.source)
        .await
        .map_err(AppError::internal)?;

    let stored = get_plan_with_modules(&state.pool, saved.id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {} not found", saved.id)))?;

    let response = CreatePlanResponse {
        skill_plan: stored.into(),
        source: outcome.source,
    };
    Ok((StatusCode::CREATED, Json(response)).into_response())
}

async fn list_plans(State(state): State<AppState>) -> Result<axum::response::Response, AppError> {
    let plans = list_active_plans(&state.pool)
        .await
        .map_err(AppError::internal)?;
    let results: Vec<PlanResponse> = plans.into_iter().map(PlanResponse::from).collect();
    Ok(Json(results).into_response())
}

async fn get_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let stored = get_plan_with_modules(&state.pool, id)
        .await
        .map_err(AppError::internal)?
        .ok_or_else(|| AppError::not_found(format!("plan {id} not found")))?;
    Ok(Json(PlanResponse::from(stored)).into_response())
}

async fn delete_plan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<axum::response::Response, AppError> {
    let deleted = plan_db::delete_skill_plan(&state.pool, id)
        .await
        .map_err(AppError::internal)?;
    if !deleted {
        return Err(AppError::not_found(format!("plan {id} not found")));
    }
    Ok(Json(serde_json::json!({ "success": true })).into_response())
}

async fn progress(State(state): State<AppState>) -> Result<Json<ProgressSummary>, AppError> {
    let summary = load_progress(&state.pool)
        .await
        .map_err(AppError::internal)?;
    Ok(Json(summary))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use sqlx::PgPool;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use pathly_core::roadmap::PlanPipeline;
    use pathly_test_utils::{create_test_db, drop_test_db};

    use super::AppState;

    // -----------------------------------------------------------------------
    // HTTP helpers
    // -----------------------------------------------------------------------

    fn state(pool: PgPool) -> AppState {
        AppState {
            pool,
            pipeline: PlanPipeline::offline(),
        }
    }

    /// A pool that never connects; enough for requests rejected before any query.
    fn unreachable_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgresql://localhost:1/never")
            .unwrap()
    }

    async fn send(pool: PgPool, method: &str, uri: &str, body: Option<&str>) -> axum::response::Response {
        let app = super::build_router(state(pool));
        let mut builder = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                builder = builder.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        app.oneshot(builder.body(body).unwrap()).await.unwrap()
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), 1_048_576)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    // -----------------------------------------------------------------------
    // Validation (no database)
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_rejects_missing_fields() {
        let resp = send(
            unreachable_pool(),
            "POST",
            "/api/skill-plans",
            Some(r#"{"skillName": "Guitar"}"#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let json = body_json(resp).await;
        assert_eq!(json["error"], "Missing required fields");
    }

    #[tokio::test]
    async fn create_rejects_bad_values() {
        for body in [
            r#"{"skillName": "Guitar", "duration": 30, "difficulty": "Wizard"}"#,
            r#"{"skillName": "Guitar", "duration": 0, "difficulty": "Beginner"}"#,
            r#"{"skillName": "Guitar", "duration": "soon", "difficulty": "Beginner"}"#,
            r#"{"skillName": "  ", "duration": 30, "difficulty": "Beginner"}"#,
        ] {
            let resp = send(unreachable_pool(), "POST", "/api/skill-plans", Some(body)).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
            let json = body_json(resp).await;
            assert!(json["error"].is_string());
        }
    }

    #[tokio::test]
    async fn create_rejects_oversized_duration() {
        for duration in ["366", "2000000000", "\"4000000000\""] {
            let body = format!(
                r#"{{"skillName": "Guitar", "duration": {duration}, "difficulty": "Beginner"}}"#
            );
            let resp = send(unreachable_pool(), "POST", "/api/skill-plans", Some(&body)).await;
            assert_eq!(resp.status(), StatusCode::BAD_REQUEST, "body: {body}");
            let json = body_json(resp).await;
            assert!(
                json["error"].as_str().unwrap().contains("at most 365 days"),
                "body: {body}"
            );
        }
    }

    #[tokio::test]
    async fn create_rejects_malformed_json() {
        let resp = send(unreachable_pool(), "POST", "/api/skill-plans", Some("{not json")).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        assert!(body_json(resp).await["error"].is_string());
    }

    #[test]
    fn duration_accepts_numeric_strings() {
        assert_eq!(super::parse_duration(&serde_json::json!(30)), Some(30));
        assert_eq!(super::parse_duration(&serde_json::json!(" 14 ")), Some(14));
        assert_eq!(super::parse_duration(&serde_json::json!(2.5)), None);
        assert_eq!(super::parse_duration(&serde_json::json!(null)), None);
    }

    // -----------------------------------------------------------------------
    // Database-backed
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn create_list_and_delete_plan() {
        let (pool, db_name) = create_test_db().await;

        let resp = send(
            pool.clone(),
            "POST",
            "/api/skill-plans",
            Some(r#"{"skillName": "Guitar", "duration": "30", "difficulty": "Beginner"}"#),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let created = body_json(resp).await;
        assert_eq!(created["source"], "fallback");
        let plan = &created["skillPlan"];
        assert_eq!(plan["skillName"], "Guitar");
        assert_eq!(plan["durationDays"], 30);
        assert_eq!(plan["difficulty"], "beginner");
        assert_eq!(plan["modules"].as_array().unwrap().len(), 12);
        assert_eq!(plan["modules"][0]["order"], 0);
        assert_eq!(plan["modules"][0]["tasks"][0]["contentType"], "reading");
        assert_eq!(plan["modules"][0]["tasks"][0]["completed"], false);
        let id = plan["id"].as_str().unwrap().to_string();

        let resp = send(pool.clone(), "GET", "/api/skill-plans", None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let list = body_json(resp).await;
        assert_eq!(list.as_array().unwrap().len(), 1);
        assert_eq!(list[0]["id"], id.as_str());

        let resp = send(pool.clone(), "GET", &format!("/api/skill-plans/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let resp = send(pool.clone(), "DELETE", &format!("/api/skill-plans/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::OK);
        assert_eq!(body_json(resp).await, serde_json::json!({ "success": true }));

        let resp = send(pool.clone(), "DELETE", &format!("/api/skill-plans/{id}"), None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = send(pool.clone(), "GET", "/api/skill-plans", None).await;
        assert_eq!(body_json(resp).await, serde_json::json!([]));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn get_missing_plan_is_404() {
        let (pool, db_name) = create_test_db().await;

        let uri = format!("/api/skill-plans/{}", uuid::Uuid::new_v4());
        let resp = send(pool.clone(), "GET", &uri, None).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
        assert!(body_json(resp).await["error"].as_str().unwrap().contains("not found"));

        pool.close().await;
        drop_test_db(&db_name).await;
    }

    #[tokio::test]
    async fn progress_reports_totals() {
        let (pool, db_name) = create_test_db().await;

        let resp = send(pool.clone(), "GET", "/api/progress", None).await;
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "totalTasks": 0, "completedTasks": 0, "progress": 0 })
        );

        send(
            pool.clone(),
            "POST",
            "/api/skill-plans",
            Some(r#"{"skillName": "Chess", "duration": 7, "difficulty": "Expert"}"#),
        )
        .await;
        sqlx::query("UPDATE tasks SET completed = true WHERE position < 2")
            .execute(&pool)
            .await
            .unwrap();

        let resp = send(pool.clone(), "GET", "/api/progress", None).await;
        assert_eq!(
            body_json(resp).await,
            serde_json::json!({ "totalTasks": 3, "completedTasks": 2, "progress": 67 })
        );

        pool.close().await;
        drop_test_db(&db_name).await;
    }
}
