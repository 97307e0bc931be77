//! Completion progress across active plans.

use anyhow::Result;
use serde::Serialize;
use sqlx::PgPool;

use pathly_db::queries::tasks::{self as task_queries, TaskCounts};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    pub total_tasks: i64,
    pub completed_tasks: i64,
    /// Whole percent, 0 when there are no tasks.
    pub progress: i64,
}

impl ProgressSummary {
    pub fn from_counts(counts: TaskCounts) -> Self {
        let progress = if counts.total > 0 {
            (counts.completed as f64 / counts.total as f64 * 100.0).round() as i64
        } else {
            0
        };
        Self {
            total_tasks: counts.total,
            completed_tasks: counts.completed,
            progress,
        }
    }
}

/// Progress over every task of every active plan.
pub async fn load_progress(pool: &PgPool) -> Result<ProgressSummary> {
    let counts = task_queries::count_active_tasks(pool).await?;
    Ok(ProgressSummary::from_counts(counts))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(total: i64, completed: i64) -> ProgressSummary {
        ProgressSummary::from_counts(TaskCounts { total, completed })
    }

    #[test]
    fn no_tasks_is_zero_percent() {
        assert_eq!(summary(0, 0).progress, 0);
    }

    #[test]
    fn rounds_to_nearest_percent() {
        assert_eq!(summary(3, 1).progress, 33);
        assert_eq!(summary(3, 2).progress, 67);
        assert_eq!(summary(8, 1).progress, 13);
        assert_eq!(summary(4, 4).progress, 100);
    }

    #[test]
    fn serializes_camel_case() {
        let json = serde_json::to_value(summary(10, 5)).unwrap();
        assert_eq!(json["totalTasks"], 10);
        assert_eq!(json["completedTasks"], 5);
        assert_eq!(json["progress"], 50);
    }
}
