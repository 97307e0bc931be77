//! `pathly progress` command: completion summary across active plans.

use anyhow::Result;
use sqlx::PgPool;

use pathly_core::progress::{ProgressSummary, load_progress};

/// Run the progress command.
pub async fn run_progress(pool: &PgPool) -> Result<()> {
    let summary = load_progress(pool).await?;
    print!("{}", render_progress(&summary));
    Ok(())
}

const BAR_WIDTH: usize = 20;

fn render_progress(summary: &ProgressSummary) -> String {
    if summary.total_tasks == 0 {
        return "No tasks yet. Use `pathly plan generate --save` to create a plan.\n".to_string();
    }
    let filled = (summary.progress.clamp(0, 100) as usize * BAR_WIDTH) / 100;
    format!(
        "Progress: [{}{}] {}%\n  Completed: {}/{} tasks\n",
        "#".repeat(filled),
        "-".repeat(BAR_WIDTH - filled),
        summary.progress,
        summary.completed_tasks,
        summary.total_tasks,
    )
}

#[cfg(test)]
mod tests {
    use pathly_db::queries::tasks::TaskCounts;

    use super::*;

    #[test]
    fn empty_progress_suggests_generating() {
        let text = render_progress(&ProgressSummary::from_counts(TaskCounts {
            total: 0,
            completed: 0,
        }));
        assert!(text.starts_with("No tasks yet."));
    }

    #[test]
    fn bar_reflects_percentage() {
        let text = render_progress(&ProgressSummary::from_counts(TaskCounts {
            total: 4,
            completed: 1,
        }));
        assert_eq!(
            text,
            "Progress: [#####---------------] 25%\n  Completed: 1/4 tasks\n"
        );
    }
}
