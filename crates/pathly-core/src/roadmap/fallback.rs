//! Deterministic roadmap synthesis used when generation fails.
//!
//! The output depends only on the inputs: the same skill, duration and
//! difficulty always give the same tree.

use pathly_db::models::Difficulty;

use super::request::{DEFAULT_DAILY_TIME_MINUTES, week_count};
use super::tree::{ContentType, DifficultyTag, LearningType, ModuleNode, RoadmapTree, TaskNode, WeekNode};

/// Upper bound on modules per fallback week.
pub const MAX_MODULES_PER_WEEK: u32 = 3;

/// Label and learning type for the module at each position within a week.
const SLOTS: [(&str, LearningType); 3] = [
    ("Fundamentals", LearningType::Theory),
    ("Practice", LearningType::Practice),
    ("Project", LearningType::Project),
];

fn difficulty_tag(difficulty: Difficulty) -> DifficultyTag {
    match difficulty {
        Difficulty::Beginner => DifficultyTag::Beginner,
        Difficulty::Intermediate => DifficultyTag::Intermediate,
        Difficulty::Expert => DifficultyTag::Expert,
    }
}

fn fallback_tasks(skill: &str) -> Vec<TaskNode> {
    vec![
        TaskNode {
            title: format!("Introduction to {skill}"),
            content_type: ContentType::Reading,
            description: format!("Learn the basics of {skill}"),
            content_link: None,
        },
        TaskNode {
            title: format!("Practice {skill}"),
            content_type: ContentType::Exercise,
            description: "Apply what you learned".to_string(),
            content_link: None,
        },
        TaskNode {
            title: format!("Build with {skill}"),
            content_type: ContentType::Project,
            description: "Create a mini project".to_string(),
            content_link: None,
        },
    ]
}

/// Build a roadmap from the request fields alone.
///
/// Week `w` of `n` holds `min(3, n - w + 1)` modules, so the plan tapers
/// off in its last two weeks. Every module carries three tasks. Difficulty
/// only sets `difficulty_tag`; the structure is the same for every level.
pub fn synthesize_fallback(skill: &str, duration_days: u32, difficulty: Difficulty) -> RoadmapTree {
    let weeks = week_count(duration_days);
    let tag = difficulty_tag(difficulty);

    let weeks = (1..=weeks)
        .map(|w| {
            let week_modules = MAX_MODULES_PER_WEEK.min(weeks - w + 1);
            let modules = SLOTS
                .iter()
                .zip(0..week_modules)
                .map(|(&(label, learning_type), i)| ModuleNode {
                    id: format!("W{w}-M{}", i + 1),
                    title: format!("Week {w}: {skill} {label}"),
                    objective: format!("Master {skill} {} concepts", label.to_lowercase()),
                    learning_type,
                    difficulty_tag: tag,
                    estimated_minutes: DEFAULT_DAILY_TIME_MINUTES,
                    sequence_order: (w - 1) * week_modules + i + 1,
                    tasks: fallback_tasks(skill),
                })
                .collect();
            WeekNode {
                week_number: w,
                focus: format!("{skill} week {w}"),
                modules,
            }
        })
        .collect();

    RoadmapTree {
        skill: skill.to_string(),
        difficulty: difficulty.label().to_string(),
        duration_days,
        weeks,
    }
}
