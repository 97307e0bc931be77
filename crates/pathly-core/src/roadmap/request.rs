//! The validated input of one plan-generation attempt.

use pathly_db::models::Difficulty;
use thiserror::Error;

/// Daily study budget assumed when the caller does not supply one.
pub const DEFAULT_DAILY_TIME_MINUTES: u32 = 60;

/// Longest plan accepted, in days.
pub const MAX_DURATION_DAYS: u32 = 365;

/// Largest daily budget accepted: one full day.
pub const MAX_DAILY_TIME_MINUTES: u32 = 24 * 60;

/// Caller-supplied input that cannot start the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("skill name must not be empty")]
    EmptySkillName,

    #[error("duration must be a positive number of days (got {0})")]
    NonPositiveDuration(i64),

    #[error("duration must be at most {max} days (got {0})", max = MAX_DURATION_DAYS)]
    DurationTooLong(i64),

    #[error("daily time must be a positive number of minutes (got {0})")]
    NonPositiveDailyTime(i64),

    #[error("daily time must be at most {max} minutes (got {0})", max = MAX_DAILY_TIME_MINUTES)]
    DailyTimeTooLong(i64),

    #[error("unrecognized difficulty {0:?} (expected Beginner, Intermediate, or Expert)")]
    UnknownDifficulty(String),
}

/// Parse a difficulty label coming from a form, a CLI flag, or a request body.
pub fn parse_difficulty(value: &str) -> Result<Difficulty, InputError> {
    value
        .parse::<Difficulty>()
        .map_err(|_| InputError::UnknownDifficulty(value.to_string()))
}

/// Immutable request for one roadmap. Only constructible through
/// [`GenerationRequest::new`], so every instance is valid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRequest {
    skill_name: String,
    duration_days: u32,
    difficulty: Difficulty,
    daily_time_minutes: u32,
}

impl GenerationRequest {
    /// Validate and build a request with the default daily budget.
    pub fn new(
        skill_name: &str,
        duration_days: i64,
        difficulty: Difficulty,
    ) -> Result<Self, InputError> {
        Self::with_daily_time(
            skill_name,
            duration_days,
            difficulty,
            i64::from(DEFAULT_DAILY_TIME_MINUTES),
        )
    }

    /// Validate and build a request with an explicit daily budget.
    pub fn with_daily_time(
        skill_name: &str,
        duration_days: i64,
        difficulty: Difficulty,
        daily_time_minutes: i64,
    ) -> Result<Self, InputError> {
        let skill_name = skill_name.trim();
        if skill_name.is_empty() {
            return Err(InputError::EmptySkillName);
        }
        if duration_days <= 0 {
            return Err(InputError::NonPositiveDuration(duration_days));
        }
        let duration = u32::try_from(duration_days)
            .ok()
            .filter(|d| *d <= MAX_DURATION_DAYS)
            .ok_or(InputError::DurationTooLong(duration_days))?;
        if daily_time_minutes <= 0 {
            return Err(InputError::NonPositiveDailyTime(daily_time_minutes));
        }
        let daily = u32::try_from(daily_time_minutes)
            .ok()
            .filter(|m| *m <= MAX_DAILY_TIME_MINUTES)
            .ok_or(InputError::DailyTimeTooLong(daily_time_minutes))?;

        Ok(Self {
            skill_name: skill_name.to_string(),
            duration_days: duration,
            difficulty,
            daily_time_minutes: daily,
        })
    }

    pub fn skill_name(&self) -> &str {
        &self.skill_name
    }

    pub fn duration_days(&self) -> u32 {
        self.duration_days
    }

    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    pub fn daily_time_minutes(&self) -> u32 {
        self.daily_time_minutes
    }

    /// Number of weeks the plan spans: `ceil(duration_days / 7)`.
    pub fn week_count(&self) -> u32 {
        week_count(self.duration_days)
    }
}

/// `ceil(duration_days / 7)`.
pub fn week_count(duration_days: u32) -> u32 {
    duration_days.div_ceil(7)
}

/// Target share of theory, practice, and project content per difficulty.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ContentRatio {
    pub theory: f32,
    pub practice: f32,
    pub project: f32,
}

impl ContentRatio {
    pub fn for_difficulty(difficulty: Difficulty) -> Self {
        match difficulty {
            Difficulty::Beginner => Self {
                theory: 0.7,
                practice: 0.2,
                project: 0.1,
            },
            Difficulty::Intermediate => Self {
                theory: 0.3,
                practice: 0.5,
                project: 0.2,
            },
            Difficulty::Expert => Self {
                theory: 0.1,
                practice: 0.4,
                project: 0.5,
            },
        }
    }

    /// Percentages rounded to whole numbers, in theory/practice/project order.
    pub fn percentages(&self) -> (u32, u32, u32) {
        let pct = |v: f32| (v * 100.0).round() as u32;
        (pct(self.theory), pct(self.practice), pct(self.project))
    }
}
