use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Requested difficulty of a skill plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Beginner,
    Intermediate,
    Expert,
}

impl Difficulty {
    /// All difficulties, easiest first.
    pub const ALL: [Difficulty; 3] = [Self::Beginner, Self::Intermediate, Self::Expert];

    /// Capitalized label as shown to learners and sent to the generator.
    pub fn label(self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Expert => "Expert",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Expert => "expert",
        };
        f.pad(s)
    }
}

impl FromStr for Difficulty {
    type Err = DifficultyParseError;

    /// Case-insensitive: the web form submits `Beginner`, the database
    /// stores `beginner`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "expert" => Ok(Self::Expert),
            _ => Err(DifficultyParseError(s.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`Difficulty`] string.
#[derive(Debug, Clone)]
pub struct DifficultyParseError(pub String);

impl fmt::Display for DifficultyParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid difficulty: {:?}", self.0)
    }
}

impl std::error::Error for DifficultyParseError {}

// ---------------------------------------------------------------------------

/// Lifecycle status of a skill plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Active,
    Archived,
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Active => "active",
            Self::Archived => "archived",
        };
        f.pad(s)
    }
}

impl FromStr for PlanStatus {
    type Err = PlanStatusParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            other => Err(PlanStatusParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanStatus`] string.
#[derive(Debug, Clone)]
pub struct PlanStatusParseError(pub String);

impl fmt::Display for PlanStatusParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan status: {:?}", self.0)
    }
}

impl std::error::Error for PlanStatusParseError {}

// ---------------------------------------------------------------------------

/// Which path of the generation pipeline produced a plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PlanSource {
    /// Produced by the external text generator and accepted by validation.
    Generated,
    /// Synthesized deterministically after the generator failed or its
    /// output was rejected.
    Fallback,
}

impl fmt::Display for PlanSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Generated => "generated",
            Self::Fallback => "fallback",
        };
        f.pad(s)
    }
}

impl FromStr for PlanSource {
    type Err = PlanSourceParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "generated" => Ok(Self::Generated),
            "fallback" => Ok(Self::Fallback),
            other => Err(PlanSourceParseError(other.to_owned())),
        }
    }
}

/// Error returned when parsing an invalid [`PlanSource`] string.
#[derive(Debug, Clone)]
pub struct PlanSourceParseError(pub String);

impl fmt::Display for PlanSourceParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid plan source: {:?}", self.0)
    }
}

impl std::error::Error for PlanSourceParseError {}

// ---------------------------------------------------------------------------
// Row structs
// ---------------------------------------------------------------------------

/// A stored skill plan -- the top-level learning roadmap.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct SkillPlan {
    pub id: Uuid,
    pub skill_name: String,
    pub duration_days: i32,
    pub difficulty: Difficulty,
    pub daily_time_minutes: i32,
    pub status: PlanStatus,
    pub source: PlanSource,
    pub created_at: DateTime<Utc>,
}

/// A module within a skill plan.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanModule {
    pub id: Uuid,
    pub skill_plan_id: Uuid,
    pub title: String,
    pub week: i32,
    /// Global zero-based order of the module within its plan.
    pub position: i32,
    pub objective: String,
}

/// A task within a module.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct PlanTask {
    pub id: Uuid,
    pub module_id: Uuid,
    pub title: String,
    pub content_type: String,
    pub content_link: Option<String>,
    pub description: String,
    pub completed: bool,
    /// Zero-based order of the task within its module.
    pub position: i32,
}
