//! TOML export format for learning plans.
//!
//! `pathly plan generate --output` and `pathly plan show --output` write a
//! [`PlanFile`]; the same file can be read back with [`parse_plan_file`].

use pathly_db::models::{Difficulty, PlanSource};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roadmap::{GenerationRequest, LearningPlan, Module};

/// Top-level structure of an exported plan file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanFile {
    pub plan: PlanMeta,
    #[serde(default)]
    pub modules: Vec<Module>,
}

/// Plan-level metadata in `[plan]`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PlanMeta {
    /// Set once the plan has been stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub skill: String,
    pub duration_days: u32,
    pub difficulty: Difficulty,
    pub daily_time_minutes: u32,
    pub source: PlanSource,
}

impl PlanFile {
    pub fn new(req: &GenerationRequest, plan: &LearningPlan, source: PlanSource) -> Self {
        Self {
            plan: PlanMeta {
                id: None,
                skill: req.skill_name().to_string(),
                duration_days: req.duration_days(),
                difficulty: req.difficulty(),
                daily_time_minutes: req.daily_time_minutes(),
                source,
            },
            modules: plan.modules.clone(),
        }
    }

    pub fn with_id(mut self, id: Uuid) -> Self {
        self.plan.id = Some(id);
        self
    }

    pub fn learning_plan(&self) -> LearningPlan {
        LearningPlan {
            modules: self.modules.clone(),
        }
    }

    pub fn to_toml_string(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}

pub fn parse_plan_file(content: &str) -> Result<PlanFile, toml::de::Error> {
    toml::from_str(content)
}
