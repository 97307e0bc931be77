//! Provisional roadmap tree as emitted by the text generator.
//!
//! These types map directly to the JSON shape requested in the generation
//! instruction and are deserialized via `serde_json`. A tree only lives
//! inside the pipeline; it is always transformed into a
//! [`LearningPlan`](super::transform::LearningPlan) before leaving it.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Root of a generated roadmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RoadmapTree {
    #[serde(default)]
    pub skill: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub duration_days: u32,
    /// Required: a reply without `weeks` is not a roadmap.
    pub weeks: Vec<WeekNode>,
}

impl RoadmapTree {
    /// Iterate over every module together with its week number.
    pub fn modules(&self) -> impl Iterator<Item = (u32, &ModuleNode)> {
        self.weeks
            .iter()
            .flat_map(|w| w.modules.iter().map(move |m| (w.week_number, m)))
    }

    pub fn module_count(&self) -> usize {
        self.weeks.iter().map(|w| w.modules.len()).sum()
    }
}

/// One week of the roadmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WeekNode {
    #[serde(rename = "week")]
    pub week_number: u32,
    #[serde(default)]
    pub focus: String,
    pub modules: Vec<ModuleNode>,
}

/// A thematic unit of learning within a week.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ModuleNode {
    #[serde(rename = "module_id", default)]
    pub id: String,
    pub title: String,
    pub objective: String,
    pub learning_type: LearningType,
    pub difficulty_tag: DifficultyTag,
    #[serde(rename = "estimated_time_minutes", default)]
    pub estimated_minutes: u32,
    pub sequence_order: u32,
    /// Generated modules may omit tasks; an absent list is read as empty.
    #[serde(default)]
    pub tasks: Vec<TaskNode>,
}

/// The smallest schedulable unit of learning content.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TaskNode {
    pub title: String,
    #[serde(rename = "contentType")]
    pub content_type: ContentType,
    #[serde(default)]
    pub description: String,
    #[serde(
        rename = "contentLink",
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub content_link: Option<String>,
}

/// The instruction template shows `"contentLink": ""`, so an empty or
/// whitespace-only link means "no link".
fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.trim().is_empty()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LearningType {
    Theory,
    Practice,
    Project,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyTag {
    Beginner,
    Intermediate,
    Expert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentType {
    Reading,
    Video,
    Project,
    Exercise,
}

impl ContentType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Reading => "reading",
            Self::Video => "video",
            Self::Project => "project",
            Self::Exercise => "exercise",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
