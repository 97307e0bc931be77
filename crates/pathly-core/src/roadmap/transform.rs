//! Flatten a [`RoadmapTree`] into the persistence-ready [`LearningPlan`].

use serde::{Deserialize, Serialize};

use super::tree::{ModuleNode, RoadmapTree, TaskNode};

/// Ordered list of modules ready to be stored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LearningPlan {
    pub modules: Vec<Module>,
}

impl LearningPlan {
    pub fn task_count(&self) -> usize {
        self.modules.iter().map(|m| m.tasks.len()).sum()
    }

    /// Highest week number referenced, 0 for an empty plan.
    pub fn week_count(&self) -> u32 {
        self.modules.iter().map(|m| m.week).max().unwrap_or(0)
    }

    /// Modules of week `week`, in order.
    pub fn modules_in_week(&self, week: u32) -> impl Iterator<Item = &Module> {
        self.modules.iter().filter(move |m| m.week == week)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub title: String,
    pub week: u32,
    /// Zero-based position across the whole plan.
    pub order: u32,
    pub objective: String,
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub title: String,
    #[serde(rename = "contentType")]
    pub content_type: String,
    pub description: String,
    #[serde(rename = "contentLink", default, skip_serializing_if = "Option::is_none")]
    pub content_link: Option<String>,
}

impl From<&TaskNode> for Task {
    fn from(node: &TaskNode) -> Self {
        Self {
            title: node.title.clone(),
            content_type: node.content_type.to_string(),
            description: node.description.clone(),
            content_link: node.content_link.clone(),
        }
    }
}

/// Build a [`LearningPlan`] from `tree`.
///
/// Modules are emitted by `(week, sequence_order)`; ties keep their order
/// in the tree. `order` is renumbered from 0 regardless of the tree's
/// `sequence_order` values, so the result is always contiguous.
pub fn transform(tree: &RoadmapTree) -> LearningPlan {
    let mut nodes: Vec<(u32, &ModuleNode)> = tree.modules().collect();
    nodes.sort_by_key(|(week, m)| (*week, m.sequence_order));

    let modules = nodes
        .into_iter()
        .zip(0u32..)
        .map(|((week, node), order)| Module {
            title: node.title.clone(),
            week,
            order,
            objective: node.objective.clone(),
            tasks: node.tasks.iter().map(Task::from).collect(),
        })
        .collect();

    LearningPlan { modules }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roadmap::tree::{ContentType, DifficultyTag, LearningType, WeekNode};

    fn node(title: &str, sequence_order: u32, tasks: Vec<TaskNode>) -> ModuleNode {
        ModuleNode {
            id: String::new(),
            title: title.to_string(),
            objective: format!("Objective of {title}"),
            learning_type: LearningType::Practice,
            difficulty_tag: DifficultyTag::Intermediate,
            estimated_minutes: 30,
            sequence_order,
            tasks,
        }
    }

    fn week(week_number: u32, modules: Vec<ModuleNode>) -> WeekNode {
        WeekNode {
            week_number,
            focus: String::new(),
            modules,
        }
    }

    fn tree(weeks: Vec<WeekNode>) -> RoadmapTree {
        RoadmapTree {
            skill: "Piano".to_string(),
            difficulty: "Intermediate".to_string(),
            duration_days: 21,
            weeks,
        }
    }

    #[test]
    fn orders_are_contiguous_from_zero() {
        let t = tree(vec![
            week(1, vec![node("a", 10, vec![]), node("b", 20, vec![])]),
            week(2, vec![node("c", 5, vec![])]),
            week(3, vec![node("d", 1, vec![]), node("e", 2, vec![])]),
        ]);
        let plan = transform(&t);
        let orders: Vec<u32> = plan.modules.iter().map(|m| m.order).collect();
        assert_eq!(orders, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn sorts_by_week_then_sequence_order() {
        let t = tree(vec![
            week(2, vec![node("w2-first", 1, vec![])]),
            week(1, vec![node("w1-second", 2, vec![]), node("w1-first", 1, vec![])]),
        ]);
        let plan = transform(&t);
        let titles: Vec<&str> = plan.modules.iter().map(|m| m.title.as_str()).collect();
        assert_eq!(titles, vec!["w1-first", "w1-second", "w2-first"]);
        let weeks: Vec<u32> = plan.modules.iter().map(|m| m.week).collect();
        assert_eq!(weeks, vec![1, 1, 2]);
    }

    #[test]
    fn tasks_are_copied_with_string_content_type() {
        let tasks = vec![
            TaskNode {
                title: "Scales".to_string(),
                content_type: ContentType::Exercise,
                description: "C major".to_string(),
                content_link: None,
            },
            TaskNode {
                title: "Masterclass".to_string(),
                content_type: ContentType::Video,
                description: String::new(),
                content_link: Some("https://example.com/v".to_string()),
            },
        ];
        let plan = transform(&tree(vec![week(1, vec![node("a", 1, tasks)])]));
        let t = &plan.modules[0].tasks;
        assert_eq!(t[0].content_type, "exercise");
        assert_eq!(t[1].content_type, "video");
        assert_eq!(t[1].content_link.as_deref(), Some("https://example.com/v"));
        assert_eq!(plan.task_count(), 2);
    }

    #[test]
    fn empty_tree_gives_empty_plan() {
        let plan = transform(&tree(vec![]));
        assert!(plan.modules.is_empty());
        assert_eq!(plan.week_count(), 0);
    }

    #[test]
    fn plan_serializes_with_wire_names() {
        let tasks = vec![TaskNode {
            title: "Read".to_string(),
            content_type: ContentType::Reading,
            description: String::new(),
            content_link: None,
        }];
        let plan = transform(&tree(vec![week(1, vec![node("a", 1, tasks)])]));
        let json = serde_json::to_value(&plan).unwrap();
        let task = &json["modules"][0]["tasks"][0];
        assert_eq!(task["contentType"], "reading");
        assert!(task.get("contentLink").is_none());
        assert_eq!(json["modules"][0]["order"], 0);
    }
}
