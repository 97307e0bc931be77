//! Structural and pedagogical checks on a generated [`RoadmapTree`].
//!
//! Validation never stops at the first problem: every violation is
//! collected so callers can log the full picture before deciding whether
//! to fall back. Whether a violation forces fallback is a property of its
//! [`ViolationKind`].

use std::collections::BTreeMap;
use std::fmt;

use pathly_db::models::Difficulty;

use super::request::GenerationRequest;
use super::tree::{LearningType, ModuleNode, RoadmapTree};

/// Tunables for [`validate_with`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidatorConfig {
    /// Minutes a module may exceed the daily budget before it is flagged.
    pub time_tolerance_minutes: u32,
}

/// Category of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViolationKind {
    /// No weeks at all, or a week without modules.
    EmptyRoadmap,
    /// Week number outside `1..=ceil(duration_days / 7)`, or too many weeks.
    WeekRange,
    /// A module's estimate exceeds the daily budget.
    TimeBudget,
    /// Too much project work for beginners, or too much theory for experts.
    DifficultyMix,
    /// Blank module title or objective.
    MissingField,
    /// `sequence_order` not strictly increasing within a week.
    SequenceOrder,
    /// A module with no tasks.
    EmptyTasks,
}

impl ViolationKind {
    /// Blocking violations reject the tree; advisory ones are only reported.
    pub fn is_blocking(self) -> bool {
        !matches!(self, Self::DifficultyMix | Self::EmptyTasks)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EmptyRoadmap => "empty_roadmap",
            Self::WeekRange => "week_range",
            Self::TimeBudget => "time_budget",
            Self::DifficultyMix => "difficulty_mix",
            Self::MissingField => "missing_field",
            Self::SequenceOrder => "sequence_order",
            Self::EmptyTasks => "empty_tasks",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One finding, located as precisely as the tree allows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    pub kind: ViolationKind,
    pub week: Option<u32>,
    /// Module id, or its title when the generator left the id empty.
    pub module: Option<String>,
    pub message: String,
}

impl Violation {
    fn roadmap(kind: ViolationKind, message: String) -> Self {
        Self {
            kind,
            week: None,
            module: None,
            message,
        }
    }

    fn week(kind: ViolationKind, week: u32, message: String) -> Self {
        Self {
            kind,
            week: Some(week),
            module: None,
            message,
        }
    }

    fn module(kind: ViolationKind, week: u32, module: &ModuleNode, message: String) -> Self {
        let label = if module.id.trim().is_empty() {
            module.title.clone()
        } else {
            module.id.clone()
        };
        Self {
            kind,
            week: Some(week),
            module: Some(label),
            message,
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.kind)?;
        if let Some(week) = self.week {
            write!(f, " week {week}")?;
        }
        if let Some(module) = &self.module {
            write!(f, " module {module:?}")?;
        }
        write!(f, ": {}", self.message)
    }
}

/// Outcome of validating one tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    /// `true` iff no violation is blocking.
    pub ok: bool,
    pub violations: Vec<Violation>,
}

impl ValidationResult {
    fn from_violations(violations: Vec<Violation>) -> Self {
        let ok = !violations.iter().any(|v| v.kind.is_blocking());
        Self { ok, violations }
    }

    pub fn blocking(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| v.kind.is_blocking())
    }

    pub fn advisory(&self) -> impl Iterator<Item = &Violation> {
        self.violations.iter().filter(|v| !v.kind.is_blocking())
    }

    pub fn has(&self, kind: ViolationKind) -> bool {
        self.violations.iter().any(|v| v.kind == kind)
    }
}

/// Validate with the default configuration (no time tolerance).
pub fn validate(tree: &RoadmapTree, req: &GenerationRequest) -> ValidationResult {
    validate_with(tree, req, &ValidatorConfig::default())
}

/// Validate `tree` against `req`, collecting every violation.
pub fn validate_with(
    tree: &RoadmapTree,
    req: &GenerationRequest,
    config: &ValidatorConfig,
) -> ValidationResult {
    let mut violations = Vec::new();
    let max_week = req.week_count();

    if tree.weeks.is_empty() {
        violations.push(Violation::roadmap(
            ViolationKind::EmptyRoadmap,
            "roadmap contains no weeks".to_string(),
        ));
    }

    if tree.weeks.len() > max_week as usize {
        violations.push(Violation::roadmap(
            ViolationKind::WeekRange,
            format!(
                "roadmap has {} weeks but {} days allow at most {max_week}",
                tree.weeks.len(),
                req.duration_days()
            ),
        ));
    }

    // Keyed by week number: a reply may split one week over several nodes.
    let mut tallies: BTreeMap<u32, WeekTally> = BTreeMap::new();

    for week in &tree.weeks {
        let w = week.week_number;
        if w < 1 || w > max_week {
            violations.push(Violation::week(
                ViolationKind::WeekRange,
                w,
                format!("week number {w} is outside 1..={max_week}"),
            ));
        }

        if week.modules.is_empty() {
            violations.push(Violation::week(
                ViolationKind::EmptyRoadmap,
                w,
                "week contains no modules".to_string(),
            ));
        }

        let tally = tallies.entry(w).or_default();
        for module in &week.modules {
            if check_module(module, w, req, config, &mut violations) {
                tally.module_over_budget = true;
            }
            tally.minutes = tally.minutes.saturating_add(module.estimated_minutes);

            if let Some(prev) = tally.last_order.filter(|p| module.sequence_order <= *p) {
                violations.push(Violation::module(
                    ViolationKind::SequenceOrder,
                    w,
                    module,
                    format!(
                        "sequence_order {} does not follow {prev}",
                        module.sequence_order
                    ),
                ));
            }
            tally.last_order = Some(module.sequence_order);
        }
    }

    let limit = budget_limit(req, config);
    for (w, tally) in &tallies {
        // A single oversized module is already reported on its own.
        if tally.minutes > limit && !tally.module_over_budget {
            violations.push(Violation::week(
                ViolationKind::TimeBudget,
                *w,
                format!(
                    "modules total {} minutes, over the daily budget of {} minutes",
                    tally.minutes,
                    req.daily_time_minutes()
                ),
            ));
        }
    }

    if let Some(v) = check_difficulty_mix(tree, req.difficulty()) {
        violations.push(v);
    }

    ValidationResult::from_violations(violations)
}

/// Running state for one week number.
#[derive(Default)]
struct WeekTally {
    last_order: Option<u32>,
    minutes: u32,
    module_over_budget: bool,
}

fn budget_limit(req: &GenerationRequest, config: &ValidatorConfig) -> u32 {
    req.daily_time_minutes()
        .saturating_add(config.time_tolerance_minutes)
}

/// Per-module checks. Returns `true` if the module alone exceeds the budget.
fn check_module(
    module: &ModuleNode,
    week: u32,
    req: &GenerationRequest,
    config: &ValidatorConfig,
    violations: &mut Vec<Violation>,
) -> bool {
    if module.title.trim().is_empty() {
        violations.push(Violation::module(
            ViolationKind::MissingField,
            week,
            module,
            "module title is blank".to_string(),
        ));
    }
    if module.objective.trim().is_empty() {
        violations.push(Violation::module(
            ViolationKind::MissingField,
            week,
            module,
            "module objective is blank".to_string(),
        ));
    }

    let over_budget = module.estimated_minutes > budget_limit(req, config);
    if over_budget {
        violations.push(Violation::module(
            ViolationKind::TimeBudget,
            week,
            module,
            format!(
                "estimated {} minutes exceeds the daily budget of {} minutes",
                module.estimated_minutes,
                req.daily_time_minutes()
            ),
        ));
    }

    if module.tasks.is_empty() {
        violations.push(Violation::module(
            ViolationKind::EmptyTasks,
            week,
            module,
            "module has no tasks".to_string(),
        ));
    }

    over_budget
}

/// More than half of the modules of the "wrong" kind for the level.
fn check_difficulty_mix(tree: &RoadmapTree, difficulty: Difficulty) -> Option<Violation> {
    let (kind, label) = match difficulty {
        Difficulty::Beginner => (LearningType::Project, "project"),
        Difficulty::Expert => (LearningType::Theory, "theory"),
        Difficulty::Intermediate => return None,
    };
    let total = tree.module_count();
    let matching = tree.modules().filter(|(_, m)| m.learning_type == kind).count();
    (matching * 2 > total).then(|| {
        Violation::roadmap(
            ViolationKind::DifficultyMix,
            format!(
                "{matching} of {total} modules are {label} modules, too many for a {} plan",
                difficulty.label()
            ),
        )
    })
}
