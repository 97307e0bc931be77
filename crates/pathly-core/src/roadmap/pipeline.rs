//! End-to-end plan generation with a deterministic fallback.
//!
//! ```text
//! request_roadmap --ok--> validate --ok--> transform --> LearningPlan
//!       |                    |                 ^
//!       | error              | blocking        |
//!       v                    v                 |
//!       +------------> synthesize_fallback ----+
//! ```
//!
//! Over a valid [`GenerationRequest`] the pipeline always produces a plan.

use std::fmt;
use std::sync::Arc;

use pathly_db::models::{Difficulty, PlanSource};
use tracing::{info, warn};

use super::fallback::synthesize_fallback;
use super::request::{GenerationRequest, InputError};
use super::requester::{GenerationError, request_roadmap};
use super::transform::{LearningPlan, transform};
use super::validator::{ValidatorConfig, Violation, validate_with};
use crate::provider::TextGenerator;

/// Why the fallback path produced the plan.
#[derive(Debug)]
pub enum FallbackReason {
    /// No generator was configured.
    Offline,
    /// The generator failed or its reply did not parse.
    Generation(GenerationError),
    /// The generated tree had blocking violations (listed in the outcome).
    Validation,
}

impl fmt::Display for FallbackReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Offline => f.write_str("no generator configured"),
            Self::Generation(e) => write!(f, "generation failed: {e}"),
            Self::Validation => f.write_str("generated roadmap failed validation"),
        }
    }
}

/// A plan plus how it was produced.
#[derive(Debug)]
pub struct PlanOutcome {
    pub plan: LearningPlan,
    pub source: PlanSource,
    /// Every violation found in the generated tree, blocking or not. Empty
    /// when the generator was not reached or its reply did not parse.
    pub violations: Vec<Violation>,
    pub fallback_reason: Option<FallbackReason>,
}

/// Shared, reusable generation pipeline.
#[derive(Clone)]
pub struct PlanPipeline {
    generator: Option<Arc<dyn TextGenerator>>,
    validator: ValidatorConfig,
}

impl PlanPipeline {
    pub fn new(generator: Arc<dyn TextGenerator>) -> Self {
        Self {
            generator: Some(generator),
            validator: ValidatorConfig::default(),
        }
    }

    /// A pipeline that always synthesizes the fallback plan.
    pub fn offline() -> Self {
        Self {
            generator: None,
            validator: ValidatorConfig::default(),
        }
    }

    pub fn with_validator_config(mut self, config: ValidatorConfig) -> Self {
        self.validator = config;
        self
    }

    pub fn is_offline(&self) -> bool {
        self.generator.is_none()
    }

    /// Produce a plan for `req`. Never fails.
    pub async fn generate(&self, req: &GenerationRequest) -> PlanOutcome {
        let Some(generator) = &self.generator else {
            info!(skill = req.skill_name(), "no generator configured, using fallback plan");
            return fallback(req, Vec::new(), FallbackReason::Offline);
        };
        run(generator.as_ref(), &self.validator, req).await
    }
}

async fn run(
    generator: &dyn TextGenerator,
    config: &ValidatorConfig,
    req: &GenerationRequest,
) -> PlanOutcome {
    let tree = match request_roadmap(generator, req).await {
        Ok(tree) => tree,
        Err(e) => {
            warn!(
                provider = generator.name(),
                skill = req.skill_name(),
                error = %e,
                "roadmap generation failed, using fallback plan"
            );
            return fallback(req, Vec::new(), FallbackReason::Generation(e));
        }
    };

    let result = validate_with(&tree, req, config);
    if !result.ok {
        let blocking: Vec<String> = result.blocking().map(ToString::to_string).collect();
        warn!(
            skill = req.skill_name(),
            duration_days = req.duration_days(),
            violations = ?blocking,
            "generated roadmap rejected, using fallback plan"
        );
        return fallback(req, result.violations, FallbackReason::Validation);
    }

    for v in result.advisory() {
        info!(skill = req.skill_name(), violation = %v, "advisory roadmap violation");
    }

    let plan = transform(&tree);
    info!(
        skill = req.skill_name(),
        modules = plan.modules.len(),
        source = %PlanSource::Generated,
        "learning plan generated"
    );
    PlanOutcome {
        plan,
        source: PlanSource::Generated,
        violations: result.violations,
        fallback_reason: None,
    }
}

fn fallback(
    req: &GenerationRequest,
    violations: Vec<Violation>,
    reason: FallbackReason,
) -> PlanOutcome {
    let tree = synthesize_fallback(req.skill_name(), req.duration_days(), req.difficulty());
    PlanOutcome {
        plan: transform(&tree),
        source: PlanSource::Fallback,
        violations,
        fallback_reason: Some(reason),
    }
}

/// Generate a plan for raw caller input.
///
/// The only error is invalid input; every generation failure degrades to
/// the fallback plan.
pub async fn generate_learning_plan(
    generator: &dyn TextGenerator,
    skill: &str,
    duration_days: i64,
    difficulty: Difficulty,
) -> Result<LearningPlan, InputError> {
    let req = GenerationRequest::new(skill, duration_days, difficulty)?;
    Ok(run(generator, &ValidatorConfig::default(), &req).await.plan)
}
