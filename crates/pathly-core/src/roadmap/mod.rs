//! Learning-roadmap generation.
//!
//! A [`GenerationRequest`] is sent to a text generator by the requester,
//! checked by the validator, and flattened into a [`LearningPlan`] by the
//! transformer. When any step fails, [`synthesize_fallback`] provides the
//! tree instead. [`PlanPipeline`] wires the steps together.

pub mod fallback;
pub mod pipeline;
pub mod prompt;
pub mod request;
pub mod requester;
pub mod transform;
pub mod tree;
pub mod validator;

pub use fallback::synthesize_fallback;
pub use pipeline::{FallbackReason, PlanOutcome, PlanPipeline, generate_learning_plan};
pub use request::{
    ContentRatio, DEFAULT_DAILY_TIME_MINUTES, GenerationRequest, InputError, MAX_DAILY_TIME_MINUTES,
    MAX_DURATION_DAYS, parse_difficulty,
};
pub use requester::{GenerationError, parse_roadmap, request_roadmap};
pub use transform::{LearningPlan, Module, Task, transform};
pub use tree::RoadmapTree;
pub use validator::{ValidationResult, ValidatorConfig, Violation, ViolationKind, validate, validate_with};
