//! Learning-plan generation for PathLy.
//!
//! [`roadmap`] turns a skill, a duration and a difficulty into a
//! [`roadmap::LearningPlan`], asking a [`provider::TextGenerator`] first and
//! falling back to a deterministic plan when that fails. [`plan`] stores and
//! exports plans; [`progress`] summarizes completion.

pub mod plan;
pub mod progress;
pub mod provider;
pub mod roadmap;
