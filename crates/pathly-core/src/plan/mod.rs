//! Stored plans: persistence service and TOML export.

pub mod service;
pub mod toml_format;

pub use service::{StoredModule, StoredPlan, get_plan_with_modules, list_active_plans, save_learning_plan};
pub use toml_format::{PlanFile, PlanMeta, parse_plan_file};
