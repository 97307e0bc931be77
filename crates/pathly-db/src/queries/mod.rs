pub mod modules;
pub mod skill_plans;
pub mod tasks;
