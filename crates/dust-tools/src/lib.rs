//! dust-tools: Built-in tools for dust-gateway
//!
//! This crate provides the weekly fine-dust forecast lookup tool.

use dust_core::{DustApiConfig, ToolManager};

pub mod model;
pub mod weekly_dust;

pub use model::{ForecastOutcome, WeeklyForecast};
pub use weekly_dust::{normalize_date, WeeklyDustTool, TOOL_NAME};

use std::sync::Arc;

/// Register all default built-in tools with the tool manager
pub fn register_default_tools(manager: &mut ToolManager, config: &DustApiConfig) {
    manager.register(Arc::new(WeeklyDustTool::new(config.clone())));
}
