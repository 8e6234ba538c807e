mod builder;
mod defaults;
mod file;
mod models;

pub use builder::{Overrides, build_config};
pub use models::AppConfig;
