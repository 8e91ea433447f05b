pub mod api;
pub mod cli;
pub mod config;
pub mod runtime;
pub mod setup;

pub use config::NodeConfig;
pub use runtime::builder::build_runtime;
