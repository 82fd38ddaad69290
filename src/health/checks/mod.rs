//! Built-in health checks

pub mod build_info;
pub mod config;
pub mod routing;
pub mod scheduler;

pub use build_info::BuildInfoCheck;
pub use config::ConfigCheck;
pub use routing::RoutingCheck;
pub use scheduler::SchedulerCheck;
