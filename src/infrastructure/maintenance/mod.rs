pub mod scheduler;

pub use scheduler::{MaintenanceConfig, MaintenanceHandle, MaintenanceReport, MaintenanceScheduler};
