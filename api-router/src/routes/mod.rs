pub mod analyze;
pub mod compare;
pub mod dashboard;
pub mod liveness;
pub mod providers;
pub mod readiness;
pub mod repositories;
