pub mod approval;
pub mod assignment;
pub mod auth;
pub mod store_assignment;
pub mod workflow;
