pub mod approval_service;
pub mod assignment_service;
pub mod auth;
pub mod store_assignment_service;
pub mod workflow_service;
