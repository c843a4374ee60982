pub mod approvals;
pub mod assignments;
pub mod store_assignments;
pub mod workflows;
