pub mod approval_repo;
pub use approval_repo::ApprovalRepository;
pub mod assignment_repo;
pub use assignment_repo::AssignmentRepository;
pub mod store_assignment_repo;
pub use store_assignment_repo::StoreAssignmentRepository;
pub mod workflow_repo;
pub use workflow_repo::WorkflowRepository;
