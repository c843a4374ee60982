// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Workflows ---
        handlers::workflows::create_workflow,
        handlers::workflows::list_workflows,
        handlers::workflows::get_workflow,
        handlers::workflows::replace_stages,
        handlers::workflows::append_stage,
        handlers::workflows::remove_stage,
        handlers::workflows::move_stage,

        // --- Assignments ---
        handlers::assignments::create_assignment,
        handlers::assignments::list_assignments,
        handlers::assignments::get_assignment,
        handlers::assignments::get_workflow_progress,

        // --- Store Assignments ---
        handlers::store_assignments::list_my_store_assignments,
        handlers::store_assignments::get_store_assignment,
        handlers::store_assignments::update_store_status,
        handlers::store_assignments::update_store_form,

        // --- Approvals ---
        handlers::store_assignments::get_approval_progress,
        handlers::store_assignments::approve_stage,
        handlers::store_assignments::reject_stage,
        handlers::approvals::list_pending_approvals,
    ),
    components(
        schemas(
            // --- Workflows ---
            models::workflow::WorkflowDefinition,
            models::workflow::WorkflowStage,
            models::workflow::WorkflowDetail,
            models::workflow::StageDraft,

            // --- Assignments ---
            models::assignment::AssignmentStatus,
            models::assignment::Assignment,
            models::assignment::AssignmentDetail,
            models::assignment::VendorStatusCount,
            models::assignment::StageProgress,
            models::assignment::WorkflowProgress,
            models::assignment::CreateAssignmentPayload,

            // --- Store Assignments ---
            models::store_assignment::VendorWorkStatus,
            models::store_assignment::StoreAssignment,
            models::store_assignment::StoreAssignmentDetail,
            models::store_assignment::BoardSpec,
            models::store_assignment::PoleSpecInput,
            models::store_assignment::ImageUrls,
            models::store_assignment::Coords,
            models::store_assignment::GpsLocation,
            models::store_assignment::GpsInput,
            models::store_assignment::StoreFormPayload,
            models::store_assignment::UpdateStatusPayload,

            // --- Approvals ---
            models::approval::StageStatus,
            models::approval::StageAction,
            models::approval::ApprovalStageInstance,
            models::approval::StageProgressEntry,
            models::approval::StageActionPayload,
            models::approval::StageActionResult,
            models::approval::PendingApproval,

            // --- Payloads ---
            handlers::workflows::CreateWorkflowPayload,
            handlers::workflows::ReplaceStagesPayload,
            handlers::workflows::MoveStagePayload,
        )
    ),
    tags(
        (name = "Workflows", description = "Templates de aprovação e suas etapas"),
        (name = "Assignments", description = "Atribuições de lojas a fornecedores"),
        (name = "Store Assignments", description = "Trabalho de campo do fornecedor por loja"),
        (name = "Approvals", description = "Pipeline de aprovação da marca")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented_with_bearer_security() {
        let doc = ApiDoc::openapi();

        for path in [
            "/api/workflows/{id}/stages/{order}/move",
            "/api/assignments/{id}/workflow-progress",
            "/api/store-assignments/{id}/form",
            "/api/store-assignments/{id}/stages/{stage_id}/approve",
            "/api/approvals/pending",
        ] {
            assert!(doc.paths.paths.contains_key(path), "rota ausente: {path}");
        }

        let schemes = doc.components.as_ref().map(|c| &c.security_schemes);
        assert!(schemes.is_some_and(|s| s.contains_key("api_jwt")));
    }
}
