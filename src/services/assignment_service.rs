// src/services/assignment_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ApprovalRepository, AssignmentRepository, StoreAssignmentRepository, WorkflowRepository},
    engine::{
        aggregation,
        definition::{required_text, verify_stages},
    },
    models::{
        assignment::{Assignment, AssignmentDetail, AssignmentRow, CreateAssignmentPayload, WorkflowProgress},
        auth::CallerContext,
    },
};

#[derive(Clone)]
pub struct AssignmentService {
    assignment_repo: AssignmentRepository,
    store_repo: StoreAssignmentRepository,
    workflow_repo: WorkflowRepository,
    approval_repo: ApprovalRepository,
    pool: PgPool,
}

impl AssignmentService {
    pub fn new(
        assignment_repo: AssignmentRepository,
        store_repo: StoreAssignmentRepository,
        workflow_repo: WorkflowRepository,
        approval_repo: ApprovalRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            assignment_repo,
            store_repo,
            workflow_repo,
            approval_repo,
            pool,
        }
    }

    /// Cria a atribuição e uma loja `Pending` para cada storeId, tudo ou nada.
    pub async fn create_assignment(
        &self,
        caller: &CallerContext,
        payload: CreateAssignmentPayload,
    ) -> Result<AssignmentDetail, AppError> {
        caller.ensure_brand_user()?;
        let name = required_text("name", &payload.name)?;

        let mut store_ids: Vec<Uuid> = Vec::with_capacity(payload.store_ids.len());
        for id in payload.store_ids {
            if !store_ids.contains(&id) {
                store_ids.push(id);
            }
        }
        if store_ids.is_empty() {
            return Err(AppError::invalid_field("storeIds", "at least one store is required"));
        }

        let mut tx = self.pool.begin().await?;

        // Workflow desconhecido é erro de validação do payload, não 404.
        self.workflow_repo
            .find_definition(&mut *tx, caller.tenant_id, payload.workflow_definition_id)
            .await?
            .ok_or_else(|| AppError::invalid_field("workflowDefinitionId", "unknown workflow definition"))?;
        let stages = self
            .workflow_repo
            .list_stages(&mut *tx, payload.workflow_definition_id)
            .await?;
        verify_stages(&stages)?;

        let assignment_id = self
            .assignment_repo
            .create_assignment(
                &mut *tx,
                caller.tenant_id,
                name,
                payload.description.as_deref(),
                payload.vendor_id,
                payload.workflow_definition_id,
                caller.user_id,
            )
            .await?;

        let stores = self
            .assignment_repo
            .insert_store_assignments(&mut *tx, assignment_id, &store_ids)
            .await?;

        let row = self
            .assignment_repo
            .find_assignment(&mut *tx, caller.tenant_id, assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment", assignment_id))?;

        tx.commit().await?;

        tracing::info!(
            "Atribuição {} criada para o fornecedor {} com {} lojas",
            assignment_id,
            payload.vendor_id,
            stores.len()
        );

        Ok(AssignmentDetail {
            assignment: Assignment::from(row),
            vendor_status_breakdown: aggregation::vendor_breakdown(&stores),
            stores,
        })
    }

    /// Fornecedores veem só as próprias atribuições.
    pub async fn list_assignments(&self, caller: &CallerContext) -> Result<Vec<Assignment>, AppError> {
        let rows = self
            .assignment_repo
            .list_assignments(caller.tenant_id, caller.vendor_id)
            .await?;

        Ok(rows.into_iter().map(Assignment::from).collect())
    }

    pub async fn get_assignment(
        &self,
        caller: &CallerContext,
        assignment_id: Uuid,
    ) -> Result<AssignmentDetail, AppError> {
        let row = self.load_visible(caller, assignment_id).await?;
        let stores = self.store_repo.list_by_assignment(&self.pool, assignment_id).await?;

        Ok(AssignmentDetail {
            assignment: Assignment::from(row),
            vendor_status_breakdown: aggregation::vendor_breakdown(&stores),
            stores,
        })
    }

    pub async fn workflow_progress(
        &self,
        caller: &CallerContext,
        assignment_id: Uuid,
    ) -> Result<WorkflowProgress, AppError> {
        let row = self.load_visible(caller, assignment_id).await?;

        let template = self
            .workflow_repo
            .list_stages(&self.pool, row.workflow_definition_id)
            .await?;
        let instances = self
            .approval_repo
            .list_for_assignment(&self.pool, assignment_id)
            .await?;

        Ok(aggregation::workflow_progress(
            assignment_id,
            row.total_stores,
            &template,
            &instances,
        ))
    }

    async fn load_visible(&self, caller: &CallerContext, assignment_id: Uuid) -> Result<AssignmentRow, AppError> {
        let row = self
            .assignment_repo
            .find_assignment(&self.pool, caller.tenant_id, assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("Assignment", assignment_id))?;

        caller.ensure_can_view(row.tenant_id, row.vendor_id)?;
        Ok(row)
    }
}
