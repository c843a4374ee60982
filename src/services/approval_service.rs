// src/services/approval_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ApprovalRepository, StoreAssignmentRepository},
    engine::pipeline,
    models::{
        approval::{Decision, PendingApproval, StageActionResult, StageProgressEntry},
        auth::CallerContext,
    },
};

#[derive(Clone)]
pub struct ApprovalService {
    approval_repo: ApprovalRepository,
    store_repo: StoreAssignmentRepository,
    pool: PgPool,
}

impl ApprovalService {
    pub fn new(approval_repo: ApprovalRepository, store_repo: StoreAssignmentRepository, pool: PgPool) -> Self {
        Self {
            approval_repo,
            store_repo,
            pool,
        }
    }

    /// Etapas da loja em ordem, com `canApprove`/`canReject` para o chamador.
    pub async fn progress(
        &self,
        caller: &CallerContext,
        store_assignment_id: Uuid,
    ) -> Result<Vec<StageProgressEntry>, AppError> {
        let owner = self
            .store_repo
            .find_owner(&self.pool, store_assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("StoreAssignment", store_assignment_id))?;
        caller.ensure_can_view(owner.tenant_id, owner.vendor_id)?;

        let instances = self.approval_repo.list_for_store(&self.pool, store_assignment_id).await?;
        Ok(pipeline::progress(&instances, caller.role_id))
    }

    pub async fn pending_for_caller(&self, caller: &CallerContext) -> Result<Vec<PendingApproval>, AppError> {
        caller.ensure_brand_user()?;
        self.approval_repo
            .list_pending_for_role(caller.tenant_id, caller.role_id)
            .await
    }

    /// Aprova ou rejeita uma etapa.
    ///
    /// A linha da loja fica travada durante toda a decisão e a gravação só
    /// acontece se a etapa ainda estiver ativa e sem autor: de duas chamadas
    /// simultâneas, uma vence e a outra recebe `Conflict`.
    pub async fn decide(
        &self,
        caller: &CallerContext,
        store_assignment_id: Uuid,
        workflow_stage_id: Uuid,
        decision: Decision,
        comment: Option<&str>,
    ) -> Result<StageActionResult, AppError> {
        caller.ensure_brand_user()?;
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let owner = self
            .store_repo
            .find_owner_for_update(&mut *tx, store_assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("StoreAssignment", store_assignment_id))?;
        caller.ensure_tenant(owner.tenant_id)?;

        let mut instances = self.approval_repo.list_for_store(&mut *tx, store_assignment_id).await?;
        pipeline::verify_pipeline(&instances)?;

        let result = match pipeline::act(&mut instances, workflow_stage_id, caller, decision, comment, now) {
            Ok(result) => result,
            Err(e) => {
                if matches!(e, AppError::Forbidden(_) | AppError::Conflict(_)) {
                    tracing::warn!(
                        "Decisão {:?} recusada na loja {} etapa {} para o usuário {}: {}",
                        decision,
                        store_assignment_id,
                        workflow_stage_id,
                        caller.user_id,
                        e
                    );
                }
                return Err(e);
            }
        };

        // Primeiro fecha a etapa atual, depois ativa a próxima:
        // o índice único de etapa ativa nunca vê duas ao mesmo tempo.
        let actioned = self.approval_repo.record_action(&mut *tx, &result.actioned).await?;
        let activated = match &result.activated {
            Some(next) => Some(self.approval_repo.activate(&mut *tx, next).await?),
            None => None,
        };

        tx.commit().await?;

        tracing::info!(
            "Etapa '{}' da loja {} {} por {}",
            actioned.stage_name,
            store_assignment_id,
            actioned.status,
            caller.user_id
        );
        if result.fully_approved {
            tracing::info!("Loja {} totalmente aprovada", store_assignment_id);
        }

        Ok(StageActionResult {
            actioned,
            activated,
            fully_approved: result.fully_approved,
        })
    }
}
