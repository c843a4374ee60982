// src/services/store_assignment_service.rs

use std::collections::HashMap;

use chrono::Utc;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{ApprovalRepository, StoreAssignmentRepository, WorkflowRepository},
    engine::{pipeline, vendor_work},
    models::{
        approval::ApprovalStageInstance,
        auth::CallerContext,
        store_assignment::{
            StoreAssignment, StoreAssignmentDetail, StoreAssignmentOwner, StoreFormPayload,
            VendorWorkStatus,
        },
    },
};

/// Monta a resposta com o rótulo de aprovação e os predicados do chamador.
pub fn describe(
    record: StoreAssignment,
    instances: &[ApprovalStageInstance],
    role_id: Uuid,
) -> StoreAssignmentDetail {
    StoreAssignmentDetail {
        approval_status: pipeline::approval_status(record.vendor_work_status, instances).to_string(),
        approval_stages: pipeline::progress(instances, role_id),
        record,
    }
}

#[derive(Clone)]
pub struct StoreAssignmentService {
    store_repo: StoreAssignmentRepository,
    workflow_repo: WorkflowRepository,
    approval_repo: ApprovalRepository,
    pool: PgPool,
}

impl StoreAssignmentService {
    pub fn new(
        store_repo: StoreAssignmentRepository,
        workflow_repo: WorkflowRepository,
        approval_repo: ApprovalRepository,
        pool: PgPool,
    ) -> Self {
        Self {
            store_repo,
            workflow_repo,
            approval_repo,
            pool,
        }
    }

    // =========================================================================
    //  LEITURA
    // =========================================================================

    pub async fn list_mine(&self, caller: &CallerContext) -> Result<Vec<StoreAssignmentDetail>, AppError> {
        let vendor_id = caller
            .vendor_id
            .ok_or_else(|| AppError::Forbidden("only vendor users have store assignments".into()))?;

        let stores = self.store_repo.list_for_vendor(caller.tenant_id, vendor_id).await?;
        if stores.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = stores.iter().map(|s| s.id).collect();
        let mut by_store: HashMap<Uuid, Vec<ApprovalStageInstance>> = HashMap::new();
        for instance in self.approval_repo.list_for_stores(&ids).await? {
            by_store.entry(instance.store_assignment_id).or_default().push(instance);
        }

        Ok(stores
            .into_iter()
            .map(|store| {
                let instances = by_store.remove(&store.id).unwrap_or_default();
                describe(store, &instances, caller.role_id)
            })
            .collect())
    }

    pub async fn get_store_assignment(
        &self,
        caller: &CallerContext,
        store_assignment_id: Uuid,
    ) -> Result<StoreAssignmentDetail, AppError> {
        let owner = self
            .store_repo
            .find_owner(&self.pool, store_assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("StoreAssignment", store_assignment_id))?;
        caller.ensure_can_view(owner.tenant_id, owner.vendor_id)?;

        let record = self
            .store_repo
            .get(&self.pool, store_assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("StoreAssignment", store_assignment_id))?;
        let instances = self.approval_repo.list_for_store(&self.pool, store_assignment_id).await?;

        Ok(describe(record, &instances, caller.role_id))
    }

    // =========================================================================
    //  ESCRITA (FORNECEDOR)
    // =========================================================================

    /// Avança o status um passo. Ao concluir, materializa o pipeline de
    /// aprovação na mesma transação.
    pub async fn update_status(
        &self,
        caller: &CallerContext,
        store_assignment_id: Uuid,
        target: VendorWorkStatus,
    ) -> Result<StoreAssignmentDetail, AppError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let (owner, mut record) = self.lock_for_vendor(&mut *tx, caller, store_assignment_id).await?;
        let previous = record.vendor_work_status;

        if let Err(e) = vendor_work::transition(&mut record, target, now) {
            tracing::warn!(
                "Transição recusada na loja {}: {} -> {} ({})",
                store_assignment_id,
                previous,
                target,
                e
            );
            return Err(e);
        }

        let saved = self.store_repo.save(&mut *tx, &record, previous).await?;

        let instances = if saved.vendor_work_status == VendorWorkStatus::Completed {
            let stages = self
                .workflow_repo
                .list_stages(&mut *tx, owner.workflow_definition_id)
                .await?;

            let mut inserted = Vec::with_capacity(stages.len());
            for instance in pipeline::materialize(saved.id, &stages, now)? {
                inserted.push(self.approval_repo.insert_instance(&mut *tx, &instance).await?);
            }

            tracing::info!(
                "Pipeline de aprovação iniciado na loja {} com {} etapas",
                saved.id,
                inserted.len()
            );
            inserted
        } else {
            self.approval_repo.list_for_store(&mut *tx, saved.id).await?
        };

        tx.commit().await?;

        tracing::info!("Loja {}: {} -> {}", saved.id, previous, saved.vendor_work_status);

        Ok(describe(saved, &instances, caller.role_id))
    }

    /// Grava o formulário e avança o status até onde o conteúdo permite.
    pub async fn update_form(
        &self,
        caller: &CallerContext,
        store_assignment_id: Uuid,
        payload: StoreFormPayload,
    ) -> Result<StoreAssignmentDetail, AppError> {
        // Validação completa antes de abrir a transação: em erro nada é gravado.
        let form = vendor_work::validate_form(payload)?;
        let now = Utc::now();

        let mut tx = self.pool.begin().await?;

        let (_, mut record) = self.lock_for_vendor(&mut *tx, caller, store_assignment_id).await?;
        let previous = record.vendor_work_status;

        let advanced = vendor_work::apply_form(&mut record, form, now)?;
        let saved = self.store_repo.save(&mut *tx, &record, previous).await?;
        let instances = self.approval_repo.list_for_store(&mut *tx, saved.id).await?;

        tx.commit().await?;

        if advanced.is_empty() {
            tracing::info!("Formulário da loja {} atualizado sem mudança de status", saved.id);
        } else {
            tracing::info!("Formulário da loja {} avançou {} -> {:?}", saved.id, previous, advanced);
        }

        Ok(describe(saved, &instances, caller.role_id))
    }

    /// Trava a loja e confere se o chamador é o fornecedor dono dela.
    async fn lock_for_vendor(
        &self,
        conn: &mut PgConnection,
        caller: &CallerContext,
        store_assignment_id: Uuid,
    ) -> Result<(StoreAssignmentOwner, StoreAssignment), AppError> {
        let owner = self
            .store_repo
            .find_owner_for_update(&mut *conn, store_assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("StoreAssignment", store_assignment_id))?;

        if let Err(e) = caller.ensure_vendor(owner.tenant_id, owner.vendor_id) {
            tracing::warn!(
                "Usuário {} tentou alterar a loja {} de outro fornecedor",
                caller.user_id,
                store_assignment_id
            );
            return Err(e);
        }

        let record = self
            .store_repo
            .get(&mut *conn, store_assignment_id)
            .await?
            .ok_or_else(|| AppError::not_found("StoreAssignment", store_assignment_id))?;

        Ok((owner, record))
    }
}
