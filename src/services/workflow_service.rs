// src/services/workflow_service.rs

use std::collections::HashMap;

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::WorkflowRepository,
    engine::definition::{required_text, StagePlan},
    models::{
        auth::CallerContext,
        workflow::{StageDraft, WorkflowDetail, WorkflowStage},
    },
};

#[derive(Clone)]
pub struct WorkflowService {
    repo: WorkflowRepository,
    pool: PgPool,
}

impl WorkflowService {
    pub fn new(repo: WorkflowRepository, pool: PgPool) -> Self {
        Self { repo, pool }
    }

    /// Cria o template e suas etapas na mesma transação.
    pub async fn create_workflow(
        &self,
        caller: &CallerContext,
        name: &str,
        description: Option<&str>,
        drafts: Vec<StageDraft>,
    ) -> Result<WorkflowDetail, AppError> {
        caller.ensure_brand_user()?;
        let name = required_text("name", name)?;
        let plan = StagePlan::from_drafts(drafts)?;

        let mut tx = self.pool.begin().await?;

        let definition = self
            .repo
            .create_definition(&mut *tx, caller.tenant_id, name, description)
            .await?;
        let stages = self.repo.insert_stages(&mut *tx, definition.id, plan.stages()).await?;

        tx.commit().await?;

        tracing::info!(
            "Workflow {} criado no tenant {} com {} etapas",
            definition.id,
            caller.tenant_id,
            stages.len()
        );

        Ok(WorkflowDetail { definition, stages })
    }

    pub async fn list_workflows(&self, caller: &CallerContext) -> Result<Vec<WorkflowDetail>, AppError> {
        let definitions = self.repo.list_definitions(caller.tenant_id).await?;
        if definitions.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<Uuid> = definitions.iter().map(|d| d.id).collect();
        let mut stages_by_workflow: HashMap<Uuid, Vec<WorkflowStage>> = HashMap::new();
        for stage in self.repo.list_stages_for(&ids).await? {
            stages_by_workflow.entry(stage.workflow_id).or_default().push(stage);
        }

        Ok(definitions
            .into_iter()
            .map(|definition| {
                let stages = stages_by_workflow.remove(&definition.id).unwrap_or_default();
                WorkflowDetail { definition, stages }
            })
            .collect())
    }

    pub async fn get_workflow(&self, caller: &CallerContext, workflow_id: Uuid) -> Result<WorkflowDetail, AppError> {
        let definition = self
            .repo
            .find_definition(&self.pool, caller.tenant_id, workflow_id)
            .await?
            .ok_or_else(|| AppError::not_found("WorkflowDefinition", workflow_id))?;
        let stages = self.repo.list_stages(&self.pool, workflow_id).await?;

        Ok(WorkflowDetail { definition, stages })
    }

    // --- EDIÇÃO DAS ETAPAS ---

    pub async fn replace_stages(
        &self,
        caller: &CallerContext,
        workflow_id: Uuid,
        drafts: Vec<StageDraft>,
    ) -> Result<WorkflowDetail, AppError> {
        let replacement = StagePlan::from_drafts(drafts)?;
        self.edit_stages(caller, workflow_id, move |plan| {
            *plan = replacement;
            Ok(())
        })
        .await
    }

    pub async fn append_stage(
        &self,
        caller: &CallerContext,
        workflow_id: Uuid,
        draft: StageDraft,
    ) -> Result<WorkflowDetail, AppError> {
        self.edit_stages(caller, workflow_id, |plan| {
            plan.push(&draft.stage_name, draft.role_required)
        })
        .await
    }

    pub async fn remove_stage(
        &self,
        caller: &CallerContext,
        workflow_id: Uuid,
        stage_order: i32,
    ) -> Result<WorkflowDetail, AppError> {
        self.edit_stages(caller, workflow_id, |plan| plan.remove(stage_order).map(|_| ()))
            .await
    }

    pub async fn move_stage(
        &self,
        caller: &CallerContext,
        workflow_id: Uuid,
        from_order: i32,
        to_order: i32,
    ) -> Result<WorkflowDetail, AppError> {
        self.edit_stages(caller, workflow_id, |plan| plan.move_stage(from_order, to_order))
            .await
    }

    /// Lê a lista atual, aplica a edição em memória e troca tudo de uma vez.
    /// Instâncias já materializadas guardam sua própria cópia e não mudam.
    async fn edit_stages<F>(
        &self,
        caller: &CallerContext,
        workflow_id: Uuid,
        edit: F,
    ) -> Result<WorkflowDetail, AppError>
    where
        F: FnOnce(&mut StagePlan) -> Result<(), AppError>,
    {
        caller.ensure_brand_user()?;

        let mut tx = self.pool.begin().await?;

        let definition = self
            .repo
            .lock_definition(&mut *tx, caller.tenant_id, workflow_id)
            .await?
            .ok_or_else(|| AppError::not_found("WorkflowDefinition", workflow_id))?;

        let current = self.repo.list_stages(&mut *tx, workflow_id).await?;
        let mut plan = StagePlan::from_stages(&current);
        edit(&mut plan)?;

        self.repo.delete_stages(&mut *tx, workflow_id).await?;
        let stages = self.repo.insert_stages(&mut *tx, workflow_id, plan.stages()).await?;

        tx.commit().await?;

        tracing::info!(
            "Etapas do workflow {} atualizadas: {} -> {}",
            workflow_id,
            current.len(),
            stages.len()
        );

        Ok(WorkflowDetail { definition, stages })
    }
}
