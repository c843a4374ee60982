// src/db/workflow_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::workflow::{PlannedStage, WorkflowDefinition, WorkflowStage},
};

const STAGE_COLUMNS: &str = "id, workflow_id, stage_name, stage_order, role_required, is_final_stage";

#[derive(Clone)]
pub struct WorkflowRepository {
    pool: PgPool,
}

impl WorkflowRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // =========================================================================
    //  DEFINIÇÕES
    // =========================================================================

    pub async fn create_definition<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        description: Option<&str>,
    ) -> Result<WorkflowDefinition, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let definition = sqlx::query_as::<_, WorkflowDefinition>(
            r#"
            INSERT INTO workflow_definitions (tenant_id, name, description)
            VALUES ($1, $2, $3)
            RETURNING id, tenant_id, name, description, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .fetch_one(executor)
        .await?;

        Ok(definition)
    }

    pub async fn find_definition<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workflow_id: Uuid,
    ) -> Result<Option<WorkflowDefinition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let definition = sqlx::query_as::<_, WorkflowDefinition>(
            r#"
            SELECT id, tenant_id, name, description, created_at, updated_at
            FROM workflow_definitions
            WHERE tenant_id = $1 AND id = $2
            "#,
        )
        .bind(tenant_id)
        .bind(workflow_id)
        .fetch_optional(executor)
        .await?;

        Ok(definition)
    }

    // Trava a definição para serializar edições concorrentes das etapas.
    pub async fn lock_definition<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        workflow_id: Uuid,
    ) -> Result<Option<WorkflowDefinition>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let definition = sqlx::query_as::<_, WorkflowDefinition>(
            r#"
            UPDATE workflow_definitions
            SET updated_at = NOW()
            WHERE tenant_id = $1 AND id = $2
            RETURNING id, tenant_id, name, description, created_at, updated_at
            "#,
        )
        .bind(tenant_id)
        .bind(workflow_id)
        .fetch_optional(executor)
        .await?;

        Ok(definition)
    }

    pub async fn list_definitions(&self, tenant_id: Uuid) -> Result<Vec<WorkflowDefinition>, AppError> {
        let definitions = sqlx::query_as::<_, WorkflowDefinition>(
            r#"
            SELECT id, tenant_id, name, description, created_at, updated_at
            FROM workflow_definitions
            WHERE tenant_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(tenant_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(definitions)
    }

    // =========================================================================
    //  ETAPAS
    // =========================================================================

    pub async fn list_stages<'e, E>(
        &self,
        executor: E,
        workflow_id: Uuid,
    ) -> Result<Vec<WorkflowStage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stages = sqlx::query_as::<_, WorkflowStage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM workflow_stages WHERE workflow_id = $1 ORDER BY stage_order"
        ))
        .bind(workflow_id)
        .fetch_all(executor)
        .await?;

        Ok(stages)
    }

    pub async fn list_stages_for(&self, workflow_ids: &[Uuid]) -> Result<Vec<WorkflowStage>, AppError> {
        let stages = sqlx::query_as::<_, WorkflowStage>(&format!(
            "SELECT {STAGE_COLUMNS} FROM workflow_stages WHERE workflow_id = ANY($1) ORDER BY workflow_id, stage_order"
        ))
        .bind(workflow_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(stages)
    }

    pub async fn delete_stages<'e, E>(&self, executor: E, workflow_id: Uuid) -> Result<u64, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM workflow_stages WHERE workflow_id = $1")
            .bind(workflow_id)
            .execute(executor)
            .await?;

        Ok(result.rows_affected())
    }

    // Inserção em massa usando UNNEST
    pub async fn insert_stages<'e, E>(
        &self,
        executor: E,
        workflow_id: Uuid,
        stages: &[PlannedStage],
    ) -> Result<Vec<WorkflowStage>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let names: Vec<String> = stages.iter().map(|s| s.stage_name.clone()).collect();
        let orders: Vec<i32> = stages.iter().map(|s| s.stage_order).collect();
        let roles: Vec<Uuid> = stages.iter().map(|s| s.role_required).collect();
        let finals: Vec<bool> = stages.iter().map(|s| s.is_final_stage).collect();

        let mut inserted = sqlx::query_as::<_, WorkflowStage>(&format!(
            r#"
            INSERT INTO workflow_stages (workflow_id, stage_name, stage_order, role_required, is_final_stage)
            SELECT $1, * FROM UNNEST($2::text[], $3::int4[], $4::uuid[], $5::bool[])
            RETURNING {STAGE_COLUMNS}
            "#
        ))
        .bind(workflow_id)
        .bind(&names)
        .bind(&orders)
        .bind(&roles)
        .bind(&finals)
        .fetch_all(executor)
        .await?;

        inserted.sort_by_key(|s| s.stage_order);
        Ok(inserted)
    }
}
