// src/db/assignment_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::{assignment::AssignmentRow, store_assignment::StoreAssignment},
};

// As contagens são calculadas aqui, a cada leitura.
// "Concluída" = a instância da etapa final está COMPLETED.
const ASSIGNMENT_SELECT: &str = r#"
    SELECT
        a.id, a.tenant_id, a.name, a.description, a.vendor_id,
        a.workflow_definition_id, a.assigned_by, a.cancelled_at,
        a.created_dt, a.updated_dt,
        (
            SELECT COUNT(*) FROM store_assignments sa
            WHERE sa.assignment_id = a.id
        ) AS total_stores,
        (
            SELECT COUNT(*) FROM store_assignments sa
            JOIN approval_stage_instances i ON i.store_assignment_id = sa.id
            WHERE sa.assignment_id = a.id
              AND i.is_final_stage
              AND i.status = 'COMPLETED'
        ) AS completed_stores
    FROM assignments a
"#;

#[derive(Clone)]
pub struct AssignmentRepository {
    pool: PgPool,
}

impl AssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_assignment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        name: &str,
        description: Option<&str>,
        vendor_id: Uuid,
        workflow_definition_id: Uuid,
        assigned_by: Uuid,
    ) -> Result<Uuid, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO assignments (
                tenant_id, name, description, vendor_id, workflow_definition_id, assigned_by
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(name)
        .bind(description)
        .bind(vendor_id)
        .bind(workflow_definition_id)
        .bind(assigned_by)
        .fetch_one(executor)
        .await?;

        Ok(id)
    }

    // Uma linha por loja, todas começando em PENDING.
    pub async fn insert_store_assignments<'e, E>(
        &self,
        executor: E,
        assignment_id: Uuid,
        store_ids: &[Uuid],
    ) -> Result<Vec<StoreAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stores = sqlx::query_as::<_, StoreAssignment>(
            r#"
            INSERT INTO store_assignments (assignment_id, store_id)
            SELECT $1, unnest($2::uuid[])
            RETURNING *
            "#,
        )
        .bind(assignment_id)
        .bind(store_ids)
        .fetch_all(executor)
        .await?;

        Ok(stores)
    }

    pub async fn find_assignment<'e, E>(
        &self,
        executor: E,
        tenant_id: Uuid,
        assignment_id: Uuid,
    ) -> Result<Option<AssignmentRow>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let row = sqlx::query_as::<_, AssignmentRow>(&format!(
            "{ASSIGNMENT_SELECT} WHERE a.tenant_id = $1 AND a.id = $2"
        ))
        .bind(tenant_id)
        .bind(assignment_id)
        .fetch_optional(executor)
        .await?;

        Ok(row)
    }

    /// Lista as atribuições do tenant; com `vendor_id`, só as daquele fornecedor.
    pub async fn list_assignments(
        &self,
        tenant_id: Uuid,
        vendor_id: Option<Uuid>,
    ) -> Result<Vec<AssignmentRow>, AppError> {
        let rows = sqlx::query_as::<_, AssignmentRow>(&format!(
            r#"{ASSIGNMENT_SELECT}
            WHERE a.tenant_id = $1 AND ($2::uuid IS NULL OR a.vendor_id = $2)
            ORDER BY a.created_dt DESC"#
        ))
        .bind(tenant_id)
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}
