// src/db/store_assignment_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::store_assignment::{StoreAssignment, StoreAssignmentOwner, VendorWorkStatus},
};

const OWNER_SELECT: &str = r#"
    SELECT
        a.tenant_id,
        a.vendor_id,
        a.workflow_definition_id
    FROM store_assignments sa
    JOIN assignments a ON a.id = sa.assignment_id
    WHERE sa.id = $1
"#;

#[derive(Clone)]
pub struct StoreAssignmentRepository {
    pool: PgPool,
}

impl StoreAssignmentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn find_owner<'e, E>(
        &self,
        executor: E,
        store_assignment_id: Uuid,
    ) -> Result<Option<StoreAssignmentOwner>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let owner = sqlx::query_as::<_, StoreAssignmentOwner>(OWNER_SELECT)
            .bind(store_assignment_id)
            .fetch_optional(executor)
            .await?;

        Ok(owner)
    }

    /// Trava a linha da loja até o fim da transação.
    /// Toda escrita no trabalho do fornecedor ou no pipeline passa por aqui.
    pub async fn find_owner_for_update<'e, E>(
        &self,
        executor: E,
        store_assignment_id: Uuid,
    ) -> Result<Option<StoreAssignmentOwner>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let owner = sqlx::query_as::<_, StoreAssignmentOwner>(&format!("{OWNER_SELECT} FOR UPDATE OF sa"))
            .bind(store_assignment_id)
            .fetch_optional(executor)
            .await?;

        Ok(owner)
    }

    pub async fn get<'e, E>(&self, executor: E, store_assignment_id: Uuid) -> Result<Option<StoreAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let record = sqlx::query_as::<_, StoreAssignment>("SELECT * FROM store_assignments WHERE id = $1")
            .bind(store_assignment_id)
            .fetch_optional(executor)
            .await?;

        Ok(record)
    }

    pub async fn list_by_assignment<'e, E>(
        &self,
        executor: E,
        assignment_id: Uuid,
    ) -> Result<Vec<StoreAssignment>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let stores = sqlx::query_as::<_, StoreAssignment>(
            "SELECT * FROM store_assignments WHERE assignment_id = $1 ORDER BY created_at, store_id",
        )
        .bind(assignment_id)
        .fetch_all(executor)
        .await?;

        Ok(stores)
    }

    pub async fn list_for_vendor(&self, tenant_id: Uuid, vendor_id: Uuid) -> Result<Vec<StoreAssignment>, AppError> {
        let stores = sqlx::query_as::<_, StoreAssignment>(
            r#"
            SELECT sa.*
            FROM store_assignments sa
            JOIN assignments a ON a.id = sa.assignment_id
            WHERE a.tenant_id = $1 AND a.vendor_id = $2
            ORDER BY sa.updated_at DESC
            "#,
        )
        .bind(tenant_id)
        .bind(vendor_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(stores)
    }

    /// Grava o registro inteiro, desde que o status no banco ainda seja `expected`.
    /// Se outra escrita passou na frente, devolve `Conflict`.
    pub async fn save<'e, E>(
        &self,
        executor: E,
        record: &StoreAssignment,
        expected: VendorWorkStatus,
    ) -> Result<StoreAssignment, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let saved = sqlx::query_as::<_, StoreAssignment>(
            r#"
            UPDATE store_assignments SET
                vendor_work_status = $3,
                board_id = $4, board_width = $5, board_height = $6, board_cost = $7,
                pole_quantity = $8, pole_width = $9, pole_height = $10, pole_cost = $11,
                banner_image_url = $12, before_image_url = $13, after_image_url = $14,
                gps_location = $15, vendor_notes = $16,
                started_date = $17, before_execution_date = $18,
                after_execution_date = $19, completed_date = $20,
                updated_at = NOW()
            WHERE id = $1 AND vendor_work_status = $2
            RETURNING *
            "#,
        )
        .bind(record.id)
        .bind(expected)
        .bind(record.vendor_work_status)
        .bind(record.board_id)
        .bind(record.board_width)
        .bind(record.board_height)
        .bind(record.board_cost)
        .bind(record.pole_quantity)
        .bind(record.pole_width)
        .bind(record.pole_height)
        .bind(record.pole_cost)
        .bind(&record.banner_image_url)
        .bind(&record.before_image_url)
        .bind(&record.after_image_url)
        .bind(&record.gps_location)
        .bind(&record.vendor_notes)
        .bind(record.started_date)
        .bind(record.before_execution_date)
        .bind(record.after_execution_date)
        .bind(record.completed_date)
        .fetch_optional(executor)
        .await?;

        saved.ok_or_else(|| {
            AppError::Conflict(format!(
                "store assignment {} changed while it was being updated",
                record.id
            ))
        })
    }
}
