// src/db/approval_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::approval::{ApprovalStageInstance, PendingApproval},
};

const INSTANCE_COLUMNS: &str = r#"
    id, store_assignment_id, workflow_stage_id, stage_name, stage_order,
    is_final_stage, role_required, status, actioned_by, actioned_by_role,
    action, comment, started_at, completed_at
"#;

#[derive(Clone)]
pub struct ApprovalRepository {
    pool: PgPool,
}

impl ApprovalRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list_for_store<'e, E>(
        &self,
        executor: E,
        store_assignment_id: Uuid,
    ) -> Result<Vec<ApprovalStageInstance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let instances = sqlx::query_as::<_, ApprovalStageInstance>(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM approval_stage_instances WHERE store_assignment_id = $1 ORDER BY stage_order"
        ))
        .bind(store_assignment_id)
        .fetch_all(executor)
        .await?;

        Ok(instances)
    }

    pub async fn list_for_stores(&self, store_assignment_ids: &[Uuid]) -> Result<Vec<ApprovalStageInstance>, AppError> {
        let instances = sqlx::query_as::<_, ApprovalStageInstance>(&format!(
            "SELECT {INSTANCE_COLUMNS} FROM approval_stage_instances WHERE store_assignment_id = ANY($1) ORDER BY store_assignment_id, stage_order"
        ))
        .bind(store_assignment_ids)
        .fetch_all(&self.pool)
        .await?;

        Ok(instances)
    }

    pub async fn list_for_assignment<'e, E>(
        &self,
        executor: E,
        assignment_id: Uuid,
    ) -> Result<Vec<ApprovalStageInstance>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let instances = sqlx::query_as::<_, ApprovalStageInstance>(&format!(
            r#"
            SELECT {INSTANCE_COLUMNS}
            FROM approval_stage_instances
            WHERE store_assignment_id IN (
                SELECT id FROM store_assignments WHERE assignment_id = $1
            )
            ORDER BY store_assignment_id, stage_order
            "#
        ))
        .bind(assignment_id)
        .fetch_all(executor)
        .await?;

        Ok(instances)
    }

    pub async fn insert_instance<'e, E>(
        &self,
        executor: E,
        instance: &ApprovalStageInstance,
    ) -> Result<ApprovalStageInstance, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let inserted = sqlx::query_as::<_, ApprovalStageInstance>(&format!(
            r#"
            INSERT INTO approval_stage_instances (
                id, store_assignment_id, workflow_stage_id, stage_name, stage_order,
                is_final_stage, role_required, status, started_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {INSTANCE_COLUMNS}
            "#
        ))
        .bind(instance.id)
        .bind(instance.store_assignment_id)
        .bind(instance.workflow_stage_id)
        .bind(&instance.stage_name)
        .bind(instance.stage_order)
        .bind(instance.is_final_stage)
        .bind(instance.role_required)
        .bind(instance.status)
        .bind(instance.started_at)
        .fetch_one(executor)
        .await?;

        Ok(inserted)
    }

    /// Grava a decisão somente se a etapa ainda estiver ativa e sem autor.
    /// Zero linhas afetadas significa que alguém decidiu antes: `Conflict`.
    pub async fn record_action<'e, E>(
        &self,
        executor: E,
        instance: &ApprovalStageInstance,
    ) -> Result<ApprovalStageInstance, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, ApprovalStageInstance>(&format!(
            r#"
            UPDATE approval_stage_instances SET
                status = $2,
                action = $3,
                actioned_by = $4,
                actioned_by_role = $5,
                comment = $6,
                completed_at = $7
            WHERE id = $1 AND status = 'IN_PROGRESS' AND actioned_by IS NULL
            RETURNING {INSTANCE_COLUMNS}
            "#
        ))
        .bind(instance.id)
        .bind(instance.status)
        .bind(instance.action)
        .bind(instance.actioned_by)
        .bind(instance.actioned_by_role)
        .bind(&instance.comment)
        .bind(instance.completed_at)
        .fetch_optional(executor)
        .await?;

        updated.ok_or_else(|| {
            AppError::Conflict(format!("stage '{}' was already actioned", instance.stage_name))
        })
    }

    pub async fn activate<'e, E>(
        &self,
        executor: E,
        instance: &ApprovalStageInstance,
    ) -> Result<ApprovalStageInstance, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let updated = sqlx::query_as::<_, ApprovalStageInstance>(&format!(
            r#"
            UPDATE approval_stage_instances
            SET status = 'IN_PROGRESS', started_at = $2
            WHERE id = $1 AND status = 'PENDING'
            RETURNING {INSTANCE_COLUMNS}
            "#
        ))
        .bind(instance.id)
        .bind(instance.started_at)
        .fetch_optional(executor)
        .await?;

        updated.ok_or_else(|| {
            AppError::Conflict(format!("stage '{}' is no longer pending", instance.stage_name))
        })
    }

    /// Etapas ativas que o cargo informado pode decidir, dentro do tenant.
    pub async fn list_pending_for_role(
        &self,
        tenant_id: Uuid,
        role_id: Uuid,
    ) -> Result<Vec<PendingApproval>, AppError> {
        let pending = sqlx::query_as::<_, PendingApproval>(
            r#"
            SELECT
                sa.id AS store_assignment_id,
                a.id AS assignment_id,
                a.name AS assignment_name,
                sa.store_id,
                a.vendor_id,
                i.workflow_stage_id,
                i.stage_name,
                i.stage_order,
                i.started_at
            FROM approval_stage_instances i
            JOIN store_assignments sa ON sa.id = i.store_assignment_id
            JOIN assignments a ON a.id = sa.assignment_id
            WHERE a.tenant_id = $1
              AND i.role_required = $2
              AND i.status = 'IN_PROGRESS'
              AND i.actioned_by IS NULL
            ORDER BY i.started_at NULLS LAST, sa.id
            "#,
        )
        .bind(tenant_id)
        .bind(role_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(pending)
    }
}

// Precisam de DATABASE_URL apontando para um Postgres descartável.
#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::Utc;

    use crate::{
        engine::pipeline::{self, tests::{caller_with_role, template}},
        models::approval::{Decision, StageStatus},
    };

    pub(crate) struct SeededStore {
        pub tenant_id: Uuid,
        pub store_assignment_id: Uuid,
        pub instances: Vec<ApprovalStageInstance>,
    }

    /// Loja já concluída pelo fornecedor, com o pipeline materializado.
    pub(crate) async fn seed_completed_store(pool: &PgPool, roles: &[Uuid]) -> SeededStore {
        let tenant_id = Uuid::new_v4();

        let workflow_id: Uuid = sqlx::query_scalar(
            "INSERT INTO workflow_definitions (tenant_id, name) VALUES ($1, 'Fachada') RETURNING id",
        )
        .bind(tenant_id)
        .fetch_one(pool)
        .await
        .unwrap();

        let assignment_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO assignments (tenant_id, name, vendor_id, workflow_definition_id, assigned_by)
            VALUES ($1, 'Campanha Verão', $2, $3, $4)
            RETURNING id
            "#,
        )
        .bind(tenant_id)
        .bind(Uuid::new_v4())
        .bind(workflow_id)
        .bind(Uuid::new_v4())
        .fetch_one(pool)
        .await
        .unwrap();

        let store_assignment_id: Uuid = sqlx::query_scalar(
            r#"
            INSERT INTO store_assignments
                (assignment_id, store_id, vendor_work_status, before_image_url, after_image_url)
            VALUES ($1, $2, 'COMPLETED', 'https://cdn/antes.jpg', 'https://cdn/depois.jpg')
            RETURNING id
            "#,
        )
        .bind(assignment_id)
        .bind(Uuid::new_v4())
        .fetch_one(pool)
        .await
        .unwrap();

        let repo = ApprovalRepository::new(pool.clone());
        let mut instances = Vec::new();
        for instance in pipeline::materialize(store_assignment_id, &template(roles), Utc::now()).unwrap() {
            instances.push(repo.insert_instance(pool, &instance).await.unwrap());
        }

        SeededStore {
            tenant_id,
            store_assignment_id,
            instances,
        }
    }

    #[sqlx::test]
    #[ignore = "Requires database setup"]
    async fn second_write_of_the_same_decision_is_a_conflict(pool: PgPool) {
        let roles = [Uuid::new_v4(), Uuid::new_v4()];
        let seeded = seed_completed_store(&pool, &roles).await;
        let repo = ApprovalRepository::new(pool.clone());

        let mut instances = seeded.instances.clone();
        let first_stage = instances[0].workflow_stage_id;
        let result = pipeline::act(
            &mut instances,
            first_stage,
            &caller_with_role(roles[0]),
            Decision::Approve,
            Some("ok"),
            Utc::now(),
        )
        .unwrap();

        let stored = repo.record_action(&pool, &result.actioned).await.unwrap();
        assert_eq!(stored.status, StageStatus::Completed);

        let err = repo.record_action(&pool, &result.actioned).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let reloaded = repo.list_for_store(&pool, seeded.store_assignment_id).await.unwrap();
        assert_eq!(reloaded[0].actioned_by, result.actioned.actioned_by);
    }

    #[sqlx::test]
    #[ignore = "Requires database setup"]
    async fn only_one_stage_can_be_active_per_store(pool: PgPool) {
        let roles = [Uuid::new_v4(), Uuid::new_v4()];
        let seeded = seed_completed_store(&pool, &roles).await;
        let repo = ApprovalRepository::new(pool.clone());

        let mut second = seeded.instances[1].clone();
        second.started_at = Some(Utc::now());

        // A primeira etapa ainda está ativa: o índice parcial recusa a segunda.
        assert!(repo.activate(&pool, &second).await.is_err());
    }
}
