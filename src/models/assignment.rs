// src/models/assignment.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::models::store_assignment::{StoreAssignment, VendorWorkStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum AssignmentStatus {
    Active,
    Completed,
    Cancelled,
}

/// Linha crua com as contagens calculadas pela query.
/// `total_stores` e `completed_stores` nunca são colunas gravadas.
#[derive(Debug, Clone, FromRow)]
pub struct AssignmentRow {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub description: Option<String>,
    pub vendor_id: Uuid,
    pub workflow_definition_id: Uuid,
    pub assigned_by: Uuid,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub created_dt: DateTime<Utc>,
    pub updated_dt: DateTime<Utc>,
    pub total_stores: i64,
    pub completed_stores: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub id: Uuid,
    #[schema(ignore)]
    pub tenant_id: Uuid,
    #[schema(example = "Campanha Verão 2026")]
    pub name: String,
    pub description: Option<String>,
    pub vendor_id: Uuid,
    pub workflow_definition_id: Uuid,
    pub assigned_by: Uuid,
    pub status: AssignmentStatus,
    #[schema(example = 2)]
    pub total_stores: i64,
    #[schema(example = 1)]
    pub completed_stores: i64,
    #[schema(example = 50.0)]
    pub progress_percent: f64,
    pub created_dt: DateTime<Utc>,
    pub updated_dt: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct VendorStatusCount {
    pub status: VendorWorkStatus,
    pub count: i64,
}

// Atribuição + lojas, usada na tela de detalhe.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    #[serde(flatten)]
    pub assignment: Assignment,
    pub stores: Vec<StoreAssignment>,
    pub vendor_status_breakdown: Vec<VendorStatusCount>,
}

/// Contagem por status de uma etapa, somando todas as lojas da atribuição.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageProgress {
    pub stage_order: i32,
    pub stage_name: String,
    pub role_required: Uuid,
    pub is_final_stage: bool,
    pub pending: i64,
    pub in_progress: i64,
    pub completed: i64,
    pub rejected: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowProgress {
    pub assignment_id: Uuid,
    pub total_stores: i64,
    /// Lojas cujo trabalho de campo ainda não foi concluído (sem pipeline).
    pub awaiting_vendor: i64,
    pub completed_stores: i64,
    pub stages: Vec<StageProgress>,
}

// --- Entrada ---

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAssignmentPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    #[schema(example = "Campanha Verão 2026")]
    pub name: String,

    pub description: Option<String>,

    pub vendor_id: Uuid,

    pub workflow_definition_id: Uuid,

    #[validate(length(min = 1, message = "at least one store is required"))]
    pub store_ids: Vec<Uuid>,
}
