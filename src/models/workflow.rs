// src/models/workflow.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

// --- Template de aprovação (reutilizável entre atribuições) ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDefinition {
    #[schema(example = "550e8400-e29b-41d4-a716-446655440000")]
    pub id: Uuid,
    #[schema(ignore)] // Vem do token, não faz parte do contrato público
    pub tenant_id: Uuid,
    #[schema(example = "Aprovação padrão de fachada")]
    pub name: String,
    #[schema(example = "BDE -> BDM -> HO -> Pagamento")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStage {
    pub id: Uuid,
    pub workflow_id: Uuid,
    #[schema(example = "BDM Approved")]
    pub stage_name: String,
    #[schema(example = 2)]
    pub stage_order: i32,
    /// Cargo autorizado a aprovar/rejeitar esta etapa.
    pub role_required: Uuid,
    pub is_final_stage: bool,
}

// Definição + etapas ordenadas, como o frontend consome.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowDetail {
    #[serde(flatten)]
    pub definition: WorkflowDefinition,
    pub stages: Vec<WorkflowStage>,
}

// --- Entrada ---

/// Uma etapa como o administrador a descreve. A ordem é opcional e apenas
/// sugere a posição: o servidor sempre renumera para 1..N e recalcula a etapa final.
#[derive(Debug, Clone, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageDraft {
    #[validate(length(min = 1, max = 120, message = "required"))]
    #[schema(example = "BDE Approved")]
    pub stage_name: String,

    pub role_required: Uuid,

    #[schema(example = 1)]
    pub stage_order: Option<i32>,
}

/// Etapa já normalizada, pronta para ser gravada.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedStage {
    pub stage_name: String,
    pub stage_order: i32,
    pub role_required: Uuid,
    pub is_final_stage: bool,
}
