// src/models/approval.rs

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stage_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageStatus {
    Pending,
    #[serde(rename = "In Progress")]
    InProgress,
    Completed,
    Rejected,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageStatus::Pending => "Pending",
            StageStatus::InProgress => "In Progress",
            StageStatus::Completed => "Completed",
            StageStatus::Rejected => "Rejected",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "stage_action", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StageAction {
    Approved,
    Rejected,
}

/// Instância de uma etapa do template para uma loja específica.
/// Nome, ordem, cargo e flag final são uma cópia do template no momento da
/// materialização: edições posteriores no template não afetam esta linha.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ApprovalStageInstance {
    pub id: Uuid,
    pub store_assignment_id: Uuid,
    pub workflow_stage_id: Uuid,
    #[schema(example = "BDE Approved")]
    pub stage_name: String,
    #[schema(example = 1)]
    pub stage_order: i32,
    pub is_final_stage: bool,
    pub role_required: Uuid,
    pub status: StageStatus,
    pub actioned_by: Option<Uuid>,
    pub actioned_by_role: Option<Uuid>,
    pub action: Option<StageAction>,
    pub comment: Option<String>,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
}

// Linha do progresso com os predicados calculados para quem consulta.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageProgressEntry {
    #[serde(flatten)]
    pub instance: ApprovalStageInstance,
    pub can_approve: bool,
    pub can_reject: bool,
}

/// Rótulo derivado exibido na listagem de lojas.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApprovalStatus {
    AwaitingVendor,
    Pending { stage_name: String },
    Rejected { stage_name: String },
    Approved,
}

impl fmt::Display for ApprovalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApprovalStatus::AwaitingVendor => f.write_str("Awaiting Vendor"),
            ApprovalStatus::Pending { stage_name } => write!(f, "Pending {}", stage_name),
            ApprovalStatus::Rejected { stage_name } => write!(f, "Rejected at {}", stage_name),
            ApprovalStatus::Approved => f.write_str("Approved"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Approve,
    Reject,
}

// Payload de aprovar/rejeitar. O comentário é obrigatório.
#[derive(Debug, Clone, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageActionPayload {
    #[schema(example = "Fachada conforme o manual da marca")]
    pub comment: Option<String>,
}

/// Resultado de uma ação: a etapa tratada e, se houver, a próxima ativada.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StageActionResult {
    pub actioned: ApprovalStageInstance,
    pub activated: Option<ApprovalStageInstance>,
    pub fully_approved: bool,
}

// Item da caixa de entrada do aprovador.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PendingApproval {
    pub store_assignment_id: Uuid,
    pub assignment_id: Uuid,
    #[schema(example = "Campanha Verão 2026")]
    pub assignment_name: String,
    pub store_id: Uuid,
    pub vendor_id: Uuid,
    pub workflow_stage_id: Uuid,
    pub stage_name: String,
    pub stage_order: i32,
    pub started_at: Option<DateTime<Utc>>,
}
