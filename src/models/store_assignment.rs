// src/models/store_assignment.rs

use std::fmt;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::approval::StageProgressEntry;

// --- Enums ---

/// Ciclo de vida fixo do trabalho do fornecedor em uma loja.
/// A ordem das variantes é a ordem das transições.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "vendor_work_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VendorWorkStatus {
    Pending,
    Started,
    #[serde(rename = "Before Execution")]
    BeforeExecution,
    #[serde(rename = "After Execution")]
    AfterExecution,
    Completed,
}

impl VendorWorkStatus {
    pub const ALL: [VendorWorkStatus; 5] = [
        VendorWorkStatus::Pending,
        VendorWorkStatus::Started,
        VendorWorkStatus::BeforeExecution,
        VendorWorkStatus::AfterExecution,
        VendorWorkStatus::Completed,
    ];

    /// Próximo estado permitido; `None` quando já concluído.
    pub fn next(self) -> Option<VendorWorkStatus> {
        match self {
            VendorWorkStatus::Pending => Some(VendorWorkStatus::Started),
            VendorWorkStatus::Started => Some(VendorWorkStatus::BeforeExecution),
            VendorWorkStatus::BeforeExecution => Some(VendorWorkStatus::AfterExecution),
            VendorWorkStatus::AfterExecution => Some(VendorWorkStatus::Completed),
            VendorWorkStatus::Completed => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            VendorWorkStatus::Pending => "Pending",
            VendorWorkStatus::Started => "Started",
            VendorWorkStatus::BeforeExecution => "Before Execution",
            VendorWorkStatus::AfterExecution => "After Execution",
            VendorWorkStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for VendorWorkStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// --- Registro por loja ---

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreAssignment {
    pub id: Uuid,
    pub assignment_id: Uuid,
    pub store_id: Uuid,
    pub vendor_work_status: VendorWorkStatus,

    // Especificação da placa
    pub board_id: Option<Uuid>,
    #[schema(example = "3.50")]
    pub board_width: Option<Decimal>,
    #[schema(example = "1.20")]
    pub board_height: Option<Decimal>,
    #[schema(example = "850.00")]
    pub board_cost: Option<Decimal>,

    // Poste: ou os quatro campos estão preenchidos, ou nenhum
    #[schema(example = 2)]
    pub pole_quantity: Option<i32>,
    pub pole_width: Option<Decimal>,
    pub pole_height: Option<Decimal>,
    pub pole_cost: Option<Decimal>,

    pub banner_image_url: Option<String>,
    pub before_image_url: Option<String>,
    pub after_image_url: Option<String>,

    /// Persistido sempre como `endereço|lat|lng`.
    #[schema(example = "Av. Paulista, 1000|-23.5614|-46.6559")]
    pub gps_location: Option<String>,
    pub vendor_notes: Option<String>,

    pub started_date: Option<DateTime<Utc>>,
    pub before_execution_date: Option<DateTime<Utc>>,
    pub after_execution_date: Option<DateTime<Utc>>,
    pub completed_date: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Dono da linha, usado para checar fornecedor/tenant antes de qualquer escrita.
#[derive(Debug, Clone, FromRow)]
pub struct StoreAssignmentOwner {
    pub tenant_id: Uuid,
    pub vendor_id: Uuid,
    pub workflow_definition_id: Uuid,
}

// Resposta com os campos derivados calculados na leitura.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreAssignmentDetail {
    #[serde(flatten)]
    pub record: StoreAssignment,
    #[schema(example = "Pending BDM Approved")]
    pub approval_status: String,
    pub approval_stages: Vec<StageProgressEntry>,
}

// --- Entrada do formulário do fornecedor ---

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BoardSpec {
    pub board_id: Uuid,
    #[schema(example = "3.50")]
    pub board_width: Decimal,
    #[schema(example = "1.20")]
    pub board_height: Decimal,
    #[schema(example = "850.00")]
    pub board_cost: Decimal,
}

/// Poste como chega do cliente: campos soltos, validados em conjunto.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PoleSpecInput {
    pub pole_quantity: Option<i32>,
    pub pole_width: Option<Decimal>,
    pub pole_height: Option<Decimal>,
    pub pole_cost: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoleSpec {
    pub quantity: i32,
    pub width: Decimal,
    pub height: Decimal,
    pub cost: Decimal,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ImageUrls {
    pub banner_image_url: Option<String>,
    pub before_image_url: Option<String>,
    pub after_image_url: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coords {
    #[schema(example = -23.5614)]
    pub lat: f64,
    #[schema(example = -46.6559)]
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GpsLocation {
    #[schema(example = "Av. Paulista, 1000")]
    pub address: String,
    pub coords: Coords,
}

/// A localização pode chegar já codificada (`endereço|lat|lng`) ou estruturada.
#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum GpsInput {
    Encoded(String),
    Structured(GpsLocation),
}

#[derive(Debug, Clone, PartialEq, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct StoreFormPayload {
    pub board: BoardSpec,
    #[serde(default)]
    pub pole: Option<PoleSpecInput>,
    #[serde(default)]
    pub images: Option<ImageUrls>,
    #[serde(default)]
    pub gps_location: Option<GpsInput>,
    #[schema(example = "Fachada com acesso restrito pela manhã")]
    #[serde(default)]
    pub notes: Option<String>,
}

/// Formulário já validado na fronteira; o motor só recebe dados consistentes.
#[derive(Debug, Clone, PartialEq)]
pub struct StoreForm {
    pub board: BoardSpec,
    pub pole: Option<PoleSpec>,
    pub images: ImageUrls,
    pub gps_location: Option<GpsLocation>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateStatusPayload {
    #[schema(example = "Completed")]
    pub target_status: VendorWorkStatus,
}
