// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// Taxonomia de erros do motor de workflow.
// Cada variante vira um status HTTP distinto em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    // Validação de regra de negócio que aponta um campo específico
    // (ex: comentário ausente, poste incompleto, lista de lojas vazia).
    #[error("Campo inválido '{field}': {rule}")]
    InvalidField { field: String, rule: String },

    #[error("Transição inválida de '{from}' para '{to}'")]
    InvalidTransition { from: String, to: String },

    #[error("Pré-condição não atendida em '{field}': {rule}")]
    PreconditionFailed { field: String, rule: String },

    #[error("Acesso negado: {0}")]
    Forbidden(String),

    #[error("Conflito: {0}")]
    Conflict(String),

    #[error("{entity} não encontrado: {id}")]
    ResourceNotFound { entity: &'static str, id: String },

    #[error("Token inválido")]
    InvalidToken,

    #[error("Erro de banco de dados")]
    DatabaseError(#[from] sqlx::Error),

    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    pub fn invalid_field(field: impl Into<String>, rule: impl Into<String>) -> Self {
        AppError::InvalidField { field: field.into(), rule: rule.into() }
    }

    pub fn precondition(field: impl Into<String>, rule: impl Into<String>) -> Self {
        AppError::PreconditionFailed { field: field.into(), rule: rule.into() }
    }

    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        AppError::ResourceNotFound { entity, id: id.to_string() }
    }

    /// Código estável para o frontend distinguir erros com o mesmo status
    /// (ex: CONFLICT vs INVALID_TRANSITION, ambos 409).
    pub fn code(&self) -> &'static str {
        match self {
            AppError::ValidationError(_) | AppError::InvalidField { .. } => "VALIDATION_ERROR",
            AppError::InvalidTransition { .. } => "INVALID_TRANSITION",
            AppError::PreconditionFailed { .. } => "PRECONDITION_FAILED",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::Conflict(_) => "CONFLICT",
            AppError::ResourceNotFound { .. } => "NOT_FOUND",
            AppError::InvalidToken => "INVALID_TOKEN",
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_) | AppError::InvalidField { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AppError::PreconditionFailed { .. } => StatusCode::PRECONDITION_FAILED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::ResourceNotFound { .. } => StatusCode::NOT_FOUND,
            AppError::InvalidToken => StatusCode::UNAUTHORIZED,
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte o erro de domínio em resposta HTTP traduzida para o idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let lang = locale.0.as_str();

        let (error, details) = match self {
            AppError::ValidationError(errors) => {
                let mut details = serde_json::Map::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), json!(messages));
                }
                (store.translate(lang, "validation", &[]), Some(Value::Object(details)))
            }
            AppError::InvalidField { field, rule } => (
                store.translate(lang, "invalid_field", &[("field", field.as_str())]),
                Some(json!({ "field": field, "rule": rule })),
            ),
            AppError::InvalidTransition { from, to } => (
                store.translate(lang, "invalid_transition", &[("from", from.as_str()), ("to", to.as_str())]),
                Some(json!({ "from": from, "to": to })),
            ),
            AppError::PreconditionFailed { field, rule } => (
                store.translate(lang, "precondition_failed", &[("field", field.as_str())]),
                Some(json!({ "field": field, "rule": rule })),
            ),
            AppError::Forbidden(reason) => (
                store.translate(lang, "forbidden", &[]),
                Some(json!({ "reason": reason })),
            ),
            AppError::Conflict(reason) => (
                store.translate(lang, "conflict", &[]),
                Some(json!({ "reason": reason })),
            ),
            AppError::ResourceNotFound { entity, id } => (
                store.translate(lang, "not_found", &[("entity", *entity)]),
                Some(json!({ "entity": entity, "id": id })),
            ),
            AppError::InvalidToken => (store.translate(lang, "invalid_token", &[]), None),
            // Erros internos: loga o detalhe, mas não vaza para o cliente.
            AppError::DatabaseError(_) | AppError::InternalServerError(_) => {
                tracing::error!("Erro Interno do Servidor: {:?}", self);
                (store.translate(lang, "internal", &[]), None)
            }
        };

        ApiError {
            status: self.status(),
            code: self.code(),
            error,
            details,
        }
    }
}

// Usado quando não há contexto de idioma (ex: rejeição dos guards de middleware).
impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.to_api_error(&Locale::default(), &I18nStore::default())
            .into_response()
    }
}

// O erro já traduzido, pronto para virar resposta.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.error,
            "code": self.code,
            "details": self.details,
        }));
        (self.status, body).into_response()
    }
}
