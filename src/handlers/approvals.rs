// src/handlers/approvals.rs

use axum::{extract::State, response::IntoResponse, Json};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::approval::PendingApproval,
};

// GET /api/approvals/pending
#[utoipa::path(
    get,
    path = "/api/approvals/pending",
    tag = "Approvals",
    responses(
        (status = 200, description = "Etapas ativas que o cargo do token pode decidir", body = Vec<PendingApproval>),
        (status = 403, description = "Usuário de fornecedor")
    ),
    params(("x-tenant-id" = uuid::Uuid, Header, description = "ID da Marca")),
    security(("api_jwt" = []))
)]
pub async fn list_pending_approvals(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let pending = app_state
        .approval_service
        .pending_for_caller(&user.caller())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pending))
}
