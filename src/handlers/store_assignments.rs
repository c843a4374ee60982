// src/handlers/store_assignments.rs

use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::{
        approval::{Decision, StageActionPayload, StageActionResult, StageProgressEntry},
        store_assignment::{StoreAssignmentDetail, StoreFormPayload, UpdateStatusPayload},
    },
};

// =============================================================================
//  1. TRABALHO DO FORNECEDOR
// =============================================================================

// GET /api/store-assignments/mine
#[utoipa::path(
    get,
    path = "/api/store-assignments/mine",
    tag = "Store Assignments",
    responses(
        (status = 200, description = "Lojas atribuídas ao fornecedor do token", body = Vec<StoreAssignmentDetail>),
        (status = 403, description = "Usuário não é de fornecedor")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Marca")),
    security(("api_jwt" = []))
)]
pub async fn list_my_store_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let stores = app_state
        .store_assignment_service
        .list_mine(&user.caller())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stores))
}

// GET /api/store-assignments/{id}
#[utoipa::path(
    get,
    path = "/api/store-assignments/{id}",
    tag = "Store Assignments",
    responses(
        (status = 200, description = "Loja com status de aprovação", body = StoreAssignmentDetail),
        (status = 404, description = "Loja não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Loja na Atribuição"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_store_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(store_assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .store_assignment_service
        .get_store_assignment(&user.caller(), store_assignment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(store))
}

// PATCH /api/store-assignments/{id}/status
#[utoipa::path(
    patch,
    path = "/api/store-assignments/{id}/status",
    tag = "Store Assignments",
    request_body = UpdateStatusPayload,
    responses(
        (status = 200, description = "Status avançado um passo", body = StoreAssignmentDetail),
        (status = 403, description = "Loja de outro fornecedor"),
        (status = 409, description = "Transição inválida"),
        (status = 412, description = "Imagem obrigatória ausente")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Loja na Atribuição"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_store_status(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(store_assignment_id): Path<Uuid>,
    Json(payload): Json<UpdateStatusPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .store_assignment_service
        .update_status(&user.caller(), store_assignment_id, payload.target_status)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(store))
}

// PUT /api/store-assignments/{id}/form
#[utoipa::path(
    put,
    path = "/api/store-assignments/{id}/form",
    tag = "Store Assignments",
    request_body = StoreFormPayload,
    responses(
        (status = 200, description = "Formulário gravado; status avança conforme o conteúdo", body = StoreAssignmentDetail),
        (status = 412, description = "Foto 'depois' sem foto 'antes', ou loja já concluída"),
        (status = 422, description = "Poste incompleto, GPS inválido ou medidas negativas")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Loja na Atribuição"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_store_form(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(store_assignment_id): Path<Uuid>,
    Json(payload): Json<StoreFormPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let store = app_state
        .store_assignment_service
        .update_form(&user.caller(), store_assignment_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(store))
}

// =============================================================================
//  2. PIPELINE DE APROVAÇÃO
// =============================================================================

// GET /api/store-assignments/{id}/approvals
#[utoipa::path(
    get,
    path = "/api/store-assignments/{id}/approvals",
    tag = "Approvals",
    responses((status = 200, description = "Etapas em ordem com canApprove/canReject", body = Vec<StageProgressEntry>)),
    params(
        ("id" = Uuid, Path, description = "ID da Loja na Atribuição"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_approval_progress(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(store_assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = app_state
        .approval_service
        .progress(&user.caller(), store_assignment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(progress))
}

async fn decide(
    app_state: AppState,
    locale: Locale,
    user: AuthenticatedUser,
    store_assignment_id: Uuid,
    workflow_stage_id: Uuid,
    decision: Decision,
    payload: StageActionPayload,
) -> Result<Json<StageActionResult>, ApiError> {
    let result = app_state
        .approval_service
        .decide(
            &user.caller(),
            store_assignment_id,
            workflow_stage_id,
            decision,
            payload.comment.as_deref(),
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(result))
}

// POST /api/store-assignments/{id}/stages/{stageId}/approve
#[utoipa::path(
    post,
    path = "/api/store-assignments/{id}/stages/{stage_id}/approve",
    tag = "Approvals",
    request_body = StageActionPayload,
    responses(
        (status = 200, description = "Etapa aprovada; a próxima é ativada", body = StageActionResult),
        (status = 403, description = "Cargo diferente do exigido pela etapa"),
        (status = 409, description = "Etapa não está ativa ou já foi decidida"),
        (status = 422, description = "Comentário obrigatório")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Loja na Atribuição"),
        ("stage_id" = Uuid, Path, description = "ID da Etapa do Workflow"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn approve_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((store_assignment_id, workflow_stage_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StageActionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    decide(app_state, locale, user, store_assignment_id, workflow_stage_id, Decision::Approve, payload).await
}

// POST /api/store-assignments/{id}/stages/{stageId}/reject
#[utoipa::path(
    post,
    path = "/api/store-assignments/{id}/stages/{stage_id}/reject",
    tag = "Approvals",
    request_body = StageActionPayload,
    responses(
        (status = 200, description = "Etapa rejeitada; o pipeline para", body = StageActionResult),
        (status = 403, description = "Cargo diferente do exigido pela etapa"),
        (status = 409, description = "Etapa não está ativa ou já foi decidida"),
        (status = 422, description = "Comentário obrigatório")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Loja na Atribuição"),
        ("stage_id" = Uuid, Path, description = "ID da Etapa do Workflow"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn reject_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((store_assignment_id, workflow_stage_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<StageActionPayload>,
) -> Result<impl IntoResponse, ApiError> {
    decide(app_state, locale, user, store_assignment_id, workflow_stage_id, Decision::Reject, payload).await
}
