// src/handlers/assignments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::assignment::{Assignment, AssignmentDetail, CreateAssignmentPayload, WorkflowProgress},
};

// POST /api/assignments
#[utoipa::path(
    post,
    path = "/api/assignments",
    tag = "Assignments",
    request_body = CreateAssignmentPayload,
    responses(
        (status = 201, description = "Atribuição criada, lojas em Pending", body = AssignmentDetail),
        (status = 422, description = "Sem lojas ou workflow desconhecido")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Marca")),
    security(("api_jwt" = []))
)]
pub async fn create_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateAssignmentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let assignment = app_state
        .assignment_service
        .create_assignment(&user.caller(), payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(assignment)))
}

// GET /api/assignments
#[utoipa::path(
    get,
    path = "/api/assignments",
    tag = "Assignments",
    responses((status = 200, description = "Atribuições visíveis ao chamador", body = Vec<Assignment>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Marca")),
    security(("api_jwt" = []))
)]
pub async fn list_assignments(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let assignments = app_state
        .assignment_service
        .list_assignments(&user.caller())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(assignments))
}

// GET /api/assignments/{id}
#[utoipa::path(
    get,
    path = "/api/assignments/{id}",
    tag = "Assignments",
    responses(
        (status = 200, description = "Atribuição com lojas e contagem por status", body = AssignmentDetail),
        (status = 404, description = "Atribuição não encontrada")
    ),
    params(
        ("id" = Uuid, Path, description = "ID da Atribuição"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_assignment(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let assignment = app_state
        .assignment_service
        .get_assignment(&user.caller(), assignment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(assignment))
}

// GET /api/assignments/{id}/workflow-progress
#[utoipa::path(
    get,
    path = "/api/assignments/{id}/workflow-progress",
    tag = "Assignments",
    responses((status = 200, description = "Contagem por etapa somando todas as lojas", body = WorkflowProgress)),
    params(
        ("id" = Uuid, Path, description = "ID da Atribuição"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_workflow_progress(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(assignment_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let progress = app_state
        .assignment_service
        .workflow_progress(&user.caller(), assignment_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(progress))
}
