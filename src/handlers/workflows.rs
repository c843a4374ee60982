// src/handlers/workflows.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{auth::AuthenticatedUser, i18n::Locale},
    models::workflow::{StageDraft, WorkflowDetail},
};

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateWorkflowPayload {
    #[validate(length(min = 1, max = 200, message = "required"))]
    #[schema(example = "Aprovação padrão de fachada")]
    pub name: String,

    pub description: Option<String>,

    #[validate(length(min = 1, message = "at least one stage is required"), nested)]
    pub stages: Vec<StageDraft>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ReplaceStagesPayload {
    #[validate(length(min = 1, message = "at least one stage is required"), nested)]
    pub stages: Vec<StageDraft>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MoveStagePayload {
    #[schema(example = 1)]
    pub to_order: i32,
}

// POST /api/workflows
#[utoipa::path(
    post,
    path = "/api/workflows",
    tag = "Workflows",
    request_body = CreateWorkflowPayload,
    responses(
        (status = 201, description = "Workflow criado com etapas renumeradas", body = WorkflowDetail),
        (status = 422, description = "Lista de etapas vazia ou inválida")
    ),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Marca")),
    security(("api_jwt" = []))
)]
pub async fn create_workflow(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Json(payload): Json<CreateWorkflowPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let workflow = app_state
        .workflow_service
        .create_workflow(
            &user.caller(),
            &payload.name,
            payload.description.as_deref(),
            payload.stages,
        )
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(workflow)))
}

// GET /api/workflows
#[utoipa::path(
    get,
    path = "/api/workflows",
    tag = "Workflows",
    responses((status = 200, description = "Workflows do tenant", body = Vec<WorkflowDetail>)),
    params(("x-tenant-id" = Uuid, Header, description = "ID da Marca")),
    security(("api_jwt" = []))
)]
pub async fn list_workflows(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
) -> Result<impl IntoResponse, ApiError> {
    let workflows = app_state
        .workflow_service
        .list_workflows(&user.caller())
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(workflows))
}

// GET /api/workflows/{id}
#[utoipa::path(
    get,
    path = "/api/workflows/{id}",
    tag = "Workflows",
    responses(
        (status = 200, description = "Workflow e etapas", body = WorkflowDetail),
        (status = 404, description = "Workflow não encontrado")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Workflow"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_workflow(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(workflow_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let workflow = app_state
        .workflow_service
        .get_workflow(&user.caller(), workflow_id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(workflow))
}

// PUT /api/workflows/{id}/stages
#[utoipa::path(
    put,
    path = "/api/workflows/{id}/stages",
    tag = "Workflows",
    request_body = ReplaceStagesPayload,
    responses(
        (status = 200, description = "Etapas substituídas", body = WorkflowDetail),
        (status = 422, description = "Lista de etapas vazia ou inválida")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Workflow"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn replace_stages(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(workflow_id): Path<Uuid>,
    Json(payload): Json<ReplaceStagesPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let workflow = app_state
        .workflow_service
        .replace_stages(&user.caller(), workflow_id, payload.stages)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(workflow))
}

// POST /api/workflows/{id}/stages
#[utoipa::path(
    post,
    path = "/api/workflows/{id}/stages",
    tag = "Workflows",
    request_body = StageDraft,
    responses((status = 201, description = "Etapa adicionada ao final", body = WorkflowDetail)),
    params(
        ("id" = Uuid, Path, description = "ID do Workflow"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn append_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path(workflow_id): Path<Uuid>,
    Json(payload): Json<StageDraft>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let workflow = app_state
        .workflow_service
        .append_stage(&user.caller(), workflow_id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(workflow)))
}

// DELETE /api/workflows/{id}/stages/{order}
#[utoipa::path(
    delete,
    path = "/api/workflows/{id}/stages/{order}",
    tag = "Workflows",
    responses(
        (status = 200, description = "Etapa removida e lista renumerada", body = WorkflowDetail),
        (status = 422, description = "Ordem inexistente ou última etapa")
    ),
    params(
        ("id" = Uuid, Path, description = "ID do Workflow"),
        ("order" = i32, Path, description = "Ordem da etapa (1..N)"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn remove_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((workflow_id, stage_order)): Path<(Uuid, i32)>,
) -> Result<impl IntoResponse, ApiError> {
    let workflow = app_state
        .workflow_service
        .remove_stage(&user.caller(), workflow_id, stage_order)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(workflow))
}

// POST /api/workflows/{id}/stages/{order}/move
#[utoipa::path(
    post,
    path = "/api/workflows/{id}/stages/{order}/move",
    tag = "Workflows",
    request_body = MoveStagePayload,
    responses((status = 200, description = "Etapa reposicionada", body = WorkflowDetail)),
    params(
        ("id" = Uuid, Path, description = "ID do Workflow"),
        ("order" = i32, Path, description = "Ordem atual da etapa"),
        ("x-tenant-id" = Uuid, Header, description = "ID da Marca")
    ),
    security(("api_jwt" = []))
)]
pub async fn move_stage(
    State(app_state): State<AppState>,
    locale: Locale,
    user: AuthenticatedUser,
    Path((workflow_id, stage_order)): Path<(Uuid, i32)>,
    Json(payload): Json<MoveStagePayload>,
) -> Result<impl IntoResponse, ApiError> {
    let workflow = app_state
        .workflow_service
        .move_stage(&user.caller(), workflow_id, stage_order, payload.to_order)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(workflow))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stage(name: &str) -> StageDraft {
        StageDraft {
            stage_name: name.to_string(),
            role_required: Uuid::new_v4(),
            stage_order: None,
        }
    }

    #[test]
    fn nested_stage_rules_are_checked() {
        let payload = CreateWorkflowPayload {
            name: "Fachada".into(),
            description: None,
            stages: vec![stage("BDE Approved"), stage("")],
        };

        let errors = payload.validate().unwrap_err();
        assert!(errors.errors().contains_key("stages"));
    }

    #[test]
    fn stage_list_cannot_be_empty() {
        let payload = ReplaceStagesPayload { stages: Vec::new() };
        assert!(payload.validate().is_err());

        let payload = ReplaceStagesPayload { stages: vec![stage("BDE Approved")] };
        assert!(payload.validate().is_ok());
    }
}
