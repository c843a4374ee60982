//src/main.rs

use axum::{
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod engine;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Settings};
use crate::docs::ApiDoc;
use crate::middleware::auth::tenant_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // RUST_LOG controla o nível; sem ele, "info".
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    let app_state = AppState::new(&settings).await?;

    sqlx::migrate!().run(&app_state.db_pool).await?;
    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    // Templates de aprovação
    let workflow_routes = Router::new()
        .route("/api/workflows"
               ,post(handlers::workflows::create_workflow)
               .get(handlers::workflows::list_workflows)
        )
        .route("/api/workflows/{id}", get(handlers::workflows::get_workflow))
        .route("/api/workflows/{id}/stages"
               ,put(handlers::workflows::replace_stages)
               .post(handlers::workflows::append_stage)
        )
        .route("/api/workflows/{id}/stages/{order}", delete(handlers::workflows::remove_stage))
        .route("/api/workflows/{id}/stages/{order}/move", post(handlers::workflows::move_stage));

    // Atribuições (marca) e agregados
    let assignment_routes = Router::new()
        .route("/api/assignments"
               ,post(handlers::assignments::create_assignment)
               .get(handlers::assignments::list_assignments)
        )
        .route("/api/assignments/{id}", get(handlers::assignments::get_assignment))
        .route("/api/assignments/{id}/workflow-progress", get(handlers::assignments::get_workflow_progress));

    // Trabalho do fornecedor + pipeline de aprovação por loja
    let store_routes = Router::new()
        .route("/api/store-assignments/mine", get(handlers::store_assignments::list_my_store_assignments))
        .route("/api/store-assignments/{id}", get(handlers::store_assignments::get_store_assignment))
        .route("/api/store-assignments/{id}/status", patch(handlers::store_assignments::update_store_status))
        .route("/api/store-assignments/{id}/form", put(handlers::store_assignments::update_store_form))
        .route("/api/store-assignments/{id}/approvals", get(handlers::store_assignments::get_approval_progress))
        .route("/api/store-assignments/{id}/stages/{stage_id}/approve", post(handlers::store_assignments::approve_stage))
        .route("/api/store-assignments/{id}/stages/{stage_id}/reject", post(handlers::store_assignments::reject_stage))
        .route("/api/approvals/pending", get(handlers::approvals::list_pending_approvals));

    // Tudo exige token válido + X-Tenant-ID igual ao do token
    let protected_routes = Router::new()
        .merge(workflow_routes)
        .merge(assignment_routes)
        .merge(store_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            tenant_guard,
        ));

    let app = Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .merge(protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .with_state(app_state);

    let listener = TcpListener::bind(settings.server_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app).await?;

    Ok(())
}
