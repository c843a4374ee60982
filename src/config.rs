// src/config.rs

use std::{env, net::SocketAddr, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{ApprovalRepository, AssignmentRepository, StoreAssignmentRepository, WorkflowRepository},
    services::{
        approval_service::ApprovalService, assignment_service::AssignmentService, auth::AuthService,
        store_assignment_service::StoreAssignmentService, workflow_service::WorkflowService,
    },
};

const DEFAULT_SERVER_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_ACQUIRE_TIMEOUT_SECS: u64 = 3;

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub jwt_secret: String,
    pub server_addr: SocketAddr,
    pub db_max_connections: u32,
    pub db_acquire_timeout: Duration,
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    // Separado de `from_env` para ser testável sem mexer no ambiente do processo.
    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| -> anyhow::Result<String> {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .with_context(|| format!("{key} deve ser definida"))
        };

        let server_addr = lookup("SERVER_ADDR")
            .unwrap_or_else(|| DEFAULT_SERVER_ADDR.to_string())
            .parse::<SocketAddr>()
            .context("SERVER_ADDR inválido")?;

        let db_max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(raw) => raw.parse::<u32>().context("DB_MAX_CONNECTIONS inválido")?,
            None => DEFAULT_MAX_CONNECTIONS,
        };

        let acquire_secs = match lookup("DB_ACQUIRE_TIMEOUT_SECS") {
            Some(raw) => raw.parse::<u64>().context("DB_ACQUIRE_TIMEOUT_SECS inválido")?,
            None => DEFAULT_ACQUIRE_TIMEOUT_SECS,
        };

        Ok(Self {
            database_url: required("DATABASE_URL")?,
            jwt_secret: required("JWT_SECRET")?,
            server_addr,
            db_max_connections,
            db_acquire_timeout: Duration::from_secs(acquire_secs),
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub i18n_store: I18nStore,
    pub auth_service: AuthService,
    pub workflow_service: WorkflowService,
    pub assignment_service: AssignmentService,
    pub store_assignment_service: StoreAssignmentService,
    pub approval_service: ApprovalService,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let db_pool = PgPoolOptions::new()
            .max_connections(settings.db_max_connections)
            .acquire_timeout(settings.db_acquire_timeout)
            .connect(&settings.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Ok(Self::with_pool(db_pool, settings.jwt_secret.clone()))
    }

    // --- Monta o gráfico de dependências ---
    pub fn with_pool(db_pool: PgPool, jwt_secret: String) -> Self {
        let workflow_repo = WorkflowRepository::new(db_pool.clone());
        let assignment_repo = AssignmentRepository::new(db_pool.clone());
        let store_repo = StoreAssignmentRepository::new(db_pool.clone());
        let approval_repo = ApprovalRepository::new(db_pool.clone());

        let workflow_service = WorkflowService::new(workflow_repo.clone(), db_pool.clone());
        let assignment_service = AssignmentService::new(
            assignment_repo,
            store_repo.clone(),
            workflow_repo.clone(),
            approval_repo.clone(),
            db_pool.clone(),
        );
        let store_assignment_service = StoreAssignmentService::new(
            store_repo.clone(),
            workflow_repo,
            approval_repo.clone(),
            db_pool.clone(),
        );
        let approval_service = ApprovalService::new(approval_repo, store_repo, db_pool.clone());

        Self {
            db_pool,
            i18n_store: I18nStore::default(),
            auth_service: AuthService::new(jwt_secret),
            workflow_service,
            assignment_service,
            store_assignment_service,
            approval_service,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> anyhow::Result<Settings> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_optional_values_are_missing() {
        let settings = settings_from(&[
            ("DATABASE_URL", "postgres://localhost/workflow"),
            ("JWT_SECRET", "segredo"),
        ])
        .unwrap();

        assert_eq!(settings.server_addr, "0.0.0.0:3000".parse().unwrap());
        assert_eq!(settings.db_max_connections, 5);
        assert_eq!(settings.db_acquire_timeout, Duration::from_secs(3));
    }

    #[test]
    fn explicit_values_override_defaults() {
        let settings = settings_from(&[
            ("DATABASE_URL", "postgres://db/workflow"),
            ("JWT_SECRET", "segredo"),
            ("SERVER_ADDR", "127.0.0.1:8080"),
            ("DB_MAX_CONNECTIONS", "20"),
            ("DB_ACQUIRE_TIMEOUT_SECS", "10"),
        ])
        .unwrap();

        assert_eq!(settings.server_addr.port(), 8080);
        assert_eq!(settings.db_max_connections, 20);
        assert_eq!(settings.db_acquire_timeout, Duration::from_secs(10));
    }

    #[test]
    fn missing_or_blank_secrets_are_errors() {
        let err = settings_from(&[("DATABASE_URL", "postgres://db/workflow")]).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));

        let err = settings_from(&[("DATABASE_URL", "  "), ("JWT_SECRET", "segredo")]).unwrap_err();
        assert!(err.to_string().contains("DATABASE_URL"));
    }

    #[test]
    fn invalid_numbers_are_errors() {
        let err = settings_from(&[
            ("DATABASE_URL", "postgres://db/workflow"),
            ("JWT_SECRET", "segredo"),
            ("DB_MAX_CONNECTIONS", "muitas"),
        ])
        .unwrap_err();
        assert!(err.to_string().contains("DB_MAX_CONNECTIONS"));
    }
}
