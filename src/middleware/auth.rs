// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::{
    common::error::AppError,
    config::AppState,
    middleware::tenancy::{TenantContext, TENANT_ID_HEADER},
    models::auth::{CallerContext, Claims},
};

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Claims);

impl AuthenticatedUser {
    pub fn caller(&self) -> CallerContext {
        CallerContext::from(&self.0)
    }
}

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or(AppError::InvalidToken)
    }
}

fn authenticate(
    app_state: &AppState,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
) -> Result<AuthenticatedUser, AppError> {
    let TypedHeader(Authorization(bearer)) = bearer.ok_or(AppError::InvalidToken)?;
    let claims = app_state.auth_service.validate_token(bearer.token())?;
    Ok(AuthenticatedUser(claims))
}

// Guard: token válido + cabeçalho X-Tenant-ID igual ao tenant do token.
pub async fn tenant_guard(
    State(app_state): State<AppState>,
    bearer: Option<TypedHeader<Authorization<Bearer>>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let user = authenticate(&app_state, bearer)?;

    let tenant = TenantContext::from_headers(request.headers())?;
    if tenant.0 != user.0.tenant_id {
        tracing::warn!(
            user_id = %user.0.sub,
            requested = %tenant.0,
            "Acesso negado: cabeçalho {} não corresponde ao token",
            TENANT_ID_HEADER
        );
        return Err(AppError::Forbidden("tenant header does not match token".into()));
    }

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}
