// src/middleware/tenancy.rs

use axum::http::HeaderMap;
use uuid::Uuid;

use crate::common::error::AppError;

// O nome do nosso cabeçalho HTTP customizado
pub const TENANT_ID_HEADER: &str = "x-tenant-id";

// UUID da marca (tenant) pedido no cabeçalho; o guard confere com o token.
#[derive(Debug, Clone)]
pub struct TenantContext(pub Uuid);

impl TenantContext {
    pub fn from_headers(headers: &HeaderMap) -> Result<Self, AppError> {
        let value = headers
            .get(TENANT_ID_HEADER)
            .ok_or_else(|| AppError::invalid_field(TENANT_ID_HEADER, "required"))?;

        let value_str = value
            .to_str()
            .map_err(|_| AppError::invalid_field(TENANT_ID_HEADER, "invalid characters"))?;

        let tenant_id = Uuid::parse_str(value_str)
            .map_err(|_| AppError::invalid_field(TENANT_ID_HEADER, "must be a UUID"))?;

        Ok(TenantContext(tenant_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn parses_tenant_header() {
        let id = Uuid::new_v4();
        let mut headers = HeaderMap::new();
        headers.insert(TENANT_ID_HEADER, HeaderValue::from_str(&id.to_string()).unwrap());

        assert_eq!(TenantContext::from_headers(&headers).unwrap().0, id);
    }

    #[test]
    fn missing_or_malformed_header_is_a_validation_error() {
        let mut headers = HeaderMap::new();
        assert!(matches!(
            TenantContext::from_headers(&headers),
            Err(AppError::InvalidField { .. })
        ));

        headers.insert(TENANT_ID_HEADER, HeaderValue::from_static("loja-1"));
        assert!(matches!(
            TenantContext::from_headers(&headers),
            Err(AppError::InvalidField { .. })
        ));
    }
}
