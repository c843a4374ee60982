// src/models/auth.rs

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::error::AppError;

// Estrutura de dados ("claims") dentro do JWT.
// O token é emitido pelo serviço de identidade; aqui só validamos.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid,             // Subject (ID do usuário)
    pub tenant_id: Uuid,       // Marca (tenant) à qual o usuário pertence
    pub role_id: Uuid,         // Cargo usado no gate das etapas de aprovação
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vendor_id: Option<Uuid>, // Presente apenas para usuários de fornecedor
    pub exp: usize,
    pub iat: usize,
}

/// Quem está chamando o motor. Passado explicitamente para toda operação,
/// nunca lido de um estado global.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerContext {
    pub user_id: Uuid,
    pub role_id: Uuid,
    pub tenant_id: Uuid,
    pub vendor_id: Option<Uuid>,
}

impl From<&Claims> for CallerContext {
    fn from(claims: &Claims) -> Self {
        Self {
            user_id: claims.sub,
            role_id: claims.role_id,
            tenant_id: claims.tenant_id,
            vendor_id: claims.vendor_id,
        }
    }
}

impl CallerContext {
    pub fn ensure_tenant(&self, tenant_id: Uuid) -> Result<(), AppError> {
        if self.tenant_id != tenant_id {
            return Err(AppError::Forbidden("resource belongs to another tenant".into()));
        }
        Ok(())
    }

    /// Só o fornecedor dono da atribuição pode executar o trabalho de campo.
    pub fn ensure_vendor(&self, tenant_id: Uuid, vendor_id: Uuid) -> Result<(), AppError> {
        self.ensure_tenant(tenant_id)?;
        match self.vendor_id {
            Some(id) if id == vendor_id => Ok(()),
            _ => Err(AppError::Forbidden("store assignment belongs to another vendor".into())),
        }
    }

    /// Leitura: usuários da marca veem tudo do tenant; fornecedores só o que é deles.
    pub fn ensure_can_view(&self, tenant_id: Uuid, vendor_id: Uuid) -> Result<(), AppError> {
        self.ensure_tenant(tenant_id)?;
        match self.vendor_id {
            Some(id) if id != vendor_id => {
                Err(AppError::Forbidden("store assignment belongs to another vendor".into()))
            }
            _ => Ok(()),
        }
    }

    /// Operações administrativas da marca não são abertas a fornecedores.
    pub fn ensure_brand_user(&self) -> Result<(), AppError> {
        if self.vendor_id.is_some() {
            return Err(AppError::Forbidden("vendors cannot manage assignments or workflows".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn caller(vendor_id: Option<Uuid>) -> CallerContext {
        CallerContext {
            user_id: Uuid::new_v4(),
            role_id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            vendor_id,
        }
    }

    #[test]
    fn vendor_must_own_the_store_assignment() {
        let vendor = Uuid::new_v4();
        let ctx = caller(Some(vendor));

        assert!(ctx.ensure_vendor(ctx.tenant_id, vendor).is_ok());
        assert!(matches!(
            ctx.ensure_vendor(ctx.tenant_id, Uuid::new_v4()),
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            ctx.ensure_vendor(Uuid::new_v4(), vendor),
            Err(AppError::Forbidden(_))
        ));
    }

    #[test]
    fn brand_users_cannot_act_as_vendors() {
        let ctx = caller(None);
        assert!(ctx.ensure_brand_user().is_ok());
        assert!(ctx.ensure_vendor(ctx.tenant_id, Uuid::new_v4()).is_err());
        assert!(caller(Some(Uuid::new_v4())).ensure_brand_user().is_err());
    }

    #[test]
    fn brand_users_can_view_any_vendor_in_their_tenant() {
        let brand = caller(None);
        assert!(brand.ensure_can_view(brand.tenant_id, Uuid::new_v4()).is_ok());
        assert!(brand.ensure_can_view(Uuid::new_v4(), Uuid::new_v4()).is_err());

        let vendor = Uuid::new_v4();
        let ctx = caller(Some(vendor));
        assert!(ctx.ensure_can_view(ctx.tenant_id, vendor).is_ok());
        assert!(ctx.ensure_can_view(ctx.tenant_id, Uuid::new_v4()).is_err());
    }
}
