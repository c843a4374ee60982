// src/common/i18n.rs

use std::collections::HashMap;

pub const DEFAULT_LANG: &str = "en";

// Catálogo de mensagens de erro por idioma.
// As chaves batem com as usadas em `AppError::to_api_error`.
const EN: &[(&str, &str)] = &[
    ("validation", "One or more fields are invalid."),
    ("invalid_field", "The field '{field}' is invalid."),
    ("invalid_transition", "Cannot move from '{from}' to '{to}'."),
    ("precondition_failed", "Requirement not met for '{field}'."),
    ("forbidden", "You are not allowed to perform this action."),
    ("conflict", "This item was already handled by someone else. Reload and try again."),
    ("not_found", "{entity} not found."),
    ("invalid_token", "Invalid or missing authentication token."),
    ("internal", "An unexpected error occurred."),
];

const PT: &[(&str, &str)] = &[
    ("validation", "Um ou mais campos são inválidos."),
    ("invalid_field", "O campo '{field}' é inválido."),
    ("invalid_transition", "Não é possível passar de '{from}' para '{to}'."),
    ("precondition_failed", "Requisito não atendido para '{field}'."),
    ("forbidden", "Você não tem permissão para realizar esta ação."),
    ("conflict", "Este item já foi tratado por outra pessoa. Recarregue e tente novamente."),
    ("not_found", "{entity} não encontrado."),
    ("invalid_token", "Token de autenticação inválido ou ausente."),
    ("internal", "Ocorreu um erro inesperado."),
];

#[derive(Debug, Clone)]
pub struct I18nStore {
    catalogs: HashMap<&'static str, HashMap<&'static str, &'static str>>,
}

impl Default for I18nStore {
    fn default() -> Self {
        let mut catalogs = HashMap::new();
        catalogs.insert("en", EN.iter().copied().collect());
        catalogs.insert("pt", PT.iter().copied().collect());
        Self { catalogs }
    }
}

impl I18nStore {
    /// Busca a mensagem no idioma pedido, caindo para inglês e por fim para a própria chave.
    /// Os placeholders `{nome}` são substituídos pelos argumentos.
    pub fn translate(&self, lang: &str, key: &str, args: &[(&str, &str)]) -> String {
        let template = self
            .catalogs
            .get(lang)
            .and_then(|catalog| catalog.get(key))
            .or_else(|| self.catalogs.get(DEFAULT_LANG).and_then(|c| c.get(key)))
            .copied()
            .unwrap_or(key);

        args.iter().fold(template.to_string(), |msg, (name, value)| {
            msg.replace(&format!("{{{}}}", name), value)
        })
    }
}
