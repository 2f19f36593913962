// src/common/error.rs

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{common::i18n::I18nStore, middleware::i18n::Locale};

// O erro de domínio da aplicação. Os services e repositórios só conhecem este tipo;
// a tradução para HTTP (e para o idioma do cliente) acontece em `to_api_error`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("E-mail já existe")]
    EmailAlreadyExists,

    #[error("Credenciais inválidas")]
    InvalidCredentials,

    #[error("Token inválido")]
    InvalidToken,

    #[error("Usuário inativo")]
    InactiveUser,

    #[error("Usuário não encontrado")]
    UserNotFound,

    #[error("Permissão '{0}' ausente")]
    Forbidden(String),

    #[error("{0} não encontrado")]
    ResourceNotFound(String),

    #[error("Violação de unicidade: {0}")]
    UniqueConstraintViolation(String),

    #[error("Transição inválida: {action} com status {status}")]
    InvalidTransition { action: String, status: String },

    #[error("Chamado atribuído a outro manutentor")]
    NotAssignedMaintainer,

    #[error("Causa raiz obrigatória")]
    RootCauseRequired,

    #[error("Causa raiz desconhecida: {0}")]
    UnknownRootCause(String),

    #[error("Checklist incompleto")]
    ChecklistIncomplete,

    #[error("Item {0} fora do checklist")]
    ChecklistIndexOutOfRange(usize),

    #[error("Estoque insuficiente (disponível {0})")]
    InsufficientStock(rust_decimal::Decimal),

    #[error("Quantidade inválida")]
    InvalidQuantity,

    #[error("Agendamento não pode ser alterado")]
    ScheduleLocked,

    #[error("Máquina em uso")]
    MachineInUse,

    #[error("Causa raiz em uso")]
    RootCauseInUse,

    #[error("Período inválido")]
    InvalidPeriod,

    #[error("Fonte não encontrada em {0}")]
    FontNotFound(String),

    #[error("Erro de banco de dados: {0}")]
    DatabaseError(#[from] sqlx::Error),

    // `anyhow::Error` guarda o contexto de falhas inesperadas (PDF, tasks, etc.)
    #[error("Erro interno do servidor: {0}")]
    InternalServerError(#[from] anyhow::Error),

    #[error("Erro de Bcrypt: {0}")]
    BcryptError(#[from] bcrypt::BcryptError),

    #[error("Erro de JWT: {0}")]
    JwtError(#[from] jsonwebtoken::errors::Error),
}

/// O erro já traduzido, pronto para virar resposta HTTP.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub error: String,
    pub details: Option<Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.error, "details": details }),
            None => json!({ "error": self.error }),
        };
        (self.status, Json(body)).into_response()
    }
}

impl AppError {
    /// Status HTTP, chave do catálogo de mensagens e argumentos da mensagem.
    fn descriptor(&self) -> (StatusCode, &'static str, Vec<(&'static str, String)>) {
        match self {
            AppError::ValidationError(_) => (StatusCode::BAD_REQUEST, "validation_failed", vec![]),
            AppError::EmailAlreadyExists => (StatusCode::CONFLICT, "email_already_exists", vec![]),
            AppError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials", vec![]),
            AppError::InvalidToken => (StatusCode::UNAUTHORIZED, "invalid_token", vec![]),
            AppError::InactiveUser => (StatusCode::FORBIDDEN, "inactive_user", vec![]),
            AppError::UserNotFound => (StatusCode::NOT_FOUND, "user_not_found", vec![]),
            AppError::Forbidden(slug) => {
                (StatusCode::FORBIDDEN, "forbidden", vec![("permission", slug.clone())])
            }
            AppError::ResourceNotFound(resource) => {
                (StatusCode::NOT_FOUND, "resource_not_found", vec![("resource", resource.clone())])
            }
            AppError::DatabaseError(sqlx::Error::RowNotFound) => (
                StatusCode::NOT_FOUND,
                "resource_not_found",
                vec![("resource", "Registro".to_string())],
            ),
            AppError::UniqueConstraintViolation(detail) => {
                (StatusCode::CONFLICT, "unique_violation", vec![("detail", detail.clone())])
            }
            AppError::InvalidTransition { action, status } => (
                StatusCode::CONFLICT,
                "invalid_transition",
                vec![("action", action.clone()), ("status", status.clone())],
            ),
            AppError::NotAssignedMaintainer => (StatusCode::FORBIDDEN, "not_assigned", vec![]),
            AppError::RootCauseRequired => {
                (StatusCode::UNPROCESSABLE_ENTITY, "root_cause_required", vec![])
            }
            AppError::UnknownRootCause(cause) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "unknown_root_cause",
                vec![("cause", cause.clone())],
            ),
            AppError::ChecklistIncomplete => {
                (StatusCode::UNPROCESSABLE_ENTITY, "checklist_incomplete", vec![])
            }
            AppError::ChecklistIndexOutOfRange(index) => (
                StatusCode::BAD_REQUEST,
                "checklist_index_out_of_range",
                vec![("index", index.to_string())],
            ),
            AppError::InsufficientStock(available) => (
                StatusCode::CONFLICT,
                "insufficient_stock",
                vec![("available", available.normalize().to_string())],
            ),
            AppError::InvalidQuantity => (StatusCode::BAD_REQUEST, "invalid_quantity", vec![]),
            AppError::ScheduleLocked => (StatusCode::CONFLICT, "schedule_locked", vec![]),
            AppError::MachineInUse => (StatusCode::CONFLICT, "machine_in_use", vec![]),
            AppError::RootCauseInUse => (StatusCode::CONFLICT, "root_cause_in_use", vec![]),
            AppError::InvalidPeriod => (StatusCode::BAD_REQUEST, "invalid_period", vec![]),
            AppError::FontNotFound(dir) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                "font_not_found",
                vec![("dir", dir.clone())],
            ),

            // Todos os outros erros (banco, bcrypt, jwt, anyhow) viram 500.
            AppError::DatabaseError(_)
            | AppError::InternalServerError(_)
            | AppError::BcryptError(_)
            | AppError::JwtError(_) => (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", vec![]),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.descriptor().0
    }

    /// Converte para o formato de resposta, com a mensagem no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, store: &I18nStore) -> ApiError {
        let (status, key, args) = self.descriptor();

        if status == StatusCode::INTERNAL_SERVER_ERROR {
            // O detalhe fica só no log; o cliente recebe a mensagem genérica.
            tracing::error!("Erro Interno do Servidor: {}", self);
        }

        let details = match self {
            AppError::ValidationError(errors) => Some(validation_details(errors)),
            _ => None,
        };

        ApiError {
            status,
            error: store.translate(&locale.0, key, &args),
            details,
        }
    }
}

// Retorna todos os detalhes da validação, campo a campo.
fn validation_details(errors: &validator::ValidationErrors) -> Value {
    let mut details = serde_json::Map::new();
    for (field, field_errors) in errors.field_errors() {
        let messages: Vec<Value> = field_errors
            .iter()
            .map(|e| match &e.message {
                Some(message) => Value::String(message.to_string()),
                None => Value::String(e.code.to_string()),
            })
            .collect();
        details.insert(field.to_string(), Value::Array(messages));
    }
    Value::Object(details)
}

/// Converte violações de unicidade do Postgres em `AppError`, com mensagem amigável.
pub(crate) fn map_unique_violation(e: sqlx::Error, message: impl Into<String>) -> AppError {
    if let Some(db_err) = e.as_database_error() {
        if db_err.is_unique_violation() {
            return AppError::UniqueConstraintViolation(message.into());
        }
    }
    e.into()
}

/// `true` quando o erro é uma violação de chave estrangeira (registro ainda referenciado).
pub(crate) fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    e.as_database_error()
        .map(|db_err| db_err.is_foreign_key_violation())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;
    use validator::Validate;

    fn pt() -> Locale {
        Locale("pt".to_string())
    }

    #[derive(Validate)]
    struct Payload {
        #[validate(length(min = 1, message = "O nome é obrigatório."))]
        nome: String,
    }

    #[test]
    fn validation_errors_carry_field_details() {
        let store = I18nStore::load().unwrap();
        let errors = Payload { nome: String::new() }.validate().unwrap_err();

        let api = AppError::ValidationError(errors).to_api_error(&pt(), &store);

        assert_eq!(api.status, StatusCode::BAD_REQUEST);
        assert_eq!(api.error, "Um ou mais campos são inválidos.");
        assert_eq!(api.details.unwrap()["nome"][0], "O nome é obrigatório.");
    }

    #[test]
    fn internal_errors_hide_the_cause() {
        let store = I18nStore::load().unwrap();
        let err = AppError::InternalServerError(anyhow::anyhow!("senha do banco: 1234"));

        let api = err.to_api_error(&Locale("en".into()), &store);

        assert_eq!(api.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(api.error, "An unexpected error occurred.");
        assert!(api.details.is_none());
    }

    #[test]
    fn row_not_found_is_a_404() {
        assert_eq!(
            AppError::DatabaseError(sqlx::Error::RowNotFound).status(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn business_errors_are_localized_with_arguments() {
        let store = I18nStore::load().unwrap();

        let api = AppError::InsufficientStock(Decimal::new(250, 2)).to_api_error(&pt(), &store);
        assert_eq!(api.status, StatusCode::CONFLICT);
        assert_eq!(api.error, "Estoque insuficiente. Disponível: 2.5.");

        let api = AppError::InvalidTransition {
            action: "concluir".into(),
            status: "Aberto".into(),
        }
        .to_api_error(&pt(), &store);
        assert_eq!(api.error, "Não é possível concluir um chamado com status 'Aberto'.");
    }
}
