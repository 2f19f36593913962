// src/middleware/auth.rs

use axum::{
    extract::{FromRequestParts, Query, Request, State},
    http::request::Parts,
    middleware::Next,
    response::Response,
};
use axum_extra::headers::{authorization::Bearer, Authorization, HeaderMapExt};
use serde::Deserialize;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::i18n::Locale,
    models::auth::Usuario,
};

// O EventSource do navegador não envia cabeçalhos, então o SSE aceita `?token=`.
#[derive(Debug, Deserialize)]
struct TokenQuery {
    token: Option<String>,
}

/// Extrai o token do cabeçalho `Authorization: Bearer` ou, na falta dele, da query.
fn extract_token(request: &Request) -> Option<String> {
    if let Some(Authorization(bearer)) = request.headers().typed_get::<Authorization<Bearer>>() {
        return Some(bearer.token().to_string());
    }

    Query::<TokenQuery>::try_from_uri(request.uri())
        .ok()
        .and_then(|Query(query)| query.token)
        .filter(|token| !token.is_empty())
}

// O middleware em si: valida o JWT e pendura o usuário nas extensions da requisição
pub async fn auth_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&request)
        .ok_or_else(|| AppError::InvalidToken.to_api_error(&locale, &app_state.i18n_store))?;

    let usuario = app_state
        .auth_service
        .validate_token(&token)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    request.extensions_mut().insert(AuthenticatedUser(usuario));
    Ok(next.run(request).await)
}

// Extrator para obter o usuário autenticado diretamente nos handlers
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub Usuario);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError {
                status: axum::http::StatusCode::UNAUTHORIZED,
                error: "Usuário não autenticado".into(),
                details: None,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;

    #[test]
    fn bearer_header_takes_precedence() {
        let request = Request::builder()
            .uri("/api/eventos?token=da-query")
            .header("Authorization", "Bearer do-cabecalho")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_token(&request).as_deref(), Some("do-cabecalho"));
    }

    #[test]
    fn token_can_come_from_the_query_string() {
        let request = Request::builder()
            .uri("/api/eventos?token=abc.def.ghi")
            .body(Body::empty())
            .unwrap();

        assert_eq!(extract_token(&request).as_deref(), Some("abc.def.ghi"));
    }

    #[test]
    fn missing_or_empty_token_yields_none() {
        let request = Request::builder().uri("/api/chamados").body(Body::empty()).unwrap();
        assert!(extract_token(&request).is_none());

        let request = Request::builder().uri("/api/eventos?token=").body(Body::empty()).unwrap();
        assert!(extract_token(&request).is_none());
    }
}
