// src/handlers/causas.rs

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
    middleware::{
        i18n::Locale,
        rbac::{PermCausasGerir, RequirePermission},
    },
    models::causas::{CausaRaiz, CreateCausaRaizPayload},
};

#[utoipa::path(
    get,
    path = "/api/causas-raiz",
    tag = "Causas Raiz",
    responses(
        (status = 200, description = "Causas raiz cadastradas", body = Vec<CausaRaiz>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_causas(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<CausaRaiz>>, ApiError> {
    let causas = app_state
        .catalog_service
        .list_causas()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(causas))
}

#[utoipa::path(
    post,
    path = "/api/causas-raiz",
    tag = "Causas Raiz",
    request_body = CreateCausaRaizPayload,
    responses(
        (status = 201, description = "Causa raiz criada", body = CausaRaiz),
        (status = 409, description = "Nome já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_causa(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCausasGerir>,
    Json(payload): Json<CreateCausaRaizPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let causa = app_state
        .catalog_service
        .create_causa(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(causa)))
}

#[utoipa::path(
    delete,
    path = "/api/causas-raiz/{id}",
    tag = "Causas Raiz",
    params(("id" = Uuid, Path, description = "ID da causa raiz")),
    responses(
        (status = 204, description = "Causa raiz excluída"),
        (status = 409, description = "Causa usada por algum chamado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_causa(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermCausasGerir>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .catalog_service
        .delete_causa(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
