// src/handlers/maquinas.rs

use axum::{
    extract::{Path, Query, State},
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
        rbac::{PermMaquinasGerir, RequirePermission},
    },
    models::maquinas::{CreateMaquinaPayload, Maquina, MaquinaFilter, UpdateMaquinaPayload},
};

#[utoipa::path(
    get,
    path = "/api/maquinas",
    tag = "Máquinas",
    params(MaquinaFilter),
    responses(
        (status = 200, description = "Lista de máquinas", body = Vec<Maquina>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_maquinas(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<MaquinaFilter>,
) -> Result<Json<Vec<Maquina>>, ApiError> {
    let maquinas = app_state
        .catalog_service
        .list_maquinas(filter.ativa)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(maquinas))
}

#[utoipa::path(
    get,
    path = "/api/maquinas/{id}",
    tag = "Máquinas",
    params(("id" = Uuid, Path, description = "ID da máquina")),
    responses(
        (status = 200, description = "Máquina", body = Maquina),
        (status = 404, description = "Máquina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_maquina(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<Json<Maquina>, ApiError> {
    let maquina = app_state
        .catalog_service
        .get_maquina(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(maquina))
}

#[utoipa::path(
    post,
    path = "/api/maquinas",
    tag = "Máquinas",
    request_body = CreateMaquinaPayload,
    responses(
        (status = 201, description = "Máquina cadastrada", body = Maquina),
        (status = 409, description = "Nome já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_maquina(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMaquinasGerir>,
    Json(payload): Json<CreateMaquinaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let maquina = app_state
        .catalog_service
        .create_maquina(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(maquina)))
}

#[utoipa::path(
    put,
    path = "/api/maquinas/{id}",
    tag = "Máquinas",
    request_body = UpdateMaquinaPayload,
    params(("id" = Uuid, Path, description = "ID da máquina")),
    responses(
        (status = 200, description = "Máquina atualizada", body = Maquina),
        (status = 404, description = "Máquina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_maquina(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMaquinasGerir>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateMaquinaPayload>,
) -> Result<Json<Maquina>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let maquina = app_state
        .catalog_service
        .update_maquina(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(maquina))
}

#[utoipa::path(
    delete,
    path = "/api/maquinas/{id}",
    tag = "Máquinas",
    params(("id" = Uuid, Path, description = "ID da máquina")),
    responses(
        (status = 204, description = "Máquina excluída"),
        (status = 409, description = "Máquina referenciada por chamados ou planos")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_maquina(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermMaquinasGerir>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .catalog_service
        .delete_maquina(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
