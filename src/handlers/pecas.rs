// src/handlers/pecas.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermPecasGerir, PermPecasMovimentar, RequirePermission},
    },
    models::pecas::{
        CreatePecaPayload, Movimentacao, MovimentacaoPayload, Peca, UpdatePecaPayload,
    },
};

#[utoipa::path(
    get,
    path = "/api/pecas",
    tag = "Peças",
    responses(
        (status = 200, description = "Peças em estoque", body = Vec<Peca>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pecas(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<Peca>>, ApiError> {
    let pecas = app_state
        .peca_service
        .list()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pecas))
}

#[utoipa::path(
    get,
    path = "/api/pecas/estoque-baixo",
    tag = "Peças",
    responses(
        (status = 200, description = "Peças no estoque mínimo ou abaixo dele", body = Vec<Peca>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_estoque_baixo(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<Peca>>, ApiError> {
    let pecas = app_state
        .peca_service
        .list_low_stock()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pecas))
}

#[utoipa::path(
    post,
    path = "/api/pecas",
    tag = "Peças",
    request_body = CreatePecaPayload,
    responses(
        (status = 201, description = "Peça cadastrada", body = Peca),
        (status = 409, description = "Código já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_peca(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermPecasGerir>,
    Json(payload): Json<CreatePecaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let peca = app_state
        .peca_service
        .create(payload, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(peca)))
}

#[utoipa::path(
    put,
    path = "/api/pecas/{id}",
    tag = "Peças",
    request_body = UpdatePecaPayload,
    params(("id" = Uuid, Path, description = "ID da peça")),
    responses(
        (status = 200, description = "Cadastro da peça atualizado", body = Peca),
        (status = 404, description = "Peça não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_peca(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPecasGerir>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePecaPayload>,
) -> Result<Json<Peca>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let peca = app_state
        .peca_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(peca))
}

#[utoipa::path(
    post,
    path = "/api/pecas/{id}/movimentacoes",
    tag = "Peças",
    request_body = MovimentacaoPayload,
    params(("id" = Uuid, Path, description = "ID da peça")),
    responses(
        (status = 201, description = "Movimentação registrada, retorna o saldo novo", body = Peca),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_movimentacao(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermPecasMovimentar>,
    Path(id): Path<Uuid>,
    Json(payload): Json<MovimentacaoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let peca = app_state
        .peca_service
        .register_movement(id, payload, user.id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(peca)))
}

#[utoipa::path(
    get,
    path = "/api/pecas/{id}/movimentacoes",
    tag = "Peças",
    params(("id" = Uuid, Path, description = "ID da peça")),
    responses(
        (status = 200, description = "Histórico da peça, mais recente primeiro", body = Vec<Movimentacao>),
        (status = 404, description = "Peça não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_movimentacoes(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<Movimentacao>>, ApiError> {
    let movimentos = app_state
        .peca_service
        .list_movements(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(movimentos))
}
