// src/handlers/planos.rs

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
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermPlanosGerir, RequirePermission},
    },
    models::{
        chamados::Chamado,
        planos::{CreatePlanoPayload, Plano, PlanoFilter, UpdatePlanoPayload, VencendoQuery},
    },
};

#[utoipa::path(
    get,
    path = "/api/planos",
    tag = "Planos",
    params(PlanoFilter),
    responses(
        (status = 200, description = "Planos de manutenção", body = Vec<Plano>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_planos(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<PlanoFilter>,
) -> Result<Json<Vec<Plano>>, ApiError> {
    let planos = app_state
        .plano_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(planos))
}

#[utoipa::path(
    get,
    path = "/api/planos/vencendo",
    tag = "Planos",
    params(VencendoQuery),
    responses(
        (status = 200, description = "Planos ativos vencidos ou que vencem dentro da janela", body = Vec<Plano>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_planos_vencendo(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(query): Query<VencendoQuery>,
) -> Result<Json<Vec<Plano>>, ApiError> {
    let planos = app_state
        .plano_service
        .list_due(query.dias)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(planos))
}

#[utoipa::path(
    get,
    path = "/api/planos/{id}",
    tag = "Planos",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano", body = Plano),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_plano(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<Json<Plano>, ApiError> {
    let plano = app_state
        .plano_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plano))
}

#[utoipa::path(
    post,
    path = "/api/planos",
    tag = "Planos",
    request_body = CreatePlanoPayload,
    responses(
        (status = 201, description = "Plano criado", body = Plano),
        (status = 404, description = "Máquina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_plano(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPlanosGerir>,
    Json(payload): Json<CreatePlanoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let plano = app_state
        .plano_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(plano)))
}

#[utoipa::path(
    put,
    path = "/api/planos/{id}",
    tag = "Planos",
    request_body = UpdatePlanoPayload,
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 200, description = "Plano atualizado", body = Plano),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_plano(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPlanosGerir>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePlanoPayload>,
) -> Result<Json<Plano>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let plano = app_state
        .plano_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(plano))
}

#[utoipa::path(
    delete,
    path = "/api/planos/{id}",
    tag = "Planos",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 204, description = "Plano excluído"),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_plano(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermPlanosGerir>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .plano_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// Gera um chamado aberto a partir do plano, com as tarefas como checklist
#[utoipa::path(
    post,
    path = "/api/planos/{id}/gerar-chamado",
    tag = "Planos",
    params(("id" = Uuid, Path, description = "ID do plano")),
    responses(
        (status = 201, description = "Chamado gerado", body = Chamado),
        (status = 404, description = "Plano não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn gerar_chamado(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermPlanosGerir>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let chamado = app_state
        .plano_service
        .generate_ticket(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(chamado)))
}
