// src/handlers/usuarios.rs

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
        rbac::{PermChamadosGerir, PermUsuariosGerir, RequirePermission},
    },
    models::auth::{CreateUsuarioPayload, UpdateUsuarioPayload, Usuario, UsuarioFilter},
};

// Lista usada também para escolher o manutentor, por isso basta gerir chamados
#[utoipa::path(
    get,
    path = "/api/usuarios",
    tag = "Usuários",
    params(UsuarioFilter),
    responses(
        (status = 200, description = "Lista de usuários", body = Vec<Usuario>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_usuarios(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermChamadosGerir>,
    Query(filter): Query<UsuarioFilter>,
) -> Result<Json<Vec<Usuario>>, ApiError> {
    let usuarios = app_state
        .auth_service
        .list_users(filter.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(usuarios))
}

#[utoipa::path(
    post,
    path = "/api/usuarios",
    tag = "Usuários",
    request_body = CreateUsuarioPayload,
    responses(
        (status = 201, description = "Usuário criado", body = Usuario),
        (status = 409, description = "E-mail já cadastrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_usuario(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsuariosGerir>,
    Json(payload): Json<CreateUsuarioPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let usuario = app_state
        .auth_service
        .create_user(payload.nome.trim(), &payload.email, &payload.senha, payload.role)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(usuario)))
}

#[utoipa::path(
    patch,
    path = "/api/usuarios/{id}",
    tag = "Usuários",
    request_body = UpdateUsuarioPayload,
    params(("id" = Uuid, Path, description = "ID do usuário")),
    responses(
        (status = 200, description = "Usuário atualizado", body = Usuario),
        (status = 404, description = "Usuário não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_usuario(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermUsuariosGerir>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateUsuarioPayload>,
) -> Result<Json<Usuario>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let usuario = app_state
        .auth_service
        .update_user(id, payload.nome.as_deref().map(str::trim), payload.role, payload.ativo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(usuario))
}
