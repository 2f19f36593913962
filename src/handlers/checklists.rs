// src/handlers/checklists.rs

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use validator::Validate;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    middleware::{
        auth::AuthenticatedUser,
        i18n::Locale,
        rbac::{PermChecklistsEnviar, RequirePermission},
    },
    models::checklists::{
        ChecklistFilter, ChecklistPendente, ChecklistSubmission, CreateChecklistPayload,
    },
};

#[utoipa::path(
    post,
    path = "/api/checklists",
    tag = "Checklists",
    request_body = CreateChecklistPayload,
    responses(
        (status = 201, description = "Checklist registrado (com o chamado aberto, se houve não conformidade)", body = ChecklistSubmission),
        (status = 404, description = "Máquina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn submit_checklist(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermChecklistsEnviar>,
    Json(payload): Json<CreateChecklistPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let envio = app_state
        .checklist_service
        .submit(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(envio)))
}

#[utoipa::path(
    get,
    path = "/api/checklists",
    tag = "Checklists",
    params(ChecklistFilter),
    responses(
        (status = 200, description = "Checklists enviados", body = Vec<ChecklistSubmission>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_checklists(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<ChecklistFilter>,
) -> Result<Json<Vec<ChecklistSubmission>>, ApiError> {
    let envios = app_state
        .checklist_service
        .list(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(envios))
}

#[utoipa::path(
    get,
    path = "/api/checklists/pendentes",
    tag = "Checklists",
    responses(
        (status = 200, description = "Máquinas ativas sem checklist enviado hoje", body = Vec<ChecklistPendente>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_pendentes(
    State(app_state): State<AppState>,
    locale: Locale,
) -> Result<Json<Vec<ChecklistPendente>>, ApiError> {
    let pendentes = app_state
        .checklist_service
        .list_pending_today()
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pendentes))
}
