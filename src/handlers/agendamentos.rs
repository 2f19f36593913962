// src/handlers/agendamentos.rs

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
        rbac::{PermAgendaGerir, PermChamadosAtender, RequirePermission},
    },
    models::{
        agenda::{
            AgendaFilter, Agendamento, CalendarEvent, CreateAgendamentoPayload,
            UpdateAgendamentoPayload,
        },
        chamados::Chamado,
    },
};

#[utoipa::path(
    get,
    path = "/api/agendamentos",
    tag = "Agenda",
    params(AgendaFilter),
    responses(
        (status = 200, description = "Eventos do calendário com a cor da legenda", body = Vec<CalendarEvent>),
        (status = 400, description = "Janela inválida")
    ),
    security(("api_jwt" = []))
)]
pub async fn list_agendamentos(
    State(app_state): State<AppState>,
    locale: Locale,
    Query(filter): Query<AgendaFilter>,
) -> Result<Json<Vec<CalendarEvent>>, ApiError> {
    let eventos = app_state
        .agenda_service
        .calendar(&filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(eventos))
}

#[utoipa::path(
    get,
    path = "/api/agendamentos/{id}",
    tag = "Agenda",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento", body = Agendamento),
        (status = 404, description = "Agendamento não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_agendamento(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<Json<Agendamento>, ApiError> {
    let agendamento = app_state
        .agenda_service
        .get(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(agendamento))
}

#[utoipa::path(
    post,
    path = "/api/agendamentos",
    tag = "Agenda",
    request_body = CreateAgendamentoPayload,
    responses(
        (status = 201, description = "Preventiva agendada", body = Agendamento),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_agendamento(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAgendaGerir>,
    Json(payload): Json<CreateAgendamentoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let agendamento = app_state
        .agenda_service
        .create(payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(agendamento)))
}

#[utoipa::path(
    put,
    path = "/api/agendamentos/{id}",
    tag = "Agenda",
    request_body = UpdateAgendamentoPayload,
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 200, description = "Agendamento remarcado", body = Agendamento),
        (status = 409, description = "Agendamento já iniciado ou concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn update_agendamento(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAgendaGerir>,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateAgendamentoPayload>,
) -> Result<Json<Agendamento>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let agendamento = app_state
        .agenda_service
        .update(id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(agendamento))
}

#[utoipa::path(
    delete,
    path = "/api/agendamentos/{id}",
    tag = "Agenda",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 204, description = "Agendamento removido"),
        (status = 409, description = "Agendamento já iniciado ou concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_agendamento(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAgendaGerir>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .agenda_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/api/agendamentos/{id}/iniciar",
    tag = "Agenda",
    params(("id" = Uuid, Path, description = "ID do agendamento")),
    responses(
        (status = 201, description = "Chamado preventivo aberto em andamento", body = Chamado),
        (status = 409, description = "Agendamento já iniciado ou concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn iniciar_agendamento(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermChamadosAtender>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let chamado = app_state
        .agenda_service
        .iniciar(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(chamado)))
}
