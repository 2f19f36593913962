// src/handlers/chamados.rs

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
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
        rbac::{
            PermChamadosAbrir, PermChamadosAtender, PermChamadosGerir, PermPecasMovimentar,
            RequirePermission,
        },
    },
    models::{
        chamados::{
            Chamado, ChamadoFilter, ChecklistTogglePayload, ConcluirChamadoPayload,
            ConsumirPecaPayload, CreateChamadoPayload, ObservacaoPayload,
        },
        pecas::Movimentacao,
    },
};

#[utoipa::path(
    get,
    path = "/api/chamados",
    tag = "Chamados",
    params(ChamadoFilter),
    responses(
        (status = 200, description = "Chamados visíveis para o perfil, mais novos primeiro", body = Vec<Chamado>)
    ),
    security(("api_jwt" = []))
)]
pub async fn list_chamados(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Query(filter): Query<ChamadoFilter>,
) -> Result<Json<Vec<Chamado>>, ApiError> {
    let chamados = app_state
        .chamado_service
        .list(&user, &filter)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(chamados))
}

#[utoipa::path(
    post,
    path = "/api/chamados",
    tag = "Chamados",
    request_body = CreateChamadoPayload,
    responses(
        (status = 201, description = "Chamado aberto", body = Chamado),
        (status = 404, description = "Máquina não encontrada")
    ),
    security(("api_jwt" = []))
)]
pub async fn create_chamado(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermChamadosAbrir>,
    Json(payload): Json<CreateChamadoPayload>,
) -> Result<impl IntoResponse, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let chamado = app_state
        .chamado_service
        .create(&user, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(chamado)))
}

#[utoipa::path(
    get,
    path = "/api/chamados/{id}",
    tag = "Chamados",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Chamado", body = Chamado),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_chamado(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Chamado>, ApiError> {
    let chamado = app_state
        .chamado_service
        .get(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(chamado))
}

#[utoipa::path(
    delete,
    path = "/api/chamados/{id}",
    tag = "Chamados",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 204, description = "Chamado excluído (agendamento não concluído volta para agendado)"),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn delete_chamado(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermChamadosGerir>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    app_state
        .chamado_service
        .delete(id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// ---
// Ciclo de vida
// ---

#[utoipa::path(
    post,
    path = "/api/chamados/{id}/assumir",
    tag = "Chamados",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Chamado em andamento com o usuário como manutentor", body = Chamado),
        (status = 409, description = "Chamado não está aberto")
    ),
    security(("api_jwt" = []))
)]
pub async fn assumir_chamado(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermChamadosAtender>,
    Path(id): Path<Uuid>,
) -> Result<Json<Chamado>, ApiError> {
    let chamado = app_state
        .chamado_service
        .assumir(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(chamado))
}

#[utoipa::path(
    post,
    path = "/api/chamados/{id}/liberar",
    tag = "Chamados",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Chamado devolvido para a fila", body = Chamado),
        (status = 403, description = "Chamado atribuído a outro manutentor"),
        (status = 409, description = "Chamado não está em andamento")
    ),
    security(("api_jwt" = []))
)]
pub async fn liberar_chamado(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermChamadosAtender>,
    Path(id): Path<Uuid>,
) -> Result<Json<Chamado>, ApiError> {
    let chamado = app_state
        .chamado_service
        .liberar(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(chamado))
}

#[utoipa::path(
    patch,
    path = "/api/chamados/{id}/checklist",
    tag = "Chamados",
    request_body = ChecklistTogglePayload,
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Item do checklist atualizado", body = Chamado),
        (status = 400, description = "Índice fora do checklist")
    ),
    security(("api_jwt" = []))
)]
pub async fn toggle_checklist(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermChamadosAtender>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ChecklistTogglePayload>,
) -> Result<Json<Chamado>, ApiError> {
    let chamado = app_state
        .chamado_service
        .toggle_checklist(&user, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(chamado))
}

#[utoipa::path(
    post,
    path = "/api/chamados/{id}/observacoes",
    tag = "Chamados",
    request_body = ObservacaoPayload,
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Observação registrada", body = Chamado),
        (status = 409, description = "Chamado já concluído")
    ),
    security(("api_jwt" = []))
)]
pub async fn add_observacao(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermChamadosAbrir>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ObservacaoPayload>,
) -> Result<Json<Chamado>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let chamado = app_state
        .chamado_service
        .add_observacao(&user, id, &payload.texto)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(chamado))
}

#[utoipa::path(
    post,
    path = "/api/chamados/{id}/concluir",
    tag = "Chamados",
    request_body = ConcluirChamadoPayload,
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Chamado concluído (agendamento e plano atualizados)", body = Chamado),
        (status = 409, description = "Chamado não está em andamento"),
        (status = 422, description = "Causa raiz ausente/desconhecida ou checklist incompleto")
    ),
    security(("api_jwt" = []))
)]
pub async fn concluir_chamado(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermChamadosAtender>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConcluirChamadoPayload>,
) -> Result<Json<Chamado>, ApiError> {
    payload
        .validate()
        .map_err(|e| AppError::ValidationError(e).to_api_error(&locale, &app_state.i18n_store))?;

    let chamado = app_state
        .chamado_service
        .concluir(&user, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(chamado))
}

#[utoipa::path(
    post,
    path = "/api/chamados/{id}/pecas",
    tag = "Chamados",
    request_body = ConsumirPecaPayload,
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 201, description = "Consumo registrado", body = Movimentacao),
        (status = 409, description = "Estoque insuficiente")
    ),
    security(("api_jwt" = []))
)]
pub async fn consumir_peca(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    _guard: RequirePermission<PermPecasMovimentar>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConsumirPecaPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let movimento = app_state
        .chamado_service
        .consumir_peca(&user, id, payload)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(movimento)))
}

#[utoipa::path(
    get,
    path = "/api/chamados/{id}/pdf",
    tag = "Chamados",
    params(("id" = Uuid, Path, description = "ID do chamado")),
    responses(
        (status = 200, description = "Ordem de serviço em PDF", body = Vec<u8>, content_type = "application/pdf"),
        (status = 404, description = "Chamado não encontrado")
    ),
    security(("api_jwt" = []))
)]
pub async fn chamado_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    AuthenticatedUser(user): AuthenticatedUser,
    Path(id): Path<Uuid>,
) -> Result<Response, ApiError> {
    let chamado = app_state
        .chamado_service
        .get(&user, id)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;
    let numero = chamado.numero;

    let pdf_bytes = app_state
        .document_service
        .generate_chamado_pdf(chamado)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    // Configura os Headers para o navegador baixar ou mostrar o PDF
    let headers = [
        (header::CONTENT_TYPE, "application/pdf".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"chamado_{}.pdf\"", numero),
        ),
    ];

    Ok((headers, pdf_bytes).into_response())
}
