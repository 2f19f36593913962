// src/handlers/relatorios.rs

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermAnalyticsLer, RequirePermission},
    },
    models::analytics::PeriodoFilter,
};

#[utoipa::path(
    get,
    path = "/api/relatorios/chamados.pdf",
    tag = "Relatórios",
    params(PeriodoFilter),
    responses(
        (status = 200, description = "Relatório de chamados do período", body = Vec<u8>, content_type = "application/pdf"),
        (status = 400, description = "Período inválido"),
        (status = 500, description = "Fonte não encontrada em FONTS_DIR")
    ),
    security(("api_jwt" = []))
)]
pub async fn chamados_pdf(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAnalyticsLer>,
    Query(periodo): Query<PeriodoFilter>,
) -> Result<Response, ApiError> {
    let pdf_bytes = app_state
        .document_service
        .generate_period_pdf(periodo.desde, periodo.ate)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    let headers = [
        (header::CONTENT_TYPE, "application/pdf"),
        (header::CONTENT_DISPOSITION, "attachment; filename=\"relatorio_chamados.pdf\""),
    ];

    Ok((headers, pdf_bytes).into_response())
}
