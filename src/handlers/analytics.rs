// src/handlers/analytics.rs

use axum::{
    extract::{Query, State},
    Json,
};

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{
        i18n::Locale,
        rbac::{PermAnalyticsLer, RequirePermission},
    },
    models::analytics::{CausaPareto, ManutentorStats, MaquinaStats, PeriodoFilter, Resumo},
};

#[utoipa::path(
    get,
    path = "/api/analytics/resumo",
    tag = "Analytics",
    params(PeriodoFilter),
    responses(
        (status = 200, description = "Indicadores gerais do período", body = Resumo),
        (status = 400, description = "Período inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn get_resumo(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAnalyticsLer>,
    Query(periodo): Query<PeriodoFilter>,
) -> Result<Json<Resumo>, ApiError> {
    let resumo = app_state
        .analytics_service
        .summary(&periodo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(resumo))
}

#[utoipa::path(
    get,
    path = "/api/analytics/maquinas",
    tag = "Analytics",
    params(PeriodoFilter),
    responses(
        (status = 200, description = "Chamados e MTTR por máquina", body = Vec<MaquinaStats>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_por_maquina(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAnalyticsLer>,
    Query(periodo): Query<PeriodoFilter>,
) -> Result<Json<Vec<MaquinaStats>>, ApiError> {
    let stats = app_state
        .analytics_service
        .by_machine(&periodo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}

#[utoipa::path(
    get,
    path = "/api/analytics/causas",
    tag = "Analytics",
    params(PeriodoFilter),
    responses(
        (status = 200, description = "Pareto das causas raiz", body = Vec<CausaPareto>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_pareto_causas(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAnalyticsLer>,
    Query(periodo): Query<PeriodoFilter>,
) -> Result<Json<Vec<CausaPareto>>, ApiError> {
    let pareto = app_state
        .analytics_service
        .root_cause_pareto(&periodo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(pareto))
}

#[utoipa::path(
    get,
    path = "/api/analytics/manutentores",
    tag = "Analytics",
    params(PeriodoFilter),
    responses(
        (status = 200, description = "Produtividade por manutentor", body = Vec<ManutentorStats>)
    ),
    security(("api_jwt" = []))
)]
pub async fn get_por_manutentor(
    State(app_state): State<AppState>,
    locale: Locale,
    _guard: RequirePermission<PermAnalyticsLer>,
    Query(periodo): Query<PeriodoFilter>,
) -> Result<Json<Vec<ManutentorStats>>, ApiError> {
    let stats = app_state
        .analytics_service
        .by_maintainer(&periodo)
        .await
        .map_err(|e| e.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(Json(stats))
}
