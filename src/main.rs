// src/main.rs

use anyhow::Context;
use axum::{
    http::HeaderValue,
    middleware as axum_middleware,
    routing::{delete, get, patch, post, put},
    Router,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::EnvFilter;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

mod common;
mod config;
mod db;
mod docs;
mod handlers;
mod middleware;
mod models;
mod services;

use crate::config::{AppState, Config};
use crate::docs::ApiDoc;
use crate::middleware::auth::auth_guard;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let config = Config::from_env()?;
    let bind_addr = config.bind_addr.clone();
    let admin = config.admin.clone();

    let app_state = AppState::new(config)
        .await
        .context("Falha ao inicializar o estado da aplicação")?;

    // Faz o app rodar as migrações do SQLx na inicialização
    sqlx::migrate!()
        .run(&app_state.db_pool)
        .await
        .context("Falha ao rodar as migrações do banco de dados")?;

    tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

    if let Some(admin) = admin {
        app_state.auth_service.ensure_admin(&admin).await?;
    }

    let app = build_router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Falha ao iniciar o listener TCP em {}", bind_addr))?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);

    axum::serve(listener, app).await.context("Erro no servidor Axum")?;
    Ok(())
}

fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    match origin {
        Some(origin) => match origin.parse::<HeaderValue>() {
            Ok(value) => layer.allow_origin(value),
            Err(_) => {
                tracing::warn!("CORS_ORIGIN inválido ({}), liberando qualquer origem", origin);
                layer.allow_origin(Any)
            }
        },
        None => layer.allow_origin(Any),
    }
}

pub fn build_router(app_state: AppState) -> Router {
    // Rotas públicas
    let public_routes = Router::new()
        .route("/health", get(|| async { "OK" }))
        .route("/auth/login", post(handlers::auth::login));

    let usuario_routes = Router::new()
        .route(
            "/",
            get(handlers::usuarios::list_usuarios).post(handlers::usuarios::create_usuario),
        )
        .route("/me", get(handlers::auth::get_me))
        .route("/{id}", patch(handlers::usuarios::update_usuario));

    let maquina_routes = Router::new()
        .route(
            "/",
            get(handlers::maquinas::list_maquinas).post(handlers::maquinas::create_maquina),
        )
        .route(
            "/{id}",
            get(handlers::maquinas::get_maquina)
                .put(handlers::maquinas::update_maquina)
                .delete(handlers::maquinas::delete_maquina),
        );

    let causa_routes = Router::new()
        .route(
            "/",
            get(handlers::causas::list_causas).post(handlers::causas::create_causa),
        )
        .route("/{id}", delete(handlers::causas::delete_causa));

    let chamado_routes = Router::new()
        .route(
            "/",
            get(handlers::chamados::list_chamados).post(handlers::chamados::create_chamado),
        )
        .route(
            "/{id}",
            get(handlers::chamados::get_chamado).delete(handlers::chamados::delete_chamado),
        )
        // Ciclo de vida
        .route("/{id}/assumir", post(handlers::chamados::assumir_chamado))
        .route("/{id}/liberar", post(handlers::chamados::liberar_chamado))
        .route("/{id}/checklist", patch(handlers::chamados::toggle_checklist))
        .route("/{id}/observacoes", post(handlers::chamados::add_observacao))
        .route("/{id}/concluir", post(handlers::chamados::concluir_chamado))
        .route("/{id}/pecas", post(handlers::chamados::consumir_peca))
        .route("/{id}/pdf", get(handlers::chamados::chamado_pdf));

    let agenda_routes = Router::new()
        .route(
            "/",
            get(handlers::agendamentos::list_agendamentos)
                .post(handlers::agendamentos::create_agendamento),
        )
        .route(
            "/{id}",
            get(handlers::agendamentos::get_agendamento)
                .put(handlers::agendamentos::update_agendamento)
                .delete(handlers::agendamentos::delete_agendamento),
        )
        .route("/{id}/iniciar", post(handlers::agendamentos::iniciar_agendamento));

    let plano_routes = Router::new()
        .route(
            "/",
            get(handlers::planos::list_planos).post(handlers::planos::create_plano),
        )
        .route("/vencendo", get(handlers::planos::list_planos_vencendo))
        .route(
            "/{id}",
            get(handlers::planos::get_plano)
                .put(handlers::planos::update_plano)
                .delete(handlers::planos::delete_plano),
        )
        .route("/{id}/gerar-chamado", post(handlers::planos::gerar_chamado));

    let peca_routes = Router::new()
        .route(
            "/",
            get(handlers::pecas::list_pecas).post(handlers::pecas::create_peca),
        )
        .route("/estoque-baixo", get(handlers::pecas::list_estoque_baixo))
        .route("/{id}", put(handlers::pecas::update_peca))
        .route(
            "/{id}/movimentacoes",
            get(handlers::pecas::list_movimentacoes).post(handlers::pecas::create_movimentacao),
        );

    let checklist_routes = Router::new()
        .route(
            "/",
            get(handlers::checklists::list_checklists).post(handlers::checklists::submit_checklist),
        )
        .route("/pendentes", get(handlers::checklists::list_pendentes));

    let analytics_routes = Router::new()
        .route("/resumo", get(handlers::analytics::get_resumo))
        .route("/maquinas", get(handlers::analytics::get_por_maquina))
        .route("/causas", get(handlers::analytics::get_pareto_causas))
        .route("/manutentores", get(handlers::analytics::get_por_manutentor));

    // Tudo abaixo exige JWT válido (cabeçalho ou ?token= no SSE)
    let protected_routes = Router::new()
        .nest("/usuarios", usuario_routes)
        .nest("/maquinas", maquina_routes)
        .nest("/causas-raiz", causa_routes)
        .nest("/chamados", chamado_routes)
        .nest("/agendamentos", agenda_routes)
        .nest("/planos", plano_routes)
        .nest("/pecas", peca_routes)
        .nest("/checklists", checklist_routes)
        .nest("/analytics", analytics_routes)
        .route("/relatorios/chamados.pdf", get(handlers::relatorios::chamados_pdf))
        .route("/eventos", get(handlers::eventos::stream_eventos))
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    let cors = cors_layer(app_state.config.cors_origin.as_deref());

    // Combina tudo no router principal
    Router::new()
        .nest("/api", public_routes.merge(protected_routes))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(app_state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use sqlx::postgres::PgPoolOptions;
    use std::collections::HashMap;
    use tower::ServiceExt;

    // Pool preguiçoso: as rotas testadas aqui nunca chegam ao banco.
    fn test_app() -> Router {
        let vars: HashMap<&str, &str> = HashMap::from([
            ("DATABASE_URL", "postgres://localhost/chamados_test"),
            ("JWT_SECRET", "segredo-de-teste"),
        ]);
        let config = Config::from_lookup(|key| vars.get(key).map(|v| v.to_string())).unwrap();
        let pool = PgPoolOptions::new()
            .connect_lazy(&config.database_url)
            .unwrap();
        build_router(AppState::from_pool(config, pool).unwrap())
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_is_public() {
        let response = test_app()
            .oneshot(Request::get("/api/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn tickets_require_a_token() {
        let response = test_app()
            .oneshot(Request::get("/api/chamados").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let body = body_json(response).await;
        assert!(body["error"].is_string());
    }

    #[tokio::test]
    async fn garbage_bearer_token_is_rejected() {
        let response = test_app()
            .oneshot(
                Request::get("/api/maquinas")
                    .header(header::AUTHORIZATION, "Bearer nao-e-um-jwt")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn event_stream_rejects_bad_query_token() {
        let response = test_app()
            .oneshot(
                Request::get("/api/eventos?token=invalido")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn login_validates_before_touching_the_database() {
        let response = test_app()
            .oneshot(
                Request::post("/api/auth/login")
                    .header(header::CONTENT_TYPE, "application/json")
                    .header(header::ACCEPT_LANGUAGE, "pt-BR")
                    .body(Body::from(r#"{"email":"nao-e-email","senha":"123"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["details"]["email"].is_array());
        assert!(body["details"]["senha"].is_array());
    }

    #[tokio::test]
    async fn openapi_document_is_served() {
        let response = test_app()
            .oneshot(Request::get("/api-docs/openapi.json").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["paths"]["/api/chamados/{id}/concluir"].is_object());
        assert!(body["components"]["securitySchemes"]["api_jwt"].is_object());
    }

    #[tokio::test]
    async fn unknown_routes_are_not_found() {
        let response = test_app()
            .oneshot(Request::get("/api/nao-existe").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
