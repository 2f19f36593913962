// src/config.rs

use std::{env, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::{
    common::i18n::I18nStore,
    db::{
        AgendaRepository, AnalyticsRepository, CausaRaizRepository, ChamadoRepository,
        ChecklistRepository, MaquinaRepository, PecaRepository, PlanoRepository, UserRepository,
    },
    services::{
        agenda_service::AgendaService, analytics_service::AnalyticsService, auth::AuthService,
        catalog_service::CatalogService, chamado_service::ChamadoService,
        checklist_service::ChecklistService, document_service::DocumentService,
        event_bus::EventBus, peca_service::PecaService, plano_service::PlanoService,
    },
};

/// Dados do administrador criado na primeira subida.
#[derive(Debug, Clone)]
pub struct AdminBootstrap {
    pub nome: String,
    pub email: String,
    pub senha: String,
}

// Configuração lida do ambiente (e do .env, se existir)
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub bind_addr: String,
    pub database_max_connections: u32,
    pub jwt_expiration_days: i64,
    pub fonts_dir: String,
    pub cors_origin: Option<String>,
    pub admin: Option<AdminBootstrap>,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Monta a configuração a partir de uma função de busca (o ambiente, ou um mapa nos testes).
    pub fn from_lookup<F>(get: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = get("DATABASE_URL").context("DATABASE_URL deve ser definida")?;
        let jwt_secret = get("JWT_SECRET").context("JWT_SECRET deve ser definido")?;

        let database_max_connections = match get("DATABASE_MAX_CONNECTIONS") {
            Some(v) => v.parse().context("DATABASE_MAX_CONNECTIONS deve ser um número")?,
            None => 5,
        };
        let jwt_expiration_days = match get("JWT_EXPIRATION_DAYS") {
            Some(v) => v.parse().context("JWT_EXPIRATION_DAYS deve ser um número")?,
            None => 7,
        };

        let admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(senha)) => Some(AdminBootstrap {
                nome: get("ADMIN_NAME").unwrap_or_else(|| "Administrador".to_string()),
                email,
                senha,
            }),
            _ => None,
        };

        Ok(Self {
            database_url,
            jwt_secret,
            bind_addr: get("BIND_ADDR").unwrap_or_else(|| "0.0.0.0:3000".to_string()),
            database_max_connections,
            jwt_expiration_days,
            fonts_dir: get("FONTS_DIR").unwrap_or_else(|| "./fonts".to_string()),
            cors_origin: get("CORS_ORIGIN").filter(|v| !v.is_empty()),
            admin,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub db_pool: PgPool,
    pub config: Arc<Config>,
    pub i18n_store: Arc<I18nStore>,
    pub events: EventBus,

    pub auth_service: AuthService,
    pub catalog_service: CatalogService,
    pub chamado_service: ChamadoService,
    pub agenda_service: AgendaService,
    pub plano_service: PlanoService,
    pub peca_service: PecaService,
    pub checklist_service: ChecklistService,
    pub analytics_service: AnalyticsService,
    pub document_service: DocumentService,
}

impl AppState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        // Conecta ao banco de dados, usando '?' para propagar erros
        let db_pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .acquire_timeout(Duration::from_secs(3))
            .connect(&config.database_url)
            .await
            .context("Falha ao conectar ao banco de dados")?;

        tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

        Self::from_pool(config, db_pool)
    }

    // --- Monta o gráfico de dependências ---
    pub fn from_pool(config: Config, db_pool: PgPool) -> anyhow::Result<Self> {
        let i18n_store = Arc::new(I18nStore::load()?);
        let events = EventBus::new();

        let user_repo = UserRepository::new(db_pool.clone());
        let maquina_repo = MaquinaRepository::new(db_pool.clone());
        let causa_repo = CausaRaizRepository::new(db_pool.clone());
        let chamado_repo = ChamadoRepository::new(db_pool.clone());
        let agenda_repo = AgendaRepository::new(db_pool.clone());
        let plano_repo = PlanoRepository::new(db_pool.clone());
        let peca_repo = PecaRepository::new(db_pool.clone());
        let checklist_repo = ChecklistRepository::new(db_pool.clone());
        let analytics_repo = AnalyticsRepository::new(db_pool.clone());

        let auth_service = AuthService::new(
            user_repo,
            config.jwt_secret.clone(),
            config.jwt_expiration_days,
            events.clone(),
        );
        let catalog_service = CatalogService::new(
            maquina_repo.clone(),
            causa_repo.clone(),
            events.clone(),
        );
        let peca_service = PecaService::new(peca_repo.clone(), db_pool.clone(), events.clone());
        let chamado_service = ChamadoService::new(
            chamado_repo.clone(),
            maquina_repo.clone(),
            causa_repo,
            agenda_repo.clone(),
            plano_repo.clone(),
            peca_service.clone(),
            db_pool.clone(),
            events.clone(),
        );
        let agenda_service = AgendaService::new(
            agenda_repo,
            maquina_repo.clone(),
            plano_repo.clone(),
            chamado_repo.clone(),
            db_pool.clone(),
            events.clone(),
        );
        let plano_service = PlanoService::new(
            plano_repo,
            maquina_repo.clone(),
            chamado_repo.clone(),
            db_pool.clone(),
            events.clone(),
        );
        let checklist_service = ChecklistService::new(
            checklist_repo,
            maquina_repo,
            chamado_repo.clone(),
            db_pool.clone(),
            events.clone(),
        );
        let analytics_service = AnalyticsService::new(analytics_repo);
        let document_service = DocumentService::new(chamado_repo, config.fonts_dir.clone());

        Ok(Self {
            db_pool,
            config: Arc::new(config),
            i18n_store,
            events,
            auth_service,
            catalog_service,
            chamado_service,
            agenda_service,
            plano_service,
            peca_service,
            checklist_service,
            analytics_service,
            document_service,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_optional_vars_are_missing() {
        let config = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://localhost/chamados"),
            ("JWT_SECRET", "segredo"),
        ]))
        .unwrap();

        assert_eq!(config.bind_addr, "0.0.0.0:3000");
        assert_eq!(config.database_max_connections, 5);
        assert_eq!(config.jwt_expiration_days, 7);
        assert_eq!(config.fonts_dir, "./fonts");
        assert!(config.cors_origin.is_none());
        assert!(config.admin.is_none());
    }

    #[test]
    fn missing_jwt_secret_is_an_error() {
        let err = Config::from_lookup(lookup(&[("DATABASE_URL", "postgres://x")])).unwrap_err();
        assert!(err.to_string().contains("JWT_SECRET"));
    }

    #[test]
    fn admin_bootstrap_needs_email_and_password() {
        let only_email = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("ADMIN_EMAIL", "admin@fabrica.com"),
        ]))
        .unwrap();
        assert!(only_email.admin.is_none());

        let full = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("ADMIN_EMAIL", "admin@fabrica.com"),
            ("ADMIN_PASSWORD", "troque-me"),
        ]))
        .unwrap();
        let admin = full.admin.unwrap();
        assert_eq!(admin.nome, "Administrador");
        assert_eq!(admin.email, "admin@fabrica.com");
    }

    #[test]
    fn invalid_numbers_are_reported() {
        let err = Config::from_lookup(lookup(&[
            ("DATABASE_URL", "postgres://x"),
            ("JWT_SECRET", "s"),
            ("DATABASE_MAX_CONNECTIONS", "muitas"),
        ]))
        .unwrap_err();
        assert!(err.to_string().contains("DATABASE_MAX_CONNECTIONS"));
    }
}
