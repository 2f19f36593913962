// src/services/test_support.rs

// Montagem de estado para os testes de serviço com banco real.
// `#[sqlx::test]` cria um banco novo por teste e aplica ./migrations.

use chrono::{Duration, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::tempo::hoje,
    config::{AppState, Config},
    db::UserRepository,
    models::{
        agenda::{Agendamento, CreateAgendamentoPayload},
        auth::{Role, Usuario},
        maquinas::{CreateMaquinaPayload, Maquina},
        planos::{CreatePlanoPayload, Plano, PlanoTipo},
    },
};

pub fn estado(pool: PgPool) -> AppState {
    let config = Config::from_lookup(|key| match key {
        "DATABASE_URL" => Some("postgres://localhost/chamados_teste".to_string()),
        "JWT_SECRET" => Some("segredo-de-teste".to_string()),
        _ => None,
    })
    .unwrap();
    AppState::from_pool(config, pool).unwrap()
}

/// Usuário gravado direto no repositório (o hash não importa aqui).
pub async fn usuario(state: &AppState, nome: &str, role: Role) -> Usuario {
    let email = format!("{}@fabrica.com", Uuid::new_v4());
    UserRepository::new(state.db_pool.clone())
        .create_user(nome, &email, "$2b$04$hash-de-teste", role)
        .await
        .unwrap()
}

pub async fn maquina(state: &AppState, nome: &str, checklist: &[&str]) -> Maquina {
    state
        .catalog_service
        .create_maquina(CreateMaquinaPayload {
            nome: nome.into(),
            setor: Some("Usinagem".into()),
            checklist_diario: checklist.iter().map(|s| s.to_string()).collect(),
        })
        .await
        .unwrap()
}

pub async fn plano(state: &AppState, maquina: &Maquina, frequencia_dias: i32, tarefas: &[&str]) -> Plano {
    state
        .plano_service
        .create(CreatePlanoPayload {
            tipo: PlanoTipo::Preventivo,
            maquina_id: maquina.id,
            descricao: "Troca de óleo".into(),
            frequencia_dias,
            proxima_data: hoje(),
            tarefas: tarefas.iter().map(|s| s.to_string()).collect(),
            parametro: None,
        })
        .await
        .unwrap()
}

pub async fn agendamento(state: &AppState, maquina: &Maquina, plano_id: Option<Uuid>) -> Agendamento {
    let inicio = Utc::now() + Duration::hours(1);
    state
        .agenda_service
        .create(CreateAgendamentoPayload {
            maquina_id: maquina.id,
            plano_id,
            descricao: "Preventiva mensal".into(),
            inicio,
            fim: inicio + Duration::hours(2),
        })
        .await
        .unwrap()
}
