// src/services/plano_service.rs

use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, tempo::hoje},
    db::{ChamadoRepository, MaquinaRepository, PlanoRepository},
    models::{
        auth::Usuario,
        chamados::{build_checklist, clean_tasks, Chamado, ChamadoStatus, NovoChamado},
        planos::{due_window_end, CreatePlanoPayload, Plano, PlanoFilter, UpdatePlanoPayload},
    },
    services::event_bus::{EventBus, Topic},
};

/// Planos preventivos e preditivos (mesma tabela, separados pelo `tipo`).
#[derive(Clone)]
pub struct PlanoService {
    plano_repo: PlanoRepository,
    maquina_repo: MaquinaRepository,
    chamado_repo: ChamadoRepository,
    pool: PgPool,
    events: EventBus,
}

impl PlanoService {
    pub fn new(
        plano_repo: PlanoRepository,
        maquina_repo: MaquinaRepository,
        chamado_repo: ChamadoRepository,
        pool: PgPool,
        events: EventBus,
    ) -> Self {
        Self { plano_repo, maquina_repo, chamado_repo, pool, events }
    }

    pub async fn list(&self, filter: &PlanoFilter) -> Result<Vec<Plano>, AppError> {
        self.plano_repo.list(filter).await
    }

    /// Planos ativos que vencem nos próximos `dias` (os atrasados entram também).
    pub async fn list_due(&self, dias: i64) -> Result<Vec<Plano>, AppError> {
        let limite = due_window_end(hoje(), dias);
        self.plano_repo.list_due(limite).await
    }

    pub async fn get(&self, id: Uuid) -> Result<Plano, AppError> {
        self.plano_repo.find_by_id(&self.pool, id).await
    }

    pub async fn create(&self, mut payload: CreatePlanoPayload) -> Result<Plano, AppError> {
        let maquina = self.maquina_repo.get(payload.maquina_id).await?;
        payload.tarefas = clean_tasks(payload.tarefas);

        let plano = self.plano_repo.create(&self.pool, &payload, &maquina.nome).await?;

        tracing::info!(plano_id = %plano.id, tipo = ?plano.tipo, "Plano criado para {}", maquina.nome);
        self.events.publish(Topic::Planos);
        Ok(plano)
    }

    pub async fn update(&self, id: Uuid, mut payload: UpdatePlanoPayload) -> Result<Plano, AppError> {
        payload.tarefas = payload.tarefas.map(clean_tasks);
        let plano = self.plano_repo.update(id, &payload).await?;
        self.events.publish(Topic::Planos);
        Ok(plano)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        self.plano_repo.delete(id).await?;
        self.events.publish(Topic::Planos);
        Ok(())
    }

    /// Abre um chamado "Aberto" a partir do plano, com o checklist das tarefas.
    /// As datas do plano só avançam quando o chamado é concluído.
    pub async fn generate_ticket(&self, user: &Usuario, id: Uuid) -> Result<Chamado, AppError> {
        let plano = self.plano_repo.find_by_id(&self.pool, id).await?;

        let novo = NovoChamado {
            maquina_id: plano.maquina_id,
            maquina: plano.maquina.clone(),
            tipo: plano.tipo.chamado_tipo(),
            status: ChamadoStatus::Aberto,
            descricao: plano.descricao.clone(),
            operador_id: user.id,
            operador_nome: user.nome.clone(),
            manutentor_id: None,
            manutentor_nome: None,
            checklist: build_checklist(&plano.tarefas),
            agendamento_id: None,
            plano_id: Some(plano.id),
        };
        let chamado = self.chamado_repo.create(&self.pool, &novo).await?;

        tracing::info!(plano_id = %id, chamado_id = %chamado.id, "Chamado gerado a partir do plano");
        self.events.publish(Topic::Chamados);
        Ok(chamado)
    }
}
