// src/services/catalog_service.rs

use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{CausaRaizRepository, MaquinaRepository},
    models::{
        causas::{CausaRaiz, CreateCausaRaizPayload},
        chamados::clean_tasks,
        maquinas::{CreateMaquinaPayload, Maquina, UpdateMaquinaPayload},
    },
    services::event_bus::{EventBus, Topic},
};

/// Cadastros simples: máquinas e causas raiz.
#[derive(Clone)]
pub struct CatalogService {
    maquina_repo: MaquinaRepository,
    causa_repo: CausaRaizRepository,
    events: EventBus,
}

impl CatalogService {
    pub fn new(maquina_repo: MaquinaRepository, causa_repo: CausaRaizRepository, events: EventBus) -> Self {
        Self { maquina_repo, causa_repo, events }
    }

    // --- MÁQUINAS ---

    pub async fn list_maquinas(&self, ativa: Option<bool>) -> Result<Vec<Maquina>, AppError> {
        self.maquina_repo.list(ativa).await
    }

    pub async fn get_maquina(&self, id: Uuid) -> Result<Maquina, AppError> {
        self.maquina_repo.get(id).await
    }

    pub async fn create_maquina(&self, mut payload: CreateMaquinaPayload) -> Result<Maquina, AppError> {
        payload.checklist_diario = clean_tasks(payload.checklist_diario);
        let maquina = self.maquina_repo.create(&payload).await?;

        tracing::info!(maquina_id = %maquina.id, "Máquina cadastrada: {}", maquina.nome);
        self.events.publish(Topic::Maquinas);
        Ok(maquina)
    }

    pub async fn update_maquina(
        &self,
        id: Uuid,
        mut payload: UpdateMaquinaPayload,
    ) -> Result<Maquina, AppError> {
        payload.checklist_diario = payload.checklist_diario.map(clean_tasks);
        let maquina = self.maquina_repo.update(id, &payload).await?;
        self.events.publish(Topic::Maquinas);
        Ok(maquina)
    }

    pub async fn delete_maquina(&self, id: Uuid) -> Result<(), AppError> {
        self.maquina_repo.delete(id).await?;
        tracing::info!(maquina_id = %id, "Máquina excluída");
        self.events.publish(Topic::Maquinas);
        Ok(())
    }

    // --- CAUSAS RAIZ ---

    pub async fn list_causas(&self) -> Result<Vec<CausaRaiz>, AppError> {
        self.causa_repo.list().await
    }

    pub async fn create_causa(&self, payload: CreateCausaRaizPayload) -> Result<CausaRaiz, AppError> {
        let causa = self
            .causa_repo
            .create(payload.nome.trim(), payload.descricao.as_deref())
            .await?;
        self.events.publish(Topic::CausasRaiz);
        Ok(causa)
    }

    pub async fn delete_causa(&self, id: Uuid) -> Result<(), AppError> {
        self.causa_repo.delete(id).await?;
        self.events.publish(Topic::CausasRaiz);
        Ok(())
    }
}
