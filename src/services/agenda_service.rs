// src/services/agenda_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::{AgendaRepository, ChamadoRepository, MaquinaRepository, PlanoRepository},
    models::{
        agenda::{
            AgendaFilter, Agendamento, AgendamentoStatus, CalendarEvent, CreateAgendamentoPayload,
            UpdateAgendamentoPayload,
        },
        auth::Usuario,
        chamados::{build_checklist, Chamado, ChamadoStatus, ChamadoTipo, NovoChamado},
    },
    services::event_bus::{EventBus, Topic},
};

#[derive(Clone)]
pub struct AgendaService {
    agenda_repo: AgendaRepository,
    maquina_repo: MaquinaRepository,
    plano_repo: PlanoRepository,
    chamado_repo: ChamadoRepository,
    pool: PgPool,
    events: EventBus,
}

impl AgendaService {
    pub fn new(
        agenda_repo: AgendaRepository,
        maquina_repo: MaquinaRepository,
        plano_repo: PlanoRepository,
        chamado_repo: ChamadoRepository,
        pool: PgPool,
        events: EventBus,
    ) -> Self {
        Self { agenda_repo, maquina_repo, plano_repo, chamado_repo, pool, events }
    }

    /// Eventos do calendário com a cor da legenda já calculada.
    pub async fn calendar(&self, filter: &AgendaFilter) -> Result<Vec<CalendarEvent>, AppError> {
        if let (Some(inicio), Some(fim)) = (filter.inicio, filter.fim) {
            if fim < inicio {
                return Err(AppError::InvalidPeriod);
            }
        }

        let agendamentos = self.agenda_repo.list_window(filter.inicio, filter.fim).await?;
        let now = Utc::now();
        Ok(agendamentos
            .iter()
            .map(|a| CalendarEvent::from_agendamento(a, now))
            .collect())
    }

    pub async fn get(&self, id: Uuid) -> Result<Agendamento, AppError> {
        self.agenda_repo.find_by_id(&self.pool, id).await
    }

    pub async fn create(&self, payload: CreateAgendamentoPayload) -> Result<Agendamento, AppError> {
        payload.validate_consistency().map_err(|_| AppError::InvalidPeriod)?;

        let maquina = self.maquina_repo.get(payload.maquina_id).await?;
        if let Some(plano_id) = payload.plano_id {
            // Garante que o plano existe (404 claro em vez de erro de FK)
            self.plano_repo.find_by_id(&self.pool, plano_id).await?;
        }

        let agendamento = self
            .agenda_repo
            .create(
                &self.pool,
                maquina.id,
                &maquina.nome,
                payload.plano_id,
                payload.descricao.trim(),
                payload.inicio,
                payload.fim,
            )
            .await?;

        tracing::info!(agendamento_id = %agendamento.id, "Preventiva agendada para {}", maquina.nome);
        self.events.publish(Topic::Agendamentos);
        Ok(agendamento)
    }

    pub async fn update(&self, id: Uuid, payload: UpdateAgendamentoPayload) -> Result<Agendamento, AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = self.agenda_repo.lock_by_id(&mut *tx, id).await?;
        atual.check_editable()?;
        let (inicio, fim) = payload.resulting_period(&atual)?;

        let agendamento = self
            .agenda_repo
            .reschedule(&mut *tx, id, payload.descricao.as_deref().map(str::trim), inicio, fim)
            .await?;
        tx.commit().await?;

        self.events.publish(Topic::Agendamentos);
        Ok(agendamento)
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = self.agenda_repo.lock_by_id(&mut *tx, id).await?;
        atual.check_editable()?;
        self.agenda_repo.delete(&mut *tx, id).await?;

        tx.commit().await?;
        self.events.publish(Topic::Agendamentos);
        Ok(())
    }

    /// Inicia a preventiva: abre o chamado já em andamento com o usuário como manutentor.
    pub async fn iniciar(&self, user: &Usuario, id: Uuid) -> Result<Chamado, AppError> {
        let mut tx = self.pool.begin().await?;

        let agendamento = self.agenda_repo.lock_by_id(&mut *tx, id).await?;
        if agendamento.status != AgendamentoStatus::Agendado {
            return Err(AppError::ScheduleLocked);
        }

        // Checklist: tarefas do plano ou, sem plano, o checklist diário da máquina
        let tarefas = match agendamento.plano_id {
            Some(plano_id) => self.plano_repo.find_by_id(&mut *tx, plano_id).await?.tarefas,
            None => self
                .maquina_repo
                .find_by_id(&mut *tx, agendamento.maquina_id)
                .await?
                .map(|m| m.checklist_diario)
                .unwrap_or_default(),
        };

        let novo = NovoChamado {
            maquina_id: agendamento.maquina_id,
            maquina: agendamento.maquina.clone(),
            tipo: ChamadoTipo::Preventiva,
            status: ChamadoStatus::EmAndamento,
            descricao: agendamento.descricao.clone(),
            operador_id: user.id,
            operador_nome: user.nome.clone(),
            manutentor_id: Some(user.id),
            manutentor_nome: Some(user.nome.clone()),
            checklist: build_checklist(&tarefas),
            agendamento_id: Some(agendamento.id),
            plano_id: agendamento.plano_id,
        };
        let chamado = self.chamado_repo.create(&mut *tx, &novo).await?;

        self.agenda_repo
            .set_status(&mut *tx, id, AgendamentoStatus::Iniciado, Some(chamado.id))
            .await?;

        tx.commit().await?;

        tracing::info!(
            agendamento_id = %id,
            chamado_id = %chamado.id,
            "Preventiva iniciada"
        );
        self.events.publish_all(&[Topic::Chamados, Topic::Agendamentos]);
        Ok(chamado)
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;

    use crate::{
        common::error::AppError,
        models::{
            agenda::{AgendamentoStatus, UpdateAgendamentoPayload},
            auth::Role,
            chamados::{ChamadoStatus, ChamadoTipo},
        },
        services::test_support::{agendamento, estado, maquina, plano, usuario},
    };

    #[sqlx::test]
    async fn iniciar_opens_preventive_ticket_with_plan_tasks(pool: PgPool) {
        let state = estado(pool);
        let marcos = usuario(&state, "Marcos", Role::Manutentor).await;
        let torno = maquina(&state, "Torno 1", &["Verificar nível de óleo"]).await;
        let plano = plano(&state, &torno, 15, &["Drenar óleo", "Trocar filtro"]).await;
        let agenda = agendamento(&state, &torno, Some(plano.id)).await;

        let chamado = state.agenda_service.iniciar(&marcos, agenda.id).await.unwrap();

        assert_eq!(chamado.tipo, ChamadoTipo::Preventiva);
        assert_eq!(chamado.status, ChamadoStatus::EmAndamento);
        assert_eq!(chamado.manutentor_id, Some(marcos.id));
        assert!(chamado.assumido_em.is_some());
        assert_eq!(chamado.agendamento_id, Some(agenda.id));
        assert_eq!(chamado.plano_id, Some(plano.id));
        let itens: Vec<&str> = chamado.checklist.iter().map(|i| i.item.as_str()).collect();
        assert_eq!(itens, vec!["Drenar óleo", "Trocar filtro"]);
        assert!(chamado.checklist.iter().all(|i| !i.concluido));

        let agenda = state.agenda_service.get(agenda.id).await.unwrap();
        assert_eq!(agenda.status, AgendamentoStatus::Iniciado);
        assert_eq!(agenda.chamado_id, Some(chamado.id));
    }

    #[sqlx::test]
    async fn iniciar_without_plan_uses_the_machine_daily_checklist(pool: PgPool) {
        let state = estado(pool);
        let marcos = usuario(&state, "Marcos", Role::Manutentor).await;
        let prensa = maquina(&state, "Prensa 2", &["Testar botão de emergência"]).await;
        let agenda = agendamento(&state, &prensa, None).await;

        let chamado = state.agenda_service.iniciar(&marcos, agenda.id).await.unwrap();
        assert_eq!(chamado.checklist.len(), 1);
        assert_eq!(chamado.checklist[0].item, "Testar botão de emergência");
        assert_eq!(chamado.plano_id, None);
    }

    #[sqlx::test]
    async fn started_schedule_is_locked(pool: PgPool) {
        let state = estado(pool);
        let marcos = usuario(&state, "Marcos", Role::Manutentor).await;
        let torno = maquina(&state, "Torno 1", &[]).await;
        let agenda = agendamento(&state, &torno, None).await;

        state.agenda_service.iniciar(&marcos, agenda.id).await.unwrap();

        assert!(matches!(
            state.agenda_service.iniciar(&marcos, agenda.id).await,
            Err(AppError::ScheduleLocked)
        ));
        let reagendar = UpdateAgendamentoPayload { descricao: Some("Outra".into()), inicio: None, fim: None };
        assert!(matches!(
            state.agenda_service.update(agenda.id, reagendar).await,
            Err(AppError::ScheduleLocked)
        ));
        assert!(matches!(
            state.agenda_service.delete(agenda.id).await,
            Err(AppError::ScheduleLocked)
        ));
    }
}
