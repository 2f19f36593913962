// src/services/chamado_service.rs

use chrono::Utc;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{
    common::{error::AppError, tempo::hoje},
    db::{AgendaRepository, CausaRaizRepository, ChamadoRepository, MaquinaRepository, PlanoRepository},
    models::{
        agenda::AgendamentoStatus,
        auth::Usuario,
        chamados::{
            Chamado, ChamadoAction, ChamadoFilter, ChamadoScope, ChamadoStatus,
            ChecklistTogglePayload, ConcluirChamadoPayload, ConsumirPecaPayload,
            CreateChamadoPayload, NovoChamado, Observacao,
        },
        pecas::{Movimentacao, MovimentacaoTipo, NovaMovimentacao},
        planos::next_due_date,
    },
    services::{
        event_bus::{EventBus, Topic},
        peca_service::PecaService,
    },
};

/// O ciclo de vida do chamado: Aberto → Em Andamento → Concluído.
/// Toda escrita acontece em transação com a linha do chamado travada.
#[derive(Clone)]
pub struct ChamadoService {
    chamado_repo: ChamadoRepository,
    maquina_repo: MaquinaRepository,
    causa_repo: CausaRaizRepository,
    agenda_repo: AgendaRepository,
    plano_repo: PlanoRepository,
    peca_service: PecaService,
    pool: PgPool,
    events: EventBus,
}

impl ChamadoService {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        chamado_repo: ChamadoRepository,
        maquina_repo: MaquinaRepository,
        causa_repo: CausaRaizRepository,
        agenda_repo: AgendaRepository,
        plano_repo: PlanoRepository,
        peca_service: PecaService,
        pool: PgPool,
        events: EventBus,
    ) -> Self {
        Self {
            chamado_repo,
            maquina_repo,
            causa_repo,
            agenda_repo,
            plano_repo,
            peca_service,
            pool,
            events,
        }
    }

    // --- LEITURA ---

    pub async fn list(&self, user: &Usuario, filter: &ChamadoFilter) -> Result<Vec<Chamado>, AppError> {
        self.chamado_repo.list(filter, ChamadoScope::for_user(user)).await
    }

    /// Busca respeitando a visibilidade do perfil (fora do escopo é tratado como inexistente).
    pub async fn get(&self, user: &Usuario, id: Uuid) -> Result<Chamado, AppError> {
        let chamado = self
            .chamado_repo
            .find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Chamado".into()))?;

        if !ChamadoScope::for_user(user).allows(&chamado) {
            return Err(AppError::ResourceNotFound("Chamado".into()));
        }
        Ok(chamado)
    }

    // --- ABERTURA ---

    pub async fn create(&self, user: &Usuario, payload: CreateChamadoPayload) -> Result<Chamado, AppError> {
        let maquina = self.maquina_repo.get(payload.maquina_id).await?;

        let novo = NovoChamado {
            maquina_id: maquina.id,
            maquina: maquina.nome,
            tipo: payload.tipo,
            status: ChamadoStatus::Aberto,
            descricao: payload.descricao.trim().to_string(),
            operador_id: user.id,
            operador_nome: user.nome.clone(),
            manutentor_id: None,
            manutentor_nome: None,
            checklist: Vec::new(),
            agendamento_id: None,
            plano_id: None,
        };
        let chamado = self.chamado_repo.create(&self.pool, &novo).await?;

        tracing::info!(chamado_id = %chamado.id, numero = chamado.numero, "Chamado aberto");
        self.events.publish(Topic::Chamados);
        Ok(chamado)
    }

    // --- ATENDIMENTO ---

    pub async fn assumir(&self, user: &Usuario, id: Uuid) -> Result<Chamado, AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = self.chamado_repo.lock_by_id(&mut *tx, id).await?;
        ChamadoAction::Assumir.apply(atual.status)?;

        let chamado = self.chamado_repo.assign(&mut *tx, id, user.id, &user.nome).await?;
        tx.commit().await?;

        tracing::info!(chamado_id = %id, manutentor_id = %user.id, "Chamado assumido");
        self.events.publish(Topic::Chamados);
        Ok(chamado)
    }

    pub async fn liberar(&self, user: &Usuario, id: Uuid) -> Result<Chamado, AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = self.chamado_repo.lock_by_id(&mut *tx, id).await?;
        ChamadoAction::Liberar.apply(atual.status)?;
        atual.check_maintainer(user)?;

        let chamado = self.chamado_repo.release(&mut *tx, id).await?;
        tx.commit().await?;

        self.events.publish(Topic::Chamados);
        Ok(chamado)
    }

    pub async fn toggle_checklist(
        &self,
        user: &Usuario,
        id: Uuid,
        payload: ChecklistTogglePayload,
    ) -> Result<Chamado, AppError> {
        let mut tx = self.pool.begin().await?;

        let mut atual = self.chamado_repo.lock_by_id(&mut *tx, id).await?;
        ChamadoAction::AtualizarChecklist.apply(atual.status)?;
        atual.check_maintainer(user)?;

        let item = atual
            .checklist
            .get_mut(payload.indice)
            .ok_or(AppError::ChecklistIndexOutOfRange(payload.indice))?;
        item.concluido = payload.concluido;

        let chamado = self
            .chamado_repo
            .update_checklist(&mut *tx, id, &atual.checklist)
            .await?;
        tx.commit().await?;

        self.events.publish(Topic::Chamados);
        Ok(chamado)
    }

    pub async fn add_observacao(&self, user: &Usuario, id: Uuid, texto: &str) -> Result<Chamado, AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = self.chamado_repo.lock_by_id(&mut *tx, id).await?;
        if !ChamadoScope::for_user(user).allows(&atual) {
            return Err(AppError::ResourceNotFound("Chamado".into()));
        }
        ChamadoAction::Observar.apply(atual.status)?;

        let observacao = Observacao {
            autor_id: user.id,
            autor_nome: user.nome.clone(),
            texto: texto.trim().to_string(),
            criado_em: Utc::now(),
        };
        let chamado = self.chamado_repo.push_observacao(&mut *tx, id, &observacao).await?;
        tx.commit().await?;

        self.events.publish(Topic::Chamados);
        Ok(chamado)
    }

    // --- CONCLUSÃO (com efeitos no agendamento e no plano) ---

    pub async fn concluir(
        &self,
        user: &Usuario,
        id: Uuid,
        payload: ConcluirChamadoPayload,
    ) -> Result<Chamado, AppError> {
        let causa = payload
            .causa
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty());

        let mut tx = self.pool.begin().await?;

        let atual = self.chamado_repo.lock_by_id(&mut *tx, id).await?;
        atual.check_maintainer(user)?;
        atual.check_can_conclude(causa)?;

        // A causa precisa existir no cadastro (também quando é opcional)
        if let Some(nome) = causa {
            if !self.causa_repo.exists_by_name(&mut *tx, nome).await? {
                return Err(AppError::UnknownRootCause(nome.to_string()));
            }
        }

        let chamado = self
            .chamado_repo
            .conclude(&mut *tx, id, payload.solucao.trim(), causa)
            .await?;

        let mut topics = vec![Topic::Chamados];

        // 1. Agendamento vinculado → concluído
        if let Some(agendamento_id) = chamado.agendamento_id {
            self.agenda_repo
                .set_status(&mut *tx, agendamento_id, AgendamentoStatus::Concluido, None)
                .await?;
            topics.push(Topic::Agendamentos);
        }

        // 2. Plano vinculado → última execução hoje, próxima daqui a `frequencia_dias`
        if let Some(plano_id) = chamado.plano_id {
            let plano = self.plano_repo.find_by_id(&mut *tx, plano_id).await?;
            let executado_em = hoje();
            let proxima = next_due_date(executado_em, plano.frequencia_dias);
            self.plano_repo
                .register_execution(&mut *tx, plano_id, executado_em, proxima)
                .await?;
            topics.push(Topic::Planos);
        }

        tx.commit().await?;

        tracing::info!(chamado_id = %id, numero = chamado.numero, "Chamado concluído");
        self.events.publish_all(&topics);
        Ok(chamado)
    }

    // --- PEÇAS ---

    pub async fn consumir_peca(
        &self,
        user: &Usuario,
        id: Uuid,
        payload: ConsumirPecaPayload,
    ) -> Result<Movimentacao, AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = self.chamado_repo.lock_by_id(&mut *tx, id).await?;
        ChamadoAction::ConsumirPeca.apply(atual.status)?;
        atual.check_maintainer(user)?;

        let movimento = NovaMovimentacao {
            tipo: MovimentacaoTipo::Saida,
            quantidade: payload.quantidade,
            chamado_id: Some(id),
            usuario_id: Some(user.id),
            observacao: Some(format!("Consumo no chamado #{}", atual.numero)),
        };
        let (_, registro) = self
            .peca_service
            .apply_in_tx(&mut *tx, payload.peca_id, &movimento)
            .await?;

        tx.commit().await?;

        self.events.publish(Topic::Pecas);
        Ok(registro)
    }

    /// Exclui o chamado. Um agendamento iniciado por ele volta para `agendado`.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let mut tx = self.pool.begin().await?;

        let atual = self.chamado_repo.lock_by_id(&mut *tx, id).await?;
        let mut topics = vec![Topic::Chamados];

        if let Some(agendamento_id) = atual.agendamento_id {
            let agendamento = self.agenda_repo.lock_by_id(&mut *tx, agendamento_id).await?;
            if agendamento.status != AgendamentoStatus::Concluido {
                self.agenda_repo.reset(&mut *tx, agendamento_id).await?;
                topics.push(Topic::Agendamentos);
            }
        }

        self.chamado_repo.delete(&mut *tx, id).await?;
        tx.commit().await?;

        tracing::info!(chamado_id = %id, "Chamado excluído");
        self.events.publish_all(&topics);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use sqlx::PgPool;
    use uuid::Uuid;

    use crate::{
        common::{error::AppError, tempo::hoje},
        models::{
            agenda::AgendamentoStatus,
            auth::Role,
            causas::CreateCausaRaizPayload,
            chamados::{
                Chamado, ChamadoFilter, ChamadoStatus, ChamadoTipo, ChecklistTogglePayload,
                ConcluirChamadoPayload, CreateChamadoPayload,
            },
            planos::next_due_date,
        },
        services::test_support::{agendamento, estado, maquina, plano, usuario},
    };

    #[sqlx::test]
    async fn concluding_a_started_preventive_closes_schedule_and_advances_plan(pool: PgPool) {
        let state = estado(pool);
        let manutentor = usuario(&state, "Marcos", Role::Manutentor).await;
        let torno = maquina(&state, "Torno 1", &[]).await;
        let plano = plano(&state, &torno, 30, &["Drenar óleo", "Trocar filtro"]).await;
        let agenda = agendamento(&state, &torno, Some(plano.id)).await;

        let chamado = state.agenda_service.iniciar(&manutentor, agenda.id).await.unwrap();
        for indice in 0..chamado.checklist.len() {
            state
                .chamado_service
                .toggle_checklist(&manutentor, chamado.id, ChecklistTogglePayload { indice, concluido: true })
                .await
                .unwrap();
        }

        let concluido = state
            .chamado_service
            .concluir(
                &manutentor,
                chamado.id,
                ConcluirChamadoPayload { solucao: "Óleo trocado".into(), causa: None },
            )
            .await
            .unwrap();
        assert_eq!(concluido.status, ChamadoStatus::Concluido);
        assert!(concluido.concluido_em.is_some());

        let agenda = state.agenda_service.get(agenda.id).await.unwrap();
        assert_eq!(agenda.status, AgendamentoStatus::Concluido);
        assert_eq!(agenda.chamado_id, Some(chamado.id));

        let plano = state.plano_service.get(plano.id).await.unwrap();
        assert_eq!(plano.ultima_data, Some(hoje()));
        assert_eq!(plano.proxima_data, next_due_date(hoje(), 30));
    }

    #[sqlx::test]
    async fn deleting_a_started_ticket_puts_its_schedule_back(pool: PgPool) {
        let state = estado(pool);
        let gestor = usuario(&state, "Gabriela", Role::Gestor).await;
        let prensa = maquina(&state, "Prensa 2", &["Verificar pressão"]).await;
        let agenda = agendamento(&state, &prensa, None).await;

        let chamado = state.agenda_service.iniciar(&gestor, agenda.id).await.unwrap();
        state.chamado_service.delete(chamado.id).await.unwrap();

        let agenda = state.agenda_service.get(agenda.id).await.unwrap();
        assert_eq!(agenda.status, AgendamentoStatus::Agendado);
        assert_eq!(agenda.chamado_id, None);

        // Continua utilizável: pode ser iniciado de novo
        let novo = state.agenda_service.iniciar(&gestor, agenda.id).await.unwrap();
        assert_eq!(novo.agendamento_id, Some(agenda.id));
    }

    #[sqlx::test]
    async fn deleting_a_concluded_ticket_keeps_its_schedule_concluded(pool: PgPool) {
        let state = estado(pool);
        let gestor = usuario(&state, "Gabriela", Role::Gestor).await;
        let prensa = maquina(&state, "Prensa 3", &[]).await;
        let agenda = agendamento(&state, &prensa, None).await;

        let chamado = state.agenda_service.iniciar(&gestor, agenda.id).await.unwrap();
        state
            .chamado_service
            .concluir(&gestor, chamado.id, ConcluirChamadoPayload { solucao: "Ok".into(), causa: None })
            .await
            .unwrap();
        state.chamado_service.delete(chamado.id).await.unwrap();

        let agenda = state.agenda_service.get(agenda.id).await.unwrap();
        assert_eq!(agenda.status, AgendamentoStatus::Concluido);

        assert!(matches!(
            state.chamado_service.delete(chamado.id).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[sqlx::test]
    async fn list_only_shows_what_each_role_may_see(pool: PgPool) {
        let state = estado(pool);
        let ana = usuario(&state, "Ana", Role::Operador).await;
        let bruno = usuario(&state, "Bruno", Role::Operador).await;
        let marcos = usuario(&state, "Marcos", Role::Manutentor).await;
        let rita = usuario(&state, "Rita", Role::Manutentor).await;
        let gestor = usuario(&state, "Gabriela", Role::Gestor).await;
        let torno = maquina(&state, "Torno 1", &[]).await;

        let abrir = |descricao: &str| CreateChamadoPayload {
            maquina_id: torno.id,
            tipo: ChamadoTipo::Corretiva,
            descricao: descricao.into(),
        };
        let livre = state.chamado_service.create(&ana, abrir("Vazamento de óleo")).await.unwrap();
        let do_marcos = state.chamado_service.create(&ana, abrir("Ruído no eixo")).await.unwrap();
        let da_rita = state.chamado_service.create(&bruno, abrir("Motor aquecendo")).await.unwrap();
        state.chamado_service.assumir(&marcos, do_marcos.id).await.unwrap();
        state.chamado_service.assumir(&rita, da_rita.id).await.unwrap();

        let ids = |lista: Vec<Chamado>| {
            let mut ids: Vec<_> = lista.into_iter().map(|c| c.id).collect();
            ids.sort();
            ids
        };
        let ordenados = |mut v: Vec<Uuid>| {
            v.sort();
            v
        };
        let filtro = ChamadoFilter::default();

        let da_ana = state.chamado_service.list(&ana, &filtro).await.unwrap();
        assert_eq!(ids(da_ana), ordenados(vec![livre.id, do_marcos.id]));

        let do_manutentor = state.chamado_service.list(&marcos, &filtro).await.unwrap();
        assert_eq!(ids(do_manutentor), ordenados(vec![livre.id, do_marcos.id]));

        let todos = state.chamado_service.list(&gestor, &filtro).await.unwrap();
        assert_eq!(todos.len(), 3);

        assert!(matches!(
            state.chamado_service.get(&bruno, livre.id).await,
            Err(AppError::ResourceNotFound(_))
        ));
        assert!(matches!(
            state.chamado_service.get(&marcos, da_rita.id).await,
            Err(AppError::ResourceNotFound(_))
        ));
    }

    #[sqlx::test]
    async fn date_filter_includes_tickets_opened_today(pool: PgPool) {
        let state = estado(pool);
        let ana = usuario(&state, "Ana", Role::Operador).await;
        let torno = maquina(&state, "Torno 1", &[]).await;
        let chamado = state
            .chamado_service
            .create(
                &ana,
                CreateChamadoPayload {
                    maquina_id: torno.id,
                    tipo: ChamadoTipo::Corretiva,
                    descricao: "Correia solta".into(),
                },
            )
            .await
            .unwrap();

        let de_hoje = ChamadoFilter { desde: Some(hoje()), ate: Some(hoje()), ..Default::default() };
        let lista = state.chamado_service.list(&ana, &de_hoje).await.unwrap();
        assert_eq!(lista.len(), 1);
        assert_eq!(lista[0].id, chamado.id);

        let ontem = hoje().pred_opt();
        let so_ontem = ChamadoFilter { desde: ontem, ate: ontem, ..Default::default() };
        assert!(state.chamado_service.list(&ana, &so_ontem).await.unwrap().is_empty());
    }

    #[sqlx::test]
    async fn machine_and_root_cause_in_use_cannot_be_deleted(pool: PgPool) {
        let state = estado(pool);
        let ana = usuario(&state, "Ana", Role::Operador).await;
        let marcos = usuario(&state, "Marcos", Role::Manutentor).await;
        let torno = maquina(&state, "Torno 1", &[]).await;
        let sobra = maquina(&state, "Furadeira", &[]).await;
        let causa = state
            .catalog_service
            .create_causa(CreateCausaRaizPayload { nome: "Desgaste natural".into(), descricao: None })
            .await
            .unwrap();

        let chamado = state
            .chamado_service
            .create(
                &ana,
                CreateChamadoPayload {
                    maquina_id: torno.id,
                    tipo: ChamadoTipo::Corretiva,
                    descricao: "Rolamento travado".into(),
                },
            )
            .await
            .unwrap();
        state.chamado_service.assumir(&marcos, chamado.id).await.unwrap();
        state
            .chamado_service
            .concluir(
                &marcos,
                chamado.id,
                ConcluirChamadoPayload {
                    solucao: "Rolamento substituído".into(),
                    causa: Some(" Desgaste natural ".into()),
                },
            )
            .await
            .unwrap();

        assert!(matches!(
            state.catalog_service.delete_maquina(torno.id).await,
            Err(AppError::MachineInUse)
        ));
        assert!(matches!(
            state.catalog_service.delete_causa(causa.id).await,
            Err(AppError::RootCauseInUse)
        ));
        state.catalog_service.delete_maquina(sobra.id).await.unwrap();
    }

    #[sqlx::test]
    async fn corrective_ticket_rejects_unknown_root_cause(pool: PgPool) {
        let state = estado(pool);
        let ana = usuario(&state, "Ana", Role::Operador).await;
        let marcos = usuario(&state, "Marcos", Role::Manutentor).await;
        let torno = maquina(&state, "Torno 1", &[]).await;
        let chamado = state
            .chamado_service
            .create(
                &ana,
                CreateChamadoPayload {
                    maquina_id: torno.id,
                    tipo: ChamadoTipo::Corretiva,
                    descricao: "Painel apagado".into(),
                },
            )
            .await
            .unwrap();
        state.chamado_service.assumir(&marcos, chamado.id).await.unwrap();

        let resultado = state
            .chamado_service
            .concluir(
                &marcos,
                chamado.id,
                ConcluirChamadoPayload { solucao: "Fusível".into(), causa: Some("Inexistente".into()) },
            )
            .await;
        assert!(matches!(resultado, Err(AppError::UnknownRootCause(_))));

        // Nada mudou: o chamado segue em andamento
        let atual = state.chamado_service.get(&marcos, chamado.id).await.unwrap();
        assert_eq!(atual.status, ChamadoStatus::EmAndamento);
    }
}
