// src/services/checklist_service.rs

use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        tempo::{hoje, limites_do_dia},
    },
    db::{ChamadoRepository, ChecklistRepository, MaquinaRepository},
    models::{
        auth::Usuario,
        chamados::{ChamadoStatus, ChamadoTipo, NovoChamado},
        checklists::{
            non_conformity_description, ChecklistFilter, ChecklistPendente, ChecklistSubmission,
            CreateChecklistPayload,
        },
    },
    services::event_bus::{EventBus, Topic},
};

#[derive(Clone)]
pub struct ChecklistService {
    checklist_repo: ChecklistRepository,
    maquina_repo: MaquinaRepository,
    chamado_repo: ChamadoRepository,
    pool: PgPool,
    events: EventBus,
}

impl ChecklistService {
    pub fn new(
        checklist_repo: ChecklistRepository,
        maquina_repo: MaquinaRepository,
        chamado_repo: ChamadoRepository,
        pool: PgPool,
        events: EventBus,
    ) -> Self {
        Self { checklist_repo, maquina_repo, chamado_repo, pool, events }
    }

    pub async fn list(&self, filter: &ChecklistFilter) -> Result<Vec<ChecklistSubmission>, AppError> {
        self.checklist_repo.list(filter).await
    }

    pub async fn list_pending_today(&self) -> Result<Vec<ChecklistPendente>, AppError> {
        let (inicio, fim) = limites_do_dia(hoje());
        self.checklist_repo.list_pending(inicio, fim).await
    }

    /// Registra o checklist. Havendo item não conforme, abre um chamado corretivo
    /// na mesma transação e guarda o vínculo no envio.
    pub async fn submit(
        &self,
        user: &Usuario,
        payload: CreateChecklistPayload,
    ) -> Result<ChecklistSubmission, AppError> {
        let maquina = self.maquina_repo.get(payload.maquina_id).await?;

        let mut tx = self.pool.begin().await?;

        let chamado_id = match non_conformity_description(&payload.itens) {
            Some(descricao) => {
                let novo = NovoChamado {
                    maquina_id: maquina.id,
                    maquina: maquina.nome.clone(),
                    tipo: ChamadoTipo::Corretiva,
                    status: ChamadoStatus::Aberto,
                    descricao,
                    operador_id: user.id,
                    operador_nome: user.nome.clone(),
                    manutentor_id: None,
                    manutentor_nome: None,
                    checklist: Vec::new(),
                    agendamento_id: None,
                    plano_id: None,
                };
                let chamado = self.chamado_repo.create(&mut *tx, &novo).await?;
                tracing::info!(
                    chamado_id = %chamado.id,
                    maquina = %maquina.nome,
                    "Chamado aberto automaticamente por não conformidade"
                );
                Some(chamado.id)
            }
            None => None,
        };

        let submission = self
            .checklist_repo
            .create(
                &mut *tx,
                maquina.id,
                &maquina.nome,
                user.id,
                &user.nome,
                &payload.itens,
                chamado_id,
            )
            .await?;

        tx.commit().await?;

        if chamado_id.is_some() {
            self.events.publish_all(&[Topic::Checklists, Topic::Chamados]);
        } else {
            self.events.publish(Topic::Checklists);
        }
        Ok(submission)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{FixedOffset, Utc};
    use sqlx::PgPool;

    use crate::{
        common::tempo::{hoje, limites_do_dia_em},
        db::ChecklistRepository,
        models::{
            auth::Role,
            chamados::{ChamadoStatus, ChamadoTipo},
            checklists::{ChecklistFilter, ChecklistResposta, CreateChecklistPayload},
        },
        services::test_support::{estado, maquina, usuario},
    };

    fn resposta(item: &str, conforme: bool, observacao: Option<&str>) -> ChecklistResposta {
        ChecklistResposta {
            item: item.into(),
            conforme,
            observacao: observacao.map(String::from),
        }
    }

    #[sqlx::test]
    async fn non_conforming_item_opens_a_linked_corrective_ticket(pool: PgPool) {
        let state = estado(pool);
        let ana = usuario(&state, "Ana", Role::Operador).await;
        let torno = maquina(&state, "Torno 1", &["Verificar nível de óleo", "Testar botão de emergência"]).await;

        let envio = state
            .checklist_service
            .submit(
                &ana,
                CreateChecklistPayload {
                    maquina_id: torno.id,
                    itens: vec![
                        resposta("Verificar nível de óleo", false, Some("abaixo do mínimo")),
                        resposta("Testar botão de emergência", true, None),
                    ],
                },
            )
            .await
            .unwrap();

        let chamado_id = envio.chamado_id.expect("chamado corretivo vinculado");
        let chamado = state.chamado_service.get(&ana, chamado_id).await.unwrap();
        assert_eq!(chamado.tipo, ChamadoTipo::Corretiva);
        assert_eq!(chamado.status, ChamadoStatus::Aberto);
        assert_eq!(chamado.maquina_id, torno.id);
        assert_eq!(chamado.operador_id, ana.id);
        assert!(chamado.descricao.contains("Verificar nível de óleo (abaixo do mínimo)"));
    }

    #[sqlx::test]
    async fn conforming_checklist_opens_no_ticket(pool: PgPool) {
        let state = estado(pool);
        let ana = usuario(&state, "Ana", Role::Operador).await;
        let torno = maquina(&state, "Torno 1", &["Verificar nível de óleo"]).await;

        let envio = state
            .checklist_service
            .submit(
                &ana,
                CreateChecklistPayload {
                    maquina_id: torno.id,
                    itens: vec![resposta("Verificar nível de óleo", true, None)],
                },
            )
            .await
            .unwrap();
        assert_eq!(envio.chamado_id, None);

        let de_hoje = ChecklistFilter { maquina_id: Some(torno.id), data: Some(hoje()) };
        assert_eq!(state.checklist_service.list(&de_hoje).await.unwrap().len(), 1);
    }

    #[sqlx::test]
    async fn submitted_machine_leaves_todays_pending_list(pool: PgPool) {
        let state = estado(pool);
        let ana = usuario(&state, "Ana", Role::Operador).await;
        let torno = maquina(&state, "Torno 1", &["Verificar nível de óleo"]).await;
        let prensa = maquina(&state, "Prensa 2", &["Verificar pressão"]).await;
        maquina(&state, "Bancada", &[]).await;

        let pendentes = state.checklist_service.list_pending_today().await.unwrap();
        let nomes: Vec<&str> = pendentes.iter().map(|p| p.maquina.as_str()).collect();
        assert_eq!(nomes, vec!["Prensa 2", "Torno 1"]);

        state
            .checklist_service
            .submit(
                &ana,
                CreateChecklistPayload {
                    maquina_id: torno.id,
                    itens: vec![resposta("Verificar nível de óleo", true, None)],
                },
            )
            .await
            .unwrap();

        let pendentes = state.checklist_service.list_pending_today().await.unwrap();
        assert_eq!(pendentes.len(), 1);
        assert_eq!(pendentes[0].maquina_id, prensa.id);
    }

    #[sqlx::test]
    async fn pending_window_follows_the_local_day_in_any_zone(pool: PgPool) {
        let state = estado(pool.clone());
        let ana = usuario(&state, "Ana", Role::Operador).await;
        let torno = maquina(&state, "Torno 1", &["Verificar nível de óleo"]).await;
        state
            .checklist_service
            .submit(
                &ana,
                CreateChecklistPayload {
                    maquina_id: torno.id,
                    itens: vec![resposta("Verificar nível de óleo", true, None)],
                },
            )
            .await
            .unwrap();

        // Em UTC-12 e UTC+14 o "hoje" local cai em outra data UTC em boa parte do dia
        let repo = ChecklistRepository::new(pool);
        for horas in [-12, -3, 0, 14] {
            let fuso = FixedOffset::east_opt(horas * 3600).unwrap();
            let dia_local = Utc::now().with_timezone(&fuso).date_naive();
            let (inicio, fim) = limites_do_dia_em(&fuso, dia_local);

            let pendentes = repo.list_pending(inicio, fim).await.unwrap();
            assert!(pendentes.is_empty(), "UTC{horas:+}: máquina enviada agora ainda pendente");
        }
    }
}
