// src/services/peca_service.rs

use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    db::PecaRepository,
    models::pecas::{
        apply_movement, CreatePecaPayload, Movimentacao, MovimentacaoPayload, MovimentacaoTipo,
        NovaMovimentacao, Peca, UpdatePecaPayload,
    },
    services::event_bus::{EventBus, Topic},
};

#[derive(Clone)]
pub struct PecaService {
    peca_repo: PecaRepository,
    pool: PgPool,
    events: EventBus,
}

impl PecaService {
    pub fn new(peca_repo: PecaRepository, pool: PgPool, events: EventBus) -> Self {
        Self { peca_repo, pool, events }
    }

    pub async fn list(&self) -> Result<Vec<Peca>, AppError> {
        self.peca_repo.list().await
    }

    pub async fn list_low_stock(&self) -> Result<Vec<Peca>, AppError> {
        self.peca_repo.list_low_stock().await
    }

    pub async fn list_movements(&self, peca_id: Uuid) -> Result<Vec<Movimentacao>, AppError> {
        // 404 em vez de lista vazia para peça inexistente
        self.peca_repo.find_by_id(peca_id).await?;
        self.peca_repo.list_movements(peca_id).await
    }

    // --- CREATE (com estoque inicial) ---
    pub async fn create(&self, payload: CreatePecaPayload, usuario_id: Uuid) -> Result<Peca, AppError> {
        payload.check_amounts()?;

        let mut tx = self.pool.begin().await?;

        let peca = self.peca_repo.create(&mut *tx, &payload).await?;

        // O saldo inicial também fica no histórico
        if peca.quantidade > Decimal::ZERO {
            let inicial = NovaMovimentacao {
                tipo: MovimentacaoTipo::Entrada,
                quantidade: peca.quantidade,
                chamado_id: None,
                usuario_id: Some(usuario_id),
                observacao: Some("Estoque inicial".into()),
            };
            self.peca_repo
                .record_movement(&mut *tx, peca.id, &inicial, peca.quantidade)
                .await?;
        }

        tx.commit().await?;

        tracing::info!(peca_id = %peca.id, codigo = %peca.codigo, "Peça cadastrada");
        self.events.publish(Topic::Pecas);
        Ok(peca)
    }

    pub async fn update(&self, id: Uuid, payload: UpdatePecaPayload) -> Result<Peca, AppError> {
        payload.check_amounts()?;

        let peca = self.peca_repo.update(id, &payload).await?;
        self.events.publish(Topic::Pecas);
        Ok(peca)
    }

    // --- MOVIMENTAÇÃO MANUAL (entrada, saída, ajuste) ---
    pub async fn register_movement(
        &self,
        peca_id: Uuid,
        payload: MovimentacaoPayload,
        usuario_id: Uuid,
    ) -> Result<Peca, AppError> {
        let movimento = NovaMovimentacao {
            tipo: payload.tipo,
            quantidade: payload.quantidade,
            chamado_id: None,
            usuario_id: Some(usuario_id),
            observacao: payload.observacao,
        };

        let mut tx = self.pool.begin().await?;
        let (peca, _) = self.apply_in_tx(&mut *tx, peca_id, &movimento).await?;
        tx.commit().await?;

        self.events.publish(Topic::Pecas);
        Ok(peca)
    }

    /// Aplica uma movimentação dentro de uma transação já aberta (usado também pelos chamados).
    /// Quem chama é responsável pelo commit e pela publicação do evento.
    pub async fn apply_in_tx(
        &self,
        conn: &mut PgConnection,
        peca_id: Uuid,
        movimento: &NovaMovimentacao,
    ) -> Result<(Peca, Movimentacao), AppError> {
        let atual = self.peca_repo.lock_by_id(&mut *conn, peca_id).await?;

        let saldo = apply_movement(atual.quantidade, movimento.tipo, movimento.quantidade)?;

        let peca = self.peca_repo.set_quantity(&mut *conn, peca_id, saldo).await?;
        let registro = self
            .peca_repo
            .record_movement(&mut *conn, peca_id, movimento, saldo)
            .await?;

        if peca.estoque_baixo() {
            tracing::warn!(codigo = %peca.codigo, saldo = %saldo, "Peça no estoque mínimo");
        }
        tracing::debug!(
            peca_id = %peca_id,
            tipo = ?movimento.tipo,
            quantidade = %movimento.quantidade,
            saldo = %saldo,
            "Movimentação de estoque"
        );
        Ok((peca, registro))
    }
}
