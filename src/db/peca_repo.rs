// src/db/peca_repo.rs

use rust_decimal::Decimal;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{map_unique_violation, AppError},
    models::pecas::{CreatePecaPayload, Movimentacao, NovaMovimentacao, Peca, UpdatePecaPayload},
};

#[derive(Clone)]
pub struct PecaRepository {
    pool: PgPool,
}

impl PecaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn list(&self) -> Result<Vec<Peca>, AppError> {
        let pecas = sqlx::query_as::<_, Peca>("SELECT * FROM pecas ORDER BY nome ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(pecas)
    }

    pub async fn list_low_stock(&self) -> Result<Vec<Peca>, AppError> {
        let pecas = sqlx::query_as::<_, Peca>(
            r#"
            SELECT * FROM pecas
            WHERE quantidade <= estoque_minimo
            ORDER BY (quantidade - estoque_minimo) ASC, nome ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(pecas)
    }

    pub async fn list_movements(&self, peca_id: Uuid) -> Result<Vec<Movimentacao>, AppError> {
        let movimentos = sqlx::query_as::<_, Movimentacao>(
            r#"
            SELECT * FROM movimentacoes_pecas
            WHERE peca_id = $1
            ORDER BY criado_em DESC
            "#,
        )
        .bind(peca_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(movimentos)
    }

    pub async fn find_by_id(&self, id: Uuid) -> Result<Peca, AppError> {
        sqlx::query_as::<_, Peca>("SELECT * FROM pecas WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Peça".into()))
    }

    // ---
    // Escrita (transacionais)
    // ---

    /// Lê a peça travando a linha: o saldo não muda entre a leitura e a gravação.
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Peca, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Peca>("SELECT * FROM pecas WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Peça".into()))
    }

    pub async fn create<'e, E>(&self, executor: E, payload: &CreatePecaPayload) -> Result<Peca, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Peca>(
            r#"
            INSERT INTO pecas (codigo, nome, quantidade, estoque_minimo, custo_unitario, localizacao)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(payload.codigo.trim())
        .bind(&payload.nome)
        .bind(payload.quantidade)
        .bind(payload.estoque_minimo)
        .bind(payload.custo_unitario)
        .bind(payload.localizacao.as_deref())
        .fetch_one(executor)
        .await
        .map_err(|e| map_unique_violation(e, format!("O código '{}' já está cadastrado", payload.codigo.trim())))
    }

    pub async fn update(&self, id: Uuid, payload: &UpdatePecaPayload) -> Result<Peca, AppError> {
        sqlx::query_as::<_, Peca>(
            r#"
            UPDATE pecas SET
                codigo = COALESCE($2, codigo),
                nome = COALESCE($3, nome),
                estoque_minimo = COALESCE($4, estoque_minimo),
                custo_unitario = COALESCE($5, custo_unitario),
                localizacao = COALESCE($6, localizacao),
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.codigo.as_deref().map(str::trim))
        .bind(payload.nome.as_deref())
        .bind(payload.estoque_minimo)
        .bind(payload.custo_unitario)
        .bind(payload.localizacao.as_deref())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe uma peça com esse código"))?
        .ok_or_else(|| AppError::ResourceNotFound("Peça".into()))
    }

    pub async fn set_quantity<'e, E>(&self, executor: E, id: Uuid, quantidade: Decimal) -> Result<Peca, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let peca = sqlx::query_as::<_, Peca>(
            r#"
            UPDATE pecas SET quantidade = $2, atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(quantidade)
        .fetch_one(executor)
        .await?;
        Ok(peca)
    }

    pub async fn record_movement<'e, E>(
        &self,
        executor: E,
        peca_id: Uuid,
        movimento: &NovaMovimentacao,
        saldo_apos: Decimal,
    ) -> Result<Movimentacao, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let registro = sqlx::query_as::<_, Movimentacao>(
            r#"
            INSERT INTO movimentacoes_pecas (
                peca_id, chamado_id, tipo, quantidade, saldo_apos, usuario_id, observacao
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(peca_id)
        .bind(movimento.chamado_id)
        .bind(movimento.tipo)
        .bind(movimento.quantidade)
        .bind(saldo_apos)
        .bind(movimento.usuario_id)
        .bind(movimento.observacao.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(registro)
    }
}
