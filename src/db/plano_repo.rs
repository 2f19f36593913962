// src/db/plano_repo.rs

use chrono::NaiveDate;
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::planos::{CreatePlanoPayload, Plano, PlanoFilter, UpdatePlanoPayload},
};

#[derive(Clone)]
pub struct PlanoRepository {
    pool: PgPool,
}

impl PlanoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &PlanoFilter) -> Result<Vec<Plano>, AppError> {
        let planos = sqlx::query_as::<_, Plano>(
            r#"
            SELECT * FROM planos
            WHERE ($1::plano_tipo IS NULL OR tipo = $1)
              AND ($2::uuid IS NULL OR maquina_id = $2)
            ORDER BY proxima_data ASC, maquina ASC
            "#,
        )
        .bind(filter.tipo)
        .bind(filter.maquina_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(planos)
    }

    /// Planos ativos com a próxima execução até `limite` (inclui os já vencidos).
    pub async fn list_due(&self, limite: NaiveDate) -> Result<Vec<Plano>, AppError> {
        let planos = sqlx::query_as::<_, Plano>(
            r#"
            SELECT * FROM planos
            WHERE ativo AND proxima_data <= $1
            ORDER BY proxima_data ASC, maquina ASC
            "#,
        )
        .bind(limite)
        .fetch_all(&self.pool)
        .await?;
        Ok(planos)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Plano, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Plano>("SELECT * FROM planos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Plano".into()))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        payload: &CreatePlanoPayload,
        maquina: &str,
    ) -> Result<Plano, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let plano = sqlx::query_as::<_, Plano>(
            r#"
            INSERT INTO planos (
                tipo, maquina_id, maquina, descricao, frequencia_dias,
                proxima_data, tarefas, parametro
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *
            "#,
        )
        .bind(payload.tipo)
        .bind(payload.maquina_id)
        .bind(maquina)
        .bind(&payload.descricao)
        .bind(payload.frequencia_dias)
        .bind(payload.proxima_data)
        .bind(&payload.tarefas)
        .bind(payload.parametro.as_deref())
        .fetch_one(executor)
        .await?;
        Ok(plano)
    }

    pub async fn update(&self, id: Uuid, payload: &UpdatePlanoPayload) -> Result<Plano, AppError> {
        sqlx::query_as::<_, Plano>(
            r#"
            UPDATE planos SET
                descricao = COALESCE($2, descricao),
                frequencia_dias = COALESCE($3, frequencia_dias),
                proxima_data = COALESCE($4, proxima_data),
                tarefas = COALESCE($5, tarefas),
                parametro = COALESCE($6, parametro),
                ativo = COALESCE($7, ativo),
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.descricao.as_deref())
        .bind(payload.frequencia_dias)
        .bind(payload.proxima_data)
        .bind(payload.tarefas.as_ref())
        .bind(payload.parametro.as_deref())
        .bind(payload.ativo)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Plano".into()))
    }

    /// Registra uma execução: última = `executado_em`, próxima = `proxima`.
    pub async fn register_execution<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        executado_em: NaiveDate,
        proxima: NaiveDate,
    ) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query(
            r#"
            UPDATE planos SET
                ultima_data = $2,
                proxima_data = $3,
                atualizado_em = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(executado_em)
        .bind(proxima)
        .execute(executor)
        .await?;
        Ok(())
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM planos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Plano".into()));
        }
        Ok(())
    }
}
