// src/db/agenda_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::AppError,
    models::agenda::{Agendamento, AgendamentoStatus},
};

#[derive(Clone)]
pub struct AgendaRepository {
    pool: PgPool,
}

impl AgendaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Agendamentos que se sobrepõem à janela [inicio, fim] do calendário.
    pub async fn list_window(
        &self,
        inicio: Option<DateTime<Utc>>,
        fim: Option<DateTime<Utc>>,
    ) -> Result<Vec<Agendamento>, AppError> {
        let agendamentos = sqlx::query_as::<_, Agendamento>(
            r#"
            SELECT * FROM agendamentos_preventivos
            WHERE ($1::timestamptz IS NULL OR fim >= $1)
              AND ($2::timestamptz IS NULL OR inicio <= $2)
            ORDER BY inicio ASC
            "#,
        )
        .bind(inicio)
        .bind(fim)
        .fetch_all(&self.pool)
        .await?;
        Ok(agendamentos)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Agendamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Agendamento>("SELECT * FROM agendamentos_preventivos WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Agendamento".into()))
    }

    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Agendamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Agendamento>(
            "SELECT * FROM agendamentos_preventivos WHERE id = $1 FOR UPDATE",
        )
        .bind(id)
        .fetch_optional(executor)
        .await?
        .ok_or_else(|| AppError::ResourceNotFound("Agendamento".into()))
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        maquina_id: Uuid,
        maquina: &str,
        plano_id: Option<Uuid>,
        descricao: &str,
        inicio: DateTime<Utc>,
        fim: DateTime<Utc>,
    ) -> Result<Agendamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agendamento = sqlx::query_as::<_, Agendamento>(
            r#"
            INSERT INTO agendamentos_preventivos (maquina_id, maquina, plano_id, descricao, inicio, fim)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(maquina_id)
        .bind(maquina)
        .bind(plano_id)
        .bind(descricao)
        .bind(inicio)
        .bind(fim)
        .fetch_one(executor)
        .await?;
        Ok(agendamento)
    }

    pub async fn reschedule<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        descricao: Option<&str>,
        inicio: DateTime<Utc>,
        fim: DateTime<Utc>,
    ) -> Result<Agendamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agendamento = sqlx::query_as::<_, Agendamento>(
            r#"
            UPDATE agendamentos_preventivos SET
                descricao = COALESCE($2, descricao),
                inicio = $3,
                fim = $4,
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(descricao)
        .bind(inicio)
        .bind(fim)
        .fetch_one(executor)
        .await?;
        Ok(agendamento)
    }

    /// Muda o status e, quando informado, o chamado vinculado.
    pub async fn set_status<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        status: AgendamentoStatus,
        chamado_id: Option<Uuid>,
    ) -> Result<Agendamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agendamento = sqlx::query_as::<_, Agendamento>(
            r#"
            UPDATE agendamentos_preventivos SET
                status = $2,
                chamado_id = COALESCE($3, chamado_id),
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(status)
        .bind(chamado_id)
        .fetch_one(executor)
        .await?;
        Ok(agendamento)
    }

    /// Devolve o agendamento para `agendado`, sem chamado vinculado.
    pub async fn reset<'e, E>(&self, executor: E, id: Uuid) -> Result<Agendamento, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let agendamento = sqlx::query_as::<_, Agendamento>(
            r#"
            UPDATE agendamentos_preventivos SET
                status = 'AGENDADO',
                chamado_id = NULL,
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(agendamento)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query("DELETE FROM agendamentos_preventivos WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;
        Ok(())
    }
}
