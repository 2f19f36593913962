// src/db/chamado_repo.rs

use chrono::{NaiveDate, Utc};
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, tempo::limites_do_periodo},
    models::chamados::{
        Chamado, ChamadoFilter, ChamadoScope, ChamadoStatus, ChecklistItem, NovoChamado, Observacao,
    },
};

#[derive(Clone)]
pub struct ChamadoRepository {
    pool: PgPool,
}

impl ChamadoRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // ---
    // Leitura
    // ---

    pub async fn list(
        &self,
        filter: &ChamadoFilter,
        scope: ChamadoScope,
    ) -> Result<Vec<Chamado>, AppError> {
        let (operador_id, manutentor_visivel) = match scope {
            ChamadoScope::Todos => (None, None),
            ChamadoScope::Operador(id) => (Some(id), None),
            ChamadoScope::Manutentor(id) => (None, Some(id)),
        };

        let (desde, ate) = limites_do_periodo(filter.desde, filter.ate);

        let chamados = sqlx::query_as::<_, Chamado>(
            r#"
            SELECT * FROM chamados
            WHERE ($1::chamado_status IS NULL OR status = $1)
              AND ($2::chamado_tipo IS NULL OR tipo = $2)
              AND ($3::uuid IS NULL OR maquina_id = $3)
              AND ($4::uuid IS NULL OR manutentor_id = $4)
              AND ($5::timestamptz IS NULL OR criado_em >= $5)
              AND ($6::timestamptz IS NULL OR criado_em < $6)
              AND ($7::uuid IS NULL OR operador_id = $7)
              AND ($8::uuid IS NULL OR status = 'ABERTO' OR manutentor_id = $8)
            ORDER BY criado_em DESC
            "#,
        )
        .bind(filter.status)
        .bind(filter.tipo)
        .bind(filter.maquina_id)
        .bind(filter.manutentor_id)
        .bind(desde)
        .bind(ate)
        .bind(operador_id)
        .bind(manutentor_visivel)
        .fetch_all(&self.pool)
        .await?;
        Ok(chamados)
    }

    /// Chamados abertos no período, do mais antigo para o mais novo (relatório em PDF).
    pub async fn list_period(
        &self,
        desde: Option<NaiveDate>,
        ate: Option<NaiveDate>,
    ) -> Result<Vec<Chamado>, AppError> {
        let (desde, ate) = limites_do_periodo(desde, ate);

        let chamados = sqlx::query_as::<_, Chamado>(
            r#"
            SELECT * FROM chamados
            WHERE ($1::timestamptz IS NULL OR criado_em >= $1)
              AND ($2::timestamptz IS NULL OR criado_em < $2)
            ORDER BY criado_em ASC
            "#,
        )
        .bind(desde)
        .bind(ate)
        .fetch_all(&self.pool)
        .await?;
        Ok(chamados)
    }

    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Chamado>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamado = sqlx::query_as::<_, Chamado>("SELECT * FROM chamados WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(chamado)
    }

    /// Trava a linha até o fim da transação (duas pessoas assumindo o mesmo chamado).
    pub async fn lock_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Chamado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        sqlx::query_as::<_, Chamado>("SELECT * FROM chamados WHERE id = $1 FOR UPDATE")
            .bind(id)
            .fetch_optional(executor)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Chamado".into()))
    }

    // ---
    // Escrita (transacionais)
    // ---

    pub async fn create<'e, E>(&self, executor: E, novo: &NovoChamado) -> Result<Chamado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let assumido_em = (novo.status == ChamadoStatus::EmAndamento).then(Utc::now);

        let chamado = sqlx::query_as::<_, Chamado>(
            r#"
            INSERT INTO chamados (
                maquina_id, maquina, tipo, status, descricao,
                operador_id, operador_nome, manutentor_id, manutentor_nome,
                checklist, agendamento_id, plano_id, assumido_em
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING *
            "#,
        )
        .bind(novo.maquina_id)
        .bind(&novo.maquina)
        .bind(novo.tipo)
        .bind(novo.status)
        .bind(&novo.descricao)
        .bind(novo.operador_id)
        .bind(&novo.operador_nome)
        .bind(novo.manutentor_id)
        .bind(novo.manutentor_nome.as_deref())
        .bind(Json(&novo.checklist))
        .bind(novo.agendamento_id)
        .bind(novo.plano_id)
        .bind(assumido_em)
        .fetch_one(executor)
        .await?;
        Ok(chamado)
    }

    pub async fn assign<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        manutentor_id: Uuid,
        manutentor_nome: &str,
    ) -> Result<Chamado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamado = sqlx::query_as::<_, Chamado>(
            r#"
            UPDATE chamados SET
                status = 'EM_ANDAMENTO',
                manutentor_id = $2,
                manutentor_nome = $3,
                assumido_em = NOW(),
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(manutentor_id)
        .bind(manutentor_nome)
        .fetch_one(executor)
        .await?;
        Ok(chamado)
    }

    pub async fn release<'e, E>(&self, executor: E, id: Uuid) -> Result<Chamado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamado = sqlx::query_as::<_, Chamado>(
            r#"
            UPDATE chamados SET
                status = 'ABERTO',
                manutentor_id = NULL,
                manutentor_nome = NULL,
                assumido_em = NULL,
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .fetch_one(executor)
        .await?;
        Ok(chamado)
    }

    pub async fn update_checklist<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        checklist: &[ChecklistItem],
    ) -> Result<Chamado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamado = sqlx::query_as::<_, Chamado>(
            r#"
            UPDATE chamados SET checklist = $2, atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(checklist))
        .fetch_one(executor)
        .await?;
        Ok(chamado)
    }

    /// Acrescenta uma observação ao final do array (append atômico no JSONB).
    pub async fn push_observacao<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        observacao: &Observacao,
    ) -> Result<Chamado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamado = sqlx::query_as::<_, Chamado>(
            r#"
            UPDATE chamados SET
                observacoes = observacoes || jsonb_build_array($2::jsonb),
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(Json(observacao))
        .fetch_one(executor)
        .await?;
        Ok(chamado)
    }

    pub async fn conclude<'e, E>(
        &self,
        executor: E,
        id: Uuid,
        solucao: &str,
        causa: Option<&str>,
    ) -> Result<Chamado, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let chamado = sqlx::query_as::<_, Chamado>(
            r#"
            UPDATE chamados SET
                status = 'CONCLUIDO',
                solucao = $2,
                causa = $3,
                concluido_em = NOW(),
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(solucao)
        .bind(causa)
        .fetch_one(executor)
        .await?;
        Ok(chamado)
    }

    pub async fn delete<'e, E>(&self, executor: E, id: Uuid) -> Result<(), AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let result = sqlx::query("DELETE FROM chamados WHERE id = $1")
            .bind(id)
            .execute(executor)
            .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Chamado".into()));
        }
        Ok(())
    }
}
