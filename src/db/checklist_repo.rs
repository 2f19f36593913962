// src/db/checklist_repo.rs

use chrono::{DateTime, Utc};
use sqlx::{types::Json, Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::{error::AppError, tempo::limites_do_dia},
    models::checklists::{ChecklistFilter, ChecklistPendente, ChecklistResposta, ChecklistSubmission},
};

#[derive(Clone)]
pub struct ChecklistRepository {
    pool: PgPool,
}

impl ChecklistRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, filter: &ChecklistFilter) -> Result<Vec<ChecklistSubmission>, AppError> {
        let (inicio, fim) = filter.data.map(limites_do_dia).unzip();

        let submissions = sqlx::query_as::<_, ChecklistSubmission>(
            r#"
            SELECT * FROM checklist_submissions
            WHERE ($1::uuid IS NULL OR maquina_id = $1)
              AND ($2::timestamptz IS NULL OR (criado_em >= $2 AND criado_em < $3))
            ORDER BY criado_em DESC
            "#,
        )
        .bind(filter.maquina_id)
        .bind(inicio)
        .bind(fim)
        .fetch_all(&self.pool)
        .await?;
        Ok(submissions)
    }

    /// Máquinas ativas, com checklist diário definido, sem envio em [inicio, fim).
    pub async fn list_pending(
        &self,
        inicio: DateTime<Utc>,
        fim: DateTime<Utc>,
    ) -> Result<Vec<ChecklistPendente>, AppError> {
        let pendentes = sqlx::query_as::<_, ChecklistPendente>(
            r#"
            SELECT m.id AS maquina_id, m.nome AS maquina, m.setor, m.checklist_diario
            FROM maquinas m
            WHERE m.ativa
              AND cardinality(m.checklist_diario) > 0
              AND NOT EXISTS (
                  SELECT 1 FROM checklist_submissions s
                  WHERE s.maquina_id = m.id AND s.criado_em >= $1 AND s.criado_em < $2
              )
            ORDER BY m.nome ASC
            "#,
        )
        .bind(inicio)
        .bind(fim)
        .fetch_all(&self.pool)
        .await?;
        Ok(pendentes)
    }

    pub async fn create<'e, E>(
        &self,
        executor: E,
        maquina_id: Uuid,
        maquina: &str,
        operador_id: Uuid,
        operador_nome: &str,
        itens: &[ChecklistResposta],
        chamado_id: Option<Uuid>,
    ) -> Result<ChecklistSubmission, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let submission = sqlx::query_as::<_, ChecklistSubmission>(
            r#"
            INSERT INTO checklist_submissions (
                maquina_id, maquina, operador_id, operador_nome, itens, chamado_id
            )
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING *
            "#,
        )
        .bind(maquina_id)
        .bind(maquina)
        .bind(operador_id)
        .bind(operador_nome)
        .bind(Json(itens))
        .bind(chamado_id)
        .fetch_one(executor)
        .await?;
        Ok(submission)
    }
}
