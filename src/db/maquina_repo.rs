// src/db/maquina_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{is_foreign_key_violation, map_unique_violation, AppError},
    models::maquinas::{CreateMaquinaPayload, Maquina, UpdateMaquinaPayload},
};

#[derive(Clone)]
pub struct MaquinaRepository {
    pool: PgPool,
}

impl MaquinaRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self, ativa: Option<bool>) -> Result<Vec<Maquina>, AppError> {
        let maquinas = sqlx::query_as::<_, Maquina>(
            r#"
            SELECT * FROM maquinas
            WHERE ($1::boolean IS NULL OR ativa = $1)
            ORDER BY nome ASC
            "#,
        )
        .bind(ativa)
        .fetch_all(&self.pool)
        .await?;
        Ok(maquinas)
    }

    /// Busca uma máquina. Aceita um executor para ser lida dentro de transações.
    pub async fn find_by_id<'e, E>(&self, executor: E, id: Uuid) -> Result<Option<Maquina>, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let maquina = sqlx::query_as::<_, Maquina>("SELECT * FROM maquinas WHERE id = $1")
            .bind(id)
            .fetch_optional(executor)
            .await?;
        Ok(maquina)
    }

    pub async fn get(&self, id: Uuid) -> Result<Maquina, AppError> {
        self.find_by_id(&self.pool, id)
            .await?
            .ok_or_else(|| AppError::ResourceNotFound("Máquina".into()))
    }

    pub async fn create(&self, payload: &CreateMaquinaPayload) -> Result<Maquina, AppError> {
        sqlx::query_as::<_, Maquina>(
            r#"
            INSERT INTO maquinas (nome, setor, checklist_diario)
            VALUES ($1, $2, $3)
            RETURNING *
            "#,
        )
        .bind(payload.nome.trim())
        .bind(payload.setor.as_deref())
        .bind(&payload.checklist_diario)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("Já existe uma máquina chamada '{}'", payload.nome.trim())))
    }

    // O nome desnormalizado nos chamados/planos/agendamentos fica como estava:
    // é o nome da máquina no momento do registro.
    pub async fn update(&self, id: Uuid, payload: &UpdateMaquinaPayload) -> Result<Maquina, AppError> {
        sqlx::query_as::<_, Maquina>(
            r#"
            UPDATE maquinas SET
                nome = COALESCE($2, nome),
                setor = COALESCE($3, setor),
                checklist_diario = COALESCE($4, checklist_diario),
                ativa = COALESCE($5, ativa),
                atualizado_em = NOW()
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(payload.nome.as_deref().map(str::trim))
        .bind(payload.setor.as_deref())
        .bind(payload.checklist_diario.as_ref())
        .bind(payload.ativa)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, "Já existe uma máquina com esse nome"))?
        .ok_or_else(|| AppError::ResourceNotFound("Máquina".into()))
    }

    /// Exclui a máquina. Se algum registro ainda aponta para ela, a exclusão é recusada.
    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM maquinas WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::MachineInUse;
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Máquina".into()));
        }
        Ok(())
    }
}
