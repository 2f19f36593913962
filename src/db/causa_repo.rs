// src/db/causa_repo.rs

use sqlx::{Executor, PgPool, Postgres};
use uuid::Uuid;

use crate::{
    common::error::{is_foreign_key_violation, map_unique_violation, AppError},
    models::causas::CausaRaiz,
};

#[derive(Clone)]
pub struct CausaRaizRepository {
    pool: PgPool,
}

impl CausaRaizRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn list(&self) -> Result<Vec<CausaRaiz>, AppError> {
        let causas = sqlx::query_as::<_, CausaRaiz>("SELECT * FROM causas_raiz ORDER BY nome ASC")
            .fetch_all(&self.pool)
            .await?;
        Ok(causas)
    }

    /// Usado na conclusão de chamados, dentro da transação.
    pub async fn exists_by_name<'e, E>(&self, executor: E, nome: &str) -> Result<bool, AppError>
    where
        E: Executor<'e, Database = Postgres>,
    {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM causas_raiz WHERE nome = $1)")
                .bind(nome)
                .fetch_one(executor)
                .await?;
        Ok(exists)
    }

    pub async fn create(&self, nome: &str, descricao: Option<&str>) -> Result<CausaRaiz, AppError> {
        sqlx::query_as::<_, CausaRaiz>(
            r#"
            INSERT INTO causas_raiz (nome, descricao)
            VALUES ($1, $2)
            RETURNING *
            "#,
        )
        .bind(nome)
        .bind(descricao)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_unique_violation(e, format!("A causa raiz '{}' já existe", nome)))
    }

    pub async fn delete(&self, id: Uuid) -> Result<(), AppError> {
        let result = sqlx::query("DELETE FROM causas_raiz WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    return AppError::RootCauseInUse;
                }
                e.into()
            })?;

        if result.rows_affected() == 0 {
            return Err(AppError::ResourceNotFound("Causa raiz".into()));
        }
        Ok(())
    }
}
