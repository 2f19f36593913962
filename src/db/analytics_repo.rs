// src/db/analytics_repo.rs

use sqlx::PgPool;

use crate::{
    common::{
        error::AppError,
        tempo::{hoje, limites_do_dia},
    },
    models::{
        analytics::{
            CausaContagem, ContagemStatus, ContagemTipo, ManutentorStats, MaquinaStats,
            PeriodoFilter, Resumo,
        },
        chamados::{ChamadoStatus, ChamadoTipo},
    },
};

#[derive(Clone)]
pub struct AnalyticsRepository {
    pool: PgPool,
}

impl AnalyticsRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    // 1. Resumo geral
    pub async fn get_summary(&self, periodo: &PeriodoFilter) -> Result<Resumo, AppError> {
        // Uma transação só para ler todos os números do mesmo snapshot
        let mut tx = self.pool.begin().await?;

        let (desde, ate) = periodo.limites();

        // A. Chamados por status
        let por_status_rows: Vec<(ChamadoStatus, i64)> = sqlx::query_as(
            r#"
            SELECT status, COUNT(*) FROM chamados
            WHERE ($1::timestamptz IS NULL OR criado_em >= $1)
              AND ($2::timestamptz IS NULL OR criado_em < $2)
            GROUP BY status
            "#,
        )
        .bind(desde)
        .bind(ate)
        .fetch_all(&mut *tx)
        .await?;

        // B. Chamados por tipo
        let por_tipo_rows: Vec<(ChamadoTipo, i64)> = sqlx::query_as(
            r#"
            SELECT tipo, COUNT(*) FROM chamados
            WHERE ($1::timestamptz IS NULL OR criado_em >= $1)
              AND ($2::timestamptz IS NULL OR criado_em < $2)
            GROUP BY tipo
            "#,
        )
        .bind(desde)
        .bind(ate)
        .fetch_all(&mut *tx)
        .await?;

        // C. Abertos hoje (independe do período)
        let (inicio_hoje, fim_hoje) = limites_do_dia(hoje());
        let abertos_hoje: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM chamados WHERE criado_em >= $1 AND criado_em < $2",
        )
        .bind(inicio_hoje)
        .bind(fim_hoje)
        .fetch_one(&mut *tx)
        .await?;

        // D. Agendamentos atrasados
        let agendamentos_atrasados: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM agendamentos_preventivos WHERE status = 'AGENDADO' AND fim < NOW()",
        )
        .fetch_one(&mut *tx)
        .await?;

        // E. Peças no estoque mínimo
        let pecas_estoque_baixo: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM pecas WHERE quantidade <= estoque_minimo")
                .fetch_one(&mut *tx)
                .await?;

        // F. MTTR dos corretivos concluídos
        let mttr_horas: Option<f64> = sqlx::query_scalar(
            r#"
            SELECT (AVG(EXTRACT(EPOCH FROM (concluido_em - criado_em))) / 3600)::float8
            FROM chamados
            WHERE tipo = 'CORRETIVA' AND status = 'CONCLUIDO' AND concluido_em IS NOT NULL
              AND ($1::timestamptz IS NULL OR criado_em >= $1)
              AND ($2::timestamptz IS NULL OR criado_em < $2)
            "#,
        )
        .bind(desde)
        .bind(ate)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut por_status = ContagemStatus::default();
        for (status, total) in por_status_rows {
            match status {
                ChamadoStatus::Aberto => por_status.aberto = total,
                ChamadoStatus::EmAndamento => por_status.em_andamento = total,
                ChamadoStatus::Concluido => por_status.concluido = total,
            }
        }
        let mut por_tipo = ContagemTipo::default();
        for (tipo, total) in por_tipo_rows {
            match tipo {
                ChamadoTipo::Corretiva => por_tipo.corretiva = total,
                ChamadoTipo::Preventiva => por_tipo.preventiva = total,
                ChamadoTipo::Preditiva => por_tipo.preditiva = total,
            }
        }

        Ok(Resumo {
            total: por_status.aberto + por_status.em_andamento + por_status.concluido,
            por_status,
            por_tipo,
            abertos_hoje,
            agendamentos_atrasados,
            pecas_estoque_baixo,
            mttr_horas,
        })
    }

    // 2. Ranking de máquinas
    pub async fn get_by_machine(&self, periodo: &PeriodoFilter) -> Result<Vec<MaquinaStats>, AppError> {
        let (desde, ate) = periodo.limites();
        let stats = sqlx::query_as::<_, MaquinaStats>(
            r#"
            SELECT
                maquina_id,
                MAX(maquina) AS maquina,
                COUNT(*) AS total,
                COUNT(*) FILTER (WHERE tipo = 'CORRETIVA') AS corretivos,
                (AVG(EXTRACT(EPOCH FROM (concluido_em - criado_em))) FILTER (
                    WHERE tipo = 'CORRETIVA' AND status = 'CONCLUIDO'
                ) / 3600)::float8 AS mttr_horas
            FROM chamados
            WHERE ($1::timestamptz IS NULL OR criado_em >= $1)
              AND ($2::timestamptz IS NULL OR criado_em < $2)
            GROUP BY maquina_id
            ORDER BY total DESC, maquina ASC
            "#,
        )
        .bind(desde)
        .bind(ate)
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }

    // 3. Contagem bruta das causas (o Pareto é montado no service)
    pub async fn count_causes(&self, periodo: &PeriodoFilter) -> Result<Vec<CausaContagem>, AppError> {
        let (desde, ate) = periodo.limites();
        let contagens = sqlx::query_as::<_, CausaContagem>(
            r#"
            SELECT causa, COUNT(*) AS total
            FROM chamados
            WHERE causa IS NOT NULL
              AND ($1::timestamptz IS NULL OR criado_em >= $1)
              AND ($2::timestamptz IS NULL OR criado_em < $2)
            GROUP BY causa
            "#,
        )
        .bind(desde)
        .bind(ate)
        .fetch_all(&self.pool)
        .await?;
        Ok(contagens)
    }

    // 4. Produtividade dos manutentores
    pub async fn get_by_maintainer(
        &self,
        periodo: &PeriodoFilter,
    ) -> Result<Vec<ManutentorStats>, AppError> {
        let (desde, ate) = periodo.limites();
        let stats = sqlx::query_as::<_, ManutentorStats>(
            r#"
            SELECT
                manutentor_id,
                MAX(manutentor_nome) AS manutentor,
                COUNT(*) AS concluidos,
                (AVG(EXTRACT(EPOCH FROM (concluido_em - COALESCE(assumido_em, criado_em)))) / 3600)::float8
                    AS horas_medias
            FROM chamados
            WHERE status = 'CONCLUIDO' AND manutentor_id IS NOT NULL
              AND ($1::timestamptz IS NULL OR criado_em >= $1)
              AND ($2::timestamptz IS NULL OR criado_em < $2)
            GROUP BY manutentor_id
            ORDER BY concluidos DESC, manutentor ASC
            "#,
        )
        .bind(desde)
        .bind(ate)
        .fetch_all(&self.pool)
        .await?;
        Ok(stats)
    }
}
