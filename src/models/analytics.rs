// src/models/analytics.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::common::{error::AppError, tempo::limites_do_periodo};

// Período comum a todos os painéis
#[derive(Debug, Default, Clone, Copy, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct PeriodoFilter {
    /// Data inicial (inclusive)
    pub desde: Option<NaiveDate>,
    /// Data final (inclusive)
    pub ate: Option<NaiveDate>,
}

impl PeriodoFilter {
    pub fn check(&self) -> Result<(), AppError> {
        match (self.desde, self.ate) {
            (Some(desde), Some(ate)) if ate < desde => Err(AppError::InvalidPeriod),
            _ => Ok(()),
        }
    }

    pub fn limites(&self) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
        limites_do_periodo(self.desde, self.ate)
    }
}

// 1. Cards do topo
#[derive(Debug, Default, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContagemStatus {
    pub aberto: i64,
    pub em_andamento: i64,
    pub concluido: i64,
}

#[derive(Debug, Default, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ContagemTipo {
    pub corretiva: i64,
    pub preventiva: i64,
    pub preditiva: i64,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Resumo {
    pub total: i64,
    pub por_status: ContagemStatus,
    pub por_tipo: ContagemTipo,
    pub abertos_hoje: i64,
    pub agendamentos_atrasados: i64,
    pub pecas_estoque_baixo: i64,
    /// Tempo médio de reparo (horas) dos corretivos concluídos no período
    pub mttr_horas: Option<f64>,
}

// 2. Por máquina
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct MaquinaStats {
    pub maquina_id: Uuid,
    pub maquina: String,
    pub total: i64,
    pub corretivos: i64,
    pub mttr_horas: Option<f64>,
}

// 3. Pareto de causas
#[derive(Debug, Clone, FromRow)]
pub struct CausaContagem {
    pub causa: String,
    pub total: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CausaPareto {
    pub causa: String,
    pub total: i64,
    pub percentual: f64,
    pub percentual_acumulado: f64,
}

/// Ordena as causas da mais frequente para a menos frequente e acumula os percentuais.
/// Empates ficam em ordem alfabética.
pub fn pareto(mut contagens: Vec<CausaContagem>) -> Vec<CausaPareto> {
    contagens.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.causa.cmp(&b.causa)));

    let soma: i64 = contagens.iter().map(|c| c.total).sum();
    if soma == 0 {
        return Vec::new();
    }

    let mut acumulado = 0i64;
    contagens
        .into_iter()
        .map(|c| {
            acumulado += c.total;
            CausaPareto {
                percentual: arredonda(c.total as f64 * 100.0 / soma as f64),
                percentual_acumulado: arredonda(acumulado as f64 * 100.0 / soma as f64),
                causa: c.causa,
                total: c.total,
            }
        })
        .collect()
}

fn arredonda(valor: f64) -> f64 {
    (valor * 100.0).round() / 100.0
}

// 4. Por manutentor
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ManutentorStats {
    pub manutentor_id: Uuid,
    pub manutentor: String,
    pub concluidos: i64,
    pub horas_medias: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn contagem(causa: &str, total: i64) -> CausaContagem {
        CausaContagem { causa: causa.into(), total }
    }

    #[test]
    fn pareto_is_descending_and_accumulates_to_100() {
        let resultado = pareto(vec![
            contagem("Sujeira", 1),
            contagem("Desgaste natural", 6),
            contagem("Falta de lubrificação", 3),
        ]);

        let causas: Vec<&str> = resultado.iter().map(|c| c.causa.as_str()).collect();
        assert_eq!(causas, vec!["Desgaste natural", "Falta de lubrificação", "Sujeira"]);
        assert_eq!(resultado[0].percentual, 60.0);
        assert_eq!(resultado[1].percentual_acumulado, 90.0);
        assert_eq!(resultado[2].percentual_acumulado, 100.0);
    }

    #[test]
    fn ties_are_alphabetical() {
        let resultado = pareto(vec![contagem("B", 2), contagem("A", 2)]);
        assert_eq!(resultado[0].causa, "A");
    }

    #[test]
    fn no_tickets_means_empty_pareto() {
        assert!(pareto(vec![]).is_empty());
        assert!(pareto(vec![contagem("X", 0)]).is_empty());
    }

    #[test]
    fn period_must_not_be_reversed() {
        let filtro = PeriodoFilter {
            desde: NaiveDate::from_ymd_opt(2025, 3, 10),
            ate: NaiveDate::from_ymd_opt(2025, 3, 1),
        };
        assert!(matches!(filtro.check(), Err(AppError::InvalidPeriod)));
        assert!(PeriodoFilter::default().check().is_ok());
    }
}
