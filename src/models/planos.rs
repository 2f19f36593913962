// src/models/planos.rs

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::models::chamados::ChamadoTipo;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "plano_tipo", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum PlanoTipo {
    Preventivo,
    Preditivo,
}

impl PlanoTipo {
    /// O tipo do chamado gerado a partir de um plano deste tipo.
    pub fn chamado_tipo(&self) -> ChamadoTipo {
        match self {
            PlanoTipo::Preventivo => ChamadoTipo::Preventiva,
            PlanoTipo::Preditivo => ChamadoTipo::Preditiva,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Plano {
    pub id: Uuid,
    pub tipo: PlanoTipo,
    pub maquina_id: Uuid,
    #[schema(example = "Prensa 03")]
    pub maquina: String,
    #[schema(example = "Troca de óleo hidráulico")]
    pub descricao: String,
    #[schema(example = 90)]
    pub frequencia_dias: i32,
    pub proxima_data: NaiveDate,
    pub ultima_data: Option<NaiveDate>,
    #[schema(example = json!(["Drenar óleo", "Trocar filtro", "Completar nível"]))]
    pub tarefas: Vec<String>,
    /// Grandeza monitorada (só planos preditivos)
    #[schema(example = "Vibração do mancal (mm/s)")]
    pub parametro: Option<String>,
    pub ativo: bool,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

/// Próxima execução: a data base somada à frequência do plano.
pub fn next_due_date(base: NaiveDate, frequencia_dias: i32) -> NaiveDate {
    let dias = u64::try_from(frequencia_dias.max(1)).unwrap_or(1);
    base.checked_add_days(Days::new(dias)).unwrap_or(NaiveDate::MAX)
}

/// Limite da janela de "vencendo": hoje mais `dias` (negativos contam como zero).
pub fn due_window_end(today: NaiveDate, dias: i64) -> NaiveDate {
    let dias = u64::try_from(dias.max(0)).unwrap_or(0);
    today.checked_add_days(Days::new(dias)).unwrap_or(NaiveDate::MAX)
}

// --- Filtros e Payloads ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct PlanoFilter {
    pub tipo: Option<PlanoTipo>,
    pub maquina_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct VencendoQuery {
    /// Janela em dias a partir de hoje (padrão 7)
    #[serde(default = "default_dias")]
    pub dias: i64,
}

fn default_dias() -> i64 {
    7
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanoPayload {
    pub tipo: PlanoTipo,
    pub maquina_id: Uuid,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
    #[validate(range(min = 1, message = "A frequência deve ser de pelo menos 1 dia."))]
    pub frequencia_dias: i32,
    pub proxima_data: NaiveDate,
    #[serde(default)]
    pub tarefas: Vec<String>,
    pub parametro: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePlanoPayload {
    #[validate(length(min = 1, message = "A descrição não pode ser vazia."))]
    pub descricao: Option<String>,
    #[validate(range(min = 1, message = "A frequência deve ser de pelo menos 1 dia."))]
    pub frequencia_dias: Option<i32>,
    pub proxima_data: Option<NaiveDate>,
    pub tarefas: Option<Vec<String>>,
    pub parametro: Option<String>,
    pub ativo: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn next_date_adds_the_frequency() {
        assert_eq!(next_due_date(data(2025, 1, 30), 30), data(2025, 3, 1));
        assert_eq!(next_due_date(data(2024, 12, 31), 1), data(2025, 1, 1));
    }

    #[test]
    fn frequency_below_one_counts_as_one_day() {
        assert_eq!(next_due_date(data(2025, 5, 10), 0), data(2025, 5, 11));
    }

    #[test]
    fn due_window_ignores_negative_days() {
        let hoje = data(2025, 6, 1);
        assert_eq!(due_window_end(hoje, 7), data(2025, 6, 8));
        assert_eq!(due_window_end(hoje, -3), hoje);
    }

    #[test]
    fn plan_type_maps_to_ticket_type() {
        assert_eq!(PlanoTipo::Preventivo.chamado_tipo(), ChamadoTipo::Preventiva);
        assert_eq!(PlanoTipo::Preditivo.chamado_tipo(), ChamadoTipo::Preditiva);
    }

    #[test]
    fn vencendo_defaults_to_a_week() {
        let q: VencendoQuery = serde_json::from_str("{}").unwrap();
        assert_eq!(q.dias, 7);
    }

    #[test]
    fn zero_frequency_fails_validation() {
        let payload = CreatePlanoPayload {
            tipo: PlanoTipo::Preventivo,
            maquina_id: Uuid::new_v4(),
            descricao: "Lubrificação".into(),
            frequencia_dias: 0,
            proxima_data: data(2025, 1, 1),
            tarefas: vec![],
            parametro: None,
        };
        assert!(payload.validate().is_err());
    }
}
