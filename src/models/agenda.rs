// src/models/agenda.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "agendamento_status", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum AgendamentoStatus {
    Agendado,
    Iniciado,
    Concluido,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Agendamento {
    pub id: Uuid,
    pub maquina_id: Uuid,
    #[schema(example = "Prensa 03")]
    pub maquina: String,
    pub plano_id: Option<Uuid>,
    #[schema(example = "Troca de óleo trimestral")]
    pub descricao: String,
    pub inicio: DateTime<Utc>,
    pub fim: DateTime<Utc>,
    pub status: AgendamentoStatus,
    pub chamado_id: Option<Uuid>,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

impl Agendamento {
    /// Só agendamentos ainda não iniciados podem ser remarcados ou excluídos.
    pub fn check_editable(&self) -> Result<(), AppError> {
        if self.status != AgendamentoStatus::Agendado {
            return Err(AppError::ScheduleLocked);
        }
        Ok(())
    }
}

// --- Legenda do calendário ---

pub const COR_AGENDADO: &str = "#3b82f6";
pub const COR_INICIADO: &str = "#f59e0b";
pub const COR_CONCLUIDO: &str = "#22c55e";
pub const COR_ATRASADO: &str = "#ef4444";

/// Cor da legenda e se o evento está atrasado (agendado com o fim já no passado).
pub fn legend(status: AgendamentoStatus, fim: DateTime<Utc>, now: DateTime<Utc>) -> (&'static str, bool) {
    match status {
        AgendamentoStatus::Agendado if fim < now => (COR_ATRASADO, true),
        AgendamentoStatus::Agendado => (COR_AGENDADO, false),
        AgendamentoStatus::Iniciado => (COR_INICIADO, false),
        AgendamentoStatus::Concluido => (COR_CONCLUIDO, false),
    }
}

/// O formato que o widget de calendário do frontend consome.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: Uuid,
    #[schema(example = "Prensa 03 - Troca de óleo trimestral")]
    pub title: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    #[schema(example = "#3b82f6")]
    pub color: &'static str,
    pub status: AgendamentoStatus,
    pub atrasado: bool,
    pub maquina_id: Uuid,
    pub plano_id: Option<Uuid>,
    pub chamado_id: Option<Uuid>,
}

impl CalendarEvent {
    pub fn from_agendamento(a: &Agendamento, now: DateTime<Utc>) -> Self {
        let (color, atrasado) = legend(a.status, a.fim, now);
        Self {
            id: a.id,
            title: format!("{} - {}", a.maquina, a.descricao),
            start: a.inicio,
            end: a.fim,
            color,
            status: a.status,
            atrasado,
            maquina_id: a.maquina_id,
            plano_id: a.plano_id,
            chamado_id: a.chamado_id,
        }
    }
}

// --- Filtros e Payloads ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct AgendaFilter {
    /// Início da janela visível do calendário
    pub inicio: Option<DateTime<Utc>>,
    /// Fim da janela visível do calendário
    pub fim: Option<DateTime<Utc>>,
}

fn validate_period(inicio: &DateTime<Utc>, fim: &DateTime<Utc>) -> Result<(), ValidationError> {
    if fim <= inicio {
        let mut err = ValidationError::new("period");
        err.message = Some("O fim deve ser posterior ao início.".into());
        return Err(err);
    }
    Ok(())
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateAgendamentoPayload {
    pub maquina_id: Uuid,
    pub plano_id: Option<Uuid>,
    #[validate(length(min = 1, message = "A descrição é obrigatória."))]
    pub descricao: String,
    pub inicio: DateTime<Utc>,
    pub fim: DateTime<Utc>,
}

impl CreateAgendamentoPayload {
    pub fn validate_consistency(&self) -> Result<(), ValidationError> {
        validate_period(&self.inicio, &self.fim)
    }
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAgendamentoPayload {
    #[validate(length(min = 1, message = "A descrição não pode ser vazia."))]
    pub descricao: Option<String>,
    pub inicio: Option<DateTime<Utc>>,
    pub fim: Option<DateTime<Utc>>,
}

impl UpdateAgendamentoPayload {
    /// Valida o período resultante (combinando o que veio com o que já existe).
    pub fn resulting_period(&self, atual: &Agendamento) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
        let inicio = self.inicio.unwrap_or(atual.inicio);
        let fim = self.fim.unwrap_or(atual.fim);
        validate_period(&inicio, &fim).map_err(|_| AppError::InvalidPeriod)?;
        Ok((inicio, fim))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn agendamento(status: AgendamentoStatus, fim: DateTime<Utc>) -> Agendamento {
        Agendamento {
            id: Uuid::new_v4(),
            maquina_id: Uuid::new_v4(),
            maquina: "Torno 1".into(),
            plano_id: None,
            descricao: "Lubrificação".into(),
            inicio: fim - Duration::hours(2),
            fim,
            status,
            chamado_id: None,
            criado_em: Utc::now(),
            atualizado_em: Utc::now(),
        }
    }

    #[test]
    fn legend_colors_follow_status() {
        let now = Utc::now();
        let amanha = now + Duration::days(1);

        assert_eq!(legend(AgendamentoStatus::Agendado, amanha, now), (COR_AGENDADO, false));
        assert_eq!(legend(AgendamentoStatus::Iniciado, amanha, now), (COR_INICIADO, false));
        assert_eq!(legend(AgendamentoStatus::Concluido, amanha, now), (COR_CONCLUIDO, false));
    }

    #[test]
    fn scheduled_event_in_the_past_is_overdue() {
        let now = Utc::now();
        let ontem = now - Duration::days(1);

        assert_eq!(legend(AgendamentoStatus::Agendado, ontem, now), (COR_ATRASADO, true));
        // Concluído no passado não é atraso
        assert_eq!(legend(AgendamentoStatus::Concluido, ontem, now), (COR_CONCLUIDO, false));
    }

    #[test]
    fn calendar_event_title_combines_machine_and_description() {
        let a = agendamento(AgendamentoStatus::Iniciado, Utc::now());
        let ev = CalendarEvent::from_agendamento(&a, Utc::now());
        assert_eq!(ev.title, "Torno 1 - Lubrificação");
        assert_eq!(ev.color, COR_INICIADO);
    }

    #[test]
    fn only_scheduled_events_are_editable() {
        let now = Utc::now();
        assert!(agendamento(AgendamentoStatus::Agendado, now).check_editable().is_ok());
        assert!(matches!(
            agendamento(AgendamentoStatus::Iniciado, now).check_editable(),
            Err(AppError::ScheduleLocked)
        ));
    }

    #[test]
    fn reschedule_rejects_end_before_start() {
        let atual = agendamento(AgendamentoStatus::Agendado, Utc::now() + Duration::days(2));
        let payload = UpdateAgendamentoPayload {
            descricao: None,
            inicio: Some(atual.fim + Duration::hours(1)),
            fim: None,
        };
        assert!(matches!(payload.resulting_period(&atual), Err(AppError::InvalidPeriod)));
    }

    #[test]
    fn create_payload_checks_the_period() {
        let inicio = Utc::now();
        let payload = CreateAgendamentoPayload {
            maquina_id: Uuid::new_v4(),
            plano_id: None,
            descricao: "Inspeção".into(),
            inicio,
            fim: inicio,
        };
        assert!(payload.validate_consistency().is_err());
    }
}
