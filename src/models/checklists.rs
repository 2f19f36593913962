// src/models/checklists.rs

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Uma linha do checklist diário, como o operador respondeu.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChecklistResposta {
    #[schema(example = "Verificar nível de óleo")]
    pub item: String,
    pub conforme: bool,
    pub observacao: Option<String>,
}

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistSubmission {
    pub id: Uuid,
    pub maquina_id: Uuid,
    pub maquina: String,
    pub operador_id: Uuid,
    pub operador_nome: String,
    #[sqlx(json)]
    pub itens: Vec<ChecklistResposta>,
    /// Chamado corretivo aberto automaticamente por não conformidade
    pub chamado_id: Option<Uuid>,
    pub criado_em: DateTime<Utc>,
}

/// Descrição do chamado corretivo aberto quando há itens não conformes.
/// `None` quando tudo está conforme.
pub fn non_conformity_description(itens: &[ChecklistResposta]) -> Option<String> {
    let falhas: Vec<String> = itens
        .iter()
        .filter(|i| !i.conforme)
        .map(|i| match i.observacao.as_deref().map(str::trim) {
            Some(obs) if !obs.is_empty() => format!("{} ({})", i.item, obs),
            _ => i.item.clone(),
        })
        .collect();

    if falhas.is_empty() {
        return None;
    }
    Some(format!("Checklist diário com não conformidades: {}", falhas.join("; ")))
}

/// Máquina ativa que ainda não recebeu o checklist do dia.
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistPendente {
    pub maquina_id: Uuid,
    pub maquina: String,
    pub setor: Option<String>,
    pub checklist_diario: Vec<String>,
}

// --- Filtros e Payloads ---

#[derive(Debug, Default, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ChecklistFilter {
    pub maquina_id: Option<Uuid>,
    /// Dia do envio
    pub data: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChecklistPayload {
    pub maquina_id: Uuid,
    #[validate(length(min = 1, message = "Responda pelo menos um item."))]
    pub itens: Vec<ChecklistResposta>,
}
