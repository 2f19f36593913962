// src/models/maquinas.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Maquina {
    pub id: Uuid,
    #[schema(example = "Prensa 03")]
    pub nome: String,
    #[schema(example = "Estamparia")]
    pub setor: Option<String>,
    #[schema(example = json!(["Verificar nível de óleo", "Testar botão de emergência"]))]
    pub checklist_diario: Vec<String>,
    pub ativa: bool,
    pub criado_em: DateTime<Utc>,
    pub atualizado_em: DateTime<Utc>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct MaquinaFilter {
    pub ativa: Option<bool>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaquinaPayload {
    #[validate(length(min = 1, message = "O nome é obrigatório."))]
    pub nome: String,
    pub setor: Option<String>,
    #[serde(default)]
    pub checklist_diario: Vec<String>,
}

// Todos os campos opcionais: só o que vier é alterado
#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaquinaPayload {
    #[validate(length(min = 1, message = "O nome não pode ser vazio."))]
    pub nome: Option<String>,
    pub setor: Option<String>,
    pub checklist_diario: Option<Vec<String>>,
    pub ativa: Option<bool>,
}
