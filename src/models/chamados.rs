// src/models/chamados.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

use crate::{common::error::AppError, models::auth::{Role, Usuario}};

// --- Enums ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "chamado_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ChamadoStatus {
    #[serde(rename = "Aberto")]
    Aberto,
    #[serde(rename = "Em Andamento")]
    EmAndamento,
    #[serde(rename = "Concluído")]
    Concluido,
}

impl ChamadoStatus {
    /// O texto exibido no frontend (o mesmo do JSON).
    pub fn label(&self) -> &'static str {
        match self {
            ChamadoStatus::Aberto => "Aberto",
            ChamadoStatus::EmAndamento => "Em Andamento",
            ChamadoStatus::Concluido => "Concluído",
        }
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "chamado_tipo", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "lowercase")]
pub enum ChamadoTipo {
    #[default]
    Corretiva,
    Preventiva,
    Preditiva,
}

// --- Ciclo de vida ---

/// As ações que mudam um chamado, cada uma válida só a partir de certos status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChamadoAction {
    Assumir,
    Liberar,
    AtualizarChecklist,
    Observar,
    ConsumirPeca,
    Concluir,
}

impl ChamadoAction {
    pub fn verb(&self) -> &'static str {
        match self {
            ChamadoAction::Assumir => "assumir",
            ChamadoAction::Liberar => "liberar",
            ChamadoAction::AtualizarChecklist => "atualizar o checklist de",
            ChamadoAction::Observar => "comentar em",
            ChamadoAction::ConsumirPeca => "registrar peças em",
            ChamadoAction::Concluir => "concluir",
        }
    }

    fn allowed_from(&self, status: ChamadoStatus) -> bool {
        use ChamadoStatus::*;
        match self {
            ChamadoAction::Assumir => status == Aberto,
            ChamadoAction::Liberar
            | ChamadoAction::AtualizarChecklist
            | ChamadoAction::ConsumirPeca
            | ChamadoAction::Concluir => status == EmAndamento,
            ChamadoAction::Observar => status != Concluido,
        }
    }

    /// Status resultante da ação (ou o mesmo, para ações que não mudam o status).
    pub fn apply(&self, status: ChamadoStatus) -> Result<ChamadoStatus, AppError> {
        if !self.allowed_from(status) {
            return Err(AppError::InvalidTransition {
                action: self.verb().to_string(),
                status: status.label().to_string(),
            });
        }
        Ok(match self {
            ChamadoAction::Assumir => ChamadoStatus::EmAndamento,
            ChamadoAction::Liberar => ChamadoStatus::Aberto,
            ChamadoAction::Concluir => ChamadoStatus::Concluido,
            ChamadoAction::AtualizarChecklist
            | ChamadoAction::Observar
            | ChamadoAction::ConsumirPeca => status,
        })
    }
}

// --- Sub-documentos (JSONB) ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ChecklistItem {
    #[schema(example = "Verificar nível de óleo")]
    pub item: String,
    pub concluido: bool,
}

/// Gera o checklist de um chamado a partir das tarefas de um plano (ou do checklist diário).
pub fn build_checklist(tarefas: &[String]) -> Vec<ChecklistItem> {
    tarefas
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(|t| ChecklistItem { item: t.to_string(), concluido: false })
        .collect()
}

/// Remove espaços e linhas vazias de uma lista de tarefas (ou do checklist diário).
pub fn clean_tasks(tarefas: Vec<String>) -> Vec<String> {
    tarefas
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Observacao {
    pub autor_id: Uuid,
    pub autor_nome: String,
    pub texto: String,
    pub criado_em: DateTime<Utc>,
}

// --- O chamado ---

#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Chamado {
    pub id: Uuid,
    #[schema(example = 1024)]
    pub numero: i32,
    pub maquina_id: Uuid,
    #[schema(example = "Prensa 03")]
    pub maquina: String,
    pub tipo: ChamadoTipo,
    pub status: ChamadoStatus,
    #[schema(example = "Vazamento de óleo no cilindro principal")]
    pub descricao: String,
    pub operador_id: Uuid,
    pub operador_nome: String,
    pub manutentor_id: Option<Uuid>,
    pub manutentor_nome: Option<String>,
    #[sqlx(json)]
    pub checklist: Vec<ChecklistItem>,
    #[sqlx(json)]
    pub observacoes: Vec<Observacao>,
    #[schema(example = "Desgaste natural")]
    pub causa: Option<String>,
    pub solucao: Option<String>,
    pub agendamento_id: Option<Uuid>,
    pub plano_id: Option<Uuid>,
    pub criado_em: DateTime<Utc>,
    pub assumido_em: Option<DateTime<Utc>>,
    pub concluido_em: Option<DateTime<Utc>>,
    pub atualizado_em: DateTime<Utc>,
}

impl Chamado {
    /// Regras para concluir: solução sempre; causa raiz em corretivas; checklist completo
    /// nas preventivas/preditivas.
    pub fn check_can_conclude(&self, causa: Option<&str>) -> Result<(), AppError> {
        ChamadoAction::Concluir.apply(self.status)?;

        if self.tipo == ChamadoTipo::Corretiva && causa.map(str::trim).unwrap_or("").is_empty() {
            return Err(AppError::RootCauseRequired);
        }
        if self.tipo != ChamadoTipo::Corretiva && self.checklist.iter().any(|i| !i.concluido) {
            return Err(AppError::ChecklistIncomplete);
        }
        Ok(())
    }

    /// Só o manutentor responsável (ou quem gerencia chamados) mexe em um chamado em andamento.
    pub fn check_maintainer(&self, user: &Usuario) -> Result<(), AppError> {
        let is_manager = matches!(user.role, Role::Gestor | Role::Admin);
        if is_manager || self.manutentor_id == Some(user.id) {
            Ok(())
        } else {
            Err(AppError::NotAssignedMaintainer)
        }
    }
}

/// Dados para inserir um chamado (vindo da API, de um agendamento, de um plano ou de um checklist).
#[derive(Debug, Clone)]
pub struct NovoChamado {
    pub maquina_id: Uuid,
    pub maquina: String,
    pub tipo: ChamadoTipo,
    pub status: ChamadoStatus,
    pub descricao: String,
    pub operador_id: Uuid,
    pub operador_nome: String,
    pub manutentor_id: Option<Uuid>,
    pub manutentor_nome: Option<String>,
    pub checklist: Vec<ChecklistItem>,
    pub agendamento_id: Option<Uuid>,
    pub plano_id: Option<Uuid>,
}

/// Quais chamados um usuário enxerga na listagem.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChamadoScope {
    Todos,
    /// Só os abertos pelo operador
    Operador(Uuid),
    /// Os abertos de qualquer um, mais os atribuídos ao manutentor
    Manutentor(Uuid),
}

impl ChamadoScope {
    pub fn for_user(user: &Usuario) -> Self {
        match user.role {
            Role::Operador => ChamadoScope::Operador(user.id),
            Role::Manutentor => ChamadoScope::Manutentor(user.id),
            Role::Gestor | Role::Admin => ChamadoScope::Todos,
        }
    }

    pub fn allows(&self, chamado: &Chamado) -> bool {
        match self {
            ChamadoScope::Todos => true,
            ChamadoScope::Operador(id) => chamado.operador_id == *id,
            ChamadoScope::Manutentor(id) => {
                chamado.status == ChamadoStatus::Aberto || chamado.manutentor_id == Some(*id)
            }
        }
    }
}

// --- Filtros e Payloads ---

#[derive(Debug, Default, Clone, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ChamadoFilter {
    pub status: Option<ChamadoStatus>,
    pub tipo: Option<ChamadoTipo>,
    pub maquina_id: Option<Uuid>,
    pub manutentor_id: Option<Uuid>,
    /// Data inicial (inclusive) de abertura
    pub desde: Option<NaiveDate>,
    /// Data final (inclusive) de abertura
    pub ate: Option<NaiveDate>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateChamadoPayload {
    pub maquina_id: Uuid,
    #[serde(default)]
    pub tipo: ChamadoTipo,
    #[validate(length(min = 3, message = "Descreva o problema (mínimo 3 caracteres)."))]
    pub descricao: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConcluirChamadoPayload {
    #[validate(length(min = 1, message = "A solução é obrigatória."))]
    pub solucao: String,
    #[schema(example = "Desgaste natural")]
    pub causa: Option<String>,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ObservacaoPayload {
    #[validate(length(min = 1, message = "A observação não pode ser vazia."))]
    pub texto: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChecklistTogglePayload {
    pub indice: usize,
    pub concluido: bool,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ConsumirPecaPayload {
    pub peca_id: Uuid,
    #[schema(value_type = f64, example = 2.0)]
    pub quantidade: Decimal,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn usuario(role: Role) -> Usuario {
        Usuario {
            id: Uuid::new_v4(),
            nome: "Teste".into(),
            email: "teste@fabrica.com".into(),
            senha_hash: String::new(),
            role,
            ativo: true,
            criado_em: Utc::now(),
            atualizado_em: Utc::now(),
        }
    }

    fn chamado(tipo: ChamadoTipo, status: ChamadoStatus) -> Chamado {
        Chamado {
            id: Uuid::new_v4(),
            numero: 1,
            maquina_id: Uuid::new_v4(),
            maquina: "Prensa 03".into(),
            tipo,
            status,
            descricao: "Vazamento".into(),
            operador_id: Uuid::new_v4(),
            operador_nome: "Op".into(),
            manutentor_id: None,
            manutentor_nome: None,
            checklist: vec![],
            observacoes: vec![],
            causa: None,
            solucao: None,
            agendamento_id: None,
            plano_id: None,
            criado_em: Utc::now(),
            assumido_em: None,
            concluido_em: None,
            atualizado_em: Utc::now(),
        }
    }

    #[test]
    fn lifecycle_follows_open_in_progress_done() {
        let s = ChamadoAction::Assumir.apply(ChamadoStatus::Aberto).unwrap();
        assert_eq!(s, ChamadoStatus::EmAndamento);
        let s = ChamadoAction::Concluir.apply(s).unwrap();
        assert_eq!(s, ChamadoStatus::Concluido);
    }

    #[test]
    fn release_goes_back_to_open() {
        assert_eq!(
            ChamadoAction::Liberar.apply(ChamadoStatus::EmAndamento).unwrap(),
            ChamadoStatus::Aberto
        );
    }

    #[test]
    fn invalid_transitions_are_rejected() {
        assert!(matches!(
            ChamadoAction::Concluir.apply(ChamadoStatus::Aberto),
            Err(AppError::InvalidTransition { .. })
        ));
        assert!(ChamadoAction::Assumir.apply(ChamadoStatus::EmAndamento).is_err());
        assert!(ChamadoAction::Observar.apply(ChamadoStatus::Concluido).is_err());
        assert!(ChamadoAction::AtualizarChecklist.apply(ChamadoStatus::Aberto).is_err());
        assert!(ChamadoAction::ConsumirPeca.apply(ChamadoStatus::Concluido).is_err());
    }

    #[test]
    fn observations_are_allowed_until_closed() {
        assert_eq!(
            ChamadoAction::Observar.apply(ChamadoStatus::Aberto).unwrap(),
            ChamadoStatus::Aberto
        );
    }

    #[test]
    fn corrective_ticket_needs_a_root_cause() {
        let c = chamado(ChamadoTipo::Corretiva, ChamadoStatus::EmAndamento);
        assert!(matches!(c.check_can_conclude(None), Err(AppError::RootCauseRequired)));
        assert!(matches!(c.check_can_conclude(Some("  ")), Err(AppError::RootCauseRequired)));
        assert!(c.check_can_conclude(Some("Desgaste natural")).is_ok());
    }

    #[test]
    fn preventive_ticket_needs_a_complete_checklist() {
        let mut c = chamado(ChamadoTipo::Preventiva, ChamadoStatus::EmAndamento);
        c.checklist = build_checklist(&["Lubrificar".into(), "Trocar filtro".into()]);
        assert!(matches!(c.check_can_conclude(None), Err(AppError::ChecklistIncomplete)));

        for item in c.checklist.iter_mut() {
            item.concluido = true;
        }
        assert!(c.check_can_conclude(None).is_ok());
    }

    #[test]
    fn build_checklist_skips_blank_tasks() {
        let checklist = build_checklist(&[" Lubrificar ".into(), "".into(), "   ".into()]);
        assert_eq!(
            checklist,
            vec![ChecklistItem { item: "Lubrificar".into(), concluido: false }]
        );
    }

    #[test]
    fn task_lists_are_trimmed_and_blank_lines_dropped() {
        let tarefas = clean_tasks(vec![" Óleo ".into(), "".into(), "  ".into(), "Ruído".into()]);
        assert_eq!(tarefas, vec!["Óleo".to_string(), "Ruído".to_string()]);
    }

    #[test]
    fn only_the_assigned_maintainer_or_a_manager_can_act() {
        let dono = usuario(Role::Manutentor);
        let outro = usuario(Role::Manutentor);
        let gestor = usuario(Role::Gestor);
        let mut c = chamado(ChamadoTipo::Corretiva, ChamadoStatus::EmAndamento);
        c.manutentor_id = Some(dono.id);

        assert!(c.check_maintainer(&dono).is_ok());
        assert!(c.check_maintainer(&gestor).is_ok());
        assert!(matches!(c.check_maintainer(&outro), Err(AppError::NotAssignedMaintainer)));
    }

    #[test]
    fn list_scope_depends_on_role() {
        let operador = usuario(Role::Operador);
        let manutentor = usuario(Role::Manutentor);

        let mut meu = chamado(ChamadoTipo::Corretiva, ChamadoStatus::EmAndamento);
        meu.operador_id = operador.id;
        let aberto = chamado(ChamadoTipo::Corretiva, ChamadoStatus::Aberto);
        let mut de_outro = chamado(ChamadoTipo::Corretiva, ChamadoStatus::EmAndamento);
        de_outro.manutentor_id = Some(Uuid::new_v4());

        let op_scope = ChamadoScope::for_user(&operador);
        assert!(op_scope.allows(&meu));
        assert!(!op_scope.allows(&aberto));

        let man_scope = ChamadoScope::for_user(&manutentor);
        assert!(man_scope.allows(&aberto));
        assert!(!man_scope.allows(&de_outro));

        assert!(ChamadoScope::for_user(&usuario(Role::Admin)).allows(&de_outro));
    }

    #[test]
    fn status_uses_the_frontend_labels() {
        assert_eq!(
            serde_json::to_string(&ChamadoStatus::EmAndamento).unwrap(),
            r#""Em Andamento""#
        );
        let s: ChamadoStatus = serde_json::from_str(r#""Concluído""#).unwrap();
        assert_eq!(s, ChamadoStatus::Concluido);
    }
}
