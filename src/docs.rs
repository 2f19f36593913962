// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;
use crate::services;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,

        // --- Usuários ---
        handlers::auth::get_me,
        handlers::usuarios::list_usuarios,
        handlers::usuarios::create_usuario,
        handlers::usuarios::update_usuario,

        // --- Máquinas ---
        handlers::maquinas::list_maquinas,
        handlers::maquinas::get_maquina,
        handlers::maquinas::create_maquina,
        handlers::maquinas::update_maquina,
        handlers::maquinas::delete_maquina,

        // --- Causas raiz ---
        handlers::causas::list_causas,
        handlers::causas::create_causa,
        handlers::causas::delete_causa,

        // --- Chamados ---
        handlers::chamados::list_chamados,
        handlers::chamados::create_chamado,
        handlers::chamados::get_chamado,
        handlers::chamados::delete_chamado,
        handlers::chamados::assumir_chamado,
        handlers::chamados::liberar_chamado,
        handlers::chamados::toggle_checklist,
        handlers::chamados::add_observacao,
        handlers::chamados::concluir_chamado,
        handlers::chamados::consumir_peca,
        handlers::chamados::chamado_pdf,

        // --- Agenda ---
        handlers::agendamentos::list_agendamentos,
        handlers::agendamentos::get_agendamento,
        handlers::agendamentos::create_agendamento,
        handlers::agendamentos::update_agendamento,
        handlers::agendamentos::delete_agendamento,
        handlers::agendamentos::iniciar_agendamento,

        // --- Planos ---
        handlers::planos::list_planos,
        handlers::planos::list_planos_vencendo,
        handlers::planos::get_plano,
        handlers::planos::create_plano,
        handlers::planos::update_plano,
        handlers::planos::delete_plano,
        handlers::planos::gerar_chamado,

        // --- Peças ---
        handlers::pecas::list_pecas,
        handlers::pecas::list_estoque_baixo,
        handlers::pecas::create_peca,
        handlers::pecas::update_peca,
        handlers::pecas::create_movimentacao,
        handlers::pecas::list_movimentacoes,

        // --- Checklists ---
        handlers::checklists::submit_checklist,
        handlers::checklists::list_checklists,
        handlers::checklists::list_pendentes,

        // --- Analytics ---
        handlers::analytics::get_resumo,
        handlers::analytics::get_por_maquina,
        handlers::analytics::get_pareto_causas,
        handlers::analytics::get_por_manutentor,

        // --- Relatórios ---
        handlers::relatorios::chamados_pdf,

        // --- Eventos ---
        handlers::eventos::stream_eventos,
    ),
    components(
        schemas(
            // --- Auth ---
            models::auth::Role,
            models::auth::Usuario,
            models::auth::LoginPayload,
            models::auth::AuthResponse,
            models::auth::CreateUsuarioPayload,
            models::auth::UpdateUsuarioPayload,

            // --- Cadastros ---
            models::maquinas::Maquina,
            models::maquinas::CreateMaquinaPayload,
            models::maquinas::UpdateMaquinaPayload,
            models::causas::CausaRaiz,
            models::causas::CreateCausaRaizPayload,

            // --- Chamados ---
            models::chamados::ChamadoStatus,
            models::chamados::ChamadoTipo,
            models::chamados::ChecklistItem,
            models::chamados::Observacao,
            models::chamados::Chamado,
            models::chamados::CreateChamadoPayload,
            models::chamados::ConcluirChamadoPayload,
            models::chamados::ObservacaoPayload,
            models::chamados::ChecklistTogglePayload,
            models::chamados::ConsumirPecaPayload,

            // --- Agenda ---
            models::agenda::AgendamentoStatus,
            models::agenda::Agendamento,
            models::agenda::CalendarEvent,
            models::agenda::CreateAgendamentoPayload,
            models::agenda::UpdateAgendamentoPayload,

            // --- Planos ---
            models::planos::PlanoTipo,
            models::planos::Plano,
            models::planos::CreatePlanoPayload,
            models::planos::UpdatePlanoPayload,

            // --- Peças ---
            models::pecas::Peca,
            models::pecas::MovimentacaoTipo,
            models::pecas::Movimentacao,
            models::pecas::CreatePecaPayload,
            models::pecas::UpdatePecaPayload,
            models::pecas::MovimentacaoPayload,

            // --- Checklists ---
            models::checklists::ChecklistResposta,
            models::checklists::ChecklistSubmission,
            models::checklists::ChecklistPendente,
            models::checklists::CreateChecklistPayload,

            // --- Analytics ---
            models::analytics::ContagemStatus,
            models::analytics::ContagemTipo,
            models::analytics::Resumo,
            models::analytics::MaquinaStats,
            models::analytics::CausaPareto,
            models::analytics::ManutentorStats,

            // --- Eventos ---
            services::event_bus::Topic,
            services::event_bus::ChangeEvent,
        )
    ),
    tags(
        (name = "Auth", description = "Autenticação"),
        (name = "Usuários", description = "Usuários e perfis de acesso"),
        (name = "Máquinas", description = "Cadastro de máquinas e checklist diário"),
        (name = "Causas Raiz", description = "Catálogo de causas raiz"),
        (name = "Chamados", description = "Abertura e ciclo de vida dos chamados"),
        (name = "Agenda", description = "Calendário de preventivas"),
        (name = "Planos", description = "Planos de manutenção preventiva e preditiva"),
        (name = "Peças", description = "Estoque de peças e movimentações"),
        (name = "Checklists", description = "Checklists diários dos operadores"),
        (name = "Analytics", description = "Indicadores gerenciais"),
        (name = "Relatórios", description = "Exportação em PDF"),
        (name = "Eventos", description = "Stream SSE de invalidação de cache")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}
