pub mod user_repo;
pub use user_repo::UserRepository;
pub mod maquina_repo;
pub use maquina_repo::MaquinaRepository;
pub mod causa_repo;
pub use causa_repo::CausaRaizRepository;
pub mod chamado_repo;
pub use chamado_repo::ChamadoRepository;
pub mod agenda_repo;
pub use agenda_repo::AgendaRepository;
pub mod plano_repo;
pub use plano_repo::PlanoRepository;
pub mod peca_repo;
pub use peca_repo::PecaRepository;
pub mod checklist_repo;
pub use checklist_repo::ChecklistRepository;
pub mod analytics_repo;
pub use analytics_repo::AnalyticsRepository;
