pub mod agendamentos;
pub mod analytics;
pub mod auth;
pub mod causas;
pub mod chamados;
pub mod checklists;
pub mod eventos;
pub mod maquinas;
pub mod pecas;
pub mod planos;
pub mod relatorios;
pub mod usuarios;
