pub mod agenda;
pub mod analytics;
pub mod auth;
pub mod causas;
pub mod chamados;
pub mod checklists;
pub mod maquinas;
pub mod pecas;
pub mod planos;
