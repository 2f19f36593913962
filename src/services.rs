pub mod agenda_service;
pub mod analytics_service;
pub mod auth;
pub mod catalog_service;
pub mod chamado_service;
pub mod checklist_service;
pub mod document_service;
pub mod event_bus;
pub mod peca_service;
pub mod plano_service;

#[cfg(test)]
pub mod test_support;
