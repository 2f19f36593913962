// src/handlers/eventos.rs

use std::convert::Infallible;

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, Sse},
};
use tokio_stream::{
    wrappers::{errors::BroadcastStreamRecvError, BroadcastStream},
    Stream, StreamExt,
};

use crate::{config::AppState, middleware::auth::AuthenticatedUser, services::event_bus::ChangeEvent};

/// Converte um item do broadcast em evento SSE. Lag apenas descarta o que se perdeu.
fn to_sse(item: Result<ChangeEvent, BroadcastStreamRecvError>) -> Option<Result<Event, Infallible>> {
    match item {
        Ok(change) => match Event::default().json_data(change) {
            Ok(event) => Some(Ok(event)),
            Err(e) => {
                tracing::error!("Falha ao serializar evento: {}", e);
                None
            }
        },
        Err(BroadcastStreamRecvError::Lagged(perdidos)) => {
            tracing::debug!(perdidos, "Assinante SSE atrasado, eventos descartados");
            None
        }
    }
}

// Fluxo de invalidação de cache: cada escrita confirmada vira {"topic": "<coleção>"}
#[utoipa::path(
    get,
    path = "/api/eventos",
    tag = "Eventos",
    params(("token" = Option<String>, Query, description = "JWT, para clientes EventSource que não enviam cabeçalhos")),
    responses(
        (status = 200, description = "Stream text/event-stream de ChangeEvent", content_type = "text/event-stream", body = ChangeEvent),
        (status = 401, description = "Token ausente ou inválido")
    ),
    security(("api_jwt" = []))
)]
pub async fn stream_eventos(
    State(app_state): State<AppState>,
    AuthenticatedUser(user): AuthenticatedUser,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    tracing::debug!(usuario = %user.email, "Novo assinante SSE");

    let stream = BroadcastStream::new(app_state.events.subscribe()).filter_map(to_sse);

    Sse::new(stream).keep_alive(KeepAlive::default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::event_bus::Topic;

    #[test]
    fn lagged_items_are_skipped() {
        assert!(to_sse(Err(BroadcastStreamRecvError::Lagged(3))).is_none());
    }

    #[test]
    fn changes_become_events() {
        let item = to_sse(Ok(ChangeEvent { topic: Topic::Chamados }));
        assert!(matches!(item, Some(Ok(_))));
    }
}
