// src/services/event_bus.rs

use serde::Serialize;
use tokio::sync::broadcast;
use utoipa::ToSchema;

/// Capacidade do canal. Assinantes mais lentos que isso perdem eventos (lag).
const CHANNEL_CAPACITY: usize = 256;

// As "coleções" que o frontend escuta. Os nomes seguem os do frontend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub enum Topic {
    #[serde(rename = "usuarios")]
    Usuarios,
    #[serde(rename = "maquinas")]
    Maquinas,
    #[serde(rename = "chamados")]
    Chamados,
    #[serde(rename = "agendamentosPreventivos")]
    Agendamentos,
    #[serde(rename = "planos")]
    Planos,
    #[serde(rename = "pecas")]
    Pecas,
    #[serde(rename = "checklistSubmissions")]
    Checklists,
    #[serde(rename = "causasRaiz")]
    CausasRaiz,
}

/// Aviso de que algo mudou em uma coleção. O cliente decide o que recarregar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
pub struct ChangeEvent {
    pub topic: Topic,
}

/// Notificador pub/sub em memória usado pelo endpoint SSE.
/// Sem ordenação entre tópicos, sem retry e sem garantia de entrega.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<ChangeEvent>,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { tx }
    }

    pub fn publish(&self, topic: Topic) {
        // Sem assinantes o send falha; isso é normal e não é erro.
        if self.tx.send(ChangeEvent { topic }).is_err() {
            tracing::trace!("Nenhum assinante para o tópico {:?}", topic);
        }
    }

    pub fn publish_all(&self, topics: &[Topic]) {
        for topic in topics {
            self.publish(*topic);
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ChangeEvent> {
        self.tx.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn every_subscriber_receives_the_event() {
        let bus = EventBus::new();
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();

        bus.publish(Topic::Chamados);

        assert_eq!(rx1.recv().await.unwrap().topic, Topic::Chamados);
        assert_eq!(rx2.recv().await.unwrap().topic, Topic::Chamados);
    }

    #[test]
    fn publishing_without_subscribers_does_not_panic() {
        let bus = EventBus::new();
        assert_eq!(bus.subscriber_count(), 0);
        bus.publish_all(&[Topic::Pecas, Topic::Maquinas]);
    }

    #[test]
    fn topics_serialize_with_collection_names() {
        let json = serde_json::to_string(&ChangeEvent { topic: Topic::Agendamentos }).unwrap();
        assert_eq!(json, r#"{"topic":"agendamentosPreventivos"}"#);
    }

    #[tokio::test]
    async fn lagging_subscriber_skips_old_events() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        for _ in 0..(CHANNEL_CAPACITY + 10) {
            bus.publish(Topic::Pecas);
        }
        bus.publish(Topic::CausasRaiz);

        assert!(matches!(
            rx.recv().await,
            Err(broadcast::error::RecvError::Lagged(_))
        ));
        // Depois do lag o receptor continua funcionando
        assert_eq!(rx.recv().await.unwrap().topic, Topic::Pecas);
    }
}
