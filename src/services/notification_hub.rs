//! NotificationHub: canal push por conductor
//!
//! Mantiene exactamente un canal vivo por conductor conectado. Un nuevo
//! subscribe para el mismo id reemplaza (y cierra) el canal anterior.
//! La entrega fallida no es un error del llamador: el conductor puede
//! seguir consultando por polling.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, RwLock};
use uuid::Uuid;

use crate::dto::booking_dto::BookingResponse;

/// Capacidad del canal por conductor
const CHANNEL_CAPACITY: usize = 32;

/// Timeout de escritura: un canal que no acepta el evento en esta ventana
/// se trata como desconectado
const SEND_TIMEOUT: Duration = Duration::from_secs(5);

/// Evento de dispatch entregado por el canal push
#[derive(Debug, Clone, Serialize)]
pub struct DispatchEvent {
    pub event: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub booking: Option<BookingResponse>,
    pub timestamp: DateTime<Utc>,
}

impl DispatchEvent {
    pub fn new(event: impl Into<String>, booking: Option<BookingResponse>) -> Self {
        Self {
            event: event.into(),
            booking,
            timestamp: Utc::now(),
        }
    }

    /// Ack sintético enviado como primer evento de toda conexión
    pub fn connected() -> Self {
        Self::new("connected", None)
    }
}

/// Resultado de un fan-out: fallos independientes por destinatario
#[derive(Debug, Default)]
pub struct PublishOutcome {
    pub sent: Vec<Uuid>,
    pub failed: Vec<Uuid>,
}

/// Registro de suscripciones keyed por driver id.
///
/// Instancia explícita compartida via Arc desde AppState; no hay estado
/// global de módulo.
#[derive(Clone, Default)]
pub struct NotificationHub {
    channels: Arc<RwLock<HashMap<Uuid, mpsc::Sender<DispatchEvent>>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registrar el canal de un conductor. El canal anterior del mismo id
    /// (si existía) se cierra al ser reemplazado. El primer evento recibido
    /// siempre es el ack "connected".
    pub async fn subscribe(&self, driver_id: Uuid) -> mpsc::Receiver<DispatchEvent> {
        let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);

        // El ack entra antes de publicar el sender para que nada se cuele
        // delante de él
        let _ = tx.send(DispatchEvent::connected()).await;

        let previous = {
            let mut channels = self.channels.write().await;
            channels.insert(driver_id, tx)
        };
        if let Some(old) = previous {
            // Soltar el sender cierra el canal anterior
            drop(old);
            tracing::debug!("Suscripción reemplazada para driver {}", driver_id);
        }

        tracing::info!("📡 Driver {} suscrito a notificaciones", driver_id);
        rx
    }

    /// Entregar un evento al canal actual del conductor. Devuelve false
    /// (no un error) cuando no hay canal activo o el canal está caído.
    pub async fn publish(&self, driver_id: Uuid, event: DispatchEvent) -> bool {
        let sender = {
            let channels = self.channels.read().await;
            channels.get(&driver_id).cloned()
        };

        let Some(sender) = sender else {
            tracing::debug!("Driver {} sin canal activo para '{}'", driver_id, event.event);
            return false;
        };

        match tokio::time::timeout(SEND_TIMEOUT, sender.send(event)).await {
            Ok(Ok(())) => true,
            _ => {
                // Canal cerrado o atascado: se trata como desconexión
                self.remove_if_same(driver_id, &sender).await;
                tracing::warn!("Canal caído para driver {}, suscripción eliminada", driver_id);
                false
            }
        }
    }

    /// Fan-out a un conjunto de candidatos. El fallo de un destinatario no
    /// afecta a los demás.
    pub async fn publish_many(&self, driver_ids: &[Uuid], event: DispatchEvent) -> PublishOutcome {
        let mut outcome = PublishOutcome::default();
        for &driver_id in driver_ids {
            if self.publish(driver_id, event.clone()).await {
                outcome.sent.push(driver_id);
            } else {
                outcome.failed.push(driver_id);
            }
        }
        outcome
    }

    /// Cierre explícito del canal de un conductor
    pub async fn unsubscribe(&self, driver_id: Uuid) -> bool {
        let removed = self.channels.write().await.remove(&driver_id);
        if removed.is_some() {
            tracing::info!("📴 Driver {} desuscrito de notificaciones", driver_id);
        }
        removed.is_some()
    }

    pub async fn is_subscribed(&self, driver_id: Uuid) -> bool {
        self.channels.read().await.contains_key(&driver_id)
    }

    /// Eliminar la suscripción solo si sigue siendo el mismo canal: un
    /// subscribe concurrente pudo haberla reemplazado
    async fn remove_if_same(&self, driver_id: Uuid, sender: &mpsc::Sender<DispatchEvent>) {
        let mut channels = self.channels.write().await;
        if let Some(current) = channels.get(&driver_id) {
            if current.same_channel(sender) {
                channels.remove(&driver_id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn first_event_is_connected_ack() {
        let hub = NotificationHub::new();
        let driver = Uuid::new_v4();

        let mut rx = hub.subscribe(driver).await;
        let ack = rx.recv().await.expect("ack esperado");
        assert_eq!(ack.event, "connected");
        assert!(ack.booking.is_none());
    }

    #[tokio::test]
    async fn publish_without_channel_returns_false() {
        let hub = NotificationHub::new();
        let delivered = hub
            .publish(Uuid::new_v4(), DispatchEvent::new("booking_assigned", None))
            .await;
        assert!(!delivered);
    }

    #[tokio::test]
    async fn second_subscribe_replaces_first() {
        let hub = NotificationHub::new();
        let driver = Uuid::new_v4();

        let mut first = hub.subscribe(driver).await;
        assert_eq!(first.recv().await.unwrap().event, "connected");

        let mut second = hub.subscribe(driver).await;
        assert_eq!(second.recv().await.unwrap().event, "connected");

        // El canal viejo quedó cerrado
        assert!(first.recv().await.is_none());

        // Las publicaciones llegan solo al canal nuevo
        assert!(hub.publish(driver, DispatchEvent::new("ride_started", None)).await);
        assert_eq!(second.recv().await.unwrap().event, "ride_started");
    }

    #[tokio::test]
    async fn publish_after_unsubscribe_is_undelivered() {
        let hub = NotificationHub::new();
        let driver = Uuid::new_v4();

        let mut rx = hub.subscribe(driver).await;
        assert_eq!(rx.recv().await.unwrap().event, "connected");
        assert!(hub.publish(driver, DispatchEvent::new("booking_assigned", None)).await);

        assert!(hub.unsubscribe(driver).await);
        assert!(!hub.publish(driver, DispatchEvent::new("booking_assigned", None)).await);
    }

    #[tokio::test]
    async fn dropped_receiver_is_cleaned_up_on_next_publish() {
        let hub = NotificationHub::new();
        let driver = Uuid::new_v4();

        let rx = hub.subscribe(driver).await;
        drop(rx);

        assert!(!hub.publish(driver, DispatchEvent::new("booking_assigned", None)).await);
        assert!(!hub.is_subscribed(driver).await);
    }

    #[tokio::test]
    async fn publish_many_isolates_failures() {
        let hub = NotificationHub::new();
        let connected = Uuid::new_v4();
        let disconnected = Uuid::new_v4();

        let mut rx = hub.subscribe(connected).await;
        assert_eq!(rx.recv().await.unwrap().event, "connected");

        let outcome = hub
            .publish_many(
                &[connected, disconnected],
                DispatchEvent::new("booking_assigned", None),
            )
            .await;

        assert_eq!(outcome.sent, vec![connected]);
        assert_eq!(outcome.failed, vec![disconnected]);
        assert_eq!(rx.recv().await.unwrap().event, "booking_assigned");
    }
}
