//! Servicio de mensajería saliente (email/SMS vía webhook)
//!
//! Colaborador fire-and-forget: se invoca en ASSIGNED (avisar al conductor)
//! y en ACCEPTED/REJECTED (avisar al cliente). Sus fallos se loguean y
//! jamás bloquean ni revierten una transición de estado.

use serde_json::json;
use uuid::Uuid;

#[derive(Clone)]
pub struct MessagingService {
    client: reqwest::Client,
    webhook_url: Option<String>,
}

impl MessagingService {
    pub fn new(webhook_url: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            webhook_url,
        }
    }

    /// Servicio sin webhook configurado: solo loguea. Útil en tests y
    /// desarrollo local.
    pub fn disabled() -> Self {
        Self::new(None)
    }

    /// Enviar un mensaje a un destinatario. No espera la respuesta: el
    /// envío corre en una tarea aparte y cualquier error queda en el log.
    pub fn send(&self, recipient_id: Uuid, recipient_kind: &'static str, subject: &str, body: String) {
        let Some(url) = self.webhook_url.clone() else {
            tracing::info!(
                "✉️  [{}:{}] {} - {}",
                recipient_kind,
                recipient_id,
                subject,
                body
            );
            return;
        };

        let client = self.client.clone();
        let subject = subject.to_string();
        tokio::spawn(async move {
            let payload = json!({
                "recipient_id": recipient_id,
                "recipient_kind": recipient_kind,
                "subject": subject,
                "body": body,
            });
            match client.post(&url).json(&payload).send().await {
                Ok(resp) if resp.status().is_success() => {
                    tracing::debug!("Mensaje entregado a {} {}", recipient_kind, recipient_id);
                }
                Ok(resp) => {
                    tracing::warn!(
                        "Webhook de mensajería respondió {} para {} {}",
                        resp.status(),
                        recipient_kind,
                        recipient_id
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        "Fallo enviando mensaje a {} {}: {}",
                        recipient_kind,
                        recipient_id,
                        e
                    );
                }
            }
        });
    }

    pub fn notify_driver(&self, driver_id: Uuid, subject: &str, body: String) {
        self.send(driver_id, "driver", subject, body);
    }

    pub fn notify_customer(&self, customer_id: Uuid, subject: &str, body: String) {
        self.send(customer_id, "customer", subject, body);
    }
}
