//! Máquina de estados del booking
//!
//! Dueña exclusiva del ciclo de vida:
//! CREATED → PENDING_MATCH → ASSIGNED → ACCEPTED → RIDE_STARTED → COMPLETED,
//! con REJECTED_BY_DRIVER como estado transitorio que vuelve a PENDING_MATCH
//! y CANCELLED alcanzable desde cualquier estado no terminal.
//!
//! Toda transición sobre el mismo booking se serializa con un lock por
//! booking id: carreras accept/reject/cancel concurrentes se resuelven en
//! orden de llegada y el segundo observa el estado posterior del primero.

use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use uuid::Uuid;

use crate::dto::booking_dto::{BookingResponse, CreateBookingRequest};
use crate::models::booking::{Booking, BookingStatus, CancelActor, GeoPoint};
use crate::models::driver::Driver;
use crate::repositories::{BookingStore, DriverDirectory};
use crate::services::fare_engine::FareEngine;
use crate::services::geo_matcher::{GeoMatcher, DEFAULT_MATCH_LIMIT, DEFAULT_MAX_RADIUS_KM};
use crate::services::messaging_service::MessagingService;
use crate::services::notification_hub::{DispatchEvent, NotificationHub};
use crate::utils::errors::{
    bad_request_error, invalid_transition, not_found_error, AppError, AppResult,
};
use crate::utils::otp::{constant_time_eq, generate_otp};
use crate::utils::validation::{validate_coordinates, validate_not_empty};

/// Parámetros de matching y asignación
#[derive(Debug, Clone)]
pub struct MatchingConfig {
    pub max_radius_km: f64,
    pub limit: usize,
    /// Ventana de ocupación del conductor al aceptar un viaje
    pub busy_window_minutes: i64,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_radius_km: DEFAULT_MAX_RADIUS_KM,
            limit: DEFAULT_MATCH_LIMIT,
            busy_window_minutes: 120,
        }
    }
}

pub struct BookingService {
    store: Arc<dyn BookingStore>,
    directory: Arc<dyn DriverDirectory>,
    hub: Arc<NotificationHub>,
    messaging: MessagingService,
    matching: MatchingConfig,
    locks: Arc<RwLock<HashMap<Uuid, Arc<Mutex<()>>>>>,
}

impl BookingService {
    pub fn new(
        store: Arc<dyn BookingStore>,
        directory: Arc<dyn DriverDirectory>,
        hub: Arc<NotificationHub>,
        messaging: MessagingService,
        matching: MatchingConfig,
    ) -> Self {
        Self {
            store,
            directory,
            hub,
            messaging,
            matching,
            locks: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Crear un booking. Con `selected_driver_id` se salta el matching si
    /// el conductor sigue elegible; sin selección se intenta asignar al
    /// mejor candidato y, si no hay ninguno, el booking queda visible en
    /// PENDING_MATCH sin fallar la solicitud.
    pub async fn create(&self, request: CreateBookingRequest) -> AppResult<Booking> {
        let now = Utc::now();
        let pickup = GeoPoint::new(request.pickup_lat, request.pickup_lng);
        let dropoff = GeoPoint::new(request.dropoff_lat, request.dropoff_lng);

        validate_coordinates(&pickup)
            .map_err(|_| bad_request_error("pickup coordinates out of range"))?;
        validate_coordinates(&dropoff)
            .map_err(|_| bad_request_error("dropoff coordinates out of range"))?;
        validate_not_empty(&request.pickup_address)
            .map_err(|_| bad_request_error("pickup_address is required"))?;
        validate_not_empty(&request.dropoff_address)
            .map_err(|_| bad_request_error("dropoff_address is required"))?;

        let estimated_distance_km =
            crate::services::geo_matcher::haversine_km(&pickup, &dropoff);
        let (base_fare, structure) = request.vehicle_type.published_rates();
        let estimated_fare =
            FareEngine::calculate_fare(estimated_distance_km, 0, &structure, base_fare)?;

        let mut booking = Booking {
            id: Uuid::new_v4(),
            customer_id: request.customer_id,
            driver_id: None,
            pickup_lat: request.pickup_lat,
            pickup_lng: request.pickup_lng,
            pickup_address: request.pickup_address,
            dropoff_lat: request.dropoff_lat,
            dropoff_lng: request.dropoff_lng,
            dropoff_address: request.dropoff_address,
            vehicle_type: request.vehicle_type,
            estimated_distance_km,
            estimated_fare,
            actual_distance_km: None,
            actual_fare: None,
            fare_breakdown: None,
            ride_otp: generate_otp(),
            otp_attempts: 0,
            status: BookingStatus::Created,
            rejection_count: 0,
            rejected_driver_ids: Vec::new(),
            cancelled_by: None,
            created_at: now,
            booking_time: request.booking_time.unwrap_or(now),
            start_time: None,
            end_time: None,
        };

        let assigned = if let Some(selected) = request.selected_driver_id {
            // Selección explícita: sin matcher, pero con chequeo de
            // elegibilidad al momento
            let driver = self
                .directory
                .get_driver(selected)
                .await?
                .ok_or_else(|| not_found_error("Driver", &selected.to_string()))?;

            if !driver.is_eligible_for(request.vehicle_type, now) {
                return Err(AppError::DriverUnavailable(format!(
                    "Driver '{}' is offline, busy or of the wrong vehicle type",
                    selected
                )));
            }

            booking.driver_id = Some(driver.id);
            booking.status = BookingStatus::Assigned;
            Some(driver)
        } else {
            booking.status = BookingStatus::PendingMatch;
            self.try_match(&mut booking, &HashSet::new(), now).await?
        };

        self.store.create(&booking).await?;

        match &assigned {
            Some(driver) => {
                tracing::info!("🚕 Booking {} asignado a driver {}", booking.id, driver.id);
                self.announce_assignment(&booking, driver).await;
            }
            None => {
                tracing::info!("🔎 Booking {} sin conductor elegible, queda buscando", booking.id);
            }
        }

        Ok(booking)
    }

    pub async fn get(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.fetch(booking_id).await
    }

    /// Aceptación por el conductor asignado. Doble accept del mismo
    /// conductor es idempotente; de otro conductor es Conflict.
    pub async fn accept(&self, booking_id: Uuid, driver_id: Uuid) -> AppResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch(booking_id).await?;

        match booking.status {
            BookingStatus::Accepted => {
                return if booking.driver_id == Some(driver_id) {
                    Ok(booking)
                } else {
                    Err(AppError::Conflict(
                        "Booking already accepted by another driver".to_string(),
                    ))
                };
            }
            BookingStatus::Assigned => {}
            current => return Err(invalid_transition(current, "accept")),
        }

        if booking.driver_id != Some(driver_id) {
            return Err(AppError::Forbidden(
                "Only the assigned driver can accept this booking".to_string(),
            ));
        }

        let busy_until = Utc::now() + Duration::minutes(self.matching.busy_window_minutes);
        self.directory
            .set_busy_until(driver_id, Some(busy_until))
            .await?;

        booking.status = BookingStatus::Accepted;
        if let Err(e) = self.store.update(&booking).await {
            // Transición fallida: liberar al conductor para no dejarlo
            // ocupado por un booking que no avanzó
            if let Err(rollback) = self.directory.set_busy_until(driver_id, None).await {
                tracing::error!("No se pudo liberar al driver {}: {}", driver_id, rollback);
            }
            return Err(e);
        }

        tracing::info!("✅ Booking {} aceptado por driver {}", booking.id, driver_id);
        self.messaging.notify_customer(
            booking.customer_id,
            "Conductor confirmado",
            format!("Tu conductor está en camino a {}", booking.pickup_address),
        );
        self.hub
            .publish(
                driver_id,
                DispatchEvent::new("booking_accepted", Some(BookingResponse::from(&booking))),
            )
            .await;

        Ok(booking)
    }

    /// Rechazo por el conductor asignado: lo agrega al conjunto de
    /// excluidos y re-ejecuta el matching en el acto. Garantiza que un
    /// conductor que rechazó nunca vuelve a recibir el mismo booking.
    pub async fn reject(&self, booking_id: Uuid, driver_id: Uuid) -> AppResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch(booking_id).await?;

        if booking.status != BookingStatus::Assigned {
            return Err(invalid_transition(booking.status, "reject"));
        }
        if booking.driver_id != Some(driver_id) {
            return Err(AppError::Forbidden(
                "Only the assigned driver can reject this booking".to_string(),
            ));
        }

        let mut tracker = booking.rejection_tracker();
        tracker.add(driver_id);
        let excluded = tracker.excluded_set();
        booking.rejected_driver_ids = tracker.into_ids();
        booking.rejection_count += 1;
        booking.driver_id = None;
        booking.status = BookingStatus::RejectedByDriver;

        let now = Utc::now();
        let reassigned = self.try_match(&mut booking, &excluded, now).await?;
        self.store.update(&booking).await?;

        tracing::info!(
            "↩️  Booking {} rechazado por driver {} (rechazos: {})",
            booking.id,
            driver_id,
            booking.rejection_count
        );

        match &reassigned {
            Some(driver) => {
                self.messaging.notify_customer(
                    booking.customer_id,
                    "Reasignando conductor",
                    "Tu conductor anterior no pudo tomar el viaje; ya asignamos otro".to_string(),
                );
                self.announce_assignment(&booking, driver).await;
            }
            None => {
                self.messaging.notify_customer(
                    booking.customer_id,
                    "Buscando conductor",
                    "Seguimos buscando un conductor para tu viaje".to_string(),
                );
            }
        }

        Ok(booking)
    }

    /// Re-ejecutar el matching para un booking en PENDING_MATCH. El disparo
    /// periódico es responsabilidad de un scheduler externo.
    pub async fn rematch(&self, booking_id: Uuid) -> AppResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch(booking_id).await?;

        if booking.status != BookingStatus::PendingMatch {
            return Err(invalid_transition(booking.status, "rematch"));
        }

        let excluded = booking.rejection_tracker().excluded_set();
        let assigned = self.try_match(&mut booking, &excluded, Utc::now()).await?;
        self.store.update(&booking).await?;

        if let Some(driver) = &assigned {
            tracing::info!("🚕 Booking {} reasignado a driver {}", booking.id, driver.id);
            self.announce_assignment(&booking, driver).await;
        }

        Ok(booking)
    }

    /// Verificar el OTP y arrancar el viaje. Comparación en tiempo
    /// constante; un código incorrecto no cambia el estado pero cuenta el
    /// intento para el throttling de la capa superior.
    pub async fn verify_otp_and_start(
        &self,
        booking_id: Uuid,
        submitted_otp: &str,
    ) -> AppResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch(booking_id).await?;

        if booking.status != BookingStatus::Accepted {
            return Err(invalid_transition(booking.status, "start"));
        }

        if !constant_time_eq(submitted_otp, &booking.ride_otp) {
            booking.otp_attempts += 1;
            self.store.update(&booking).await?;
            tracing::warn!(
                "OTP inválido para booking {} (intentos: {})",
                booking.id,
                booking.otp_attempts
            );
            return Err(AppError::InvalidOtp);
        }

        booking.status = BookingStatus::RideStarted;
        booking.start_time = Some(Utc::now());
        self.store.update(&booking).await?;

        tracing::info!("🛣️  Booking {} arrancó el viaje", booking.id);
        if let Some(driver_id) = booking.driver_id {
            self.hub
                .publish(
                    driver_id,
                    DispatchEvent::new("ride_started", Some(BookingResponse::from(&booking))),
                )
                .await;
        }

        Ok(booking)
    }

    /// Finalizar el viaje: tarifa real vía FareEngine con la estructura
    /// tarifaria del conductor, libera al conductor y cierra el booking.
    pub async fn complete(
        &self,
        booking_id: Uuid,
        actual_distance_km: f64,
        duration_seconds: i64,
        waiting_time_seconds: i64,
    ) -> AppResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch(booking_id).await?;

        if booking.status != BookingStatus::RideStarted {
            return Err(invalid_transition(booking.status, "complete"));
        }

        let driver_id = booking
            .driver_id
            .ok_or_else(|| AppError::Internal("started booking without driver".to_string()))?;
        let driver = self
            .directory
            .get_driver(driver_id)
            .await?
            .ok_or_else(|| not_found_error("Driver", &driver_id.to_string()))?;

        let breakdown = FareEngine::calculate_fare_with_breakdown(
            actual_distance_km,
            waiting_time_seconds,
            &driver.fare_structure(),
            driver.base_fare,
        )?;

        booking.actual_distance_km = Some(actual_distance_km);
        booking.actual_fare = Some(breakdown.total);
        booking.fare_breakdown = Some(sqlx::types::Json(breakdown));
        booking.end_time = Some(
            booking
                .start_time
                .map(|s| s + Duration::seconds(duration_seconds))
                .unwrap_or_else(Utc::now),
        );
        booking.status = BookingStatus::Completed;
        self.store.update(&booking).await?;

        // Liberar al conductor: fallos aquí no revierten el cierre
        if let Err(e) = self.directory.set_busy_until(driver_id, None).await {
            tracing::error!("No se pudo liberar al driver {}: {}", driver_id, e);
        }
        if let Err(e) = self.directory.record_completed_trip(driver_id).await {
            tracing::warn!("No se pudo registrar el viaje del driver {}: {}", driver_id, e);
        }

        tracing::info!(
            "🏁 Booking {} completado, tarifa final {}",
            booking.id,
            booking.actual_fare.unwrap_or_default()
        );
        self.hub
            .publish(
                driver_id,
                DispatchEvent::new("booking_completed", Some(BookingResponse::from(&booking))),
            )
            .await;
        self.messaging.notify_customer(
            booking.customer_id,
            "Viaje completado",
            format!(
                "Total del viaje: {}",
                FareEngine::display_amount(booking.actual_fare.unwrap_or_default())
            ),
        );

        self.release_lock(booking_id).await;
        Ok(booking)
    }

    /// Cancelar desde cualquier estado no terminal. Libera al conductor si
    /// había uno asignado. Efectiva incluso con un accept/reject en vuelo:
    /// el lock por booking serializa ambas operaciones.
    pub async fn cancel(&self, booking_id: Uuid, actor: CancelActor) -> AppResult<Booking> {
        let _guard = self.lock_booking(booking_id).await;
        let mut booking = self.fetch(booking_id).await?;

        if booking.status.is_terminal() {
            return Err(invalid_transition(booking.status, "cancel"));
        }

        let previous_driver = booking.driver_id;
        let driver_was_busy = matches!(
            booking.status,
            BookingStatus::Accepted | BookingStatus::RideStarted
        );

        booking.driver_id = None;
        booking.status = BookingStatus::Cancelled;
        booking.cancelled_by = Some(actor.as_str().to_string());
        self.store.update(&booking).await?;

        if let Some(driver_id) = previous_driver {
            if driver_was_busy {
                if let Err(e) = self.directory.set_busy_until(driver_id, None).await {
                    tracing::error!("No se pudo liberar al driver {}: {}", driver_id, e);
                }
            }
            self.hub
                .publish(
                    driver_id,
                    DispatchEvent::new("booking_cancelled", Some(BookingResponse::from(&booking))),
                )
                .await;
        }

        tracing::info!("🚫 Booking {} cancelado por {}", booking.id, actor.as_str());
        self.release_lock(booking_id).await;
        Ok(booking)
    }

    // ---- internos ----

    async fn fetch(&self, booking_id: Uuid) -> AppResult<Booking> {
        self.store
            .get_by_id(booking_id)
            .await?
            .ok_or_else(|| not_found_error("Booking", &booking_id.to_string()))
    }

    /// Decisión de matching + re-validación atómica: cada candidato se
    /// vuelve a leer del directorio antes de asignar, para no asignar a un
    /// conductor que se desconectó entre el snapshot y la escritura.
    async fn try_match(
        &self,
        booking: &mut Booking,
        excluded: &HashSet<Uuid>,
        now: DateTime<Utc>,
    ) -> AppResult<Option<Driver>> {
        let snapshot = self
            .directory
            .query_nearby(booking.pickup(), self.matching.max_radius_km)
            .await?;

        let candidates = GeoMatcher::find_nearest(
            &booking.pickup(),
            booking.vehicle_type,
            excluded,
            self.matching.limit,
            self.matching.max_radius_km,
            &snapshot,
            now,
        );

        for candidate in candidates {
            let Some(fresh) = self.directory.get_driver(candidate.driver.id).await? else {
                continue;
            };
            if fresh.is_eligible_for(booking.vehicle_type, now) {
                booking.driver_id = Some(fresh.id);
                booking.status = BookingStatus::Assigned;
                return Ok(Some(fresh));
            }
        }

        booking.driver_id = None;
        booking.status = BookingStatus::PendingMatch;
        Ok(None)
    }

    async fn announce_assignment(&self, booking: &Booking, driver: &Driver) {
        let delivered = self
            .hub
            .publish(
                driver.id,
                DispatchEvent::new("booking_assigned", Some(BookingResponse::from(booking))),
            )
            .await;
        if !delivered {
            tracing::info!(
                "Driver {} sin canal push para booking {}; queda el polling",
                driver.id,
                booking.id
            );
        }
        self.messaging.notify_driver(
            driver.id,
            "Nuevo viaje asignado",
            format!("Pickup en {}", booking.pickup_address),
        );
    }

    async fn lock_booking(&self, booking_id: Uuid) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.write().await;
            // Entradas con strong_count == 1 no tienen guard en vuelo:
            // son bookings abandonados (p.ej. en PENDING_MATCH) y se
            // barren acá para que el mapa no crezca sin límite
            locks.retain(|_, lock| Arc::strong_count(lock) > 1);
            locks
                .entry(booking_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }

    /// Los bookings terminales no reciben más transiciones; su entrada en
    /// el mapa de locks se limpia para no crecer sin límite
    async fn release_lock(&self, booking_id: Uuid) {
        self.locks.write().await.remove(&booking_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dto::booking_dto::CreateBookingRequest;
    use crate::models::driver::VehicleType;
    use crate::repositories::memory::{InMemoryBookingStore, InMemoryDriverDirectory};

    fn service() -> BookingService {
        BookingService::new(
            Arc::new(InMemoryBookingStore::new()),
            Arc::new(InMemoryDriverDirectory::new()),
            Arc::new(NotificationHub::new()),
            MessagingService::disabled(),
            MatchingConfig::default(),
        )
    }

    fn request() -> CreateBookingRequest {
        CreateBookingRequest {
            customer_id: Uuid::new_v4(),
            pickup_lat: -34.6037,
            pickup_lng: -58.3816,
            pickup_address: "Av. 9 de Julio 1000".to_string(),
            dropoff_lat: -34.6158,
            dropoff_lng: -58.4333,
            dropoff_address: "Av. Rivadavia 5000".to_string(),
            vehicle_type: VehicleType::Sedan,
            selected_driver_id: None,
            booking_time: None,
        }
    }

    #[tokio::test]
    async fn abandoned_lock_entries_are_swept_on_next_acquisition() {
        let service = service();
        // Sin conductores registrados ambos quedan en PENDING_MATCH
        let first = service.create(request()).await.unwrap();
        let second = service.create(request()).await.unwrap();

        service.rematch(first.id).await.unwrap();
        assert_eq!(service.locks.read().await.len(), 1);

        // La siguiente adquisición barre la entrada huérfana del primero
        service.rematch(second.id).await.unwrap();
        let locks = service.locks.read().await;
        assert_eq!(locks.len(), 1);
        assert!(locks.contains_key(&second.id));
    }

    #[tokio::test]
    async fn terminal_transition_releases_its_lock() {
        let service = service();
        let booking = service.create(request()).await.unwrap();

        service.cancel(booking.id, CancelActor::System).await.unwrap();
        assert!(service.locks.read().await.is_empty());
    }
}
