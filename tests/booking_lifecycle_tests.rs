//! Tests de ciclo de vida del booking sobre los stores en memoria

use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use ride_dispatch::dto::booking_dto::CreateBookingRequest;
use ride_dispatch::models::booking::{BookingStatus, CancelActor};
use ride_dispatch::models::driver::{Driver, VehicleType};
use ride_dispatch::repositories::memory::{InMemoryBookingStore, InMemoryDriverDirectory};
use ride_dispatch::repositories::DriverDirectory;
use ride_dispatch::services::booking_service::{BookingService, MatchingConfig};
use ride_dispatch::services::messaging_service::MessagingService;
use ride_dispatch::services::notification_hub::NotificationHub;
use ride_dispatch::utils::errors::AppError;

fn make_service(directory: Arc<InMemoryDriverDirectory>) -> BookingService {
    BookingService::new(
        Arc::new(InMemoryBookingStore::new()),
        directory,
        Arc::new(NotificationHub::new()),
        MessagingService::disabled(),
        MatchingConfig::default(),
    )
}

fn sedan_driver(lat: f64, lng: f64) -> Driver {
    Driver {
        id: Uuid::new_v4(),
        name: "Driver".to_string(),
        phone: "+5491100000000".to_string(),
        lat,
        lng,
        is_online: true,
        busy_until: None,
        vehicle_type: VehicleType::Sedan,
        base_fare: Decimal::from(20),
        per_km_rate: Decimal::from(10),
        waiting_charge_per_minute: Decimal::from(2),
        minimum_fare: Decimal::from(50),
        rating: 4.5,
        completed_trips: 100,
        updated_at: Utc::now(),
    }
}

fn sedan_request() -> CreateBookingRequest {
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
async fn create_with_selected_driver_skips_matching() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory);

    let mut request = sedan_request();
    request.selected_driver_id = Some(driver.id);

    let booking = service.create(request).await.unwrap();
    assert_eq!(booking.status, BookingStatus::Assigned);
    assert_eq!(booking.driver_id, Some(driver.id));
    assert_eq!(booking.ride_otp.len(), 4);
    assert!(booking.estimated_fare >= Decimal::from(50));
}

#[tokio::test]
async fn create_with_offline_selected_driver_fails() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let mut offline = sedan_driver(-34.60, -58.38);
    offline.is_online = false;
    let driver = directory.register(offline).await.unwrap();
    let service = make_service(directory);

    let mut request = sedan_request();
    request.selected_driver_id = Some(driver.id);

    let err = service.create(request).await.unwrap_err();
    assert!(matches!(err, AppError::DriverUnavailable(_)));
}

#[tokio::test]
async fn create_without_candidates_stays_pending() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    assert_eq!(booking.status, BookingStatus::PendingMatch);
    assert_eq!(booking.driver_id, None);

    // El booking quedó persistido y consultable
    let fetched = service.get(booking.id).await.unwrap();
    assert_eq!(fetched.status, BookingStatus::PendingMatch);
}

#[tokio::test]
async fn create_rejects_out_of_range_coordinates() {
    let service = make_service(Arc::new(InMemoryDriverDirectory::new()));
    let mut request = sedan_request();
    request.pickup_lat = 95.0;

    let err = service.create(request).await.unwrap_err();
    assert!(matches!(err, AppError::BadRequest(_)));
}

#[tokio::test]
async fn accept_is_idempotent_for_assigned_driver() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory.clone());

    let booking = service.create(sedan_request()).await.unwrap();
    assert_eq!(booking.driver_id, Some(driver.id));

    let accepted = service.accept(booking.id, driver.id).await.unwrap();
    assert_eq!(accepted.status, BookingStatus::Accepted);

    // Segundo accept del mismo conductor: no-op
    let again = service.accept(booking.id, driver.id).await.unwrap();
    assert_eq!(again.status, BookingStatus::Accepted);

    // El conductor queda ocupado
    let busy = directory.get_driver(driver.id).await.unwrap().unwrap();
    assert!(busy.busy_until.is_some());
}

#[tokio::test]
async fn accept_by_other_driver_is_rejected() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    assert_eq!(booking.driver_id, Some(driver.id));

    let intruder = Uuid::new_v4();
    let err = service.accept(booking.id, intruder).await.unwrap_err();
    assert!(matches!(err, AppError::Forbidden(_)));

    service.accept(booking.id, driver.id).await.unwrap();
    let err = service.accept(booking.id, intruder).await.unwrap_err();
    assert!(matches!(err, AppError::Conflict(_)));
}

#[tokio::test]
async fn rejection_chain_reaches_third_driver() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    // Tres conductores a distancias crecientes del pickup
    let first = directory.register(sedan_driver(-34.6040, -58.3816)).await.unwrap();
    let second = directory.register(sedan_driver(-34.6100, -58.3816)).await.unwrap();
    let third = directory.register(sedan_driver(-34.6200, -58.3816)).await.unwrap();
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    assert_eq!(booking.driver_id, Some(first.id));

    let booking = service.reject(booking.id, first.id).await.unwrap();
    assert_eq!(booking.driver_id, Some(second.id));
    assert_eq!(booking.status, BookingStatus::Assigned);
    assert_eq!(booking.rejection_count, 1);

    let booking = service.reject(booking.id, second.id).await.unwrap();
    assert_eq!(booking.driver_id, Some(third.id));
    assert_eq!(booking.rejection_count, 2);
    assert!(booking.rejected_driver_ids.contains(&first.id));
    assert!(booking.rejected_driver_ids.contains(&second.id));
}

#[tokio::test]
async fn rejected_driver_is_never_offered_again() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let only = directory.register(sedan_driver(-34.6040, -58.3816)).await.unwrap();
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    assert_eq!(booking.driver_id, Some(only.id));

    // Único conductor rechaza: no hay reemplazo, queda buscando
    let booking = service.reject(booking.id, only.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::PendingMatch);
    assert_eq!(booking.driver_id, None);

    // Reintento explícito tampoco lo vuelve a ofrecer
    let booking = service.rematch(booking.id).await.unwrap();
    assert_eq!(booking.status, BookingStatus::PendingMatch);
    assert_eq!(booking.driver_id, None);
}

#[tokio::test]
async fn reject_from_non_assigned_state_fails() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    service.accept(booking.id, driver.id).await.unwrap();

    let err = service.reject(booking.id, driver.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}

#[tokio::test]
async fn wrong_otp_counts_attempt_without_changing_state() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    let booking = service.accept(booking.id, driver.id).await.unwrap();

    let wrong = if booking.ride_otp == "0000" { "9999" } else { "0000" };
    let err = service.verify_otp_and_start(booking.id, wrong).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidOtp));

    let after = service.get(booking.id).await.unwrap();
    assert_eq!(after.status, BookingStatus::Accepted);
    assert_eq!(after.otp_attempts, 1);

    // El código correcto arranca el viaje exactamente una vez
    let otp = after.ride_otp.clone();
    let started = service.verify_otp_and_start(booking.id, &otp).await.unwrap();
    assert_eq!(started.status, BookingStatus::RideStarted);
    assert!(started.start_time.is_some());

    let err = service.verify_otp_and_start(booking.id, &otp).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}

#[tokio::test]
async fn complete_computes_fare_and_frees_driver() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory.clone());

    let booking = service.create(sedan_request()).await.unwrap();
    let booking = service.accept(booking.id, driver.id).await.unwrap();
    let otp = booking.ride_otp.clone();
    service.verify_otp_and_start(booking.id, &otp).await.unwrap();

    // base 20 + 10 km * 10 + 10 min de espera * 2 = 140
    let done = service.complete(booking.id, 10.0, 1800, 600).await.unwrap();
    assert_eq!(done.status, BookingStatus::Completed);
    assert_eq!(done.actual_fare, Some(Decimal::from(140)));
    assert_eq!(done.actual_distance_km, Some(10.0));
    assert!(done.end_time.is_some());

    let breakdown = done.fare_breakdown.as_ref().unwrap();
    assert_eq!(breakdown.waiting_minutes, 10);
    assert_eq!(breakdown.total, Decimal::from(140));

    let freed = directory.get_driver(driver.id).await.unwrap().unwrap();
    assert_eq!(freed.busy_until, None);
    assert_eq!(freed.completed_trips, 101);
}

#[tokio::test]
async fn short_trip_charges_minimum_fare() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    let booking = service.accept(booking.id, driver.id).await.unwrap();
    let otp = booking.ride_otp.clone();
    service.verify_otp_and_start(booking.id, &otp).await.unwrap();

    // base 20 + 1 km * 10 = 30, por debajo del piso de 50
    let done = service.complete(booking.id, 1.0, 300, 0).await.unwrap();
    assert_eq!(done.actual_fare, Some(Decimal::from(50)));
}

#[tokio::test]
async fn cancel_frees_driver_and_records_actor() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory.clone());

    let booking = service.create(sedan_request()).await.unwrap();
    service.accept(booking.id, driver.id).await.unwrap();

    let cancelled = service.cancel(booking.id, CancelActor::Customer).await.unwrap();
    assert_eq!(cancelled.status, BookingStatus::Cancelled);
    assert_eq!(cancelled.driver_id, None);
    assert_eq!(cancelled.cancelled_by.as_deref(), Some("customer"));

    let freed = directory.get_driver(driver.id).await.unwrap().unwrap();
    assert_eq!(freed.busy_until, None);
}

#[tokio::test]
async fn cancel_on_terminal_booking_fails() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    service.cancel(booking.id, CancelActor::System).await.unwrap();

    let err = service.cancel(booking.id, CancelActor::Customer).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_accept_and_reject_admit_single_winner() {
    // Carrera accept/reject sobre el mismo booking, repetida para cubrir
    // ambos órdenes de adquisición del lock
    for _ in 0..50 {
        let directory = Arc::new(InMemoryDriverDirectory::new());
        let first = directory.register(sedan_driver(-34.6040, -58.3816)).await.unwrap();
        let second = directory.register(sedan_driver(-34.6100, -58.3816)).await.unwrap();
        let service = Arc::new(make_service(directory));

        let booking = service.create(sedan_request()).await.unwrap();
        assert_eq!(booking.driver_id, Some(first.id));

        let accept = {
            let service = service.clone();
            let (id, driver) = (booking.id, first.id);
            tokio::spawn(async move { service.accept(id, driver).await })
        };
        let reject = {
            let service = service.clone();
            let (id, driver) = (booking.id, first.id);
            tokio::spawn(async move { service.reject(id, driver).await })
        };

        let accepted = accept.await.unwrap();
        let rejected = reject.await.unwrap();

        // Gana exactamente una transición; la otra observa el estado nuevo
        assert_ne!(accepted.is_ok(), rejected.is_ok());

        let after = service.get(booking.id).await.unwrap();
        if accepted.is_ok() {
            assert_eq!(after.status, BookingStatus::Accepted);
            assert_eq!(after.driver_id, Some(first.id));
        } else {
            // El rechazo ganó: el booking pasó al segundo conductor y el
            // que rechazó nunca vuelve a ser candidato
            assert_eq!(after.status, BookingStatus::Assigned);
            assert_eq!(after.driver_id, Some(second.id));
            assert!(after.rejected_driver_ids.contains(&first.id));
        }
    }
}

#[tokio::test]
async fn accept_after_cancel_observes_terminal_state() {
    let directory = Arc::new(InMemoryDriverDirectory::new());
    let driver = directory.register(sedan_driver(-34.60, -58.38)).await.unwrap();
    let service = make_service(directory);

    let booking = service.create(sedan_request()).await.unwrap();
    service.cancel(booking.id, CancelActor::Customer).await.unwrap();

    // La cancelación ganó la carrera: el accept tardío ve el estado terminal
    let err = service.accept(booking.id, driver.id).await.unwrap_err();
    assert!(matches!(err, AppError::InvalidStateTransition { .. }));
}
