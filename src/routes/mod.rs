pub mod booking_routes;
pub mod driver_routes;
pub mod notification_routes;
