//! Controllers de la API
//!
//! Capa entre las rutas y los servicios: validación de requests y
//! conversión a DTOs de respuesta.

pub mod booking_controller;
pub mod driver_controller;
