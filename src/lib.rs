//! Ride Dispatch - backend de despacho de viajes
//!
//! Core de dispatch: ciclo de vida del booking, matching de conductores
//! por distancia, handshake OTP y notificaciones push por conductor.

pub mod config;
pub mod controllers;
pub mod database;
pub mod dto;
pub mod middleware;
pub mod models;
pub mod repositories;
pub mod routes;
pub mod services;
pub mod state;
pub mod utils;
