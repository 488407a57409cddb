//! Utilidades del sistema
//!
//! Este módulo contiene utilidades para manejo de errores, validación
//! y generación de OTP.

pub mod errors;
pub mod otp;
pub mod validation;
