//! Utilidades de validación
//!
//! Este módulo contiene funciones helper para validación de datos
//! geográficos y de entrada.

use validator::ValidationError;

use crate::models::booking::GeoPoint;

/// Validar que una latitud esté en el rango válido
pub fn validate_latitude(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(-90.0..=90.0).contains(&value) {
        let mut error = ValidationError::new("latitude");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar que una longitud esté en el rango válido
pub fn validate_longitude(value: f64) -> Result<(), ValidationError> {
    if !value.is_finite() || !(-180.0..=180.0).contains(&value) {
        let mut error = ValidationError::new("longitude");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Validar un par de coordenadas completo
pub fn validate_coordinates(point: &GeoPoint) -> Result<(), ValidationError> {
    validate_latitude(point.lat)?;
    validate_longitude(point.lng)?;
    Ok(())
}

/// Validar que un string no esté vacío
pub fn validate_not_empty(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut error = ValidationError::new("not_empty");
        error.add_param("value".into(), &value.to_string());
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_coordinates() {
        assert!(validate_latitude(91.0).is_err());
        assert!(validate_latitude(-90.5).is_err());
        assert!(validate_longitude(180.1).is_err());
        assert!(validate_latitude(f64::NAN).is_err());

        assert!(validate_coordinates(&GeoPoint::new(19.4326, -99.1332)).is_ok());
        assert!(validate_coordinates(&GeoPoint::new(19.4326, -200.0)).is_err());
    }

    #[test]
    fn rejects_empty_strings() {
        assert!(validate_not_empty("   ").is_err());
        assert!(validate_not_empty("Av. Reforma 222").is_ok());
    }
}
