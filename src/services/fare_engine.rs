//! FareEngine: cálculo de tarifas
//!
//! tarifa_distancia = km × tarifa_por_km
//! minutos_espera   = ceil(segundos / 60)
//! cargo_espera     = minutos_espera × cargo_por_minuto
//! total            = base + distancia + espera, con piso en tarifa mínima
//!
//! Los montos internos conservan precisión completa (Decimal); el redondeo
//! a 2 decimales es un asunto de presentación.

use rust_decimal::Decimal;

use crate::models::booking::FareBreakdown;
use crate::models::driver::FareStructure;
use crate::utils::errors::AppError;

pub struct FareEngine;

impl FareEngine {
    /// Calcular la tarifa final como escalar
    pub fn calculate_fare(
        distance_km: f64,
        duration_seconds: i64,
        fare_structure: &FareStructure,
        base_fare: Decimal,
    ) -> Result<Decimal, AppError> {
        Self::calculate_fare_with_breakdown(distance_km, duration_seconds, fare_structure, base_fare)
            .map(|breakdown| breakdown.total)
    }

    /// Misma aritmética, resultado estructurado con cada término intermedio
    /// para auditoría y display
    pub fn calculate_fare_with_breakdown(
        distance_km: f64,
        duration_seconds: i64,
        fare_structure: &FareStructure,
        base_fare: Decimal,
    ) -> Result<FareBreakdown, AppError> {
        if !distance_km.is_finite() || distance_km < 0.0 {
            return Err(AppError::BadRequest(
                "distance_km must be non-negative".to_string(),
            ));
        }
        if duration_seconds < 0 {
            return Err(AppError::BadRequest(
                "duration_seconds must be non-negative".to_string(),
            ));
        }
        if fare_structure.minimum_fare < Decimal::ZERO {
            return Err(AppError::BadRequest(
                "minimum_fare must be non-negative".to_string(),
            ));
        }
        if fare_structure.per_km_rate < Decimal::ZERO {
            return Err(AppError::BadRequest(
                "per_km_rate must be non-negative".to_string(),
            ));
        }

        let distance = Decimal::from_f64_retain(distance_km)
            .ok_or_else(|| AppError::BadRequest("invalid distance value".to_string()))?;

        let distance_fare = distance * fare_structure.per_km_rate;
        let waiting_minutes = (duration_seconds + 59) / 60;
        let waiting_charge =
            Decimal::from(waiting_minutes) * fare_structure.waiting_charge_per_minute;

        let computed_total = base_fare + distance_fare + waiting_charge;
        let total = computed_total.max(fare_structure.minimum_fare);

        Ok(FareBreakdown {
            base_fare,
            distance_km,
            distance_fare,
            waiting_minutes,
            waiting_charge,
            computed_total,
            minimum_fare: fare_structure.minimum_fare,
            total,
        })
    }

    /// Redondeo de presentación a 2 decimales
    pub fn display_amount(amount: Decimal) -> Decimal {
        amount.round_dp(2)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structure(per_km: i64, per_minute: i64, minimum: i64) -> FareStructure {
        FareStructure {
            per_km_rate: Decimal::new(per_km, 0),
            waiting_charge_per_minute: Decimal::new(per_minute, 0),
            minimum_fare: Decimal::new(minimum, 0),
        }
    }

    #[test]
    fn minimum_fare_floor_applies() {
        let fare =
            FareEngine::calculate_fare(0.0, 0, &structure(10, 2, 50), Decimal::ZERO).unwrap();
        assert_eq!(fare, Decimal::new(50, 0));
    }

    #[test]
    fn full_formula_matches_expected_total() {
        // 20 base + 10 km × 10 + 10 min × 2 = 140
        let fare =
            FareEngine::calculate_fare(10.0, 600, &structure(10, 2, 50), Decimal::new(20, 0))
                .unwrap();
        assert_eq!(fare, Decimal::new(140, 0));
    }

    #[test]
    fn waiting_minutes_round_up() {
        let breakdown = FareEngine::calculate_fare_with_breakdown(
            0.0,
            61,
            &structure(10, 2, 0),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(breakdown.waiting_minutes, 2);
        assert_eq!(breakdown.waiting_charge, Decimal::new(4, 0));
    }

    #[test]
    fn breakdown_terms_sum_to_computed_total() {
        let breakdown = FareEngine::calculate_fare_with_breakdown(
            4.5,
            300,
            &structure(12, 3, 30),
            Decimal::new(25, 0),
        )
        .unwrap();

        assert_eq!(
            breakdown.computed_total,
            breakdown.base_fare + breakdown.distance_fare + breakdown.waiting_charge
        );
        assert!(breakdown.total >= breakdown.minimum_fare);
    }

    #[test]
    fn rejects_negative_inputs() {
        assert!(FareEngine::calculate_fare(-1.0, 0, &structure(10, 2, 50), Decimal::ZERO).is_err());
        assert!(FareEngine::calculate_fare(1.0, -5, &structure(10, 2, 50), Decimal::ZERO).is_err());
        assert!(FareEngine::calculate_fare(1.0, 0, &structure(-10, 2, 50), Decimal::ZERO).is_err());
        assert!(FareEngine::calculate_fare(1.0, 0, &structure(10, 2, -50), Decimal::ZERO).is_err());
    }

    #[test]
    fn display_rounds_to_two_decimals() {
        let fare = FareEngine::calculate_fare(
            3.333,
            0,
            &structure(10, 2, 0),
            Decimal::ZERO,
        )
        .unwrap();
        assert_eq!(FareEngine::display_amount(fare), Decimal::new(3333, 2));
    }
}
