//! Generación y verificación de OTP
//!
//! El OTP es un código numérico de ancho fijo generado al crear el booking.
//! Vive solo del lado del servidor y se compara en tiempo constante.

use rand::Rng;

/// Ancho fijo del código
pub const OTP_LENGTH: usize = 4;

/// Generar un OTP numérico aleatorio de ancho fijo (con ceros a la izquierda)
pub fn generate_otp() -> String {
    let mut rng = rand::thread_rng();
    (0..OTP_LENGTH)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}

/// Comparación en tiempo constante sobre el ancho fijo del código.
///
/// El largo del código es público; solo el contenido se compara con
/// acumulador XOR para no filtrar en cuántos dígitos difieren.
pub fn constant_time_eq(submitted: &str, stored: &str) -> bool {
    let a = submitted.as_bytes();
    let b = stored.as_bytes();
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}
