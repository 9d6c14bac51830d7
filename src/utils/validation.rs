//! Validaciones comunes
//!
//! Helpers de validación reutilizados por los DTOs y controladores.
//! Todo rechazo ocurre en el borde, antes de tocar la base de datos.

use lazy_static::lazy_static;
use regex::Regex;
use validator::ValidationError;

lazy_static! {
    static ref REFERENCE_RE: Regex = Regex::new(r"^[A-Z0-9][A-Z0-9\-]{2,29}$").unwrap();
    static ref REGISTRATION_RE: Regex = Regex::new(r"^[A-Z]{2}[0-9]{2}[A-Z0-9]{1,7}$").unwrap();
}

/// Referencia de envío: mayúsculas, dígitos y guiones, 3-30 caracteres
pub fn validate_reference_number(value: &str) -> Result<(), ValidationError> {
    if !REFERENCE_RE.is_match(value) {
        let mut error = ValidationError::new("reference_number");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

/// Matrícula estilo indio (ej: MH12AB1234)
pub fn validate_registration_number(value: &str) -> Result<(), ValidationError> {
    if !REGISTRATION_RE.is_match(value) {
        let mut error = ValidationError::new("registration_number");
        error.add_param("value".into(), &value);
        return Err(error);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_number() {
        assert!(validate_reference_number("SHP-2024-0001").is_ok());
        assert!(validate_reference_number("AB").is_err());
        assert!(validate_reference_number("shp-min").is_err());
    }

    #[test]
    fn test_registration_number() {
        assert!(validate_registration_number("MH12AB1234").is_ok());
        assert!(validate_registration_number("12MHAB1234").is_err());
    }

}
