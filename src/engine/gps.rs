// src/engine/gps.rs
//
// Formato de persistência da localização: `endereço|lat|lng`.
// O endereço pode conter `|`; latitude e longitude são sempre os dois últimos campos.

use crate::{
    common::error::AppError,
    models::store_assignment::{Coords, GpsInput, GpsLocation},
};

const FIELD: &str = "gpsLocation";
const SEPARATOR: char = '|';

pub fn encode(location: &GpsLocation) -> String {
    format!(
        "{}{sep}{}{sep}{}",
        location.address.trim(),
        location.coords.lat,
        location.coords.lng,
        sep = SEPARATOR
    )
}

pub fn decode(raw: &str) -> Result<GpsLocation, AppError> {
    let mut parts = raw.rsplitn(3, SEPARATOR);
    let (lng, lat, address) = match (parts.next(), parts.next(), parts.next()) {
        (Some(lng), Some(lat), Some(address)) => (lng, lat, address),
        _ => return Err(AppError::invalid_field(FIELD, "expected 'address|lat|lng'")),
    };

    let coords = Coords {
        lat: parse_coordinate(lat, "latitude")?,
        lng: parse_coordinate(lng, "longitude")?,
    };
    let location = GpsLocation { address: address.trim().to_string(), coords };
    check_range(&location)?;
    Ok(location)
}

/// Aceita as duas representações e devolve sempre a forma canônica.
pub fn normalize(input: GpsInput) -> Result<GpsLocation, AppError> {
    match input {
        GpsInput::Encoded(raw) => decode(&raw),
        GpsInput::Structured(location) => {
            check_range(&location)?;
            Ok(GpsLocation {
                address: location.address.trim().to_string(),
                coords: location.coords,
            })
        }
    }
}

fn parse_coordinate(value: &str, name: &str) -> Result<f64, AppError> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::invalid_field(FIELD, format!("{} is not a number", name)))
}

fn check_range(location: &GpsLocation) -> Result<(), AppError> {
    let Coords { lat, lng } = location.coords;
    if !lat.is_finite() || !(-90.0..=90.0).contains(&lat) {
        return Err(AppError::invalid_field(FIELD, "latitude out of range"));
    }
    if !lng.is_finite() || !(-180.0..=180.0).contains(&lng) {
        return Err(AppError::invalid_field(FIELD, "longitude out of range"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn structured(address: &str, lat: f64, lng: f64) -> GpsInput {
        GpsInput::Structured(GpsLocation {
            address: address.to_string(),
            coords: Coords { lat, lng },
        })
    }

    #[test]
    fn structured_input_is_persisted_in_pipe_format() {
        let location = normalize(structured("Av. Paulista, 1000", -23.5614, -46.6559)).unwrap();
        assert_eq!(encode(&location), "Av. Paulista, 1000|-23.5614|-46.6559");
    }

    #[test]
    fn both_representations_normalize_to_the_same_string() {
        let from_raw = normalize(GpsInput::Encoded("Rua A, 10|-3.1|-60.02".into())).unwrap();
        let from_struct = normalize(structured("Rua A, 10", -3.1, -60.02)).unwrap();
        assert_eq!(encode(&from_raw), encode(&from_struct));
    }

    #[test]
    fn address_may_contain_the_separator() {
        let location = decode("Bloco B | Loja 3|12.5|77.25").unwrap();
        assert_eq!(location.address, "Bloco B | Loja 3");
        assert_eq!(location.coords, Coords { lat: 12.5, lng: 77.25 });
    }

    #[test]
    fn rejects_malformed_strings() {
        assert!(decode("sem coordenadas").is_err());
        assert!(decode("Rua A|abc|10").is_err());
        assert!(decode("Rua A|95|10").is_err());
        assert!(decode("Rua A|10|-181").is_err());
    }

    #[test]
    fn untagged_input_accepts_string_and_object() {
        let raw: GpsInput = serde_json::from_str(r#""Loja|1.5|2.5""#).unwrap();
        let obj: GpsInput =
            serde_json::from_str(r#"{"address":"Loja","coords":{"lat":1.5,"lng":2.5}}"#).unwrap();

        assert!(matches!(raw, GpsInput::Encoded(_)));
        assert_eq!(normalize(raw).unwrap(), normalize(obj).unwrap());
    }
}
