//! Revenue payload decoding shared by the REST client and the export loader
//!
//! The backend sends either a bare array of daily rows or the same array
//! wrapped in a `{ "data": [...] }` envelope.

use crate::types::{ChargestatError, DailyMetric, Result};
use serde::Deserialize;

#[derive(Deserialize)]
struct Envelope {
    data: Vec<DailyMetric>,
}

/// Decode a revenue payload in place (simd-json mutates the buffer)
pub fn parse_metrics(bytes: &mut [u8]) -> Result<Vec<DailyMetric>> {
    let first = bytes.iter().find(|b| !b.is_ascii_whitespace()).copied();

    match first {
        Some(b'[') => {
            simd_json::from_slice(bytes).map_err(|e| ChargestatError::Parse(e.to_string()))
        }
        Some(b'{') => simd_json::from_slice::<Envelope>(bytes)
            .map(|envelope| envelope.data)
            .map_err(|e| ChargestatError::Parse(e.to_string())),
        Some(_) => Err(ChargestatError::Parse(
            "expected a JSON array or a {\"data\": [...]} object".into(),
        )),
        None => Err(ChargestatError::Parse("empty payload".into())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(json: &str) -> Result<Vec<DailyMetric>> {
        let mut bytes = json.as_bytes().to_vec();
        parse_metrics(&mut bytes)
    }

    #[test]
    fn test_bare_array() {
        let metrics = parse(
            r#"[{"date":"01/01/2024","revenue":100,"sessions":1},
                {"date":"02/01/2024","revenue":200,"sessions":2}]"#,
        )
        .unwrap();

        assert_eq!(metrics.len(), 2);
        assert_eq!(metrics[1].revenue, 200);
    }

    #[test]
    fn test_envelope() {
        let metrics =
            parse(r#"  {"data":[{"date":"01/01/2024","revenue":100,"sessions":1}]}"#).unwrap();
        assert_eq!(metrics.len(), 1);
    }

    #[test]
    fn test_empty_array() {
        assert!(parse("[]").unwrap().is_empty());
    }

    #[test]
    fn test_malformed_date_fails_whole_payload() {
        let err = parse(
            r#"[{"date":"01/01/2024","revenue":1,"sessions":1},
                {"date":"2024-01-02","revenue":1,"sessions":1}]"#,
        )
        .unwrap_err();

        assert!(matches!(err, ChargestatError::Parse(_)));
    }

    #[test]
    fn test_rejects_other_shapes() {
        assert!(parse("").is_err());
        assert!(parse("   ").is_err());
        assert!(parse("42").is_err());
        assert!(parse(r#"{"rows":[]}"#).is_err());
    }
}
