use crate::errors::{Error, Result};
use crate::model::{Reading, NO_TEMPERATURE};

/// Parses a `"<timestamp>,<temperature>"` payload into a [`Reading`].
///
/// The sentinel [`NO_TEMPERATURE`] yields a reading without a temperature.
/// Fields past the second are ignored.
pub fn parse_reading(payload: &[u8]) -> Result<Reading> {
    let text = std::str::from_utf8(payload)
        .map_err(|e| Error::MalformedReading(format!("payload is not UTF-8: {}", e)))?;

    let mut fields = text.split(',');

    let timestamp = fields.next().unwrap_or_default().trim();
    if timestamp.is_empty() {
        return Err(Error::MalformedReading(format!(
            "missing timestamp in {:?}",
            text
        )));
    }

    let raw_temperature = fields
        .next()
        .ok_or_else(|| Error::MalformedReading(format!("missing temperature in {:?}", text)))?
        .trim();

    let temperature = if raw_temperature == NO_TEMPERATURE {
        None
    } else {
        Some(parse_temperature(raw_temperature)?)
    };

    Ok(Reading {
        timestamp: timestamp.to_string(),
        temperature,
    })
}

fn parse_temperature(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .parse()
        .map_err(|e| Error::MalformedReading(format!("temperature {:?}: {}", raw, e)))?;

    // NaN would make every threshold comparison false
    if !value.is_finite() {
        return Err(Error::MalformedReading(format!(
            "temperature {:?} is not a finite number",
            raw
        )));
    }

    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_reading() {
        let reading = parse_reading(b"12/23/18 13:00:00,221.5").unwrap();
        assert_eq!(reading.timestamp, "12/23/18 13:00:00");
        assert_eq!(reading.temperature, Some(221.5));
    }

    #[test]
    fn test_sentinel_reading() {
        let reading = parse_reading(b"12:00:00,No Temperature").unwrap();
        assert_eq!(reading.timestamp, "12:00:00");
        assert_eq!(reading.temperature, None);
    }

    #[test]
    fn test_surrounding_whitespace() {
        let reading = parse_reading(b"12:00:00, 70.25 ").unwrap();
        assert_eq!(reading.temperature, Some(70.25));
    }

    #[test]
    fn test_extra_fields_ignored() {
        let reading = parse_reading(b"12:00:00,180,unexpected").unwrap();
        assert_eq!(reading.temperature, Some(180.0));
    }

    #[test]
    fn test_non_numeric_temperature() {
        let err = parse_reading(b"12:00:00,abc").unwrap_err();
        assert!(matches!(err, Error::MalformedReading(_)));
    }

    #[test]
    fn test_missing_temperature() {
        assert!(matches!(
            parse_reading(b"12:00:00"),
            Err(Error::MalformedReading(_))
        ));
        assert!(matches!(
            parse_reading(b"12:00:00,"),
            Err(Error::MalformedReading(_))
        ));
    }

    #[test]
    fn test_missing_timestamp() {
        assert!(matches!(
            parse_reading(b",150.0"),
            Err(Error::MalformedReading(_))
        ));
        assert!(matches!(parse_reading(b""), Err(Error::MalformedReading(_))));
    }

    #[test]
    fn test_non_finite_temperature() {
        assert!(parse_reading(b"12:00:00,NaN").is_err());
        assert!(parse_reading(b"12:00:00,inf").is_err());
    }

    #[test]
    fn test_invalid_utf8() {
        assert!(matches!(
            parse_reading(&[0xff, 0xfe, b',', b'1']),
            Err(Error::MalformedReading(_))
        ));
    }
}
