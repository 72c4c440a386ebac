use crate::record::{Record, Scalar};
use crate::ValidationError;

const PRICE_FLOAT_FIELDS: [&str; 4] = ["open", "close", "high", "low"];

pub(crate) fn ensure_symbol(symbol: &str) -> Result<&str, ValidationError> {
    let symbol = symbol.trim();
    if symbol.is_empty() {
        return Err(ValidationError::EmptySymbol);
    }
    Ok(symbol)
}

/// Coerces a batch of price records into the canonical OHLCV shape.
///
/// Each output record holds exactly `time` (string), `open`/`close`/`high`/`low`
/// (float) and `volume` (integer). Other fields are dropped. The first record
/// that cannot be coerced fails the whole batch.
pub fn normalize_prices(batch: Vec<Record>) -> Result<Vec<Record>, ValidationError> {
    batch
        .iter()
        .enumerate()
        .map(|(index, record)| normalize_price(index, record))
        .collect()
}

fn normalize_price(index: usize, record: &Record) -> Result<Record, ValidationError> {
    let mut normalized = Record::new();
    normalized.insert("time", coerce_text(index, "time", required(index, record, "time")?)?);
    for field in PRICE_FLOAT_FIELDS {
        let value = coerce_float(index, field, required(index, record, field)?)?;
        normalized.insert(field, value);
    }
    normalized.insert(
        "volume",
        coerce_integer(index, "volume", required(index, record, "volume")?)?,
    );
    Ok(normalized)
}

fn required<'a>(
    index: usize,
    record: &'a Record,
    field: &'static str,
) -> Result<&'a Scalar, ValidationError> {
    record
        .get_present(field)
        .ok_or(ValidationError::MissingField { index, field })
}

fn coerce_text(
    index: usize,
    field: &'static str,
    value: &Scalar,
) -> Result<String, ValidationError> {
    match value {
        Scalar::String(text) if !text.trim().is_empty() => Ok(text.clone()),
        Scalar::Integer(_) | Scalar::Number(_) => Ok(value.to_string()),
        other => Err(invalid(index, field, "string", other)),
    }
}

fn coerce_float(
    index: usize,
    field: &'static str,
    value: &Scalar,
) -> Result<f64, ValidationError> {
    let parsed = match value {
        Scalar::Number(number) => *number,
        Scalar::Integer(integer) => *integer as f64,
        Scalar::String(text) => text
            .trim()
            .parse::<f64>()
            .map_err(|_| invalid(index, field, "float", value))?,
        other => return Err(invalid(index, field, "float", other)),
    };

    if !parsed.is_finite() {
        return Err(ValidationError::NonFiniteValue { index, field });
    }
    Ok(parsed)
}

fn coerce_integer(
    index: usize,
    field: &'static str,
    value: &Scalar,
) -> Result<i64, ValidationError> {
    match value {
        Scalar::Integer(integer) => Ok(*integer),
        Scalar::Number(number) if !number.is_finite() => {
            Err(ValidationError::NonFiniteValue { index, field })
        }
        // Fractional volumes are truncated toward zero.
        Scalar::Number(number) if number.abs() < i64::MAX as f64 => Ok(number.trunc() as i64),
        Scalar::String(text) => text
            .trim()
            .parse::<i64>()
            .map_err(|_| invalid(index, field, "integer", value)),
        other => Err(invalid(index, field, "integer", other)),
    }
}

fn invalid(
    index: usize,
    field: &'static str,
    expected: &'static str,
    found: &Scalar,
) -> ValidationError {
    ValidationError::InvalidField {
        index,
        field,
        expected,
        found: found.to_string(),
    }
}
