use crate::tally::*;

/// Reads an identifier issued by the store.
///
/// Identifiers are usually strings, but documents exported from the store wrap
/// them as `{"$oid": "..."}`.
pub fn read_id(js: &JSValue) -> AppResult<String> {
    match js {
        JSValue::String(s) if !s.is_empty() => Ok(s.clone()),
        JSValue::Number(n) => Ok(n.to_string()),
        JSValue::Object(obj) => match obj.get("$oid") {
            Some(JSValue::String(s)) if !s.is_empty() => Ok(s.clone()),
            _ => DataShapeSnafu {
                message: format!("cannot read identifier from {}", js),
            }
            .fail(),
        },
        _ => DataShapeSnafu {
            message: format!("cannot read identifier from {}", js),
        }
        .fail(),
    }
}

/// Reads a vote count. Negative or fractional counts are refused.
pub fn read_count(js: &JSValue) -> Option<u64> {
    match js {
        JSValue::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0 && f.fract() == 0.0).map(|f| f as u64)),
        JSValue::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}
