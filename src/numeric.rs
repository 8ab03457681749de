use crate::error::{AnalysisError, AnalysisResult};

/// Parse a float token, accepting either `.` or `,` as the decimal separator.
/// The simulation logs come from locale-dependent formatters, so both forms
/// appear in the wild for the same runs.
pub fn parse_float(token: &str) -> AnalysisResult<f64> {
    let trimmed = token.trim();
    let canonical = trimmed.replace(',', ".");
    let value: f64 = canonical.parse().map_err(|_| AnalysisError::MalformedNumber {
        token: trimmed.to_string(),
    })?;

    // "NaN" and "inf" parse as floats but are not valid log values
    if !value.is_finite() {
        return Err(AnalysisError::MalformedNumber {
            token: trimmed.to_string(),
        });
    }

    Ok(value)
}

/// Parse an integer token (particle ids, step counters).
pub fn parse_int(token: &str) -> AnalysisResult<u32> {
    let trimmed = token.trim();
    trimmed.parse().map_err(|_| AnalysisError::MalformedNumber {
        token: trimmed.to_string(),
    })
}
