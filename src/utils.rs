use serde_json::Value;

/// Parses an operator-typed amount.
///
/// The longest leading numeric prefix is used, so `"12abc"` reads as 12. Empty,
/// non-numeric and non-finite input all read as 0: a blank cell means "no sale yet".
pub fn parse_amount(input: &str) -> f64 {
    numeric_prefix(input.trim_start())
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .unwrap_or(0.0)
}

/// Returns `[sign] digits [. digits] [e [sign] digits]` from the start of `s`.
fn numeric_prefix(s: &str) -> &str {
    let bytes = s.as_bytes();
    let len = bytes.len();
    let scan_digits = |mut pos: usize| {
        while pos < len && bytes[pos].is_ascii_digit() {
            pos += 1;
        }
        pos
    };

    let mut end = 0;
    if matches!(bytes.first(), Some(b'+') | Some(b'-')) {
        end = 1;
    }

    let int_end = scan_digits(end);
    let mut mantissa_digits = int_end - end;
    end = int_end;

    if end < len && bytes[end] == b'.' {
        let frac_end = scan_digits(end + 1);
        let frac_digits = frac_end - (end + 1);
        if mantissa_digits + frac_digits > 0 {
            end = frac_end;
            mantissa_digits += frac_digits;
        }
    }

    if mantissa_digits == 0 {
        return "";
    }

    if end < len && (bytes[end] == b'e' || bytes[end] == b'E') {
        let mut exp_start = end + 1;
        if exp_start < len && (bytes[exp_start] == b'+' || bytes[exp_start] == b'-') {
            exp_start += 1;
        }
        let exp_end = scan_digits(exp_start);
        if exp_end > exp_start {
            end = exp_end;
        }
    }

    &s[..end]
}

/// Reads a stored amount that may be a JSON number, a numeric string, or missing.
pub fn amount_from_value(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().filter(|v| v.is_finite()).unwrap_or(0.0),
        Some(Value::String(s)) => parse_amount(s),
        _ => 0.0,
    }
}

/// Reads a stored field as text. Numbers keep their JSON rendering; anything else is empty.
pub fn text_from_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

pub fn approx_eq(a: f64, b: f64, tolerance: f64) -> bool {
    (a - b).abs() <= tolerance
}
