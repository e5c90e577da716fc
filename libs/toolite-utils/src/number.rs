//! Decimal truncation on the textual form of a number
//!
//! Working on digits instead of `value * 10^n` keeps results such as
//! `1.005 -> 1.00` exact and never produces exponent notation.

/// Default number of kept fraction digits
pub const DEFAULT_DECIMALS: usize = 2;

/// Keep `decimals` fraction digits of `value`.
///
/// Extra digits are dropped, or rounded half away from zero when `round` is set.
/// Non-finite values are returned unchanged.
pub fn truncate_decimal(value: f64, decimals: usize, round: bool) -> f64 {
    if !value.is_finite() {
        return value;
    }
    // f64 Display never switches to exponent notation
    truncate_text(&value.to_string(), decimals, round)
        .and_then(|text| text.parse().ok())
        .unwrap_or(value)
}

/// String form of [`truncate_decimal`].
///
/// Plain decimal text is processed digit by digit so precision beyond f64 is
/// preserved. Exponent forms are expanded first. Empty or unparseable input is
/// returned unchanged.
pub fn truncate_decimal_str(text: &str, decimals: usize, round: bool) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return text.to_string();
    }
    if let Some(out) = truncate_text(trimmed, decimals, round) {
        return out;
    }
    match trimmed.parse::<f64>() {
        Ok(value) if value.is_finite() => {
            truncate_text(&value.to_string(), decimals, round).unwrap_or_else(|| text.to_string())
        }
        _ => text.to_string(),
    }
}

/// Truncate plain `[-+]digits[.digits]` text; `None` for anything else
fn truncate_text(text: &str, decimals: usize, round: bool) -> Option<String> {
    let (negative, body) = match text.as_bytes().first()? {
        b'-' => (true, &text[1..]),
        b'+' => (false, &text[1..]),
        _ => (false, text),
    };
    let (int_part, frac_part) = body.split_once('.').unwrap_or((body, ""));
    if int_part.is_empty() && frac_part.is_empty() {
        return None;
    }
    if !int_part.bytes().chain(frac_part.bytes()).all(|b| b.is_ascii_digit()) {
        return None;
    }
    let int_part = if int_part.is_empty() { "0" } else { int_part };

    let kept = frac_part.len().min(decimals);
    let mut digits: Vec<u8> = int_part
        .bytes()
        .chain(frac_part.bytes().take(kept))
        .collect();

    let round_up = round && frac_part.as_bytes().get(decimals).is_some_and(|&b| b >= b'5');
    if round_up && !increment(&mut digits) {
        digits.insert(0, b'1');
    }

    let int_len = digits.len() - kept;
    let is_zero = digits.iter().all(|&b| b == b'0');

    let mut out = String::with_capacity(digits.len() + 2);
    if negative && !is_zero {
        out.push('-');
    }
    out.extend(digits[..int_len].iter().map(|&b| b as char));
    if kept > 0 {
        out.push('.');
        out.extend(digits[int_len..].iter().map(|&b| b as char));
    }
    Some(out)
}

/// Add one to the last digit with carry. Returns false on overflow.
fn increment(digits: &mut [u8]) -> bool {
    for digit in digits.iter_mut().rev() {
        if *digit == b'9' {
            *digit = b'0';
        } else {
            *digit += 1;
            return true;
        }
    }
    false
}
