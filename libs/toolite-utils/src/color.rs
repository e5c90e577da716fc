//! Color conversion

use regex::Regex;
use std::sync::LazyLock;

static HEX_COLOR: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^#([0-9A-Fa-f]{3}|[0-9A-Fa-f]{6})$").ok());

/// Convert `#RRGGBB` or `#RGB` to `rgba(R, G, B, A)`.
///
/// Returns an empty string for malformed hex or an opacity outside `[0, 1]`.
pub fn hex_to_rgba(hex: &str, opacity: f64) -> String {
    if !(0.0..=1.0).contains(&opacity) {
        return String::new();
    }
    let hex = hex.trim();
    let Some(caps) = HEX_COLOR.as_ref().and_then(|re| re.captures(hex)) else {
        return String::new();
    };

    let digits = &caps[1];
    let expanded: String = if digits.len() == 3 {
        digits.chars().flat_map(|c| [c, c]).collect()
    } else {
        digits.to_string()
    };

    let channel = |i: usize| u8::from_str_radix(&expanded[i..i + 2], 16).unwrap_or(0);
    format!(
        "rgba({}, {}, {}, {})",
        channel(0),
        channel(2),
        channel(4),
        opacity
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_hex() {
        assert_eq!(hex_to_rgba("#FF8000", 1.0), "rgba(255, 128, 0, 1)");
        assert_eq!(hex_to_rgba("#00ff7f", 0.5), "rgba(0, 255, 127, 0.5)");
    }

    #[test]
    fn test_short_hex() {
        assert_eq!(hex_to_rgba("#fa0", 0.0), "rgba(255, 170, 0, 0)");
    }

    #[test]
    fn test_invalid_input() {
        assert_eq!(hex_to_rgba("FF8000", 1.0), "");
        assert_eq!(hex_to_rgba("#GG0000", 1.0), "");
        assert_eq!(hex_to_rgba("#FF80", 1.0), "");
        assert_eq!(hex_to_rgba("#FF8000", 1.5), "");
        assert_eq!(hex_to_rgba("#FF8000", -0.1), "");
        assert_eq!(hex_to_rgba("#FF8000", f64::NAN), "");
    }
}
