/// Formats a value with 16 significant digits, dropping trailing zeros, the way
/// `printf("%.16g")` does. Every text format in the crate writes numbers with this.
pub fn format_number(value: f64) -> String {
    if value == 0.0 {
        return "0".to_owned();
    }
    if value.is_nan() {
        return "nan".to_owned();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_owned();
    }
    let sci = format!("{:.15e}", value);
    let (mantissa, exponent) = match sci.split_once('e') {
        Some(parts) => parts,
        None => return sci,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);
    if !(-5..16).contains(&exponent) {
        let mantissa = trim_fraction(mantissa);
        let sign = if exponent < 0 { '-' } else { '+' };
        return format!("{}e{}{:02}", mantissa, sign, exponent.abs());
    }
    let decimals = (15 - exponent).max(0) as usize;
    trim_fraction(&format!("{:.*}", decimals, value)).to_owned()
}

fn trim_fraction(s: &str) -> &str {
    if s.contains('.') {
        s.trim_end_matches('0').trim_end_matches('.')
    } else {
        s
    }
}

/// Lenient float parsing for values coming out of text formats.
pub fn parse_number(text: &str) -> Option<f64> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }
    text.parse::<f64>().ok()
}

/// True when `text` is something WKT writes unquoted.
pub fn is_numeric(text: &str) -> bool {
    let t = text.trim();
    !t.is_empty()
        && t.parse::<f64>().is_ok()
        && t.chars().all(|c| c.is_ascii_digit() || "+-.eE".contains(c))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_printf_g16() {
        assert_eq!(format_number(6378137.0), "6378137");
        assert_eq!(format_number(298.257223563), "298.257223563");
        assert_eq!(format_number(0.0174532925199433), "0.0174532925199433");
        assert_eq!(format_number(0.9996), "0.9996");
        assert_eq!(format_number(-183.0), "-183");
        assert_eq!(format_number(1e-7), "1e-07");
        assert_eq!(format_number(0.0), "0");
        assert_eq!(format_number(10000000.0), "10000000");
    }

    #[test]
    fn numeric_detection() {
        assert!(is_numeric("-1.5e3"));
        assert!(!is_numeric("NORTH"));
        assert!(!is_numeric("inf"));
        assert_eq!(parse_number(" 12.5 "), Some(12.5));
        assert_eq!(parse_number(""), None);
    }
}
