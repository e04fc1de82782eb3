//! Formatting and sanitising helpers

use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

/// Group the digits of an integer string with thousands separators
pub fn format_number<T: ToString>(n: T) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push(',');
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    let grouped: String = result.chars().rev().collect();
    format!("{}{}", sign, grouped)
}

/// Format an amount with a currency symbol, thousands separators and fixed decimals,
/// e.g. `¥1,234.50`
pub fn format_currency(amount: f64, symbol: &str, decimals: u32) -> String {
    let fixed = format!("{:.*}", decimals as usize, amount.abs());
    let (int_part, frac_part) = match fixed.split_once('.') {
        Some((i, f)) => (i, Some(f)),
        None => (fixed.as_str(), None),
    };
    let negative = amount < 0.0 && fixed.chars().any(|c| c.is_ascii_digit() && c != '0');
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(symbol);
    out.push_str(&format_number(int_part));
    if let Some(frac) = frac_part {
        out.push('.');
        out.push_str(frac);
    }
    out
}

/// Render an amount the way a float column prints: `1000.0`, `12.5`, `-300.0`
pub fn format_plain_amount(amount: f64) -> String {
    if amount.fract() == 0.0 && amount.is_finite() {
        format!("{:.1}", amount)
    } else {
        format!("{}", amount)
    }
}

/// Escape text for inclusion in HTML element content or attribute values
pub fn escape_html(content: &str) -> String {
    let mut out = String::with_capacity(content.len());
    for c in content.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Rejected output filename
#[derive(Error, Debug, PartialEq)]
pub enum FilenameError {
    #[error("Filename is empty")]
    Empty,

    #[error("Filename contains a path component: {0}")]
    PathComponent(String),

    #[error("Filename contains unsupported characters: {0}")]
    InvalidCharacters(String),
}

static SAFE_FILENAME: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]*$").unwrap());

/// Validate a chart filename before it is joined to the output directory.
///
/// Only a bare file name is accepted: no separators, no `..`, no leading dot.
/// `.html` is appended when the name has no extension of that kind.
pub fn sanitize_filename(name: &str) -> Result<String, FilenameError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FilenameError::Empty);
    }
    if trimmed.contains('/') || trimmed.contains('\\') || trimmed.contains("..") {
        return Err(FilenameError::PathComponent(trimmed.to_string()));
    }
    if !SAFE_FILENAME.is_match(trimmed) {
        return Err(FilenameError::InvalidCharacters(trimmed.to_string()));
    }
    if trimmed.to_ascii_lowercase().ends_with(".html") {
        Ok(trimmed.to_string())
    } else {
        Ok(format!("{}.html", trimmed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-1234), "-1,234");
    }

    #[test]
    fn test_format_currency() {
        assert_eq!(format_currency(500.0, "¥", 2), "¥500.00");
        assert_eq!(format_currency(1234567.891, "¥", 2), "¥1,234,567.89");
        assert_eq!(format_currency(-2500.5, "$", 2), "-$2,500.50");
        assert_eq!(format_currency(42.0, "¥", 0), "¥42");
        assert_eq!(format_currency(-0.001, "¥", 2), "¥0.00");
    }

    #[test]
    fn test_format_plain_amount() {
        assert_eq!(format_plain_amount(1000.0), "1000.0");
        assert_eq!(format_plain_amount(-300.0), "-300.0");
        assert_eq!(format_plain_amount(12.5), "12.5");
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>A & B</b>"), "&lt;b&gt;A &amp; B&lt;/b&gt;");
        assert_eq!(escape_html("it's \"ok\""), "it&#39;s &quot;ok&quot;");
    }

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("chart.html").unwrap(), "chart.html");
        assert_eq!(sanitize_filename("percent_chart").unwrap(), "percent_chart.html");
        assert_eq!(sanitize_filename("../etc/passwd"), Err(FilenameError::PathComponent("../etc/passwd".to_string())));
        assert!(matches!(sanitize_filename("a/b.html"), Err(FilenameError::PathComponent(_))));
        assert!(matches!(sanitize_filename("..hidden"), Err(FilenameError::PathComponent(_))));
        assert!(matches!(sanitize_filename(".env"), Err(FilenameError::InvalidCharacters(_))));
        assert!(matches!(sanitize_filename("chart<1>.html"), Err(FilenameError::InvalidCharacters(_))));
        assert_eq!(sanitize_filename("   "), Err(FilenameError::Empty));
    }
}
