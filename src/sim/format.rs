use std::sync::OnceLock;

pub const DEFAULT_SCIENTIFIC_EXPONENT: i32 = 303;

const ILLION_UNITS: [&str; 10] = ["", "U", "D", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "No"];
const ILLION_TENS: [&str; 10] = ["", "Dc", "Vg", "Tg", "Qag", "Qig", "Sxg", "Spg", "Ocg", "Nog"];
const SMALL_ILLIONS: [&str; 10] = ["K", "M", "B", "T", "Qa", "Qi", "Sx", "Sp", "Oc", "No"];

/// Descending `(threshold, suffix)` pairs from 10^303 down to 10^3.
fn suffix_table() -> &'static [(f64, String)] {
    static TABLE: OnceLock<Vec<(f64, String)>> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut table = Vec::with_capacity(101);
        for group in 1..=101_i32 {
            let suffix = match group {
                1..=10 => SMALL_ILLIONS[(group - 1) as usize].to_string(),
                101 => "Ce".to_string(),
                _ => {
                    // group g names the (g-1)-illion
                    let illion = (group - 1) as usize;
                    format!("{}{}", ILLION_UNITS[illion % 10], ILLION_TENS[illion / 10])
                }
            };
            table.push((10f64.powi(group * 3), suffix));
        }
        table.reverse();
        table
    })
}

pub fn format_number(n: f64) -> String {
    format_with_threshold(n, DEFAULT_SCIENTIFIC_EXPONENT)
}

/// Short-scale rendering; switches to `{mantissa}e{exponent}` at or above `10^scientific_exponent`.
pub fn format_with_threshold(n: f64, scientific_exponent: i32) -> String {
    if n.is_nan() {
        return "NaN".to_string();
    }
    if n.is_infinite() {
        return if n > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    let sign = if n < 0.0 { "-" } else { "" };
    let magnitude = n.abs();

    if magnitude < 1_000.0 {
        let body = strip_zeros(format!("{magnitude:.2}"));
        if body == "0" {
            return body;
        }
        return format!("{sign}{body}");
    }

    if magnitude.log10() >= scientific_exponent as f64 {
        return format!("{sign}{}", scientific(magnitude));
    }

    let table = suffix_table();
    let Some(position) = table.iter().position(|(value, _)| *value <= magnitude) else {
        return format!("{sign}{}", scientific(magnitude));
    };
    let (value, suffix) = &table[position];
    let mut mantissa = magnitude / value;
    let mut suffix = suffix.as_str();
    if round2(mantissa) >= 1_000.0 {
        // 999.999K would print as 1000K
        if position == 0 {
            return format!("{sign}{}", scientific(magnitude));
        }
        let (next_value, next_suffix) = &table[position - 1];
        mantissa = magnitude / next_value;
        suffix = next_suffix.as_str();
    }
    format!("{sign}{}{suffix}", strip_zeros(format!("{mantissa:.2}")))
}

fn scientific(magnitude: f64) -> String {
    let mut exponent = magnitude.log10().floor() as i32;
    let mut mantissa = magnitude / 10f64.powi(exponent);
    if round2(mantissa) >= 10.0 {
        exponent += 1;
        mantissa /= 10.0;
    }
    format!("{}e{exponent}", strip_zeros(format!("{mantissa:.2}")))
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn strip_zeros(text: String) -> String {
    if !text.contains('.') {
        return text;
    }
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
