/// Float formatting helpers for wasm.
///
/// Rust's core float-to-decimal formatting has had wasm-facing panics in some
/// toolchain/browser combinations (see `dragon.rs` panics). To avoid that class
/// of issues, these helpers do **not** use `format!` on floats.
///
/// For finite values they scale + round into an `i64`, then format integers.
use vramsim_views::showcase::group_thousands;

pub fn fmt_f64_fixed(v: f64, decimals: usize) -> String {
    if !v.is_finite() {
        return if v.is_nan() {
            "NaN".to_string()
        } else if v.is_sign_positive() {
            "Inf".to_string()
        } else {
            "-Inf".to_string()
        };
    }

    let decimals = decimals.min(9);
    let scale_i64 = 10_i64.checked_pow(decimals as u32).unwrap_or(1_i64);
    let scaled = (v * scale_i64 as f64).round();
    if !scaled.is_finite() || scaled.abs() > (i64::MAX as f64) {
        return if v.is_sign_negative() {
            "-Inf".to_string()
        } else {
            "Inf".to_string()
        };
    }

    let scaled_i = scaled as i64;
    let abs_i = scaled_i.abs();
    let int_part = abs_i / scale_i64;
    let frac_part = abs_i % scale_i64;

    let mut out = String::new();
    if scaled_i < 0 {
        out.push('-');
    }
    out.push_str(&int_part.to_string());
    if decimals > 0 {
        out.push('.');
        let frac_str = frac_part.to_string();
        for _ in 0..decimals.saturating_sub(frac_str.len()) {
            out.push('0');
        }
        out.push_str(&frac_str);
    }
    out
}

#[inline]
pub fn fmt_f32_fixed(v: f32, decimals: usize) -> String {
    fmt_f64_fixed(v as f64, decimals)
}

/// `70.00 GB`
pub fn fmt_gb(gb: f64) -> String {
    let mut s = fmt_f64_fixed(gb, 2);
    s.push_str(" GB");
    s
}

/// Whole number with thousands separators; negatives and NaN read as 0.
pub fn fmt_grouped(v: f64) -> String {
    if !(v.is_finite() && v > 0.0) {
        return "0".to_string();
    }
    group_thousands(v.round() as u64)
}

/// `12.3s`
pub fn fmt_seconds(ms: f64) -> String {
    let mut s = fmt_f64_fixed(ms / 1000.0, 1);
    s.push('s');
    s
}

/// Bar width as a CSS percentage.
pub fn fmt_percent(fraction: f64) -> String {
    let mut s = fmt_f64_fixed(fraction.clamp(0.0, 1.0) * 100.0, 1);
    s.push('%');
    s
}
