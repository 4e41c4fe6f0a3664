/// `100 * part / whole`, or 0 when the denominator is not positive.
///
/// Never returns NaN or infinity; no upper clamp (over 100% is a real anomaly).
pub fn safe_percent(part: f64, whole: f64) -> f64 {
    if whole.is_nan() || whole <= 0.0 {
        return 0.0;
    }
    let pct = part / whole * 100.0;
    if pct.is_finite() {
        pct
    } else {
        0.0
    }
}
