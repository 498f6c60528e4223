pub(crate) fn median_f64(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(|left, right| left.total_cmp(right));
    let middle = sorted.len() / 2;
    if sorted.len().is_multiple_of(2) {
        return Some((sorted[middle - 1] + sorted[middle]) / 2.0);
    }
    Some(sorted[middle])
}

/// Rounds from the exact decimal expansion of `value`, so `0.015` (stored
/// just below the tie) goes down to `0.01`.
pub(crate) fn round_to(value: f64, decimals: u32) -> f64 {
    let precision = usize::try_from(decimals).unwrap_or(2);
    format!("{value:.precision$}").parse::<f64>().unwrap_or(value)
}
