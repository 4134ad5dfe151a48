//! Pixel statistics: sum, mean, median.

/// Sum accumulated in f64, left to right.
#[inline]
pub fn sum_f32(values: &[f32]) -> f64 {
    values.iter().fold(0.0f64, |acc, &v| acc + v as f64)
}

/// Arithmetic mean. Accumulates in f64 to limit rounding on long stacks.
#[inline]
pub fn mean_f32(values: &[f32]) -> f32 {
    debug_assert!(!values.is_empty());
    (sum_f32(values) / values.len() as f64) as f32
}

/// Calculate the median of f32 values in-place.
///
/// Mutates the input buffer (partial sort via quickselect). For even lengths
/// returns the mean of the two middle values. Empty input yields NaN.
#[inline]
pub fn median_f32_mut(data: &mut [f32]) -> f32 {
    if data.is_empty() {
        return f32::NAN;
    }

    let len = data.len();
    let mid = len / 2;

    let (left_part, median, _) = data.select_nth_unstable_by(mid, f32::total_cmp);
    let upper = *median;
    if len & 1 == 1 {
        upper
    } else {
        let lower = left_part
            .iter()
            .copied()
            .max_by(f32::total_cmp)
            .unwrap_or(upper);
        (lower + upper) * 0.5
    }
}

/// Median of a slice without mutating it.
pub fn median_f32(values: &[f32]) -> f32 {
    let mut scratch = values.to_vec();
    median_f32_mut(&mut scratch)
}
