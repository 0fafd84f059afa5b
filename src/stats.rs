//! Scan and standardization helpers for the analysis passes
//!
//! Small numeric utilities shared by the queue-depth reconstruction and the
//! optimization ranker: bounded first-match/argmax scans over slices, and
//! explicit mean / sample-standard-deviation / z-score computation with
//! guards for degenerate samples.

/// Index of the first element in `items[start..end)` matching `predicate`,
/// or `None`. `end` defaults to the slice length.
pub fn index_of_first_match<T>(
    items: &[T],
    predicate: impl Fn(&T) -> bool,
    start: usize,
    end: Option<usize>,
) -> Option<usize> {
    let end = end.unwrap_or(items.len()).min(items.len());
    if start > end {
        return None;
    }
    items[start..end]
        .iter()
        .position(predicate)
        .map(|offset| start + offset)
}

/// Index of the maximum element in `items[start..end)`, or `None` when the
/// range is empty. Ties resolve to the earliest index.
pub fn argmax<T: PartialOrd>(items: &[T], start: usize, end: Option<usize>) -> Option<usize> {
    let end = end.unwrap_or(items.len()).min(items.len());
    if start >= end {
        return None;
    }
    let mut best = start;
    for index in (start + 1)..end {
        if items[index] > items[best] {
            best = index;
        }
    }
    Some(best)
}

/// Arithmetic mean, `None` for an empty sample.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (Bessel's correction), `None` when the sample
/// has fewer than two elements.
pub fn sample_std(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let m = mean(values)?;
    let variance =
        values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / (values.len() - 1) as f64;
    Some(variance.sqrt())
}

/// Z-scores (zero mean, unit variance) of the sample.
///
/// Returns `None` for degenerate samples: fewer than two elements, or zero
/// variance. Callers skip ranking in that case rather than dividing by zero.
pub fn standardize(values: &[f64]) -> Option<Vec<f64>> {
    let m = mean(values)?;
    let std = sample_std(values)?;
    if std == 0.0 {
        return None;
    }
    Some(values.iter().map(|v| (v - m) / std).collect())
}
