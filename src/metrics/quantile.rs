use serde::{Serialize, Serializer};

use crate::PerfReporterError;

/// The min/median/max triple computed over a set of durations.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Quantiles {
    /// The shortest duration, in milliseconds.
    pub min: u64,
    /// The median duration, in milliseconds.
    ///
    /// With an even number of samples this is the average of the two middle values,
    /// so it can have a fractional part.
    #[serde(serialize_with = "serialize_median")]
    pub median: f64,
    /// The longest duration, in milliseconds.
    pub max: u64,
}

/// Compute the [`Quantiles`] of an unordered, non-empty collection of samples.
///
/// # Example
/// ```rust
/// use perf_reporter::metrics::quantiles;
///
/// let q = quantiles(&[200, 150]).unwrap();
/// assert_eq!((q.min, q.median, q.max), (150, 175.0, 200));
///
/// let q = quantiles(&[9, 1, 5]).unwrap();
/// assert_eq!((q.min, q.median, q.max), (1, 5.0, 9));
/// ```
pub fn quantiles(samples: &[u64]) -> Result<Quantiles, PerfReporterError> {
    trace!("computing quantiles over {} samples", samples.len());
    if samples.is_empty() {
        return Err(PerfReporterError::EmptySamples {
            detail: "quantiles require at least one sample".to_string(),
        });
    }

    let mut sorted = samples.to_vec();
    sorted.sort_unstable();
    let n = sorted.len();

    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0
    } else {
        sorted[(n - 1) / 2] as f64
    };

    Ok(Quantiles {
        min: sorted[0],
        median,
        max: sorted[n - 1],
    })
}

/// Medians without a fractional part are written as integers, `175` rather than `175.0`.
fn serialize_median<S>(median: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if median.fract() == 0.0 && *median <= u64::MAX as f64 {
        serializer.serialize_u64(*median as u64)
    } else {
        serializer.serialize_f64(*median)
    }
}
