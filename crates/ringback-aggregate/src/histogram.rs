use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BucketError {
    #[error("histogram needs at least one boundary")]
    Empty,
    #[error("first boundary must be 0, got {0}")]
    NotFromZero(u64),
    #[error("boundaries must strictly increase (index {0})")]
    NotIncreasing(usize),
}

/// Fixed-boundary histogram over non-negative second counts.
///
/// Buckets are right-open: `[b[i], b[i+1])`. The last bucket,
/// `[b[last], ∞)`, catches everything beyond the largest boundary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    boundaries: Vec<u64>,
    counts: Vec<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub lower_secs: u64,
    /// `None` for the overflow bucket.
    pub upper_secs: Option<u64>,
    pub count: u64,
}

impl Histogram {
    pub fn new(boundaries_secs: Vec<u64>) -> Result<Self, BucketError> {
        match boundaries_secs.first() {
            None => return Err(BucketError::Empty),
            Some(&first) if first != 0 => return Err(BucketError::NotFromZero(first)),
            Some(_) => {}
        }
        if let Some(i) = boundaries_secs.windows(2).position(|w| w[0] >= w[1]) {
            return Err(BucketError::NotIncreasing(i + 1));
        }
        let counts = vec![0; boundaries_secs.len()];
        Ok(Self {
            boundaries: boundaries_secs,
            counts,
        })
    }

    /// Boundaries given in minutes.
    pub fn from_minutes(boundaries_min: &[u64]) -> Result<Self, BucketError> {
        Self::new(boundaries_min.iter().map(|m| m * 60).collect())
    }

    pub fn add(&mut self, secs: u64) {
        // index of the last boundary <= secs; boundaries[0] == 0 so it always exists
        let idx = self.boundaries.partition_point(|&b| b <= secs) - 1;
        self.counts[idx] += 1;
    }

    /// Negative values cannot come out of the extractor; they are clamped to 0.
    pub fn extend_secs<I: IntoIterator<Item = i64>>(&mut self, values: I) {
        for v in values {
            self.add(v.max(0) as u64);
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn buckets(&self) -> Vec<Bucket> {
        self.boundaries
            .iter()
            .enumerate()
            .map(|(i, &lower)| {
                let upper = self.boundaries.get(i + 1).copied();
                let label = match upper {
                    Some(u) => format!("{}-{}", fmt_secs(lower), fmt_secs(u)),
                    None => format!("{}+", fmt_secs(lower)),
                };
                Bucket {
                    label,
                    lower_secs: lower,
                    upper_secs: upper,
                    count: self.counts[i],
                }
            })
            .collect()
    }
}

impl Serialize for Histogram {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.buckets().serialize(serializer)
    }
}

/// Compact duration label: `90s`, `15m`, `2h`, `1d`.
pub fn fmt_secs(secs: u64) -> String {
    match secs {
        0 => "0".to_string(),
        s if s % 86_400 == 0 => format!("{}d", s / 86_400),
        s if s % 3_600 == 0 => format!("{}h", s / 3_600),
        s if s % 60 == 0 => format!("{}m", s / 60),
        s => format!("{s}s"),
    }
}
