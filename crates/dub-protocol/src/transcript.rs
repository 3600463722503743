use dub_common::{DubError, Result};
use serde::{Deserialize, Serialize};

/// One timestamped span of speech.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Segment {
    pub start_seconds: f64,
    pub end_seconds: f64,
    pub text: String,
    pub speaker_label: Option<String>,
    pub confidence: Option<f32>,
}

impl Segment {
    pub fn duration(&self) -> f64 {
        self.end_seconds - self.start_seconds
    }
}

/// Ordered, non-overlapping sequence of segments.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transcript {
    pub segments: Vec<Segment>,
}

impl Transcript {
    pub fn new(segments: Vec<Segment>) -> Self {
        Self { segments }
    }

    /// Validates the invariants: non-overlapping, strictly monotonic
    /// starts, end >= start, non-empty text.
    pub fn validate(&self) -> Result<()> {
        if self.segments.is_empty() {
            return Err(DubError::InputExhaustion(
                "transcript has no segments".into(),
            ));
        }
        let mut prev_start = f64::NEG_INFINITY;
        let mut prev_end = f64::NEG_INFINITY;
        for (i, seg) in self.segments.iter().enumerate() {
            if seg.text.trim().is_empty() {
                return Err(DubError::Validation(format!(
                    "segment {i} has empty text"
                )));
            }
            if seg.end_seconds < seg.start_seconds {
                return Err(DubError::Validation(format!(
                    "segment {i} ends before it starts"
                )));
            }
            if seg.start_seconds <= prev_start {
                return Err(DubError::Validation(format!(
                    "segment {i} start is not strictly monotonic"
                )));
            }
            if seg.start_seconds < prev_end {
                return Err(DubError::Validation(format!(
                    "segment {i} overlaps the previous segment"
                )));
            }
            prev_start = seg.start_seconds;
            prev_end = seg.end_seconds;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seg(start: f64, end: f64, text: &str) -> Segment {
        Segment {
            start_seconds: start,
            end_seconds: end,
            text: text.into(),
            speaker_label: None,
            confidence: None,
        }
    }

    #[test]
    fn rejects_empty_transcript() {
        let t = Transcript::new(vec![]);
        assert!(t.validate().is_err());
    }

    #[test]
    fn rejects_overlapping_segments() {
        let t = Transcript::new(vec![seg(0.0, 2.0, "a"), seg(1.0, 3.0, "b")]);
        assert!(t.validate().is_err());
    }

    #[test]
    fn accepts_well_formed_transcript() {
        let t = Transcript::new(vec![seg(0.0, 1.0, "a"), seg(1.0, 2.0, "b")]);
        assert!(t.validate().is_ok());
    }
}
