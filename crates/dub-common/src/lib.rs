use thiserror::Error;

/// Error kinds the dubbing pipeline recognizes.
#[derive(Error, Debug)]
pub enum DubError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("process execution failed: {0}")]
    ProcessFailed(String),

    #[error("process timed out: {0}")]
    ProcessTimeout(String),

    #[error("input exhausted: {0}")]
    InputExhaustion(String),

    #[error("transient remote error: {0}")]
    TransientRemote(String),

    #[error("remote quota exceeded: {0}")]
    QuotaRemote(String),

    #[error("malformed response: {0}")]
    MalformedResponse(String),

    #[error("resource exhausted: {0}")]
    ResourceExhaustion(String),

    #[error("translation failed: {0}")]
    TranslationFailed(String),

    #[error("audio extraction failed: {0}")]
    AudioExtractionFailed(String),

    #[error("STT execution failed: {0}")]
    SttFailed(String),

    #[error("TTS synthesis failed: {0}")]
    TtsFailed(String),

    #[error("WAV error: {0}")]
    Wav(String),

    #[error("invalid path: {0}")]
    InvalidPath(String),

    #[error("job not found: {0}")]
    NotFound(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("fatal subprocess failure: {0}")]
    FatalSubprocess(String),

    #[error("no engines remain in fallback chain for stage {0}")]
    EnginesExhausted(String),
}

pub type Result<T> = std::result::Result<T, DubError>;

impl From<hound::Error> for DubError {
    fn from(err: hound::Error) -> Self {
        DubError::Wav(err.to_string())
    }
}

/// Classification used by the orchestrator to decide retry/fallback/fail
///. Distinct from `DubError` itself so call sites can match on
/// category without re-deriving it from the error message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Validation,
    InputExhaustion,
    TransientRemote,
    QuotaRemote,
    MalformedResponse,
    ResourceExhaustion,
    Cancelled,
    FatalSubprocess,
}

impl DubError {
    pub fn classify(&self) -> FailureKind {
        match self {
            DubError::Validation(_) | DubError::InvalidPath(_) | DubError::NotFound(_) => {
                FailureKind::Validation
            }
            DubError::InputExhaustion(_) => FailureKind::InputExhaustion,
            DubError::TransientRemote(_) | DubError::ProcessTimeout(_) | DubError::Io(_) => {
                FailureKind::TransientRemote
            }
            DubError::QuotaRemote(_) => FailureKind::QuotaRemote,
            DubError::MalformedResponse(_) => FailureKind::MalformedResponse,
            DubError::ResourceExhaustion(_) => FailureKind::ResourceExhaustion,
            DubError::Cancelled => FailureKind::Cancelled,
            DubError::ProcessFailed(_) | DubError::FatalSubprocess(_) => {
                FailureKind::FatalSubprocess
            }
            DubError::TranslationFailed(_)
            | DubError::AudioExtractionFailed(_)
            | DubError::SttFailed(_)
            | DubError::TtsFailed(_)
            | DubError::Wav(_)
            | DubError::EnginesExhausted(_) => FailureKind::TransientRemote,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_quota_separately_from_transient() {
        assert_eq!(
            DubError::QuotaRemote("429".into()).classify(),
            FailureKind::QuotaRemote
        );
        assert_eq!(
            DubError::TransientRemote("timeout".into()).classify(),
            FailureKind::TransientRemote
        );
    }

    #[test]
    fn cancelled_is_its_own_kind() {
        assert_eq!(DubError::Cancelled.classify(), FailureKind::Cancelled);
    }
}
