#[cfg(any(feature = "stt_local_cpu", feature = "stt_local_cuda"))]
mod whisper_local;
mod remote_http;

#[cfg(any(feature = "stt_local_cpu", feature = "stt_local_cuda"))]
pub use whisper_local::WhisperLocalEngine;
pub use remote_http::RemoteSttEngine;
