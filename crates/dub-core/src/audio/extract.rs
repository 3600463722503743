//! Extracts a mono 16 kHz WAV audio track from a source video via an
//! external `ffmpeg` binary, invoked through the subprocess boundary.

use crate::subprocess;
use dub_common::{DubError, Result};
use std::path::Path;
use std::time::Duration;

pub async fn extract_audio(video_path: &Path, out_wav_path: &Path, ffmpeg_binary: &str, deadline: Duration) -> Result<()> {
    subprocess::validate_path_arg(video_path)?;
    subprocess::validate_path_arg(out_wav_path)?;

    let video_str = video_path
        .to_str()
        .ok_or_else(|| DubError::InvalidPath("video path is not valid UTF-8".into()))?;
    let out_str = out_wav_path
        .to_str()
        .ok_or_else(|| DubError::InvalidPath("output path is not valid UTF-8".into()))?;

    subprocess::run(
        ffmpeg_binary,
        &[
            "-y",
            "-i",
            video_str,
            "-vn",
            "-ac",
            "1",
            "-ar",
            "16000",
            "-acodec",
            "pcm_s16le",
            out_str,
        ],
        deadline,
    )
    .await
    .map_err(|e| DubError::AudioExtractionFailed(e.to_string()))
}
