//! Merges the assembled dubbed audio back onto the source video via an
//! external `ffmpeg` binary.

use crate::subprocess;
use dub_common::{DubError, Result};
use std::path::Path;
use std::time::Duration;

/// `video_stretch_factor` is `Some` only in `SyncMode::VideoStretch`
///, and is applied to the video stream's `setpts` filter.
pub async fn mux(
    video_path: &Path,
    audio_path: &Path,
    out_path: &Path,
    video_stretch_factor: Option<f64>,
    ffmpeg_binary: &str,
    deadline: Duration,
) -> Result<()> {
    subprocess::validate_path_arg(video_path)?;
    subprocess::validate_path_arg(audio_path)?;
    subprocess::validate_path_arg(out_path)?;

    let video_str = video_path
        .to_str()
        .ok_or_else(|| DubError::InvalidPath("video path is not valid UTF-8".into()))?;
    let audio_str = audio_path
        .to_str()
        .ok_or_else(|| DubError::InvalidPath("audio path is not valid UTF-8".into()))?;
    let out_str = out_path
        .to_str()
        .ok_or_else(|| DubError::InvalidPath("output path is not valid UTF-8".into()))?;

    let mut args: Vec<String> = vec!["-y".into(), "-i".into(), video_str.into(), "-i".into(), audio_str.into()];

    if let Some(factor) = video_stretch_factor {
        args.push("-filter:v".into());
        args.push(format!("setpts={factor:.6}*PTS"));
    }

    args.push("-map".into());
    args.push("0:v:0".into());
    args.push("-map".into());
    args.push("1:a:0".into());
    args.push("-c:v".into());
    args.push(if video_stretch_factor.is_some() { "libx264".into() } else { "copy".into() });
    args.push("-c:a".into());
    args.push("aac".into());
    args.push("-shortest".into());
    args.push(out_str.into());

    let arg_refs: Vec<&str> = args.iter().map(String::as_str).collect();
    subprocess::run(ffmpeg_binary, &arg_refs, deadline).await
}
