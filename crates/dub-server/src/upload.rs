//! Input file validation for `POST /api/jobs`: extension
//! whitelist, size cap enforced while streaming, filename sanitization, and
//! a path-traversal guard on the final resolved path.

use dub_common::{DubError, Result};
use std::path::{Path, PathBuf};
use uuid::Uuid;

const VIDEO_EXTENSIONS: &[&str] = &["mp4", "mkv", "avi", "mov", "webm"];
const AUDIO_EXTENSIONS: &[&str] = &["mp3", "wav", "flac", "ogg"];

pub fn extension_allowed(filename: &str) -> bool {
    let Some(ext) = Path::new(filename).extension().and_then(|e| e.to_str()) else {
        return false;
    };
    let ext = ext.to_lowercase();
    VIDEO_EXTENSIONS.contains(&ext.as_str()) || AUDIO_EXTENSIONS.contains(&ext.as_str())
}

/// Replaces anything outside `[A-Za-z0-9_-]` with `_` and prepends an 8-hex
/// random prefix, so two uploads with the same original name never collide.
pub fn sanitize_filename(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("upload");
    let ext = Path::new(original)
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("bin");
    let cleaned: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' || c == '-' { c } else { '_' })
        .collect();
    let prefix: String = Uuid::new_v4().simple().to_string().chars().take(8).collect();
    format!("{prefix}_{cleaned}.{ext}")
}

/// Resolves `sanitized_name` under `upload_dir`, rejecting anything that
/// would escape it.
pub fn resolve_upload_path(upload_dir: &Path, sanitized_name: &str) -> Result<PathBuf> {
    if sanitized_name.contains('\0') || sanitized_name.contains("..") {
        return Err(DubError::InvalidPath("sanitized filename is unsafe".into()));
    }
    let candidate = upload_dir.join(sanitized_name);
    let parent = candidate
        .parent()
        .ok_or_else(|| DubError::InvalidPath("upload path has no parent".into()))?;
    if parent != upload_dir {
        return Err(DubError::InvalidPath(
            "resolved upload path escapes the upload directory".into(),
        ));
    }
    Ok(candidate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whitelists_video_and_audio_extensions() {
        assert!(extension_allowed("movie.MP4"));
        assert!(extension_allowed("clip.flac"));
        assert!(!extension_allowed("payload.exe"));
        assert!(!extension_allowed("no_extension"));
    }

    #[test]
    fn sanitize_strips_unsafe_characters() {
        let out = sanitize_filename("../../etc/passwd; rm -rf.mp4");
        assert!(!out.contains(".."));
        assert!(!out.contains(';'));
        assert!(out.ends_with(".mp4"));
    }

    #[test]
    fn resolve_rejects_traversal() {
        let dir = Path::new("/data/uploads");
        assert!(resolve_upload_path(dir, "abc123_movie.mp4").is_ok());
        assert!(resolve_upload_path(dir, "../escape.mp4").is_err());
    }
}
