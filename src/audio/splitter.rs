//! Splitting long recordings with ffprobe/ffmpeg.

use crate::error::{Result, ToolboxError};
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, instrument, warn};

/// A piece of a longer recording.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioChunk {
    pub path: PathBuf,
    /// Position of the chunk within the source, in seconds.
    pub offset_seconds: f64,
}

/// Segments a long audio file into smaller chunks for upload.
///
/// Each chunk is at most `chunk_seconds` long, and shorter still when that
/// is needed to keep it under `max_chunk_bytes`. A file that already fits
/// both limits is returned as a single chunk pointing at `source`.
#[instrument(skip_all, fields(source = %source.display()))]
pub async fn split_audio(
    source: &Path,
    output_dir: &Path,
    chunk_seconds: u32,
    max_chunk_bytes: u64,
) -> Result<Vec<AudioChunk>> {
    std::fs::create_dir_all(output_dir)?;

    let file_bytes = std::fs::metadata(source)?.len();
    let total_duration = probe_duration(source).await?;
    info!("Total audio duration: {:.1}s", total_duration);

    let chunk_seconds =
        fit_chunk_seconds(total_duration, file_bytes, chunk_seconds, max_chunk_bytes);
    let plan = plan_chunks(total_duration, chunk_seconds);
    if plan.len() <= 1 {
        return Ok(vec![AudioChunk {
            path: source.to_path_buf(),
            offset_seconds: 0.0,
        }]);
    }

    let base_name = source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("audio");

    let mut chunks = Vec::with_capacity(plan.len());
    for (idx, (offset, length)) in plan.into_iter().enumerate() {
        let chunk_path = output_dir.join(format!("{}_{:04}.mp3", base_name, idx));
        extract_segment(source, &chunk_path, offset, length).await?;
        debug!("Created chunk {} at offset {:.1}s", idx, offset);
        chunks.push(AudioChunk {
            path: chunk_path,
            offset_seconds: offset,
        });
    }

    info!("Created {} audio chunks", chunks.len());
    Ok(chunks)
}

/// Headroom kept below the byte limit for container overhead and bitrate swings.
const SIZE_MARGIN: f64 = 0.9;

/// Shrink `chunk_seconds` so a chunk's share of `file_bytes` stays under
/// `max_chunk_bytes`, assuming a constant bitrate.
pub fn fit_chunk_seconds(
    total_seconds: f64,
    file_bytes: u64,
    chunk_seconds: u32,
    max_chunk_bytes: u64,
) -> u32 {
    if file_bytes <= max_chunk_bytes || total_seconds <= 0.0 {
        return chunk_seconds.max(1);
    }

    let bytes_per_second = file_bytes as f64 / total_seconds;
    let fitting = (max_chunk_bytes as f64 * SIZE_MARGIN / bytes_per_second).floor();
    // `fitting` is below `total_seconds` here, so the cast cannot overflow.
    (fitting as u32).clamp(1, chunk_seconds.max(1))
}

/// Compute `(offset, length)` pairs covering `total_seconds`.
pub fn plan_chunks(total_seconds: f64, chunk_seconds: u32) -> Vec<(f64, f64)> {
    let chunk_len = f64::from(chunk_seconds.max(1));
    if total_seconds <= chunk_len {
        return vec![(0.0, total_seconds.max(0.0))];
    }

    let mut plan = Vec::new();
    let mut offset = 0.0;
    while offset < total_seconds {
        plan.push((offset, chunk_len.min(total_seconds - offset)));
        offset += chunk_len;
    }
    plan
}

/// Extracts a time segment from an audio file.
async fn extract_segment(source: &Path, dest: &Path, start: f64, length: f64) -> Result<()> {
    // Stream copy first; it is lossless and fast when the container allows it.
    let copy_status = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-c").arg("copy")
        .arg("-y")
        .arg("-loglevel").arg("warning")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    if let Ok(status) = copy_status {
        if status.success() && dest.exists() {
            return Ok(());
        }
    }

    warn!("Stream copy failed, re-encoding segment");

    let encode_result = Command::new("ffmpeg")
        .arg("-ss").arg(format!("{:.3}", start))
        .arg("-i").arg(source)
        .arg("-t").arg(format!("{:.3}", length))
        .arg("-codec:a").arg("libmp3lame")
        .arg("-qscale:a").arg("2")
        .arg("-y")
        .arg("-loglevel").arg("error")
        .arg(dest)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await;

    match encode_result {
        Ok(out) if out.status.success() => Ok(()),
        Ok(out) => {
            let err = String::from_utf8_lossy(&out.stderr);
            Err(ToolboxError::ExternalToolFailed(format!(
                "ffmpeg segment extraction failed: {err}"
            )))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ToolboxError::ExternalToolNotFound("ffmpeg".into()))
        }
        Err(e) => Err(ToolboxError::ExternalToolFailed(format!("ffmpeg error: {e}"))),
    }
}

/// Queries the duration of an audio file using ffprobe with JSON output.
pub async fn probe_duration(path: &Path) -> Result<f64> {
    let result = Command::new("ffprobe")
        .arg("-v").arg("quiet")
        .arg("-print_format").arg("json")
        .arg("-show_format")
        .arg(path)
        .output()
        .await;

    let output = match result {
        Ok(o) => o,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(ToolboxError::ExternalToolNotFound("ffprobe".into()));
        }
        Err(e) => {
            return Err(ToolboxError::ExternalToolFailed(format!("ffprobe failed: {e}")));
        }
    };

    if !output.status.success() {
        return Err(ToolboxError::ExternalToolFailed(
            "ffprobe returned error".into(),
        ));
    }

    parse_probe_duration(&output.stdout)
}

fn parse_probe_duration(stdout: &[u8]) -> Result<f64> {
    let parsed: serde_json::Value = serde_json::from_slice(stdout)
        .map_err(|_| ToolboxError::ExternalToolFailed("Invalid ffprobe output".into()))?;

    parsed["format"]["duration"]
        .as_str()
        .and_then(|s| s.parse::<f64>().ok())
        .ok_or_else(|| {
            ToolboxError::ExternalToolFailed("Could not determine audio duration".into())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_short_audio_is_single_chunk() {
        assert_eq!(plan_chunks(42.0, 600), vec![(0.0, 42.0)]);
    }

    #[test]
    fn test_plan_covers_whole_duration() {
        let plan = plan_chunks(1500.0, 600);
        assert_eq!(plan, vec![(0.0, 600.0), (600.0, 600.0), (1200.0, 300.0)]);
    }

    #[test]
    fn test_fit_keeps_configured_length_under_limit() {
        assert_eq!(fit_chunk_seconds(1500.0, 10_000_000, 600, 25 * 1024 * 1024), 600);
    }

    #[test]
    fn test_fit_splits_short_oversized_wav() {
        // Five minutes of 44.1 kHz stereo PCM is roughly 53 MB.
        let limit = 25 * 1024 * 1024;
        let seconds = fit_chunk_seconds(300.0, 52_920_000, 600, limit);
        assert_eq!(seconds, 133);

        let plan = plan_chunks(300.0, seconds);
        assert_eq!(plan.len(), 3);
        let bytes_per_second = 52_920_000.0 / 300.0;
        for (_, length) in plan {
            assert!(length * bytes_per_second < limit as f64);
        }
    }

    #[test]
    fn test_fit_never_drops_below_one_second() {
        assert_eq!(fit_chunk_seconds(10.0, u64::MAX / 2, 600, 1), 1);
    }

    #[test]
    fn test_parse_probe_duration() {
        let json = br#"{"format": {"duration": "123.456000"}}"#;
        assert!((parse_probe_duration(json).unwrap() - 123.456).abs() < 1e-9);
        assert!(parse_probe_duration(b"{}").is_err());
        assert!(parse_probe_duration(b"garbage").is_err());
    }
}
