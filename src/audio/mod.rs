//! Audio processing utilities.
//!
//! Long recordings are split with ffmpeg before upload so each request stays
//! under the transcription service's size limit.

mod splitter;

pub use splitter::{fit_chunk_seconds, plan_chunks, probe_duration, split_audio, AudioChunk};
