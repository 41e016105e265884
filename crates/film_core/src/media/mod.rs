//! Local media operations: frame extraction and stitching.

mod frames;
mod stitcher;

pub use frames::{ExtractionError, FfmpegFrameExtractor, FrameExtractor};
pub use stitcher::{check_ffmpeg, trim_video, FfmpegStitcher, StitchError, Stitcher};
