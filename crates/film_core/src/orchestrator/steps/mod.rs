//! Step implementations for the generation pipeline.

mod clips;
mod starting_frame;
mod stitch;

pub use clips::ClipsStep;
pub use starting_frame::StartingFrameStep;
pub use stitch::StitchStep;
