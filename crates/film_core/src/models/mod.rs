//! Data models for film generation jobs.

mod enums;
mod film;
mod stage;

pub use enums::{ClipStatus, FilmStyle, MusicVibe, ProviderKind};
pub use film::{FilmSpec, FilmSpecError, VideoClip};
pub use stage::Stage;

pub(crate) use film::file_non_empty;
