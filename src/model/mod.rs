pub mod frame;
pub mod track;

pub use frame::{format_mmss, FrameInfo};
pub use track::{Track, TrackCatalog};
