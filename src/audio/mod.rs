pub mod backend;
pub mod file;

pub use backend::{AudioChunk, FrameSource};
pub use file::WavFrameSource;
