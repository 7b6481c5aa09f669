//! Frame I/O over async streams.
//!
//! The read and write halves are separate types so the receiver task can
//! own the reader while the connection keeps the writer.

mod reader;
mod writer;

pub use reader::FrameReader;
pub use writer::FrameWriter;
