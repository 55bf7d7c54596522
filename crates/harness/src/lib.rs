pub mod container;
pub mod memory;

pub use container::TestContainer;
pub use memory::{MemoryStore, RecordingWriter, WriterCall, WriterLog};
