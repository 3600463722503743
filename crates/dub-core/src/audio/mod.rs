pub mod assembler;
pub mod extract;
pub mod mux;

pub use assembler::{assemble, AssembledAudio};
pub use extract::extract_audio;
pub use mux::mux;
