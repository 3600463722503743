pub mod chunker;
pub mod refine;
pub mod sanitize;

pub use chunker::chunk_transcript;
pub use refine::{refine_chunk, translate_with_fallback};
pub use sanitize::sanitize;
