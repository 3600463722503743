pub mod dispatcher;
pub mod stt;
pub mod traits;
pub mod translate;
pub mod tts;

pub use dispatcher::{Dispatcher, EngineCatalog};
pub use traits::{Evaluator, SynthesizeEngine, TranslateEngine, Transcriber};
