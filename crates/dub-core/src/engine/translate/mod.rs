mod local;
mod remote;

pub use local::LocalTranslateEngine;
pub use remote::RemoteTranslateEngine;
