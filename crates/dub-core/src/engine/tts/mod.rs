mod local_subprocess;
mod remote;

pub use local_subprocess::LocalSubprocessTtsEngine;
pub use remote::RemoteSynthesizeEngine;
