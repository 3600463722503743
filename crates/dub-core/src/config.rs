//! Layered configuration: defaults → `config.toml` → environment
//! variables, via `figment`.

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

fn default_rate_limit_per_min() -> u32 {
    10
}

fn default_upload_cap_bytes() -> u64 {
    2 * 1024 * 1024 * 1024
}

fn default_subtitle_batch_threshold() -> f32 {
    0.0
}

/// Ambient config. Carries no per-job
/// state; one instance is built at process startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub auth_enabled: bool,
    pub allowed_api_keys: Vec<String>,
    pub cors_allowed_origins: Vec<String>,
    #[serde(default = "default_rate_limit_per_min")]
    pub rate_limit_per_min: u32,
    #[serde(default = "default_upload_cap_bytes")]
    pub upload_cap_bytes: u64,
    pub upload_dir: String,
    pub output_dir: String,
    pub whisper_model_path: Option<String>,
    pub worker_pool_size: usize,
    /// Not wired to any behavior here since subtitle export is out of
    /// scope; kept as an explicit, named parameter rather than a hidden
    /// global so a future subtitle feature has somewhere to live.
    #[serde(default = "default_subtitle_batch_threshold")]
    pub subtitle_batch_threshold: f32,
    /// Remote engine id -> HTTP endpoint, keyed the same way as the engine
    /// catalog's `EngineSpec.id`.
    #[serde(default)]
    pub engine_endpoints: HashMap<String, String>,
    /// Local subprocess TTS binary path, if configured.
    pub tts_local_binary: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".into(),
            port: 8080,
            auth_enabled: false,
            allowed_api_keys: Vec::new(),
            cors_allowed_origins: Vec::new(),
            rate_limit_per_min: default_rate_limit_per_min(),
            upload_cap_bytes: default_upload_cap_bytes(),
            upload_dir: "./data/uploads".into(),
            output_dir: "./data/outputs".into(),
            whisper_model_path: None,
            worker_pool_size: 2,
            subtitle_batch_threshold: default_subtitle_batch_threshold(),
            engine_endpoints: HashMap::new(),
            tts_local_binary: None,
        }
    }
}

impl Config {
    /// Loads config.toml (if present) layered under env vars prefixed
    /// `DUB_`, with compiled-in defaults as the base layer.
    pub fn load(toml_path: Option<&str>) -> Result<Self, figment::Error> {
        let mut figment = Figment::new().merge(Serialized::defaults(Config::default()));
        if let Some(path) = toml_path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("DUB_").split("__"));
        figment.extract()
    }

    /// Presence (never values) of each configured credential, for
    /// `GET /api/system/status`.
    pub fn credential_presence(&self, names: &[&str]) -> Vec<(String, bool)> {
        names
            .iter()
            .map(|name| {
                let env_name = format!("DUB_{}", name.to_uppercase());
                (name.to_string(), std::env::var(env_name).is_ok())
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_load_without_a_file() {
        let cfg = Config::load(None).expect("defaults must always extract");
        assert_eq!(cfg.rate_limit_per_min, 10);
        assert_eq!(cfg.port, 8080);
    }

    #[test]
    fn credential_presence_never_carries_values() {
        // SAFETY: test-local env mutation, no other test reads this key.
        unsafe { std::env::set_var("DUB_TEST_TRANSLATE_KEY", "super-secret") };
        let cfg = Config::default();
        let presence = cfg.credential_presence(&["test_translate_key"]);
        assert_eq!(presence[0].1, true);
        unsafe { std::env::remove_var("DUB_TEST_TRANSLATE_KEY") };
    }
}
