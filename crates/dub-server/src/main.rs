mod rate_limit;
mod server;
mod upload;
mod worker;

use anyhow::{Context, Result};
use clap::Parser;
use dub_core::engine::stt::RemoteSttEngine;
#[cfg(any(feature = "stt_local_cpu", feature = "stt_local_cuda"))]
use dub_core::engine::stt::WhisperLocalEngine;
use dub_core::engine::translate::{LocalTranslateEngine, RemoteTranslateEngine};
use dub_core::engine::tts::{LocalSubprocessTtsEngine, RemoteSynthesizeEngine};
use dub_core::evaluator::RemoteEvaluator;
use dub_core::{Config, EngineCatalog, EngineRegistry, JobManager, Orchestrator, OrchestratorConfig, ResourceGate};
use dub_protocol::{Capability, EngineKind, EngineSpec, Locality};
use rate_limit::RateLimiter;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use worker::WorkerPool;

const SUBPROCESS_DEADLINE_SECS: u64 = 600;

#[derive(Parser, Debug)]
#[command(name = "dub-server", about = "Video dubbing pipeline service")]
struct Cli {
    /// Path to a config.toml layered under compiled-in defaults and `DUB_`
    /// env vars.
    #[arg(long, env = "DUB_CONFIG_PATH")]
    config: Option<String>,

    /// Overrides the ffmpeg binary on PATH.
    #[arg(long, default_value = "ffmpeg")]
    ffmpeg_binary: String,
}

fn credential_env(name: &str) -> Option<String> {
    std::env::var(format!("DUB_{}", name.to_uppercase())).ok()
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;
    let config = Arc::new(config);

    std::fs::create_dir_all(&config.upload_dir).context("failed to create upload directory")?;
    std::fs::create_dir_all(&config.output_dir).context("failed to create output directory")?;
    let work_dir = std::env::temp_dir().join("dub-work");
    std::fs::create_dir_all(&work_dir).context("failed to create work directory")?;

    let (catalog, registry, available_credentials) = build_engines(&config, &work_dir);

    let job_manager = JobManager::new();
    let resource_gate = ResourceGate::new(Arc::new(|| {}));
    let orchestrator_config = OrchestratorConfig {
        ffmpeg_binary: cli.ffmpeg_binary.clone(),
        work_dir: work_dir.clone(),
        output_dir: config.output_dir.clone(),
        subprocess_deadline: Duration::from_secs(SUBPROCESS_DEADLINE_SECS),
        available_credentials,
    };
    let orchestrator = Arc::new(Orchestrator::new(
        job_manager.clone(),
        catalog,
        registry,
        resource_gate,
        orchestrator_config,
    ));

    let pool = WorkerPool::new(job_manager.clone(), Arc::clone(&orchestrator), config.worker_pool_size);
    let rate_limiter = Arc::new(RateLimiter::new(config.rate_limit_per_min, Duration::from_secs(60)));

    let state = server::AppState {
        config: Arc::clone(&config),
        job_manager,
        job_tx: pool.job_sender(),
        rate_limiter,
    };

    server::serve(state).await
}

fn build_engines(config: &Config, work_dir: &std::path::Path) -> (EngineCatalog, EngineRegistry, HashSet<String>) {
    let mut catalog = EngineCatalog::default();
    let mut registry = EngineRegistry::new();
    let mut available_credentials = HashSet::new();
    let deadline = Duration::from_secs(120);

    #[cfg(any(feature = "stt_local_cpu", feature = "stt_local_cuda"))]
    if let Some(model_path) = &config.whisper_model_path {
        let spec = EngineSpec::new(EngineKind::Stt, "stt_local", Locality::Local, false);
        registry.stt.insert(spec.id.clone(), Arc::new(WhisperLocalEngine::new(spec.clone(), model_path.as_str())));
        catalog.stt.push(spec);
    }

    if let Some(endpoint) = config.engine_endpoints.get("stt_remote") {
        let key = credential_env("stt_remote");
        let spec = EngineSpec::new(EngineKind::Stt, "stt_remote", Locality::Remote, key.is_some());
        if let Ok(engine) = RemoteSttEngine::new(spec.clone(), endpoint.clone(), key.clone(), deadline) {
            if key.is_some() {
                available_credentials.insert(spec.id.clone());
            }
            registry.stt.insert(spec.id.clone(), Arc::new(engine));
            catalog.stt.push(spec);
        }
    }

    for id in ["translate_primary", "translate_secondary"] {
        if let Some(endpoint) = config.engine_endpoints.get(id) {
            let key = credential_env(id);
            let spec = EngineSpec::new(EngineKind::Translate, id, Locality::Remote, key.is_some());
            if let Ok(engine) = RemoteTranslateEngine::new(spec.clone(), endpoint.clone(), key.clone(), deadline) {
                if key.is_some() {
                    available_credentials.insert(spec.id.clone());
                }
                registry.translate.insert(spec.id.clone(), Arc::new(engine));
                catalog.translate.push(spec);
            }
        }
    }
    let local_translate_spec = EngineSpec::new(EngineKind::Translate, "translate_local", Locality::Local, false);
    registry
        .translate
        .insert(local_translate_spec.id.clone(), Arc::new(LocalTranslateEngine::new(local_translate_spec.clone())));
    catalog.translate.push(local_translate_spec);

    if let Some(endpoint) = config.engine_endpoints.get("tts_remote") {
        let key = credential_env("tts_remote");
        let spec = EngineSpec::new(EngineKind::Tts, "tts_remote", Locality::Remote, key.is_some())
            .with_capability(Capability::VoiceCloning)
            .with_capability(Capability::HighAccuracy);
        if let Ok(engine) = RemoteSynthesizeEngine::new(spec.clone(), endpoint.clone(), key.clone(), deadline) {
            if key.is_some() {
                available_credentials.insert(spec.id.clone());
            }
            registry.tts.insert(spec.id.clone(), Arc::new(engine));
            catalog.tts.push(spec);
        }
    }
    if let Some(binary) = &config.tts_local_binary {
        let spec = EngineSpec::new(EngineKind::Tts, "tts_local", Locality::Local, false);
        registry
            .tts
            .insert(spec.id.clone(), Arc::new(LocalSubprocessTtsEngine::new(spec.clone(), binary.as_str(), work_dir, deadline)));
        catalog.tts.push(spec);
    }

    if let Some(endpoint) = config.engine_endpoints.get("evaluator") {
        let key = credential_env("evaluator");
        let spec = EngineSpec::new(EngineKind::Evaluate, "evaluator", Locality::Remote, key.is_some());
        if let Ok(engine) = RemoteEvaluator::new(spec.clone(), endpoint.clone(), key.clone(), deadline) {
            if key.is_some() {
                available_credentials.insert(spec.id.clone());
            }
            registry.evaluate.insert(spec.id.clone(), Arc::new(engine));
            catalog.evaluate.push(spec);
        }
    }

    (catalog, registry, available_credentials)
}
