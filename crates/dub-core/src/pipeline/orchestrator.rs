//! Drives one job through every pipeline stage, updating `JobManager` as
//! it goes and deciding retry/fallback/fail per `FailureKind`.

use super::registry::EngineRegistry;
use crate::audio::{assemble, extract_audio, mux};
use crate::engine::{Dispatcher, EngineCatalog};
use crate::job::JobManager;
use crate::resource_gate::ResourceGate;
use crate::translate::{chunk_transcript, refine_chunk};
use dub_common::{DubError, FailureKind, Result};
use dub_protocol::{EngineKind, JobId, JobSettings, JobStatus, PipelineStage, Segment, SynthesizedSegment, Transcript};
use log::{error, info, warn};
use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

pub struct OrchestratorConfig {
    pub ffmpeg_binary: String,
    pub work_dir: PathBuf,
    pub output_dir: String,
    pub subprocess_deadline: Duration,
    pub available_credentials: HashSet<String>,
}

pub struct Orchestrator {
    job_manager: JobManager,
    catalog: EngineCatalog,
    registry: EngineRegistry,
    resource_gate: ResourceGate,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(
        job_manager: JobManager,
        catalog: EngineCatalog,
        registry: EngineRegistry,
        resource_gate: ResourceGate,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            job_manager,
            catalog,
            registry,
            resource_gate,
            config,
        }
    }

    pub async fn run_job(&self, id: JobId, settings: JobSettings) {
        self.job_manager
            .update_status(id, JobStatus::Processing)
            .await
            .ok();

        if let Err(e) = self.run_stages(id, &settings).await {
            if e.classify() == FailureKind::Cancelled {
                self.job_manager.update_status(id, JobStatus::Cancelled).await.ok();
                info!("job {id} cancelled");
            } else {
                error!("job {id} failed: {e}");
                self.job_manager.append_log(id, format!("failed: {e}")).await.ok();
                self.job_manager.update_status(id, JobStatus::Failed).await.ok();
            }
        }
    }

    async fn check_cancelled(&self, id: JobId) -> Result<()> {
        if self.job_manager.is_cancelled(id).await.unwrap_or(false) {
            return Err(DubError::Cancelled);
        }
        Ok(())
    }

    async fn report_progress(&self, id: JobId, verify_enabled: bool, completed: &[PipelineStage]) {
        let total: u32 = PipelineStage::ordered(verify_enabled).iter().map(|s| s.weight(verify_enabled)).sum();
        let done: u32 = completed.iter().map(|s| s.weight(verify_enabled)).sum();
        if total == 0 {
            return;
        }
        let percent = ((done as f64 / total as f64) * 100.0) as u8;
        self.job_manager.set_progress(id, percent).await.ok();
    }

    async fn run_stages(&self, id: JobId, settings: &JobSettings) -> Result<()> {
        let verify_enabled = settings.verify_translation;
        let mut completed_stages = Vec::new();
        let input_path = PathBuf::from(self.job_manager.input_path(id).await?);

        // --- Extract ---
        self.check_cancelled(id).await?;
        self.job_manager.set_stage(id, PipelineStage::Extract).await.ok();
        let audio_path = self.config.work_dir.join(format!("{id}-audio.wav"));
        extract_audio(&input_path, &audio_path, &self.config.ffmpeg_binary, self.config.subprocess_deadline).await?;
        completed_stages.push(PipelineStage::Extract);
        self.report_progress(id, verify_enabled, &completed_stages).await;

        // --- Transcribe ---
        self.check_cancelled(id).await?;
        self.job_manager.set_stage(id, PipelineStage::Transcribe).await.ok();
        let transcript = self.transcribe(id, settings, &audio_path).await?;
        completed_stages.push(PipelineStage::Transcribe);
        self.report_progress(id, verify_enabled, &completed_stages).await;

        // --- Translate (+ Verify) ---
        self.check_cancelled(id).await?;
        self.job_manager.set_stage(id, PipelineStage::Translate).await.ok();
        let mut chunks = chunk_transcript(&transcript);
        let translate_engines = self.resolve_translate_engines(settings);
        let evaluators = self.resolve_evaluators();

        for chunk in chunks.iter_mut() {
            self.check_cancelled(id).await?;
            let report = refine_chunk(
                chunk,
                &translate_engines,
                &evaluators,
                &settings.source_lang,
                &settings.target_lang,
                settings.sync_mode,
                verify_enabled,
            )
            .await?;
            if let Some(report) = report {
                self.job_manager.set_quality_report(id, report).await.ok();
            }
        }
        completed_stages.push(PipelineStage::Translate);
        self.report_progress(id, verify_enabled, &completed_stages).await;
        if verify_enabled {
            self.job_manager.set_stage(id, PipelineStage::Verify).await.ok();
            completed_stages.push(PipelineStage::Verify);
            self.report_progress(id, verify_enabled, &completed_stages).await;
        }

        // --- Synthesize ---
        self.check_cancelled(id).await?;
        self.job_manager.set_stage(id, PipelineStage::Synthesize).await.ok();
        let synthesized = self.synthesize(id, settings, &chunks, &transcript).await?;
        completed_stages.push(PipelineStage::Synthesize);
        self.report_progress(id, verify_enabled, &completed_stages).await;

        // --- Merge ---
        self.check_cancelled(id).await?;
        self.job_manager.set_stage(id, PipelineStage::Merge).await.ok();
        let windows: Vec<(f64, f64)> = transcript.segments.iter().map(|s| (s.start_seconds, s.end_seconds)).collect();
        let assembled = assemble(&synthesized, &windows, settings.sync_mode, 22_050, None)?;
        let assembled_path = self.config.work_dir.join(format!("{id}-assembled.wav"));
        write_wav(&assembled_path, &assembled.samples, assembled.sample_rate)?;

        let out_path = PathBuf::from(&self.config.output_dir).join(format!("{id}.mp4"));
        mux::mux(
            &input_path,
            &assembled_path,
            &out_path,
            assembled.video_stretch_factor,
            &self.config.ffmpeg_binary,
            self.config.subprocess_deadline,
        )
        .await?;
        completed_stages.push(PipelineStage::Merge);
        self.report_progress(id, verify_enabled, &completed_stages).await;

        self.job_manager
            .set_output(id, out_path.to_string_lossy().into_owned())
            .await
            .ok();
        self.job_manager.update_status(id, JobStatus::Completed).await.ok();
        Ok(())
    }

    async fn transcribe(&self, id: JobId, settings: &JobSettings, audio_path: &std::path::Path) -> Result<Transcript> {
        let dispatcher = Dispatcher::new(&self.catalog);
        let specs = dispatcher.resolve(EngineKind::Stt, settings, &self.config.available_credentials);
        if specs.is_empty() {
            return Err(DubError::EnginesExhausted("stt".into()));
        }

        let mut last_err = None;
        for spec in specs {
            let Some(engine) = self.registry.stt.get(&spec.id).cloned() else {
                continue;
            };
            let needs_gate = spec.locality == dub_protocol::Locality::Local;
            let _guard = if needs_gate {
                let cancelled_now = self.job_manager.is_cancelled(id).await.unwrap_or(false);
                Some(self.resource_gate.acquire("stt", || cancelled_now).await?)
            } else {
                None
            };

            match engine
                .transcribe(audio_path, Some(settings.source_lang.as_str()).filter(|l| *l != "auto"))
                .await
            {
                Ok(segments) => {
                    let transcript = Transcript { segments };
                    transcript.validate()?;
                    return Ok(transcript);
                }
                Err(e) => {
                    warn!("stt engine {} failed: {e}", spec.id);
                    last_err = Some(e);
                }
            }
        }
        Err(last_err.unwrap_or_else(|| DubError::EnginesExhausted("stt".into())))
    }

    fn resolve_translate_engines(&self, settings: &JobSettings) -> Vec<Arc<dyn crate::engine::TranslateEngine>> {
        let dispatcher = Dispatcher::new(&self.catalog);
        dispatcher
            .resolve(EngineKind::Translate, settings, &self.config.available_credentials)
            .into_iter()
            .filter_map(|spec| self.registry.translate.get(&spec.id).cloned())
            .collect()
    }

    fn resolve_evaluators(&self) -> Vec<Arc<dyn crate::engine::Evaluator>> {
        self.registry.evaluate.values().cloned().collect()
    }

    async fn synthesize(
        &self,
        id: JobId,
        settings: &JobSettings,
        chunks: &[dub_protocol::TranslationChunk],
        transcript: &Transcript,
    ) -> Result<Vec<SynthesizedSegment>> {
        let dispatcher = Dispatcher::new(&self.catalog);
        let specs = dispatcher.resolve(EngineKind::Tts, settings, &self.config.available_credentials);
        if specs.is_empty() {
            return Err(DubError::EnginesExhausted("tts".into()));
        }

        let mut out = Vec::with_capacity(transcript.segments.len());
        for chunk in chunks {
            for (offset, &segment_index) in chunk.segment_indices.iter().enumerate() {
                self.check_cancelled(id).await?;
                let text = chunk
                    .translated_texts
                    .get(offset)
                    .cloned()
                    .unwrap_or_else(|| chunk.original_texts[offset].clone());

                let mut last_err = None;
                let mut synthesized = None;
                for spec in &specs {
                    let Some(engine) = self.registry.tts.get(&spec.id).cloned() else {
                        continue;
                    };
                    let needs_gate = spec.locality == dub_protocol::Locality::Local;
                    let _guard = if needs_gate {
                        let cancelled_now = self.job_manager.is_cancelled(id).await.unwrap_or(false);
                        Some(self.resource_gate.acquire("tts", || cancelled_now).await?)
                    } else {
                        None
                    };
                    match engine.synthesize(segment_index, &text, &settings.target_lang, None).await {
                        Ok(seg) => {
                            synthesized = Some(seg);
                            break;
                        }
                        Err(e) => {
                            warn!("tts engine {} failed: {e}", spec.id);
                            last_err = Some(e);
                        }
                    }
                }

                match synthesized {
                    Some(seg) => out.push(seg),
                    None => {
                        warn!("segment {segment_index} fell back to silence after all TTS engines failed");
                        out.push(silence_substitute(segment_index, &transcript.segments[segment_index]));
                        let _ = last_err;
                    }
                }
            }
        }
        Ok(out)
    }
}

fn silence_substitute(segment_index: usize, segment: &Segment) -> SynthesizedSegment {
    let duration = segment.duration().max(0.1);
    let sample_rate = 22_050u32;
    let sample_count = (duration * sample_rate as f64) as usize;
    SynthesizedSegment {
        segment_index,
        audio_bytes: vec![0u8; sample_count * 2],
        duration_seconds: duration,
        sample_rate,
        channels: 1,
        is_silence_substitute: true,
    }
}

fn write_wav(path: &std::path::Path, samples: &[i16], sample_rate: u32) -> Result<()> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}
