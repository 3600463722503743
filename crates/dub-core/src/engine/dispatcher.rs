//! Resolves which concrete engine handles a stage for a job, and the
//! fallback order to try them in. Never performs a call
//! itself — it only hands back an ordered list of `EngineSpec`.

use dub_protocol::{Capability, EngineKind, EngineSpec, JobSettings, Locality};
use std::collections::HashSet;

/// The catalog of engines the dispatcher is allowed to choose from,
/// assembled by the caller (normally from `Config`) at startup.
#[derive(Debug, Clone, Default)]
pub struct EngineCatalog {
    pub stt: Vec<EngineSpec>,
    pub translate: Vec<EngineSpec>,
    pub tts: Vec<EngineSpec>,
    pub evaluate: Vec<EngineSpec>,
}

/// Languages for which a configured remote STT fast-path is preferred
/// over the local model
const STT_REMOTE_FAST_LANGS: &[&str] = &["en", "ru"];

/// Languages for which the local large model is preferred (explicit list,
/// plus the `auto` detection sentinel).
const STT_LOCAL_PREFERRED_LANGS: &[&str] = &["ko", "ja", "zh"];

/// Target languages whose static TTS table entry favors a non-cloning
/// neural voice over a cloning-capable one, when clone_voice is off.
const TTS_NON_CLONING_PREFERRED_LANGS: &[&str] = &["ko", "ru"];

pub struct Dispatcher<'a> {
    catalog: &'a EngineCatalog,
}

impl<'a> Dispatcher<'a> {
    pub fn new(catalog: &'a EngineCatalog) -> Self {
        Self { catalog }
    }

    /// `available_credentials` holds the engine ids for which credentials
    /// are configured; an engine with `credentials_required == true` not in
    /// this set is skipped entirely.
    pub fn resolve(
        &self,
        kind: EngineKind,
        settings: &JobSettings,
        available_credentials: &HashSet<String>,
    ) -> Vec<EngineSpec> {
        match kind {
            EngineKind::Stt => self.resolve_stt(settings, available_credentials),
            EngineKind::Translate => self.resolve_translate(available_credentials),
            EngineKind::Tts => self.resolve_tts(settings, available_credentials),
            EngineKind::Evaluate => self.available(&self.catalog.evaluate, available_credentials),
        }
    }

    fn available(&self, specs: &[EngineSpec], available_credentials: &HashSet<String>) -> Vec<EngineSpec> {
        specs
            .iter()
            .filter(|s| !s.credentials_required || available_credentials.contains(&s.id))
            .cloned()
            .collect()
    }

    fn resolve_stt(&self, settings: &JobSettings, available_credentials: &HashSet<String>) -> Vec<EngineSpec> {
        let usable = self.available(&self.catalog.stt, available_credentials);
        let lang = settings.source_lang.as_str();

        let mut ordered = Vec::new();
        if STT_REMOTE_FAST_LANGS.contains(&lang) {
            ordered.extend(usable.iter().filter(|s| s.locality == Locality::Remote).cloned());
            ordered.extend(usable.iter().filter(|s| s.locality == Locality::Local).cloned());
        } else if STT_LOCAL_PREFERRED_LANGS.contains(&lang) || lang == "auto" {
            ordered.extend(usable.iter().filter(|s| s.locality == Locality::Local).cloned());
            ordered.extend(usable.iter().filter(|s| s.locality == Locality::Remote).cloned());
        } else {
            ordered = usable;
        }
        ordered
    }

    fn resolve_translate(&self, available_credentials: &HashSet<String>) -> Vec<EngineSpec> {
        // Chain order is fixed: primary remote, secondary remote, local
        //. Retry-with-backoff-before-advancing is the caller's
        // job (dispatcher only orders, it never waits or calls).
        let usable = self.available(&self.catalog.translate, available_credentials);
        let mut remotes: Vec<EngineSpec> = usable
            .iter()
            .filter(|s| s.locality == Locality::Remote)
            .cloned()
            .collect();
        let mut locals: Vec<EngineSpec> = usable
            .iter()
            .filter(|s| s.locality == Locality::Local)
            .cloned()
            .collect();
        remotes.append(&mut locals);
        remotes
    }

    fn resolve_tts(&self, settings: &JobSettings, available_credentials: &HashSet<String>) -> Vec<EngineSpec> {
        let usable = self.available(&self.catalog.tts, available_credentials);

        if settings.clone_voice {
            let mut cloning: Vec<EngineSpec> = usable
                .iter()
                .filter(|s| s.has_capability(Capability::VoiceCloning))
                .cloned()
                .collect();
            let mut rest: Vec<EngineSpec> = usable
                .iter()
                .filter(|s| !s.has_capability(Capability::VoiceCloning))
                .cloned()
                .collect();
            cloning.append(&mut rest);
            return cloning;
        }

        let top_tier_remote = usable
            .iter()
            .find(|s| s.locality == Locality::Remote && s.has_capability(Capability::HighAccuracy));
        if let Some(spec) = top_tier_remote {
            let mut ordered = vec![spec.clone()];
            ordered.extend(usable.iter().filter(|s| s.id != spec.id).cloned());
            return ordered;
        }

        let lang = settings.target_lang.as_str();
        let prefer_non_cloning = TTS_NON_CLONING_PREFERRED_LANGS.contains(&lang);
        let mut primary: Vec<EngineSpec> = usable
            .iter()
            .filter(|s| s.has_capability(Capability::VoiceCloning) != prefer_non_cloning)
            .cloned()
            .collect();
        let mut rest: Vec<EngineSpec> = usable
            .iter()
            .filter(|s| s.has_capability(Capability::VoiceCloning) == prefer_non_cloning)
            .cloned()
            .collect();
        primary.append(&mut rest);
        primary
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dub_protocol::SyncMode;

    fn settings(source_lang: &str, target_lang: &str, clone_voice: bool) -> JobSettings {
        JobSettings {
            source_lang: source_lang.into(),
            target_lang: target_lang.into(),
            clone_voice,
            verify_translation: false,
            sync_mode: SyncMode::SpeedSync,
            stt_engine: Default::default(),
            translation_engine: Default::default(),
            tts_engine: Default::default(),
        }
    }

    fn catalog() -> EngineCatalog {
        EngineCatalog {
            stt: vec![
                EngineSpec::new(EngineKind::Stt, "stt-remote", Locality::Remote, true),
                EngineSpec::new(EngineKind::Stt, "stt-local", Locality::Local, false),
            ],
            translate: vec![
                EngineSpec::new(EngineKind::Translate, "translate-primary", Locality::Remote, true),
                EngineSpec::new(EngineKind::Translate, "translate-secondary", Locality::Remote, true),
                EngineSpec::new(EngineKind::Translate, "translate-local", Locality::Local, false),
            ],
            tts: vec![
                EngineSpec::new(EngineKind::Tts, "tts-cloning", Locality::Remote, true)
                    .with_capability(Capability::VoiceCloning),
                EngineSpec::new(EngineKind::Tts, "tts-neural", Locality::Local, false),
            ],
            evaluate: vec![],
        }
    }

    #[test]
    fn stt_prefers_remote_for_english() {
        let catalog = catalog();
        let dispatcher = Dispatcher::new(&catalog);
        let mut creds = HashSet::new();
        creds.insert("stt-remote".to_string());
        let order = dispatcher.resolve(EngineKind::Stt, &settings("en", "es", false), &creds);
        assert_eq!(order[0].id, "stt-remote");
    }

    #[test]
    fn stt_prefers_local_for_korean() {
        let catalog = catalog();
        let dispatcher = Dispatcher::new(&catalog);
        let mut creds = HashSet::new();
        creds.insert("stt-remote".to_string());
        let order = dispatcher.resolve(EngineKind::Stt, &settings("ko", "en", false), &creds);
        assert_eq!(order[0].id, "stt-local");
    }

    #[test]
    fn stt_skips_engines_without_credentials() {
        let catalog = catalog();
        let dispatcher = Dispatcher::new(&catalog);
        let creds = HashSet::new();
        let order = dispatcher.resolve(EngineKind::Stt, &settings("en", "es", false), &creds);
        assert_eq!(order.len(), 1);
        assert_eq!(order[0].id, "stt-local");
    }

    #[test]
    fn translate_chain_is_primary_then_secondary_then_local() {
        let catalog = catalog();
        let dispatcher = Dispatcher::new(&catalog);
        let mut creds = HashSet::new();
        creds.insert("translate-primary".to_string());
        creds.insert("translate-secondary".to_string());
        let order = dispatcher.resolve(EngineKind::Translate, &settings("en", "es", false), &creds);
        let ids: Vec<&str> = order.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["translate-primary", "translate-secondary", "translate-local"]);
    }

    #[test]
    fn tts_clone_voice_on_prefers_cloning_engine() {
        let catalog = catalog();
        let dispatcher = Dispatcher::new(&catalog);
        let mut creds = HashSet::new();
        creds.insert("tts-cloning".to_string());
        let order = dispatcher.resolve(EngineKind::Tts, &settings("en", "ko", true), &creds);
        assert_eq!(order[0].id, "tts-cloning");
    }

    #[test]
    fn tts_clone_voice_off_honors_top_tier_remote_credential() {
        let catalog = EngineCatalog {
            tts: vec![
                EngineSpec::new(EngineKind::Tts, "tts-top-remote", Locality::Remote, true)
                    .with_capability(Capability::HighAccuracy),
                EngineSpec::new(EngineKind::Tts, "tts-neural", Locality::Local, false),
            ],
            ..catalog()
        };
        let dispatcher = Dispatcher::new(&catalog);
        let mut creds = HashSet::new();
        creds.insert("tts-top-remote".to_string());
        let order = dispatcher.resolve(EngineKind::Tts, &settings("en", "ko", false), &creds);
        assert_eq!(order[0].id, "tts-top-remote");
    }
}
