use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::thread::JoinHandle;

use crate::analyze::{cluster_sessions, finish, remerge_metadata};
use crate::config::AnalysisConfig;
use crate::descriptor::assign_descriptors;
use crate::error::{AnalysisError, Result};
use crate::source::SessionSource;
use crate::store::{ClusterLabelStore, MetadataStore};
use crate::telemetry::Telemetry;
use crate::types::AnalysisOutput;

/// Eksterne signaler uten nyttelast ("beregn på nytt nå").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    SessionsUpdated,
    MetadataUpdated,
}

fn poisoned(what: &str) -> AnalysisError {
    AnalysisError::Storage(format!("{what} lock poisoned"))
}

/// Eier resultatsettet og sekvenserer omberegninger.
///
/// Hver full omberegning får et generasjonsnummer; bare den siste utløste får
/// publisere (siste trigger vinner). Les-så-skriv mot etikett-lageret går under
/// én mutex, så samtidige kjøringer kan ikke skrive over hverandres etiketter.
pub struct Orchestrator {
    source: Arc<dyn SessionSource>,
    metadata: Arc<dyn MetadataStore>,
    labels: Arc<dyn ClusterLabelStore>,
    config: AnalysisConfig,
    telemetry: Telemetry,
    generation: AtomicU64,
    /// Økes ved hver metadataendring; en full kjøring som leste eldre metadata
    /// fletter inn på nytt før publisering
    metadata_version: AtomicU64,
    subscribed: AtomicBool,
    label_lock: Mutex<()>,
    state: Mutex<AnalysisOutput>,
    /// Antall økter i siste vellykkede kjøring; nullstilles ved hver hendelse
    last_session_count: Mutex<Option<usize>>,
}

impl Orchestrator {
    pub fn new(
        source: Arc<dyn SessionSource>,
        metadata: Arc<dyn MetadataStore>,
        labels: Arc<dyn ClusterLabelStore>,
        config: AnalysisConfig,
    ) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            source,
            metadata,
            labels,
            config,
            telemetry: Telemetry::new()?,
            generation: AtomicU64::new(0),
            metadata_version: AtomicU64::new(0),
            subscribed: AtomicBool::new(false),
            label_lock: Mutex::new(()),
            state: Mutex::new(AnalysisOutput::default()),
            last_session_count: Mutex::new(None),
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    pub fn telemetry(&self) -> &Telemetry {
        &self.telemetry
    }

    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed.load(Ordering::SeqCst)
    }

    /// Øyeblikksbilde av resultatsettet.
    pub fn output(&self) -> Result<AnalysisOutput> {
        Ok(self.lock_state()?.clone())
    }

    pub fn last_session_count(&self) -> Option<usize> {
        self.last_session_count.lock().ok().and_then(|c| *c)
    }

    /// Første abonnent: kjør full omberegning.
    pub fn subscribe(&self) -> Result<()> {
        self.subscribed.store(true, Ordering::SeqCst);
        log::debug!("orchestrator: subscribe");
        self.recompute_full()
    }

    /// Abonnementet er slutt: kast resultatsettet og ugyldiggjør kjøringer i gang.
    pub fn unsubscribe(&self) -> Result<()> {
        self.subscribed.store(false, Ordering::SeqCst);
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.invalidate_cache();
        *self.lock_state()? = AnalysisOutput::default();
        log::debug!("orchestrator: unsubscribe, resultat forkastet");
        Ok(())
    }

    pub fn handle_event(&self, event: SessionEvent) -> Result<()> {
        self.invalidate_cache();
        if !self.is_subscribed() {
            log::debug!("orchestrator: {:?} ignorert uten abonnent", event);
            return Ok(());
        }
        match event {
            SessionEvent::SessionsUpdated => self.recompute_full(),
            SessionEvent::MetadataUpdated => self.recompute_metadata(),
        }
    }

    /// Full omberegning på kallerens tråd.
    pub fn recompute_full(&self) -> Result<()> {
        let generation = self.begin_full();
        self.complete_full(generation)
    }

    /// Full omberegning på en arbeidertråd. Generasjonen tildeles her, så
    /// rekkefølgen på triggere avgjør hvem som vinner.
    pub fn spawn_full_recompute(self: &Arc<Self>) -> JoinHandle<Result<()>> {
        let generation = self.begin_full();
        let this = Arc::clone(self);
        std::thread::spawn(move || this.complete_full(generation))
    }

    /// Lett omberegning etter metadataendring. No-op før første vellykkede kjøring.
    pub fn recompute_metadata(&self) -> Result<()> {
        self.metadata_version.fetch_add(1, Ordering::SeqCst);
        let metadata = self.metadata.all().map_err(|e| {
            log::warn!("orchestrator: metadata utilgjengelig: {e}");
            e
        })?;

        let mut state = self.lock_state()?;
        match remerge_metadata(&state, &metadata, &self.config) {
            Some(updated) => {
                *state = updated;
                self.telemetry.partial_recompute_total.inc();
                log::debug!("orchestrator: metadata flettet inn på nytt");
            }
            None => log::debug!("orchestrator: ingen tidligere kjøring, metadata-oppdatering hoppes over"),
        }
        Ok(())
    }

    fn begin_full(&self) -> u64 {
        self.telemetry.recompute_total.inc();
        self.generation.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn is_current(&self, generation: u64) -> bool {
        self.generation.load(Ordering::SeqCst) == generation
    }

    fn superseded(&self, generation: u64) -> AnalysisError {
        self.telemetry.recompute_superseded_total.inc();
        log::info!(
            "orchestrator: generasjon {generation} forkastet (nyeste er {})",
            self.generation()
        );
        AnalysisError::Superseded { generation }
    }

    fn complete_full(&self, generation: u64) -> Result<()> {
        let result = self.compute(generation);

        let mut state = self.lock_state()?;
        if !self.is_current(generation) {
            drop(state);
            return Err(match result {
                Err(e @ AnalysisError::Superseded { .. }) => e,
                _ => self.superseded(generation),
            });
        }

        match result {
            Ok((mut output, count, seen_version)) => {
                if self.metadata_version.load(Ordering::SeqCst) != seen_version {
                    let metadata = self.metadata.all()?;
                    if let Some(fresh) = remerge_metadata(&output, &metadata, &self.config) {
                        output = fresh;
                    }
                    log::debug!("orchestrator: generasjon {generation} fikk ny metadata underveis");
                }
                *state = output;
                drop(state);
                self.remember_count(count);
                log::info!("orchestrator: generasjon {generation} publisert ({count} økter)");
                Ok(())
            }
            Err(e @ AnalysisError::Superseded { .. }) => Err(e),
            Err(e) => {
                // forrige gyldige resultat beholdes
                state.error = Some(e.clone());
                self.telemetry.recompute_failed_total.inc();
                log::warn!("orchestrator: generasjon {generation} feilet: {e}");
                Err(e)
            }
        }
    }

    fn compute(&self, generation: u64) -> Result<(AnalysisOutput, usize, u64)> {
        let sessions = self.source.fetch_sessions()?;
        log::info!(
            "orchestrator: generasjon {generation} startet med {} økter",
            sessions.len()
        );
        if !self.is_current(generation) {
            return Err(self.superseded(generation));
        }

        let seen_version = self.metadata_version.load(Ordering::SeqCst);
        let metadata = self.metadata.all()?;
        let run = cluster_sessions(&sessions, &metadata, &self.config)?;
        if !self.is_current(generation) {
            return Err(self.superseded(generation));
        }

        let outcome = {
            let _guard = self.label_lock.lock().map_err(|_| poisoned("label"))?;
            assign_descriptors(&run.points, self.labels.as_ref(), self.config.felt_harder_weight)?
        };
        self.telemetry.label_store_hit_total.inc_by(outcome.reused as u64);
        self.telemetry.label_store_miss_total.inc_by(outcome.written as u64);

        Ok((finish(run, &outcome, &self.config), sessions.len(), seen_version))
    }

    fn lock_state(&self) -> Result<MutexGuard<'_, AnalysisOutput>> {
        self.state.lock().map_err(|_| poisoned("state"))
    }

    fn invalidate_cache(&self) {
        if let Ok(mut c) = self.last_session_count.lock() {
            *c = None;
        }
    }

    fn remember_count(&self, count: usize) {
        if let Ok(mut c) = self.last_session_count.lock() {
            *c = Some(count);
        }
        self.telemetry.sessions.set(count as i64);
    }
}
