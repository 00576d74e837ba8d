mod common;

use std::collections::BTreeMap;
use std::sync::mpsc;
use std::sync::{Arc, Mutex};

use runmap_core::error::Result;
use runmap_core::{
    AnalysisConfig, AnalysisError, InMemoryLabelStore, InMemoryMetadataStore, MetadataStore,
    Orchestrator, RawSession, SessionEvent, SessionId, SessionMeta, SessionSource,
    StaticSessionSource,
};

use common::{fixture_sessions, reference_session};

/// Kilde som kan holde igjen ett kall til testen slipper det.
struct GatedSource {
    sessions: Vec<RawSession>,
    gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

impl SessionSource for GatedSource {
    fn fetch_sessions(&self) -> Result<Vec<RawSession>> {
        let armed = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = armed {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }
        Ok(self.sessions.clone())
    }
}

/// Metadatalager der ett `all()`-kall leser verdiene og så venter på testen.
struct GatedMetadata {
    inner: InMemoryMetadataStore,
    gate: Mutex<Option<(mpsc::Sender<()>, mpsc::Receiver<()>)>>,
}

impl MetadataStore for GatedMetadata {
    fn get(&self, id: SessionId) -> Result<SessionMeta> {
        self.inner.get(id)
    }

    fn set(&self, id: SessionId, meta: SessionMeta) -> Result<()> {
        self.inner.set(id, meta)
    }

    fn all(&self) -> Result<BTreeMap<SessionId, SessionMeta>> {
        let snapshot = self.inner.all()?;
        let armed = self.gate.lock().unwrap().take();
        if let Some((entered, release)) = armed {
            entered.send(()).unwrap();
            release.recv().unwrap();
        }
        Ok(snapshot)
    }
}

fn orchestrator_with(source: Arc<dyn SessionSource>, cfg: AnalysisConfig) -> Orchestrator {
    Orchestrator::new(
        source,
        Arc::new(InMemoryMetadataStore::new()),
        Arc::new(InMemoryLabelStore::new()),
        cfg,
    )
    .unwrap()
}

#[test]
fn newer_trigger_supersedes_in_flight_recompute() {
    let src = Arc::new(GatedSource { sessions: fixture_sessions(), gate: Mutex::new(None) });
    let orch = Arc::new(orchestrator_with(src.clone(), AnalysisConfig::default()));
    orch.subscribe().unwrap();
    assert_eq!(orch.generation(), 1);

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    *src.gate.lock().unwrap() = Some((entered_tx, release_rx));

    let slow = orch.spawn_full_recompute();
    entered_rx.recv().unwrap();

    // Ny trigger mens den første venter på data
    orch.handle_event(SessionEvent::SessionsUpdated).unwrap();
    release_tx.send(()).unwrap();

    let result = slow.join().unwrap();
    assert_eq!(result, Err(AnalysisError::Superseded { generation: 2 }));

    let out = orch.output().unwrap();
    assert!(out.error.is_none(), "forkastet kjøring skal ikke sette error");
    assert_eq!(out.sessions.map(|s| s.len()), Some(24));
    assert_eq!(orch.telemetry().recompute_superseded_total.get(), 1);
    assert_eq!(orch.telemetry().recompute_total.get(), 3);
}

#[test]
fn three_sessions_three_clusters_are_singletons() {
    let sessions = vec![
        reference_session(1, "2024-03-01", 6.0),
        reference_session(2, "2024-03-02", 7.5),
        reference_session(3, "2024-03-03", 6.4),
    ];
    let orch = orchestrator_with(Arc::new(StaticSessionSource::new(sessions)), AnalysisConfig::default());
    orch.subscribe().unwrap();

    let points = orch.output().unwrap().sessions.unwrap();
    let mut clusters: Vec<usize> = points.iter().map(|p| p.cluster).collect();
    clusters.sort_unstable();
    assert_eq!(clusters, vec![0, 1, 2]);
    assert!(points.iter().all(|p| p.distance_to_centroid == 0.0));
}

#[test]
fn fewer_sessions_than_k_fails_closed() {
    let sessions = vec![
        reference_session(1, "2024-03-01", 6.0),
        reference_session(2, "2024-03-02", 7.5),
        reference_session(3, "2024-03-03", 6.4),
    ];
    let cfg = AnalysisConfig { k: 5, ..Default::default() };
    let orch = orchestrator_with(Arc::new(StaticSessionSource::new(sessions)), cfg);

    let err = orch.subscribe().unwrap_err();
    assert_eq!(
        err,
        AnalysisError::DegenerateInput { sessions: 3, required: 5, stage: "clustering" }
    );
    let out = orch.output().unwrap();
    assert!(out.sessions.is_none(), "k skal ikke klemmes ned");
    assert_eq!(out.error, Some(err));
}

#[test]
fn fetch_failure_keeps_stale_output() {
    struct Flaky {
        ok: Mutex<bool>,
    }
    impl SessionSource for Flaky {
        fn fetch_sessions(&self) -> Result<Vec<RawSession>> {
            if *self.ok.lock().unwrap() {
                Ok(fixture_sessions())
            } else {
                Err(AnalysisError::Fetch("upstream 503".into()))
            }
        }
    }

    let src = Arc::new(Flaky { ok: Mutex::new(true) });
    let orch = orchestrator_with(src.clone(), AnalysisConfig::default());
    orch.subscribe().unwrap();
    let before = orch.output().unwrap().sessions.unwrap();

    *src.ok.lock().unwrap() = false;
    let err = orch.handle_event(SessionEvent::SessionsUpdated).unwrap_err();
    assert!(matches!(err, AnalysisError::Fetch(_)));

    let out = orch.output().unwrap();
    assert_eq!(out.sessions.unwrap(), before);
    assert_eq!(out.error, Some(err));

    // Neste vellykkede kjøring fjerner feilen
    *src.ok.lock().unwrap() = true;
    orch.handle_event(SessionEvent::SessionsUpdated).unwrap();
    assert!(orch.output().unwrap().error.is_none());
}

#[test]
fn metadata_change_only_touches_overlay_and_aggregates() {
    let meta = Arc::new(InMemoryMetadataStore::new());
    let orch = Orchestrator::new(
        Arc::new(StaticSessionSource::new(fixture_sessions())),
        meta.clone(),
        Arc::new(InMemoryLabelStore::new()),
        AnalysisConfig::default(),
    )
    .unwrap();
    orch.subscribe().unwrap();
    let before = orch.output().unwrap();

    // Merk alle gode økter som falske positiver: trenden skal falle
    for p in before.sessions.as_ref().unwrap().iter().filter(|p| p.good) {
        meta.set(p.id, SessionMeta { is_false_positive: true, ..Default::default() }).unwrap();
    }
    orch.handle_event(SessionEvent::MetadataUpdated).unwrap();
    let after = orch.output().unwrap();

    let (b, a) = (before.sessions.unwrap(), after.sessions.unwrap());
    for (p, q) in b.iter().zip(a.iter()) {
        assert_eq!((p.x, p.y, p.cluster), (q.x, q.y, q.cluster), "økt {}", p.id);
        assert_eq!(p.descriptor, q.descriptor);
        assert_eq!(q.is_false_positive, p.good);
    }
    assert_eq!(before.centroids, after.centroids);
    assert!(after.trend.unwrap().iter().all(|t| t.ratio == 0.0));
}

#[test]
fn metadata_change_during_full_recompute_is_not_lost() {
    let meta = Arc::new(GatedMetadata { inner: InMemoryMetadataStore::new(), gate: Mutex::new(None) });
    let orch = Arc::new(
        Orchestrator::new(
            Arc::new(StaticSessionSource::new(fixture_sessions())),
            meta.clone(),
            Arc::new(InMemoryLabelStore::new()),
            AnalysisConfig::default(),
        )
        .unwrap(),
    );
    orch.subscribe().unwrap();

    let (entered_tx, entered_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();
    *meta.gate.lock().unwrap() = Some((entered_tx, release_rx));

    // Full kjøring har lest gammel metadata og venter
    let full = orch.spawn_full_recompute();
    entered_rx.recv().unwrap();

    meta.set(5, SessionMeta { is_false_positive: true, ..Default::default() }).unwrap();
    orch.handle_event(SessionEvent::MetadataUpdated).unwrap();
    let flagged = |o: &Orchestrator| {
        o.output().unwrap().sessions.unwrap().iter().find(|p| p.id == 5).unwrap().is_false_positive
    };
    assert!(flagged(orch.as_ref()), "lett omberegning skal vise flagget");

    release_tx.send(()).unwrap();
    full.join().unwrap().unwrap();

    assert!(meta.get(5).unwrap().is_false_positive);
    assert!(flagged(orch.as_ref()), "full kjøring publiserte gammel metadata over ny");
}
