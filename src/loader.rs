//! The project loader: obtains the descriptor (network or archive), builds
//! the object graph and thread stacks, then kicks off asset materialization
//! and instrument-bank loading in the background.
//!
//! The returned [`LoadedProject`] is the ready-to-start signal: graph and
//! threads are complete the moment it exists, while sounds, costumes and
//! instruments keep landing asynchronously. Callers poll the monotonic
//! loaded counters, or await [`LoadedProject::join_assets`] /
//! [`LoadedProject::join_all`] for a deterministic barrier that reports every
//! failed asset.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc,
};

use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::{
    archive::ProjectArchive,
    config::LoaderConfig,
    descriptor::ProjectDescriptor,
    error::{StageError, StageResult},
    fetch::Fetch,
    graph::{CostumeAsset, RuntimeObjectGraph, SoundAsset},
    instruments::InstrumentTable,
    resolve::AssetResolver,
    sound::decode_sound,
    threads::attach_threads,
};

/// One loader session: fetch capability plus endpoint/audio configuration.
///
/// All state lives in this value; nothing is process-global. The asset
/// backend is chosen per project: archive-loaded projects resolve every asset
/// from the archive, network-loaded projects from the remote service.
#[derive(Clone)]
pub struct ProjectLoader {
    fetch: Arc<dyn Fetch>,
    config: Arc<LoaderConfig>,
}

impl ProjectLoader {
    /// Build a session from a fetch capability and configuration.
    pub fn new(fetch: Arc<dyn Fetch>, config: LoaderConfig) -> Self {
        Self {
            fetch,
            config: Arc::new(config),
        }
    }

    /// Session configuration.
    pub fn config(&self) -> &LoaderConfig {
        &self.config
    }

    /// Fetch and parse the descriptor for `project_id`, then initialize.
    ///
    /// Transport and parse failures are returned as typed errors; no partial
    /// graph is ever exposed.
    pub async fn load_from_network(&self, project_id: u64) -> StageResult<LoadedProject> {
        let url = self.config.project_url(project_id);
        let bytes = self.fetch.fetch_bytes(&url).await.inspect_err(|e| {
            error!(%url, error = %e, "descriptor fetch failed");
        })?;
        let descriptor = ProjectDescriptor::from_json_bytes(&bytes).inspect_err(|e| {
            error!(%url, error = %e, "descriptor parse failed");
        })?;

        let resolver = AssetResolver::remote(Arc::clone(&self.fetch), Arc::clone(&self.config));
        self.init_project(descriptor, resolver)
    }

    /// Open a packaged project and initialize from its bundled descriptor.
    pub async fn load_from_archive(&self, bytes: &[u8]) -> StageResult<LoadedProject> {
        let archive = Arc::new(ProjectArchive::open(bytes)?);
        let descriptor = ProjectDescriptor::from_json_bytes(archive.descriptor_bytes()?)
            .inspect_err(|e| error!(error = %e, "packaged descriptor parse failed"))?;

        let resolver = AssetResolver::archive(archive);
        self.init_project(descriptor, resolver)
    }

    /// Strict initialization sequence: build graph, attach threads, spawn
    /// asset materialization, kick off instrument loading (not awaited),
    /// return the start signal.
    fn init_project(
        &self,
        descriptor: ProjectDescriptor,
        resolver: AssetResolver,
    ) -> StageResult<LoadedProject> {
        let mut graph = RuntimeObjectGraph::build(&descriptor)?;
        attach_threads(&mut graph)?;

        let rate = self.config.sample_rate;
        let mut tasks = Vec::new();

        let stage_counter = graph.stage.loaded_counter();
        for sound in &graph.stage.sounds {
            spawn_sound_task(sound, &stage_counter, &resolver, rate, &mut tasks);
        }
        for costume in &graph.stage.costumes {
            spawn_costume_task(costume, &resolver, &mut tasks);
        }
        for sprite in &graph.sprites {
            let counter = sprite.loaded_counter();
            for sound in &sprite.sounds {
                spawn_sound_task(sound, &counter, &resolver, rate, &mut tasks);
            }
            for costume in &sprite.costumes {
                spawn_costume_task(costume, &resolver, &mut tasks);
            }
        }

        // Instrument loading is fire-and-forget: playback may begin before
        // the bank finishes.
        let instruments = Arc::new(InstrumentTable::new());
        let instrument_task = {
            let table = Arc::clone(&instruments);
            let fetch = Arc::clone(&self.fetch);
            let config = Arc::clone(&self.config);
            tokio::spawn(async move { table.load_all(fetch, config).await })
        };

        info!(
            sprites = graph.sprites.len(),
            reporters = graph.reporters.len(),
            sounds = graph.sound_count(),
            costumes = graph.costume_count(),
            archive = resolver.is_archive(),
            "project graph ready, execution may start"
        );

        Ok(LoadedProject {
            graph,
            instruments,
            tasks,
            instrument_task: Some(instrument_task),
        })
    }
}

fn spawn_sound_task(
    asset: &Arc<SoundAsset>,
    counter: &Arc<AtomicUsize>,
    resolver: &AssetResolver,
    rate: u32,
    tasks: &mut Vec<(String, JoinHandle<StageResult<()>>)>,
) {
    let asset = Arc::clone(asset);
    let counter = Arc::clone(counter);
    let resolver = resolver.clone();
    let label = format!("sound '{}'", asset.name);
    let handle = tokio::spawn(async move {
        let bytes = resolver.resolve(&asset.reference).await?;
        let buffer = decode_sound(&bytes, rate)?;
        if asset.install(buffer) {
            counter.fetch_add(1, Ordering::Release);
        }
        Ok(())
    });
    tasks.push((label, handle));
}

fn spawn_costume_task(
    asset: &Arc<CostumeAsset>,
    resolver: &AssetResolver,
    tasks: &mut Vec<(String, JoinHandle<StageResult<()>>)>,
) {
    let asset = Arc::clone(asset);
    let resolver = resolver.clone();
    let label = format!("costume '{}'", asset.name);
    let handle = tokio::spawn(async move {
        let payload = resolver.resolve_costume(&asset.reference).await?;
        asset.install(payload);
        Ok(())
    });
    tasks.push((label, handle));
}

/// A loaded project: the populated graph plus handles to the asset work
/// still in flight.
#[derive(Debug)]
pub struct LoadedProject {
    /// Stage, sprite registry, reporter registry, compiled stacks.
    pub graph: RuntimeObjectGraph,
    /// Session instrument table, filling in the background.
    pub instruments: Arc<InstrumentTable>,
    tasks: Vec<(String, JoinHandle<StageResult<()>>)>,
    instrument_task: Option<JoinHandle<StageResult<()>>>,
}

impl LoadedProject {
    /// Number of sound/costume tasks not yet joined.
    pub fn pending_asset_tasks(&self) -> usize {
        self.tasks.len()
    }

    /// Await every sound and costume task. Returns `Ok` only when all
    /// succeeded; otherwise every failure is listed, not just the first.
    pub async fn join_assets(&mut self) -> StageResult<()> {
        let failures = self.collect_asset_failures().await;
        if failures.is_empty() {
            Ok(())
        } else {
            Err(StageError::AssetsFailed { failures })
        }
    }

    /// Await asset tasks and the instrument bank.
    pub async fn join_all(&mut self) -> StageResult<()> {
        let mut failures = self.collect_asset_failures().await;

        if let Some(handle) = self.instrument_task.take() {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(format!("instrument bank: {e}")),
                Err(e) => failures.push(format!("instrument bank: task panicked: {e}")),
            }
        }

        if failures.is_empty() {
            Ok(())
        } else {
            Err(StageError::AssetsFailed { failures })
        }
    }

    async fn collect_asset_failures(&mut self) -> Vec<String> {
        let mut failures = Vec::new();
        for (label, handle) in self.tasks.drain(..) {
            match handle.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => failures.push(format!("{label}: {e}")),
                Err(e) => failures.push(format!("{label}: task panicked: {e}")),
            }
        }
        failures
    }
}
