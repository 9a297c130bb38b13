//! The live runtime object graph: a stage, an ordered sprite registry, and an
//! ordered reporter registry, built from a parsed project descriptor.
//!
//! Building is a pure function of the descriptor: no IO, no shared state.
//! Asset payloads land later through write-once cells, so a graph can be
//! handed to the host immediately while decoding continues in the background.

use std::sync::{
    atomic::{AtomicUsize, Ordering},
    Arc, OnceLock,
};

use tracing::debug;

use crate::{
    descriptor::{
        AssetReference, ChildDescriptor, CostumeRef, DescriptorKind, ListDescriptor,
        ProjectDescriptor, ScriptEntry, SoundRef,
    },
    error::StageResult,
    resolve::CostumePayload,
    sound::SampleBuffer,
    threads::Thread,
};

/// One sound owned by a target: its reference plus the decoded buffer, which
/// is absent until the decode task completes and is written exactly once.
#[derive(Debug)]
pub struct SoundAsset {
    /// Display name from the descriptor.
    pub name: String,
    /// Resolvable asset reference.
    pub reference: AssetReference,
    buffer: OnceLock<SampleBuffer>,
}

impl SoundAsset {
    fn new(r: &SoundRef) -> Arc<Self> {
        Arc::new(Self {
            name: r.sound_name.clone(),
            reference: AssetReference::sound(r),
            buffer: OnceLock::new(),
        })
    }

    /// Decoded samples, if the decode has completed.
    pub fn buffer(&self) -> Option<&SampleBuffer> {
        self.buffer.get()
    }

    /// Install the decoded buffer. The first write wins; returns whether this
    /// call was the one that installed it.
    pub(crate) fn install(&self, buffer: SampleBuffer) -> bool {
        self.buffer.set(buffer).is_ok()
    }
}

/// One costume owned by a target, payload written once on materialization.
#[derive(Debug)]
pub struct CostumeAsset {
    /// Display name from the descriptor.
    pub name: String,
    /// Resolvable asset reference.
    pub reference: AssetReference,
    payload: OnceLock<CostumePayload>,
}

impl CostumeAsset {
    fn new(r: &CostumeRef) -> Arc<Self> {
        Arc::new(Self {
            name: r.costume_name.clone(),
            reference: AssetReference::costume(r),
            payload: OnceLock::new(),
        })
    }

    /// Materialized payload, if resolution has completed.
    pub fn payload(&self) -> Option<&CostumePayload> {
        self.payload.get()
    }

    pub(crate) fn install(&self, payload: CostumePayload) -> bool {
        self.payload.set(payload).is_ok()
    }
}

/// A named value list owned by the stage or by one sprite. Same-named lists
/// under different owners are independent entities.
#[derive(Clone, Debug, PartialEq)]
pub struct List {
    /// List name, unique per owner.
    pub name: String,
    /// Name of the owning target.
    pub owner: String,
    /// Initial contents from the descriptor.
    pub contents: Vec<serde_json::Value>,
}

impl List {
    fn new(d: &ListDescriptor, owner: &str) -> Arc<Self> {
        Arc::new(Self {
            name: d.list_name.clone(),
            owner: owner.to_string(),
            contents: d.contents.clone(),
        })
    }
}

/// A live monitored-value display, distinct from a sprite.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Watcher {
    /// Monitored command, when present on the wire.
    pub cmd: Option<String>,
    /// Command parameter, when present.
    pub param: Option<String>,
    /// Name of the watched target, when present.
    pub target: Option<String>,
}

impl Watcher {
    fn new(d: &ChildDescriptor) -> Self {
        let field = |key: &str| {
            d.extra
                .get(key)
                .and_then(|v| v.as_str())
                .map(str::to_string)
        };
        Self {
            cmd: field("cmd"),
            param: field("param"),
            target: field("target"),
        }
    }
}

/// Entry in the shared reporter registry: watchers and lists, creation order.
#[derive(Clone, Debug)]
pub enum Reporter {
    /// A monitored-value watcher.
    Watcher(Watcher),
    /// A stage-owned or sprite-owned list.
    List(Arc<List>),
}

/// The singleton root target.
#[derive(Debug)]
pub struct Stage {
    /// Stage name.
    pub name: String,
    /// Stage script entries, retained for thread building.
    pub scripts: Vec<ScriptEntry>,
    /// Stage-owned sounds.
    pub sounds: Vec<Arc<SoundAsset>>,
    /// Stage-owned costumes (backdrops).
    pub costumes: Vec<Arc<CostumeAsset>>,
    /// Stage-owned lists: declared by the stage plus stage-scope children.
    pub lists: Vec<Arc<List>>,
    /// Compiled thread stacks.
    pub stacks: Vec<Thread>,
    sounds_loaded: Arc<AtomicUsize>,
}

impl Stage {
    /// Sounds decoded so far for this target. Monotonic; advisory only.
    pub fn sounds_loaded(&self) -> usize {
        self.sounds_loaded.load(Ordering::Acquire)
    }

    /// Whether a list named `name` is already owned by the stage.
    pub fn has_list(&self, name: &str) -> bool {
        self.lists.iter().any(|l| l.name == name)
    }

    pub(crate) fn loaded_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.sounds_loaded)
    }
}

/// One sprite: assets, local lists, compiled stacks, and an owned snapshot of
/// its originating descriptor (the explicit back-reference thread building
/// correlates by).
#[derive(Debug)]
pub struct Sprite {
    /// Sprite name.
    pub name: String,
    /// Initial layer index, handed out monotonically in registry order.
    pub layer: usize,
    /// Sprite-owned sounds.
    pub sounds: Vec<Arc<SoundAsset>>,
    /// Sprite-owned costumes.
    pub costumes: Vec<Arc<CostumeAsset>>,
    /// Sprite-local lists (materialized in the builder's second pass).
    pub lists: Vec<Arc<List>>,
    /// Compiled thread stacks.
    pub stacks: Vec<Thread>,
    /// Originating child descriptor.
    pub descriptor: ChildDescriptor,
    sounds_loaded: Arc<AtomicUsize>,
}

impl Sprite {
    /// Sounds decoded so far for this sprite. Monotonic; advisory only.
    pub fn sounds_loaded(&self) -> usize {
        self.sounds_loaded.load(Ordering::Acquire)
    }

    pub(crate) fn loaded_counter(&self) -> Arc<AtomicUsize> {
        Arc::clone(&self.sounds_loaded)
    }
}

/// The populated object graph handed to the host once loading is underway.
#[derive(Debug)]
pub struct RuntimeObjectGraph {
    /// Singleton root target.
    pub stage: Stage,
    /// Sprites in descriptor order.
    pub sprites: Vec<Sprite>,
    /// Watchers and lists in creation order.
    pub reporters: Vec<Reporter>,
}

impl RuntimeObjectGraph {
    /// Build the graph from a parsed descriptor.
    ///
    /// Pass 1 walks the children in order: sprites are instantiated with
    /// monotonically increasing layer indices, stage-scope lists are
    /// materialized unless the stage already owns that name, everything else
    /// becomes a watcher. Pass 2 materializes each sprite's nested local
    /// lists with the sprite as explicit owner.
    pub fn build(descriptor: &ProjectDescriptor) -> StageResult<Self> {
        let stage_name = if descriptor.obj_name.is_empty() {
            "Stage".to_string()
        } else {
            descriptor.obj_name.clone()
        };

        let stage_lists = descriptor
            .lists
            .iter()
            .map(|d| List::new(d, &stage_name))
            .collect();
        let mut stage = Stage {
            name: stage_name,
            scripts: descriptor.scripts.clone(),
            sounds: descriptor.sounds.iter().map(SoundAsset::new).collect(),
            costumes: descriptor.costumes.iter().map(CostumeAsset::new).collect(),
            lists: stage_lists,
            stacks: Vec::new(),
            sounds_loaded: Arc::new(AtomicUsize::new(0)),
        };

        let mut sprites = Vec::new();
        let mut reporters = Vec::new();
        let mut next_layer = 0usize;

        for child in &descriptor.children {
            match child.kind() {
                DescriptorKind::Sprite => {
                    let name = child.obj_name.clone().unwrap_or_default();
                    let layer = next_layer;
                    next_layer += 1;
                    sprites.push(Sprite {
                        name,
                        layer,
                        sounds: child.sounds.iter().map(SoundAsset::new).collect(),
                        costumes: child.costumes.iter().map(CostumeAsset::new).collect(),
                        lists: Vec::new(),
                        stacks: Vec::new(),
                        descriptor: child.clone(),
                        sounds_loaded: Arc::new(AtomicUsize::new(0)),
                    });
                }
                DescriptorKind::List => {
                    // Stage-scope list child. If the stage already owns the
                    // name, this child is the watcher for an existing list
                    // rather than a new declaration.
                    let Some(list_name) = child.list_name.as_deref() else {
                        continue;
                    };
                    if stage.has_list(list_name) {
                        debug!(list = list_name, "stage already owns list, skipping");
                        continue;
                    }
                    let list_descriptor = ListDescriptor {
                        list_name: list_name.to_string(),
                        contents: child
                            .extra
                            .get("contents")
                            .and_then(|v| v.as_array())
                            .cloned()
                            .unwrap_or_default(),
                        target: None,
                    };
                    let list = List::new(&list_descriptor, &stage.name);
                    stage.lists.push(Arc::clone(&list));
                    reporters.push(Reporter::List(list));
                }
                DescriptorKind::Watcher => {
                    reporters.push(Reporter::Watcher(Watcher::new(child)));
                }
            }
        }

        // Pass 2: sprite-local lists, same creation routine, explicit owner.
        for sprite in &mut sprites {
            for d in &sprite.descriptor.lists {
                let list = List::new(d, &sprite.name);
                sprite.lists.push(Arc::clone(&list));
                reporters.push(Reporter::List(list));
            }
        }

        Ok(Self {
            stage,
            sprites,
            reporters,
        })
    }

    /// Total number of sound assets across the stage and all sprites.
    pub fn sound_count(&self) -> usize {
        self.stage.sounds.len() + self.sprites.iter().map(|s| s.sounds.len()).sum::<usize>()
    }

    /// Total number of costume assets across the stage and all sprites.
    pub fn costume_count(&self) -> usize {
        self.stage.costumes.len() + self.sprites.iter().map(|s| s.costumes.len()).sum::<usize>()
    }
}
