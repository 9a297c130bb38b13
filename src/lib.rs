//! Stagecast turns a serialized project descriptor into an executable
//! runtime object graph with materialized binary assets.
//!
//! # Pipeline overview
//!
//! 1. **Obtain**: fetch the descriptor by project id, or read it from a
//!    pre-loaded archive (`ProjectLoader`)
//! 2. **Build**: classify and instantiate the object graph — stage, ordered
//!    sprite registry, ordered reporter/list registry
//!    (`RuntimeObjectGraph::build`)
//! 3. **Compile**: turn each target's script entries into executable thread
//!    stacks (`attach_threads`)
//! 4. **Materialize**: resolve and decode costumes, sounds, and the fixed
//!    instrument bank in the background (`AssetResolver`, `decode_sound`,
//!    `InstrumentTable`)
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic graph**: building is a pure function of the descriptor;
//!   IO happens only in asset tasks behind write-once cells.
//! - **No silent failures**: an archive miss, an unknown extension, or a
//!   transport error is a typed [`StageError`], and
//!   [`LoadedProject::join_assets`] reports every failed asset.
//! - **One backend per project**: archive-loaded projects never touch the
//!   network for costumes or sounds; network-loaded projects never mix in
//!   archive lookups.
#![forbid(unsafe_code)]

mod archive;
mod config;
mod descriptor;
mod error;
mod fetch;
mod graph;
mod instruments;
mod loader;
mod resolve;
mod sound;
mod threads;

pub use archive::{ProjectArchive, DESCRIPTOR_ENTRY};
pub use config::LoaderConfig;
pub use descriptor::{
    AssetKind, AssetReference, ChildDescriptor, CostumeRef, DescriptorKind, ListDescriptor,
    ProjectDescriptor, ScriptEntry, SoundRef,
};
pub use error::{StageError, StageResult};
pub use fetch::{Fetch, HttpFetch};
pub use graph::{
    CostumeAsset, List, Reporter, RuntimeObjectGraph, SoundAsset, Sprite, Stage, Watcher,
};
pub use instruments::{InstrumentTable, INSTRUMENT_BANK};
pub use loader::{LoadedProject, ProjectLoader};
pub use resolve::{AssetResolver, CostumePayload};
pub use sound::{decode_instrument, decode_sound, SampleBuffer};
pub use threads::{attach_threads, compile_block_list, compile_script, Block, BlockArg, Thread};
