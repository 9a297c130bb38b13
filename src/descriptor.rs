//! Serialized project descriptor: the wire format parsed once at load time
//! and treated as read-only afterwards.
//!
//! Children are loosely shaped on the wire (every field optional); the shape
//! is resolved exactly once into a [`DescriptorKind`] instead of re-probing
//! optional fields at every use site.

use crate::error::{StageError, StageResult};

/// Root parsed node: the stage's own scripts/sounds/costumes/lists plus an
/// ordered sequence of child descriptors.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ProjectDescriptor {
    /// Stage name; the wire format calls the stage a target like any other.
    #[serde(default, rename = "objName")]
    pub obj_name: String,
    /// Stage-owned scripts.
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
    /// Stage-owned sounds.
    #[serde(default)]
    pub sounds: Vec<SoundRef>,
    /// Stage-owned costumes (backdrops).
    #[serde(default)]
    pub costumes: Vec<CostumeRef>,
    /// Lists declared by the stage itself.
    #[serde(default)]
    pub lists: Vec<ListDescriptor>,
    /// Ordered child descriptors: sprites, watchers, and stage-scope lists.
    #[serde(default)]
    pub children: Vec<ChildDescriptor>,
}

impl ProjectDescriptor {
    /// Parse descriptor bytes. Malformed input is a typed
    /// [`StageError::Descriptor`]; no partial structure is ever exposed.
    pub fn from_json_bytes(bytes: &[u8]) -> StageResult<Self> {
        serde_json::from_slice(bytes).map_err(|e| StageError::descriptor(e.to_string()))
    }
}

/// One child of the project root. All identifying fields are optional on the
/// wire; [`ChildDescriptor::kind`] resolves the shape.
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ChildDescriptor {
    /// Present iff this child is a sprite.
    #[serde(default, rename = "objName", skip_serializing_if = "Option::is_none")]
    pub obj_name: Option<String>,
    /// Present iff this child is a list.
    #[serde(default, rename = "listName", skip_serializing_if = "Option::is_none")]
    pub list_name: Option<String>,
    /// Script entries owned by this child.
    #[serde(default)]
    pub scripts: Vec<ScriptEntry>,
    /// Sound references owned by this child.
    #[serde(default)]
    pub sounds: Vec<SoundRef>,
    /// Costume references owned by this child.
    #[serde(default)]
    pub costumes: Vec<CostumeRef>,
    /// Nested local-list descriptors (sprites only).
    #[serde(default)]
    pub lists: Vec<ListDescriptor>,
    /// Remaining wire fields, kept verbatim for watchers (cmd, param, color…).
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

/// Structural shape of a child descriptor, resolved once at parse time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DescriptorKind {
    /// Carries a sprite-identifying field.
    Sprite,
    /// Carries a list-identifying field.
    List,
    /// Neither: a value watcher/reporter.
    Watcher,
}

impl ChildDescriptor {
    /// Classify this child. Sprite wins over list when both fields are
    /// present, matching the order the original shape probe checked them in.
    pub fn kind(&self) -> DescriptorKind {
        if self.obj_name.is_some() {
            DescriptorKind::Sprite
        } else if self.list_name.is_some() {
            DescriptorKind::List
        } else {
            DescriptorKind::Watcher
        }
    }
}

/// One script entry: `(x, y, block-list)` as serialized on the wire.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ScriptEntry(pub f64, pub f64, pub Vec<serde_json::Value>);

impl ScriptEntry {
    /// The block list; the coordinates only matter to the editor.
    pub fn blocks(&self) -> &[serde_json::Value] {
        &self.2
    }
}

/// Reference to one sound asset as serialized on the wire.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct SoundRef {
    /// Display name.
    #[serde(default, rename = "soundName")]
    pub sound_name: String,
    /// Numeric id used for archive entry naming.
    #[serde(rename = "soundID")]
    pub sound_id: i64,
    /// Content digest, extension included as the last four characters.
    pub md5: String,
    /// Declared sample count, if present.
    #[serde(default, rename = "sampleCount")]
    pub sample_count: Option<u64>,
    /// Declared source sample rate, if present.
    #[serde(default)]
    pub rate: Option<u32>,
}

/// Reference to one costume asset as serialized on the wire.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct CostumeRef {
    /// Display name.
    #[serde(default, rename = "costumeName")]
    pub costume_name: String,
    /// Numeric id used for archive entry naming.
    #[serde(rename = "baseLayerID")]
    pub base_layer_id: i64,
    /// Content digest of the base layer.
    #[serde(rename = "baseLayerMD5")]
    pub base_layer_md5: String,
}

/// One list declaration (stage-scope child, stage-owned, or sprite-local).
#[derive(Clone, Debug, Default, serde::Serialize, serde::Deserialize)]
pub struct ListDescriptor {
    /// List name; unique per owner, not globally.
    #[serde(rename = "listName")]
    pub list_name: String,
    /// Initial contents.
    #[serde(default)]
    pub contents: Vec<serde_json::Value>,
    /// Owning target name, when the wire format records one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// Logical kind of a referenced binary asset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AssetKind {
    /// Image asset (png or svg payload).
    Costume,
    /// Audio asset (WAV payload).
    Sound,
}

/// Normalized reference to one binary asset: numeric id, content digest, and
/// logical kind. The digest doubles as the remote URL key; the id plus the
/// digest's last four characters name the archive entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AssetReference {
    /// Numeric id from the descriptor.
    pub id: i64,
    /// Content digest, extension included.
    pub digest: String,
    /// Logical kind.
    pub kind: AssetKind,
}

impl AssetReference {
    /// Build a sound reference from its wire form.
    pub fn sound(r: &SoundRef) -> Self {
        Self {
            id: r.sound_id,
            digest: r.md5.clone(),
            kind: AssetKind::Sound,
        }
    }

    /// Build a costume reference from its wire form.
    pub fn costume(r: &CostumeRef) -> Self {
        Self {
            id: r.base_layer_id,
            digest: r.base_layer_md5.clone(),
            kind: AssetKind::Costume,
        }
    }

    /// Last four characters of the digest, which by convention carry the
    /// extension (`.png`, `.svg`, `.wav`).
    pub fn digest_extension(&self) -> &str {
        let n = self.digest.len();
        if n >= 4 {
            &self.digest[n - 4..]
        } else {
            &self.digest
        }
    }

    /// Archive entry name: `<id><last-4-of-digest>`, e.g. `7.png`.
    pub fn archive_entry_name(&self) -> String {
        format!("{}{}", self.id, self.digest_extension())
    }
}
