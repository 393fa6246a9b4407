/// Stable node identity assigned by the host engine.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Label extent cached across frames, valid for one atlas version.
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LabelCache {
    pub width: f32,
    pub height: f32,
    /// Atlas version the cached extent was computed against.
    pub atlas_version: Option<u64>,
}

/// Per-node text state. Owned by the host; the program only writes `cache`.
#[derive(Clone, Debug, PartialEq)]
pub struct TextNode {
    pub id: NodeId,
    pub text: String,
    pub cache: LabelCache,
}

impl TextNode {
    pub fn new(id: u32, text: impl Into<String>) -> Self {
        Self {
            id: NodeId(id),
            text: text.into(),
            cache: LabelCache::default(),
        }
    }

    /// Number of characters, which is also the number of slots the label occupies.
    #[inline]
    pub fn char_count(&self) -> usize {
        self.text.chars().count()
    }
}
