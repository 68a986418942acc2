use rustc_hash::FxHashMap;
use smol_str::SmolStr;

use crate::tree::TreeId;

/// Well-known component slot names.
pub mod key {
    pub const OPEN: &str = "open";
    pub const CLOSE: &str = "close";
    pub const BODY: &str = "body";
    pub const KEY: &str = "key";
    pub const PARAMETER: &str = "parameter";
    pub const START: &str = "start";
    pub const MIDDLE: &str = "middle";
    pub const END: &str = "end";
    pub const SUB: &str = "sub";
    pub const LEFT: &str = "left";
    pub const SIGN: &str = "sign";
    pub const RIGHT: &str = "right";
}

/// The metadata attached to a tree: a kind tag and named component slots.
///
/// Slots point at trees anywhere in the same forest, not only at direct children.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sketch {
    kind: SmolStr,
    components: FxHashMap<SmolStr, TreeId>,
}

impl Sketch {
    pub fn new(kind: impl Into<SmolStr>) -> Self {
        Self {
            kind: kind.into(),
            components: FxHashMap::default(),
        }
    }

    pub fn kind(&self) -> &str {
        &self.kind
    }

    pub fn set_kind(&mut self, kind: impl Into<SmolStr>) {
        self.kind = kind.into();
    }

    pub fn is(&self, kind: &str) -> bool {
        self.kind == kind
    }

    pub fn get(&self, key: &str) -> Option<TreeId> {
        self.components.get(key).copied()
    }

    pub fn set(&mut self, key: impl Into<SmolStr>, tree: TreeId) {
        self.components.insert(key.into(), tree);
    }

    pub fn components(&self) -> impl Iterator<Item = (&str, TreeId)> {
        self.components.iter().map(|(key, tree)| (key.as_str(), *tree))
    }
}
