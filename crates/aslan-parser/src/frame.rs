use rustc_hash::{FxHashMap, FxHashSet};

use aslan_common::{Map, Value};

use crate::policy::Policy;

/// Accumulation state for an in-progress `[aslanp]` sequence on the
/// current key/index. Only ever tracked for the currently-selected slot;
/// it is flushed and dropped the moment that slot changes.
#[derive(Debug, Default)]
pub struct PartsState {
    pub buffer: String,
}

/// A scope frame owning a Map being built.
#[derive(Debug)]
pub struct MapFrame {
    pub target: Map,
    pub current_key: Option<String>,
    pub policies: FxHashMap<String, Policy>,
    pub finalized: FxHashSet<String>,
    pub parts: Option<PartsState>,
    /// True from the moment a `d` selects `current_key` until the first
    /// mutation (text append, `o`, `a`, or `v`) lands on that slot. Lets
    /// `o` tell "freshly (re)selected, nothing done yet" apart from
    /// "already holds a value from a prior visit", per the override
    /// lattice in SPEC_FULL.md §4.2.
    pub just_selected: bool,
}

impl MapFrame {
    pub fn new() -> Self {
        Self {
            target: Map::new(),
            current_key: None,
            policies: FxHashMap::default(),
            finalized: FxHashSet::default(),
            parts: None,
            just_selected: false,
        }
    }

    pub fn current_value(&self) -> Option<&Value> {
        self.current_key.as_ref().and_then(|k| self.target.get(k))
    }
}

impl Default for MapFrame {
    fn default() -> Self {
        Self::new()
    }
}

/// A scope frame owning a Sequence being built.
#[derive(Debug, Default)]
pub struct SequenceFrame {
    pub target: Vec<Value>,
    pub current_index: Option<usize>,
    pub finalized: FxHashSet<usize>,
    pub parts: Option<PartsState>,
    pub just_selected: bool,
}

impl SequenceFrame {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_value(&self) -> Option<&Value> {
        self.current_index.and_then(|i| self.target.get(i))
    }
}

#[derive(Debug)]
pub enum Frame {
    Map(MapFrame),
    Sequence(SequenceFrame),
}

impl Frame {
    pub fn is_map(&self) -> bool {
        matches!(self, Frame::Map(_))
    }
}
