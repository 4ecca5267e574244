//! Opaque and transparent bins filled by the traversal
//!
//! Following Game Engine Architecture Chapter 11.3 - Render Queues: opaque
//! geometry is grouped by render state to minimize state changes, while
//! transparent geometry is ordered by depth for back-to-front compositing.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use crate::foundation::math::Mat4;
use crate::scene::{DrawableId, GeoStateId, Light};

/// A drawable paired with the matrix it is drawn under
///
/// `matrix` is `None` for identity. Siblings under one Transform share the
/// same `Rc`, which is what lets the replay skip redundant matrix loads.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixGeoSet {
    /// Accumulated local-to-world matrix
    pub matrix: Option<Rc<Mat4>>,
    /// Drawable to issue
    pub drawable: DrawableId,
}

impl MatrixGeoSet {
    /// Pair a drawable with a matrix
    pub fn new(matrix: Option<Rc<Mat4>>, drawable: DrawableId) -> Self {
        Self { matrix, drawable }
    }

    /// Whether two entries use the same matrix instance
    pub fn same_matrix(a: Option<&Rc<Mat4>>, b: Option<&Rc<Mat4>>) -> bool {
        match (a, b) {
            (Some(a), Some(b)) => Rc::ptr_eq(a, b),
            (None, None) => true,
            _ => false,
        }
    }
}

/// Entries sharing one render state
#[derive(Debug, Clone)]
pub struct StateGroup {
    /// Shared render state, `None` for drawables without one
    pub state: Option<GeoStateId>,
    /// Entries in insertion order
    pub entries: Vec<MatrixGeoSet>,
}

/// Opaque drawables grouped by render state identity
///
/// Groups are kept in order of first appearance. Every entry with a given
/// state lives in that state's group, so replaying groups in order changes
/// state at most once per group.
#[derive(Debug, Clone, Default)]
pub struct OpaqueBin {
    groups: Vec<StateGroup>,
    index: HashMap<Option<GeoStateId>, usize>,
}

impl OpaqueBin {
    /// Create an empty bin
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry under a render state
    pub fn insert(&mut self, state: Option<GeoStateId>, entry: MatrixGeoSet) {
        let slot = *self.index.entry(state).or_insert_with(|| {
            self.groups.push(StateGroup { state, entries: Vec::new() });
            self.groups.len() - 1
        });
        self.groups[slot].entries.push(entry);
    }

    /// Groups in replay order
    pub fn groups(&self) -> &[StateGroup] {
        &self.groups
    }

    /// Every entry with its state key, in replay order
    pub fn iter(&self) -> impl Iterator<Item = (Option<GeoStateId>, &MatrixGeoSet)> {
        self.groups
            .iter()
            .flat_map(|group| group.entries.iter().map(move |entry| (group.state, entry)))
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.groups.iter().map(|g| g.entries.len()).sum()
    }

    /// True when no entries are binned
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.groups.clear();
        self.index.clear();
    }
}

/// Transparent entry with its sort key
#[derive(Debug, Clone)]
pub struct DepthEntry {
    /// Depth under the traversal's metric
    pub depth: f32,
    /// Binned drawable
    pub entry: MatrixGeoSet,
}

/// Float sort key ordered by `total_cmp`
#[derive(Debug, Clone, Copy)]
struct DepthKey(f32);

impl PartialEq for DepthKey {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for DepthKey {}

impl PartialOrd for DepthKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DepthKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.0.total_cmp(&other.0)
    }
}

/// Transparent drawables ordered by depth
///
/// Entries sharing a depth are kept together in insertion order, so
/// `iter_back_to_front` walks depths farthest first and ties in the order
/// they were found.
#[derive(Debug, Clone, Default)]
pub struct TransparentBin {
    depths: BTreeMap<DepthKey, Vec<DepthEntry>>,
    len: usize,
}

impl TransparentBin {
    /// Create an empty bin
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an entry at a depth
    pub fn insert(&mut self, depth: f32, entry: MatrixGeoSet) {
        self.depths
            .entry(DepthKey(depth))
            .or_default()
            .push(DepthEntry { depth, entry });
        self.len += 1;
    }

    /// Entries nearest first
    pub fn iter(&self) -> impl Iterator<Item = &DepthEntry> {
        self.depths.values().flatten()
    }

    /// Entries farthest first
    pub fn iter_back_to_front(&self) -> impl Iterator<Item = &DepthEntry> {
        self.depths.values().rev().flatten()
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.len
    }

    /// True when no entries are binned
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remove every entry
    pub fn clear(&mut self) {
        self.depths.clear();
        self.len = 0;
    }
}

/// A light with the matrix active where it was found
#[derive(Debug, Clone, PartialEq)]
pub struct LightEntry {
    /// Accumulated matrix, `None` for identity
    pub matrix: Option<Rc<Mat4>>,
    /// Light parameters
    pub light: Light,
}
