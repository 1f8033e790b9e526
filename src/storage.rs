use std::hash::{Hash, Hasher};
use bitfield_struct::bitfield;
use indexmap::IndexSet;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::errors::SGError;

pub type LevelType = u8;
pub type IndexType = u32;

/// Deepest level representable per dimension.
pub const MAX_LEVEL: LevelType = 31;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointDistribution
{
    #[default]
    Uniform,
    ClenshawCurtis,
}

#[bitfield(u8)]
#[derive(Serialize, Deserialize, PartialEq, Eq)]
pub struct GridPointFlags
{
    pub is_leaf: bool,
    pub is_inner: bool,
    pub clenshaw_curtis: bool,
    #[bits(5)]
    _empty: u8
}

impl GridPointFlags
{
    pub fn from_level(level: &[LevelType], is_leaf: bool) -> Self
    {
        let mut r = Self::new();
        r.set_is_leaf(is_leaf);
        r.set_is_inner(!level.contains(&0));
        r
    }
    pub fn update_is_inner(&mut self, level: &[LevelType])
    {
        self.set_is_inner(!level.contains(&0));
    }
    pub fn distribution(&self) -> PointDistribution
    {
        if self.clenshaw_curtis() { PointDistribution::ClenshawCurtis } else { PointDistribution::Uniform }
    }
}

///
/// One-dimensional coordinate of (level, index) in [0,1].
///
#[inline]
pub fn coordinate_1d(level: LevelType, index: IndexType, distribution: PointDistribution) -> f64
{
    let h = (1_u64 << level) as f64;
    match distribution
    {
        PointDistribution::Uniform => index as f64 / h,
        PointDistribution::ClenshawCurtis => 0.5 * (1.0 - (std::f64::consts::PI * index as f64 / h).cos()),
    }
}

///
/// Checks that (level, index) addresses a node of the dyadic hierarchy.
///
#[inline]
pub fn is_valid_level_index(level: LevelType, index: IndexType) -> bool
{
    if level == 0
    {
        index <= 1
    }
    else
    {
        level <= MAX_LEVEL && index % 2 == 1 && (index as u64) < (1_u64 << level)
    }
}

#[derive(Clone, Serialize, Deserialize, Debug)]
pub struct GridPoint
{
    pub level: Vec<LevelType>,
    pub index: Vec<IndexType>,
    pub(crate) flags: GridPointFlags,
}

impl Hash for GridPoint
{
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.level.hash(state);
        self.index.hash(state);
    }
}

impl PartialEq for GridPoint
{
    fn eq(&self, other: &Self) -> bool {
        self.level == other.level && self.index == other.index
    }
}
impl Eq for GridPoint {}

impl PartialOrd for GridPoint
{
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(std::cmp::Ord::cmp(self, other))
    }
}
impl Ord for GridPoint
{
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.index.cmp(&other.index).then(self.level.cmp(&other.level))
    }
}

impl GridPoint
{
    pub fn new(level: &[LevelType], index: &[IndexType], is_leaf: bool) -> Self
    {
        Self { level: level.to_vec(), index: index.to_vec(), flags: GridPointFlags::from_level(level, is_leaf) }
    }

    ///
    /// Point with level 1 and index 1 in every dimension.
    ///
    pub fn root_point(num_inputs: usize) -> Self
    {
        Self::new(&vec![1; num_inputs], &vec![1; num_inputs], false)
    }

    ///
    /// Left corner of the domain (level 0, index 0 in every dimension).
    ///
    pub fn zero_index(num_inputs: usize) -> Self
    {
        Self::new(&vec![0; num_inputs], &vec![0; num_inputs], false)
    }

    #[inline]
    pub fn dim(&self) -> usize
    {
        self.level.len()
    }
    #[inline]
    pub fn is_leaf(&self) -> bool
    {
        self.flags.is_leaf()
    }
    #[inline]
    pub fn set_is_leaf(&mut self, is_leaf: bool)
    {
        self.flags.set_is_leaf(is_leaf);
    }
    #[inline]
    pub fn is_inner_point(&self) -> bool
    {
        !self.level.contains(&0)
    }
    #[inline]
    pub fn distribution(&self) -> PointDistribution
    {
        self.flags.distribution()
    }
    pub fn set_distribution(&mut self, distribution: PointDistribution)
    {
        self.flags.set_clenshaw_curtis(distribution == PointDistribution::ClenshawCurtis);
    }
    pub fn level_sum(&self) -> u32
    {
        self.level.iter().map(|&l| l as u32).sum()
    }
    #[inline]
    pub fn level_max(&self) -> LevelType
    {
        *self.level.iter().max().unwrap_or(&0)
    }
    pub fn level_min(&self) -> LevelType
    {
        *self.level.iter().min().unwrap_or(&0)
    }

    pub fn is_valid(&self) -> bool
    {
        self.level.len() == self.index.len() &&
            self.level.iter().zip(self.index.iter()).all(|(&l, &i)| is_valid_level_index(l, i))
    }

    ///
    /// Left child in direction `dim`. For a level-0 boundary point this is the
    /// level-1 root, which is the only child of a boundary point.
    ///
    pub fn left_child(&self, dim: usize) -> GridPoint
    {
        let mut r = self.clone();
        if self.level[dim] == 0
        {
            r.level[dim] = 1;
            r.index[dim] = 1;
            return r;
        }
        r.index[dim] = 2 * self.index[dim] - 1;
        r.level[dim] += 1;
        r
    }

    pub fn right_child(&self, dim: usize) -> GridPoint
    {
        let mut r = self.clone();
        if self.level[dim] == 0
        {
            r.level[dim] = 1;
            r.index[dim] = 1;
            return r;
        }
        r.index[dim] = 2 * self.index[dim] + 1;
        r.level[dim] += 1;
        r
    }

    ///
    /// returns an index with the top level in direction dim
    ///
    pub fn root(&self, dim: usize) -> GridPoint
    {
        let mut r = self.clone();
        r.index[dim] = 1;
        r.level[dim] = 1;
        r
    }

    ///
    /// Parent in direction `dim`. Level-1 and level-0 points have no interior parent.
    ///
    pub fn parent(&self, dim: usize) -> Option<GridPoint>
    {
        if self.level[dim] <= 1
        {
            return None;
        }
        let mut r = self.clone();
        r.index[dim] = (self.index[dim] >> 1) | 1;
        r.level[dim] -= 1;
        Some(r)
    }

    ///
    /// Both hierarchical ancestors one step up in `dim`: the parent for level > 1,
    /// the two boundary points for level 1 and nothing for level 0.
    ///
    pub(crate) fn direct_ancestors(&self, dim: usize) -> Vec<GridPoint>
    {
        match self.level[dim]
        {
            0 => Vec::new(),
            1 =>
            {
                let mut left = self.clone();
                left.level[dim] = 0;
                left.index[dim] = 0;
                let mut right = left.clone();
                right.index[dim] = 1;
                vec![left, right]
            },
            _ => self.parent(dim).into_iter().collect(),
        }
    }

    pub fn unit_coordinate(&self) -> Vec<f64>
    {
        let distribution = self.distribution();
        self.level.iter().zip(self.index.iter()).map(|(&l, &i)| coordinate_1d(l, i, distribution)).collect()
    }
}

///
/// Borrowed view of a stored grid point.
///
#[derive(Clone, Copy, Debug)]
pub struct GridPointRef<'a>
{
    pub level: &'a [LevelType],
    pub index: &'a [IndexType],
    pub flags: &'a GridPointFlags,
}

impl GridPointRef<'_>
{
    pub fn unit_coordinate(&self) -> Vec<f64>
    {
        let distribution = self.flags.distribution();
        self.level.iter().zip(self.index.iter()).map(|(&l, &i)| coordinate_1d(l, i, distribution)).collect()
    }
    pub fn level_sum(&self) -> u32
    {
        self.level.iter().map(|&l| l as u32).sum()
    }
    #[inline]
    pub fn is_leaf(&self) -> bool
    {
        self.flags.is_leaf()
    }
}

impl From<GridPointRef<'_>> for GridPoint
{
    fn from(value: GridPointRef<'_>) -> Self {
        GridPoint { level: value.level.to_owned(), index: value.index.to_owned(), flags: *value.flags }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox
{
    pub lower: Vec<f64>,
    pub upper: Vec<f64>
}

impl BoundingBox
{
    #[inline]
    pub fn new(lower: &[f64], upper: &[f64]) -> Self
    {
        Self { lower: lower.to_vec(), upper: upper.to_vec() }
    }
    pub fn with_dim(num_inputs: usize) -> Self
    {
        Self { lower: vec![0.0; num_inputs], upper: vec![1.0; num_inputs] }
    }
    #[inline]
    pub fn width(&self, dim: usize) -> f64
    {
        self.upper[dim] - self.lower[dim]
    }

    ///
    /// Volume of hypercube (width(dim1)*...*width(dim_n))
    ///
    #[inline]
    pub fn volume(&self) -> f64
    {
        (0..self.lower.len()).map(|d| self.width(d)).product()
    }
    #[inline]
    pub fn to_unit_coordinate(&self, point: &[f64]) -> Vec<f64>
    {
        point.iter().enumerate().map(|(d, &x)| (x - self.lower[d]) / self.width(d)).collect()
    }
    #[inline]
    pub fn to_real_coordinate_in_place(&self, point: &mut [f64])
    {
        for (d, x) in point.iter_mut().enumerate()
        {
            *x = self.lower[d] + self.width(d) * *x;
        }
    }
    #[inline]
    pub fn to_real_coordinate(&self, point: &[f64]) -> Vec<f64>
    {
        let mut r = point.to_vec();
        self.to_real_coordinate_in_place(&mut r);
        r
    }
    #[inline]
    pub fn contains(&self, point: &[f64]) -> bool
    {
        point.iter().enumerate().all(|(d, &x)| self.lower[d] <= x && x <= self.upper[d])
    }
}

///
/// Owning container of all grid points. Points are referred to by their
/// sequence number, a dense index into `[0, len())` that is also the index
/// into coefficient vectors.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SparseGridStorage
{
    pub bounding_box: BoundingBox,
    pub(crate) index: Vec<IndexType>,
    pub(crate) level: Vec<LevelType>,
    pub(crate) flags: Vec<GridPointFlags>,
    pub(crate) num_inputs: usize,
    pub(crate) has_boundary: bool,
    pub(crate) distribution: PointDistribution,
    #[serde(skip)]
    pub(crate) map: FxHashMap<GridPoint, u32>,
}

impl SparseGridStorage
{
    pub fn new(num_inputs: usize) -> Self
    {
        Self { bounding_box: BoundingBox::with_dim(num_inputs), index: Vec::new(), level: Vec::new(), flags: Vec::new(),
            num_inputs, has_boundary: false, distribution: PointDistribution::Uniform, map: FxHashMap::default() }
    }

    pub fn with_distribution(num_inputs: usize, distribution: PointDistribution) -> Self
    {
        let mut r = Self::new(num_inputs);
        r.distribution = distribution;
        r
    }

    #[inline]
    pub fn num_inputs(&self) -> usize
    {
        self.num_inputs
    }
    #[inline]
    pub fn len(&self) -> usize
    {
        self.flags.len()
    }
    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.flags.is_empty()
    }
    #[inline(always)]
    pub fn has_boundary(&self) -> bool
    {
        self.has_boundary
    }
    pub fn set_has_boundary(&mut self, has_boundary: bool)
    {
        self.has_boundary = has_boundary;
    }
    #[inline]
    pub fn distribution(&self) -> PointDistribution
    {
        self.distribution
    }
    #[inline]
    pub fn bounding_box(&self) -> &BoundingBox
    {
        &self.bounding_box
    }
    #[inline]
    pub fn bounding_box_mut(&mut self) -> &mut BoundingBox
    {
        &mut self.bounding_box
    }

    #[inline(always)]
    pub fn level(&self, seq: usize, dim: usize) -> LevelType
    {
        self.level[self.num_inputs * seq + dim]
    }
    #[inline(always)]
    pub fn index(&self, seq: usize, dim: usize) -> IndexType
    {
        self.index[self.num_inputs * seq + dim]
    }
    #[inline]
    pub fn is_leaf(&self, seq: usize) -> bool
    {
        self.flags[seq].is_leaf()
    }

    ///
    /// Borrowed view of the point with sequence number `seq`, valid until the next mutation.
    ///
    #[inline]
    pub fn get(&self, seq: usize) -> Option<GridPointRef<'_>>
    {
        if seq >= self.len()
        {
            return None;
        }
        let range = seq * self.num_inputs..(seq + 1) * self.num_inputs;
        Some(GridPointRef { level: &self.level[range.clone()], index: &self.index[range], flags: &self.flags[seq] })
    }

    ///
    /// Owned copy of the point with sequence number `seq`.
    ///
    #[inline]
    pub fn point(&self, seq: usize) -> Result<GridPoint, SGError>
    {
        self.get(seq).map(GridPoint::from).ok_or(SGError::InvalidIndex(seq))
    }

    #[inline]
    pub fn find(&self, point: &GridPoint) -> Option<usize>
    {
        self.map.get(point).map(|&v| v as usize)
    }
    #[inline]
    pub fn contains(&self, point: &GridPoint) -> bool
    {
        self.map.contains_key(point)
    }

    pub fn unit_coordinate(&self, seq: usize) -> Vec<f64>
    {
        let distribution = self.flags[seq].distribution();
        (0..self.num_inputs).map(|d| coordinate_1d(self.level(seq, d), self.index(seq, d), distribution)).collect()
    }

    fn check_point(&self, point: &GridPoint) -> Result<(), SGError>
    {
        if point.dim() != self.num_inputs || point.index.len() != self.num_inputs
        {
            return Err(SGError::DimensionMismatch { expected: self.num_inputs, found: point.dim() });
        }
        if !point.is_valid()
        {
            return Err(SGError::InvalidOperation(format!("invalid level/index pair in point {:?}/{:?}", point.level, point.index)));
        }
        if !self.has_boundary && point.level.contains(&0)
        {
            return Err(SGError::InvalidOperation("level-0 point inserted into a grid without boundary".to_string()));
        }
        Ok(())
    }

    ///
    /// Returns true if any child of `point` (in any dimension) is stored.
    ///
    pub fn has_children(&self, point: &GridPoint) -> bool
    {
        (0..self.num_inputs).any(|dim|
        {
            if point.level[dim] == 0
            {
                self.contains(&point.root(dim))
            }
            else
            {
                point.level[dim] < MAX_LEVEL &&
                    (self.contains(&point.left_child(dim)) || self.contains(&point.right_child(dim)))
            }
        })
    }

    ///
    /// Inserts a point and returns its sequence number. If the point is already
    /// present the existing sequence number is returned and storage is unchanged.
    ///
    pub fn insert(&mut self, mut point: GridPoint) -> Result<usize, SGError>
    {
        self.check_point(&point)?;
        if let Some(seq) = self.find(&point)
        {
            return Ok(seq);
        }
        self.index.try_reserve(self.num_inputs)?;
        self.level.try_reserve(self.num_inputs)?;
        self.flags.try_reserve(1)?;
        self.map.try_reserve(1)?;

        let is_leaf = !self.has_children(&point);
        point.set_is_leaf(is_leaf);
        point.flags.update_is_inner(&point.level);
        point.set_distribution(self.distribution);
        for dim in 0..self.num_inputs
        {
            for ancestor in point.direct_ancestors(dim)
            {
                if let Some(seq) = self.find(&ancestor)
                {
                    self.flags[seq].set_is_leaf(false);
                }
            }
        }
        let seq = self.flags.len();
        self.flags.push(point.flags);
        self.index.extend_from_slice(&point.index);
        self.level.extend_from_slice(&point.level);
        self.map.insert(point, seq as u32);
        Ok(seq)
    }

    ///
    /// Removes a single childless point. All points with a larger sequence
    /// number shift down by one.
    ///
    pub fn remove(&mut self, seq: usize) -> Result<(), SGError>
    {
        let mut removed = IndexSet::new();
        removed.insert(seq);
        self.remove_points(&removed)
    }

    ///
    /// Removes a set of points. Every child of a removed point must itself be
    /// part of the set. Compaction is shift-down: the surviving points keep their
    /// relative order; see [`SparseGridStorage::compact_coefficients`].
    ///
    pub fn remove_points(&mut self, removed: &IndexSet<usize>) -> Result<(), SGError>
    {
        for &seq in removed
        {
            let point = self.point(seq)?;
            for dim in 0..self.num_inputs
            {
                let children = if point.level[dim] == 0
                {
                    vec![point.root(dim)]
                }
                else if point.level[dim] < MAX_LEVEL
                {
                    vec![point.left_child(dim), point.right_child(dim)]
                }
                else
                {
                    Vec::new()
                };
                for child in children
                {
                    if let Some(child_seq) = self.find(&child)
                    {
                        if !removed.contains(&child_seq)
                        {
                            return Err(SGError::InvalidOperation(format!("point {seq} has child {child_seq} and cannot be removed")));
                        }
                    }
                }
            }
        }
        let kept = self.len() - removed.len();
        let mut index = Vec::with_capacity(kept * self.num_inputs);
        let mut level = Vec::with_capacity(kept * self.num_inputs);
        let mut flags = Vec::with_capacity(kept);
        for seq in (0..self.len()).filter(|seq| !removed.contains(seq))
        {
            index.extend_from_slice(&self.index[seq * self.num_inputs..(seq + 1) * self.num_inputs]);
            level.extend_from_slice(&self.level[seq * self.num_inputs..(seq + 1) * self.num_inputs]);
            flags.push(self.flags[seq]);
        }
        self.index = index;
        self.level = level;
        self.flags = flags;
        self.generate_map();
        self.update_leaves();
        Ok(())
    }

    ///
    /// Applies the compaction performed by [`SparseGridStorage::remove_points`]
    /// to a coefficient vector aligned with the storage before removal.
    ///
    pub fn compact_coefficients(values: &[f64], removed: &IndexSet<usize>) -> Vec<f64>
    {
        values.iter().enumerate().filter(|(seq, _)| !removed.contains(seq)).map(|(_, &v)| v).collect()
    }

    ///
    /// Checks the raw arrays of a storage that did not come from `insert`, e.g.
    /// one that was deserialized. Must pass before the map is rebuilt.
    ///
    pub(crate) fn check_arrays(&self) -> Result<(), String>
    {
        if self.num_inputs == 0
        {
            return Err("storage has no dimensions".to_string());
        }
        let expected = self.flags.len().checked_mul(self.num_inputs).ok_or("point count overflows")?;
        if self.level.len() != expected || self.index.len() != expected
        {
            return Err(format!("expected {expected} levels and indices, found {} and {}", self.level.len(), self.index.len()));
        }
        if self.bounding_box.lower.len() != self.num_inputs || self.bounding_box.upper.len() != self.num_inputs
        {
            return Err("bounding box dimension does not match storage".to_string());
        }
        if (0..self.num_inputs).any(|d| !(self.bounding_box.width(d) > 0.0))
        {
            return Err("bounding box must have positive width in every dimension".to_string());
        }
        for (k, (&l, &i)) in self.level.iter().zip(self.index.iter()).enumerate()
        {
            if !is_valid_level_index(l, i)
            {
                return Err(format!("invalid level/index pair {l}/{i} at point {}", k / self.num_inputs));
            }
            if l == 0 && !self.has_boundary
            {
                return Err(format!("level-0 point {} in a grid without boundary", k / self.num_inputs));
            }
        }
        Ok(())
    }

    ///
    /// Rebuilds the point map from the arrays. Fails if two sequence numbers
    /// hold the same point.
    ///
    pub(crate) fn rebuild_map(&mut self) -> Result<(), String>
    {
        self.check_arrays()?;
        self.generate_map();
        if !self.map_initialized()
        {
            return Err(format!("{} duplicate points", self.len() - self.map.len()));
        }
        Ok(())
    }

    pub fn generate_map(&mut self)
    {
        let mut map = FxHashMap::default();
        map.reserve(self.len());
        for (seq, node) in self.nodes().enumerate()
        {
            map.insert(GridPoint::from(node), seq as u32);
        }
        self.map = map;
    }

    #[inline]
    pub fn map_initialized(&self) -> bool
    {
        self.len() == self.map.len()
    }

    pub(crate) fn update_leaves(&mut self)
    {
        for seq in 0..self.len()
        {
            let point = GridPoint::from(GridPointRef { level: &self.level[seq * self.num_inputs..(seq + 1) * self.num_inputs],
                index: &self.index[seq * self.num_inputs..(seq + 1) * self.num_inputs], flags: &self.flags[seq] });
            let is_leaf = !self.has_children(&point);
            self.flags[seq].set_is_leaf(is_leaf);
        }
    }

    ///
    /// Per-dimension snapshot of all levels and indices, ordered by sequence
    /// number. Not kept in sync with later mutations.
    ///
    pub fn level_index_arrays(&self) -> (Vec<Vec<LevelType>>, Vec<Vec<IndexType>>)
    {
        let mut levels = vec![Vec::with_capacity(self.len()); self.num_inputs];
        let mut indices = vec![Vec::with_capacity(self.len()); self.num_inputs];
        for seq in 0..self.len()
        {
            for d in 0..self.num_inputs
            {
                levels[d].push(self.level(seq, d));
                indices[d].push(self.index(seq, d));
            }
        }
        (levels, indices)
    }

    ///
    /// Iterates over borrowed views of all points in sequence order.
    ///
    pub fn nodes(&self) -> NodeIterator<'_>
    {
        NodeIterator { storage: self, current_seq: 0 }
    }

    ///
    /// Iterates over the real coordinates of all points in sequence order,
    /// mapped through the bounding box.
    ///
    pub fn points(&self) -> PointIterator<'_>
    {
        PointIterator { storage: self, current_seq: 0 }
    }
}

pub struct NodeIterator<'a>
{
    storage: &'a SparseGridStorage,
    current_seq: usize,
}

impl<'a> Iterator for NodeIterator<'a>
{
    type Item = GridPointRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let r = self.storage.get(self.current_seq);
        self.current_seq += 1;
        r
    }
}

pub struct PointIterator<'a>
{
    storage: &'a SparseGridStorage,
    current_seq: usize,
}

impl<'a> PointIterator<'a>
{
    ///
    /// Nodes in the same order as the coordinates, for functors that need levels.
    ///
    pub fn nodes(&self) -> NodeIterator<'a>
    {
        self.storage.nodes()
    }
}

impl Iterator for PointIterator<'_>
{
    type Item = Vec<f64>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.current_seq < self.storage.len()
        {
            let mut point = self.storage.unit_coordinate(self.current_seq);
            self.storage.bounding_box.to_real_coordinate_in_place(&mut point);
            self.current_seq += 1;
            Some(point)
        }
        else
        {
            None
        }
    }
}

#[test]
fn check_insert_deduplicates()
{
    let mut storage = SparseGridStorage::new(2);
    let a = storage.insert(GridPoint::new(&[1, 2], &[1, 3], true)).expect("insert failed");
    let b = storage.insert(GridPoint::new(&[1, 2], &[1, 3], false)).expect("insert failed");
    assert_eq!(a, b);
    assert_eq!(storage.len(), 1);
}

#[test]
fn check_insert_rejects_bad_points()
{
    let mut storage = SparseGridStorage::new(2);
    assert!(matches!(storage.insert(GridPoint::new(&[1], &[1], true)), Err(SGError::DimensionMismatch { .. })));
    assert!(matches!(storage.insert(GridPoint::new(&[2, 1], &[2, 1], true)), Err(SGError::InvalidOperation(_))));
    assert!(matches!(storage.insert(GridPoint::new(&[0, 1], &[0, 1], true)), Err(SGError::InvalidOperation(_))));
}

#[test]
fn check_leaf_flags_follow_insertion()
{
    let mut storage = SparseGridStorage::new(1);
    let root = storage.insert(GridPoint::new(&[1], &[1], true)).expect("insert failed");
    assert!(storage.is_leaf(root));
    let child = storage.insert(GridPoint::new(&[2], &[3], true)).expect("insert failed");
    assert!(!storage.is_leaf(root));
    assert!(storage.is_leaf(child));
}

#[test]
fn check_remove_shifts_down()
{
    let mut storage = SparseGridStorage::new(1);
    for (l, i) in [(1, 1), (2, 1), (2, 3), (3, 7)]
    {
        storage.insert(GridPoint::new(&[l], &[i], true)).expect("insert failed");
    }
    assert!(matches!(storage.remove(0), Err(SGError::InvalidOperation(_))));
    assert!(matches!(storage.remove(2), Err(SGError::InvalidOperation(_))));
    storage.remove(1).expect("remove failed");
    assert_eq!(storage.len(), 3);
    assert_eq!(storage.find(&GridPoint::new(&[2], &[3], true)), Some(1));
    assert_eq!(storage.find(&GridPoint::new(&[3], &[7], true)), Some(2));
    let mut removed = IndexSet::new();
    removed.insert(1);
    assert_eq!(SparseGridStorage::compact_coefficients(&[1.0, 2.0, 3.0], &removed), vec![1.0, 3.0]);
}

#[test]
fn check_level_index_arrays()
{
    let mut storage = SparseGridStorage::new(2);
    storage.insert(GridPoint::new(&[1, 1], &[1, 1], true)).expect("insert failed");
    storage.insert(GridPoint::new(&[2, 1], &[3, 1], true)).expect("insert failed");
    let (levels, indices) = storage.level_index_arrays();
    assert_eq!(levels, vec![vec![1, 2], vec![1, 1]]);
    assert_eq!(indices, vec![vec![1, 3], vec![1, 1]]);
}
