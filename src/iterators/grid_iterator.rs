use crate::storage::{GridPoint, IndexType, LevelType, SparseGridStorage, MAX_LEVEL};

///
/// Cursor over the grid hierarchy. Every movement only queries storage and
/// reports whether the target point is stored; the grid is never modified.
///
pub trait GridIteratorT
{
    fn point(&self) -> &GridPoint;
    fn point_index(&self, dim: usize) -> IndexType;
    fn point_level(&self, dim: usize) -> LevelType;
    fn index(&self) -> Option<usize>;
    fn reset_to_level_zero(&mut self) -> bool;
    fn reset_to_level_one_all(&mut self) -> bool;
    fn reset_to_left_level_zero(&mut self, dim: usize) -> bool;
    fn reset_to_right_level_zero(&mut self, dim: usize) -> bool;
    fn reset_to_level_one(&mut self, dim: usize) -> bool;
    fn left_child(&mut self, dim: usize) -> bool;
    fn right_child(&mut self, dim: usize) -> bool;
    fn up(&mut self, dim: usize) -> bool;
    fn is_leaf(&self) -> bool;
}

pub struct HashMapGridIterator<'a>
{
    pub(crate) storage: &'a SparseGridStorage,
    point: GridPoint,
    seq: Option<usize>,
}

impl<'a> HashMapGridIterator<'a>
{
    ///
    /// Creates a cursor positioned at the coarsest point: the left corner on
    /// boundary grids, the level-one root otherwise.
    ///
    pub fn new(storage: &'a SparseGridStorage) -> Self
    {
        let point = if storage.has_boundary()
        {
            GridPoint::zero_index(storage.num_inputs())
        }
        else
        {
            GridPoint::root_point(storage.num_inputs())
        };
        let seq = storage.find(&point);
        Self { storage, point, seq }
    }

    pub fn set_point(&mut self, point: GridPoint)
    {
        self.point = point;
        self.seq = self.storage.find(&self.point);
    }

    #[inline(always)]
    pub fn seq(&self) -> Option<usize>
    {
        self.seq
    }

    #[inline]
    fn locate(&mut self) -> bool
    {
        self.seq = self.storage.find(&self.point);
        self.seq.is_some()
    }

    ///
    /// Moves to the next point of the same level to the right.
    ///
    pub(crate) fn step_right(&mut self, dim: usize) -> bool
    {
        self.point.index[dim] += 2;
        self.locate()
    }

    ///
    /// Moves to the point of the same level with the given index.
    ///
    pub(crate) fn set_level_index(&mut self, dim: usize, level: LevelType, index: IndexType) -> bool
    {
        self.point.level[dim] = level;
        self.point.index[dim] = index;
        self.locate()
    }
}

impl GridIteratorT for HashMapGridIterator<'_>
{
    #[inline(always)]
    fn point(&self) -> &GridPoint
    {
        &self.point
    }

    fn index(&self) -> Option<usize>
    {
        self.seq
    }

    fn reset_to_level_zero(&mut self) -> bool
    {
        self.point.index.fill(0);
        self.point.level.fill(0);
        self.locate()
    }

    fn reset_to_level_one_all(&mut self) -> bool
    {
        self.point.index.fill(1);
        self.point.level.fill(1);
        self.locate()
    }

    fn reset_to_left_level_zero(&mut self, dim: usize) -> bool
    {
        self.set_level_index(dim, 0, 0)
    }

    fn reset_to_right_level_zero(&mut self, dim: usize) -> bool
    {
        self.set_level_index(dim, 0, 1)
    }

    fn reset_to_level_one(&mut self, dim: usize) -> bool
    {
        self.set_level_index(dim, 1, 1)
    }

    fn left_child(&mut self, dim: usize) -> bool
    {
        let l = self.point.level[dim];
        if l == 0
        {
            return self.reset_to_level_one(dim);
        }
        if l >= MAX_LEVEL
        {
            self.seq = None;
            return false;
        }
        let i = self.point.index[dim];
        self.set_level_index(dim, l + 1, 2 * i - 1)
    }

    fn right_child(&mut self, dim: usize) -> bool
    {
        let l = self.point.level[dim];
        if l == 0
        {
            return self.reset_to_level_one(dim);
        }
        if l >= MAX_LEVEL
        {
            self.seq = None;
            return false;
        }
        let i = self.point.index[dim];
        self.set_level_index(dim, l + 1, 2 * i + 1)
    }

    ///
    /// Moves to the parent in `dim`. A level-one point moves to the left
    /// boundary point; level zero has no parent.
    ///
    fn up(&mut self, dim: usize) -> bool
    {
        let l = self.point.level[dim];
        match l
        {
            0 =>
            {
                self.seq = None;
                false
            },
            1 => self.reset_to_left_level_zero(dim),
            _ =>
            {
                let i = self.point.index[dim];
                self.set_level_index(dim, l - 1, (i >> 1) | 1)
            }
        }
    }

    ///
    /// A point that is not stored has no stored children either.
    ///
    fn is_leaf(&self) -> bool
    {
        match self.seq
        {
            Some(seq) => self.storage.is_leaf(seq),
            None => true,
        }
    }

    fn point_index(&self, dim: usize) -> IndexType
    {
        self.point.index[dim]
    }

    fn point_level(&self, dim: usize) -> LevelType
    {
        self.point.level[dim]
    }
}

#[test]
fn check_navigation_is_a_query()
{
    let mut storage = SparseGridStorage::new(1);
    storage.insert(GridPoint::new(&[1], &[1], true)).expect("insert failed");
    storage.insert(GridPoint::new(&[2], &[1], true)).expect("insert failed");
    let mut iterator = HashMapGridIterator::new(&storage);
    assert_eq!(iterator.index(), Some(0));
    assert!(iterator.left_child(0));
    assert_eq!(iterator.index(), Some(1));
    assert!(iterator.up(0));
    assert!(!iterator.right_child(0));
    assert_eq!(iterator.point_index(0), 3);
    assert!(iterator.is_leaf());
    assert_eq!(storage.len(), 2);
}
