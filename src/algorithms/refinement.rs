use serde::{Deserialize, Serialize};

use crate::{errors::SGError, storage::{GridPoint, LevelType, PointIterator, SparseGridStorage, MAX_LEVEL}};

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefinementOptions
{
    /// Only points with a score strictly above the threshold are refined.
    pub threshold: f64,
    pub max_refined: Option<usize>,
    /// Deepest level per dimension that refinement may create.
    pub level_limits: Option<Vec<LevelType>>,
}

impl RefinementOptions
{
    pub fn new(threshold: f64) -> Self
    {
        Self { threshold, ..Default::default() }
    }

    pub fn with_max_refined(mut self, max_refined: usize) -> Self
    {
        self.max_refined = Some(max_refined);
        self
    }

    pub fn with_level_limits(mut self, level_limits: Vec<LevelType>) -> Self
    {
        self.level_limits = Some(level_limits);
        self
    }
}

///
/// This trait defines operations used for refinement or coarsening. These
/// two operations are never done simultaneously, but provide a common
/// interface to allow user-specified constraints to control either operation.
///
pub trait RefinementFunctor : Send + Sync
{
    ///
    /// Returns one score per point, ordered by sequence number.
    /// `alpha` holds the surpluses and `values` the nodal values.
    ///
    fn eval(&self, points: PointIterator, alpha: &[f64], values: &[f64]) -> Vec<f64>;

    ///
    /// Returns the maximum number of points to be refined. If
    /// set to none there is no limit to the maximum number of points.
    ///
    fn max_num_refined(&self) -> Option<usize>
    {
        None
    }

    ///
    /// Returns the maximum number of points that may be removed
    ///
    fn max_num_removed(&self) -> Option<usize>
    {
        None
    }
}

fn resolve_level_limits(storage: &SparseGridStorage, level_limits: Option<&Vec<LevelType>>) -> Result<Vec<LevelType>, SGError>
{
    match level_limits
    {
        Some(limits) if limits.len() != storage.num_inputs() =>
            Err(SGError::DimensionMismatch { expected: storage.num_inputs(), found: limits.len() }),
        Some(limits) => Ok(limits.iter().map(|&l| l.min(MAX_LEVEL)).collect()),
        None => Ok(vec![MAX_LEVEL; storage.num_inputs()]),
    }
}

///
/// A point is refinable if in some dimension below its level limit at least
/// one of its children is missing.
///
fn is_refinable(storage: &SparseGridStorage, point: &GridPoint, level_limits: &[LevelType]) -> bool
{
    (0..storage.num_inputs()).any(|d|
    {
        if point.level[d] >= level_limits[d]
        {
            return false;
        }
        if point.level[d] == 0
        {
            !storage.contains(&point.root(d))
        }
        else
        {
            !storage.contains(&point.left_child(d)) || !storage.contains(&point.right_child(d))
        }
    })
}

///
/// Inserts points together with every ancestor they require. On grids with
/// boundary the boundary points of level-one points and the opposite boundary
/// point of each level-zero coordinate are created as well.
///
pub struct BaseRefinement
{
    has_boundary: bool,
}

impl BaseRefinement
{
    pub fn new(has_boundary: bool) -> Self
    {
        Self { has_boundary }
    }

    fn create_point(&self, storage: &mut SparseGridStorage, point: GridPoint) -> Result<(), SGError>
    {
        if storage.contains(&point)
        {
            return Ok(());
        }
        for dim in 0..storage.num_inputs()
        {
            self.create_point_1d(storage, &point, dim)?;
        }
        storage.insert(point.clone())?;
        if self.has_boundary
        {
            self.create_level_zero_consistency(storage, &point)?;
        }
        Ok(())
    }

    fn create_point_1d(&self, storage: &mut SparseGridStorage, point: &GridPoint, dim: usize) -> Result<(), SGError>
    {
        match point.level[dim]
        {
            0 => Ok(()),
            1 if !self.has_boundary => Ok(()),
            _ =>
            {
                for ancestor in point.direct_ancestors(dim)
                {
                    self.create_point(storage, ancestor)?;
                }
                Ok(())
            }
        }
    }

    ///
    /// Boundary points come in pairs: if one side exists in a dimension the
    /// other side is created too.
    ///
    fn create_level_zero_consistency(&self, storage: &mut SparseGridStorage, point: &GridPoint) -> Result<(), SGError>
    {
        for dim in 0..storage.num_inputs()
        {
            if point.level[dim] == 0
            {
                let mut opposite = point.clone();
                opposite.index[dim] = 1 - point.index[dim];
                self.create_point(storage, opposite)?;
            }
        }
        Ok(())
    }

    fn refine_1d(&self, storage: &mut SparseGridStorage, point: &GridPoint, dim: usize) -> Result<(), SGError>
    {
        if point.level[dim] == 0
        {
            self.create_point(storage, point.root(dim))
        }
        else
        {
            self.create_point(storage, point.left_child(dim))?;
            self.create_point(storage, point.right_child(dim))
        }
    }

    fn refine_gridpoint(&self, storage: &mut SparseGridStorage, seq: usize, level_limits: &[LevelType]) -> Result<(), SGError>
    {
        let point = storage.point(seq)?;
        for dim in 0..storage.num_inputs()
        {
            if point.level[dim] < level_limits[dim]
            {
                self.refine_1d(storage, &point, dim)?;
            }
        }
        Ok(())
    }

    ///
    /// Refines the refinable points with the largest scores. `scores` is
    /// aligned with sequence numbers; ties are broken by the smaller sequence
    /// number. New points are appended, so existing sequence numbers do not
    /// change. Returns the number of points added.
    ///
    pub fn refine(&self, storage: &mut SparseGridStorage, scores: &[f64], options: &RefinementOptions) -> Result<usize, SGError>
    {
        if scores.len() != storage.len()
        {
            return Err(SGError::NumberOfPointsAndValuesMismatch);
        }
        let level_limits = resolve_level_limits(storage, options.level_limits.as_ref())?;
        let mut candidates = Vec::new();
        for (seq, node) in storage.nodes().enumerate()
        {
            if scores[seq] > options.threshold && is_refinable(storage, &GridPoint::from(node), &level_limits)
            {
                candidates.push((seq, scores[seq]));
            }
        }
        candidates.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        if let Some(max_refined) = options.max_refined
        {
            candidates.truncate(max_refined);
        }
        let num_points = storage.len();
        for &(seq, _) in &candidates
        {
            self.refine_gridpoint(storage, seq, &level_limits)?;
        }
        let added = storage.len() - num_points;
        log::debug!("refined {} points, {} new points, grid now has {} points", candidates.len(), added, storage.len());
        Ok(added)
    }
}

#[test]
fn check_refine_top_scores_first()
{
    let mut storage = SparseGridStorage::new(1);
    crate::generators::regular(&mut storage, 2).expect("Could not generate grid");
    let scores: Vec<f64> = (0..storage.len()).map(|seq| if storage.index(seq, 0) == 3 { 2.0 } else if storage.level(seq, 0) == 2 { 1.0 } else { 0.0 }).collect();
    let added = BaseRefinement::new(false).refine(&mut storage, &scores, &RefinementOptions::new(0.5).with_max_refined(1)).expect("refinement failed");
    assert_eq!(added, 2);
    assert!(storage.contains(&GridPoint::new(&[3], &[5], false)));
    assert!(storage.contains(&GridPoint::new(&[3], &[7], false)));
    assert!(!storage.contains(&GridPoint::new(&[3], &[1], false)));
}

#[test]
fn check_refine_creates_ancestors()
{
    let mut storage = SparseGridStorage::new(2);
    crate::generators::regular(&mut storage, 2).expect("Could not generate grid");
    let seq = storage.find(&GridPoint::new(&[2, 1], &[1, 1], false)).expect("point missing");
    let mut scores = vec![0.0; storage.len()];
    scores[seq] = 1.0;
    BaseRefinement::new(false).refine(&mut storage, &scores, &RefinementOptions::new(0.0)).expect("refinement failed");
    assert!(storage.contains(&GridPoint::new(&[2, 2], &[1, 3], false)));
    assert!(storage.contains(&GridPoint::new(&[3, 1], &[1, 1], false)));
    crate::algorithms::hierarchisation::check_hierarchy(&storage).expect("ancestors missing");
}

#[test]
fn check_refine_respects_level_limits()
{
    let mut storage = SparseGridStorage::new(2);
    crate::generators::regular(&mut storage, 2).expect("Could not generate grid");
    let scores = vec![1.0; storage.len()];
    let options = RefinementOptions::new(0.0).with_level_limits(vec![2, 3]);
    BaseRefinement::new(false).refine(&mut storage, &scores, &options).expect("refinement failed");
    assert!(storage.nodes().all(|node| node.level[0] <= 2 && node.level[1] <= 3));
    let options = RefinementOptions::new(0.0).with_level_limits(vec![2]);
    let scores = vec![1.0; storage.len()];
    assert!(matches!(BaseRefinement::new(false).refine(&mut storage, &scores, &options), Err(SGError::DimensionMismatch { .. })));
}

#[test]
fn check_refine_boundary_consistency()
{
    let mut storage = SparseGridStorage::new(2);
    crate::generators::regular_with_boundaries(&mut storage, 1, 1).expect("Could not generate grid");
    let scores = vec![1.0; storage.len()];
    BaseRefinement::new(true).refine(&mut storage, &scores, &RefinementOptions::new(0.0)).expect("refinement failed");
    crate::algorithms::hierarchisation::check_hierarchy(&storage).expect("ancestors missing");
    for node in storage.nodes()
    {
        let point = GridPoint::from(node);
        for d in 0..2
        {
            if point.level[d] == 0
            {
                let mut opposite = point.clone();
                opposite.index[d] = 1 - point.index[d];
                assert!(storage.contains(&opposite));
            }
        }
    }
}
