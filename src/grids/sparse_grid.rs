use std::io::Write;

use serde::{Deserialize, Serialize};

use crate::algorithms::basis_evaluation::{self, affected_basis_functions};
use crate::algorithms::coarsening::{self, CoarseningOptions};
use crate::algorithms::hierarchisation::hierarchisation_for;
use crate::algorithms::naive_evaluation::{eval_gradient, eval_naive};
use crate::algorithms::refinement::{BaseRefinement, RefinementFunctor, RefinementOptions};
use crate::algorithms::integration;
use crate::basis::base::BasisFunction;
use crate::config::{GridConfig, GridType};
use crate::errors::SGError;
use crate::generators;
use crate::serialization::SerializationFormat;
use crate::storage::{BoundingBox, GridPoint, PointIterator, SparseGridStorage};

fn min_limit(a: Option<usize>, b: Option<usize>) -> Option<usize>
{
    match (a, b)
    {
        (Some(a), Some(b)) => Some(a.min(b)),
        (a, None) => a,
        (None, b) => b,
    }
}

///
/// A sparse grid interpolant: the point set, its basis family and the nodal
/// values and hierarchical surpluses aligned with the sequence numbers.
///
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SparseGrid
{
    pub(crate) grid_type: GridType,
    pub(crate) storage: SparseGridStorage,
    pub(crate) alpha: Vec<f64>,
    pub(crate) values: Vec<f64>,
    #[serde(skip)]
    basis: BasisFunction,
}

impl SparseGrid
{
    pub fn new(grid_type: GridType, num_inputs: usize) -> Result<Self, SGError>
    {
        if num_inputs == 0
        {
            return Err(SGError::InvalidOperation("a grid needs at least one dimension".to_string()));
        }
        let basis = BasisFunction::new(grid_type)?;
        let mut storage = SparseGridStorage::with_distribution(num_inputs, basis.distribution());
        storage.set_has_boundary(grid_type.has_boundary());
        Ok(Self { grid_type, storage, alpha: Vec::new(), values: Vec::new(), basis })
    }

    ///
    /// Builds the regular grid described by `config`.
    ///
    pub fn from_config(config: &GridConfig) -> Result<Self, SGError>
    {
        let mut grid = Self::new(config.grid_type, config.dimension)?;
        if let Some(bounding_box) = config.bounding_box.as_ref()
        {
            grid.set_bounding_box(bounding_box.clone())?;
        }
        grid.sparse_grid_with_boundary_level(config.level, config.boundary_level)?;
        Ok(grid)
    }

    #[inline]
    pub fn grid_type(&self) -> GridType
    {
        self.grid_type
    }

    #[inline]
    pub fn basis(&self) -> &BasisFunction
    {
        &self.basis
    }

    #[inline]
    pub fn storage(&self) -> &SparseGridStorage
    {
        &self.storage
    }

    #[inline]
    pub fn len(&self) -> usize
    {
        self.storage.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool
    {
        self.storage.is_empty()
    }

    #[inline]
    pub fn num_inputs(&self) -> usize
    {
        self.storage.num_inputs()
    }

    #[inline]
    pub fn has_boundary(&self) -> bool
    {
        self.storage.has_boundary()
    }

    pub fn bounding_box(&self) -> &BoundingBox
    {
        self.storage.bounding_box()
    }

    pub fn set_bounding_box(&mut self, bounding_box: BoundingBox) -> Result<(), SGError>
    {
        for len in [bounding_box.lower.len(), bounding_box.upper.len()]
        {
            if len != self.num_inputs()
            {
                return Err(SGError::DimensionMismatch { expected: self.num_inputs(), found: len });
            }
        }
        if (0..self.num_inputs()).any(|d| bounding_box.width(d) <= 0.0)
        {
            return Err(SGError::InvalidOperation("bounding box must have positive width in every dimension".to_string()));
        }
        *self.storage.bounding_box_mut() = bounding_box;
        Ok(())
    }

    pub fn points(&self) -> PointIterator<'_>
    {
        self.storage.points()
    }

    pub fn alpha(&self) -> &[f64]
    {
        &self.alpha
    }

    pub fn values(&self) -> &[f64]
    {
        &self.values
    }

    fn reset_coefficients(&mut self)
    {
        self.alpha.clear();
        self.values.clear();
    }

    ///
    /// Regular sparse grid of the given level. Grids with boundary use a
    /// boundary level of 1.
    ///
    pub fn sparse_grid(&mut self, level: usize) -> Result<(), SGError>
    {
        self.sparse_grid_with_boundary_level(level, 1)
    }

    pub fn sparse_grid_with_boundary_level(&mut self, level: usize, boundary_level: usize) -> Result<(), SGError>
    {
        if self.has_boundary()
        {
            generators::regular_with_boundaries(&mut self.storage, level, boundary_level)?;
        }
        else
        {
            generators::regular(&mut self.storage, level)?;
        }
        self.reset_coefficients();
        Ok(())
    }

    pub fn full_grid(&mut self, level: usize) -> Result<(), SGError>
    {
        if self.has_boundary()
        {
            generators::full_with_boundaries(&mut self.storage, level)?;
        }
        else
        {
            generators::full(&mut self.storage, level)?;
        }
        self.reset_coefficients();
        Ok(())
    }

    ///
    /// Inserts a single point. Existing coefficients are extended with zeros.
    ///
    pub fn insert_point(&mut self, point: GridPoint) -> Result<usize, SGError>
    {
        let seq = self.storage.insert(point)?;
        if !self.alpha.is_empty()
        {
            self.alpha.resize(self.len(), 0.0);
        }
        if !self.values.is_empty()
        {
            self.values.resize(self.len(), 0.0);
        }
        Ok(seq)
    }

    pub fn set_values(&mut self, values: Vec<f64>) -> Result<(), SGError>
    {
        if values.len() != self.len()
        {
            return Err(SGError::NumberOfPointsAndValuesMismatch);
        }
        self.values = values;
        Ok(())
    }

    ///
    /// Evaluates `fun` at every grid point (real coordinates) and stores the results as nodal values.
    ///
    pub fn update_values<F: Fn(&[f64]) -> f64>(&mut self, fun: &F)
    {
        self.values = self.storage.points().map(|x| fun(&x)).collect();
    }

    pub fn set_alpha(&mut self, alpha: Vec<f64>) -> Result<(), SGError>
    {
        if alpha.len() != self.len()
        {
            return Err(SGError::NumberOfPointsAndValuesMismatch);
        }
        self.alpha = alpha;
        Ok(())
    }

    ///
    /// Computes the surpluses from the nodal values.
    ///
    pub fn hierarchize(&mut self) -> Result<(), SGError>
    {
        let mut alpha = self.values.clone();
        hierarchisation_for(self.basis).hierarchize(&mut alpha, &self.storage)?;
        self.alpha = alpha;
        Ok(())
    }

    ///
    /// Recomputes the nodal values from the surpluses.
    ///
    pub fn dehierarchize(&mut self) -> Result<(), SGError>
    {
        let mut values = self.alpha.clone();
        hierarchisation_for(self.basis).dehierarchize(&mut values, &self.storage)?;
        self.values = values;
        Ok(())
    }

    fn to_unit(&self, x: &[f64]) -> Result<Vec<f64>, SGError>
    {
        if x.len() != self.num_inputs()
        {
            return Err(SGError::DimensionMismatch { expected: self.num_inputs(), found: x.len() });
        }
        if !self.bounding_box().contains(x)
        {
            return Err(SGError::OutOfDomain);
        }
        Ok(self.bounding_box().to_unit_coordinate(x))
    }

    ///
    /// Value of the interpolant at the real coordinate `x`.
    ///
    pub fn eval(&self, x: &[f64]) -> Result<f64, SGError>
    {
        let unit = self.to_unit(x)?;
        basis_evaluation::eval(&self.storage, &self.basis, &self.alpha, &unit)
    }

    ///
    /// Same as [`SparseGrid::eval`] but always sums over every point.
    ///
    pub fn eval_naive(&self, x: &[f64]) -> Result<f64, SGError>
    {
        let unit = self.to_unit(x)?;
        eval_naive(&self.storage, &self.basis, &self.alpha, &unit)
    }

    fn check_batch(&self, x: &[f64]) -> Result<(), SGError>
    {
        if x.len() % self.num_inputs() != 0
        {
            return Err(SGError::DimensionMismatch { expected: self.num_inputs(), found: x.len() % self.num_inputs() });
        }
        Ok(())
    }

    ///
    /// Evaluates a batch of points stored contiguously, `num_inputs` values per point.
    ///
    pub fn eval_batch(&self, x: &[f64]) -> Result<Vec<f64>, SGError>
    {
        self.check_batch(x)?;
        x.chunks_exact(self.num_inputs()).map(|xi| self.eval(xi)).collect()
    }

    #[cfg(feature = "rayon")]
    pub fn eval_batch_parallel(&self, x: &[f64]) -> Result<Vec<f64>, SGError>
    {
        use rayon::{iter::ParallelIterator, slice::ParallelSlice};
        self.check_batch(x)?;
        x.par_chunks_exact(self.num_inputs()).map(|xi| self.eval(xi)).collect()
    }

    ///
    /// Gradient of the interpolant with respect to the real coordinates.
    ///
    pub fn gradient(&self, x: &[f64]) -> Result<Vec<f64>, SGError>
    {
        let unit = self.to_unit(x)?;
        let mut gradient = eval_gradient(&self.storage, &self.basis, &self.alpha, &unit)?;
        for (d, g) in gradient.iter_mut().enumerate()
        {
            *g /= self.bounding_box().width(d);
        }
        Ok(gradient)
    }

    ///
    /// Sequence numbers and basis values of all basis functions that are non-zero at `x`.
    ///
    pub fn affected_basis_functions(&self, x: &[f64]) -> Result<Vec<(usize, f64)>, SGError>
    {
        let unit = self.to_unit(x)?;
        affected_basis_functions(&self.storage, &self.basis, &unit)
    }

    ///
    /// Integral of the interpolant over the bounding box.
    ///
    pub fn integrate(&self) -> Result<f64, SGError>
    {
        Ok(self.bounding_box().volume() * integration::integrate(&self.storage, &self.basis, &self.alpha)?)
    }

    fn check_coefficients(&self) -> Result<(), SGError>
    {
        if self.alpha.len() != self.len() || self.values.len() != self.len()
        {
            return Err(SGError::NumberOfPointsAndValuesMismatch);
        }
        Ok(())
    }

    ///
    /// One refinement pass. New points are appended; their surplus is zero and
    /// their nodal value is the current interpolant, so values and surpluses
    /// stay consistent. Returns the number of points added.
    ///
    pub fn refine<F: RefinementFunctor + ?Sized>(&mut self, functor: &F, options: &RefinementOptions) -> Result<usize, SGError>
    {
        self.check_coefficients()?;
        let scores = functor.eval(self.storage.points(), &self.alpha, &self.values);
        let mut options = options.clone();
        options.max_refined = min_limit(options.max_refined, functor.max_num_refined());
        let num_points = self.len();
        let added = BaseRefinement::new(self.has_boundary()).refine(&mut self.storage, &scores, &options)?;
        self.alpha.resize(self.len(), 0.0);
        self.values.reserve(added);
        for seq in num_points..self.len()
        {
            let unit = self.storage.unit_coordinate(seq);
            let value = basis_evaluation::eval(&self.storage, &self.basis, &self.alpha, &unit)?;
            self.values.push(value);
        }
        Ok(added)
    }

    ///
    /// Refines adaptively until the grid holds at least `target_points`
    /// points or no point is refinable. `fun` supplies the nodal value of each
    /// new point. Returns the number of points added.
    ///
    pub fn refine_to<F: Fn(&[f64]) -> f64, R: RefinementFunctor + ?Sized>(&mut self, target_points: usize, fun: &F,
        functor: &R, options: &RefinementOptions) -> Result<usize, SGError>
    {
        if self.values.len() != self.len()
        {
            self.update_values(fun);
        }
        self.hierarchize()?;
        let start = self.len();
        while self.len() < target_points
        {
            let num_points = self.len();
            let added = self.refine(functor, options)?;
            if added == 0
            {
                log::warn!("refinement stopped at {} points before reaching {target_points}", self.len());
                break;
            }
            for seq in num_points..self.len()
            {
                let mut x = self.storage.unit_coordinate(seq);
                self.bounding_box().to_real_coordinate_in_place(&mut x);
                self.values[seq] = fun(&x);
            }
            self.hierarchize()?;
        }
        Ok(self.len() - start)
    }

    ///
    /// One coarsening pass over the leaves. Returns the number of points removed.
    ///
    pub fn coarsen<F: RefinementFunctor + ?Sized>(&mut self, functor: &F, options: &CoarseningOptions) -> Result<usize, SGError>
    {
        self.check_coefficients()?;
        let scores = functor.eval(self.storage.points(), &self.alpha, &self.values);
        let mut options = options.clone();
        options.max_removed = min_limit(options.max_removed, functor.max_num_removed());
        let removed = coarsening::coarsen(&mut self.storage, &scores, &options)?;
        self.alpha = SparseGridStorage::compact_coefficients(&self.alpha, &removed);
        self.values = SparseGridStorage::compact_coefficients(&self.values, &removed);
        Ok(removed.len())
    }

    ///
    /// Rebuilds everything that is not serialized.
    ///
    fn restore(&mut self) -> Result<(), SGError>
    {
        self.basis = BasisFunction::new(self.grid_type)?;
        if self.storage.has_boundary() != self.grid_type.has_boundary()
        {
            return Err(SGError::DeserializationFailed("boundary flag does not match grid type".to_string()));
        }
        self.storage.rebuild_map().map_err(SGError::DeserializationFailed)?;
        for len in [self.alpha.len(), self.values.len()]
        {
            if len != 0 && len != self.len()
            {
                return Err(SGError::NumberOfPointsAndValuesMismatch);
            }
        }
        Ok(())
    }

    pub fn to_bytes(&self, format: SerializationFormat) -> Result<Vec<u8>, SGError>
    {
        crate::serialization::serialize(self, format)
    }

    pub fn from_bytes(buffer: &[u8], format: SerializationFormat) -> Result<Self, SGError>
    {
        let mut grid: Self = crate::serialization::deserialize(buffer, format)?;
        grid.restore()?;
        log::debug!("read grid with {} points", grid.len());
        Ok(grid)
    }

    pub fn write(&self, path: &str, format: SerializationFormat) -> Result<(), SGError>
    {
        let mut file = std::io::BufWriter::new(std::fs::File::create(path)?);
        file.write_all(&self.to_bytes(format)?)?;
        file.flush()?;
        Ok(())
    }

    pub fn read<Reader: std::io::Read>(mut reader: Reader, format: SerializationFormat) -> Result<Self, SGError>
    {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;
        Self::from_bytes(&bytes, format)
    }
}

#[test]
fn check_out_of_domain()
{
    let mut grid = SparseGrid::new(GridType::Linear, 2).expect("could not create grid");
    grid.set_bounding_box(BoundingBox::new(&[-1.0, 0.0], &[1.0, 2.0])).expect("invalid bounding box");
    grid.sparse_grid(2).expect("could not generate grid");
    grid.update_values(&|x: &[f64]| x[0] + x[1]);
    grid.hierarchize().expect("hierarchisation failed");
    assert_eq!(grid.eval(&[1.5, 0.0]), Err(SGError::OutOfDomain));
    assert_eq!(grid.eval(&[0.0]), Err(SGError::DimensionMismatch { expected: 2, found: 1 }));
    assert!(grid.eval(&[1.0, 2.0]).is_ok());
}

#[test]
fn check_refine_keeps_interpolant()
{
    let mut grid = SparseGrid::new(GridType::Linear, 2).expect("could not create grid");
    grid.sparse_grid(2).expect("could not generate grid");
    grid.update_values(&|x: &[f64]| (x[0] * x[1]).sqrt());
    grid.hierarchize().expect("hierarchisation failed");
    let x = [0.3, 0.6];
    let before = grid.eval(&x).expect("evaluation failed");
    let added = grid.refine(&crate::refinement::surplus::SurplusRefinement::default(), &RefinementOptions::new(0.0)).expect("refinement failed");
    assert!(added > 0);
    assert_eq!(grid.alpha().len(), grid.len());
    assert_eq!(grid.values().len(), grid.len());
    assert!((grid.eval(&x).expect("evaluation failed") - before).abs() < 1e-14);
}

#[cfg(test)]
fn tampered_bytes(edit: impl Fn(&mut serde_json::Value)) -> Vec<u8>
{
    let mut grid = SparseGrid::new(GridType::Linear, 2).expect("could not create grid");
    grid.sparse_grid(2).expect("could not generate grid");
    grid.update_values(&|x: &[f64]| x[0] * x[1]);
    let bytes = grid.to_bytes(SerializationFormat::Json).expect("serialization failed");
    let mut value: serde_json::Value = serde_json::from_slice(&bytes).expect("invalid json");
    edit(&mut value);
    serde_json::to_vec(&value).expect("serialization failed")
}

#[test]
fn check_restore_rejects_inconsistent_storage()
{
    let is_rejected = |bytes: Vec<u8>| matches!(SparseGrid::from_bytes(&bytes, SerializationFormat::Json), Err(SGError::DeserializationFailed(_)));
    // untouched file still loads
    assert!(SparseGrid::from_bytes(&tampered_bytes(|_| {}), SerializationFormat::Json).is_ok());
    // fewer levels than points
    assert!(is_rejected(tampered_bytes(|v| v["storage"]["level"] = serde_json::json!([1, 1]))));
    // every point collapses onto the root
    assert!(is_rejected(tampered_bytes(|v| {
        v["storage"]["level"] = serde_json::Value::from(vec![1_u8; 10]);
        v["storage"]["index"] = serde_json::Value::from(vec![1_u8; 10]);
    })));
    // level beyond the hierarchy
    assert!(is_rejected(tampered_bytes(|v| v["storage"]["level"][0] = serde_json::json!(40))));
    // even index
    assert!(is_rejected(tampered_bytes(|v| v["storage"]["index"][0] = serde_json::json!(2))));
    // boundary point in a grid without boundary
    assert!(is_rejected(tampered_bytes(|v| {
        v["storage"]["level"][0] = serde_json::json!(0);
        v["storage"]["index"][0] = serde_json::json!(0);
    })));
    // bounding box of the wrong dimension
    assert!(is_rejected(tampered_bytes(|v| v["storage"]["bounding_box"]["lower"] = serde_json::json!([0.0]))));
}
