use nalgebra::{DMatrix, DVector};

use crate::{basis::base::{Basis, BasisFunction}, errors::SGError,
    iterators::grid_iterator::{GridIteratorT, HashMapGridIterator},
    storage::{GridPoint, IndexType, LevelType, SparseGridStorage, MAX_LEVEL}};

use super::sweep::{sweep_1d_in_place, SweepFunction};

pub trait HierarchisationOperation
{
    /// Converts nodal values into hierarchical surpluses in place.
    fn hierarchize(&self, values: &mut [f64], storage: &SparseGridStorage) -> Result<(), SGError>;
    /// Converts surpluses back into nodal values in place.
    fn dehierarchize(&self, alpha: &mut [f64], storage: &SparseGridStorage) -> Result<(), SGError>;
}

///
/// Picks the pole sweep for cell-local families and the dense solve otherwise.
///
pub fn hierarchisation_for(basis: BasisFunction) -> Box<dyn HierarchisationOperation>
{
    if basis.is_cell_local()
    {
        Box::new(SweepHierarchisation::new(basis))
    }
    else
    {
        Box::new(LinearSystemHierarchisation::new(basis))
    }
}

///
/// Verifies that every point's hierarchical ancestors are stored: the parent
/// for points above level one and, on grids with boundary, both boundary
/// points for points at level one.
///
pub fn check_hierarchy(storage: &SparseGridStorage) -> Result<(), SGError>
{
    for node in storage.nodes()
    {
        let point = GridPoint::from(node);
        for dim in 0..storage.num_inputs()
        {
            if point.level[dim] == 1 && !storage.has_boundary()
            {
                continue;
            }
            if let Some(missing) = point.direct_ancestors(dim).into_iter().find(|a| !storage.contains(a))
            {
                return Err(SGError::UnsupportedConfiguration(format!("point {:?}/{:?} is missing ancestor {:?}/{:?} in dimension {dim}",
                    point.level, point.index, missing.level, missing.index)));
            }
        }
    }
    Ok(())
}

fn check_lengths(values: &[f64], storage: &SparseGridStorage) -> Result<(), SGError>
{
    if values.len() != storage.len()
    {
        return Err(SGError::NumberOfPointsAndValuesMismatch);
    }
    Ok(())
}

#[derive(Clone, Copy)]
struct PoleNode
{
    seq: usize,
    level: LevelType,
    index: IndexType,
}

///
/// Collects the boundary points of the pole and leaves the iterator at the
/// level-one point.
///
fn pole_boundary(iterator: &mut HashMapGridIterator, dim: usize) -> Result<Vec<PoleNode>, SGError>
{
    let mut path = Vec::new();
    if iterator.storage.has_boundary()
    {
        for index in 0..2
        {
            iterator.set_level_index(dim, 0, index);
            let seq = iterator.seq().ok_or_else(|| SGError::UnsupportedConfiguration(
                format!("pole in dimension {dim} is missing a boundary point")))?;
            path.push(PoleNode { seq, level: 0, index });
        }
        iterator.reset_to_level_one(dim);
    }
    Ok(path)
}

#[inline]
fn ancestor_sum(basis: &BasisFunction, values: &[f64], path: &[PoleNode], x: f64) -> f64
{
    path.iter().map(|a| values[a.seq] * basis.eval(a.level, a.index, x)).sum()
}

struct HierarchiseSweep
{
    basis: BasisFunction,
}

impl HierarchiseSweep
{
    fn recurse(&self, values: &mut [f64], iterator: &mut HashMapGridIterator, dim: usize, path: &mut Vec<PoleNode>)
    {
        let Some(seq) = iterator.seq() else { return; };
        let (level, index) = (iterator.point_level(dim), iterator.point_index(dim));
        let correction = ancestor_sum(&self.basis, values, path, self.basis.node(level, index));
        values[seq] -= correction;
        if iterator.is_leaf() || level >= MAX_LEVEL
        {
            return;
        }
        path.push(PoleNode { seq, level, index });
        if iterator.left_child(dim)
        {
            self.recurse(values, iterator, dim, path);
        }
        if iterator.step_right(dim)
        {
            self.recurse(values, iterator, dim, path);
        }
        iterator.up(dim);
        path.pop();
    }
}

impl SweepFunction for HierarchiseSweep
{
    fn execute_in_place(&mut self, values: &mut [f64], iterator: &mut HashMapGridIterator, dim: usize) -> Result<(), SGError>
    {
        let mut path = pole_boundary(iterator, dim)?;
        self.recurse(values, iterator, dim, &mut path);
        Ok(())
    }
}

struct DehierarchiseSweep
{
    basis: BasisFunction,
}

impl DehierarchiseSweep
{
    fn recurse(&self, values: &mut [f64], iterator: &mut HashMapGridIterator, dim: usize, path: &mut Vec<PoleNode>)
    {
        let Some(seq) = iterator.seq() else { return; };
        let (level, index) = (iterator.point_level(dim), iterator.point_index(dim));
        if !iterator.is_leaf() && level < MAX_LEVEL
        {
            // children first, while this point still holds its surplus
            path.push(PoleNode { seq, level, index });
            if iterator.left_child(dim)
            {
                self.recurse(values, iterator, dim, path);
            }
            if iterator.step_right(dim)
            {
                self.recurse(values, iterator, dim, path);
            }
            iterator.up(dim);
            path.pop();
        }
        let correction = ancestor_sum(&self.basis, values, path, self.basis.node(level, index));
        values[seq] += correction;
    }
}

impl SweepFunction for DehierarchiseSweep
{
    fn execute_in_place(&mut self, values: &mut [f64], iterator: &mut HashMapGridIterator, dim: usize) -> Result<(), SGError>
    {
        let mut path = pole_boundary(iterator, dim)?;
        self.recurse(values, iterator, dim, &mut path);
        Ok(())
    }
}

///
/// Hierarchisation by one-dimensional sweeps along every dimension. Requires a
/// cell-local basis and a grid that contains all hierarchical ancestors.
///
#[derive(Clone, Copy)]
pub struct SweepHierarchisation
{
    basis: BasisFunction,
}

impl SweepHierarchisation
{
    pub fn new(basis: BasisFunction) -> Self
    {
        Self { basis }
    }
}

impl HierarchisationOperation for SweepHierarchisation
{
    fn hierarchize(&self, values: &mut [f64], storage: &SparseGridStorage) -> Result<(), SGError>
    {
        check_lengths(values, storage)?;
        check_hierarchy(storage)?;
        let mut func = HierarchiseSweep { basis: self.basis };
        for d in 0..storage.num_inputs()
        {
            sweep_1d_in_place(&mut func, storage, values, d)?;
        }
        Ok(())
    }

    fn dehierarchize(&self, alpha: &mut [f64], storage: &SparseGridStorage) -> Result<(), SGError>
    {
        check_lengths(alpha, storage)?;
        check_hierarchy(storage)?;
        let mut func = DehierarchiseSweep { basis: self.basis };
        for d in 0..storage.num_inputs()
        {
            sweep_1d_in_place(&mut func, storage, alpha, d)?;
        }
        Ok(())
    }
}

///
/// Hierarchisation by solving the dense interpolation system `A alpha = v`
/// with `A[r][c] = phi_c(x_r)`.
///
#[derive(Clone, Copy)]
pub struct LinearSystemHierarchisation
{
    basis: BasisFunction,
}

impl LinearSystemHierarchisation
{
    pub fn new(basis: BasisFunction) -> Self
    {
        Self { basis }
    }

    fn interpolation_matrix(&self, storage: &SparseGridStorage) -> Result<DMatrix<f64>, SGError>
    {
        let n = storage.len();
        let ndim = storage.num_inputs();
        let nodes: Vec<f64> = (0..n).flat_map(|seq| (0..ndim).map(move |d| (seq, d)))
            .map(|(seq, d)| self.basis.node(storage.level(seq, d), storage.index(seq, d))).collect();
        let mut entries = matrix_buffer(n)?;
        // column-major, as nalgebra stores it
        for col in 0..n
        {
            entries.extend((0..n).map(|row|
            {
                let mut r = 1.0;
                for d in 0..ndim
                {
                    r *= self.basis.eval(storage.level(col, d), storage.index(col, d), nodes[row * ndim + d]);
                    if r == 0.0
                    {
                        break;
                    }
                }
                r
            }));
        }
        Ok(DMatrix::from_vec(n, n, entries))
    }
}

///
/// Empty buffer with room for an `n` x `n` matrix. Fails instead of aborting
/// when the allocation cannot be made.
///
fn matrix_buffer(n: usize) -> Result<Vec<f64>, SGError>
{
    let len = n.checked_mul(n).ok_or(SGError::ResourceExhausted)?;
    let mut entries = Vec::new();
    entries.try_reserve_exact(len)?;
    Ok(entries)
}

impl HierarchisationOperation for LinearSystemHierarchisation
{
    fn hierarchize(&self, values: &mut [f64], storage: &SparseGridStorage) -> Result<(), SGError>
    {
        check_lengths(values, storage)?;
        check_hierarchy(storage)?;
        log::debug!("solving dense interpolation system with {} unknowns", storage.len());
        let matrix = self.interpolation_matrix(storage)?;
        let rhs = DVector::from_column_slice(values);
        let alpha = matrix.lu().solve(&rhs).ok_or_else(||
            SGError::UnsupportedConfiguration("interpolation matrix is singular".to_string()))?;
        values.copy_from_slice(alpha.as_slice());
        Ok(())
    }

    fn dehierarchize(&self, alpha: &mut [f64], storage: &SparseGridStorage) -> Result<(), SGError>
    {
        check_lengths(alpha, storage)?;
        let matrix = self.interpolation_matrix(storage)?;
        let values = matrix * DVector::from_column_slice(alpha);
        alpha.copy_from_slice(values.as_slice());
        Ok(())
    }
}

#[cfg(test)]
fn node_values<F: Fn(&[f64]) -> f64>(storage: &SparseGridStorage, basis: &BasisFunction, f: F) -> Vec<f64>
{
    (0..storage.len()).map(|seq|
    {
        let x: Vec<f64> = (0..storage.num_inputs()).map(|d| basis.node(storage.level(seq, d), storage.index(seq, d))).collect();
        f(&x)
    }).collect()
}

#[test]
fn check_hierarchize_1d_example()
{
    let mut storage = SparseGridStorage::new(1);
    crate::generators::regular(&mut storage, 2).expect("Could not generate grid");
    let basis = BasisFunction::new(crate::config::GridType::Linear).expect("linear basis");
    let mut values = node_values(&storage, &basis, |x| if x[0] == 0.5 { 1.0 } else { 0.0 });
    SweepHierarchisation::new(basis).hierarchize(&mut values, &storage).expect("hierarchisation failed");
    for seq in 0..storage.len()
    {
        let expected = if storage.level(seq, 0) == 1 { 1.0 } else { -0.5 };
        assert_eq!(values[seq], expected);
    }
}

#[test]
fn check_sweep_matches_linear_system()
{
    use crate::config::GridType;
    for grid_type in [GridType::LinearBoundary, GridType::ModLinear, GridType::LinearClenshawCurtisBoundary]
    {
        let mut storage = SparseGridStorage::with_distribution(2, BasisFunction::new(grid_type).expect("basis").distribution());
        if grid_type.has_boundary()
        {
            crate::generators::regular_with_boundaries(&mut storage, 3, 1).expect("Could not generate grid");
        }
        else
        {
            crate::generators::regular(&mut storage, 3).expect("Could not generate grid");
        }
        let basis = BasisFunction::new(grid_type).expect("basis");
        let values = node_values(&storage, &basis, |x| (3.0 * x[0]).sin() * (1.0 + x[1] * x[1]));
        let mut alpha_sweep = values.clone();
        SweepHierarchisation::new(basis).hierarchize(&mut alpha_sweep, &storage).expect("hierarchisation failed");
        let mut alpha_dense = values.clone();
        LinearSystemHierarchisation::new(basis).hierarchize(&mut alpha_dense, &storage).expect("hierarchisation failed");
        for (a, b) in alpha_sweep.iter().zip(alpha_dense.iter())
        {
            assert!((a - b).abs() < 1e-10, "{grid_type:?}: {a} != {b}");
        }
        SweepHierarchisation::new(basis).dehierarchize(&mut alpha_sweep, &storage).expect("dehierarchisation failed");
        for (a, b) in alpha_sweep.iter().zip(values.iter())
        {
            assert!((a - b).abs() < 1e-12);
        }
    }
}

#[test]
fn check_missing_ancestor_is_rejected()
{
    let mut storage = SparseGridStorage::new(1);
    storage.insert(GridPoint::new(&[2], &[1], true)).expect("insert failed");
    let basis = BasisFunction::new(crate::config::GridType::Linear).expect("linear basis");
    let mut values = vec![1.0];
    assert!(matches!(SweepHierarchisation::new(basis).hierarchize(&mut values, &storage), Err(SGError::UnsupportedConfiguration(_))));
    let mut values = vec![1.0, 2.0];
    assert_eq!(SweepHierarchisation::new(basis).hierarchize(&mut values, &storage), Err(SGError::NumberOfPointsAndValuesMismatch));
}

#[test]
fn check_matrix_buffer_exhaustion()
{
    assert_eq!(matrix_buffer(usize::MAX).err(), Some(SGError::ResourceExhausted));
    // fits in usize but not in any address space
    assert_eq!(matrix_buffer(1 << 31).err(), Some(SGError::ResourceExhausted));
    assert_eq!(matrix_buffer(4).map(|b| b.capacity() >= 16), Ok(true));
}
