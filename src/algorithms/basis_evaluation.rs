use std::ops::AddAssign;

use num_traits::{Float, NumCast};

use crate::{basis::base::{Basis, BasisFunction}, errors::SGError,
    iterators::grid_iterator::{GridIteratorT, HashMapGridIterator}, storage::{SparseGridStorage, MAX_LEVEL}};

use super::naive_evaluation::{check_inputs, check_point, eval_naive};

///
/// Evaluates a sparse grid interpolant by descending the hierarchy one
/// dimension at a time, visiting only basis functions that are non-zero at the
/// evaluation point. Exact for cell-local bases on grids containing all
/// hierarchical ancestors.
///
pub struct BasisEvaluation<'a>
{
    storage: &'a SparseGridStorage,
    basis: &'a BasisFunction,
}

impl<'a> BasisEvaluation<'a>
{
    pub fn new(storage: &'a SparseGridStorage, basis: &'a BasisFunction) -> Self
    {
        Self { storage, basis }
    }

    #[inline]
    fn reset_dim(&self, iterator: &mut HashMapGridIterator, dim: usize)
    {
        if self.storage.has_boundary()
        {
            iterator.reset_to_left_level_zero(dim);
        }
        else
        {
            iterator.reset_to_level_one(dim);
        }
    }

    #[inline]
    fn visit<V: FnMut(usize, f64)>(&self, x: &[f64], dim: usize, seq: usize, value: f64, iterator: &mut HashMapGridIterator, visitor: &mut V)
    {
        if dim + 1 == self.storage.num_inputs()
        {
            visitor(seq, value);
        }
        else
        {
            self.recursive_eval(x, dim + 1, value, iterator, visitor);
        }
    }

    fn recursive_eval<V: FnMut(usize, f64)>(&self, x: &[f64], dim: usize, value: f64, iterator: &mut HashMapGridIterator, visitor: &mut V)
    {
        let xd = x[dim];
        if self.storage.has_boundary()
        {
            for boundary_index in 0..2
            {
                let v = self.basis.eval(0, boundary_index, xd);
                if !iterator.set_level_index(dim, 0, boundary_index) || v == 0.0
                {
                    continue;
                }
                if let Some(seq) = iterator.seq()
                {
                    self.visit(x, dim, seq, value * v, iterator, visitor);
                }
            }
            iterator.reset_to_level_one(dim);
        }
        while let Some(seq) = iterator.seq()
        {
            let level = iterator.point_level(dim);
            let index = iterator.point_index(dim);
            let v = self.basis.eval(level, index, xd);
            if v == 0.0
            {
                break;
            }
            self.visit(x, dim, seq, value * v, iterator, visitor);
            if iterator.is_leaf() || level >= MAX_LEVEL
            {
                break;
            }
            let node = self.basis.node(level, index);
            let moved = if xd < node
            {
                iterator.left_child(dim)
            }
            else if xd > node
            {
                iterator.right_child(dim)
            }
            else
            {
                false
            };
            if !moved
            {
                break;
            }
        }
        self.reset_dim(iterator, dim);
    }

    ///
    /// Calls `visitor(seq, phi_seq(x))` for every stored point whose basis
    /// function is non-zero at the unit coordinate `x`.
    ///
    pub fn for_each_affected<V: FnMut(usize, f64)>(&self, x: &[f64], visitor: &mut V)
    {
        if self.storage.is_empty()
        {
            return;
        }
        let mut iterator = HashMapGridIterator::new(self.storage);
        if self.storage.has_boundary()
        {
            iterator.reset_to_level_zero();
        }
        else
        {
            iterator.reset_to_level_one_all();
        }
        self.recursive_eval(x, 0, 1.0, &mut iterator, visitor);
    }

    pub fn eval<T: Float + AddAssign>(&self, x: &[f64], alpha: &[T]) -> T
    {
        let mut r = T::zero();
        self.for_each_affected(x, &mut |seq, v| r += alpha[seq] * <T as NumCast>::from(v).unwrap_or_else(T::nan));
        r
    }
}


///
/// Recursive evaluation at the unit coordinate `x`.
///
pub fn eval_recursive<T: Float + AddAssign>(storage: &SparseGridStorage, basis: &BasisFunction, alpha: &[T], x: &[f64]) -> Result<T, SGError>
{
    check_inputs(storage, alpha, x)?;
    Ok(BasisEvaluation::new(storage, basis).eval(x, alpha))
}

///
/// Evaluates with the recursive evaluator when the basis allows it and falls
/// back to summing over all points otherwise.
///
pub fn eval<T: Float + AddAssign>(storage: &SparseGridStorage, basis: &BasisFunction, alpha: &[T], x: &[f64]) -> Result<T, SGError>
{
    if basis.is_cell_local()
    {
        eval_recursive(storage, basis, alpha, x)
    }
    else
    {
        eval_naive(storage, basis, alpha, x)
    }
}

///
/// All (sequence number, basis value) pairs with a non-zero basis value at `x`.
///
pub fn affected_basis_functions(storage: &SparseGridStorage, basis: &BasisFunction, x: &[f64]) -> Result<Vec<(usize, f64)>, SGError>
{
    check_point(storage, x)?;
    let mut r = Vec::new();
    if basis.is_cell_local()
    {
        BasisEvaluation::new(storage, basis).for_each_affected(x, &mut |seq, v| r.push((seq, v)));
    }
    else
    {
        for seq in 0..storage.len()
        {
            let v: f64 = (0..storage.num_inputs()).map(|d| basis.eval(storage.level(seq, d), storage.index(seq, d), x[d])).product();
            if v != 0.0
            {
                r.push((seq, v));
            }
        }
    }
    Ok(r)
}

#[test]
fn check_affected_basis_functions_1d()
{
    use crate::config::GridType;
    let mut storage = SparseGridStorage::new(1);
    crate::generators::regular(&mut storage, 3).expect("Could not generate grid");
    let basis = BasisFunction::new(GridType::Linear).expect("linear basis");
    let mut affected = affected_basis_functions(&storage, &basis, &[0.3]).expect("evaluation failed");
    affected.sort_by_key(|&(seq, _)| storage.level(seq, 0));
    assert_eq!(affected.len(), 3);
    assert!((affected[0].1 - 0.6).abs() < 1e-12);
    assert!((affected[1].1 - 0.8).abs() < 1e-12);
    assert!((affected[2].1 - 0.4).abs() < 1e-12);
    // finer functions vanish at the node of level one
    let affected = affected_basis_functions(&storage, &basis, &[0.5]).expect("evaluation failed");
    assert_eq!(affected.len(), 1);
}

#[test]
fn check_recursive_matches_naive_boundary()
{
    use crate::config::GridType;
    let mut storage = SparseGridStorage::new(3);
    crate::generators::regular_with_boundaries(&mut storage, 3, 1).expect("Could not generate grid");
    let basis = BasisFunction::new(GridType::LinearBoundary).expect("linear basis");
    let alpha: Vec<f64> = (0..storage.len()).map(|i| ((i * 7919) % 13) as f64 - 6.0).collect();
    for x in [[0.1, 0.2, 0.3], [0.0, 0.5, 1.0], [0.77, 0.01, 0.5], [1.0, 1.0, 1.0]]
    {
        let r = eval_recursive(&storage, &basis, &alpha, &x).expect("evaluation failed");
        let n = eval_naive(&storage, &basis, &alpha, &x).expect("evaluation failed");
        assert!((r - n).abs() < 1e-12, "{x:?}: {r} != {n}");
    }
}

#[test]
fn check_eval_input_errors()
{
    let mut storage = SparseGridStorage::new(2);
    crate::generators::regular(&mut storage, 2).expect("Could not generate grid");
    let basis = BasisFunction::new(crate::config::GridType::Linear).expect("linear basis");
    let alpha = vec![0.0; storage.len()];
    assert_eq!(eval(&storage, &basis, &alpha, &[0.5]), Err(SGError::DimensionMismatch { expected: 2, found: 1 }));
    assert_eq!(eval(&storage, &basis, &alpha[1..], &[0.5, 0.5]), Err(SGError::NumberOfPointsAndValuesMismatch));
}

#[test]
fn check_unit_domain_recursive()
{
    use crate::config::GridType;
    let mut storage = SparseGridStorage::new(2);
    crate::generators::regular_with_boundaries(&mut storage, 2, 1).expect("Could not generate grid");
    let basis = BasisFunction::new(GridType::LinearBoundary).expect("linear basis");
    let alpha = vec![1.0; storage.len()];
    assert_eq!(eval_recursive(&storage, &basis, &alpha, &[-3.0, 0.5]), Err(SGError::OutOfDomain));
    assert_eq!(eval(&storage, &basis, &alpha, &[0.5, f64::NAN]), Err(SGError::OutOfDomain));
    assert_eq!(affected_basis_functions(&storage, &basis, &[0.5, 1.5]), Err(SGError::OutOfDomain));
    assert_eq!(affected_basis_functions(&storage, &basis, &[0.5]), Err(SGError::DimensionMismatch { expected: 2, found: 1 }));
    // a constant surplus on the boundary grid sums to one at the corner
    assert!((eval_recursive(&storage, &basis, &alpha, &[1.0, 1.0]).expect("evaluation failed") - 1.0).abs() < 1e-12);
}
