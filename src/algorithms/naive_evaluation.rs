use std::ops::AddAssign;

use num_traits::{Float, NumCast};

use crate::{basis::base::{Basis, BasisFunction}, errors::SGError, storage::SparseGridStorage};

///
/// `x` must be a unit coordinate of the grid's dimension. NaN is out of domain.
///
pub(crate) fn check_point(storage: &SparseGridStorage, x: &[f64]) -> Result<(), SGError>
{
    if x.len() != storage.num_inputs()
    {
        return Err(SGError::DimensionMismatch { expected: storage.num_inputs(), found: x.len() });
    }
    if x.iter().any(|xd| !(0.0..=1.0).contains(xd))
    {
        return Err(SGError::OutOfDomain);
    }
    Ok(())
}

pub(crate) fn check_inputs<T>(storage: &SparseGridStorage, alpha: &[T], x: &[f64]) -> Result<(), SGError>
{
    if alpha.len() != storage.len()
    {
        return Err(SGError::NumberOfPointsAndValuesMismatch);
    }
    check_point(storage, x)
}

///
/// Sums `alpha_k * phi_k(x)` over every stored point. Works for any basis and
/// any point set, including grids with missing ancestors.
///
pub fn eval_naive<T: Float + AddAssign>(storage: &SparseGridStorage, basis: &BasisFunction, alpha: &[T], x: &[f64]) -> Result<T, SGError>
{
    check_inputs(storage, alpha, x)?;
    let mut r = T::zero();
    for (seq, &a) in alpha.iter().enumerate()
    {
        let mut product = 1.0;
        for (d, &xd) in x.iter().enumerate()
        {
            product *= basis.eval(storage.level(seq, d), storage.index(seq, d), xd);
            if product == 0.0
            {
                break;
            }
        }
        if product != 0.0
        {
            r += a * <T as NumCast>::from(product).unwrap_or_else(T::nan);
        }
    }
    Ok(r)
}

///
/// Gradient of the interpolant with respect to the unit coordinate `x`.
///
pub fn eval_gradient(storage: &SparseGridStorage, basis: &BasisFunction, alpha: &[f64], x: &[f64]) -> Result<Vec<f64>, SGError>
{
    check_inputs(storage, alpha, x)?;
    let ndim = storage.num_inputs();
    let mut gradient = vec![0.0; ndim];
    let mut values = vec![0.0; ndim];
    let mut derivs = vec![0.0; ndim];
    for (seq, &a) in alpha.iter().enumerate()
    {
        if a == 0.0
        {
            continue;
        }
        for d in 0..ndim
        {
            values[d] = basis.eval(storage.level(seq, d), storage.index(seq, d), x[d]);
            derivs[d] = basis.eval_deriv(storage.level(seq, d), storage.index(seq, d), x[d]);
        }
        for (d, g) in gradient.iter_mut().enumerate()
        {
            let partial: f64 = (0..ndim).map(|k| if k == d { derivs[k] } else { values[k] }).product();
            *g += a * partial;
        }
    }
    Ok(gradient)
}

#[test]
fn check_gradient_of_bilinear_surplus()
{
    use crate::config::GridType;
    let mut storage = SparseGridStorage::new(2);
    crate::generators::regular(&mut storage, 1).expect("Could not generate grid");
    let basis = BasisFunction::new(GridType::Linear).expect("linear basis");
    // single root hat: phi(x, y) = (1 - |2x - 1|)(1 - |2y - 1|)
    let gradient = eval_gradient(&storage, &basis, &[2.0], &[0.25, 0.75]).expect("gradient failed");
    assert!((gradient[0] - 2.0 * 2.0 * 0.5).abs() < 1e-14);
    assert!((gradient[1] + 2.0 * 2.0 * 0.5).abs() < 1e-14);
}

#[test]
fn check_naive_f32()
{
    use crate::config::GridType;
    let mut storage = SparseGridStorage::new(1);
    crate::generators::regular(&mut storage, 2).expect("Could not generate grid");
    let basis = BasisFunction::new(GridType::Linear).expect("linear basis");
    let alpha = vec![1.0_f32; storage.len()];
    let r = eval_naive(&storage, &basis, &alpha, &[0.25]).expect("evaluation failed");
    assert!((r - 1.5).abs() < 1e-6);
}

#[test]
fn check_unit_domain()
{
    use crate::config::GridType;
    let mut storage = SparseGridStorage::new(1);
    crate::generators::regular(&mut storage, 3).expect("Could not generate grid");
    let basis = BasisFunction::new(GridType::Linear).expect("linear basis");
    let alpha = vec![1.0; storage.len()];
    assert_eq!(eval_naive(&storage, &basis, &alpha, &[1.7]), Err(SGError::OutOfDomain));
    assert_eq!(eval_naive(&storage, &basis, &alpha, &[f64::NAN]), Err(SGError::OutOfDomain));
    assert_eq!(eval_gradient(&storage, &basis, &alpha, &[-0.1]), Err(SGError::OutOfDomain));
    assert!(eval_naive(&storage, &basis, &alpha, &[1.0]).is_ok());
    assert!(eval_naive(&storage, &basis, &alpha, &[0.0]).is_ok());
}
