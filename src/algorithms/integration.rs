use crate::{basis::base::{Basis, BasisFunction}, errors::SGError, storage::SparseGridStorage};

///
/// Integral of the interpolant over the unit hypercube: the sum of each
/// surplus times the product of the one-dimensional basis integrals.
///
pub fn integrate(storage: &SparseGridStorage, basis: &BasisFunction, alpha: &[f64]) -> Result<f64, SGError>
{
    if alpha.len() != storage.len()
    {
        return Err(SGError::NumberOfPointsAndValuesMismatch);
    }
    let mut r = 0.0;
    for (seq, &a) in alpha.iter().enumerate()
    {
        if a == 0.0
        {
            continue;
        }
        let weight: f64 = (0..storage.num_inputs()).map(|d| basis.integral(storage.level(seq, d), storage.index(seq, d))).product();
        r += a * weight;
    }
    Ok(r)
}

#[test]
fn check_integrate_root_hat()
{
    use crate::config::GridType;
    let mut storage = SparseGridStorage::new(3);
    crate::generators::regular(&mut storage, 1).expect("Could not generate grid");
    let basis = BasisFunction::new(GridType::Linear).expect("linear basis");
    assert!((integrate(&storage, &basis, &[1.0]).expect("integration failed") - 0.125).abs() < 1e-15);
    let basis = BasisFunction::new(GridType::ModLinear).expect("modlinear basis");
    assert!((integrate(&storage, &basis, &[1.0]).expect("integration failed") - 1.0).abs() < 1e-15);
}
