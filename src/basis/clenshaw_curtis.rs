use crate::storage::{coordinate_1d, IndexType, LevelType, PointDistribution};

use super::base::Basis;

///
/// Piecewise linear hats on Clenshaw-Curtis points `(1 - cos(pi i / 2^l)) / 2`.
/// Each hat rises linearly from the left neighbour node of its level to its
/// own node and falls to the right neighbour node.
///
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LinearClenshawCurtisBasis;

impl LinearClenshawCurtisBasis
{
    #[inline]
    fn neighbours(level: LevelType, index: IndexType) -> (f64, f64, f64)
    {
        let left = coordinate_1d(level, index - 1, PointDistribution::ClenshawCurtis);
        let mid = coordinate_1d(level, index, PointDistribution::ClenshawCurtis);
        let right = coordinate_1d(level, index + 1, PointDistribution::ClenshawCurtis);
        (left, mid, right)
    }
}

impl Basis for LinearClenshawCurtisBasis
{
    #[inline]
    fn node(&self, level: LevelType, index: IndexType) -> f64
    {
        coordinate_1d(level, index, PointDistribution::ClenshawCurtis)
    }

    fn eval(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        if level == 0
        {
            return if index == 0 { 1.0 - x } else { x };
        }
        let (left, mid, right) = Self::neighbours(level, index);
        if x <= left || x >= right
        {
            0.0
        }
        else if x < mid
        {
            (x - left) / (mid - left)
        }
        else
        {
            (right - x) / (right - mid)
        }
    }

    fn eval_deriv(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        if level == 0
        {
            return if index == 0 { -1.0 } else { 1.0 };
        }
        let (left, mid, right) = Self::neighbours(level, index);
        if x <= left || x >= right
        {
            0.0
        }
        else if x < mid
        {
            1.0 / (mid - left)
        }
        else
        {
            -1.0 / (right - mid)
        }
    }

    fn integral(&self, level: LevelType, index: IndexType) -> f64
    {
        if level == 0
        {
            return 0.5;
        }
        let (left, _, right) = Self::neighbours(level, index);
        0.5 * (right - left)
    }

    fn degree(&self) -> usize
    {
        1
    }

    fn is_cell_local(&self) -> bool
    {
        true
    }
}

#[test]
fn check_clenshaw_curtis_nodes()
{
    let basis = LinearClenshawCurtisBasis;
    assert!((basis.node(1, 1) - 0.5).abs() < 1e-15);
    assert!((basis.node(2, 1) - 0.5 * (1.0 - std::f64::consts::FRAC_1_SQRT_2)).abs() < 1e-15);
    assert_eq!(basis.eval(2, 1, basis.node(2, 1)), 1.0);
    assert_eq!(basis.eval(2, 1, 0.0), 0.0);
    assert_eq!(basis.eval(2, 1, 0.5), 0.0);
    let total: f64 = (1..4).step_by(2).map(|i| basis.integral(2, i)).sum::<f64>() + basis.integral(1, 1);
    assert!(total > 0.0 && total < 1.0);
}
