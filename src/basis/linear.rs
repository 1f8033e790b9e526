use crate::storage::{IndexType, LevelType};

use super::base::Basis;

///
/// Piecewise linear hat functions. Level 0 holds the two boundary functions
/// `1 - x` and `x`, used only by grids with boundary points.
///
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct LinearBasis;

impl Basis for LinearBasis
{
    #[inline]
    fn node(&self, level: LevelType, index: IndexType) -> f64
    {
        index as f64 / (1_u64 << level) as f64
    }

    #[inline]
    fn eval(&self, level: LevelType, index: IndexType, x: f64) -> f64 {
        if level == 0
        {
            if index == 0
            {
                1.0 - x
            }
            else
            {
                x
            }
        }
        else
        {
            0.0_f64.max(1.0 - f64::abs((1_u64 << level) as f64 * x - index as f64))
        }
    }

    fn eval_deriv(&self, level: LevelType, index: IndexType, x: f64) -> f64 {
        if level == 0
        {
            return if index == 0 { -1.0 } else { 1.0 };
        }
        let h = (1_u64 << level) as f64;
        let t = h * x - index as f64;
        if t.abs() >= 1.0
        {
            0.0
        }
        else if t < 0.0
        {
            h
        }
        else
        {
            -h
        }
    }

    fn degree(&self) -> usize {
        1
    }

    #[inline]
    fn integral(&self, level: LevelType, _index: IndexType) -> f64 {
        if level == 0
        {
            0.5
        }
        else
        {
            1.0 / (1_u64 << level) as f64
        }
    }

    fn is_cell_local(&self) -> bool
    {
        true
    }
}

#[test]
fn check_linear_local_support()
{
    let basis = LinearBasis;
    for level in 1..6_u8
    {
        let h = 1.0 / (1_u64 << level) as f64;
        for index in (1..(1_u32 << level)).step_by(2)
        {
            let center = index as f64 * h;
            assert_eq!(basis.eval(level, index, center), 1.0);
            assert_eq!(basis.eval(level, index, center - h), 0.0);
            assert_eq!(basis.eval(level, index, center + h), 0.0);
            assert_eq!(basis.eval(level, index, center + 1.5 * h), 0.0);
        }
    }
    assert_eq!(basis.eval(0, 0, 0.25), 0.75);
    assert_eq!(basis.eval(0, 1, 0.25), 0.25);
    assert_eq!(basis.eval_deriv(2, 1, 0.2), 4.0);
    assert_eq!(basis.eval_deriv(2, 1, 0.3), -4.0);
}
