use crate::storage::{IndexType, LevelType};

use super::base::Basis;

///
/// Modified linear basis for grids without boundary points. The outermost
/// function of each level is extrapolated linearly to the boundary and level 1
/// is the constant function, so constants are reproduced exactly.
///
#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub struct ModLinearBasis;

impl Basis for ModLinearBasis
{
    #[inline]
    fn node(&self, level: LevelType, index: IndexType) -> f64
    {
        index as f64 / (1_u64 << level) as f64
    }

    fn eval(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        if level == 1
        {
            return 1.0;
        }
        let h = (1_u64 << level) as f64;
        if index == 1
        {
            (2.0 - h * x).max(0.0)
        }
        else if index as f64 == h - 1.0
        {
            (h * x - index as f64 + 1.0).max(0.0)
        }
        else
        {
            (1.0 - (h * x - index as f64).abs()).max(0.0)
        }
    }

    fn eval_deriv(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        if level == 1
        {
            return 0.0;
        }
        let h = (1_u64 << level) as f64;
        let t = h * x - index as f64;
        if index == 1
        {
            if t < 1.0 { -h } else { 0.0 }
        }
        else if index as f64 == h - 1.0
        {
            if t > -1.0 { h } else { 0.0 }
        }
        else if t.abs() >= 1.0
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

    fn integral(&self, level: LevelType, index: IndexType) -> f64
    {
        if level == 1
        {
            return 1.0;
        }
        let h = (1_u64 << level) as f64;
        if index == 1 || index as f64 == h - 1.0
        {
            2.0 / h
        }
        else
        {
            1.0 / h
        }
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
fn check_mod_linear_edges()
{
    let basis = ModLinearBasis;
    assert_eq!(basis.eval(1, 1, 0.1), 1.0);
    assert_eq!(basis.eval(2, 1, 0.0), 2.0);
    assert_eq!(basis.eval(2, 1, 0.25), 1.0);
    assert_eq!(basis.eval(2, 1, 0.5), 0.0);
    assert_eq!(basis.eval(2, 3, 1.0), 2.0);
    assert_eq!(basis.eval(3, 3, 0.375), 1.0);
    assert_eq!(basis.eval(3, 3, 0.125), 0.0);
    assert_eq!(basis.integral(3, 1), 0.25);
    assert_eq!(basis.integral(3, 3), 0.125);
}
