use crate::{errors::SGError, storage::{IndexType, LevelType}};

use super::{base::Basis, bspline::{bspline_deriv_on_knots, bspline_on_knots}, gauss_legendre::integrate_interval};

fn check_nak_degree(degree: usize) -> Result<(), SGError>
{
    match degree
    {
        1 | 3 | 5 => Ok(()),
        _ => Err(SGError::UnsupportedDegree(degree)),
    }
}

///
/// Knot `m` of the not-a-knot sequence of degree `p` on the uniform mesh with
/// `n` intervals: p knots extending beyond each end of [0, 1] and the interior
/// knots closest to the boundary removed.
///
fn nak_knot(p: usize, n: usize, m: usize) -> f64
{
    let (p, n, m) = (p as i64, n as i64, m as i64);
    let j = if m <= p
    {
        m - p
    }
    else if m <= n
    {
        (p + 1) / 2 + m - p - 1
    }
    else
    {
        m - 1
    };
    j as f64 / n as f64
}

#[inline]
fn nak_knots(p: usize, n: usize, k: usize) -> [f64; 8]
{
    let mut t = [0.0; 8];
    for (j, v) in t.iter_mut().enumerate().take(p + 2)
    {
        *v = nak_knot(p, n, k + j);
    }
    t
}

/// B-spline `k` (0..=n) of the not-a-knot sequence on `n` intervals.
fn nak_eval(p: usize, n: usize, k: usize, x: f64) -> f64
{
    bspline_on_knots(&nak_knots(p, n, k), p, x)
}

fn nak_eval_deriv(p: usize, n: usize, k: usize, x: f64) -> f64
{
    bspline_deriv_on_knots(&nak_knots(p, n, k), p, x)
}

fn nak_integral(p: usize, n: usize, k: usize) -> f64
{
    let t = nak_knots(p, n, k);
    (0..=p).map(|j|
    {
        let a = t[j].max(0.0);
        let b = t[j + 1].min(1.0);
        integrate_interval(a, b, p + 1, |x| nak_eval(p, n, k, x))
    }).sum()
}

/// Lagrange polynomial through all nodes j/n, j = 0..=n, equal to 1 at i/n.
fn lagrange_eval(n: usize, i: usize, x: f64) -> f64
{
    let nx = n as f64 * x;
    (0..=n).filter(|&j| j != i).map(|j| (nx - j as f64) / (i as f64 - j as f64)).product()
}

fn lagrange_eval_deriv(n: usize, i: usize, x: f64) -> f64
{
    let nx = n as f64 * x;
    let mut r = 0.0;
    for m in (0..=n).filter(|&m| m != i)
    {
        let term: f64 = (0..=n).filter(|&j| j != i && j != m).map(|j| (nx - j as f64) / (i as f64 - j as f64)).product();
        r += n as f64 / (i as f64 - m as f64) * term;
    }
    r
}

///
/// Not-a-knot B-splines with boundary points. Level 0 is linear, coarse levels
/// with fewer than `p + 1` nodes use Lagrange polynomials through all nodes of
/// the level, finer levels use the not-a-knot B-spline of the level's mesh.
///
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NakBsplineBoundaryBasis
{
    degree: usize,
}

impl NakBsplineBoundaryBasis
{
    pub fn new(degree: usize) -> Result<Self, SGError>
    {
        check_nak_degree(degree)?;
        Ok(Self { degree })
    }

    #[inline]
    fn uses_lagrange(&self, level: LevelType) -> bool
    {
        (1_usize << level) < self.degree
    }
}

impl Basis for NakBsplineBoundaryBasis
{
    #[inline]
    fn node(&self, level: LevelType, index: IndexType) -> f64
    {
        index as f64 / (1_u64 << level) as f64
    }

    fn eval(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        if level == 0
        {
            return if index == 0 { 1.0 - x } else { x };
        }
        let n = 1_usize << level;
        if self.uses_lagrange(level)
        {
            lagrange_eval(n, index as usize, x)
        }
        else
        {
            nak_eval(self.degree, n, index as usize, x)
        }
    }

    fn eval_deriv(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        if level == 0
        {
            return if index == 0 { -1.0 } else { 1.0 };
        }
        let n = 1_usize << level;
        if self.uses_lagrange(level)
        {
            lagrange_eval_deriv(n, index as usize, x)
        }
        else
        {
            nak_eval_deriv(self.degree, n, index as usize, x)
        }
    }

    fn integral(&self, level: LevelType, index: IndexType) -> f64
    {
        if level == 0
        {
            return 0.5;
        }
        let n = 1_usize << level;
        if self.uses_lagrange(level)
        {
            integrate_interval(0.0, 1.0, n + 1, |x| lagrange_eval(n, index as usize, x))
        }
        else
        {
            nak_integral(self.degree, n, index as usize)
        }
    }

    fn degree(&self) -> usize
    {
        self.degree
    }

    fn is_cell_local(&self) -> bool
    {
        self.degree == 1
    }
}

///
/// Not-a-knot B-splines for grids without boundary points. The boundary
/// B-splines of each level are folded into the outermost interior functions
/// with fixed weights so that polynomials up to the degree stay representable.
///
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NakBsplineExtendedBasis
{
    degree: usize,
}

impl NakBsplineExtendedBasis
{
    pub fn new(degree: usize) -> Result<Self, SGError>
    {
        check_nak_degree(degree)?;
        Ok(Self { degree })
    }

    ///
    /// Weights of the left (index 0) and right (index n) boundary B-splines
    /// added to function `index` of a level with `n` intervals.
    ///
    fn extension_weights(&self, level: LevelType, index: usize, n: usize) -> (f64, f64)
    {
        match self.degree
        {
            1 =>
            {
                if index == 1 { (2.0, 0.0) } else if index == n - 1 { (0.0, 2.0) } else { (0.0, 0.0) }
            },
            3 =>
            {
                if index == 1 { (5.0, 0.0) }
                else if index == 3 { (10.0, 0.0) }
                else if index == n - 3 { (0.0, 10.0) }
                else if index == n - 1 { (0.0, 5.0) }
                else { (0.0, 0.0) }
            },
            _ if level == 3 =>
            {
                match index
                {
                    1 => (8.0, 0.0),
                    3 => (42.0, 20.0),
                    5 => (20.0, 42.0),
                    7 => (0.0, 8.0),
                    _ => (0.0, 0.0),
                }
            },
            _ =>
            {
                if index == 1 { (8.0, 0.0) }
                else if index == 3 || index == 5 { (56.0, 0.0) }
                else if index == n - 5 || index == n - 3 { (0.0, 56.0) }
                else if index == n - 1 { (0.0, 8.0) }
                else { (0.0, 0.0) }
            },
        }
    }

    fn combine<F: Fn(usize) -> f64>(&self, level: LevelType, index: IndexType, f: F) -> f64
    {
        let n = 1_usize << level;
        let index = index as usize;
        let (wl, wr) = self.extension_weights(level, index, n);
        let mut r = f(index);
        if wl != 0.0
        {
            r += wl * f(0);
        }
        if wr != 0.0
        {
            r += wr * f(n);
        }
        r
    }
}

impl Basis for NakBsplineExtendedBasis
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
        if level == 2 && self.degree > 1
        {
            return if index == 1 { 8.0 * (x - 0.5) * (x - 0.75) } else { 8.0 * (x - 0.25) * (x - 0.5) };
        }
        let n = 1_usize << level;
        self.combine(level, index, |k| nak_eval(self.degree, n, k, x))
    }

    fn eval_deriv(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        if level == 1
        {
            return 0.0;
        }
        if level == 2 && self.degree > 1
        {
            return if index == 1 { 16.0 * (x - 0.625) } else { 16.0 * (x - 0.375) };
        }
        let n = 1_usize << level;
        self.combine(level, index, |k| nak_eval_deriv(self.degree, n, k, x))
    }

    fn integral(&self, level: LevelType, index: IndexType) -> f64
    {
        if level == 1
        {
            return 1.0;
        }
        if level == 2 && self.degree > 1
        {
            return 2.0 / 3.0;
        }
        let n = 1_usize << level;
        self.combine(level, index, |k| nak_integral(self.degree, n, k))
    }

    fn degree(&self) -> usize
    {
        self.degree
    }

    fn is_cell_local(&self) -> bool
    {
        self.degree == 1
    }
}

#[test]
fn check_nak_knots_degree_three()
{
    // n = 8: knots h and 7h are removed
    let knots: Vec<f64> = (0..13).map(|m| nak_knot(3, 8, m) * 8.0).collect();
    assert_eq!(knots, vec![-3.0, -2.0, -1.0, 0.0, 2.0, 3.0, 4.0, 5.0, 6.0, 8.0, 9.0, 10.0, 11.0]);
}

#[test]
fn check_nak_partition_of_unity()
{
    for p in [1, 3, 5]
    {
        let n = 16;
        for k in 0..=20
        {
            let x = k as f64 / 20.0;
            let sum: f64 = (0..=n).map(|i| nak_eval(p, n, i, x)).sum();
            assert!((sum - 1.0).abs() < 1e-12, "degree {p} at {x}: {sum}");
        }
    }
}

#[test]
fn check_nak_boundary_coarse_levels()
{
    let basis = NakBsplineBoundaryBasis::new(3).expect("degree 3 is supported");
    assert!((basis.eval(1, 1, 0.25) - 0.75).abs() < 1e-15);
    assert!((basis.integral(1, 1) - 2.0 / 3.0).abs() < 1e-14);
    assert_eq!(basis.eval(0, 0, 0.25), 0.75);
    assert_eq!(basis.eval(2, 1, 1.0), 0.0);
}

#[test]
fn check_extended_degree_one_matches_mod_linear()
{
    use super::mod_linear::ModLinearBasis;
    let basis = NakBsplineExtendedBasis::new(1).expect("degree 1 is supported");
    for (l, i) in [(1, 1), (2, 1), (2, 3), (3, 1), (3, 5), (3, 7)]
    {
        for k in 0..=16
        {
            let x = k as f64 / 16.0;
            assert!((basis.eval(l, i, x) - ModLinearBasis.eval(l, i, x)).abs() < 1e-14);
        }
        assert!((basis.integral(l, i) - ModLinearBasis.integral(l, i)).abs() < 1e-14);
    }
}

#[test]
fn check_extended_level_two_quadratics()
{
    for p in [3, 5]
    {
        let basis = NakBsplineExtendedBasis::new(p).expect("supported degree");
        assert_eq!(basis.eval(2, 1, 0.5), 0.0);
        assert_eq!(basis.eval(2, 3, 0.5), 0.0);
        assert_eq!(basis.eval(2, 1, 0.25), 1.0);
        assert_eq!(basis.eval(2, 3, 0.75), 1.0);
    }
}

#[test]
fn check_extended_derivative()
{
    let eps = 1e-6;
    for p in [3, 5]
    {
        let basis = NakBsplineExtendedBasis::new(p).expect("supported degree");
        for (l, i) in [(2, 1), (3, 1), (3, 3), (3, 5), (4, 5), (4, 15)]
        {
            for x in [0.03, 0.21, 0.47, 0.66, 0.97]
            {
                let fd = (basis.eval(l, i, x + eps) - basis.eval(l, i, x - eps)) / (2.0 * eps);
                assert!((basis.eval_deriv(l, i, x) - fd).abs() < 1e-4 * (1.0 + fd.abs()), "p={p} l={l} i={i} x={x}");
            }
        }
    }
}
