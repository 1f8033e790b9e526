use crate::{errors::SGError, storage::{IndexType, LevelType}};

use super::base::Basis;

pub const MAX_BSPLINE_DEGREE: usize = 7;

///
/// Value at `x` of the single B-spline of degree `p` defined on the `p + 2`
/// knots `t` (Cox-de Boor, right-continuous).
///
pub(crate) fn bspline_on_knots(t: &[f64], p: usize, x: f64) -> f64
{
    if x < t[0] || x >= t[p + 1]
    {
        return 0.0;
    }
    let mut n = [0.0_f64; MAX_BSPLINE_DEGREE + 2];
    for j in 0..=p
    {
        n[j] = if t[j] <= x && x < t[j + 1] { 1.0 } else { 0.0 };
    }
    for q in 1..=p
    {
        for j in 0..=(p - q)
        {
            let mut v = 0.0;
            let dl = t[j + q] - t[j];
            if dl > 0.0
            {
                v += (x - t[j]) / dl * n[j];
            }
            let dr = t[j + q + 1] - t[j + 1];
            if dr > 0.0
            {
                v += (t[j + q + 1] - x) / dr * n[j + 1];
            }
            n[j] = v;
        }
    }
    n[0]
}

///
/// Derivative of [`bspline_on_knots`].
///
pub(crate) fn bspline_deriv_on_knots(t: &[f64], p: usize, x: f64) -> f64
{
    if p == 0
    {
        return 0.0;
    }
    let pf = p as f64;
    let mut r = 0.0;
    let dl = t[p] - t[0];
    if dl > 0.0
    {
        r += pf / dl * bspline_on_knots(&t[..=p], p - 1, x);
    }
    let dr = t[p + 1] - t[1];
    if dr > 0.0
    {
        r -= pf / dr * bspline_on_knots(&t[1..=p + 1], p - 1, x);
    }
    r
}

/// Integer knots 0, 1, ..., p + 1.
#[inline]
fn cardinal_knots(p: usize) -> [f64; MAX_BSPLINE_DEGREE + 3]
{
    let mut t = [0.0; MAX_BSPLINE_DEGREE + 3];
    for (j, v) in t.iter_mut().enumerate()
    {
        *v = j as f64;
    }
    t
}

/// Cardinal B-spline of degree `p`, supported on [0, p + 1].
#[inline]
pub(crate) fn cardinal_bspline(p: usize, x: f64) -> f64
{
    bspline_on_knots(&cardinal_knots(p), p, x)
}

///
/// Integral of the cardinal B-spline of degree `p` from -infinity to `s`,
/// using the identity with the shifted cardinal B-splines of degree `p + 1`.
///
fn cardinal_bspline_cumulative(p: usize, s: f64) -> f64
{
    if s <= 0.0
    {
        return 0.0;
    }
    if s >= (p + 1) as f64
    {
        return 1.0;
    }
    let knots = cardinal_knots(p + 1);
    (0..=s.floor() as usize).map(|j| bspline_on_knots(&knots, p + 1, s - j as f64)).sum()
}

///
/// Uniform hierarchical B-splines of odd degree: `N_p(2^l x - i + (p + 1) / 2)`.
/// With boundary points the same formula is used at level 0.
///
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BsplineBasis
{
    degree: usize,
}

impl BsplineBasis
{
    pub fn new(degree: usize) -> Result<Self, SGError>
    {
        if degree % 2 == 0 || degree > MAX_BSPLINE_DEGREE
        {
            return Err(SGError::UnsupportedDegree(degree));
        }
        Ok(Self { degree })
    }

    #[inline]
    fn shift(&self) -> f64
    {
        ((self.degree + 1) / 2) as f64
    }
}

impl Basis for BsplineBasis
{
    #[inline]
    fn node(&self, level: LevelType, index: IndexType) -> f64
    {
        index as f64 / (1_u64 << level) as f64
    }

    fn eval(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        let h = (1_u64 << level) as f64;
        cardinal_bspline(self.degree, x * h - index as f64 + self.shift())
    }

    fn eval_deriv(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        let h = (1_u64 << level) as f64;
        h * bspline_deriv_on_knots(&cardinal_knots(self.degree), self.degree, x * h - index as f64 + self.shift())
    }

    fn integral(&self, level: LevelType, index: IndexType) -> f64
    {
        let h = (1_u64 << level) as f64;
        let offset = index as f64 - self.shift();
        (cardinal_bspline_cumulative(self.degree, h - offset) - cardinal_bspline_cumulative(self.degree, -offset)) / h
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
fn check_cardinal_cubic_values()
{
    assert!((cardinal_bspline(3, 1.0) - 1.0 / 6.0).abs() < 1e-15);
    assert!((cardinal_bspline(3, 2.0) - 2.0 / 3.0).abs() < 1e-15);
    assert_eq!(cardinal_bspline(3, 4.0), 0.0);
    assert_eq!(cardinal_bspline(3, -0.5), 0.0);
    assert!((cardinal_bspline_cumulative(3, 2.0) - 0.5).abs() < 1e-15);
}

#[test]
fn check_bspline_degree_one_is_linear()
{
    use super::linear::LinearBasis;
    let bspline = BsplineBasis::new(1).expect("degree 1 is supported");
    for (l, i) in [(0, 0), (0, 1), (1, 1), (3, 5)]
    {
        for k in 0..=20
        {
            let x = k as f64 / 20.0;
            assert!((bspline.eval(l, i, x) - LinearBasis.eval(l, i, x)).abs() < 1e-14);
        }
        assert!((bspline.integral(l, i) - LinearBasis.integral(l, i)).abs() < 1e-14);
    }
}

#[test]
fn check_bspline_integral_matches_quadrature()
{
    use super::gauss_legendre::integrate_interval;
    let basis = BsplineBasis::new(3).expect("degree 3 is supported");
    for (l, i) in [(0, 0), (1, 1), (2, 1), (3, 7)]
    {
        let h = (1_u64 << l) as f64;
        let mut quad = 0.0;
        for k in 0..(h as usize)
        {
            quad += integrate_interval(k as f64 / h, (k + 1) as f64 / h, 4, |x| basis.eval(l, i, x));
        }
        assert!((basis.integral(l, i) - quad).abs() < 1e-13);
    }
}

#[test]
fn check_bspline_derivative()
{
    let basis = BsplineBasis::new(3).expect("degree 3 is supported");
    let eps = 1e-6;
    for x in [0.1, 0.33, 0.6, 0.9]
    {
        let fd = (basis.eval(2, 1, x + eps) - basis.eval(2, 1, x - eps)) / (2.0 * eps);
        assert!((basis.eval_deriv(2, 1, x) - fd).abs() < 1e-6);
    }
}
