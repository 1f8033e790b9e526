use std::f64::consts::PI;

use static_init::dynamic;

/// Largest rule kept in the cache. The B-spline families need at most degree + 1 points.
const GL_MAX_POINTS: usize = 16;

///
/// P_n(x) and P_n'(x). The derivative uses `(1 - x^2) P_n' = n (P_{n-1} - x P_n)`,
/// which is only evaluated away from the endpoints.
///
fn legendre(n: usize, x: f64) -> (f64, f64)
{
    let (mut prev, mut cur) = (1.0, x);
    for k in 2..=n
    {
        let k = k as f64;
        let next = ((2.0 * k - 1.0) * x * cur - (k - 1.0) * prev) / k;
        prev = cur;
        cur = next;
    }
    (cur, n as f64 * (prev - x * cur) / (1.0 - x * x))
}

///
/// Nodes and weights of the `n`-point Gauss-Legendre rule on [0, 1], nodes ascending.
///
pub fn gauss_legendre(n: usize) -> (Vec<f64>, Vec<f64>)
{
    let mut nodes = Vec::with_capacity(n);
    let mut weights = Vec::with_capacity(n);
    // roots come out in descending order
    for i in (0..n).rev()
    {
        let mut x = (PI * (i as f64 + 0.75) / (n as f64 + 0.5)).cos();
        for _ in 0..100
        {
            let (p, dp) = legendre(n, x);
            let dx = p / dp;
            x -= dx;
            if dx.abs() < 1e-15
            {
                break;
            }
        }
        let (_, dp) = legendre(n, x);
        nodes.push(0.5 * (1.0 + x));
        weights.push(1.0 / ((1.0 - x * x) * dp * dp));
    }
    (nodes, weights)
}

pub(crate) struct GaussLegendreCache
{
    nodes: Vec<Vec<f64>>,
    weights: Vec<Vec<f64>>,
}

impl GaussLegendreCache
{
    fn new(max_points: usize) -> Self
    {
        let (nodes, weights) = (0..=max_points).map(gauss_legendre).unzip();
        Self { nodes, weights }
    }
}

#[dynamic]
pub(crate) static GL_CACHE: GaussLegendreCache = GaussLegendreCache::new(GL_MAX_POINTS);

///
/// Integrates `f` over [a, b] with an `n`-point rule, exact for polynomials of degree 2n-1.
///
pub fn integrate_interval<F: Fn(f64) -> f64>(a: f64, b: f64, n: usize, f: F) -> f64
{
    if b <= a
    {
        return 0.0;
    }
    if n <= GL_MAX_POINTS
    {
        apply_rule(&GL_CACHE.nodes[n], &GL_CACHE.weights[n], a, b, &f)
    }
    else
    {
        let (nodes, weights) = gauss_legendre(n);
        apply_rule(&nodes, &weights, a, b, &f)
    }
}

#[inline]
fn apply_rule<F: Fn(f64) -> f64>(nodes: &[f64], weights: &[f64], a: f64, b: f64, f: &F) -> f64
{
    let width = b - a;
    nodes.iter().zip(weights.iter()).map(|(&x, &w)| w * f(a + width * x)).sum::<f64>() * width
}

#[test]
fn check_gauss_legendre()
{
    let (nodes, weights) = gauss_legendre(10);
    let expected_nodes = [0.0130467357414145, 0.067468316655508, 0.160295215850488, 0.283302302935377, 0.425562830509185,
        0.574437169490815, 0.716697697064624, 0.839704784149512, 0.932531683344492, 0.986953264258586];
    let expected_weights = [0.033335672154344, 0.07472567457529, 0.109543181257991, 0.134633359654998, 0.147762112357376,
        0.147762112357376, 0.134633359654998, 0.109543181257991, 0.07472567457529, 0.033335672154344];
    for (n1, n2) in nodes.iter().zip(expected_nodes.iter())
    {
        assert!((n1 - n2).abs() < 1e-12);
    }
    for (w1, w2) in weights.iter().zip(expected_weights.iter())
    {
        assert!((w1 - w2).abs() < 1e-12);
    }
}

#[test]
fn check_integrate_interval_polynomial()
{
    let v = integrate_interval(0.25, 1.0, 3, |x| x * x * x * x * x);
    let exact = (1.0 - 0.25_f64.powi(6)) / 6.0;
    assert!((v - exact).abs() < 1e-14);
}

#[test]
fn check_cached_rules()
{
    for n in [1, 4, GL_MAX_POINTS]
    {
        let (nodes, weights) = gauss_legendre(n);
        assert_eq!(GL_CACHE.nodes[n], nodes);
        assert_eq!(GL_CACHE.weights[n], weights);
    }
    assert!(GL_CACHE.nodes[0].is_empty());
    // beyond the cache the rule is computed on the fly
    let n = GL_MAX_POINTS + 4;
    let v = integrate_interval(0.0, 2.0, n, |x| x.powi(2 * n as i32 - 1));
    let exact = 2.0_f64.powi(2 * n as i32) / (2 * n) as f64;
    assert!((v - exact).abs() < 1e-9 * exact);
}
