use approx::assert_abs_diff_eq;
use rand::{rngs::StdRng, Rng, SeedableRng};
use sgcore::algorithms::basis_evaluation::eval_recursive;
use sgcore::algorithms::coarsening::CoarseningOptions;
use sgcore::algorithms::hierarchisation::check_hierarchy;
use sgcore::algorithms::naive_evaluation::eval_naive;
use sgcore::algorithms::refinement::RefinementOptions;
use sgcore::config::{GridConfig, GridType};
use sgcore::errors::SGError;
use sgcore::grids::sparse_grid::SparseGrid;
use sgcore::refinement::surplus::SurplusRefinement;
use sgcore::refinement::user_defined::UserDefinedRefinement;
use sgcore::serialization::SerializationFormat;
use sgcore::storage::{BoundingBox, GridPoint};

fn build(grid_type: GridType, dim: usize, level: usize) -> SparseGrid
{
    let mut grid = SparseGrid::new(grid_type, dim).expect("could not create grid");
    grid.sparse_grid(level).expect("could not generate grid");
    grid
}

fn random_point(rng: &mut StdRng, dim: usize) -> Vec<f64>
{
    (0..dim).map(|_| rng.gen_range(0.0..=1.0)).collect()
}

fn test_function(x: &[f64]) -> f64
{
    x.iter().enumerate().map(|(d, &xd)| ((d + 1) as f64 * xd).sin()).product::<f64>() + x.iter().sum::<f64>()
}

#[test]
fn recursive_and_naive_evaluation_agree()
{
    let mut rng = StdRng::seed_from_u64(42);
    let cases = [(1, 6), (2, 5), (5, 4)];
    for grid_type in [GridType::Linear, GridType::LinearBoundary, GridType::ModLinear, GridType::LinearClenshawCurtis,
        GridType::LinearClenshawCurtisBoundary]
    {
        for (dim, level) in cases
        {
            let level = if grid_type.has_boundary() && dim == 5 { 3 } else { level };
            let grid = build(grid_type, dim, level);
            assert!(grid.len() <= 10_000);
            let alpha: Vec<f64> = (0..grid.len()).map(|_| rng.gen_range(-1.0..1.0)).collect();
            for _ in 0..100
            {
                let x = random_point(&mut rng, dim);
                let r = eval_recursive(grid.storage(), grid.basis(), &alpha, &x).expect("evaluation failed");
                let n = eval_naive(grid.storage(), grid.basis(), &alpha, &x).expect("evaluation failed");
                assert_abs_diff_eq!(r, n, epsilon = 1e-10);
            }
        }
    }
}

#[test]
fn recursive_evaluation_after_adaptive_refinement()
{
    let mut rng = StdRng::seed_from_u64(7);
    for grid_type in [GridType::Linear, GridType::LinearBoundary]
    {
        let mut grid = build(grid_type, 3, 2);
        grid.update_values(&|x: &[f64]| (-20.0 * ((x[0] - 0.3).powi(2) + (x[1] - 0.7).powi(2))).exp() + x[2]);
        grid.hierarchize().expect("hierarchisation failed");
        for _ in 0..4
        {
            grid.refine(&SurplusRefinement::default(), &RefinementOptions::new(1e-3).with_max_refined(10)).expect("refinement failed");
        }
        for _ in 0..100
        {
            let x = random_point(&mut rng, 3);
            let r = eval_recursive(grid.storage(), grid.basis(), grid.alpha(), &x).expect("evaluation failed");
            let n = eval_naive(grid.storage(), grid.basis(), grid.alpha(), &x).expect("evaluation failed");
            assert_abs_diff_eq!(r, n, epsilon = 1e-10);
        }
    }
}

#[test]
fn hierarchisation_round_trip()
{
    for grid_type in [GridType::Linear, GridType::LinearBoundary, GridType::ModLinear, GridType::LinearClenshawCurtisBoundary,
        GridType::NakBsplineBoundary { degree: 3 }, GridType::NakBsplineExtended { degree: 3 }]
    {
        let mut grid = build(grid_type, 2, 3);
        grid.update_values(&test_function);
        let values = grid.values().to_vec();
        grid.hierarchize().expect("hierarchisation failed");
        grid.dehierarchize().expect("dehierarchisation failed");
        for (a, b) in grid.values().iter().zip(values.iter())
        {
            assert_abs_diff_eq!(a, b, epsilon = 1e-9);
        }
    }
}

#[test]
fn interpolant_matches_values_at_grid_points()
{
    for grid_type in [GridType::LinearBoundary, GridType::ModLinear, GridType::NakBsplineBoundary { degree: 3 },
        GridType::NakBsplineExtended { degree: 3 }]
    {
        let mut grid = build(grid_type, 2, 3);
        grid.set_bounding_box(BoundingBox::new(&[-1.0, 2.0], &[1.0, 3.0])).expect("invalid bounding box");
        grid.update_values(&test_function);
        grid.hierarchize().expect("hierarchisation failed");
        let points: Vec<Vec<f64>> = grid.points().collect();
        for (x, &v) in points.iter().zip(grid.values().iter())
        {
            assert_abs_diff_eq!(grid.eval(x).expect("evaluation failed"), v, epsilon = 1e-8);
        }
    }
}

#[test]
fn nak_boundary_reproduces_cubics()
{
    let mut rng = StdRng::seed_from_u64(3);
    let cubic = |x: &[f64]| x[0].powi(3) - 0.5 * x[0] + 0.25;
    let mut grid = build(GridType::NakBsplineBoundary { degree: 3 }, 1, 4);
    grid.update_values(&cubic);
    grid.hierarchize().expect("hierarchisation failed");
    for _ in 0..50
    {
        let x = random_point(&mut rng, 1);
        assert_abs_diff_eq!(grid.eval(&x).expect("evaluation failed"), cubic(&x), epsilon = 1e-10);
    }
}

#[test]
fn linear_one_dimensional_example()
{
    let mut grid = build(GridType::Linear, 1, 2);
    grid.update_values(&|x: &[f64]| if x[0] == 0.5 { 1.0 } else { 0.0 });
    grid.hierarchize().expect("hierarchisation failed");
    for (x, &a) in grid.points().zip(grid.alpha().iter())
    {
        let expected = if x[0] == 0.5 { 1.0 } else { -0.5 };
        assert_eq!(a, expected);
    }
    assert_abs_diff_eq!(grid.eval(&[0.375]).expect("evaluation failed"), 0.5, epsilon = 1e-15);
}

#[test]
fn linear_boundary_grid_is_exact_for_linear_functions()
{
    let mut grid = build(GridType::LinearBoundary, 2, 3);
    grid.set_bounding_box(BoundingBox::new(&[0.0, 0.0], &[2.0, 1.0])).expect("invalid bounding box");
    grid.update_values(&|x: &[f64]| 2.0 * x[0] - 3.0 * x[1] + 1.0);
    grid.hierarchize().expect("hierarchisation failed");
    // integral of 2x - 3y + 1 over [0,2]x[0,1]
    assert_abs_diff_eq!(grid.integrate().expect("integration failed"), 4.0 - 3.0 + 2.0, epsilon = 1e-12);
    let gradient = grid.gradient(&[0.3, 0.7]).expect("gradient failed");
    assert_abs_diff_eq!(gradient[0], 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(gradient[1], -3.0, epsilon = 1e-12);
    assert_abs_diff_eq!(grid.eval(&[1.1, 0.45]).expect("evaluation failed"), 2.2 - 1.35 + 1.0, epsilon = 1e-12);
}

#[test]
fn refinement_only_adds_points_and_keeps_ancestors()
{
    let score = |x: &[f64], _: f64, _: f64| x.iter().sum::<f64>();
    let functor = UserDefinedRefinement::new(&score);
    for grid_type in [GridType::Linear, GridType::LinearBoundary, GridType::ModLinear]
    {
        let mut grid = build(grid_type, 2, 2);
        grid.update_values(&test_function);
        grid.hierarchize().expect("hierarchisation failed");
        for _ in 0..5
        {
            let before: Vec<GridPoint> = (0..grid.len()).map(|seq| grid.storage().point(seq).expect("valid seq")).collect();
            let options = RefinementOptions::new(0.5).with_max_refined(3);
            let added = grid.refine(&functor, &options).expect("refinement failed");
            assert!(added > 0);
            assert_eq!(grid.len(), before.len() + added);
            for (seq, point) in before.iter().enumerate()
            {
                assert_eq!(grid.storage().find(point), Some(seq));
            }
            check_hierarchy(grid.storage()).expect("ancestors missing after refinement");
        }
    }
}

#[test]
fn coarsening_keeps_ancestors()
{
    let mut grid = build(GridType::LinearBoundary, 2, 4);
    grid.update_values(&|x: &[f64]| (x[0] - 0.5).abs() * x[1]);
    grid.hierarchize().expect("hierarchisation failed");
    let before = grid.len();
    let removed = grid.coarsen(&SurplusRefinement::default(), &CoarseningOptions::new(1e-3)).expect("coarsening failed");
    assert!(removed > 0);
    assert_eq!(grid.len(), before - removed);
    assert_eq!(grid.alpha().len(), grid.len());
    check_hierarchy(grid.storage()).expect("ancestors missing after coarsening");
    // removed leaves had negligible surplus, so the interpolant barely changes
    let values = grid.values().to_vec();
    grid.hierarchize().expect("hierarchisation failed");
    let points: Vec<Vec<f64>> = grid.points().collect();
    for (x, v) in points.iter().zip(values.iter())
    {
        assert_abs_diff_eq!(grid.eval(x).expect("evaluation failed"), v, epsilon = 1e-10);
    }
}

#[test]
fn refine_to_reaches_target()
{
    let mut grid = build(GridType::Linear, 2, 2);
    let fun = |x: &[f64]| (-30.0 * ((x[0] - 0.25).powi(2) + (x[1] - 0.25).powi(2))).exp();
    let added = grid.refine_to(200, &fun, &SurplusRefinement::default(), &RefinementOptions::new(1e-6).with_max_refined(8))
        .expect("refinement failed");
    assert!(grid.len() >= 200);
    assert_eq!(added, grid.len() - 5);
    let points: Vec<Vec<f64>> = grid.points().collect();
    for (x, &v) in points.iter().zip(grid.values().iter())
    {
        assert_abs_diff_eq!(v, fun(x), epsilon = 1e-15);
    }
}

#[test]
fn serialization_round_trip()
{
    let mut rng = StdRng::seed_from_u64(5);
    let mut grid = build(GridType::LinearClenshawCurtisBoundary, 3, 3);
    grid.update_values(&test_function);
    grid.hierarchize().expect("hierarchisation failed");
    for format in [SerializationFormat::Json, SerializationFormat::JsonLz4, SerializationFormat::Bincode, SerializationFormat::BincodeLz4]
    {
        let bytes = grid.to_bytes(format).expect("serialization failed");
        let restored = SparseGrid::read(bytes.as_slice(), format).expect("deserialization failed");
        assert_eq!(restored.len(), grid.len());
        assert_eq!(restored.grid_type(), grid.grid_type());
        for (a, b) in restored.alpha().iter().zip(grid.alpha().iter())
        {
            assert_abs_diff_eq!(a, b, epsilon = 1e-14);
        }
        for _ in 0..10
        {
            let x = random_point(&mut rng, 3);
            assert_abs_diff_eq!(restored.eval(&x).expect("evaluation failed"), grid.eval(&x).expect("evaluation failed"), epsilon = 1e-12);
        }
    }
    assert!(matches!(SparseGrid::from_bytes(&[0, 1, 2], SerializationFormat::Bincode), Err(SGError::DeserializationFailed(_))));
}

#[test]
fn grid_from_config()
{
    let config = GridConfig::from_json(r#"{ "grid_type": "LinearBoundary", "dimension": 2, "level": 3,
        "bounding_box": { "lower": [0.0, -1.0], "upper": [1.0, 1.0] } }"#).expect("invalid config");
    let grid = SparseGrid::from_config(&config).expect("could not build grid");
    assert_eq!(grid.len(), 49);
    assert_eq!(grid.bounding_box().lower, vec![0.0, -1.0]);
    let config = GridConfig::new(GridType::Bspline { degree: 2 }, 2, 3);
    assert!(matches!(SparseGrid::from_config(&config), Err(SGError::UnsupportedDegree(2))));
}

#[test]
fn thinned_boundary_grid_can_be_hierarchized()
{
    let config = GridConfig::from_json(r#"{ "grid_type": "LinearBoundary", "dimension": 2, "level": 3, "boundary_level": 2 }"#)
        .expect("invalid config");
    let mut grid = SparseGrid::from_config(&config).expect("could not build grid");
    assert!(check_hierarchy(grid.storage()).is_ok());
    let f = |x: &[f64]| 1.0 + 2.0 * x[0] - x[1];
    grid.update_values(&f);
    grid.hierarchize().expect("hierarchisation failed");
    for x in [[0.0, 0.0], [0.3, 0.9], [1.0, 0.25], [0.625, 1.0]]
    {
        assert_abs_diff_eq!(grid.eval(&x).expect("evaluation failed"), f(&x), epsilon = 1e-12);
    }
}

#[cfg(feature = "rayon")]
#[test]
fn parallel_batch_matches_serial()
{
    let mut rng = StdRng::seed_from_u64(9);
    let mut grid = build(GridType::ModLinear, 4, 4);
    grid.update_values(&test_function);
    grid.hierarchize().expect("hierarchisation failed");
    let x: Vec<f64> = (0..400).map(|_| rng.gen_range(0.0..1.0)).collect();
    assert_eq!(grid.eval_batch(&x).expect("evaluation failed"), grid.eval_batch_parallel(&x).expect("evaluation failed"));
    assert!(matches!(grid.eval_batch(&x[..7]), Err(SGError::DimensionMismatch { .. })));
}
