use criterion::{criterion_group, criterion_main, Criterion};
use sgcore::{config::GridType, errors::SGError, grids::sparse_grid::SparseGrid};

fn build_six_d_grid(grid_type: GridType, level: usize) -> Result<SparseGrid, SGError>
{
    let mut grid = SparseGrid::new(grid_type, 6)?;
    grid.sparse_grid(level)?;
    grid.update_values(&|x: &[f64]| x.iter().map(|xi| xi * xi * xi).sum());
    grid.hierarchize()?;
    Ok(grid)
}

fn batch_points() -> Vec<f64>
{
    [0.3, 0.1, 0.2, 0.1, 0.4, 0.7].repeat(1000)
}

fn run_eval(c: &mut Criterion)
{
    let grid = build_six_d_grid(GridType::Linear, 6).unwrap();
    let x = [0.3, 0.1, 0.2, 0.1, 0.4, 0.7];
    c.bench_function("6d eval", |b| b.iter(|| grid.eval(&x).unwrap()));
    c.bench_function("6d eval naive", |b| b.iter(|| grid.eval_naive(&x).unwrap()));
}

fn run_eval_batch(c: &mut Criterion)
{
    let grid = build_six_d_grid(GridType::LinearBoundary, 4).unwrap();
    let x = batch_points();
    c.bench_function("6d eval batch", |b| b.iter(|| grid.eval_batch(&x).unwrap()));
    #[cfg(feature = "rayon")]
    c.bench_function("6d eval batch parallel", |b| b.iter(|| grid.eval_batch_parallel(&x).unwrap()));
}

fn run_hierarchize(c: &mut Criterion)
{
    let mut grid = build_six_d_grid(GridType::ModLinear, 6).unwrap();
    c.bench_function("6d hierarchize", |b| b.iter(|| grid.hierarchize().unwrap()));
}

criterion_group!(benches, run_eval, run_eval_batch, run_hierarchize);
criterion_main!(benches);
