use sgcore::{algorithms::{coarsening::CoarseningOptions, refinement::RefinementOptions}, config::GridType, errors::SGError,
    grids::sparse_grid::SparseGrid, refinement::surplus::SurplusRefinement, storage::BoundingBox};

fn one_d() -> Result<(), SGError>
{
    println!("\nRunning \"one_d\" example\n");
    let mut grid = SparseGrid::new(GridType::Linear, 1)?;
    // in 1D a sparse grid is identical to a full grid
    grid.sparse_grid(5)?;
    let f = |x: &[f64]| x[0].powi(2);
    grid.update_values(&f);
    grid.hierarchize()?;

    let x = [0.3];
    let error = (grid.eval(&x)? - f(&x)).abs();
    println!("x={x:?}, calculated {}, expected {}. Error={error}", grid.eval(&x)?, f(&x));
    println!("Number of points: {}", grid.len());
    grid.refine_to(64, &f, &SurplusRefinement::default(), &RefinementOptions::new(error / 10.0))?;
    println!("Number of points after refinement: {}", grid.len());
    let error = (grid.eval(&x)? - f(&x)).abs();
    println!("x={x:?}, calculated {}, expected {}. Error={error}", grid.eval(&x)?, f(&x));
    Ok(())
}

///
/// A 2D grid on a non-unit domain, refined and then coarsened again.
///
fn two_d() -> Result<(), SGError>
{
    println!("\nRunning \"two_d\" example\n");
    let mut grid = SparseGrid::new(GridType::LinearBoundary, 2)?;
    grid.set_bounding_box(BoundingBox::new(&[-1.0, 0.0], &[1.0, 2.0]))?;
    grid.sparse_grid(4)?;
    let f = |x: &[f64]| (-4.0 * (x[0].powi(2) + (x[1] - 1.0).powi(2))).exp();

    let x = [0.3, 1.1];
    let options = RefinementOptions::new(1e-4).with_max_refined(20);
    grid.refine_to(500, &f, &SurplusRefinement::default(), &options)?;
    println!("Number of points after refinement: {}", grid.len());
    let error = (grid.eval(&x)? - f(&x)).abs();
    println!("x={x:?}, calculated {}, expected {}. Error={error}", grid.eval(&x)?, f(&x));

    grid.coarsen(&SurplusRefinement::default(), &CoarseningOptions::new(1e-6))?;
    grid.hierarchize()?;
    println!("Number of points after coarsening: {}", grid.len());
    let error = (grid.eval(&x)? - f(&x)).abs();
    println!("x={x:?}, calculated {}, expected {}. Error={error}", grid.eval(&x)?, f(&x));
    println!("Integral: {}", grid.integrate()?);
    Ok(())
}

///
/// Cubic not-a-knot B-splines reproduce smooth functions with far fewer points.
///
fn six_d() -> Result<(), SGError>
{
    println!("\nRunning \"six_d\" example\n");
    let f = |x: &[f64]| x.iter().map(|xi| xi * xi * xi).sum::<f64>();
    let x = [0.3, 0.1, 0.2, 0.1, 0.4, 0.7];
    for grid_type in [GridType::ModLinear, GridType::NakBsplineExtended { degree: 3 }]
    {
        let mut grid = SparseGrid::new(grid_type, 6)?;
        grid.sparse_grid(3)?;
        grid.update_values(&f);
        grid.hierarchize()?;
        let error = (grid.eval(&x)? - f(&x)).abs();
        println!("{grid_type:?} with {} points: calculated {}, expected {}. Error={error}", grid.len(), grid.eval(&x)?, f(&x));
    }
    Ok(())
}

fn main()
{
    one_d().unwrap();
    two_d().unwrap();
    six_d().unwrap();
}
