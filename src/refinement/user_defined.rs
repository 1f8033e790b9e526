use crate::{algorithms::refinement::RefinementFunctor, storage::PointIterator};

///
/// A function that defines how refinement is performed.
///
/// # Arguments
/// - `point`: Real coordinate of the grid point.
/// - `alpha`: Surplus coefficient of the point.
/// - `value`: Nodal value of the point.
///
pub type UserRefinementFunction = dyn Fn(&[f64], f64, f64) -> f64 + Send + Sync;

pub struct UserDefinedRefinement<'a>
{
    pub fun_eval: &'a UserRefinementFunction,
    pub max_refined: Option<usize>,
}

impl<'a> UserDefinedRefinement<'a>
{
    pub fn new(fun_eval: &'a UserRefinementFunction) -> Self
    {
        Self { fun_eval, max_refined: None }
    }
}

impl RefinementFunctor for UserDefinedRefinement<'_>
{
    fn eval(&self, points: PointIterator, alpha: &[f64], values: &[f64]) -> Vec<f64>
    {
        points.zip(alpha.iter().zip(values.iter())).map(|(point, (&a, &v))| (self.fun_eval)(&point, a, v)).collect()
    }

    fn max_num_refined(&self) -> Option<usize>
    {
        self.max_refined
    }
}

#[test]
fn check_user_defined_scores()
{
    use crate::storage::{GridPoint, SparseGridStorage};
    let mut storage = SparseGridStorage::new(1);
    storage.insert(GridPoint::new(&[1], &[1], true)).expect("insert failed");
    storage.insert(GridPoint::new(&[2], &[1], true)).expect("insert failed");
    let fun = |x: &[f64], a: f64, v: f64| x[0] + a * v;
    let functor = UserDefinedRefinement::new(&fun);
    let scores = functor.eval(storage.points(), &[1.0, 2.0], &[3.0, 4.0]);
    assert_eq!(scores, vec![3.5, 8.25]);
}
