use crate::{algorithms::refinement::RefinementFunctor, storage::PointIterator};

///
/// Scores each point by the magnitude of its surplus.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct SurplusRefinement
{
    pub max_refined: Option<usize>,
    pub max_removed: Option<usize>,
}

impl RefinementFunctor for SurplusRefinement
{
    fn eval(&self, _points: PointIterator, alpha: &[f64], _values: &[f64]) -> Vec<f64>
    {
        alpha.iter().map(|a| a.abs()).collect()
    }

    fn max_num_refined(&self) -> Option<usize>
    {
        self.max_refined
    }

    fn max_num_removed(&self) -> Option<usize>
    {
        self.max_removed
    }
}

///
/// Scores each point by `|alpha| * 2^(-|l|_1)`, an estimate of the surplus'
/// contribution to the integral.
///
#[derive(Clone, Copy, Debug, Default)]
pub struct SurplusVolumeRefinement
{
    pub max_refined: Option<usize>,
}

impl RefinementFunctor for SurplusVolumeRefinement
{
    fn eval(&self, points: PointIterator, alpha: &[f64], _values: &[f64]) -> Vec<f64>
    {
        points.nodes().zip(alpha.iter()).map(|(node, a)| a.abs() * 0.5_f64.powi(node.level_sum() as i32)).collect()
    }

    fn max_num_refined(&self) -> Option<usize>
    {
        self.max_refined
    }
}
