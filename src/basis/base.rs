use crate::{config::GridType, errors::SGError, storage::{IndexType, LevelType, PointDistribution}};

use super::{bspline::BsplineBasis, clenshaw_curtis::LinearClenshawCurtisBasis, linear::LinearBasis, mod_linear::ModLinearBasis,
    nak_bspline::{NakBsplineBoundaryBasis, NakBsplineExtendedBasis}};

///
/// One-dimensional hierarchical basis. A multivariate basis function is the
/// tensor product of the one-dimensional functions at the point's per-dimension
/// (level, index).
///
pub trait Basis
{
    fn eval(&self, level: LevelType, index: IndexType, x: f64) -> f64;
    fn eval_deriv(&self, level: LevelType, index: IndexType, x: f64) -> f64;
    /// Integral over [0, 1].
    fn integral(&self, level: LevelType, index: IndexType) -> f64;
    fn degree(&self) -> usize;
    /// Coordinate at which the function is centered.
    fn node(&self, level: LevelType, index: IndexType) -> f64;
    ///
    /// True if the support of (l, i) lies within [node(l, i-1), node(l, i+1)]
    /// and the function is 1 at node(l, i). Such families admit the recursive
    /// evaluator and the pole-sweep hierarchisation.
    ///
    fn is_cell_local(&self) -> bool
    {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BasisFunction
{
    Linear(LinearBasis),
    ModLinear(ModLinearBasis),
    LinearClenshawCurtis(LinearClenshawCurtisBasis),
    Bspline(BsplineBasis),
    NakBsplineBoundary(NakBsplineBoundaryBasis),
    NakBsplineExtended(NakBsplineExtendedBasis),
}

impl Default for BasisFunction
{
    fn default() -> Self
    {
        BasisFunction::Linear(LinearBasis)
    }
}

impl BasisFunction
{
    pub fn new(grid_type: GridType) -> Result<Self, SGError>
    {
        Ok(match grid_type
        {
            GridType::Linear | GridType::LinearBoundary => BasisFunction::Linear(LinearBasis),
            GridType::ModLinear => BasisFunction::ModLinear(ModLinearBasis),
            GridType::LinearClenshawCurtis | GridType::LinearClenshawCurtisBoundary => BasisFunction::LinearClenshawCurtis(LinearClenshawCurtisBasis),
            GridType::Bspline { degree } | GridType::BsplineBoundary { degree } => BasisFunction::Bspline(BsplineBasis::new(degree)?),
            GridType::NakBsplineBoundary { degree } => BasisFunction::NakBsplineBoundary(NakBsplineBoundaryBasis::new(degree)?),
            GridType::NakBsplineExtended { degree } => BasisFunction::NakBsplineExtended(NakBsplineExtendedBasis::new(degree)?),
        })
    }

    pub fn distribution(&self) -> PointDistribution
    {
        match self
        {
            BasisFunction::LinearClenshawCurtis(_) => PointDistribution::ClenshawCurtis,
            _ => PointDistribution::Uniform,
        }
    }
}

impl Basis for BasisFunction
{
    #[inline]
    fn eval(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        match self
        {
            BasisFunction::Linear(b) => b.eval(level, index, x),
            BasisFunction::ModLinear(b) => b.eval(level, index, x),
            BasisFunction::LinearClenshawCurtis(b) => b.eval(level, index, x),
            BasisFunction::Bspline(b) => b.eval(level, index, x),
            BasisFunction::NakBsplineBoundary(b) => b.eval(level, index, x),
            BasisFunction::NakBsplineExtended(b) => b.eval(level, index, x),
        }
    }

    fn eval_deriv(&self, level: LevelType, index: IndexType, x: f64) -> f64
    {
        match self
        {
            BasisFunction::Linear(b) => b.eval_deriv(level, index, x),
            BasisFunction::ModLinear(b) => b.eval_deriv(level, index, x),
            BasisFunction::LinearClenshawCurtis(b) => b.eval_deriv(level, index, x),
            BasisFunction::Bspline(b) => b.eval_deriv(level, index, x),
            BasisFunction::NakBsplineBoundary(b) => b.eval_deriv(level, index, x),
            BasisFunction::NakBsplineExtended(b) => b.eval_deriv(level, index, x),
        }
    }

    fn integral(&self, level: LevelType, index: IndexType) -> f64
    {
        match self
        {
            BasisFunction::Linear(b) => b.integral(level, index),
            BasisFunction::ModLinear(b) => b.integral(level, index),
            BasisFunction::LinearClenshawCurtis(b) => b.integral(level, index),
            BasisFunction::Bspline(b) => b.integral(level, index),
            BasisFunction::NakBsplineBoundary(b) => b.integral(level, index),
            BasisFunction::NakBsplineExtended(b) => b.integral(level, index),
        }
    }

    fn degree(&self) -> usize
    {
        match self
        {
            BasisFunction::Linear(b) => b.degree(),
            BasisFunction::ModLinear(b) => b.degree(),
            BasisFunction::LinearClenshawCurtis(b) => b.degree(),
            BasisFunction::Bspline(b) => b.degree(),
            BasisFunction::NakBsplineBoundary(b) => b.degree(),
            BasisFunction::NakBsplineExtended(b) => b.degree(),
        }
    }

    #[inline]
    fn node(&self, level: LevelType, index: IndexType) -> f64
    {
        match self
        {
            BasisFunction::Linear(b) => b.node(level, index),
            BasisFunction::ModLinear(b) => b.node(level, index),
            BasisFunction::LinearClenshawCurtis(b) => b.node(level, index),
            BasisFunction::Bspline(b) => b.node(level, index),
            BasisFunction::NakBsplineBoundary(b) => b.node(level, index),
            BasisFunction::NakBsplineExtended(b) => b.node(level, index),
        }
    }

    fn is_cell_local(&self) -> bool
    {
        match self
        {
            BasisFunction::Linear(b) => b.is_cell_local(),
            BasisFunction::ModLinear(b) => b.is_cell_local(),
            BasisFunction::LinearClenshawCurtis(b) => b.is_cell_local(),
            BasisFunction::Bspline(b) => b.is_cell_local(),
            BasisFunction::NakBsplineBoundary(b) => b.is_cell_local(),
            BasisFunction::NakBsplineExtended(b) => b.is_cell_local(),
        }
    }
}

#[test]
fn check_unsupported_degree()
{
    assert_eq!(BasisFunction::new(GridType::NakBsplineExtended { degree: 7 }), Err(SGError::UnsupportedDegree(7)));
    assert_eq!(BasisFunction::new(GridType::NakBsplineBoundary { degree: 2 }), Err(SGError::UnsupportedDegree(2)));
    assert_eq!(BasisFunction::new(GridType::Bspline { degree: 4 }), Err(SGError::UnsupportedDegree(4)));
    assert!(BasisFunction::new(GridType::NakBsplineExtended { degree: 5 }).is_ok());
}
