pub mod base;
pub mod bspline;
pub mod clenshaw_curtis;
pub(crate) mod gauss_legendre;
pub mod linear;
pub mod mod_linear;
pub mod nak_bspline;
