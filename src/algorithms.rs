pub(crate) mod sweep;
pub mod basis_evaluation;
pub mod coarsening;
pub mod hierarchisation;
pub mod integration;
pub mod naive_evaluation;
pub mod refinement;
