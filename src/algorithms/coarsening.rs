use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

use crate::{errors::SGError, storage::SparseGridStorage};

#[derive(Default, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoarseningOptions
{
    /// Only leaves with a score strictly below the threshold are removed.
    pub threshold: f64,
    pub max_removed: Option<usize>,
}

impl CoarseningOptions
{
    pub fn new(threshold: f64) -> Self
    {
        Self { threshold, max_removed: None }
    }

    pub fn with_max_removed(mut self, max_removed: usize) -> Self
    {
        self.max_removed = Some(max_removed);
        self
    }
}

///
/// Removes the leaves with the smallest scores in a single pass and returns
/// the removed sequence numbers (pre-removal numbering). Points with a level-0
/// coordinate and the coarsest interior point are never removed.
///
pub(crate) fn coarsen(storage: &mut SparseGridStorage, scores: &[f64], options: &CoarseningOptions) -> Result<IndexSet<usize>, SGError>
{
    if scores.len() != storage.len()
    {
        return Err(SGError::NumberOfPointsAndValuesMismatch);
    }
    let root_level_sum = storage.num_inputs() as u32;
    let mut candidates: Vec<(usize, f64)> = storage.nodes().enumerate()
        .filter(|(seq, node)| node.is_leaf() && !node.level.contains(&0) && node.level_sum() > root_level_sum
            && scores[*seq] < options.threshold)
        .map(|(seq, _)| (seq, scores[seq]))
        .collect();
    candidates.sort_by(|a, b| a.1.total_cmp(&b.1).then(a.0.cmp(&b.0)));
    if let Some(max_removed) = options.max_removed
    {
        candidates.truncate(max_removed);
    }
    let mut removed: IndexSet<usize> = candidates.into_iter().map(|(seq, _)| seq).collect();
    removed.sort_unstable();
    storage.remove_points(&removed)?;
    log::debug!("coarsening removed {} points, grid now has {} points", removed.len(), storage.len());
    Ok(removed)
}

#[test]
fn check_coarsen_removes_small_leaves()
{
    use crate::storage::GridPoint;
    let mut storage = SparseGridStorage::new(1);
    crate::generators::regular(&mut storage, 3).expect("Could not generate grid");
    let scores: Vec<f64> = (0..storage.len()).map(|seq| storage.index(seq, 0) as f64).collect();
    let removed = coarsen(&mut storage, &scores, &CoarseningOptions::new(4.0).with_max_removed(1)).expect("coarsening failed");
    assert_eq!(removed.len(), 1);
    assert_eq!(storage.len(), 6);
    assert!(!storage.contains(&GridPoint::new(&[3], &[1], false)));
    assert!(storage.contains(&GridPoint::new(&[3], &[3], false)));
    let scores = vec![0.0; storage.len()];
    coarsen(&mut storage, &scores, &CoarseningOptions::new(1.0)).expect("coarsening failed");
    assert_eq!(storage.len(), 3);
    crate::algorithms::hierarchisation::check_hierarchy(&storage).expect("ancestors missing");
}

#[test]
fn check_coarsen_keeps_boundary()
{
    let mut storage = SparseGridStorage::new(2);
    crate::generators::regular_with_boundaries(&mut storage, 2, 1).expect("Could not generate grid");
    let num_boundary = |storage: &SparseGridStorage| storage.nodes().filter(|node| node.level.contains(&0)).count();
    let before = num_boundary(&storage);
    let scores = vec![0.0; storage.len()];
    let removed = coarsen(&mut storage, &scores, &CoarseningOptions::new(1.0)).expect("coarsening failed");
    assert!(!removed.is_empty());
    assert_eq!(num_boundary(&storage), before);
    crate::algorithms::hierarchisation::check_hierarchy(&storage).expect("ancestors missing");
}
