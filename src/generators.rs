use crate::{errors::SGError, storage::{GridPoint, IndexType, LevelType, SparseGridStorage}};

#[inline]
fn level_indices(level: LevelType) -> impl Iterator<Item = IndexType>
{
    let (start, end, step) = if level == 0 { (0, 2, 1) } else { (1, 1 << level, 2) };
    (start..end).step_by(step)
}

///
/// Grows the grid along `dim`: every point currently stored is combined with
/// all (level, index) pairs of the levels returned by `levels_for`. Points not
/// yet extended still carry level 1 in `dim`.
///
fn extend_dimension<F>(storage: &mut SparseGridStorage, dim: usize, mut levels_for: F) -> Result<(), SGError>
where F: FnMut(&GridPoint) -> Vec<LevelType>
{
    let count = storage.len();
    for seq in 0..count
    {
        let mut point = storage.point(seq)?;
        for level in levels_for(&point)
        {
            for index in level_indices(level)
            {
                point.level[dim] = level;
                point.index[dim] = index;
                storage.insert(point.clone())?;
            }
        }
    }
    Ok(())
}

fn check_level(level: usize) -> Result<LevelType, SGError>
{
    if level == 0 || level > crate::storage::MAX_LEVEL as usize
    {
        Err(SGError::InvalidOperation(format!("grid level {level} is out of range")))
    }
    else
    {
        Ok(level as LevelType)
    }
}

///
/// Generates a regular sparse grid without boundary points: all points with
/// `|l|_1 <= level + d - 1`.
///
pub fn regular(storage: &mut SparseGridStorage, level: usize) -> Result<(), SGError>
{
    let n = check_level(level)? as u32;
    let num_inputs = storage.num_inputs();
    storage.insert(GridPoint::root_point(num_inputs))?;
    for d in 0..num_inputs
    {
        extend_dimension(storage, d, |point|
        {
            let rest = point.level_sum() - point.level[d] as u32;
            (1..=n).filter(|l| l + rest <= n + num_inputs as u32 - 1).map(|l| l as LevelType).collect()
        })?;
    }
    storage.update_leaves();
    log::debug!("generated regular grid of level {level} in {num_inputs} dimensions with {} points", storage.len());
    Ok(())
}

///
/// Generates a full grid with levels 1..=level in every dimension, without boundaries
///
pub fn full(storage: &mut SparseGridStorage, level: usize) -> Result<(), SGError>
{
    let n = check_level(level)?;
    storage.insert(GridPoint::root_point(storage.num_inputs()))?;
    for d in 0..storage.num_inputs()
    {
        extend_dimension(storage, d, |_| (1..=n).collect())?;
    }
    storage.update_leaves();
    log::debug!("generated full grid of level {level} with {} points", storage.len());
    Ok(())
}

///
/// Generates a full grid with levels 0..=level in every dimension.
///
pub fn full_with_boundaries(storage: &mut SparseGridStorage, level: usize) -> Result<(), SGError>
{
    let n = check_level(level)?;
    storage.set_has_boundary(true);
    storage.insert(GridPoint::root_point(storage.num_inputs()))?;
    for d in 0..storage.num_inputs()
    {
        extend_dimension(storage, d, |_| (0..=n).collect())?;
    }
    storage.update_leaves();
    log::debug!("generated full boundary grid of level {level} with {} points", storage.len());
    Ok(())
}

///
/// Inserts the direct ancestors of every point, including those of points
/// added along the way, until the grid is closed under `direct_ancestors`.
///
pub(crate) fn complete_hierarchy(storage: &mut SparseGridStorage) -> Result<usize, SGError>
{
    let count = storage.len();
    let mut seq = 0;
    while seq < storage.len()
    {
        let point = storage.point(seq)?;
        for d in 0..storage.num_inputs()
        {
            for ancestor in point.direct_ancestors(d)
            {
                storage.insert(ancestor)?;
            }
        }
        seq += 1;
    }
    Ok(storage.len() - count)
}

///
/// Generates a regular sparse grid with boundary points. A boundary point with
/// `k` zero levels is kept if its interior level sum does not exceed
/// `level + d' - k - boundary_level`, where `d'` is the number of dimensions
/// processed so far; a larger `boundary_level` thins out the boundary.
/// Boundary ancestors dropped by that rule are added back afterwards, so the
/// result can always be hierarchised.
///
pub fn regular_with_boundaries(storage: &mut SparseGridStorage, level: usize, boundary_level: usize) -> Result<(), SGError>
{
    let n = check_level(level)? as u32;
    let boundary_level = boundary_level as u32;
    storage.set_has_boundary(true);
    storage.insert(GridPoint::root_point(storage.num_inputs()))?;
    for d in 0..storage.num_inputs()
    {
        let cur_dim = d as u32 + 1;
        extend_dimension(storage, d, |point|
        {
            let level_sum: u32 = point.level[..d].iter().map(|&l| l as u32).sum();
            let num_zero_levels = point.level[..d].iter().filter(|&&l| l == 0).count() as u32;
            let mut levels = Vec::new();
            if level_sum + boundary_level + num_zero_levels < n + cur_dim || num_zero_levels == cur_dim - 1
            {
                levels.push(0);
            }
            let upper_bound = if num_zero_levels > 0
            {
                if n + cur_dim < boundary_level + num_zero_levels
                {
                    return levels;
                }
                n + cur_dim - num_zero_levels - boundary_level
            }
            else
            {
                n + cur_dim - 1
            };
            levels.extend((1..=n).filter(|l| l + level_sum <= upper_bound).map(|l| l as LevelType));
            levels
        })?;
    }
    let added = complete_hierarchy(storage)?;
    if added > 0
    {
        log::trace!("added {added} missing ancestors to boundary grid");
    }
    storage.update_leaves();
    log::debug!("generated regular boundary grid of level {level} with {} points", storage.len());
    Ok(())
}

#[test]
fn check_regular()
{
    let mut storage = SparseGridStorage::new(2);
    regular(&mut storage, 3).expect("Could not generate grid");
    assert_eq!(storage.len(), 17);
    let mut storage = SparseGridStorage::new(3);
    regular(&mut storage, 3).expect("Could not generate grid");
    assert_eq!(storage.len(), 31);
}

#[test]
fn check_full()
{
    let mut storage = SparseGridStorage::new(2);
    full(&mut storage, 2).expect("Could not generate grid");
    assert_eq!(storage.len(), 9);
    let mut storage = SparseGridStorage::new(2);
    full_with_boundaries(&mut storage, 2).expect("Could not generate grid");
    assert_eq!(storage.len(), 25);
}

#[test]
fn check_truncated_boundaries_1d()
{
    let mut storage = SparseGridStorage::new(1);
    regular_with_boundaries(&mut storage, 2, 1).expect("Could not generate grid");
    assert_eq!(storage.len(), 5);
}

#[test]
fn check_truncated_boundaries_2d()
{
    let mut storage = SparseGridStorage::new(2);
    regular_with_boundaries(&mut storage, 2, 1).expect("Could not generate grid");
    assert_eq!(storage.len(), 21);
    let mut storage2 = SparseGridStorage::new(2);
    regular_with_boundaries(&mut storage2, 3, 1).expect("Could not generate grid");
    assert_eq!(storage2.len(), 49);
    assert!(storage2.contains(&GridPoint::new(&[1,1], &[1,1], false)));
    assert!(storage2.contains(&GridPoint::new(&[2,2], &[3,1], false)));
    assert!(!storage2.contains(&GridPoint::new(&[3,2], &[5,1], false)));
    assert!(storage2.contains(&GridPoint::new(&[3,0], &[5,0], false)));
    assert!(storage2.contains(&GridPoint::new(&[0,0], &[0,0], false)));
}

#[test]
fn check_generated_leaves()
{
    let mut storage = SparseGridStorage::new(2);
    regular(&mut storage, 2).expect("Could not generate grid");
    let root = storage.find(&GridPoint::root_point(2)).expect("root missing");
    assert!(!storage.is_leaf(root));
    let leaf = storage.find(&GridPoint::new(&[2, 1], &[3, 1], false)).expect("point missing");
    assert!(storage.is_leaf(leaf));
}

#[test]
fn check_thinned_boundary_is_closed()
{
    use crate::algorithms::hierarchisation::check_hierarchy;
    for (dim, level, boundary_level) in [(2, 3, 2), (2, 4, 3), (3, 3, 2)]
    {
        let mut storage = SparseGridStorage::new(dim);
        regular_with_boundaries(&mut storage, level, boundary_level).expect("Could not generate grid");
        assert!(check_hierarchy(&storage).is_ok(), "dim {dim}, level {level}, boundary level {boundary_level}");
        // every level-one point pulls its boundary points back in
        let mut reference = SparseGridStorage::new(dim);
        regular_with_boundaries(&mut reference, level, 1).expect("Could not generate grid");
        assert_eq!(storage.len(), reference.len());
        assert!(storage.nodes().all(|node| reference.contains(&GridPoint::from(node))));
    }
}

#[test]
fn check_complete_hierarchy_on_closed_grid()
{
    let mut storage = SparseGridStorage::new(2);
    regular_with_boundaries(&mut storage, 3, 1).expect("Could not generate grid");
    assert_eq!(complete_hierarchy(&mut storage).expect("completion failed"), 0);
    assert_eq!(storage.len(), 49);
}
