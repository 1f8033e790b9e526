use crate::{errors::SGError, iterators::grid_iterator::HashMapGridIterator, storage::SparseGridStorage};

///
/// One-dimensional operation applied to every pole of the grid along a
/// dimension. `execute_in_place` is called with the iterator positioned at the
/// level-one point of the pole.
///
pub trait SweepFunction
{
    fn execute_in_place(&mut self, values: &mut [f64], iterator: &mut HashMapGridIterator, dim: usize) -> Result<(), SGError>;
}

///
/// Applies `function` to each pole along `dim`. Poles are identified by their
/// level-one point; poles made only of boundary points are left untouched.
///
pub(crate) fn sweep_1d_in_place<F: SweepFunction>(function: &mut F, storage: &SparseGridStorage, values: &mut [f64], dim: usize) -> Result<(), SGError>
{
    let mut iterator = HashMapGridIterator::new(storage);
    for seq in 0..storage.len()
    {
        if storage.level(seq, dim) != 1
        {
            continue;
        }
        iterator.set_point(storage.point(seq)?);
        function.execute_in_place(values, &mut iterator, dim)?;
    }
    Ok(())
}
