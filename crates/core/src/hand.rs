//! Random hand selection.

use rand::{seq::IndexedRandom, Rng};

use crate::{
    error::SelectionError,
    pool::{ImageId, ImagePool},
};

/// Cards shown at once.
pub const HAND_SIZE: usize = 3;

/// Draw `count` distinct identifiers from `pool`, uniformly and without replacement.
///
/// The order of the result is itself random. Asking for more cards than the pool
/// holds is an error rather than a short hand.
pub fn select_hand<R>(
    pool: &ImagePool,
    count: usize,
    rng: &mut R,
) -> Result<Vec<ImageId>, SelectionError>
where
    R: Rng + ?Sized,
{
    if count > pool.len() {
        return Err(SelectionError::InsufficientPool {
            requested: count,
            available: pool.len(),
        });
    }

    Ok(pool.ids().choose_multiple(rng, count).cloned().collect())
}
