//! Biased random pick over a sorted list
//!
//! Draws `r` uniformly from `[0, 1)` and selects `floor(r^weight * len)`.
//! A weight of 1 is uniform; larger weights pull the pick toward the front
//! of the list.

use rand::Rng;

/// Index picked for a uniform draw `r` in `[0, 1)`
pub fn biased_index(r: f64, weight: f64, len: usize) -> usize {
    let index = (r.powf(weight) * len as f64).floor() as usize;
    index.min(len.saturating_sub(1))
}

/// Pick an item, favouring the front of `items` by `weight`
///
/// Returns `None` for an empty list.
pub fn weighted_random_pick<'a, T>(items: &'a [T], weight: f64, rng: &mut impl Rng) -> Option<&'a T> {
    if items.is_empty() {
        return None;
    }
    let r: f64 = rng.random();
    items.get(biased_index(r, weight, items.len()))
}

/// Random source that always yields the same raw word
#[cfg(test)]
pub(crate) struct FixedRng(pub u64);

#[cfg(test)]
impl FixedRng {
    /// Source whose uniform draws are always 0
    pub fn front() -> Self {
        Self(0)
    }

    /// Source whose uniform draws are always just below 1
    pub fn back() -> Self {
        Self(u64::MAX)
    }
}

#[cfg(test)]
impl rand::RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        (self.0 >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.0
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for (i, byte) in dst.iter_mut().enumerate() {
            *byte = self.0.to_le_bytes()[i % 8];
        }
    }
}
