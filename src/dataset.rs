use rand::rngs::StdRng;
use rand::SeedableRng;
use rayon::slice::ParallelSliceMut;

use crate::algorithms::Element;

/// Where random datasets get their randomness.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Seed {
    Fixed(u64),
    Entropy,
}

impl Seed {
    pub fn rng(self) -> StdRng {
        match self {
            Seed::Fixed(seed) => StdRng::seed_from_u64(seed),
            Seed::Entropy => StdRng::from_entropy(),
        }
    }
}

pub fn constant<T: Element>(size: usize, value: T) -> Vec<T> {
    vec![value; size]
}

/// `0, 1, 2, ...` converted into the element type.
pub fn ascending<T: Element>(size: usize) -> Vec<T> {
    (0..size).map(T::from_index).collect()
}

/// `even, odd, even, odd, ...`: no two neighbours are equal when the values differ.
pub fn alternating<T: Element>(size: usize, even: T, odd: T) -> Vec<T> {
    (0..size).map(|i| if i % 2 == 0 { even } else { odd }).collect()
}

pub fn random<T: Element>(size: usize, rng: &mut StdRng) -> Vec<T> {
    (0..size).map(|_| T::random(rng)).collect()
}

/// Overwrites `data` with fresh random values, keeping the allocation.
pub fn refill_random<T: Element>(data: &mut [T], rng: &mut StdRng) {
    for slot in data.iter_mut() {
        *slot = T::random(rng);
    }
}

pub fn sorted_random<T: Element>(size: usize, rng: &mut StdRng) -> Vec<T> {
    let mut data = random(size, rng);
    data.sort_unstable_by(T::order);
    data
}

/// Sorted copy used as the reference a trial's output is checked against.
/// Built on rayon's global pool, outside any timed region.
pub fn sorted_copy<T: Element>(data: &[T]) -> Vec<T> {
    let mut reference = data.to_vec();
    reference.par_sort_unstable_by(T::order);
    reference
}
