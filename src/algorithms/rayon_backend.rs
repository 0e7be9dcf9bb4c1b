//! Rayon backend. Every function runs on whichever pool the caller installed;
//! the engine picks a one-thread pool for the serial modes.

use std::cmp::Ordering;

use rayon::prelude::*;

use super::element::Element;
use super::lanes::{self, BLOCK};

pub fn fill<T: Element>(data: &mut [T], value: T, vectorized: bool) {
    if vectorized {
        data.par_chunks_mut(BLOCK).for_each(|chunk| lanes::fill(chunk, value));
    } else {
        data.par_iter_mut().for_each(|x| *x = value);
    }
}

pub fn sort<T: Element>(data: &mut [T]) {
    data.par_sort_unstable_by(T::order);
}

pub fn stable_sort<T: Element>(data: &mut [T]) {
    data.par_sort_by(T::order);
}

/// Copies both runs into `out` side by side, then lets the parallel merge
/// sort combine them.
pub fn merge<T: Element>(left: &[T], right: &[T], out: &mut [T]) {
    let (head, tail) = out.split_at_mut(left.len());
    rayon::join(
        || head.par_iter_mut().zip(left.par_iter()).for_each(|(d, s)| *d = *s),
        || tail.par_iter_mut().zip(right.par_iter()).for_each(|(d, s)| *d = *s),
    );
    out.par_sort_by(T::order);
}

pub fn inplace_merge<T: Element>(data: &mut [T]) {
    data.par_sort_by(T::order);
}

pub fn all_of<T, P>(data: &[T], pred: P, vectorized: bool) -> bool
where
    T: Element,
    P: Fn(T) -> bool + Sync + Send,
{
    if vectorized {
        data.par_chunks(BLOCK).all(|chunk| lanes::all(chunk, &pred))
    } else {
        data.par_iter().all(|&x| pred(x))
    }
}

pub fn any_of<T, P>(data: &[T], pred: P, vectorized: bool) -> bool
where
    T: Element,
    P: Fn(T) -> bool + Sync + Send,
{
    if vectorized {
        data.par_chunks(BLOCK).any(|chunk| lanes::any(chunk, &pred))
    } else {
        data.par_iter().any(|&x| pred(x))
    }
}

pub fn copy<T: Element>(src: &[T], dst: &mut [T], vectorized: bool) {
    if vectorized {
        dst.par_chunks_mut(BLOCK)
            .zip(src.par_chunks(BLOCK))
            .for_each(|(d, s)| lanes::copy(s, d));
    } else {
        dst.par_iter_mut().zip(src.par_iter()).for_each(|(d, s)| *d = *s);
    }
}

pub fn equal<T: Element>(a: &[T], b: &[T], vectorized: bool) -> bool {
    if a.len() != b.len() {
        return false;
    }
    if vectorized {
        a.par_chunks(BLOCK)
            .zip(b.par_chunks(BLOCK))
            .all(|(x, y)| lanes::equal(x, y))
    } else {
        a.par_iter().zip(b.par_iter()).all(|(x, y)| x == y)
    }
}

pub fn count<T: Element>(data: &[T], value: T, vectorized: bool) -> usize {
    if vectorized {
        data.par_chunks(BLOCK).map(|chunk| lanes::count(chunk, value)).sum()
    } else {
        data.par_iter().filter(|&&x| x == value).count()
    }
}

pub fn adjacent_find<T: Element>(data: &[T], vectorized: bool) -> Option<usize> {
    if !vectorized {
        return data.par_windows(2).position_first(|w| w[0] == w[1]);
    }
    let pairs = data.len().saturating_sub(1);
    (0..pairs.div_ceil(BLOCK)).into_par_iter().find_map_first(|block| {
        let start = block * BLOCK;
        let end = (start + BLOCK).min(pairs);
        lanes::adjacent_find(&data[start..=end]).map(|p| p + start)
    })
}

pub fn adjacent_difference<T: Element>(src: &[T], dst: &mut [T], vectorized: bool) {
    if vectorized {
        dst.par_chunks_mut(BLOCK)
            .enumerate()
            .for_each(|(i, chunk)| lanes::adjacent_difference(src, chunk, i * BLOCK));
        return;
    }
    if let Some((first, rest)) = dst.split_first_mut() {
        *first = src[0];
        rest.par_iter_mut()
            .zip(src.par_windows(2))
            .for_each(|(out, w)| *out = w[1].difference(w[0]));
    }
}

pub fn max_element<T: Element>(data: &[T], vectorized: bool) -> Option<usize> {
    let first_max = |best: usize, cur: usize| {
        if data[cur].order(&data[best]) == Ordering::Greater {
            cur
        } else {
            best
        }
    };
    if vectorized {
        data.par_chunks(BLOCK)
            .enumerate()
            .filter_map(|(i, chunk)| lanes::max_element(chunk).map(|p| p + i * BLOCK))
            .reduce_with(first_max)
    } else {
        (0..data.len()).into_par_iter().reduce_with(first_max)
    }
}
