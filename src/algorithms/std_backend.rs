//! Standard library backend.
//!
//! Serial modes call slice and iterator methods directly. Parallel modes cut
//! the input into one contiguous block per thread and run the serial (or lane)
//! kernel on each block under `std::thread::scope`.

use std::cmp::Ordering;
use std::ops::Range;
use std::thread;

use super::element::Element;
use super::lanes;

pub fn fill<T: Element>(data: &mut [T], value: T) {
    data.fill(value);
}

pub fn sort<T: Element>(data: &mut [T]) {
    data.sort_unstable_by(T::order);
}

pub fn stable_sort<T: Element>(data: &mut [T]) {
    data.sort_by(T::order);
}

/// Merges two sorted runs into `out`. The stable sort detects the two
/// pre-sorted runs and merges them in a single pass.
pub fn merge<T: Element>(left: &[T], right: &[T], out: &mut [T]) {
    let (head, tail) = out.split_at_mut(left.len());
    head.copy_from_slice(left);
    tail.copy_from_slice(right);
    out.sort_by(T::order);
}

/// Merges the sorted runs `data[..mid]` and `data[mid..]` in place.
pub fn inplace_merge<T: Element>(data: &mut [T]) {
    data.sort_by(T::order);
}

pub fn all_of<T, P>(data: &[T], pred: P) -> bool
where
    T: Element,
    P: Fn(T) -> bool,
{
    data.iter().all(|&x| pred(x))
}

pub fn any_of<T, P>(data: &[T], pred: P) -> bool
where
    T: Element,
    P: Fn(T) -> bool,
{
    data.iter().any(|&x| pred(x))
}

pub fn copy<T: Element>(src: &[T], dst: &mut [T]) {
    dst.copy_from_slice(src);
}

pub fn equal<T: Element>(a: &[T], b: &[T]) -> bool {
    a == b
}

pub fn count<T: Element>(data: &[T], value: T) -> usize {
    data.iter().filter(|&&x| x == value).count()
}

pub fn adjacent_find<T: Element>(data: &[T]) -> Option<usize> {
    data.windows(2).position(|w| w[0] == w[1])
}

pub fn adjacent_difference<T: Element>(src: &[T], dst: &mut [T]) {
    if let Some((first, rest)) = dst.split_first_mut() {
        *first = src[0];
        for (out, w) in rest.iter_mut().zip(src.windows(2)) {
            *out = w[1].difference(w[0]);
        }
    }
}

/// Windowed form over the block of the output that starts at `offset`.
fn adjacent_difference_block<T: Element>(src: &[T], dst: &mut [T], offset: usize) {
    if offset == 0 {
        adjacent_difference(&src[..dst.len()], dst);
        return;
    }
    for (out, w) in dst.iter_mut().zip(src[offset - 1..].windows(2)) {
        *out = w[1].difference(w[0]);
    }
}

/// Cache-bypassing fill: one non-temporal store per element, then a store
/// fence so the writes are visible before the caller reads them.
#[cfg(target_arch = "x86_64")]
pub fn fill_streaming(data: &mut [i32], value: i32) {
    use std::arch::x86_64::{_mm_sfence, _mm_stream_si32};

    for slot in data.iter_mut() {
        // SAFETY: `slot` is a valid, aligned and exclusively borrowed i32.
        unsafe { _mm_stream_si32(slot, value) };
    }
    // SAFETY: sse2 is part of the x86_64 baseline.
    unsafe { _mm_sfence() };
}

/// Targets without non-temporal stores never offer the streaming fill; the
/// capability table filters it out before dispatch.
#[cfg(not(target_arch = "x86_64"))]
pub fn fill_streaming(data: &mut [i32], value: i32) {
    data.fill(value);
}

pub fn max_element<T: Element>(data: &[T]) -> Option<usize> {
    data.iter()
        .enumerate()
        .reduce(|best, cur| {
            if cur.1.order(best.1) == Ordering::Greater {
                cur
            } else {
                best
            }
        })
        .map(|(i, _)| i)
}

// ---------------------------------------------------------------------------
// Block-partitioned parallel variants
// ---------------------------------------------------------------------------

/// Splits `0..len` into at most `threads` contiguous, non-empty ranges.
pub fn block_ranges(len: usize, threads: usize) -> Vec<Range<usize>> {
    if len == 0 {
        return Vec::new();
    }
    let block = len.div_ceil(threads.max(1));
    (0..len)
        .step_by(block)
        .map(|start| start..(start + block).min(len))
        .collect()
}

fn scoped_map<R, F>(len: usize, threads: usize, work: F) -> Vec<R>
where
    R: Send,
    F: Fn(Range<usize>) -> R + Sync,
{
    let work = &work;
    thread::scope(|s| {
        let handles: Vec<_> = block_ranges(len, threads)
            .into_iter()
            .map(|range| s.spawn(move || work(range)))
            .collect();
        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
            .collect()
    })
}

fn scoped_for_each_mut<T, F>(data: &mut [T], threads: usize, work: F)
where
    T: Send,
    F: Fn(usize, &mut [T]) + Sync,
{
    let len = data.len();
    if len == 0 {
        return;
    }
    let block = len.div_ceil(threads.max(1));
    let work = &work;
    thread::scope(|s| {
        for (i, chunk) in data.chunks_mut(block).enumerate() {
            s.spawn(move || work(i * block, chunk));
        }
    });
}

pub fn par_fill<T: Element>(data: &mut [T], value: T, threads: usize, vectorized: bool) {
    scoped_for_each_mut(data, threads, |_, chunk| {
        if vectorized {
            lanes::fill(chunk, value)
        } else {
            fill(chunk, value)
        }
    });
}

pub fn par_copy<T: Element>(src: &[T], dst: &mut [T], threads: usize, vectorized: bool) {
    scoped_for_each_mut(dst, threads, |offset, chunk| {
        let input = &src[offset..offset + chunk.len()];
        if vectorized {
            lanes::copy(input, chunk)
        } else {
            copy(input, chunk)
        }
    });
}

pub fn par_all_of<T, P>(data: &[T], pred: P, threads: usize, vectorized: bool) -> bool
where
    T: Element,
    P: Fn(T) -> bool + Sync,
{
    scoped_map(data.len(), threads, |r| {
        if vectorized {
            lanes::all(&data[r], &pred)
        } else {
            all_of(&data[r], &pred)
        }
    })
    .into_iter()
    .all(|b| b)
}

pub fn par_any_of<T, P>(data: &[T], pred: P, threads: usize, vectorized: bool) -> bool
where
    T: Element,
    P: Fn(T) -> bool + Sync,
{
    scoped_map(data.len(), threads, |r| {
        if vectorized {
            lanes::any(&data[r], &pred)
        } else {
            any_of(&data[r], &pred)
        }
    })
    .into_iter()
    .any(|b| b)
}

pub fn par_equal<T: Element>(a: &[T], b: &[T], threads: usize, vectorized: bool) -> bool {
    if a.len() != b.len() {
        return false;
    }
    scoped_map(a.len(), threads, |r| {
        if vectorized {
            lanes::equal(&a[r.clone()], &b[r])
        } else {
            equal(&a[r.clone()], &b[r])
        }
    })
    .into_iter()
    .all(|eq| eq)
}

pub fn par_count<T: Element>(data: &[T], value: T, threads: usize, vectorized: bool) -> usize {
    scoped_map(data.len(), threads, |r| {
        if vectorized {
            lanes::count(&data[r], value)
        } else {
            count(&data[r], value)
        }
    })
    .into_iter()
    .sum()
}

/// Each block owns the pairs starting inside it and reads one element past
/// its end.
pub fn par_adjacent_find<T: Element>(data: &[T], threads: usize, vectorized: bool) -> Option<usize> {
    let pairs = data.len().saturating_sub(1);
    scoped_map(pairs, threads, |r| {
        let window = &data[r.start..=r.end];
        let found = if vectorized {
            lanes::adjacent_find(window)
        } else {
            adjacent_find(window)
        };
        found.map(|p| p + r.start)
    })
    .into_iter()
    .flatten()
    .next()
}

pub fn par_adjacent_difference<T: Element>(src: &[T], dst: &mut [T], threads: usize, vectorized: bool) {
    scoped_for_each_mut(dst, threads, |offset, chunk| {
        if vectorized {
            lanes::adjacent_difference(src, chunk, offset)
        } else {
            adjacent_difference_block(src, chunk, offset)
        }
    });
}

pub fn par_max_element<T: Element>(data: &[T], threads: usize, vectorized: bool) -> Option<usize> {
    scoped_map(data.len(), threads, |r| {
        let start = r.start;
        let found = if vectorized {
            lanes::max_element(&data[r])
        } else {
            max_element(&data[r])
        };
        found.map(|p| p + start)
    })
    .into_iter()
    .flatten()
    .reduce(|best, cur| {
        if data[cur].order(&data[best]) == Ordering::Greater {
            cur
        } else {
            best
        }
    })
}
