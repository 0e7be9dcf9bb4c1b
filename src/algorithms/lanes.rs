//! Fixed-width kernels for the SIMD modes.
//!
//! Each kernel walks the input in `LANES`-wide chunks and folds every chunk
//! without short-circuiting, which leaves LLVM a straight-line body it can
//! turn into vector instructions. Early exit happens between chunks only.

use std::cmp::Ordering;

use super::element::Element;

pub const LANES: usize = 16;

/// Block length handed to one task when lane kernels run in parallel.
pub const BLOCK: usize = LANES * 4096;

pub fn fill<T: Element>(data: &mut [T], value: T) {
    let mut chunks = data.chunks_exact_mut(LANES);
    for chunk in chunks.by_ref() {
        for slot in chunk.iter_mut() {
            *slot = value;
        }
    }
    chunks.into_remainder().fill(value);
}

pub fn copy<T: Element>(src: &[T], dst: &mut [T]) {
    let mut out = dst.chunks_exact_mut(LANES);
    let mut input = src.chunks_exact(LANES);
    for (d, s) in out.by_ref().zip(input.by_ref()) {
        d.copy_from_slice(s);
    }
    out.into_remainder().copy_from_slice(input.remainder());
}

pub fn all<T, P>(data: &[T], pred: P) -> bool
where
    T: Element,
    P: Fn(T) -> bool,
{
    let mut chunks = data.chunks_exact(LANES);
    let body = chunks
        .by_ref()
        .all(|chunk| chunk.iter().fold(true, |acc, &x| acc & pred(x)));
    body && chunks.remainder().iter().all(|&x| pred(x))
}

pub fn any<T, P>(data: &[T], pred: P) -> bool
where
    T: Element,
    P: Fn(T) -> bool,
{
    let mut chunks = data.chunks_exact(LANES);
    let body = chunks
        .by_ref()
        .any(|chunk| chunk.iter().fold(false, |acc, &x| acc | pred(x)));
    body || chunks.remainder().iter().any(|&x| pred(x))
}

pub fn equal<T: Element>(a: &[T], b: &[T]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut left = a.chunks_exact(LANES);
    let mut right = b.chunks_exact(LANES);
    let body = left
        .by_ref()
        .zip(right.by_ref())
        .all(|(x, y)| x.iter().zip(y).fold(true, |acc, (p, q)| acc & (p == q)));
    body && left.remainder() == right.remainder()
}

pub fn count<T: Element>(data: &[T], value: T) -> usize {
    let mut chunks = data.chunks_exact(LANES);
    let body: usize = chunks
        .by_ref()
        .map(|chunk| chunk.iter().map(|&x| usize::from(x == value)).sum::<usize>())
        .sum();
    body + chunks.remainder().iter().filter(|&&x| x == value).count()
}

/// First index `i` with `data[i] == data[i + 1]`.
pub fn adjacent_find<T: Element>(data: &[T]) -> Option<usize> {
    if data.len() < 2 {
        return None;
    }
    let heads = &data[..data.len() - 1];
    let tails = &data[1..];
    let mut offset = 0;
    for (a, b) in heads.chunks(LANES).zip(tails.chunks(LANES)) {
        let hit = a.iter().zip(b).fold(false, |acc, (x, y)| acc | (x == y));
        if hit {
            return a.iter().zip(b).position(|(x, y)| x == y).map(|p| p + offset);
        }
        offset += a.len();
    }
    None
}

/// Writes `dst[j] = src[offset + j] - src[offset + j - 1]`, with
/// `dst[0] = src[0]` when `offset` is zero. `dst` is the block of the full
/// output that starts at `offset`.
pub fn adjacent_difference<T: Element>(src: &[T], dst: &mut [T], offset: usize) {
    let (dst, offset) = if offset == 0 {
        match dst.split_first_mut() {
            Some((first, rest)) => {
                *first = src[0];
                (rest, 1)
            }
            None => return,
        }
    } else {
        (dst, offset)
    };
    let current = &src[offset..offset + dst.len()];
    let previous = &src[offset - 1..offset - 1 + dst.len()];

    let mut out = dst.chunks_exact_mut(LANES);
    let mut cur = current.chunks_exact(LANES);
    let mut prev = previous.chunks_exact(LANES);
    for ((o, c), p) in out.by_ref().zip(cur.by_ref()).zip(prev.by_ref()) {
        for ((slot, &x), &y) in o.iter_mut().zip(c).zip(p) {
            *slot = x.difference(y);
        }
    }
    for ((slot, &x), &y) in out
        .into_remainder()
        .iter_mut()
        .zip(cur.remainder())
        .zip(prev.remainder())
    {
        *slot = x.difference(y);
    }
}

/// Index of the first maximum element.
pub fn max_element<T: Element>(data: &[T]) -> Option<usize> {
    let first = *data.first()?;
    let mut acc = [first; LANES];
    let mut chunks = data.chunks_exact(LANES);
    for chunk in chunks.by_ref() {
        for (slot, &x) in acc.iter_mut().zip(chunk) {
            *slot = slot.max_of(x);
        }
    }
    let best = chunks
        .remainder()
        .iter()
        .copied()
        .fold(acc.iter().copied().fold(first, T::max_of), T::max_of);
    data.iter().position(|x| x.order(&best) == Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ascending(n: usize) -> Vec<i32> {
        (0..n as i32).collect()
    }

    #[test]
    fn fill_covers_remainder() {
        let mut data = vec![0i32; LANES * 3 + 5];
        fill(&mut data, 42);
        assert!(data.iter().all(|&x| x == 42));
    }

    #[test]
    fn copy_covers_remainder() {
        let src = ascending(LANES * 2 + 7);
        let mut dst = vec![0; src.len()];
        copy(&src, &mut dst);
        assert_eq!(src, dst);
    }

    #[test]
    fn all_and_any_respect_remainder() {
        let mut data = vec![2i32; LANES * 4 + 3];
        assert!(all(&data, |x| x == 2));
        assert!(!any(&data, |x| x == 3));
        *data.last_mut().unwrap() = 3;
        assert!(!all(&data, |x| x == 2));
        assert!(any(&data, |x| x == 3));
    }

    #[test]
    fn equal_detects_difference_anywhere() {
        let a = vec![0i32; LANES * 2 + 1];
        let mut b = a.clone();
        assert!(equal(&a, &b));
        b[LANES + 1] = 1;
        assert!(!equal(&a, &b));
        assert!(!equal(&a, &b[1..]));
    }

    #[test]
    fn count_matches_filter() {
        let data: Vec<i32> = (0..1000).map(|i| i % 7).collect();
        assert_eq!(count(&data, 3), data.iter().filter(|&&x| x == 3).count());
    }

    #[test]
    fn adjacent_find_first_pair() {
        let mut data: Vec<i32> = (0..100).map(|i| if i % 2 == 0 { 3 } else { 2 }).collect();
        assert_eq!(adjacent_find(&data), None);
        data[40] = data[41];
        data[70] = data[71];
        assert_eq!(adjacent_find(&data), Some(40));
        assert_eq!(adjacent_find(&[1i32]), None);
    }

    #[test]
    fn adjacent_difference_whole_and_offset() {
        let src: Vec<i32> = vec![1, 4, 9, 16, 25];
        let mut dst = vec![10; 5];
        adjacent_difference(&src, &mut dst, 0);
        assert_eq!(dst, vec![1, 3, 5, 7, 9]);

        let mut tail = vec![0; 2];
        adjacent_difference(&src, &mut tail, 3);
        assert_eq!(tail, vec![7, 9]);
    }

    #[test]
    fn adjacent_difference_spans_full_lanes() {
        let src: Vec<i32> = (0..(LANES * 3 + 5) as i32).map(|i| i * i).collect();
        let mut dst = vec![0; src.len()];
        adjacent_difference(&src, &mut dst, 0);
        assert_eq!(dst[0], 0);
        for i in 1..src.len() {
            assert_eq!(dst[i], src[i] - src[i - 1], "slot {}", i);
        }

        let offset = LANES + 3;
        let mut block = vec![0; LANES * 2 + 1];
        adjacent_difference(&src, &mut block, offset);
        assert_eq!(block, dst[offset..offset + block.len()].to_vec());
    }

    #[test]
    fn max_element_returns_first_maximum() {
        let mut data = ascending(LANES * 5);
        data[10] = 1000;
        data[50] = 1000;
        assert_eq!(max_element(&data), Some(10));
        assert_eq!(max_element::<i32>(&[]), None);
        assert_eq!(max_element(&[1.5f64, 2.5, 0.5]), Some(1));
    }
}
