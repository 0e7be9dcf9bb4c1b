//! Post-conditions checked after each trial, outside the timed region.
//!
//! Each check returns the violation detail on failure; the runner turns it
//! into a fatal `InvariantViolation`.

use std::cmp::Ordering;

use crate::algorithms::Element;

pub type Check = Result<(), String>;

pub fn sorted<T: Element>(data: &[T]) -> Check {
    match data.windows(2).position(|w| w[0].order(&w[1]) == Ordering::Greater) {
        None => Ok(()),
        Some(i) => Err(format!(
            "not sorted at index {}: {} > {}",
            i,
            data[i],
            data[i + 1]
        )),
    }
}

/// `actual` must be sorted and hold exactly the elements of `reference`,
/// which is already in order.
pub fn sorted_like<T: Element>(actual: &[T], reference: &[T]) -> Check {
    sorted(actual)?;
    identical(actual, reference).map_err(|detail| format!("element multiset changed: {}", detail))
}

pub fn all_equal_to<T: Element>(data: &[T], value: T) -> Check {
    match data.iter().position(|&x| x != value) {
        None => Ok(()),
        Some(i) => Err(format!("element {} is {}, expected {}", i, data[i], value)),
    }
}

pub fn identical<T: Element>(actual: &[T], expected: &[T]) -> Check {
    if actual.len() != expected.len() {
        return Err(format!(
            "length {} differs from expected {}",
            actual.len(),
            expected.len()
        ));
    }
    match actual.iter().zip(expected).position(|(a, e)| a != e) {
        None => Ok(()),
        Some(i) => Err(format!(
            "element {} is {}, expected {}",
            i, actual[i], expected[i]
        )),
    }
}

pub fn length<T>(data: &[T], expected: usize) -> Check {
    if data.len() == expected {
        Ok(())
    } else {
        Err(format!("length {} differs from expected {}", data.len(), expected))
    }
}

pub fn flag(actual: bool, expected: bool) -> Check {
    if actual == expected {
        Ok(())
    } else {
        Err(format!("result was {}, expected {}", actual, expected))
    }
}

/// `index` must name the first element holding the maximum.
pub fn first_maximum<T: Element>(data: &[T], index: Option<usize>) -> Check {
    let Some(index) = index else {
        return if data.is_empty() {
            Ok(())
        } else {
            Err("no maximum reported for a non-empty input".to_string())
        };
    };
    let Some(&value) = data.get(index) else {
        return Err(format!("maximum index {} out of bounds", index));
    };
    if let Some(i) = data[..index].iter().position(|x| x.order(&value) != Ordering::Less) {
        return Err(format!("element {} ({}) is not below reported maximum {}", i, data[i], value));
    }
    match data[index..].iter().position(|x| x.order(&value) == Ordering::Greater) {
        None => Ok(()),
        Some(i) => Err(format!("element {} exceeds reported maximum {}", index + i, value)),
    }
}

/// `found` must be the first `i` with `data[i] == data[i + 1]`.
pub fn first_adjacent_pair<T: Element>(data: &[T], found: Option<usize>) -> Check {
    let expected = data.windows(2).position(|w| w[0] == w[1]);
    if found == expected {
        Ok(())
    } else {
        Err(format!("reported pair {:?}, expected {:?}", found, expected))
    }
}

pub fn adjacent_differences<T: Element>(src: &[T], dst: &[T]) -> Check {
    length(dst, src.len())?;
    if let (Some(&s), Some(&d)) = (src.first(), dst.first()) {
        if s != d {
            return Err(format!("first element is {}, expected {}", d, s));
        }
    }
    match src
        .windows(2)
        .zip(&dst[1.min(dst.len())..])
        .position(|(w, &d)| d != w[1].difference(w[0]))
    {
        None => Ok(()),
        Some(i) => Err(format!("difference at {} is {}", i + 1, dst[i + 1])),
    }
}
