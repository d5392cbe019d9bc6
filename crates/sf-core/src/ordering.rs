//! Ordering policy for migrations.
//!
//! Ids that start with a decimal number compare by that number first, so
//! `2_b.sql` sorts before `10_a.sql` regardless of zero-padding. Numbered ids
//! sort before unnumbered ones, and everything else falls back to byte order.
//! The fallback keeps the order total and consistent with `Eq`: two ids only
//! compare `Equal` when they are the same string.

use crate::migration::Migration;
use std::cmp::Ordering;

/// Return the leading run of ASCII digits in `id`, if any.
fn numeric_prefix(id: &str) -> Option<&str> {
    let end = id
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map_or(id.len(), |(i, _)| i);
    if end == 0 {
        None
    } else {
        Some(&id[..end])
    }
}

/// Compare two digit strings as unbounded non-negative integers.
fn compare_digits(a: &str, b: &str) -> Ordering {
    let a = a.trim_start_matches('0');
    let b = b.trim_start_matches('0');
    a.len().cmp(&b.len()).then_with(|| a.cmp(b))
}

/// Compare two migration ids under the ordering policy.
pub fn compare_ids(a: &str, b: &str) -> Ordering {
    match (numeric_prefix(a), numeric_prefix(b)) {
        (Some(na), Some(nb)) => compare_digits(na, nb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Compare two migrations by id.
pub fn by_id(a: &Migration, b: &Migration) -> Ordering {
    a.id.cmp(&b.id)
}

/// Sort migrations into application order.
pub fn sort_migrations(migrations: &mut [Migration]) {
    migrations.sort_by(by_id);
}

#[cfg(test)]
#[path = "ordering_test.rs"]
mod tests;
