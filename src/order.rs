//! Order resolution: turning on-disk entries plus an [`OrderFile`] into the
//! final visible sequence.
//!
//! ## Algorithm
//!
//! ```text
//! candidates ──► drop hidden (dot-marked in .order)
//!            ──► ranked:    each .order entry, matched to a candidate by
//!                           basename (exact first, then case-insensitive),
//!                           first occurrence wins, unmatched entries dropped
//!            ──► remainder: every visible candidate not ranked,
//!                           natural-sorted (case-insensitive, img2 < img10)
//! result = ranked ++ remainder       (a permutation of the visible set)
//! ```
//!
//! Callers pass only entries of the relevant kind (subfolders, images,
//! project names, registry keys) and have already removed dot-named entries.

use crate::directives::OrderFile;
use crate::naming::basename;
use std::cmp::Ordering;

/// Order plain names. See [`resolve_order_by`].
pub fn resolve_order(candidates: Vec<String>, order: &OrderFile) -> Vec<String> {
    resolve_order_by(candidates, order, |s| s.as_str(), |s| s.as_str())
}

/// Order arbitrary items by an identifying name.
///
/// `name` is what `.order` lines and hidden markers are matched against;
/// `sort_key` is what the unlisted remainder is naturally sorted by (ties fall
/// back to `name`, so the result is deterministic).
pub fn resolve_order_by<T>(
    candidates: Vec<T>,
    order: &OrderFile,
    name: impl Fn(&T) -> &str,
    sort_key: impl Fn(&T) -> &str,
) -> Vec<T> {
    let mut pool: Vec<Option<T>> = candidates
        .into_iter()
        .filter(|c| !order.is_hidden(name(c)))
        .map(Some)
        .collect();

    let mut ranked = Vec::new();
    for entry in &order.order {
        let wanted = basename(entry);
        let exact = pool
            .iter()
            .position(|slot| slot.as_ref().is_some_and(|c| name(c) == wanted));
        let found = exact.or_else(|| {
            let lower = wanted.to_lowercase();
            pool.iter().position(|slot| {
                slot.as_ref()
                    .is_some_and(|c| name(c).to_lowercase() == lower)
            })
        });
        if let Some(item) = found.and_then(|i| pool[i].take()) {
            ranked.push(item);
        }
    }

    let mut remainder: Vec<T> = pool.into_iter().flatten().collect();
    remainder.sort_by(|a, b| {
        natural_cmp(sort_key(a), sort_key(b)).then_with(|| natural_cmp(name(a), name(b)))
    });

    ranked.extend(remainder);
    ranked
}

#[derive(Debug, PartialEq, Eq)]
enum Chunk<'a> {
    Digits(&'a str),
    Text(&'a str),
}

fn chunks(s: &str) -> Vec<Chunk<'_>> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut digits: Option<bool> = None;
    for (i, c) in s.char_indices() {
        let is_digit = c.is_ascii_digit();
        match digits {
            Some(d) if d != is_digit => {
                out.push(chunk(&s[start..i], d));
                start = i;
            }
            _ => {}
        }
        digits = Some(is_digit);
    }
    if let Some(d) = digits {
        out.push(chunk(&s[start..], d));
    }
    out
}

fn chunk(s: &str, digits: bool) -> Chunk<'_> {
    if digits { Chunk::Digits(s) } else { Chunk::Text(s) }
}

fn cmp_digits(a: &str, b: &str) -> Ordering {
    let a_trim = a.trim_start_matches('0');
    let b_trim = b.trim_start_matches('0');
    a_trim
        .len()
        .cmp(&b_trim.len())
        .then_with(|| a_trim.cmp(b_trim))
}

/// Natural, case- and accent-insensitive comparison.
///
/// Digit runs compare by numeric value (`img2` < `img10`, no overflow for
/// long runs); text compares after folding to lowercase ASCII. Names equal
/// under folding fall back to a plain byte comparison so the order is total.
pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let fa = deunicode::deunicode(a).to_lowercase();
    let fb = deunicode::deunicode(b).to_lowercase();
    let (ca, cb) = (chunks(&fa), chunks(&fb));

    for (x, y) in ca.iter().zip(cb.iter()) {
        let ord = match (x, y) {
            (Chunk::Digits(x), Chunk::Digits(y)) => cmp_digits(x, y),
            (Chunk::Digits(x), Chunk::Text(y)) | (Chunk::Text(x), Chunk::Digits(y)) => x.cmp(y),
            (Chunk::Text(x), Chunk::Text(y)) => x.cmp(y),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    ca.len().cmp(&cb.len()).then_with(|| a.cmp(b))
}
