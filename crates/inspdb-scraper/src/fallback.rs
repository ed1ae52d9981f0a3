//! Ordered-fallback lookup.
//!
//! The portal's markup and API are not known in advance, so several places
//! try a list of guesses in priority order and keep the first one that
//! produces something usable: result-row selectors, per-field selector
//! alternatives, JSON alias keys, and API endpoint suffixes. All of them go
//! through [`first_match`] or [`first_match_async`].

use std::future::Future;

/// The winning candidate of an ordered-fallback lookup.
#[derive(Debug)]
pub struct Hit<'c, C, T> {
    /// Position of the winning candidate in the input list.
    pub index: usize,
    pub candidate: &'c C,
    pub value: T,
}

/// Runs `attempt` on each candidate in order and returns the first result
/// that `accept` approves. Later candidates are never tried once one wins.
pub fn first_match<'c, C, T>(
    candidates: &'c [C],
    mut attempt: impl FnMut(&'c C) -> T,
    accept: impl Fn(&T) -> bool,
) -> Option<Hit<'c, C, T>> {
    for (index, candidate) in candidates.iter().enumerate() {
        let value = attempt(candidate);
        if accept(&value) {
            return Some(Hit {
                index,
                candidate,
                value,
            });
        }
    }
    None
}

/// Async counterpart of [`first_match`] for attempts that perform I/O.
///
/// Candidates are tried strictly one after another.
pub async fn first_match_async<'c, C, T, F, Fut>(
    candidates: &'c [C],
    mut attempt: F,
    accept: impl Fn(&T) -> bool,
) -> Option<Hit<'c, C, T>>
where
    F: FnMut(&'c C) -> Fut,
    Fut: Future<Output = T>,
{
    for (index, candidate) in candidates.iter().enumerate() {
        let value = attempt(candidate).await;
        if accept(&value) {
            return Some(Hit {
                index,
                candidate,
                value,
            });
        }
    }
    None
}

/// Splits a comma-separated alternatives string into trimmed, non-empty parts.
#[must_use]
pub fn split_alternatives(spec: &str) -> Vec<&str> {
    spec.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn returns_first_accepted_candidate() {
        let candidates = ["a", "bb", "ccc", "dddd"];
        let hit = first_match(&candidates, |c| c.len(), |len| *len >= 3).unwrap();
        assert_eq!(hit.index, 2);
        assert_eq!(*hit.candidate, "ccc");
        assert_eq!(hit.value, 3);
    }

    #[test]
    fn returns_none_when_nothing_accepted() {
        let candidates = ["a", "b"];
        assert!(first_match(&candidates, |c| c.len(), |len| *len > 5).is_none());
    }

    #[test]
    fn stops_after_first_hit() {
        let candidates = [1, 2, 3, 4];
        let mut tried = Vec::new();
        let hit = first_match(
            &candidates,
            |c| {
                tried.push(*c);
                *c
            },
            |v| *v == 2,
        );
        assert_eq!(hit.map(|h| h.index), Some(1));
        assert_eq!(tried, vec![1, 2]);
    }

    #[test]
    fn empty_candidate_list_yields_none() {
        let candidates: [&str; 0] = [];
        assert!(first_match(&candidates, |c| c.len(), |_| true).is_none());
    }

    #[tokio::test]
    async fn async_variant_follows_same_order() {
        let candidates = ["missing", "also-missing", "found"];
        let hit = first_match_async(
            &candidates,
            |c| async move { (*c == "found").then(|| c.to_uppercase()) },
            Option::is_some,
        )
        .await
        .unwrap();
        assert_eq!(hit.index, 2);
        assert_eq!(hit.value.as_deref(), Some("FOUND"));
    }

    #[test]
    fn split_alternatives_trims_and_drops_empty_parts() {
        assert_eq!(
            split_alternatives(" td.name , td:first-child,, "),
            vec!["td.name", "td:first-child"]
        );
        assert!(split_alternatives("").is_empty());
    }
}
