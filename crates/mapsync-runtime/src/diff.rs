#![forbid(unsafe_code)]

//! Sequence differencing for collection reconciliation.
//!
//! A [`SequenceDiff`] compares two snapshots under a caller-supplied identity
//! predicate and returns the edit script as a list of [`Difference`]s.
//!
//! # Policies
//!
//! | Policy | Reorder of a member | Cost |
//! |--------|---------------------|------|
//! | [`LcsDiff`] | `Deleted` + `Added` | O(n·m) on the changed middle |
//! | [`MoveAwareDiff`] | `Retained` | LCS plus a pairing pass |
//!
//! # Invariants
//!
//! 1. `Retained` and `Added` values, in output order, spell the new
//!    sequence.
//! 2. For [`LcsDiff`], `Retained` and `Deleted` values, in output order,
//!    spell the old sequence.
//! 3. `Added`/`Retained` indices refer to the new sequence, `Deleted`
//!    indices to the old one.

/// What happened to one member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiffStatus {
    /// Present only in the new sequence.
    Added,
    /// Present only in the old sequence.
    Deleted,
    /// Present in both.
    Retained,
}

/// One entry of an edit script.
#[derive(Debug, Clone, PartialEq)]
pub struct Difference<T> {
    /// What happened.
    pub status: DiffStatus,
    /// The member.
    pub value: T,
    /// Position in the new sequence (old sequence for `Deleted`).
    pub index: usize,
}

impl<T> Difference<T> {
    fn new(status: DiffStatus, value: T, index: usize) -> Self {
        Self {
            status,
            value,
            index,
        }
    }
}

/// Strategy for comparing two snapshots.
pub trait SequenceDiff {
    /// Edit script turning `old` into `new`, comparing members with `same`.
    fn diff<T: Clone>(
        &self,
        old: &[T],
        new: &[T],
        same: &dyn Fn(&T, &T) -> bool,
    ) -> Vec<Difference<T>>;
}

/// Longest-common-subsequence diff. A moved member is deleted and re-added.
#[derive(Debug, Clone, Copy, Default)]
pub struct LcsDiff;

impl SequenceDiff for LcsDiff {
    fn diff<T: Clone>(
        &self,
        old: &[T],
        new: &[T],
        same: &dyn Fn(&T, &T) -> bool,
    ) -> Vec<Difference<T>> {
        let prefix = old
            .iter()
            .zip(new)
            .take_while(|&(a, b)| same(a, b))
            .count();
        let suffix = old[prefix..]
            .iter()
            .rev()
            .zip(new[prefix..].iter().rev())
            .take_while(|&(a, b)| same(a, b))
            .count();

        let old_mid = &old[prefix..old.len() - suffix];
        let new_mid = &new[prefix..new.len() - suffix];
        let mut out = Vec::with_capacity(old.len().max(new.len()));

        for (i, item) in new[..prefix].iter().enumerate() {
            out.push(Difference::new(DiffStatus::Retained, item.clone(), i));
        }

        let (m, n) = (old_mid.len(), new_mid.len());
        // lcs[i * (n + 1) + j] = LCS length of old_mid[i..] and new_mid[j..].
        let width = n + 1;
        let mut lcs = vec![0u32; (m + 1) * width];
        for i in (0..m).rev() {
            for j in (0..n).rev() {
                lcs[i * width + j] = if same(&old_mid[i], &new_mid[j]) {
                    lcs[(i + 1) * width + j + 1] + 1
                } else {
                    lcs[(i + 1) * width + j].max(lcs[i * width + j + 1])
                };
            }
        }

        let (mut i, mut j) = (0, 0);
        while i < m && j < n {
            if same(&old_mid[i], &new_mid[j]) {
                out.push(Difference::new(
                    DiffStatus::Retained,
                    new_mid[j].clone(),
                    prefix + j,
                ));
                i += 1;
                j += 1;
            } else if lcs[(i + 1) * width + j] >= lcs[i * width + j + 1] {
                out.push(Difference::new(
                    DiffStatus::Deleted,
                    old_mid[i].clone(),
                    prefix + i,
                ));
                i += 1;
            } else {
                out.push(Difference::new(
                    DiffStatus::Added,
                    new_mid[j].clone(),
                    prefix + j,
                ));
                j += 1;
            }
        }
        for (k, item) in old_mid.iter().enumerate().skip(i) {
            out.push(Difference::new(DiffStatus::Deleted, item.clone(), prefix + k));
        }
        for (k, item) in new_mid.iter().enumerate().skip(j) {
            out.push(Difference::new(DiffStatus::Added, item.clone(), prefix + k));
        }

        let tail_start = new.len() - suffix;
        for (k, item) in new[tail_start..].iter().enumerate() {
            out.push(Difference::new(DiffStatus::Retained, item.clone(), tail_start + k));
        }
        out
    }
}

/// LCS diff that reports moved members as `Retained`.
///
/// Every `Deleted` entry is paired with the first unpaired `Added` entry of
/// the same identity; the pair collapses into one `Retained` entry at the
/// new position.
#[derive(Debug, Clone, Copy, Default)]
pub struct MoveAwareDiff;

impl SequenceDiff for MoveAwareDiff {
    fn diff<T: Clone>(
        &self,
        old: &[T],
        new: &[T],
        same: &dyn Fn(&T, &T) -> bool,
    ) -> Vec<Difference<T>> {
        let mut script = LcsDiff.diff(old, new, same);
        let mut dropped = vec![false; script.len()];

        for d in 0..script.len() {
            if script[d].status != DiffStatus::Deleted {
                continue;
            }
            let partner = (0..script.len()).find(|&a| {
                script[a].status == DiffStatus::Added && same(&script[a].value, &script[d].value)
            });
            if let Some(a) = partner {
                script[a].status = DiffStatus::Retained;
                dropped[d] = true;
            }
        }

        script
            .into_iter()
            .zip(dropped)
            .filter_map(|(entry, drop)| (!drop).then_some(entry))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn eq(a: &char, b: &char) -> bool {
        a == b
    }

    fn script<D: SequenceDiff>(policy: D, old: &str, new: &str) -> Vec<(DiffStatus, char)> {
        let old: Vec<char> = old.chars().collect();
        let new: Vec<char> = new.chars().collect();
        policy
            .diff(&old, &new, &eq)
            .into_iter()
            .map(|d| (d.status, d.value))
            .collect()
    }

    #[test]
    fn delete_one_add_one() {
        use DiffStatus::*;
        assert_eq!(
            script(LcsDiff, "abc", "acd"),
            [(Retained, 'a'), (Deleted, 'b'), (Retained, 'c'), (Added, 'd')]
        );
    }

    #[test]
    fn identical_is_all_retained() {
        assert!(
            script(LcsDiff, "abcd", "abcd")
                .iter()
                .all(|(s, _)| *s == DiffStatus::Retained)
        );
    }

    #[test]
    fn reorder_churns_only_displaced_member() {
        let lcs = script(LcsDiff, "abcd", "bcda");
        let churned: Vec<_> = lcs
            .iter()
            .filter(|(s, _)| *s != DiffStatus::Retained)
            .collect();
        assert_eq!(churned, [&(DiffStatus::Deleted, 'a'), &(DiffStatus::Added, 'a')]);
    }

    #[test]
    fn move_aware_reorder_is_silent() {
        let moved = script(MoveAwareDiff, "abcd", "bcda");
        assert!(moved.iter().all(|(s, _)| *s == DiffStatus::Retained));
        assert_eq!(
            moved.iter().map(|(_, c)| *c).collect::<String>(),
            "bcda"
        );
    }

    #[test]
    fn indices_follow_their_sequence() {
        let old = ['x', 'y'];
        let new = ['y', 'z'];
        let diff = LcsDiff.diff(&old, &new, &eq);
        let deleted = diff.iter().find(|d| d.status == DiffStatus::Deleted).unwrap();
        assert_eq!((deleted.value, deleted.index), ('x', 0));
        let added = diff.iter().find(|d| d.status == DiffStatus::Added).unwrap();
        assert_eq!((added.value, added.index), ('z', 1));
    }

    #[test]
    fn empty_sides() {
        assert_eq!(script(LcsDiff, "", "ab").len(), 2);
        assert_eq!(script(LcsDiff, "ab", "").len(), 2);
        assert!(script(LcsDiff, "", "").is_empty());
    }

    fn project(script: &[Difference<u8>], keep: DiffStatus) -> Vec<u8> {
        script
            .iter()
            .filter(|d| d.status == DiffStatus::Retained || d.status == keep)
            .map(|d| d.value)
            .collect()
    }

    proptest! {
        #[test]
        fn lcs_script_spells_both_sequences(
            old in proptest::collection::vec(0u8..6, 0..24),
            new in proptest::collection::vec(0u8..6, 0..24),
        ) {
            let diff = LcsDiff.diff(&old, &new, &|a: &u8, b: &u8| a == b);
            prop_assert_eq!(project(&diff, DiffStatus::Added), new);
            prop_assert_eq!(project(&diff, DiffStatus::Deleted), old);
        }

        #[test]
        fn move_aware_script_spells_new_sequence(
            old in proptest::collection::vec(0u8..6, 0..24),
            new in proptest::collection::vec(0u8..6, 0..24),
        ) {
            let diff = MoveAwareDiff.diff(&old, &new, &|a: &u8, b: &u8| a == b);
            prop_assert_eq!(project(&diff, DiffStatus::Added), new.clone());

            let mut kept = project(&diff, DiffStatus::Deleted);
            let mut expected = old.clone();
            kept.sort_unstable();
            expected.sort_unstable();
            prop_assert_eq!(kept, expected);
        }
    }
}
