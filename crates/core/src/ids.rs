//! Gap-filling identifier allocation.
//!
//! New projects, tasks and reports take the lowest positive id not currently
//! in use rather than `max + 1`, so ids freed by deletes (and the low ids
//! seed data leaves unused) are reused.

use crate::types::DbId;

/// Return the smallest positive id absent from `existing`.
///
/// `existing` must be sorted ascending. Duplicates and non-positive values
/// are tolerated.
pub fn next_free_id<I>(existing: I) -> DbId
where
    I: IntoIterator<Item = DbId>,
{
    let mut expected: DbId = 1;
    for id in existing {
        if id > expected {
            break;
        }
        if id == expected {
            expected += 1;
        }
    }
    expected
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_table_starts_at_one() {
        assert_eq!(next_free_id(Vec::new()), 1);
    }

    #[test]
    fn fills_the_first_gap() {
        assert_eq!(next_free_id([1, 2, 4]), 3);
        assert_eq!(next_free_id([2, 3]), 1);
    }

    #[test]
    fn dense_sequence_appends() {
        assert_eq!(next_free_id([1, 2, 3]), 4);
    }

    #[test]
    fn tolerates_duplicates_and_non_positive_ids() {
        assert_eq!(next_free_id([-3, 0, 1, 1, 2, 5]), 3);
    }
}
