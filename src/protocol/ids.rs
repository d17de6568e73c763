//! Request id allocation.
//!
//! Ids live in a small fixed window and are recycled as soon as a request
//! completes. The allocator keeps no state of its own: whoever owns the
//! in-flight table answers "is this id taken?" and the allocator picks the
//! smallest free one. Negative ids are never produced, `-1` being the server's
//! signal for a rejected password.

/// Lowest id handed out
pub const FIRST_REQUEST_ID: i32 = 1;

/// Highest id handed out
pub const LAST_REQUEST_ID: i32 = 256;

/// Number of requests that can be outstanding at once
pub const REQUEST_ID_SLOTS: usize = (LAST_REQUEST_ID - FIRST_REQUEST_ID + 1) as usize;

/// Return the smallest id in `FIRST_REQUEST_ID..=LAST_REQUEST_ID` for which
/// `in_use` is false, or `None` when every slot is taken.
pub fn allocate<F>(in_use: F) -> Option<i32>
where
    F: Fn(i32) -> bool,
{
    (FIRST_REQUEST_ID..=LAST_REQUEST_ID).find(|id| !in_use(*id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_starts_at_one() {
        assert_eq!(allocate(|_| false), Some(1));
    }

    #[test]
    fn test_picks_smallest_free() {
        let taken: HashSet<i32> = [1, 2, 4].into_iter().collect();
        assert_eq!(allocate(|id| taken.contains(&id)), Some(3));
    }

    #[test]
    fn test_exhaustion_after_all_slots() {
        let mut taken = HashSet::new();
        for _ in 0..REQUEST_ID_SLOTS {
            let id = allocate(|id| taken.contains(&id)).expect("slot available");
            assert!((FIRST_REQUEST_ID..=LAST_REQUEST_ID).contains(&id));
            assert!(taken.insert(id), "id {id} handed out twice");
        }
        assert_eq!(allocate(|id| taken.contains(&id)), None);

        taken.remove(&130);
        assert_eq!(allocate(|id| taken.contains(&id)), Some(130));
    }
}
