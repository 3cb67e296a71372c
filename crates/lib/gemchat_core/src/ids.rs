//! Row identifiers.
//!
//! Messages and refresh tokens use UUIDv7 so that IDs sort by creation time.
//! Postgres has no native v7 generator, so they are minted here; `users` keeps
//! the database default (`gen_random_uuid()`).

use uuid::Uuid;

/// Mint a new time-ordered ID.
pub fn new_id() -> Uuid {
    Uuid::now_v7()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_v7() {
        assert_eq!(new_id().get_version(), Some(uuid::Version::SortRand));
    }

    #[test]
    fn later_ids_never_sort_first() {
        let first = new_id();
        let second = new_id();
        assert!(second >= first);
    }
}
