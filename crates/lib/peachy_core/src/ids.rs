//! Row identifiers.
//!
//! Session ids are UUIDv7 so session rows sort by sign-in time. User and
//! account ids are random v4, matching `gen_random_uuid()` in the schema.

use uuid::Uuid;

/// Id for a new session row.
pub fn session_id() -> String {
    Uuid::now_v7().to_string()
}

/// Id for a new user or account row.
pub fn record_id() -> String {
    Uuid::new_v4().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_ids_are_v7_and_ordered() {
        let a: Uuid = session_id().parse().unwrap();
        let b: Uuid = session_id().parse().unwrap();
        assert_eq!(a.get_version(), Some(uuid::Version::SortRand));
        assert!(b >= a);
    }

    #[test]
    fn record_ids_are_random_v4() {
        let id: Uuid = record_id().parse().unwrap();
        assert_eq!(id.get_version(), Some(uuid::Version::Random));
        assert_ne!(record_id(), record_id());
    }
}
