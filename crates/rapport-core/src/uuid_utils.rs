//! Identifier helpers.
//!
//! Every row id is an opaque string. New ids are UUIDv7 so they sort by
//! creation time, but nothing downstream depends on that shape.

use uuid::Uuid;

/// Generate a new time-ordered row identifier.
pub fn new_id() -> String {
    Uuid::now_v7().to_string()
}

/// Returns true if `id` parses as a version 7 UUID.
pub fn is_v7(id: &str) -> bool {
    Uuid::parse_str(id)
        .map(|u| u.get_version_num() == 7)
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_id_is_v7() {
        assert!(is_v7(&new_id()));
    }

    #[test]
    fn test_new_ids_are_unique() {
        let a = new_id();
        let b = new_id();
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_v7_rejects_other_ids() {
        assert!(!is_v7("c1"));
        assert!(!is_v7(&Uuid::new_v4().to_string()));
    }
}
