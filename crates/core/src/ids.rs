//! Opaque id generation for records that aren't content-addressed.

use uuid::Uuid;

/// A random opaque token, used for `Experience::experience_id` and similar
/// identifiers that have no natural content-derived key.
pub fn new_opaque_id() -> String {
    Uuid::new_v4().to_string()
}
