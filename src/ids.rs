use uuid::Uuid;

/// Fresh record identifier (random UUID v4, hyphenated).
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}
