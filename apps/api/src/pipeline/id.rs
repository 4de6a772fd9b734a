use uuid::Uuid;

/// Key prefix for analysis records in the key-value store.
pub const RECORD_KEY_PREFIX: &str = "resume:";

/// A random (v4) UUID; collisions are negligible across any number of clients.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

pub fn record_key(id: &str) -> String {
    format!("{RECORD_KEY_PREFIX}{id}")
}
