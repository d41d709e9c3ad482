use uuid::Uuid;

/// Source of opaque, statistically unique record identifiers.
pub trait IdGenerator: Send + Sync {
    /// A fresh identifier, never returned before.
    fn next_id(&self) -> String;
}

/// Random (v4) UUID identifiers rendered in their hyphenated form.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn next_id(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
