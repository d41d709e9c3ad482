/// Identifier generation for new records.
pub mod ids;
/// Database model definitions.
pub mod models;
/// Storage abstraction layer for database operations.
pub mod storage;
/// Record store operations (create, get, update score).
pub mod user;
/// Storage backends holding player records.
pub mod user_store;
