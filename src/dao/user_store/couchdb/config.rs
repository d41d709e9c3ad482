const DEFAULT_BASE_URL: &str = "http://localhost:5984";
const DEFAULT_DB: &str = "scorekeeper";

/// Where the CouchDB server lives and which database holds the player documents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CouchConfig {
    /// Server root, e.g. `http://localhost:5984`.
    pub base_url: String,
    /// Database holding the `users::` documents.
    pub database: String,
    /// Basic-auth credentials, sent on every request when present.
    pub credentials: Option<(String, String)>,
}

impl CouchConfig {
    /// Anonymous access to `database` on the server at `base_url`.
    pub fn new(base_url: impl Into<String>, database: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            database: database.into(),
            credentials: None,
        }
    }

    /// Read `COUCH_BASE_URL`, `COUCH_DB`, `COUCH_USERNAME` and `COUCH_PASSWORD`.
    ///
    /// Server and database fall back to a local `scorekeeper` database; credentials are used
    /// only when both halves are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::new(
            non_empty("COUCH_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.into()),
            non_empty("COUCH_DB").unwrap_or_else(|| DEFAULT_DB.into()),
        );
        config.credentials = non_empty("COUCH_USERNAME").zip(non_empty("COUCH_PASSWORD"));
        config
    }
}
