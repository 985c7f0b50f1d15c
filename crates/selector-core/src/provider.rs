//! External lookups a [`crate::rule::Rule`] may need but cannot perform
//! itself (range-server-style host group expansion).

/// Resolves a Yahoo Range-style expression to the fqdns it names. Batched:
/// `YahooRange`'s filter calls `get` at most once per `filter` invocation,
/// regardless of how many subjects are being checked.
pub trait RangeProvider: Send + Sync {
    fn get(&self, expr: &str) -> Result<Vec<String>, Box<dyn std::error::Error + Send + Sync>>;
}
