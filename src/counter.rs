//! Failure counters.

/// Monotonic counter a [`Source`](crate::Source) bumps once per failed query.
///
/// The source never reads it back; it exists for external observability.
pub trait Counter: Send + Sync {
    fn increment(&self);
}

/// Counters registered through the `metrics` facade, e.g.
/// `metrics::counter!("source_failures_total", "source" => "users")`.
impl Counter for metrics::Counter {
    fn increment(&self) {
        metrics::Counter::increment(self, 1);
    }
}
