use chrono::{DateTime, Utc};

/// A fact that something happened in the marketplace.
///
/// Events are immutable and carry a stable type name so external consumers
/// (mailers, audit sinks) can route on it without knowing the Rust type.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable dotted name, e.g. `"listing.closed"`.
    fn event_type(&self) -> &'static str;

    /// Schema version of the payload.
    fn version(&self) -> u32 {
        1
    }

    /// Business time at which the event occurred.
    fn occurred_at(&self) -> DateTime<Utc>;
}
