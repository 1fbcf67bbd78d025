/// Classification for retry policy.
///
/// Produced by a backend adapter for every failed fetch and consumed by the
/// retry executor.
///
/// # Behavior Summary
///
/// | Class | Retry while budget remains? | Counted as provider failure? |
/// |-------|-----------------------------|------------------------------|
/// | `Transient` | Yes | Yes |
/// | `Permanent` | No | Yes |
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RetryClass {
    /// The backend is overloaded, throttling, or unreachable.
    /// Another attempt after a backoff may succeed.
    Transient,

    /// The request itself is bad or the payload is unusable.
    /// The request is fundamentally invalid and retrying won't help.
    Permanent,
}

impl RetryClass {
    /// Returns true for [`RetryClass::Transient`].
    pub fn is_retryable(self) -> bool {
        matches!(self, Self::Transient)
    }
}
