//! Choice port — random selection among configured phrases and emojis.

/// Picks an index uniformly at random.
///
/// Injected so that payload construction is deterministic under test.
pub trait ChoiceSource: Send + Sync {
    /// Return an index in `0..len`. Never called with `len == 0`.
    fn pick(&self, len: usize) -> usize;
}

impl<R: ChoiceSource> ChoiceSource for std::sync::Arc<R> {
    fn pick(&self, len: usize) -> usize {
        (**self).pick(len)
    }
}
