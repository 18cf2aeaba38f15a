// Readiness slot for asynchronously loaded resources.
// Work that needs the resource (image bounds, pivots) is queued with
// when_ready and runs in FIFO order, exactly once, when it arrives.
// Visual: nothing jumps when sprites land; the pivot snaps in before the
// first sprite frame is drawn.

/// A size-dependent computation against the resource `T` and some state `C`.
pub type Pending<T, C> = Box<dyn FnOnce(&T, &mut C)>;

pub struct Deferred<T, C> {
    value: Option<T>,
    pending: Vec<Pending<T, C>>,
}

impl<T, C> Default for Deferred<T, C> {
    fn default() -> Self {
        Self { value: None, pending: Vec::new() }
    }
}

impl<T, C> Deferred<T, C> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ready(&self) -> bool {
        self.value.is_some()
    }

    pub fn get(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Run `f` now if the resource is here, otherwise queue it.
    pub fn when_ready(&mut self, state: &mut C, f: impl FnOnce(&T, &mut C) + 'static) {
        match &self.value {
            Some(v) => f(v, state),
            None => self.pending.push(Box::new(f)),
        }
    }

    /// Completion signal. Drains the queue against the new value.
    /// A second resolve replaces the value and runs nothing.
    pub fn resolve(&mut self, value: T, state: &mut C) {
        for f in self.pending.drain(..) {
            f(&value, state);
        }
        self.value = Some(value);
    }
}

impl<T: std::fmt::Debug, C> std::fmt::Debug for Deferred<T, C> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred")
            .field("value", &self.value)
            .field("pending", &self.pending.len())
            .finish()
    }
}
