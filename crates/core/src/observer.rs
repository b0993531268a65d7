/// Receives events from a running solver and optionally returns an action.
///
/// Closures of the form `FnMut(&E) -> Option<A>` are observers, and `()` is an
/// observer that never acts, which is how the `*_unobserved` helpers discard
/// events.
pub trait Observer<E, A> {
    /// Inspects an event and returns an action for the solver to take, if any.
    fn observe(&mut self, event: &E) -> Option<A>;
}

impl<E, A> Observer<E, A> for () {
    fn observe(&mut self, _event: &E) -> Option<A> {
        None
    }
}

impl<E, A, F> Observer<E, A> for F
where
    F: FnMut(&E) -> Option<A>,
{
    fn observe(&mut self, event: &E) -> Option<A> {
        self(event)
    }
}
