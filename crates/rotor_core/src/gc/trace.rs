use crate::gc::heap::ObjectId;

/// Drives the mark-and-trace traversal during a GC cycle.
///
/// The tracer maintains a grey stack of handles that have been reported as
/// reachable but whose outgoing references have not yet been visited. The
/// collector pops entries from the grey stack and calls `Trace::trace` on
/// them, which in turn pushes their referents onto the grey stack.
pub struct Tracer {
    /// Handles reported reachable but not yet traced.
    pub(crate) gray_stack: Vec<ObjectId>,
}

impl Tracer {
    /// Create a new, empty `Tracer`.
    pub fn new() -> Self {
        Self {
            gray_stack: Vec::new(),
        }
    }

    /// Report `id` as reachable and enqueue it for tracing.
    ///
    /// Reporting the same handle twice is harmless; the collector skips
    /// objects it already marked.
    #[inline]
    pub fn mark(&mut self, id: ObjectId) {
        self.gray_stack.push(id);
    }

    /// Report an optional handle, such as a prototype link.
    #[inline]
    pub fn mark_opt(&mut self, id: Option<ObjectId>) {
        if let Some(id) = id {
            self.mark(id);
        }
    }

    /// Pop the next handle to trace.
    pub(crate) fn pop(&mut self) -> Option<ObjectId> {
        self.gray_stack.pop()
    }
}

impl Default for Tracer {
    fn default() -> Self {
        Self::new()
    }
}

/// All GC-managed types must implement `Trace` to expose their outgoing
/// heap references to the garbage collector.
///
/// # Contract
/// An implementation **must** call [`Tracer::mark`] for *every* [`ObjectId`]
/// it holds strongly. Any handle that is not reported may be freed, leaving
/// the holder with a stale handle.
pub trait Trace {
    /// Visit all outgoing heap references, marking each via the tracer.
    fn trace(&self, tracer: &mut Tracer);
}

impl<T: Trace> Trace for Option<T> {
    fn trace(&self, tracer: &mut Tracer) {
        if let Some(inner) = self {
            inner.trace(tracer);
        }
    }
}

impl<T: Trace> Trace for [T] {
    fn trace(&self, tracer: &mut Tracer) {
        for item in self {
            item.trace(tracer);
        }
    }
}
