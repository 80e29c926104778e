use core::sync::atomic::Ordering::{Relaxed, Release};

use crate::cfg::atomic::AtomicBool;
use crate::relax::Relax;

/// A per-node lock state that waiters can spin on and that the releasing
/// thread can hand off through.
///
/// The waiter side runs relaxed loads in a loop, applying a relax policy in
/// between, and the caller is expected to issue a acquire fence once the wait
/// returns. The release side runs a single store with release ordering. That
/// store/load pair is the happens-before edge that transfers the critical
/// section from the previous holder to the next one.
pub trait Lock {
    /// Creates a new locked `Lock` instance (const).
    #[cfg(not(all(loom, test)))]
    #[allow(clippy::declare_interior_mutable_const)]
    const LOCKED: Self;

    /// Creates a new locked, loom based `Lock` instance (non-const).
    #[cfg(all(loom, test))]
    fn locked() -> Self;

    /// Blocks the thread until this lock state is released by the predecessor,
    /// running relaxed loads and the policy's relax operation in between.
    ///
    /// Callers must synchronize with a subsequent acquire fence.
    fn wait_lock_relaxed<W: Wait>(&self);

    /// Releases this lock state, signaling the waiting successor thread.
    fn notify_release(&self);
}

impl Lock for AtomicBool {
    #[cfg(not(all(loom, test)))]
    const LOCKED: Self = Self::new(true);

    #[cfg(all(loom, test))]
    #[cfg(not(tarpaulin_include))]
    fn locked() -> Self {
        Self::new(true)
    }

    fn wait_lock_relaxed<W: Wait>(&self) {
        let mut relax = W::LockRelax::new();
        while self.load(Relaxed) {
            relax.relax();
        }
    }

    fn notify_release(&self) {
        self.store(false, Release);
    }
}

/// A waiting policy for both of the protocol's wait loops.
///
/// The `LockRelax` policy runs while a enqueued thread waits for its own flag
/// to be released by the predecessor. The `UnlockRelax` policy runs while a
/// releasing thread waits for a mid-enqueue successor to finish linking
/// itself into the queue.
pub trait Wait {
    /// The relax policy applied while waiting for the lock hand-off.
    type LockRelax: Relax;

    /// The relax policy applied while waiting for a successor to link.
    type UnlockRelax: Relax;
}
