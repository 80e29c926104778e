use core::fmt::{self, Debug, Display, Formatter};
use core::marker::PhantomData;
use core::mem::MaybeUninit;
use core::ptr;
use core::sync::atomic::Ordering::{AcqRel, Acquire, Relaxed, Release};

use crate::cfg::atomic::{fence, AtomicPtr, AtomicPtrNull};
use crate::cfg::cell::{UnsafeCell, UnsafeCellOptionWith, UnsafeCellWith};
use crate::lock::{Lock, Wait};
use crate::relax::Relax;

#[cfg(not(all(loom, test)))]
use core::ops::{Deref, DerefMut};

#[cfg(feature = "thread_local")]
mod thread_local;
#[cfg(feature = "thread_local")]
pub use thread_local::LocalMutexNode;

/// The inner type of [`MutexNode`], which is known to be in initialized state.
///
/// Queue nodes are aligned to the cache line size so that the flag a waiter
/// spins on never shares a line with another waiter's flag or with the lock's
/// own state, else the spinning would invalidate neighbouring lines on every
/// hand-off.
#[derive(Debug)]
#[cfg_attr(any(target_arch = "x86_64", target_arch = "aarch64"), repr(align(128)))]
#[cfg_attr(not(any(target_arch = "x86_64", target_arch = "aarch64")), repr(align(64)))]
pub struct MutexNodeInit<L> {
    next: AtomicPtr<Self>,
    lock: L,
}

impl<L> MutexNodeInit<L> {
    /// Returns a raw mutable pointer of this node.
    const fn as_ptr(&self) -> *mut Self {
        (self as *const Self).cast_mut()
    }

    /// A relaxed loop that returns a pointer to the successor once it finishes
    /// linking with the current thread.
    ///
    /// The atomic load operation called inside the loop is relaxed, but the
    /// returned node pointer is synchronized through a acquire fence.
    fn wait_next_acquire<R: Relax>(&self) -> *mut Self {
        let mut relax = R::new();
        let next = loop {
            let ptr = self.next.load(Relaxed);
            let true = ptr.is_null() else { break ptr };
            relax.relax();
        };
        fence(Acquire);
        next
    }
}

impl<L: Lock> MutexNodeInit<L> {
    /// Creates a new, locked and core based node (const).
    ///
    /// The flag is set **before** the node can ever be published as some
    /// predecessor's successor, else the predecessor could observe the link
    /// and release a stale flag, leaving this waiter spinning forever.
    #[cfg(not(all(loom, test)))]
    const fn locked() -> Self {
        let next = AtomicPtr::NULL_MUT;
        let lock = Lock::LOCKED;
        Self { next, lock }
    }

    /// Creates a new, locked and loom based node (non-const).
    #[cfg(all(loom, test))]
    #[cfg(not(tarpaulin_include))]
    fn locked() -> Self {
        let next = AtomicPtr::null_mut();
        let lock = Lock::locked();
        Self { next, lock }
    }
}

/// A locally-accessible record for forming the waiting queue.
///
/// The inner state is never dropped, only overwritten. This is desirable and
/// well suited for our use cases, since all `L` types used are only composed
/// of `no drop glue` types (eg. atomic types).
///
/// `L` must fail [`core::mem::needs_drop`] check, else `L` will leak.
#[derive(Debug)]
#[repr(transparent)]
pub struct MutexNode<L> {
    inner: MaybeUninit<MutexNodeInit<L>>,
}

impl<L> MutexNode<L> {
    /// Creates new `MutexNode` instance.
    pub const fn new() -> Self {
        Self { inner: MaybeUninit::uninit() }
    }
}

impl<L: Lock> MutexNode<L> {
    /// Initializes this node's inner state, returning a shared reference
    /// pointing to it.
    ///
    /// Initialization clears any state left over from a previous acquisition
    /// through this same node: the successor link is unset and the flag is
    /// locked, ready for a new enqueue.
    fn initialize(&mut self) -> &MutexNodeInit<L> {
        self.inner.write(MutexNodeInit::locked())
    }
}

#[cfg(not(tarpaulin_include))]
impl<L> Default for MutexNode<L> {
    #[inline(always)]
    fn default() -> Self {
        Self::new()
    }
}

/// A mutual exclusion primitive implementing the MCS lock protocol, useful
/// for protecting shared data.
///
/// The `tail` pointer is the only piece of state that is mutated by more than
/// one thread, and all of its mutations are single swap or compare-exchange
/// operations. It points to the most recently enqueued node, or null whenever
/// no thread holds or awaits the lock.
pub struct Mutex<T: ?Sized, L, W> {
    tail: AtomicPtr<MutexNodeInit<L>>,
    wait: PhantomData<W>,
    data: UnsafeCell<T>,
}

// Same unsafe impls as `std::sync::Mutex`.
unsafe impl<T: ?Sized + Send, L, W> Send for Mutex<T, L, W> {}
unsafe impl<T: ?Sized + Send, L, W> Sync for Mutex<T, L, W> {}

impl<T, L, W> Mutex<T, L, W> {
    /// Creates a new, unlocked and core based mutex (const).
    #[cfg(not(all(loom, test)))]
    pub const fn new(value: T) -> Self {
        let tail = AtomicPtr::NULL_MUT;
        let data = UnsafeCell::new(value);
        Self { tail, data, wait: PhantomData }
    }

    /// Creates a new, unlocked and loom based mutex (non-const).
    #[cfg(all(loom, test))]
    #[cfg(not(tarpaulin_include))]
    pub fn new(value: T) -> Self {
        let tail = AtomicPtr::null_mut();
        let data = UnsafeCell::new(value);
        Self { tail, data, wait: PhantomData }
    }

    /// Consumes this mutex, returning the underlying data.
    pub fn into_inner(self) -> T {
        self.data.into_inner()
    }
}

impl<T: ?Sized, L: Lock, W: Wait> Mutex<T, L, W> {
    /// Acquires this mutex, blocking the current thread until it is able to
    /// do so.
    ///
    /// The node is registered as the queue's tail with a single atomic swap.
    /// If the swap returns a predecessor, this thread links itself as that
    /// predecessor's successor and then waits until the predecessor hands the
    /// lock off by releasing this node's flag. An empty swap result means the
    /// queue was empty and the acquisition is immediate.
    pub fn lock_with<'a>(&'a self, n: &'a mut MutexNode<L>) -> MutexGuard<'a, T, L, W> {
        let node = n.initialize();
        let pred = self.tail.swap(node.as_ptr(), AcqRel);
        // If we have a predecessor, complete the link so it will notify us.
        if !pred.is_null() {
            // SAFETY: Predecessor pointers are only ever produced by `tail`
            // swaps over valid nodes, and a predecessor node stays valid at
            // least until this store is visible, since its owning thread must
            // observe the link before it can finish releasing the lock and
            // reuse the node.
            unsafe { &(*pred).next }.store(node.as_ptr(), Release);
            // Verify the lock hand-off, while applying some waiting policy.
            node.lock.wait_lock_relaxed::<W>();
            fence(Acquire);
        }
        MutexGuard::new(self, node)
    }

    /// Attempts to acquire this mutex without blocking the thread.
    ///
    /// A single compare-exchange installs the node as the queue's tail only
    /// if the queue is empty. On failure nothing is enqueued and the queue is
    /// left untouched.
    pub fn try_lock_with<'a>(&'a self, n: &'a mut MutexNode<L>) -> OptionGuard<'a, T, L, W> {
        let node = n.initialize();
        self.tail
            .compare_exchange(ptr::null_mut(), node.as_ptr(), AcqRel, Relaxed)
            .map(|_| MutexGuard::new(self, node))
            .ok()
    }

    /// Unlocks this mutex, handing the lock off to the successor (if any).
    ///
    /// If no successor is visible, a compare-exchange clears the tail, and
    /// its success means the queue is empty and the release is complete. Its
    /// failure means a successor has already swapped the tail but has not yet
    /// finished linking, so this thread waits for the link to become visible
    /// before handing off.
    fn unlock_with(&self, head: &MutexNodeInit<L>) {
        let mut next = head.next.load(Acquire);
        if next.is_null() {
            let false = self.try_unlock_release(head.as_ptr()) else { return };
            next = head.wait_next_acquire::<W::UnlockRelax>();
        }
        // SAFETY: The successor has already finished linking, therefore `next`
        // points to a valid node, and its owning thread is parked at its wait
        // loop until this release store is visible.
        unsafe { &(*next).lock }.notify_release();
    }
}

impl<T: ?Sized, L, W> Mutex<T, L, W> {
    /// Returns `true` if the lock is currently held.
    ///
    /// This function does not guarantee strong ordering, only atomicity.
    pub fn is_locked(&self) -> bool {
        !self.tail.load(Relaxed).is_null()
    }

    /// Returns a mutable reference to the underlying data.
    #[cfg(not(all(loom, test)))]
    pub fn get_mut(&mut self) -> &mut T {
        // SAFETY: We hold exclusive access to the Mutex data.
        unsafe { &mut *self.data.get() }
    }

    /// Unlocks the lock if the candidate node is the queue's tail.
    fn try_unlock_release(&self, node: *mut MutexNodeInit<L>) -> bool {
        self.tail.compare_exchange(node, ptr::null_mut(), Release, Relaxed).is_ok()
    }
}

impl<T: ?Sized, L: Lock, W: Wait> Mutex<T, L, W> {
    /// Attempts to acquire this mutex and then runs a closure against the
    /// protected data.
    ///
    /// This function does not block.
    pub fn try_lock_with_then<F, Ret>(&self, node: &mut MutexNode<L>, f: F) -> Ret
    where
        F: FnOnce(Option<&mut T>) -> Ret,
    {
        self.try_lock_with(node).as_deref_mut_with_mut(f)
    }
}

impl<T: ?Sized + Debug, L: Lock, W: Wait> Debug for Mutex<T, L, W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let mut node = MutexNode::new();
        let mut d = f.debug_struct("Mutex");
        self.try_lock_with_then(&mut node, |data| match data {
            Some(data) => d.field("data", &data),
            None => d.field("data", &format_args!("<locked>")),
        });
        d.finish()
    }
}

/// Short alias for a `Option` wrapped `MutexGuard`.
type OptionGuard<'a, T, L, W> = Option<MutexGuard<'a, T, L, W>>;

/// An RAII implementation of a "scoped lock" of a mutex. When this structure is
/// dropped (falls out of scope), the lock will be unlocked.
#[must_use = "if unused the Mutex will immediately unlock"]
pub struct MutexGuard<'a, T: ?Sized, L: Lock, W: Wait> {
    lock: &'a Mutex<T, L, W>,
    head: &'a MutexNodeInit<L>,
}

// Same unsafe Sync impl as `std::sync::MutexGuard`.
unsafe impl<T: ?Sized + Sync, L: Lock, W: Wait> Sync for MutexGuard<'_, T, L, W> {}

impl<'a, T: ?Sized, L: Lock, W: Wait> MutexGuard<'a, T, L, W> {
    /// Creates a new `MutexGuard` instance.
    const fn new(lock: &'a Mutex<T, L, W>, head: &'a MutexNodeInit<L>) -> Self {
        Self { lock, head }
    }

    /// Runs `f` against a shared reference pointing to the underlying data.
    fn with<F, Ret>(&self, f: F) -> Ret
    where
        F: FnOnce(&T) -> Ret,
    {
        // SAFETY: A guard instance holds the lock locked.
        unsafe { self.lock.data.with_unchecked(f) }
    }
}

/// A trait that converts a `&mut Self` to a `Option<&mut Self::Target>` and
/// then runs closures against it.
trait AsDerefMutWithMut {
    type Target: ?Sized;

    /// Converts `&mut Self` to `Option<&mut Self::Target>` and then runs `f`
    /// against it.
    fn as_deref_mut_with_mut<F, Ret>(&mut self, f: F) -> Ret
    where
        F: FnOnce(Option<&mut Self::Target>) -> Ret;
}

impl<T: ?Sized, L: Lock, W: Wait> AsDerefMutWithMut for OptionGuard<'_, T, L, W> {
    type Target = T;

    fn as_deref_mut_with_mut<F, Ret>(&mut self, f: F) -> Ret
    where
        F: FnOnce(Option<&mut Self::Target>) -> Ret,
    {
        let data = self.as_ref().map(|guard| &guard.lock.data);
        // SAFETY: A guard instance holds the lock locked.
        unsafe { data.as_deref_with_mut_unchecked(f) }
    }
}

impl<T: ?Sized + Debug, L: Lock, W: Wait> Debug for MutexGuard<'_, T, L, W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.with(|data| data.fmt(f))
    }
}

impl<T: ?Sized + Display, L: Lock, W: Wait> Display for MutexGuard<'_, T, L, W> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        self.with(|data| data.fmt(f))
    }
}

#[cfg(not(all(loom, test)))]
impl<T: ?Sized, L: Lock, W: Wait> Deref for MutexGuard<'_, T, L, W> {
    type Target = T;

    /// Dereferences the guard to access the underlying data.
    #[inline(always)]
    fn deref(&self) -> &T {
        // SAFETY: A guard instance holds the lock locked.
        unsafe { &*self.lock.data.get() }
    }
}

#[cfg(not(all(loom, test)))]
impl<T: ?Sized, L: Lock, W: Wait> DerefMut for MutexGuard<'_, T, L, W> {
    /// Mutably dereferences the guard to access the underlying data.
    #[inline(always)]
    fn deref_mut(&mut self) -> &mut T {
        // SAFETY: A guard instance holds the lock locked.
        unsafe { &mut *self.lock.data.get() }
    }
}

impl<T: ?Sized, L: Lock, W: Wait> Drop for MutexGuard<'_, T, L, W> {
    #[inline]
    fn drop(&mut self) {
        self.lock.unlock_with(self.head);
    }
}

/// SAFETY: A guard instance hold the lock locked, with exclusive access to the
/// underlying data.
#[cfg(all(loom, test))]
#[cfg(not(tarpaulin_include))]
unsafe impl<T: ?Sized, L: Lock, W: Wait> crate::loom::Guard for MutexGuard<'_, T, L, W> {
    type Target = T;

    fn get(&self) -> &UnsafeCell<Self::Target> {
        &self.lock.data
    }
}

#[cfg(all(not(loom), test))]
mod test {
    use core::mem;

    use crate::cfg::atomic::AtomicBool;

    use super::MutexNodeInit;

    #[test]
    fn node_is_cache_line_aligned() {
        // Waiters must not false share the lines they spin on.
        assert!(mem::align_of::<MutexNodeInit<AtomicBool>>() >= 64);
    }
}
