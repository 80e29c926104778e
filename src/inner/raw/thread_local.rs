use core::cell::RefCell;
use core::ops::DerefMut;

use super::{Mutex, MutexGuard, MutexNode};
use crate::cfg::thread::LocalKey;
use crate::lock::{Lock, Wait};

/// A handle to a queue node stored at the thread local storage of the locking
/// threads.
///
/// The node is lazily initialized on first access and lives for as long as
/// its owning thread does, getting reclaimed together with the rest of the
/// thread's local storage once the thread exits. A single node is reused
/// across all acquisitions a thread runs through this handle, against any
/// number of mutexes.
pub struct LocalMutexNode<N: 'static> {
    #[cfg(not(all(loom, test)))]
    key: LocalKey<RefCell<N>>,

    // Loom's `thread_local!` macro does not support constant expressions, so
    // under loom the key must be borrowed from a `static` value.
    #[cfg(all(loom, test))]
    key: &'static LocalKey<RefCell<N>>,
}

impl<N> LocalMutexNode<N> {
    /// Creates a new `LocalMutexNode` key from the provided thread local node
    /// key.
    #[cfg(not(all(loom, test)))]
    pub const fn new(key: LocalKey<RefCell<N>>) -> Self {
        Self { key }
    }

    /// Creates a new loom based `LocalMutexNode` key from the provided thread
    /// local node key.
    #[cfg(all(loom, test))]
    #[cfg(not(tarpaulin_include))]
    pub const fn new(key: &'static LocalKey<RefCell<N>>) -> Self {
        Self { key }
    }
}

impl<T: ?Sized, L: Lock, W: Wait> Mutex<T, L, W> {
    /// Acquires this mutex with a thread local node and then runs a closure
    /// against the protected data.
    ///
    /// # Panics
    ///
    /// Panics if the thread local node is already mutably borrowed, that is,
    /// if this mutex or any other mutex is reentrantly locked through the
    /// same `node` key while a borrow is live.
    #[track_caller]
    pub fn lock_with_local<N, F, Ret>(&self, node: &'static LocalMutexNode<N>, f: F) -> Ret
    where
        N: DerefMut<Target = MutexNode<L>> + 'static,
        F: FnOnce(MutexGuard<'_, T, L, W>) -> Ret,
    {
        node.key.with(|cell| {
            let mut node = cell.borrow_mut();
            f(self.lock_with(&mut node))
        })
    }

    /// Attempts to acquire this mutex with a thread local node and then runs
    /// a closure against the protected data.
    ///
    /// This function does not block.
    ///
    /// # Panics
    ///
    /// Panics if the thread local node is already mutably borrowed.
    #[track_caller]
    pub fn try_lock_with_local<N, F, Ret>(&self, node: &'static LocalMutexNode<N>, f: F) -> Ret
    where
        N: DerefMut<Target = MutexNode<L>> + 'static,
        F: FnOnce(Option<MutexGuard<'_, T, L, W>>) -> Ret,
    {
        node.key.with(|cell| {
            let mut node = cell.borrow_mut();
            f(self.try_lock_with(&mut node))
        })
    }

    /// Acquires this mutex with a thread local node and then runs a closure
    /// against the protected data, without checking if the node is already
    /// mutably borrowed.
    ///
    /// # Safety
    ///
    /// Caller must guarantee that the thread local `node` is not already in
    /// use by an enclosing locking operation of this thread, else there are
    /// mutable aliases to the node and that is undefined behavior.
    pub unsafe fn lock_with_local_unchecked<N, F, Ret>(
        &self,
        node: &'static LocalMutexNode<N>,
        f: F,
    ) -> Ret
    where
        N: DerefMut<Target = MutexNode<L>> + 'static,
        F: FnOnce(MutexGuard<'_, T, L, W>) -> Ret,
    {
        node.key.with(|cell| {
            // SAFETY: Caller guaranteed that no other references to the
            // thread local node are live for the duration of this call.
            let node = unsafe { &mut *cell.as_ptr() };
            f(self.lock_with(node))
        })
    }

    /// Attempts to acquire this mutex with a thread local node and then runs
    /// a closure against the protected data, without checking if the node is
    /// already mutably borrowed.
    ///
    /// This function does not block.
    ///
    /// # Safety
    ///
    /// Caller must guarantee that the thread local `node` is not already in
    /// use by an enclosing locking operation of this thread, else there are
    /// mutable aliases to the node and that is undefined behavior.
    pub unsafe fn try_lock_with_local_unchecked<N, F, Ret>(
        &self,
        node: &'static LocalMutexNode<N>,
        f: F,
    ) -> Ret
    where
        N: DerefMut<Target = MutexNode<L>> + 'static,
        F: FnOnce(Option<MutexGuard<'_, T, L, W>>) -> Ret,
    {
        node.key.with(|cell| {
            // SAFETY: Caller guaranteed that no other references to the
            // thread local node are live for the duration of this call.
            let node = unsafe { &mut *cell.as_ptr() };
            f(self.try_lock_with(node))
        })
    }
}
