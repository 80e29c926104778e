//! A safe implementation of Mellor-Crummey and Scott's contention-free
//! [spin-lock] for mutual exclusion, referred to as MCS lock.
//!
//! MCS lock is a List-Based Queuing Lock that avoids network contention by
//! having threads spin on local memory locations. The main properties of this
//! mechanism are:
//!
//! - guarantees FIFO ordering of lock acquisitions;
//! - spins on locally-accessible flag variables only;
//! - requires a small constant amount of space per lock; and
//! - works equally well (requiring only O(1) network transactions per lock
//!   acquisition) on machines with and without coherent caches.
//!
//! This algorithm and several others were introduced by the
//! [Mellor-Crummey and Scott] paper.
//!
//! ## Spinlock use cases
//!
//! It is noteworthy to mention that [spinlocks are usually not what you want].
//! The majority of use cases are well covered by OS-based mutexes like
//! [`std::sync::Mutex`] and [`parking_lot::Mutex`]. These implementations will
//! notify the system that the waiting thread should be parked, freeing the
//! processor to work on something else.
//!
//! Spinlocks are only efficient in very few circumstances where the overhead
//! of context switching or process rescheduling are greater than busy waiting
//! for very short periods. Spinlocks can be useful inside operating-system
//! kernels, on embedded systems or even complement other locking designs.
//!
//! ## Waiting queue nodes
//!
//! Each lock acquisition requires exclusive access to a queue node, which is
//! a record that links the waiting threads into an implicit FIFO queue. Each
//! waiter spins on the flag of its own node only, and the node is handed back
//! once the matching guard is dropped, ready to be reused by a subsequent
//! acquisition from the same thread. Queue nodes are represented by the
//! [`raw::MutexNode`] type and may live anywhere the caller pleases: the
//! stack, the heap or the thread local storage (see the `thread_local`
//! feature). Nodes are cache-line aligned so that waiters do not false share
//! the lines they spin on.
//!
//! ## Locking with a raw MCS spinlock
//!
//! The [`raw`] module provides an implementation that is `no_std` compatible,
//! but requires that queue nodes must be instantiated by the callers, and
//! exclusively borrowed for as long as the associated lock guard is live.
//!
//! ```
//! use std::sync::Arc;
//! use std::thread;
//!
//! // Simply spins during contention.
//! use mcspinlock::raw::{spins::Mutex, MutexNode};
//!
//! let mutex = Arc::new(Mutex::new(0));
//! let c_mutex = Arc::clone(&mutex);
//!
//! thread::spawn(move || {
//!     // A queue node must be mutably accessible.
//!     let mut node = MutexNode::new();
//!     *c_mutex.lock(&mut node) = 10;
//! })
//! .join().expect("thread::spawn failed");
//!
//! // A queue node must be mutably accessible.
//! let mut node = MutexNode::new();
//! assert_eq!(*mutex.try_lock(&mut node).unwrap(), 10);
//! ```
//!
//! ## Thread local queue nodes
//!
//! By enabling the `thread_local` feature, node instantiation can be handled
//! transparently: nodes are lazily stored at the thread local storage of the
//! locking threads and are released once the owning thread terminates. These
//! locking APIs require critical sections to be provided as closures, and
//! will panic if recursively acquired through the same node key. Not `no_std`
//! compatible. See the [`raw::LocalMutexNode`] type and the
//! [`thread_local_node!`] macro.
//!
//! ## Features
//!
//! This crate does not provide any default features. Features that can be
//! enabled are:
//!
//! ### yield
//!
//! The `yield` feature requires linking to the standard library, so it is not
//! suitable for `no_std` environments. By enabling the `yield` feature, this
//! crate exposes relax policies that cooperatively give up a timeslice to the
//! OS scheduler during contention, by calling [`std::thread::yield_now`]. See
//! the [`relax`] module. The default policies call [`core::hint::spin_loop`],
//! which does in fact just simply busy-wait.
//!
//! ### thread_local
//!
//! The `thread_local` feature provides locking APIs that do not require
//! user-side node instantiation, by storing the queue nodes in the thread
//! local storage of the waiting threads. This feature requires linking to the
//! standard library. See the [`thread_local_node!`] macro.
//!
//! ## Related projects
//!
//! These projects provide queue lock implementations with different APIs,
//! implementation details or compiler requirements, you can check their
//! repositories:
//!
//! - `mcs-rs`: <https://github.com/gereeter/mcs-rs>
//! - `libmcs`: <https://github.com/topecongiro/libmcs>
//!
//! [spin-lock]: https://en.wikipedia.org/wiki/Spinlock
//! [Mellor-Crummey and Scott]: https://www.cs.rochester.edu/~scott/papers/1991_TOCS_synch.pdf
//! [spinlocks are usually not what you want]: https://matklad.github.io/2020/01/02/spinlocks-considered-harmful.html
//! [`std::sync::Mutex`]: https://doc.rust-lang.org/std/sync/struct.Mutex.html
//! [`parking_lot::Mutex`]: https://docs.rs/parking_lot/latest/parking_lot/type.Mutex.html
//! [`std::thread::yield_now`]: https://doc.rust-lang.org/std/thread/fn.yield_now.html
//! [`thread_local_node!`]: crate::thread_local_node

#![no_std]
#![allow(clippy::doc_markdown)]
#![allow(clippy::inline_always)]
#![allow(clippy::module_name_repetitions)]
#![warn(missing_docs)]
#![warn(rust_2024_compatibility)]
#![warn(clippy::undocumented_unsafe_blocks)]
#![cfg_attr(docsrs, feature(doc_cfg))]

#[cfg(any(feature = "yield", feature = "thread_local", loom, test))]
extern crate std;

#[cfg(feature = "thread_local")]
macro_rules! already_borrowed_error {
    () => {
        "already borrowed"
    };
}

pub mod raw;
pub mod relax;

pub(crate) mod cfg;
pub(crate) mod inner;
pub(crate) mod lock;

#[cfg(test)]
pub(crate) mod test;

#[cfg(all(loom, test))]
#[cfg(not(tarpaulin))]
pub(crate) mod loom;
