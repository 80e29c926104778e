pub mod atomic {
    pub use sealed::AtomicPtrNull;

    #[cfg(not(all(loom, test)))]
    pub use core::sync::atomic::{fence, AtomicBool, AtomicPtr};

    #[cfg(all(loom, test))]
    pub use loom::sync::atomic::{fence, AtomicBool, AtomicPtr};

    impl<T> AtomicPtrNull for AtomicPtr<T> {
        type Target = T;

        #[rustfmt::skip]
        #[cfg(not(all(loom, test)))]
        const NULL_MUT: AtomicPtr<Self::Target> = {
            Self::new(core::ptr::null_mut())
        };

        #[cfg(all(loom, test))]
        fn null_mut() -> AtomicPtr<Self::Target> {
            Self::new(core::ptr::null_mut())
        }
    }

    mod sealed {
        use super::AtomicPtr;

        /// A trait that extends [`AtomicPtr`] to allow creating `null` values.
        pub trait AtomicPtrNull {
            /// The type of the data pointed to.
            type Target;

            /// A compiler time evaluable [`AtomicPtr`] pointing to `null`.
            #[cfg(not(all(loom, test)))]
            #[allow(clippy::declare_interior_mutable_const)]
            const NULL_MUT: AtomicPtr<Self::Target>;

            /// Returns a [`AtomicPtr`] instance pointing to `null` (non-const).
            #[cfg(all(loom, test))]
            fn null_mut() -> AtomicPtr<Self::Target>;
        }
    }
}

pub mod cell {
    pub use sealed::{UnsafeCellOptionWith, UnsafeCellWith};

    #[cfg(not(all(loom, test)))]
    pub use core::cell::UnsafeCell;

    #[cfg(all(loom, test))]
    pub use loom::cell::UnsafeCell;

    impl<T: ?Sized> UnsafeCellWith for UnsafeCell<T> {
        type Target = T;

        #[cfg(not(all(loom, test)))]
        unsafe fn with_unchecked<F, Ret>(&self, f: F) -> Ret
        where
            F: FnOnce(&Self::Target) -> Ret,
        {
            // SAFETY: Caller guaranteed that there are no mutable aliases.
            f(unsafe { &*self.get() })
        }

        #[cfg(all(loom, test))]
        #[cfg(not(tarpaulin_include))]
        unsafe fn with_unchecked<F, Ret>(&self, f: F) -> Ret
        where
            F: FnOnce(&Self::Target) -> Ret,
        {
            // SAFETY: Caller guaranteed that there are no mutable aliases.
            self.with(|ptr| f(unsafe { &*ptr }))
        }

        #[cfg(not(all(loom, test)))]
        unsafe fn with_mut_unchecked<F, Ret>(&self, f: F) -> Ret
        where
            F: FnOnce(&mut Self::Target) -> Ret,
        {
            // SAFETY: Caller guaranteed that there are no other aliases.
            f(unsafe { &mut *self.get() })
        }

        #[cfg(all(loom, test))]
        #[cfg(not(tarpaulin_include))]
        unsafe fn with_mut_unchecked<F, Ret>(&self, f: F) -> Ret
        where
            F: FnOnce(&mut Self::Target) -> Ret,
        {
            // SAFETY: Caller guaranteed that there are no other aliases.
            self.with_mut(|ptr| f(unsafe { &mut *ptr }))
        }
    }

    impl<T: ?Sized> UnsafeCellOptionWith for Option<&UnsafeCell<T>> {
        type Target = T;

        #[cfg(not(all(loom, test)))]
        unsafe fn as_deref_with_mut_unchecked<F, Ret>(&self, f: F) -> Ret
        where
            F: FnOnce(Option<&mut T>) -> Ret,
        {
            let ptr = self.map(UnsafeCell::get);
            // SAFETY: Caller guaranteed that there are no mutable aliases.
            f(ptr.map(|ptr| unsafe { &mut *ptr }))
        }

        #[cfg(all(loom, test))]
        #[cfg(not(tarpaulin_include))]
        unsafe fn as_deref_with_mut_unchecked<F, Ret>(&self, f: F) -> Ret
        where
            F: FnOnce(Option<&mut T>) -> Ret,
        {
            let ptr = self.map(UnsafeCell::get_mut);
            // SAFETY: Caller guaranteed that there are no mutable aliases.
            f(ptr.as_ref().map(|ptr| unsafe { ptr.deref() }))
        }
    }

    mod sealed {
        /// A trait that extends [`UnsafeCell`] to allow running closures against
        /// its underlying data.
        ///
        /// [`UnsafeCell`]: super::UnsafeCell
        pub trait UnsafeCellWith {
            /// The type of the underlying data.
            type Target: ?Sized;

            /// Runs `f` against a shared reference borrowed from a [`UnsafeCell`].
            ///
            /// # Safety
            ///
            /// Caller must guarantee there are no mutable aliases to the
            /// underlying data.
            ///
            /// [`UnsafeCell`]: super::UnsafeCell
            unsafe fn with_unchecked<F, Ret>(&self, f: F) -> Ret
            where
                F: FnOnce(&Self::Target) -> Ret;

            /// Runs `f` against a exclusive reference borrowed from a [`UnsafeCell`].
            ///
            /// # Safety
            ///
            /// Caller must guarantee there are no other aliases to the
            /// underlying data.
            ///
            /// [`UnsafeCell`]: super::UnsafeCell
            unsafe fn with_mut_unchecked<F, Ret>(&self, f: F) -> Ret
            where
                F: FnOnce(&mut Self::Target) -> Ret;
        }

        /// A trait that extends `Option<&UnsafeCell>` to allow running closures
        /// against its underlying data.
        pub trait UnsafeCellOptionWith {
            /// The type of the underlying data.
            type Target: ?Sized;

            /// Converts `&Self` to `Option<&mut Self::Target>` and then runs
            /// `f` against it.
            ///
            /// # Safety
            ///
            /// Caller must guarantee there are no mutable aliases to the
            /// underlying data.
            unsafe fn as_deref_with_mut_unchecked<F, Ret>(&self, f: F) -> Ret
            where
                F: FnOnce(Option<&mut Self::Target>) -> Ret;
        }
    }
}

pub mod hint {
    #[cfg(not(all(loom, test)))]
    pub use core::hint::spin_loop;

    #[cfg(all(loom, test))]
    pub use loom::hint::spin_loop;
}

#[cfg(test)]
pub mod sync {
    #[cfg(not(loom))]
    pub use std::sync::Arc;

    #[cfg(loom)]
    pub use loom::sync::Arc;
}

pub mod thread {
    #[cfg(all(any(feature = "yield", test), not(loom)))]
    pub use std::thread::yield_now;

    #[cfg(all(loom, test))]
    pub use loom::thread::yield_now;

    #[cfg(all(feature = "thread_local", not(all(loom, test))))]
    pub use std::thread::LocalKey;

    #[cfg(all(feature = "thread_local", loom, test))]
    pub use loom::thread::LocalKey;
}
