//! Thin wrapper around `parking_lot::RwLock` that logs at trace level
//! around lock acquisition, so lock contention shows up in logs without
//! instrumenting every call site by hand.

pub use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[macro_export]
macro_rules! trace_read_lock {
    ($lock:expr) => {{
        log::trace!("read lock requested at {}:{}", file!(), line!());
        let guard = $lock.read();
        log::trace!("read lock acquired at {}:{}", file!(), line!());
        guard
    }};
}

#[macro_export]
macro_rules! trace_write_lock {
    ($lock:expr) => {{
        log::trace!("write lock requested at {}:{}", file!(), line!());
        let guard = $lock.write();
        log::trace!("write lock acquired at {}:{}", file!(), line!());
        guard
    }};
}
