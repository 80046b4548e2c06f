use std::sync::atomic::{AtomicU32, Ordering};

/// A thread-safe monotonically increasing id generator, used for session
/// ids, subscription ids, monitored item ids and handles, and secure
/// channel ids. Wraps from `u32::MAX` back to 1 rather than 0, since 0
/// is reserved as "no id" throughout the protocol.
#[derive(Debug, Default)]
pub struct AtomicHandle(AtomicU32);

impl AtomicHandle {
    pub fn new(start: u32) -> Self {
        Self(AtomicU32::new(start))
    }

    pub fn next(&self) -> u32 {
        loop {
            let current = self.0.load(Ordering::Relaxed);
            let next = if current == u32::MAX { 1 } else { current + 1 };
            if self
                .0
                .compare_exchange(current, next, Ordering::Relaxed, Ordering::Relaxed)
                .is_ok()
            {
                return next;
            }
        }
    }

    pub fn current(&self) -> u32 {
        self.0.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_and_wraps_past_u32_max() {
        let h = AtomicHandle::new(u32::MAX - 1);
        assert_eq!(h.next(), u32::MAX);
        assert_eq!(h.next(), 1);
        assert_eq!(h.next(), 2);
    }
}
