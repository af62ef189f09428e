//! Round-robin cursor over the CDN origin list.

use std::sync::{Mutex, PoisonError};

/// Rotation cursor shared by every resolution on one decorator.
///
/// Starts before the first origin; the first [`advance`](Self::advance)
/// yields index 0. The read-increment-wrap sequence runs under one lock so
/// concurrent callers never receive the same slot or skip one.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: Mutex<Option<usize>>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }

    /// Move to the next slot in `0..len` and return it.
    pub fn advance(&self, len: usize) -> usize {
        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        let next = match *cursor {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        *cursor = Some(next);
        next
    }

    /// Last slot handed out, `None` before the first call.
    pub fn position(&self) -> Option<usize> {
        *self.cursor.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
