//! Session buffer accounting

use crate::revision::BufferMode;
use crate::{Error, Result};

/// Session buffer size in bytes for each size indicator of the startup
/// information
const BUFFER_SIZES: [usize; 56] = [
    0, 0, 0, 0, 0, 0, 215, 256, 304, 362, 430, 512, 608, 724, 861, 1024, 1217, 1448, 1722, 2048,
    2435, 2896, 3444, 4096, 4870, 5792, 6888, 8192, 9741, 11585, 13777, 16384, 19483, 23170,
    27554, 32768, 38967, 46340, 55108, 65536, 77935, 92681, 110217, 131072, 155871, 185363,
    220435, 262144, 311743, 370727, 440871, 524288, 623487, 741455, 881743, 1048576,
];

/// Operations allowed in a session by cards without startup information
pub const DEFAULT_OPERATIONS: usize = 3;

/// Capacity announced by a size indicator
///
/// Indicators past the end of the table get the largest size.
pub fn capacity_for(indicator: Option<u8>, mode: BufferMode) -> usize {
    match (indicator, mode) {
        (None, _) => DEFAULT_OPERATIONS,
        (Some(indicator), BufferMode::Operations) => usize::from(indicator),
        (Some(indicator), BufferMode::Bytes) => BUFFER_SIZES
            .get(usize::from(indicator))
            .or(BUFFER_SIZES.last())
            .copied()
            .unwrap_or_default(),
    }
}

/// Running usage of the card's session buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBuffer {
    mode: BufferMode,
    capacity: usize,
    costs: Vec<usize>,
    used: usize,
}

impl SessionBuffer {
    /// Create an empty buffer
    pub const fn new(mode: BufferMode, capacity: usize) -> Self {
        Self {
            mode,
            capacity,
            costs: Vec::new(),
            used: 0,
        }
    }

    /// Accounting mode
    pub const fn mode(&self) -> BufferMode {
        self.mode
    }

    /// Total capacity
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Space used so far
    pub const fn used(&self) -> usize {
        self.used
    }

    /// Space left
    pub const fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.used)
    }

    /// Cost of every accepted command, in order
    pub fn costs(&self) -> &[usize] {
        &self.costs
    }

    /// Account for a command, or refuse it when it does not fit
    pub fn reserve(&mut self, cost: usize) -> Result<()> {
        if cost > self.remaining() {
            return Err(Error::SessionBufferOverflow {
                required: cost,
                remaining: self.remaining(),
                capacity: self.capacity,
            });
        }
        self.used += cost;
        self.costs.push(cost);
        Ok(())
    }
}
