// Copyright 2022 Spanfile
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Reuse of the large color tables the aggregation step scans into.

use crate::color::WeightedColor;
use log::trace;
use parking_lot::Mutex;
use std::ops::{Deref, DerefMut};

pub const DEFAULT_MAX_RETAINED: usize = 4;

/// Free buffers larger than this multiple of the high-water-mark are dropped instead of reused.
const OVERSIZE_FACTOR: usize = 2;

/// A pool of color table buffers shared between quantization calls.
///
/// The pool keeps a high-water-mark of recently requested table sizes. New buffers are allocated at the mark instead of
/// the requested size, so a sequence of images that is mostly small with the occasional large one does not keep
/// reallocating. The mark follows growth immediately and shrinks by 1% per smaller request. Pooled buffers that have
/// grown far past the mark are freed, so the memory held by the pool shrinks along with it.
///
/// Both the mark and the free list are behind their own locks, so a pool can be shared between threads through an
/// [`std::sync::Arc`] without any coordination from the callers.
#[derive(Debug)]
pub struct BufferPool {
    high_water_mark: Mutex<usize>,
    free: Mutex<Vec<Vec<WeightedColor>>>,
    max_retained: usize,
}

impl BufferPool {
    pub fn new() -> Self {
        Self::with_max_retained(DEFAULT_MAX_RETAINED)
    }

    pub fn with_max_retained(max_retained: usize) -> Self {
        Self {
            high_water_mark: Mutex::new(0),
            free: Mutex::new(Vec::new()),
            max_retained,
        }
    }

    pub fn high_water_mark(&self) -> usize {
        *self.high_water_mark.lock()
    }

    /// The number of buffers currently waiting for reuse.
    pub fn retained(&self) -> usize {
        self.free.lock().len()
    }

    /// Get a cleared buffer of exactly `capacity` empty slots.
    pub fn acquire(&self, capacity: usize) -> Vec<WeightedColor> {
        let allocation_size = self.update_high_water_mark(capacity);

        let reused = {
            let mut free = self.free.lock();
            free.retain(|buffer| !is_oversized(buffer, allocation_size));
            free.iter()
                .position(|buffer| buffer.capacity() >= capacity)
                .map(|index| free.swap_remove(index))
        };

        match reused {
            Some(mut buffer) => {
                trace!("reusing pooled buffer of {} slots for {}", buffer.capacity(), capacity);

                buffer.clear();
                buffer.resize(capacity, WeightedColor::default());
                buffer
            }
            None => {
                trace!("allocating buffer of {} slots for {}", allocation_size, capacity);

                let mut buffer = Vec::with_capacity(allocation_size);
                buffer.resize(capacity, WeightedColor::default());
                buffer
            }
        }
    }

    /// Return a buffer for reuse. Its contents are discarded on the next acquisition.
    pub fn release(&self, buffer: Vec<WeightedColor>) {
        if self.max_retained == 0 || buffer.capacity() == 0 || is_oversized(&buffer, self.high_water_mark()) {
            trace!("dropping released buffer of {} slots", buffer.capacity());
            return;
        }

        let mut free = self.free.lock();
        if free.len() < self.max_retained {
            free.push(buffer);
            return;
        }

        // keep the largest buffers around, they can serve every request the smaller ones could
        if let Some((index, smallest)) = free
            .iter()
            .enumerate()
            .min_by_key(|(_, buffer)| buffer.capacity())
            .map(|(index, buffer)| (index, buffer.capacity()))
        {
            if smallest < buffer.capacity() {
                free[index] = buffer;
            }
        }
    }

    /// Acquire a buffer that goes back to the pool when dropped.
    pub fn lease(&self, capacity: usize) -> PooledBuffer<'_> {
        PooledBuffer {
            pool: self,
            buffer: self.acquire(capacity),
        }
    }

    fn update_high_water_mark(&self, requested: usize) -> usize {
        let mut mark = self.high_water_mark.lock();

        if *mark > requested {
            *mark = (*mark as u128 * 99 / 100) as usize;
        }

        if *mark < requested {
            *mark = requested;
        }

        *mark
    }
}

fn is_oversized(buffer: &Vec<WeightedColor>, high_water_mark: usize) -> bool {
    buffer.capacity() > high_water_mark.saturating_mul(OVERSIZE_FACTOR)
}

impl Default for BufferPool {
    fn default() -> Self {
        Self::new()
    }
}

/// A buffer on loan from a [`BufferPool`].
#[derive(Debug)]
pub struct PooledBuffer<'a> {
    pool: &'a BufferPool,
    buffer: Vec<WeightedColor>,
}

impl Deref for PooledBuffer<'_> {
    type Target = Vec<WeightedColor>;

    fn deref(&self) -> &Self::Target {
        &self.buffer
    }
}

impl DerefMut for PooledBuffer<'_> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.buffer
    }
}

impl Drop for PooledBuffer<'_> {
    fn drop(&mut self) {
        self.pool.release(std::mem::take(&mut self.buffer));
    }
}
