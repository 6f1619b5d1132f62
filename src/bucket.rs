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

//! Median cut partitioning of a weighted color list.

use crate::color::WeightedColor;
use log::debug;
use std::collections::VecDeque;

/// A color channel buckets are split along.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    fn of(self, color: &WeightedColor) -> u8 {
        let (r, g, b) = color.rgb();

        match self {
            Channel::Red => r,
            Channel::Green => g,
            Channel::Blue => b,
        }
    }
}

/// A contiguous run of colors along with the bounding ranges of its channels and its total weight.
///
/// Buckets borrow their colors exclusively. Splitting a bucket reorders its colors in place and hands each half to one
/// of the two new buckets, so sibling buckets never share a color.
#[derive(Debug)]
pub struct Bucket<'a> {
    colors: &'a mut [WeightedColor],
    weight: u64,
    red_range: (u8, u8),
    green_range: (u8, u8),
    blue_range: (u8, u8),
}

/// Partition `colors` into at most `count` buckets using median cut.
///
/// Buckets are refined oldest first: the bucket that has been waiting longest is split next and both halves go to the
/// back of the queue. Splitting stops once there are `count` buckets or every bucket holds a single color. The buckets
/// are returned in queue order and together cover every color exactly once.
pub fn split_buckets(colors: &mut [WeightedColor], count: usize) -> Vec<Bucket<'_>> {
    if colors.is_empty() || count == 0 {
        return Vec::new();
    }

    let distinct = colors.len();
    let mut queue = VecDeque::with_capacity(count.min(distinct));
    queue.push_back(Bucket::new(colors));

    while queue.len() < count && queue.len() < distinct {
        if let Some(bucket) = queue.pop_front() {
            match bucket.len() {
                // a single color cannot be split any further, but it still takes up a palette entry
                0 | 1 => queue.push_back(bucket),
                2 => {
                    let (lower, upper) = bucket.split_pair();

                    queue.push_back(lower);
                    queue.push_back(upper);
                }
                _ => {
                    let (lower, upper) = bucket.split_at_median();

                    queue.push_back(lower);
                    queue.push_back(upper);
                }
            }
        }
    }

    debug!("split {} colors into {} buckets ({} requested)", distinct, queue.len(), count);

    queue.into()
}

impl<'a> Bucket<'a> {
    /// Create a bucket whose ranges fit tightly around the given colors.
    pub(crate) fn new(colors: &'a mut [WeightedColor]) -> Self {
        let mut weight = 0u64;
        // min, max
        let (mut min_red, mut max_red) = (u8::MAX, 0);
        let (mut min_green, mut max_green) = (u8::MAX, 0);
        let (mut min_blue, mut max_blue) = (u8::MAX, 0);

        for color in colors.iter() {
            let (r, g, b) = color.rgb();
            weight = weight.saturating_add(color.weight());

            min_red = min_red.min(r);
            max_red = max_red.max(r);
            min_green = min_green.min(g);
            max_green = max_green.max(g);
            min_blue = min_blue.min(b);
            max_blue = max_blue.max(b);
        }

        Self {
            colors,
            weight,
            red_range: (min_red, max_red),
            green_range: (min_green, max_green),
            blue_range: (min_blue, max_blue),
        }
    }

    pub fn colors(&self) -> &[WeightedColor] {
        self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn weight(&self) -> u64 {
        self.weight
    }

    /// The (min, max) range of the given channel. Every color in the bucket lies within it.
    pub fn range(&self, channel: Channel) -> (u8, u8) {
        match channel {
            Channel::Red => self.red_range,
            Channel::Green => self.green_range,
            Channel::Blue => self.blue_range,
        }
    }

    /// The channel with the widest range. Ties go to red, then green.
    pub fn longest_channel(&self) -> Channel {
        let red_length = self.red_range.1.saturating_sub(self.red_range.0);
        let green_length = self.green_range.1.saturating_sub(self.green_range.0);
        let blue_length = self.blue_range.1.saturating_sub(self.blue_range.0);

        if red_length >= green_length && red_length >= blue_length {
            Channel::Red
        } else if green_length >= blue_length {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    fn split_pair(self) -> (Bucket<'a>, Bucket<'a>) {
        let (lower, upper) = self.colors.split_at_mut(1);
        (Bucket::new(lower), Bucket::new(upper))
    }

    fn split_at_median(self) -> (Bucket<'a>, Bucket<'a>) {
        debug_assert!(self.len() > 1);

        let channel = self.longest_channel();
        self.colors.sort_by_key(|color| channel.of(color));

        let split_point = self.find_split_point();
        let lower_weight = self.colors[..split_point]
            .iter()
            .fold(0u64, |weight, color| weight.saturating_add(color.weight()));
        let lower_max = channel.of(&self.colors[split_point - 1]);
        let upper_min = channel.of(&self.colors[split_point]);

        let Bucket {
            colors,
            weight,
            red_range,
            green_range,
            blue_range,
        } = self;
        let (lower, upper) = colors.split_at_mut(split_point);

        let lower = Bucket {
            colors: lower,
            weight: lower_weight,
            red_range,
            green_range,
            blue_range,
        }
        .with_bound(channel, None, Some(lower_max));

        let upper = Bucket {
            colors: upper,
            weight: weight.saturating_sub(lower_weight),
            red_range,
            green_range,
            blue_range,
        }
        .with_bound(channel, Some(upper_min), None);

        (lower, upper)
    }

    fn find_split_point(&self) -> usize {
        let last = self.colors.len() - 1;
        let mut accumulated = 0u64;

        // the first color whose cumulative weight reaches half of the total closes the lower half. both halves always
        // keep at least one color, even when every color shares the same value on the split channel
        for (i, color) in self.colors.iter().enumerate() {
            accumulated = accumulated.saturating_add(color.weight());

            if accumulated.saturating_mul(2) >= self.weight {
                return (i + 1).clamp(1, last);
            }
        }

        last
    }

    fn with_bound(mut self, channel: Channel, min: Option<u8>, max: Option<u8>) -> Self {
        let range = match channel {
            Channel::Red => &mut self.red_range,
            Channel::Green => &mut self.green_range,
            Channel::Blue => &mut self.blue_range,
        };

        if let Some(min) = min {
            range.0 = min;
        }

        if let Some(max) = max {
            range.1 = max;
        }

        self
    }
}
