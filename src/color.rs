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

use image::Rgba;

/// A distinct color along with the accumulated weight of every pixel that had it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WeightedColor {
    color: Rgba<u8>,
    weight: u64,
}

impl WeightedColor {
    pub fn new(color: Rgba<u8>, weight: u64) -> WeightedColor {
        Self { color, weight }
    }

    pub fn color(self) -> Rgba<u8> {
        self.color
    }

    pub fn rgb(self) -> (u8, u8, u8) {
        (self.color.0[0], self.color.0[1], self.color.0[2])
    }

    pub fn weight(self) -> u64 {
        self.weight
    }

    /// An empty color table slot. It carries no color identity.
    pub fn is_empty(self) -> bool {
        self.weight == 0
    }

    pub(crate) fn accumulate(&mut self, color: Rgba<u8>, weight: u32) {
        self.color = color;
        self.weight = self.weight.saturating_add(u64::from(weight));
    }
}

impl Default for WeightedColor {
    fn default() -> Self {
        Self {
            color: Rgba([0, 0, 0, 0]),
            weight: 0,
        }
    }
}
