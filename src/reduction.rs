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

use crate::{bucket::Bucket, color::WeightedColor, Palette};
use image::Rgba;

/// How a bucket of colors is reduced to the single color that represents it in the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Reduction {
    /// Pick the color with the highest weight. Ties go to the color that comes first in the bucket.
    #[default]
    Mode,
    /// Average every channel, weighted by the color weights, rounding down.
    Mean,
}

impl Reduction {
    /// Reduce a list of colors to one. Returns `None` if there is nothing with weight to reduce.
    pub fn reduce(self, colors: &[WeightedColor]) -> Option<Rgba<u8>> {
        match self {
            Reduction::Mode => mode(colors),
            Reduction::Mean => mean(colors),
        }
    }
}

/// Append one color per bucket to the palette, in bucket order.
pub fn synthesize(palette: &mut Palette, buckets: &[Bucket<'_>], reduction: Reduction) {
    for bucket in buckets {
        if let Some(color) = reduction.reduce(bucket.colors()) {
            palette.push(color);
        }
    }
}

fn mode(colors: &[WeightedColor]) -> Option<Rgba<u8>> {
    colors
        .iter()
        .fold(None, |best: Option<&WeightedColor>, color| match best {
            Some(best) if best.weight() >= color.weight() => Some(best),
            _ => Some(color),
        })
        .map(|best| best.color())
}

fn mean(colors: &[WeightedColor]) -> Option<Rgba<u8>> {
    let mut total = 0u128;
    let mut sums = [0u128; 4];

    for color in colors {
        let weight = u128::from(color.weight());
        total += weight;

        for (sum, channel) in sums.iter_mut().zip(color.color().0) {
            *sum += u128::from(channel) * weight;
        }
    }

    if total == 0 {
        return None;
    }

    Some(Rgba(sums.map(|sum| (sum / total) as u8)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weighted(rgba: [u8; 4], weight: u64) -> WeightedColor {
        WeightedColor::new(Rgba(rgba), weight)
    }

    #[test]
    fn mode_picks_heaviest() {
        let colors = [
            weighted([1, 1, 1, 255], 3),
            weighted([2, 2, 2, 255], 9),
            weighted([3, 3, 3, 255], 4),
        ];

        assert_eq!(Reduction::Mode.reduce(&colors), Some(Rgba([2, 2, 2, 255])));
    }

    #[test]
    fn mode_ties_go_to_first() {
        let colors = [
            weighted([7, 0, 0, 255], 5),
            weighted([0, 7, 0, 255], 5),
            weighted([0, 0, 7, 255], 2),
        ];

        assert_eq!(Reduction::Mode.reduce(&colors), Some(Rgba([7, 0, 0, 255])));
    }

    #[test]
    fn mean_is_weighted_and_truncated() {
        let colors = [weighted([0, 10, 255, 255], 1), weighted([100, 11, 0, 255], 2)];

        // red 200 / 3, green 32 / 3, blue 255 / 3
        assert_eq!(Reduction::Mean.reduce(&colors), Some(Rgba([66, 10, 85, 255])));
    }

    #[test]
    fn mean_handles_large_weights() {
        let colors = [weighted([255, 255, 255, 255], u64::MAX), weighted([0, 0, 0, 255], u64::MAX)];

        assert_eq!(Reduction::Mean.reduce(&colors), Some(Rgba([127, 127, 127, 255])));
    }

    #[test]
    fn nothing_to_reduce() {
        assert_eq!(Reduction::Mode.reduce(&[]), None);
        assert_eq!(Reduction::Mean.reduce(&[]), None);
    }
}
