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

use crate::source::PixelSource;

/// A trait used to give pixels a priority during color aggregation.
///
/// Every pixel contributes its weight to the accumulated weight of its color. Colors with more weight pull the median
/// cut towards themselves and win the bucket under [`crate::Reduction::Mode`]. A weight of 0 drops the pixel from the
/// quantization process altogether.
///
/// See [`crate::MedianCutQuantizer::weighting`] on how to replace the default weighting.
pub trait Weighting {
    /// Return the weight of the pixel at the given coordinate of the given source.
    fn weight(&self, source: &dyn PixelSource, x: i32, y: i32) -> u32;
}

/// The weighting used by every [`crate::MedianCutQuantizer`] by default. Each pixel counts once.
#[derive(Debug, Clone, Copy, Default)]
pub struct UniformWeighting;
impl Weighting for UniformWeighting {
    fn weight(&self, _: &dyn PixelSource, _: i32, _: i32) -> u32 {
        1
    }
}

/// A weighting backed by a closure. Created with [`weighting_fn`].
#[derive(Clone, Copy)]
pub struct FnWeighting<F>(F);

impl<F> Weighting for FnWeighting<F>
where
    F: Fn(&dyn PixelSource, i32, i32) -> u32,
{
    fn weight(&self, source: &dyn PixelSource, x: i32, y: i32) -> u32 {
        (self.0)(source, x, y)
    }
}

impl<F> std::fmt::Debug for FnWeighting<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("FnWeighting")
    }
}

/// Use a closure as the weighting function.
///
/// ```
/// use mediancut::{weighting_fn, MedianCutQuantizer};
///
/// // only the one pixel wide border of the image counts
/// let border = weighting_fn(|source, x, y| {
///     let bounds = source.bounds();
///     let edge = x == bounds.min_x || y == bounds.min_y || x == bounds.max_x - 1 || y == bounds.max_y - 1;
///     u32::from(edge)
/// });
///
/// let quantizer = MedianCutQuantizer::new().weighting(border);
/// ```
pub fn weighting_fn<F>(f: F) -> FnWeighting<F>
where
    F: Fn(&dyn PixelSource, i32, i32) -> u32,
{
    FnWeighting(f)
}
