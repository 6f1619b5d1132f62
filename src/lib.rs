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

//! A library to build limited palettes from images using median cut.
//!
//! The colors of one or more images are aggregated into a deduplicated list of weighted colors, which is partitioned
//! into buckets by repeatedly cutting the widest color channel at its weighted median. Every bucket then becomes one
//! palette entry. The result suits indexed-color encoders such as GIF or paletted PNG.
//!
//! ```
//! use mediancut::{image::RgbImage, MedianCutQuantizer, Palette, Reduction};
//!
//! let image = RgbImage::from_fn(32, 32, |x, y| mediancut::image::Rgb([x as u8 * 8, y as u8 * 8, 128]));
//!
//! let palette = MedianCutQuantizer::new()
//!     .reduction(Reduction::Mean)
//!     .add_transparent(true)
//!     .quantize(Palette::with_capacity(16), &image)?;
//!
//! assert_eq!(palette.len(), 16);
//! assert!(palette.has_transparent());
//! # Ok::<(), mediancut::Error>(())
//! ```

pub mod aggregator;
pub mod bucket;
mod color;
mod error;
pub mod pool;
pub mod reduction;
mod source;
mod weighting;

pub use crate::{
    aggregator::DEFAULT_TABLE_FACTOR,
    color::WeightedColor,
    error::{Error, Result},
    pool::BufferPool,
    reduction::Reduction,
    source::{Bounds, PixelSource, Region},
    weighting::{weighting_fn, FnWeighting, UniformWeighting, Weighting},
};
pub use image;

use image::Rgba;
use log::debug;
use std::sync::Arc;

/// Palettes never preallocate more entries than this, whatever their capacity.
const PREALLOCATED_ENTRIES: usize = 256;

/// The fully transparent color appended when a transparent entry is requested.
pub const TRANSPARENT: Rgba<u8> = Rgba([0, 0, 0, 0]);

/// An ordered list of palette colors with a fixed capacity.
///
/// Quantization extends the palette after its existing colors and never past its capacity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette {
    colors: Vec<Rgba<u8>>,
    capacity: usize,
}

/// The plain settings of a [`MedianCutQuantizer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QuantizerOptions {
    /// How each bucket is reduced to a palette color.
    pub reduction: Reduction,
    /// Reserve one palette entry for a fully transparent color, unless the palette already has one.
    pub add_transparent: bool,
    /// The color table is this many times larger than the number of scanned pixels. At least 2.
    pub table_factor: usize,
}

/// Builds palettes from pixel sources using median cut.
///
/// The quantizer holds the [`BufferPool`] its color tables come from. Quantizers created with [`MedianCutQuantizer::new`]
/// get a pool of their own; use [`MedianCutQuantizer::pool`] to share one pool between several quantizers. A quantizer
/// can be used from several threads at once as long as its weighting can.
pub struct MedianCutQuantizer<W = UniformWeighting> {
    options: QuantizerOptions,
    weighting: W,
    pool: Arc<BufferPool>,
}

impl Palette {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            colors: Vec::with_capacity(capacity.min(PREALLOCATED_ENTRIES)),
            capacity,
        }
    }

    /// Start from existing colors. The capacity is raised to the number of colors if it is smaller.
    pub fn from_colors(colors: Vec<Rgba<u8>>, capacity: usize) -> Self {
        let capacity = capacity.max(colors.len());
        Self { colors, capacity }
    }

    pub fn colors(&self) -> &[Rgba<u8>] {
        &self.colors
    }

    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// How many more colors fit in the palette.
    pub fn remaining(&self) -> usize {
        self.capacity - self.colors.len()
    }

    /// Whether any color in the palette is fully transparent.
    pub fn has_transparent(&self) -> bool {
        self.colors.iter().any(|color| color.0[3] == 0)
    }

    pub fn into_colors(self) -> Vec<Rgba<u8>> {
        self.colors
    }

    pub(crate) fn push(&mut self, color: Rgba<u8>) {
        debug_assert!(self.remaining() > 0);

        if self.remaining() > 0 {
            self.colors.push(color);
        }
    }
}

impl From<Palette> for Vec<Rgba<u8>> {
    fn from(palette: Palette) -> Self {
        palette.into_colors()
    }
}

impl Default for QuantizerOptions {
    fn default() -> Self {
        Self {
            reduction: Reduction::default(),
            add_transparent: false,
            table_factor: DEFAULT_TABLE_FACTOR,
        }
    }
}

impl MedianCutQuantizer {
    pub fn new() -> Self {
        Self {
            options: QuantizerOptions::default(),
            weighting: UniformWeighting,
            pool: Arc::new(BufferPool::new()),
        }
    }
}

impl Default for MedianCutQuantizer {
    fn default() -> Self {
        Self::new()
    }
}

impl<W> MedianCutQuantizer<W>
where
    W: Weighting,
{
    pub fn reduction(self, reduction: Reduction) -> Self {
        Self {
            options: QuantizerOptions {
                reduction,
                ..self.options
            },
            ..self
        }
    }

    pub fn add_transparent(self, add_transparent: bool) -> Self {
        Self {
            options: QuantizerOptions {
                add_transparent,
                ..self.options
            },
            ..self
        }
    }

    pub fn table_factor(self, table_factor: usize) -> Self {
        Self {
            options: QuantizerOptions {
                table_factor,
                ..self.options
            },
            ..self
        }
    }

    pub fn options(self, options: QuantizerOptions) -> Self {
        Self { options, ..self }
    }

    pub fn pool(self, pool: Arc<BufferPool>) -> Self {
        Self { pool, ..self }
    }

    /// Replace the per-pixel weighting. See [`weighting_fn`] for using a closure.
    pub fn weighting<V>(self, weighting: V) -> MedianCutQuantizer<V>
    where
        V: Weighting,
    {
        MedianCutQuantizer {
            options: self.options,
            weighting,
            pool: self.pool,
        }
    }

    pub fn clear_weighting(self) -> MedianCutQuantizer {
        self.weighting(UniformWeighting)
    }

    pub fn get_options(&self) -> QuantizerOptions {
        self.options
    }

    pub fn buffer_pool(&self) -> &Arc<BufferPool> {
        &self.pool
    }

    /// Extend the palette with the colors of one source.
    pub fn quantize<S>(&self, palette: Palette, source: S) -> Result<Palette>
    where
        S: PixelSource,
    {
        self.quantize_multiple(palette, std::slice::from_ref(&source))
    }

    /// Extend the palette with the combined colors of several sources, such as the frames of an animation.
    pub fn quantize_multiple<S>(&self, mut palette: Palette, sources: &[S]) -> Result<Palette>
    where
        S: PixelSource,
    {
        let table_capacity = aggregator::table_capacity(sources, self.options.table_factor)?;
        let (bucket_count, add_transparent) = self.plan(&palette);

        if bucket_count > 0 && table_capacity > 0 {
            let mut table = self.pool.lease(table_capacity);
            aggregator::aggregate(&mut table, sources, &self.weighting)?;
            reduction::synthesize(
                &mut palette,
                &bucket::split_buckets(&mut table, bucket_count),
                self.options.reduction,
            );
        }

        if add_transparent {
            palette.push(TRANSPARENT);
        }

        debug!(
            "built palette of {} colors with capacity {} from {} sources",
            palette.len(),
            palette.capacity(),
            sources.len()
        );

        Ok(palette)
    }

    /// Extend the palette from an already aggregated color list. The list is reordered in place.
    pub fn quantize_colors(&self, mut palette: Palette, colors: &mut [WeightedColor]) -> Palette {
        let (bucket_count, add_transparent) = self.plan(&palette);

        reduction::synthesize(
            &mut palette,
            &bucket::split_buckets(colors, bucket_count),
            self.options.reduction,
        );

        if add_transparent {
            palette.push(TRANSPARENT);
        }

        palette
    }

    /// The number of buckets to split into and whether a transparent entry gets appended afterwards.
    fn plan(&self, palette: &Palette) -> (usize, bool) {
        let remaining = palette.remaining();
        let add_transparent = self.options.add_transparent && remaining > 0 && !palette.has_transparent();

        if add_transparent {
            (remaining - 1, true)
        } else {
            (remaining, false)
        }
    }
}

impl<W> std::fmt::Debug for MedianCutQuantizer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MedianCutQuantizer")
            .field("options", &self.options)
            .field("pool", &self.pool)
            .finish_non_exhaustive()
    }
}
