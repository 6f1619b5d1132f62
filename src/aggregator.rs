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

//! Scanning pixel sources into a deduplicated list of weighted colors.
//!
//! Colors are collected into an open-addressed table at least twice as large as the number of scanned pixels. Probing
//! starts with triangular offsets (index, +1, +3, +6, ...) and falls back to a linear sweep of the whole table, so a free
//! slot is always found while the table holds fewer distinct colors than slots.

use crate::{
    color::WeightedColor,
    error::{Error, Result},
    source::PixelSource,
    weighting::Weighting,
};
use image::Rgba;
use log::debug;

pub const DEFAULT_TABLE_FACTOR: usize = 2;

const HASH_MULTIPLIER: u64 = 0x9E37_79B9_7F4A_7C15;

/// Compute the color table size needed to aggregate the given sources.
///
/// The size is exactly the combined area of every source multiplied by `factor`. A factor below
/// 2 could leave the table without a free slot and is rejected. Sources without any pixels need no table at all.
pub fn table_capacity<S>(sources: &[S], factor: usize) -> Result<usize>
where
    S: PixelSource,
{
    if factor < DEFAULT_TABLE_FACTOR {
        return Err(Error::InvalidTableFactor(factor));
    }

    let area = sources
        .iter()
        .map(|source| source.bounds().area())
        .fold(0u64, u64::saturating_add);

    if area == 0 {
        return Ok(0);
    }

    area.checked_mul(factor as u64)
        .and_then(|size| usize::try_from(size).ok())
        .ok_or(Error::TableSizeOverflow { area, factor })
}

/// Scan every source into `buffer` and compact it into the list of distinct colors.
///
/// `buffer` must be a cleared table of [`table_capacity`] slots. Each source is scanned within its own bounds, row by
/// row. Afterwards `buffer` holds one entry per distinct color with non-zero accumulated weight, in table order.
pub fn aggregate<S, W>(buffer: &mut Vec<WeightedColor>, sources: &[S], weighting: &W) -> Result<()>
where
    S: PixelSource,
    W: Weighting + ?Sized,
{
    let capacity = buffer.len();
    let mut table = ColorTable::new(buffer);

    for source in sources {
        let bounds = source.bounds();
        let dynamic: &dyn PixelSource = source;

        for y in bounds.min_y..bounds.max_y {
            for x in bounds.min_x..bounds.max_x {
                let weight = weighting.weight(dynamic, x, y);

                if weight != 0 {
                    table.insert(source.color_at(x, y), weight)?;
                }
            }
        }
    }

    let distinct = table.len();
    buffer.retain(|slot| !slot.is_empty());

    debug!(
        "aggregated {} distinct colors from {} sources in a table of {} slots",
        distinct,
        sources.len(),
        capacity
    );

    Ok(())
}

/// A fixed-size open-addressed map from color to accumulated weight, stored in a slice of [`WeightedColor`] where
/// empty slots have zero weight.
pub(crate) struct ColorTable<'a> {
    slots: &'a mut [WeightedColor],
    len: usize,
}

impl<'a> ColorTable<'a> {
    pub(crate) fn new(slots: &'a mut [WeightedColor]) -> Self {
        Self { slots, len: 0 }
    }

    pub(crate) fn len(&self) -> usize {
        self.len
    }

    pub(crate) fn insert(&mut self, color: Rgba<u8>, weight: u32) -> Result<()> {
        let capacity = self.slots.len();
        if capacity == 0 {
            return Err(Error::TableFull { capacity });
        }

        let start = slot_index(color, capacity);
        let mut index = start;

        for probe in 0..capacity {
            if self.claim(index, color, weight) {
                return Ok(());
            }

            index = (index + probe + 1) % capacity;
        }

        // triangular offsets skip slots unless the size is a power of two, the sweep covers the rest
        for offset in 0..capacity {
            if self.claim((start + offset) % capacity, color, weight) {
                return Ok(());
            }
        }

        Err(Error::TableFull { capacity })
    }

    /// Add the weight to the slot if it is free or already holds the color.
    fn claim(&mut self, index: usize, color: Rgba<u8>, weight: u32) -> bool {
        let slot = &mut self.slots[index];

        if slot.is_empty() {
            self.len += 1;
        } else if slot.color() != color {
            return false;
        }

        slot.accumulate(color, weight);
        true
    }
}

fn slot_index(color: Rgba<u8>, capacity: usize) -> usize {
    let hash = u64::from(u32::from_be_bytes(color.0)).wrapping_mul(HASH_MULTIPLIER);
    ((hash ^ (hash >> 32)) % capacity as u64) as usize
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{source::Bounds, weighting::weighting_fn, UniformWeighting};
    use image::{Rgb, RgbImage, RgbaImage};
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn aggregate_all<S: PixelSource, W: Weighting>(sources: &[S], weighting: &W) -> Vec<WeightedColor> {
        let capacity = table_capacity(sources, DEFAULT_TABLE_FACTOR).unwrap();
        let mut buffer = vec![WeightedColor::default(); capacity];
        aggregate(&mut buffer, sources, weighting).unwrap();
        buffer
    }

    #[test]
    fn capacity_exceeds_pixel_count() {
        let small = RgbImage::new(3, 5);
        let large = RgbImage::new(10, 7);

        assert_eq!(table_capacity(&[&small], 2), Ok(30));
        assert_eq!(table_capacity(&[&small, &large], 2), Ok(170));
        assert_eq!(table_capacity(&[&small], 3), Ok(45));
        assert_eq!(table_capacity::<&RgbImage>(&[], 2), Ok(0));
    }

    #[test]
    fn capacity_is_an_exact_multiple_of_the_area() {
        let image = RgbImage::new(1025, 1024);

        assert_eq!(table_capacity(&[&image], 2), Ok(2 * 1025 * 1024));
        assert_eq!(table_capacity(&[&image], 5), Ok(5 * 1025 * 1024));
    }

    #[test]
    fn capacity_rejects_small_factors() {
        let image = RgbImage::new(2, 2);

        assert_eq!(table_capacity(&[&image], 1), Err(Error::InvalidTableFactor(1)));
        assert_eq!(table_capacity(&[&image], 0), Err(Error::InvalidTableFactor(0)));
    }

    #[test]
    fn capacity_reports_overflow() {
        struct Huge;
        impl PixelSource for Huge {
            fn bounds(&self) -> Bounds {
                Bounds::new(i32::MIN, i32::MIN, i32::MAX, i32::MAX)
            }

            fn color_at(&self, _: i32, _: i32) -> Rgba<u8> {
                Rgba([0, 0, 0, 255])
            }
        }

        assert!(matches!(
            table_capacity(&[Huge], usize::MAX),
            Err(Error::TableSizeOverflow { .. })
        ));
    }

    #[test]
    fn uniform_image_is_one_color() {
        let image = RgbImage::from_pixel(7, 9, Rgb([12, 34, 56]));
        let colors = aggregate_all(&[&image], &UniformWeighting);

        assert_eq!(colors, vec![WeightedColor::new(Rgba([12, 34, 56, 255]), 63)]);
    }

    #[test]
    fn zero_weights_are_skipped() {
        let image = RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8, y as u8, 0]));
        let nothing = weighting_fn(|_, _, _| 0);

        assert!(aggregate_all(&[&image], &nothing).is_empty());
    }

    #[test]
    fn weights_accumulate_per_color() {
        let image = RgbImage::from_fn(4, 1, |x, _| if x < 3 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 255]) });
        let by_column = weighting_fn(|_, x, _| x as u32 + 1);

        let mut colors = aggregate_all(&[&image], &by_column);
        colors.sort_by_key(|color| color.weight());

        assert_eq!(
            colors,
            vec![
                WeightedColor::new(Rgba([0, 0, 255, 255]), 4),
                WeightedColor::new(Rgba([255, 0, 0, 255]), 6),
            ]
        );
    }

    #[test]
    fn alpha_distinguishes_colors() {
        let image = RgbaImage::from_fn(2, 1, |x, _| image::Rgba([5, 5, 5, x as u8 * 255]));

        assert_eq!(aggregate_all(&[&image], &UniformWeighting).len(), 2);
    }

    #[test]
    fn sources_are_scanned_within_their_own_bounds() {
        let wide = RgbImage::from_pixel(6, 1, Rgb([1, 1, 1]));
        let tall = RgbImage::from_pixel(1, 5, Rgb([2, 2, 2]));
        let scanned = std::cell::RefCell::new(Vec::new());
        let recording = weighting_fn(|source, x, y| {
            assert!(source.bounds().contains(x, y));
            scanned.borrow_mut().push((x, y));
            1
        });

        let mut colors = aggregate_all(&[&wide, &tall], &recording);
        colors.sort_by_key(|color| color.weight());

        assert_eq!(scanned.borrow().len(), 11);
        assert_eq!(colors[0], WeightedColor::new(Rgba([2, 2, 2, 255]), 5));
        assert_eq!(colors[1], WeightedColor::new(Rgba([1, 1, 1, 255]), 6));
    }

    #[test]
    fn every_pixel_distinct_fits() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut seen = std::collections::HashSet::new();
        let image = RgbImage::from_fn(40, 40, |_, _| loop {
            let color = Rgb([rng.gen(), rng.gen(), rng.gen()]);
            if seen.insert(color) {
                break color;
            }
        });

        let colors = aggregate_all(&[&image], &UniformWeighting);

        assert_eq!(colors.len(), 1600);
        assert!(colors.iter().all(|color| color.weight() == 1));
    }

    #[test]
    fn full_table_is_reported() {
        let mut slots = vec![WeightedColor::default(); 2];
        let mut table = ColorTable::new(&mut slots);

        table.insert(Rgba([1, 0, 0, 255]), 1).unwrap();
        table.insert(Rgba([2, 0, 0, 255]), 1).unwrap();

        assert_eq!(table.insert(Rgba([3, 0, 0, 255]), 1), Err(Error::TableFull { capacity: 2 }));
        assert_eq!(table.insert(Rgba([2, 0, 0, 255]), 1), Ok(()));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn odd_sized_tables_fill_every_slot() {
        for capacity in [3, 5, 7, 30, 45] {
            let mut slots = vec![WeightedColor::default(); capacity];
            let mut table = ColorTable::new(&mut slots);

            for i in 0..capacity {
                assert_eq!(table.insert(Rgba([i as u8, 3, 7, 255]), 1), Ok(()));
            }

            assert_eq!(table.len(), capacity);
            assert_eq!(table.insert(Rgba([255, 255, 255, 0]), 1), Err(Error::TableFull { capacity }));
        }

        let mut empty: Vec<WeightedColor> = Vec::new();
        assert_eq!(
            ColorTable::new(&mut empty).insert(Rgba([1, 1, 1, 255]), 1),
            Err(Error::TableFull { capacity: 0 })
        );
    }
}
