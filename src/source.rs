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

//! The pixel-access interface the quantizer reads colors through.

use image::{DynamicImage, GenericImageView, ImageBuffer, Pixel, Rgba};
use std::ops::Deref;

/// A rectangle of pixel coordinates. The minimum corner is inclusive and the maximum corner exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Bounds {
    pub min_x: i32,
    pub min_y: i32,
    pub max_x: i32,
    pub max_y: i32,
}

impl Bounds {
    pub fn new(min_x: i32, min_y: i32, max_x: i32, max_y: i32) -> Bounds {
        Self {
            min_x,
            min_y,
            max_x,
            max_y,
        }
    }

    pub fn from_dimensions(width: u32, height: u32) -> Bounds {
        Self::new(0, 0, saturating_i32(width), saturating_i32(height))
    }

    pub fn width(self) -> u32 {
        (i64::from(self.max_x) - i64::from(self.min_x)).max(0) as u32
    }

    pub fn height(self) -> u32 {
        (i64::from(self.max_y) - i64::from(self.min_y)).max(0) as u32
    }

    pub fn area(self) -> u64 {
        u64::from(self.width()) * u64::from(self.height())
    }

    pub fn is_empty(self) -> bool {
        self.area() == 0
    }

    pub fn contains(self, x: i32, y: i32) -> bool {
        (self.min_x..self.max_x).contains(&x) && (self.min_y..self.max_y).contains(&y)
    }

    pub fn intersect(self, other: Bounds) -> Bounds {
        Self {
            min_x: self.min_x.max(other.min_x),
            min_y: self.min_y.max(other.min_y),
            max_x: self.max_x.min(other.max_x),
            max_y: self.max_y.min(other.max_y),
        }
    }
}

/// Anything the quantizer can read pixels from.
///
/// Implementations must be side-effect free. The quantizer only asks for colors at coordinates inside
/// [`PixelSource::bounds`].
pub trait PixelSource {
    fn bounds(&self) -> Bounds;

    fn color_at(&self, x: i32, y: i32) -> Rgba<u8>;
}

impl<S> PixelSource for &S
where
    S: PixelSource + ?Sized,
{
    fn bounds(&self) -> Bounds {
        (**self).bounds()
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u8> {
        (**self).color_at(x, y)
    }
}

impl<P, C> PixelSource for ImageBuffer<P, C>
where
    P: Pixel<Subpixel = u8>,
    C: Deref<Target = [u8]>,
{
    fn bounds(&self) -> Bounds {
        Bounds::from_dimensions(self.width(), self.height())
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u8> {
        self.get_pixel(x as u32, y as u32).to_rgba()
    }
}

impl PixelSource for DynamicImage {
    fn bounds(&self) -> Bounds {
        let (width, height) = self.dimensions();
        Bounds::from_dimensions(width, height)
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u8> {
        self.get_pixel(x as u32, y as u32)
    }
}

/// A rectangular part of another source. The region is clipped to the bounds of the source it views.
#[derive(Debug, Clone, Copy)]
pub struct Region<S> {
    source: S,
    bounds: Bounds,
}

impl<S> Region<S>
where
    S: PixelSource,
{
    pub fn new(source: S, x: i32, y: i32, width: u32, height: u32) -> Self {
        let requested = Bounds::new(
            x,
            y,
            x.saturating_add(saturating_i32(width)),
            y.saturating_add(saturating_i32(height)),
        );
        let bounds = source.bounds().intersect(requested);

        Self { source, bounds }
    }

    pub fn into_inner(self) -> S {
        self.source
    }
}

impl<S> PixelSource for Region<S>
where
    S: PixelSource,
{
    fn bounds(&self) -> Bounds {
        self.bounds
    }

    fn color_at(&self, x: i32, y: i32) -> Rgba<u8> {
        self.source.color_at(x, y)
    }
}

fn saturating_i32(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};

    #[test]
    fn empty_and_inverted_bounds_have_no_area() {
        assert_eq!(Bounds::new(0, 0, 0, 10).area(), 0);
        assert_eq!(Bounds::new(5, 5, 2, 9).area(), 0);
        assert!(Bounds::new(3, 3, 1, 1).is_empty());
        assert_eq!(Bounds::new(-2, -2, 2, 3).area(), 20);
    }

    #[test]
    fn rgb_images_read_as_opaque() {
        let image = RgbImage::from_pixel(2, 3, Rgb([10, 20, 30]));

        assert_eq!(PixelSource::bounds(&image), Bounds::new(0, 0, 2, 3));
        assert_eq!(image.color_at(1, 2), Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn region_is_clipped_to_source() {
        let image = RgbImage::from_fn(4, 4, |x, y| Rgb([x as u8, y as u8, 0]));
        let region = Region::new(&image, 2, 1, 10, 2);

        assert_eq!(region.bounds(), Bounds::new(2, 1, 4, 3));
        assert_eq!(region.color_at(3, 2), Rgba([3, 2, 0, 255]));
        assert!(region.bounds().contains(2, 1));
        assert!(!region.bounds().contains(1, 1));
    }

    #[test]
    fn dynamic_images_are_sources() {
        let image = DynamicImage::ImageRgb8(RgbImage::from_pixel(3, 1, Rgb([1, 2, 3])));

        assert_eq!(PixelSource::bounds(&image).area(), 3);
        assert_eq!(image.color_at(2, 0), Rgba([1, 2, 3, 255]));
    }
}
