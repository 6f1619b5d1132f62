use mediancut::{
    image::{Rgb, RgbImage},
    MedianCutQuantizer, Palette, Reduction,
};

fn main() {
    let image = RgbImage::from_fn(64, 64, |x, y| Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8]));

    let palette = MedianCutQuantizer::new()
        .reduction(Reduction::Mean)
        .add_transparent(true)
        .quantize(Palette::with_capacity(16), &image)
        .unwrap();

    println!("{:#?}", palette);
}
