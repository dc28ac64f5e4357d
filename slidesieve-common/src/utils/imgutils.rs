use image::{GenericImageView, GrayImage, ImageBuffer, Luma, Pixel, RgbImage};

pub use image::imageops::colorops::grayscale;

pub const WHITE: u8 = u8::MAX;
pub const BLACK: u8 = u8::MIN;

pub fn is_img_empty<T>(img: &T) -> bool
where
    T: GenericImageView,
{
    img.width() == 0 || img.height() == 0
}

/// The darkest and brightest luma in the image, or None if there are no pixels.
pub fn luma_bounds<I>(img: &I) -> Option<(u8, u8)>
where
    I: GenericImageView<Pixel = Luma<u8>>,
{
    img.pixels().fold(None, |acc, (_, _, Luma([v]))| match acc {
        None => Some((v, v)),
        Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
    })
}

/// Linearly rescale the luma range of the image to the full [BLACK, WHITE]
/// range. An image where every pixel has the same value comes back unchanged.
pub fn stretch_contrast(img: &GrayImage) -> GrayImage {
    let mut out = img.clone();
    let Some((min, max)) = luma_bounds(img) else {
        return out;
    };
    if min == max {
        return out;
    }

    let scale = f32::from(WHITE) / f32::from(max - min);
    out.pixels_mut()
        .for_each(|p| p.apply(|v| ((v - min) as f32 * scale).round() as u8));
    out
}

pub fn filled(width: u32, height: u32, red: u8, green: u8, blue: u8) -> RgbImage {
    let mut buf = ImageBuffer::new(width, height);
    buf.enumerate_pixels_mut()
        .for_each(|(_, _, pixel)| *pixel = image::Rgb([red, green, blue]));
    buf
}

pub fn construct_gray(raw: &[&[u8]]) -> GrayImage {
    assert!(raw.windows(2).all(|w| w[0].len() == w[1].len()));
    let height = raw.len() as u32;
    let width = raw.iter().next().map(|row| row.len()).unwrap_or(0) as u32;
    GrayImage::from_fn(width, height, |x, y| {
        image::Luma([raw[y as usize][x as usize]])
    })
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn bounds() {
        assert_eq!(None, luma_bounds(&construct_gray(&[])));
        assert_eq!(
            Some((3, 3)),
            luma_bounds(&construct_gray(&[&[3, 3], &[3, 3]]))
        );
        assert_eq!(
            Some((10, 250)),
            luma_bounds(&construct_gray(&[&[10, 100], &[250, 30]]))
        );
    }

    #[test]
    fn stretch_full_range() {
        let img = construct_gray(&[&[100, 200], &[150, 100]]);
        let out = stretch_contrast(&img);
        assert_eq!(
            construct_gray(&[&[0, 255], &[128, 0]]),
            out
        );
    }

    #[test]
    fn stretch_flat_image_is_identity() {
        let img = construct_gray(&[&[42, 42], &[42, 42]]);
        assert_eq!(img, stretch_contrast(&img));
    }

    #[test]
    fn stretch_empty_image() {
        let img = construct_gray(&[]);
        let out = stretch_contrast(&img);
        assert!(is_img_empty(&out));
    }

    #[test]
    fn stretch_already_full_range_is_identity() {
        let img = construct_gray(&[&[BLACK, WHITE]]);
        assert_eq!(img, stretch_contrast(&img));
    }
}
