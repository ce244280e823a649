//! Scaling and tone adjustment applied to source frames before dithering.

use clap::ValueEnum;
use image::imageops::{self, FilterType};
use image::{Rgb, RgbImage};
use log::debug;
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

use crate::colour::{ATTRIBUTE_BLOCK_SIZE, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::options::Options;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum Scaling {
    /// Stretch to 256x192.
    #[default]
    Default,
    /// Stretch to 256x384; GigaScreen conversion averages each row pair.
    Interlaced,
    /// Keep the source size, cropped to whole attribute blocks.
    None,
    /// Scale to 256 wide keeping the aspect ratio, then crop or pad to 256x192.
    WidthProportional,
    /// Scale to 192 high keeping the aspect ratio, then crop or pad to 256x192.
    HeightProportional,
}

impl Scaling {
    pub fn scale(self, image: &RgbImage) -> RgbImage {
        let (width, height) = image.dimensions();

        match self {
            Self::Default => resize(image, SCREEN_WIDTH, SCREEN_HEIGHT),
            Self::Interlaced => resize(image, SCREEN_WIDTH, SCREEN_HEIGHT * 2),
            Self::None => {
                let width = width - width % ATTRIBUTE_BLOCK_SIZE;
                let height = height - height % ATTRIBUTE_BLOCK_SIZE;
                imageops::crop_imm(image, 0, 0, width, height).to_image()
            }
            Self::WidthProportional => {
                let scaled_height = proportional(height, SCREEN_WIDTH, width);
                letterbox(&resize(image, SCREEN_WIDTH, scaled_height))
            }
            Self::HeightProportional => {
                let scaled_width = proportional(width, SCREEN_HEIGHT, height);
                letterbox(&resize(image, scaled_width, SCREEN_HEIGHT))
            }
        }
    }
}

fn proportional(other: u32, target: u32, side: u32) -> u32 {
    if side == 0 {
        return 0;
    }

    (u64::from(other) * u64::from(target) / u64::from(side)).max(1) as u32
}

/// Nearest neighbour resize; a no-op when the size already matches.
pub fn resize(image: &RgbImage, width: u32, height: u32) -> RgbImage {
    if image.dimensions() == (width, height) {
        return image.clone();
    }

    debug!("Scaling {}x{} to {width}x{height}", image.width(), image.height());
    imageops::resize(image, width, height, FilterType::Nearest)
}

/// Places an image at the top left of a black 256x192 canvas.
fn letterbox(image: &RgbImage) -> RgbImage {
    let mut canvas = RgbImage::from_pixel(SCREEN_WIDTH, SCREEN_HEIGHT, Rgb([0, 0, 0]));
    imageops::replace(&mut canvas, image, 0, 0);
    canvas
}

/// Multiplies every component, clamping to 0-255.
pub fn change_contrast(image: &mut RgbImage, amount: f32) {
    if (amount - 1.0).abs() < f32::EPSILON {
        return;
    }

    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0 {
            *channel = (f32::from(*channel) * amount).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Adds to every component, clamping to 0-255.
pub fn change_brightness(image: &mut RgbImage, amount: f32) {
    if amount.abs() < f32::EPSILON {
        return;
    }

    for pixel in image.pixels_mut() {
        for channel in &mut pixel.0 {
            *channel = (f32::from(*channel) + amount).round().clamp(0.0, 255.0) as u8;
        }
    }
}

/// Offsets HSB saturation, clamping it to 0-1.
pub fn change_saturation(image: &mut RgbImage, amount: f32) {
    if amount.abs() < f32::EPSILON {
        return;
    }

    for pixel in image.pixels_mut() {
        let Rgb([red, green, blue]) = *pixel;
        let mut hsv: Hsv = Hsv::from_color(Srgb::new(red, green, blue).into_format::<f32>());
        hsv.saturation = (hsv.saturation + amount).clamp(0.0, 1.0);

        let rgb: Srgb<u8> = Srgb::<f32>::from_color(hsv).into_format();
        *pixel = Rgb([rgb.red, rgb.green, rgb.blue]);
    }
}

/// Scales a source frame and applies contrast, saturation and brightness in that order.
pub fn preprocess(image: &RgbImage, options: &Options) -> RgbImage {
    let mut scaled = options.scaling.scale(image);

    change_contrast(&mut scaled, options.contrast);
    change_saturation(&mut scaled, options.saturation);
    change_brightness(&mut scaled, options.brightness);

    scaled
}
