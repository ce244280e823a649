//! Per-block choice of which screen shows which half of a GigaScreen
//! attribute. Swapping the screens of a block never changes the blended
//! colours, only how the flicker looks.

use clap::ValueEnum;
use image::RgbImage;
use palette::{FromColor, Hsv, Srgb};
use serde::{Deserialize, Serialize};

use crate::colour::{self, ATTRIBUTE_BLOCK_SIZE, BLACK, BRIGHT, Colour, HALF_BRIGHT};

/// A grouped colour in second place only moves a block when it covers at
/// least this many of its pixels.
const SECONDARY_COLOUR_THRESHOLD: usize = 24;

/// Blocks considered for HSB ordering look at this many distinct colours at most.
const HSB_SAMPLE_COLOURS: usize = 4;

/// Colours that flicker worst when left on the second screen.
const GROUPED_COLOURS: [Colour; 5] = [BLACK, HALF_BRIGHT[1], BRIGHT[1], HALF_BRIGHT[2], BRIGHT[2]];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GigaScreenPaletteOrder {
    /// Keep the screens as computed.
    None,
    /// The darker block goes on the first screen.
    #[default]
    Luminosity,
    /// Blocks dominated by dark blues, reds and black move to the first screen.
    Intelligent,
    Hue,
    Saturation,
    Brightness,
    HueSaturation,
    HueBrightness,
    SaturationBrightness,
}

impl GigaScreenPaletteOrder {
    /// Swaps blocks between the two screens where this ordering prefers the
    /// other arrangement. Only whole attribute blocks are considered.
    pub fn apply(self, screen1: &mut RgbImage, screen2: &mut RgbImage) {
        if self == Self::None {
            return;
        }

        for (x, y) in colour::whole_blocks(screen1.width(), screen1.height()) {
            let first = colour::block_pixels(screen1, x, y);
            let second = colour::block_pixels(screen2, x, y);

            if self.should_swap(&first, &second) {
                write_block(screen1, x, y, &second);
                write_block(screen2, x, y, &first);
            }
        }
    }

    fn should_swap(self, first: &[Colour], second: &[Colour]) -> bool {
        match self {
            Self::None => false,
            Self::Luminosity => luminosity_sum(first) > luminosity_sum(second),
            Self::Intelligent => {
                let tally = colour::tally(second);
                let (most_popular, _) = tally[0];
                let (second_colour, second_count) = tally.get(1).copied().unwrap_or(tally[0]);

                GROUPED_COLOURS.contains(&most_popular)
                    || (GROUPED_COLOURS.contains(&second_colour) && second_count >= SECONDARY_COLOUR_THRESHOLD)
            }
            Self::Hue
            | Self::Saturation
            | Self::Brightness
            | Self::HueSaturation
            | Self::HueBrightness
            | Self::SaturationBrightness => self.hsb_total(first) > self.hsb_total(second),
        }
    }

    /// Sum over the first few distinct colours of the block of the HSB
    /// components this ordering compares, each in 0-1.
    fn hsb_total(self, block: &[Colour]) -> f32 {
        let mut sampled: Vec<Colour> = Vec::with_capacity(HSB_SAMPLE_COLOURS);

        for &pixel in block {
            if !sampled.contains(&pixel) {
                sampled.push(pixel);

                if sampled.len() == HSB_SAMPLE_COLOURS {
                    break;
                }
            }
        }

        sampled
            .into_iter()
            .map(|colour| {
                let (hue, saturation, brightness) = hsb(colour);

                match self {
                    Self::Hue => hue,
                    Self::Saturation => saturation,
                    Self::HueSaturation => hue + saturation,
                    Self::HueBrightness => hue + brightness,
                    Self::SaturationBrightness => saturation + brightness,
                    _ => brightness,
                }
            })
            .sum()
    }
}

fn luminosity_sum(block: &[Colour]) -> f32 {
    block.iter().map(|&pixel| colour::luma(pixel)).sum()
}

/// Hue as a fraction of a full turn, saturation and brightness, all in 0-1.
fn hsb(colour: Colour) -> (f32, f32, f32) {
    let hsv: Hsv = Hsv::from_color(Srgb::new(colour.r, colour.g, colour.b).into_format::<f32>());

    (hsv.hue.into_positive_degrees() / 360.0, hsv.saturation, hsv.value)
}

fn write_block(image: &mut RgbImage, x: u32, y: u32, pixels: &[Colour]) {
    for (i, &pixel) in pixels.iter().enumerate() {
        let i = i as u32;
        image.put_pixel(
            x + i % ATTRIBUTE_BLOCK_SIZE,
            y + i / ATTRIBUTE_BLOCK_SIZE,
            colour::to_pixel(pixel),
        );
    }
}
