//! Attribute rules: every 8x8 block may only show two colours from one
//! brightness set.

use clap::ValueEnum;
use image::RgbImage;
use log::trace;
use serde::{Deserialize, Serialize};

use crate::colour::{self, ALL, BRIGHT, Colour, HALF_BRIGHT, REDUCED_HALF_BRIGHT};
use crate::distance::ColourDistance;
use crate::error::Result;
use crate::options::Options;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum AttributeStrategy {
    /// When the two colours straddle brightness sets, the half bright one is
    /// moved into the bright set.
    FavourBright,
    /// When the two colours straddle brightness sets, the bright one is moved
    /// into the half bright set.
    #[default]
    FavourHalfBright,
    /// The most popular colour's set wins.
    FavourMostPopular,
    ForceBright,
    ForceHalfBright,
    ForceReducedHalfBright,
}

impl AttributeStrategy {
    /// Moves the block's two colours into a single brightness set.
    pub fn enforce(self, most_popular: Colour, second: Colour, metric: ColourDistance) -> [Colour; 2] {
        let snap = |colour: Colour, set: &[Colour]| {
            colour::closest_colour(i32::from(colour.r), i32::from(colour.g), i32::from(colour.b), set, metric)
        };

        let popular_is_bright = colour::is_bright_set(most_popular);
        let second_is_bright = colour::is_bright_set(second);
        let straddles = popular_is_bright != second_is_bright && most_popular != second;

        match self {
            Self::FavourBright if straddles => {
                if second_is_bright {
                    [snap(most_popular, &BRIGHT), second]
                } else {
                    [most_popular, snap(second, &BRIGHT)]
                }
            }
            Self::FavourHalfBright if straddles => {
                if popular_is_bright {
                    [snap(most_popular, &HALF_BRIGHT), second]
                } else {
                    [most_popular, snap(second, &HALF_BRIGHT)]
                }
            }
            Self::FavourMostPopular if straddles => {
                let set: &[Colour] = if popular_is_bright { &BRIGHT } else { &HALF_BRIGHT };
                [most_popular, snap(second, set)]
            }
            Self::FavourBright | Self::FavourHalfBright | Self::FavourMostPopular => [most_popular, second],
            Self::ForceBright => [snap(most_popular, &BRIGHT), snap(second, &BRIGHT)],
            Self::ForceHalfBright => [snap(most_popular, &HALF_BRIGHT), snap(second, &HALF_BRIGHT)],
            Self::ForceReducedHalfBright => [
                snap(most_popular, &REDUCED_HALF_BRIGHT),
                snap(second, &REDUCED_HALF_BRIGHT),
            ],
        }
    }

    /// Whether the block's bright bit should be set. Agrees with the set
    /// [`enforce`](Self::enforce) moves the same two colours into.
    pub fn is_bright_set(self, most_popular: Colour, second: Colour) -> bool {
        let popular_is_bright = colour::is_bright_set(most_popular);
        let second_is_bright = colour::is_bright_set(second);
        let straddles = popular_is_bright != second_is_bright && most_popular != second;

        match self {
            Self::FavourBright if straddles => true,
            Self::FavourHalfBright if straddles => false,
            Self::FavourMostPopular if straddles => popular_is_bright,
            Self::FavourBright | Self::FavourHalfBright | Self::FavourMostPopular => {
                popular_is_bright && second_is_bright
            }
            Self::ForceBright => true,
            Self::ForceHalfBright | Self::ForceReducedHalfBright => false,
        }
    }
}

/// Reduces every whole 8x8 block to its two most popular Spectrum colours,
/// corrected by the configured attribute strategy.
pub fn colour_attributes(image: &mut RgbImage, options: &Options) -> Result<()> {
    let choice = options.colour_mode;
    let metric = options.colour_distance;

    for (x, y) in colour::whole_blocks(image.width(), image.height()) {
        let pixels = colour::block_pixels(image, x, y);
        let spectrum: Vec<Colour> = pixels
            .iter()
            .map(|pixel| colour::closest_colour(i32::from(pixel.r), i32::from(pixel.g), i32::from(pixel.b), &ALL, metric))
            .collect();

        let tally = colour::tally(&spectrum);
        let most_popular = tally[0].0;
        let second = tally.get(1).map_or(most_popular, |&(colour, _)| colour);
        let local = options.attribute_mode.enforce(most_popular, second, metric);

        trace!("Block ({x}, {y}): {most_popular:?} {second:?} -> {local:?}");

        for (i, pixel) in pixels.into_iter().enumerate() {
            let i = i as u32;
            let resolved = choice.choose_best_palette_match(pixel, local, options)?;
            image.put_pixel(
                x + i % colour::ATTRIBUTE_BLOCK_SIZE,
                y + i / colour::ATTRIBUTE_BLOCK_SIZE,
                colour::to_pixel(resolved),
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::choice::ColourChoice;
    use crate::colour::{BLACK, WHITE, hex};
    use crate::error::Error;

    #[test]
    fn bright_flag_agrees_with_enforced_colours() {
        for strategy in AttributeStrategy::value_variants() {
            for &first in &ALL {
                for &second in &ALL {
                    let enforced = strategy.enforce(first, second, ColourDistance::default());
                    let set: &[Colour] = if strategy.is_bright_set(first, second) {
                        &BRIGHT
                    } else {
                        &HALF_BRIGHT
                    };

                    assert!(
                        enforced.iter().all(|colour| set.contains(colour)),
                        "{strategy:?} {first:?} {second:?} -> {enforced:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn favour_strategies() {
        let bright_red = hex(0xFF_0000);
        let half_blue = hex(0x00_00CD);
        let metric = ColourDistance::default();

        assert_eq!(
            AttributeStrategy::FavourBright.enforce(bright_red, half_blue, metric),
            [bright_red, hex(0x00_00FF)]
        );
        assert_eq!(
            AttributeStrategy::FavourHalfBright.enforce(bright_red, half_blue, metric),
            [hex(0xCD_0000), half_blue]
        );
        assert_eq!(
            AttributeStrategy::FavourMostPopular.enforce(half_blue, bright_red, metric),
            [half_blue, hex(0xCD_0000)]
        );
        assert_eq!(
            AttributeStrategy::FavourHalfBright.enforce(BLACK, WHITE, metric),
            [BLACK, hex(0xCD_CDCD)]
        );
    }

    #[test]
    fn reduced_half_bright_uses_the_reduced_set() {
        let [a, b] = AttributeStrategy::ForceReducedHalfBright.enforce(hex(0xFF_00FF), WHITE, ColourDistance::Euclidean);

        assert!(REDUCED_HALF_BRIGHT.contains(&a));
        assert_eq!(b, hex(0xCD_CDCD));
    }

    #[test]
    fn blocks_are_reduced_to_two_colours() {
        let palette = [BLACK, hex(0xFF_0000), hex(0x00_CD00), WHITE];
        let mut image = RgbImage::from_fn(16, 8, |x, y| colour::to_pixel(palette[((x * 3 + y * 5) % 4) as usize]));

        colour_attributes(&mut image, &Options::default()).unwrap();

        for (x, y) in colour::whole_blocks(16, 8) {
            let pixels = colour::block_pixels(&image, x, y);
            assert!(colour::tally(&pixels).len() <= 2);
        }
    }

    #[test]
    fn gigascreen_images_cannot_be_attribute_coloured() {
        let mut image = RgbImage::from_pixel(8, 8, Rgb([0, 0, 0]));
        let options = Options {
            colour_mode: ColourChoice::GigaScreen,
            ..Options::default()
        };

        assert!(matches!(
            colour_attributes(&mut image, &options),
            Err(Error::UnsupportedOperation(_))
        ));
    }
}
