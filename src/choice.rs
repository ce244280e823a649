use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::colour::{self, ALL, Colour, GIGASCREEN_ALL};
use crate::error::{Error, Result};
use crate::options::Options;

/// How individual pixels are resolved to Spectrum colours.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColourChoice {
    /// Nearest of the 15 Spectrum colours.
    #[default]
    Full,
    /// Configured ink or paper, by darkness threshold.
    Monochrome,
    /// Nearest of the 102 GigaScreen colours. Attribute blocks are resolved
    /// later by the GigaScreen converter rather than per pixel.
    #[serde(rename = "gigascreen")]
    #[value(name = "gigascreen")]
    GigaScreen,
}

impl ColourChoice {
    /// The colours a dithered pixel may take.
    pub fn palette(self, options: &Options) -> Vec<Colour> {
        match self {
            Self::Full => ALL.to_vec(),
            Self::Monochrome => vec![options.monochrome_ink(), options.monochrome_paper()],
            Self::GigaScreen => GIGASCREEN_ALL.clone(),
        }
    }

    pub fn closest_colour(self, red: i32, green: i32, blue: i32, options: &Options) -> Colour {
        match self {
            Self::Full => colour::closest_colour_with_detail(
                red,
                green,
                blue,
                &ALL,
                options.prefer_detail,
                options.colour_distance,
            ),
            Self::Monochrome => colour::monochrome_colour(
                red,
                green,
                blue,
                options.black_threshold,
                options.monochrome_ink(),
                options.monochrome_paper(),
            ),
            Self::GigaScreen => colour::closest_colour_with_detail(
                red,
                green,
                blue,
                &GIGASCREEN_ALL,
                options.prefer_detail,
                options.colour_distance,
            ),
        }
    }

    pub fn closest_pixel_colour(self, pixel: Colour, options: &Options) -> Colour {
        self.closest_colour(i32::from(pixel.r), i32::from(pixel.g), i32::from(pixel.b), options)
    }

    /// Resolves an already quantized pixel against the two colours of its
    /// attribute block. The first colour wins a tie.
    ///
    /// GigaScreen blocks hold four derived colours across two screens and
    /// cannot be resolved this way.
    pub fn choose_best_palette_match(self, pixel: Colour, local: [Colour; 2], options: &Options) -> Result<Colour> {
        match self {
            Self::Full => Ok(colour::closest_colour(
                i32::from(pixel.r),
                i32::from(pixel.g),
                i32::from(pixel.b),
                &local,
                options.colour_distance,
            )),
            Self::Monochrome => Ok(pixel),
            Self::GigaScreen => Err(Error::UnsupportedOperation(
                "GigaScreen colouring cannot resolve a pixel against a two colour attribute palette",
            )),
        }
    }
}
