//! Quantization of a raster onto the active colour palette.
//!
//! Two families are supported: ordered dithering, which tiles a fixed
//! threshold matrix over the image, and error diffusion, which pushes each
//! pixel's quantization error onto its unvisited neighbours. Character
//! dithering redraws a monochrome image with glyphs of the ROM font.

use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use image::RgbImage;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::options::Options;

pub mod character;
pub mod error_diffusion;
pub mod ordered;

pub use error_diffusion::{ErrorDiffusionKernel, Kernel};
pub use ordered::{Matrix, OrderedDitherMode, OrderedMatrix};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum DitherStrategy {
    Ordered(OrderedMatrix),
    ErrorDiffusion(ErrorDiffusionKernel),
    /// Monochrome, with every block replaced by a font glyph.
    Character,
}

const CHARACTER_NAME: &str = "character";

impl Default for DitherStrategy {
    fn default() -> Self {
        Self::ErrorDiffusion(ErrorDiffusionKernel::LowErrorAtkinson)
    }
}

impl DitherStrategy {
    /// Every strategy: ordered matrices, then kernels, then character.
    pub fn all() -> impl Iterator<Item = Self> {
        OrderedMatrix::value_variants()
            .iter()
            .copied()
            .map(Self::Ordered)
            .chain(ErrorDiffusionKernel::value_variants().iter().copied().map(Self::ErrorDiffusion))
            .chain(std::iter::once(Self::Character))
    }

    /// Quantizes a copy of `image` onto the palette of the configured colour
    /// mode. Character dithering always produces monochrome ink and paper.
    pub fn apply(self, image: &RgbImage, options: &Options) -> RgbImage {
        debug!("Dithering {}x{} image with {self}", image.width(), image.height());

        let mut output = image.clone();

        match self {
            Self::Ordered(matrix) => matrix.dither(&mut output, options),
            Self::ErrorDiffusion(kernel) => kernel.dither(&mut output, options),
            Self::Character => character::dither(&mut output, options),
        }

        output
    }
}

impl fmt::Display for DitherStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            Self::Ordered(matrix) => matrix.to_possible_value(),
            Self::ErrorDiffusion(kernel) => kernel.to_possible_value(),
            Self::Character => return f.write_str(CHARACTER_NAME),
        };

        match value {
            Some(value) => f.write_str(value.get_name()),
            None => write!(f, "{self:?}"),
        }
    }
}

impl FromStr for DitherStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case(CHARACTER_NAME) {
            return Ok(Self::Character);
        }

        if let Ok(matrix) = <OrderedMatrix as ValueEnum>::from_str(s, true) {
            return Ok(Self::Ordered(matrix));
        }

        if let Ok(kernel) = <ErrorDiffusionKernel as ValueEnum>::from_str(s, true) {
            return Ok(Self::ErrorDiffusion(kernel));
        }

        Err(Error::UnknownStrategy {
            kind: "dither strategy",
            name: s.to_string(),
        })
    }
}

impl TryFrom<String> for DitherStrategy {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DitherStrategy> for String {
    fn from(value: DitherStrategy) -> Self {
        value.to_string()
    }
}
