use clap::ValueEnum;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::colour::{self, Colour};
use crate::options::Options;

/// How a matrix coefficient is turned into a component offset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrderedDitherMode {
    /// `coefficient / intensity` is added to every component.
    Legacy,
    /// Offsets are scaled by the average per-channel spread of the palette,
    /// centred on zero.
    #[default]
    Improved,
}

/// A threshold matrix stored row-major.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matrix {
    pub width: u32,
    pub height: u32,
    pub coefficients: &'static [u8],
}

impl Matrix {
    pub fn len(&self) -> usize {
        self.coefficients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coefficients.is_empty()
    }

    fn coefficient(&self, x: u32, y: u32) -> u8 {
        self.coefficients[(y * self.width + x) as usize]
    }
}

/// ```text
/// 0 1
/// ```
pub const BAYER_2X1: Matrix = Matrix {
    width: 2,
    height: 1,
    coefficients: &[0, 1],
};

/// ```text
/// 0 2
/// 3 1
/// ```
pub const BAYER_2X2: Matrix = Matrix {
    width: 2,
    height: 2,
    coefficients: &[0, 2, 3, 1],
};

pub const BAYER_4X4: Matrix = Matrix {
    width: 4,
    height: 4,
    coefficients: &[0, 8, 2, 10, 12, 4, 14, 6, 3, 11, 1, 9, 15, 7, 13, 5],
};

#[rustfmt::skip]
pub const BAYER_8X8: Matrix = Matrix {
    width: 8,
    height: 8,
    coefficients: &[
         0, 32,  8, 40,  2, 34, 10, 42,
        48, 16, 56, 24, 50, 18, 58, 26,
        12, 44,  4, 36, 14, 46,  6, 38,
        60, 28, 52, 20, 62, 30, 54, 22,
         3, 35, 11, 43,  1, 33,  9, 41,
        51, 19, 59, 27, 49, 17, 57, 25,
        15, 47,  7, 39, 13, 45,  5, 37,
        63, 31, 55, 23, 61, 29, 53, 21,
    ],
};

/// Dürer's square less one; every row and column sums to 30.
pub const MAGIC_SQUARE: Matrix = Matrix {
    width: 4,
    height: 4,
    coefficients: &[15, 2, 1, 12, 4, 9, 10, 7, 8, 5, 6, 11, 3, 14, 13, 0],
};

/// Pandiagonal: rows, columns and every broken diagonal sum to 30.
pub const NASIK_MAGIC_SQUARE: Matrix = Matrix {
    width: 4,
    height: 4,
    coefficients: &[0, 11, 6, 13, 14, 5, 8, 3, 9, 2, 15, 4, 7, 12, 1, 10],
};

/// ```text
/// 0 3
/// 2 1
/// ```
pub const OMEGA: Matrix = Matrix {
    width: 2,
    height: 2,
    coefficients: &[0, 3, 2, 1],
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum OrderedMatrix {
    #[serde(rename = "bayer-2x1")]
    #[value(name = "bayer-2x1")]
    Bayer2x1,
    #[serde(rename = "bayer-2x2")]
    #[value(name = "bayer-2x2")]
    Bayer2x2,
    #[serde(rename = "bayer-4x4")]
    #[value(name = "bayer-4x4")]
    Bayer4x4,
    #[serde(rename = "bayer-8x8")]
    #[value(name = "bayer-8x8")]
    Bayer8x8,
    MagicSquare,
    NasikMagicSquare,
    Omega,
}

impl OrderedMatrix {
    pub fn matrix(self) -> Matrix {
        match self {
            Self::Bayer2x1 => BAYER_2X1,
            Self::Bayer2x2 => BAYER_2X2,
            Self::Bayer4x4 => BAYER_4X4,
            Self::Bayer8x8 => BAYER_8X8,
            Self::MagicSquare => MAGIC_SQUARE,
            Self::NasikMagicSquare => NASIK_MAGIC_SQUARE,
            Self::Omega => OMEGA,
        }
    }

    /// Tiles the matrix over the image without overlap and palette matches
    /// every adjusted pixel. Tiles that would overhang the right or bottom
    /// edge are left untouched.
    pub fn dither(self, image: &mut RgbImage, options: &Options) {
        let matrix = self.matrix();
        let spread = average_distance(&options.colour_mode.palette(options));
        let length = matrix.len() as f64;
        let intensity = f64::from(options.ordered_dither_intensity.max(1));

        let mut tile_y = 0;
        while tile_y + matrix.height <= image.height() {
            let mut tile_x = 0;
            while tile_x + matrix.width <= image.width() {
                for y in 0..matrix.height {
                    for x in 0..matrix.width {
                        let coefficient = f64::from(matrix.coefficient(x, y));
                        let offsets = match options.ordered_dither_mode {
                            OrderedDitherMode::Legacy => [(coefficient / intensity).round(); 3],
                            OrderedDitherMode::Improved => {
                                let scale = coefficient / length - 0.5;
                                spread.map(|channel| channel * scale)
                            }
                        };

                        let pixel = image.get_pixel_mut(tile_x + x, tile_y + y);
                        let adjusted = colour::to_colour(*pixel);
                        let closest = options.colour_mode.closest_colour(
                            offset(adjusted.r, offsets[0]),
                            offset(adjusted.g, offsets[1]),
                            offset(adjusted.b, offsets[2]),
                            options,
                        );

                        *pixel = colour::to_pixel(closest);
                    }
                }

                tile_x += matrix.width;
            }

            tile_y += matrix.height;
        }
    }
}

/// Components are intentionally left unclamped.
fn offset(component: u8, offset: f64) -> i32 {
    (f64::from(component) + offset).round() as i32
}

/// Mean absolute per-channel difference over every unordered pair of distinct
/// palette entries.
pub fn average_distance(palette: &[Colour]) -> [f64; 3] {
    let mut totals = [0_u64; 3];
    let mut pairs = 0_u64;

    for (index, first) in palette.iter().enumerate() {
        for second in &palette[index + 1..] {
            totals[0] += u64::from(first.r.abs_diff(second.r));
            totals[1] += u64::from(first.g.abs_diff(second.g));
            totals[2] += u64::from(first.b.abs_diff(second.b));
            pairs += 1;
        }
    }

    if pairs == 0 {
        return [0.0; 3];
    }

    totals.map(|total| total as f64 / pairs as f64)
}
