//! Error diffusion kernels.
//!
//! Each kernel lists the neighbours that receive part of a pixel's
//! quantization error as `(dx, dy, weight)` with a shared divisor. Offsets are
//! relative to a left-to-right scan and are mirrored when a serpentine scan
//! runs right-to-left.

use clap::ValueEnum;
use image::RgbImage;
use serde::{Deserialize, Serialize};

use crate::colour::{self, ATTRIBUTE_BLOCK_SIZE};
use crate::options::Options;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kernel {
    pub entries: &'static [(i32, i32, u8)],
    pub divisor: u8,
}

/// ```text
///        X   7
///    3   5   1
/// ```
pub const FLOYD_STEINBERG: Kernel = Kernel {
    entries: &[(1, 0, 7), (-1, 1, 3), (0, 1, 5), (1, 1, 1)],
    divisor: 16,
};

/// ```text
///            X   7   5
///    3   5   7   5   3
///    1   3   5   3   1
/// ```
pub const JARVIS_JUDICE_NINKE: Kernel = Kernel {
    entries: &[
        (1, 0, 7),
        (2, 0, 5),
        (-2, 1, 3),
        (-1, 1, 5),
        (0, 1, 7),
        (1, 1, 5),
        (2, 1, 3),
        (-2, 2, 1),
        (-1, 2, 3),
        (0, 2, 5),
        (1, 2, 3),
        (2, 2, 1),
    ],
    divisor: 48,
};

/// ```text
///            X   8   4
///    2   4   8   4   2
///    1   2   4   2   1
/// ```
pub const STUCKI: Kernel = Kernel {
    entries: &[
        (1, 0, 8),
        (2, 0, 4),
        (-2, 1, 2),
        (-1, 1, 4),
        (0, 1, 8),
        (1, 1, 4),
        (2, 1, 2),
        (-2, 2, 1),
        (-1, 2, 2),
        (0, 2, 4),
        (1, 2, 2),
        (2, 2, 1),
    ],
    divisor: 42,
};

/// ```text
///            X   4   2
///    1   2   4   2   1
/// ```
pub const BURKES: Kernel = Kernel {
    entries: &[
        (1, 0, 4),
        (2, 0, 2),
        (-2, 1, 1),
        (-1, 1, 2),
        (0, 1, 4),
        (1, 1, 2),
        (2, 1, 1),
    ],
    divisor: 16,
};

/// ```text
///        X   2
///    1   1
/// ```
pub const SIERRA_LIGHT: Kernel = Kernel {
    entries: &[(1, 0, 2), (-1, 1, 1), (0, 1, 1)],
    divisor: 4,
};

/// Atkinson's neighbourhood with a quarter of his weights, so only 25% of
/// the error is spread. Keeps colour clash between attribute blocks down.
pub const LOW_ERROR_ATKINSON: Kernel = Kernel {
    entries: &[(1, 0, 1), (2, 0, 1), (-1, 1, 1), (0, 1, 1), (1, 1, 1), (0, 2, 1)],
    divisor: 24,
};

/// ```text
///        X   1   1
///    1   1   1
///        1
/// ```
pub const ATKINSON: Kernel = Kernel {
    entries: &[(1, 0, 1), (2, 0, 1), (-1, 1, 1), (0, 1, 1), (1, 1, 1), (0, 2, 1)],
    divisor: 8,
};

/// Plain nearest colour matching.
pub const NO_DITHER: Kernel = Kernel {
    entries: &[],
    divisor: 1,
};

impl Kernel {
    /// Fraction of the quantization error this kernel passes on.
    pub fn total_weight(&self) -> f64 {
        let sum: u32 = self.entries.iter().map(|&(_, _, weight)| u32::from(weight)).sum();
        f64::from(sum) / f64::from(self.divisor)
    }

    /// Spreads `error` (original minus quantized, per channel) from the pixel
    /// at `(x, y)` onto its neighbours. Writes outside the image, or outside
    /// the pixel's attribute block when `constrained` is set, are dropped.
    pub fn distribute_error(&self, image: &mut RgbImage, x: u32, y: u32, error: [i32; 3], reverse: bool, constrained: bool) {
        if error == [0; 3] {
            return;
        }

        let block_x = x / ATTRIBUTE_BLOCK_SIZE;
        let block_y = y / ATTRIBUTE_BLOCK_SIZE;

        for &(dx, dy, weight) in self.entries {
            let dx = if reverse { -dx } else { dx };

            let (Some(nx), Some(ny)) = (x.checked_add_signed(dx), y.checked_add_signed(dy)) else {
                continue;
            };

            if nx >= image.width() || ny >= image.height() {
                continue;
            }

            if constrained && (nx / ATTRIBUTE_BLOCK_SIZE != block_x || ny / ATTRIBUTE_BLOCK_SIZE != block_y) {
                continue;
            }

            let fraction = f64::from(weight) / f64::from(self.divisor);
            let neighbour = image.get_pixel_mut(nx, ny);

            for (channel, &error) in neighbour.0.iter_mut().zip(&error) {
                let value = (f64::from(*channel) + fraction * f64::from(error)).round() as i32;
                *channel = colour::clamp_component(value);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ErrorDiffusionKernel {
    FloydSteinberg,
    JarvisJudiceNinke,
    Stucki,
    Burkes,
    SierraLight,
    LowErrorAtkinson,
    Atkinson,
    #[serde(rename = "none")]
    #[value(name = "none")]
    NoDither,
}

impl ErrorDiffusionKernel {
    pub fn kernel(self) -> Kernel {
        match self {
            Self::FloydSteinberg => FLOYD_STEINBERG,
            Self::JarvisJudiceNinke => JARVIS_JUDICE_NINKE,
            Self::Stucki => STUCKI,
            Self::Burkes => BURKES,
            Self::SierraLight => SIERRA_LIGHT,
            Self::LowErrorAtkinson => LOW_ERROR_ATKINSON,
            Self::Atkinson => ATKINSON,
            Self::NoDither => NO_DITHER,
        }
    }

    /// Quantizes every pixel in scan order, diffusing each pixel's error
    /// before the next one is visited. With serpentine scanning enabled the
    /// even rows run right-to-left.
    pub fn dither(self, image: &mut RgbImage, options: &Options) {
        let kernel = self.kernel();
        let width = image.width();

        for y in 0..image.height() {
            let reverse = options.serpentine && y % 2 == 0;

            for i in 0..width {
                let x = if reverse { width - 1 - i } else { i };

                let old = colour::to_colour(*image.get_pixel(x, y));
                let new = options.colour_mode.closest_pixel_colour(old, options);
                image.put_pixel(x, y, colour::to_pixel(new));

                let error = [
                    i32::from(old.r) - i32::from(new.r),
                    i32::from(old.g) - i32::from(new.g),
                    i32::from(old.b) - i32::from(new.b),
                ];

                kernel.distribute_error(image, x, y, error, reverse, options.constrained_error_diffusion);
            }
        }
    }
}
