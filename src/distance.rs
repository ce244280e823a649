use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::colour::Colour;

const LUMA_RED: f64 = 0.298_839;
const LUMA_GREEN: f64 = 0.586_811;
const LUMA_BLUE: f64 = 0.114_350;

/// Scalar distance between a set of components and a palette entry. Lower is closer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum ColourDistance {
    /// Sum of absolute component differences.
    Classic,
    /// Sum of squared component differences.
    Euclidean,
    /// Red-mean weighted approximation of perceptual distance.
    /// See <https://www.compuphase.com/cmetric.htm>.
    Compuphase,
    /// Weighted per-channel difference blended with a luma difference. Both
    /// terms are normalised to 0-1 by dividing by 255, so the luma term
    /// carries real weight in the ranking.
    #[default]
    Luminance,
}

impl ColourDistance {
    /// Components are signed because dithering may push them outside 0-255.
    pub fn distance(self, red: i32, green: i32, blue: i32, entry: Colour) -> f64 {
        let entry_red = i32::from(entry.r);
        let entry_green = i32::from(entry.g);
        let entry_blue = i32::from(entry.b);

        match self {
            Self::Classic => {
                f64::from((red - entry_red).abs() + (green - entry_green).abs() + (blue - entry_blue).abs())
            }
            Self::Euclidean => {
                let r = f64::from(red - entry_red);
                let g = f64::from(green - entry_green);
                let b = f64::from(blue - entry_blue);
                r * r + g * g + b * b
            }
            Self::Compuphase => {
                let rmean = (i64::from(entry_red) + i64::from(red)) / 2;
                let r = i64::from(entry_red - red);
                let g = i64::from(entry_green - green);
                let b = i64::from(entry_blue - blue);
                let weighted = (((512 + rmean) * r * r) >> 8) + 4 * g * g + (((767 - rmean) * b * b) >> 8);
                (weighted.max(0) as f64).sqrt()
            }
            Self::Luminance => {
                let luma = |r: f64, g: f64, b: f64| (r * LUMA_RED + g * LUMA_GREEN + b * LUMA_BLUE) / 255.0;
                let luma_diff = luma(f64::from(red), f64::from(green), f64::from(blue))
                    - luma(f64::from(entry_red), f64::from(entry_green), f64::from(entry_blue));
                let diff_r = f64::from(entry_red - red) / 255.0;
                let diff_g = f64::from(entry_green - green) / 255.0;
                let diff_b = f64::from(entry_blue - blue) / 255.0;

                (diff_r * diff_r * LUMA_RED + diff_g * diff_g * LUMA_GREEN + diff_b * diff_b * LUMA_BLUE) * 0.75
                    + luma_diff * luma_diff
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::{ALL, BLACK, WHITE, hex};

    const METRICS: [ColourDistance; 4] = [
        ColourDistance::Classic,
        ColourDistance::Euclidean,
        ColourDistance::Compuphase,
        ColourDistance::Luminance,
    ];

    #[test]
    fn identical_colours_have_zero_distance() {
        for metric in METRICS {
            for colour in ALL {
                let d = metric.distance(i32::from(colour.r), i32::from(colour.g), i32::from(colour.b), colour);
                assert!(d.abs() < f64::EPSILON, "{metric:?} {colour:?} {d}");
            }
        }
    }

    #[test]
    fn distances_are_non_negative() {
        for metric in METRICS {
            for colour in ALL {
                assert!(metric.distance(-40, 300, 17, colour) >= 0.0);
            }
        }
    }

    #[test]
    fn known_values() {
        assert!((ColourDistance::Classic.distance(10, 20, 30, BLACK) - 60.0).abs() < f64::EPSILON);
        assert!((ColourDistance::Euclidean.distance(1, 2, 2, BLACK) - 9.0).abs() < f64::EPSILON);

        // rmean = 127, r = 255: (639 * 65025) >> 8 = 162_308
        let compuphase = ColourDistance::Compuphase.distance(0, 0, 0, hex(0xFF_0000));
        assert!((compuphase - 162_308_f64.sqrt()).abs() < 1e-9);

        // channel term 0.75 plus a full luma step of 1
        let luminance = ColourDistance::Luminance.distance(255, 255, 255, BLACK);
        assert!((luminance - 1.75).abs() < 1e-9);
    }

    #[test]
    fn luminance_prefers_matching_brightness() {
        let metric = ColourDistance::Luminance;
        assert!(metric.distance(40, 40, 40, BLACK) < metric.distance(40, 40, 40, WHITE));
        assert!(metric.distance(0, 0, 200, hex(0x00_00CD)) < metric.distance(0, 0, 200, hex(0x00_00FF)));
    }
}
