//! The configuration snapshot every conversion reads from.
//!
//! An [`Options`] value is never mutated by the pipeline, so one snapshot can
//! be shared by any number of frames converting on different threads.

use serde::{Deserialize, Serialize};

use crate::attribute::AttributeStrategy;
use crate::choice::ColourChoice;
use crate::colour::{BRIGHT, Colour};
use crate::dither::{DitherStrategy, OrderedDitherMode};
use crate::distance::ColourDistance;
use crate::error::{Error, Result};
use crate::gigascreen::GigaScreenPaletteFamily;
use crate::gigascreen::order::GigaScreenPaletteOrder;
use crate::preprocess::Scaling;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Options {
    pub colour_distance: ColourDistance,
    pub colour_mode: ColourChoice,
    pub dither: DitherStrategy,
    /// Divisor applied to ordered dither coefficients in legacy mode.
    pub ordered_dither_intensity: u8,
    pub ordered_dither_mode: OrderedDitherMode,
    /// Alternate the scan direction of every other row during error diffusion.
    pub serpentine: bool,
    /// Keep diffused error inside the current attribute block.
    pub constrained_error_diffusion: bool,
    pub attribute_mode: AttributeStrategy,
    pub gigascreen_attribute_mode: GigaScreenPaletteFamily,
    pub gigascreen_palette_order: GigaScreenPaletteOrder,
    /// Monochrome pixels with every component below this value become ink.
    pub black_threshold: u8,
    /// Index into the bright palette.
    pub monochrome_ink_index: u8,
    /// Index into the bright palette.
    pub monochrome_paper_index: u8,
    pub prefer_detail: bool,
    pub scaling: Scaling,
    pub contrast: f32,
    pub brightness: f32,
    pub saturation: f32,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            colour_distance: ColourDistance::default(),
            colour_mode: ColourChoice::default(),
            dither: DitherStrategy::default(),
            ordered_dither_intensity: 1,
            ordered_dither_mode: OrderedDitherMode::default(),
            serpentine: false,
            constrained_error_diffusion: false,
            attribute_mode: AttributeStrategy::default(),
            gigascreen_attribute_mode: GigaScreenPaletteFamily::default(),
            gigascreen_palette_order: GigaScreenPaletteOrder::default(),
            black_threshold: 128,
            monochrome_ink_index: 0,
            monochrome_paper_index: 7,
            prefer_detail: false,
            scaling: Scaling::default(),
            contrast: 1.0,
            brightness: 0.0,
            saturation: 0.0,
        }
    }
}

impl Options {
    pub fn validate(&self) -> Result<()> {
        if self.ordered_dither_intensity == 0 {
            return Err(Error::InvalidOption {
                name: "ordered_dither_intensity",
                reason: "must be at least 1".to_string(),
            });
        }

        for (name, index) in [
            ("monochrome_ink_index", self.monochrome_ink_index),
            ("monochrome_paper_index", self.monochrome_paper_index),
        ] {
            if usize::from(index) >= BRIGHT.len() {
                return Err(Error::InvalidOption {
                    name,
                    reason: format!("{index} is not a Spectrum colour index (0-7)"),
                });
            }
        }

        if self.monochrome_ink_index == self.monochrome_paper_index {
            return Err(Error::InvalidOption {
                name: "monochrome_paper_index",
                reason: "ink and paper must differ".to_string(),
            });
        }

        if self.interlaced() && (self.colour_mode != ColourChoice::GigaScreen || self.dither == DitherStrategy::Character) {
            return Err(Error::InvalidOption {
                name: "scaling",
                reason: "interlaced sources need GigaScreen colours and a palette dither".to_string(),
            });
        }

        if !(self.contrast.is_finite() && self.contrast > 0.0) {
            return Err(Error::InvalidOption {
                name: "contrast",
                reason: format!("{} must be a positive number", self.contrast),
            });
        }

        Ok(())
    }

    pub fn monochrome_ink(&self) -> Colour {
        BRIGHT[usize::from(self.monochrome_ink_index) % BRIGHT.len()]
    }

    pub fn monochrome_paper(&self) -> Colour {
        BRIGHT[usize::from(self.monochrome_paper_index) % BRIGHT.len()]
    }

    /// Whether sources are double height and rows are paired before GigaScreen matching.
    pub fn interlaced(&self) -> bool {
        self.scaling == Scaling::Interlaced
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dither::ErrorDiffusionKernel;

    #[test]
    fn defaults_are_valid() {
        assert_eq!(Options::default().validate(), Ok(()));
    }

    #[test]
    fn rejects_out_of_range_values() {
        let options = Options {
            ordered_dither_intensity: 0,
            ..Options::default()
        };
        assert!(matches!(options.validate(), Err(Error::InvalidOption { name: "ordered_dither_intensity", .. })));

        let options = Options {
            monochrome_ink_index: 8,
            ..Options::default()
        };
        assert!(options.validate().is_err());

        let options = Options {
            monochrome_ink_index: 3,
            monochrome_paper_index: 3,
            ..Options::default()
        };
        assert!(options.validate().is_err());
    }

    #[test]
    fn interlace_needs_gigascreen() {
        let mut options = Options {
            scaling: Scaling::Interlaced,
            ..Options::default()
        };
        assert!(matches!(options.validate(), Err(Error::InvalidOption { name: "scaling", .. })));

        options.colour_mode = ColourChoice::Monochrome;
        assert!(options.validate().is_err());

        options.colour_mode = ColourChoice::GigaScreen;
        assert_eq!(options.validate(), Ok(()));

        options.dither = DitherStrategy::Character;
        assert!(options.validate().is_err());
    }

    #[test]
    fn json_round_trip_with_partial_input() {
        let options: Options = serde_json::from_str(
            r#"{"dither": "floyd-steinberg", "colour_mode": "gigascreen", "serpentine": true}"#,
        )
        .unwrap();

        assert_eq!(options.dither, DitherStrategy::ErrorDiffusion(ErrorDiffusionKernel::FloydSteinberg));
        assert_eq!(options.colour_mode, ColourChoice::GigaScreen);
        assert!(options.serpentine);
        assert_eq!(options.black_threshold, 128);

        let json = serde_json::to_string(&options).unwrap();
        assert_eq!(serde_json::from_str::<Options>(&json).unwrap(), options);
    }

    #[test]
    fn unknown_dither_is_rejected() {
        assert!(serde_json::from_str::<Options>(r#"{"dither": "sparkle"}"#).is_err());
    }
}
