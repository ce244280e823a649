//! Per-frame conversion: dithering followed by attribute resolution.
//!
//! A conversion reads nothing but its input image, an [`Options`] snapshot
//! and the shared [`GigaScreenCache`], so frames may be converted on any
//! thread in any order.

use image::RgbImage;
use log::debug;

use crate::attribute;
use crate::choice::ColourChoice;
use crate::dither::DitherStrategy;
use crate::error::Result;
use crate::gigascreen::{self, GigaScreenCache};
use crate::options::Options;
use crate::preprocess;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultImageKind {
    /// The image to display or export as a picture.
    Final,
    /// One of the two GigaScreen screens, used only for SCR and TAP export.
    Supporting,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultImage {
    pub kind: ResultImageKind,
    pub image: RgbImage,
}

impl ResultImage {
    fn new(kind: ResultImageKind, image: RgbImage) -> Self {
        Self { kind, image }
    }
}

/// Dithers a scaled frame and resolves its attributes. Returns the final
/// image, followed in GigaScreen mode by the first and second screens.
/// Character dithering always yields a single monochrome image.
pub fn convert(original: &RgbImage, options: &Options, cache: &GigaScreenCache) -> Result<Vec<ResultImage>> {
    let mut dithered = options.dither.apply(original, options);

    if options.dither == DitherStrategy::Character {
        return Ok(vec![ResultImage::new(ResultImageKind::Final, dithered)]);
    }

    match options.colour_mode {
        ColourChoice::Full | ColourChoice::Monochrome => {
            attribute::colour_attributes(&mut dithered, options)?;
            Ok(vec![ResultImage::new(ResultImageKind::Final, dithered)])
        }
        ColourChoice::GigaScreen => {
            let conversion = gigascreen::convert(&dithered, options, cache);
            debug!(
                "GigaScreen conversion produced {}x{} screens",
                conversion.screen1.width(),
                conversion.screen1.height()
            );

            Ok(vec![
                ResultImage::new(ResultImageKind::Final, conversion.image),
                ResultImage::new(ResultImageKind::Supporting, conversion.screen1),
                ResultImage::new(ResultImageKind::Supporting, conversion.screen2),
            ])
        }
    }
}

/// Scales and tone adjusts a source frame, then converts it.
pub fn process_frame(source: &RgbImage, options: &Options, cache: &GigaScreenCache) -> Result<Vec<ResultImage>> {
    let scaled = preprocess::preprocess(source, options);
    convert(&scaled, options, cache)
}

pub fn final_image(results: &[ResultImage]) -> Option<&RgbImage> {
    results
        .iter()
        .find(|result| result.kind == ResultImageKind::Final)
        .map(|result| &result.image)
}

pub fn supporting_images(results: &[ResultImage]) -> impl Iterator<Item = &RgbImage> {
    results
        .iter()
        .filter(|result| result.kind == ResultImageKind::Supporting)
        .map(|result| &result.image)
}
