//! GigaScreen conversion.
//!
//! Two Spectrum screens shown on alternate frames blend into the average of
//! their colours. Every attribute block therefore has an ink and paper on
//! each screen, giving a four colour palette per block drawn from up to 102
//! apparent colours.

use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::sync::LazyLock;

use clap::ValueEnum;
use image::{Rgb, RgbImage};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::colour::{self, ATTRIBUTE_BLOCK_SIZE, BRIGHT, Colour, HALF_BRIGHT};
use crate::distance::ColourDistance;
use crate::options::Options;

mod cache;
pub mod order;

pub use cache::GigaScreenCache;

/// One of the two alternating screens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Screen {
    First,
    Second,
}

/// The brightness sets each screen draws its ink and paper from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "kebab-case")]
pub enum GigaScreenPaletteFamily {
    #[default]
    HalfBright,
    Bright,
    /// Half bright on the first screen, bright on the second.
    Mixed,
}

impl GigaScreenPaletteFamily {
    pub fn candidates(self) -> &'static [GigaScreenAttribute] {
        match self {
            Self::HalfBright => HALF_BRIGHT_CANDIDATES.as_slice(),
            Self::Bright => BRIGHT_CANDIDATES.as_slice(),
            Self::Mixed => MIXED_CANDIDATES.as_slice(),
        }
    }

    /// The bright bit of every attribute on the given screen.
    pub fn is_bright(self, screen: Screen) -> bool {
        match self {
            Self::HalfBright => false,
            Self::Bright => true,
            Self::Mixed => screen == Screen::Second,
        }
    }
}

static HALF_BRIGHT_CANDIDATES: LazyLock<Vec<GigaScreenAttribute>> =
    LazyLock::new(|| build_candidates(&HALF_BRIGHT, &HALF_BRIGHT));
static BRIGHT_CANDIDATES: LazyLock<Vec<GigaScreenAttribute>> = LazyLock::new(|| build_candidates(&BRIGHT, &BRIGHT));
static MIXED_CANDIDATES: LazyLock<Vec<GigaScreenAttribute>> = LazyLock::new(|| build_candidates(&HALF_BRIGHT, &BRIGHT));

/// Every ink/paper combination across both screens, keeping only the first
/// combination to produce each distinct set of apparent colours.
fn build_candidates(first: &[Colour; 8], second: &[Colour; 8]) -> Vec<GigaScreenAttribute> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for &ink1 in first {
        for &paper1 in first {
            for &ink2 in second {
                for &paper2 in second {
                    let attribute = GigaScreenAttribute::new(ink1, paper1, ink2, paper2);

                    if seen.insert(attribute.fingerprint.clone()) {
                        candidates.push(attribute);
                    }
                }
            }
        }
    }

    candidates
}

/// An apparent colour and the two screen colours that produce it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GigaScreenColour {
    pub colour: Colour,
    pub screen1: Colour,
    pub screen2: Colour,
}

impl GigaScreenColour {
    fn new(screen1: Colour, screen2: Colour) -> Self {
        Self {
            colour: colour::average(screen1, screen2),
            screen1,
            screen2,
        }
    }
}

/// The four apparent colours of a block: ink over ink, ink over paper,
/// paper over ink and paper over paper.
#[derive(Debug, Clone)]
pub struct GigaScreenAttribute {
    pub ink1: Colour,
    pub paper1: Colour,
    pub ink2: Colour,
    pub paper2: Colour,
    colours: [GigaScreenColour; 4],
    fingerprint: Vec<u32>,
}

impl GigaScreenAttribute {
    pub fn new(ink1: Colour, paper1: Colour, ink2: Colour, paper2: Colour) -> Self {
        let colours = [
            GigaScreenColour::new(ink1, ink2),
            GigaScreenColour::new(ink1, paper2),
            GigaScreenColour::new(paper1, ink2),
            GigaScreenColour::new(paper1, paper2),
        ];

        let mut fingerprint: Vec<u32> = colours.iter().map(|c| colour::pack(c.colour)).collect();
        fingerprint.sort_unstable();
        fingerprint.dedup();

        Self {
            ink1,
            paper1,
            ink2,
            paper2,
            colours,
            fingerprint,
        }
    }

    pub fn colours(&self) -> &[GigaScreenColour; 4] {
        &self.colours
    }

    /// Sorted, deduplicated apparent colours packed as `0x00RRGGBB`.
    pub fn fingerprint(&self) -> &[u32] {
        &self.fingerprint
    }

    pub fn unique_colour_count(&self) -> usize {
        self.fingerprint.len()
    }

    /// The apparent colour closest to `pixel`. The earliest colour wins a tie.
    pub fn closest(&self, pixel: Colour, metric: ColourDistance) -> GigaScreenColour {
        let mut best = self.colours[0];
        let mut best_distance = f64::MAX;

        for candidate in self.colours {
            let distance = metric.distance(i32::from(pixel.r), i32::from(pixel.g), i32::from(pixel.b), candidate.colour);

            if distance < best_distance {
                best = candidate;
                best_distance = distance;
            }
        }

        best
    }

    /// Summed distance from every pixel of a block to its nearest apparent
    /// colour, given the block as `(colour, count)` pairs.
    pub fn score(&self, tally: &[(Colour, usize)], metric: ColourDistance) -> f64 {
        tally
            .iter()
            .map(|&(pixel, count)| {
                let nearest = self
                    .colours
                    .iter()
                    .map(|candidate| {
                        metric.distance(i32::from(pixel.r), i32::from(pixel.g), i32::from(pixel.b), candidate.colour)
                    })
                    .fold(f64::MAX, f64::min);

                nearest * count as f64
            })
            .sum()
    }
}

impl PartialEq for GigaScreenAttribute {
    fn eq(&self, other: &Self) -> bool {
        self.fingerprint == other.fingerprint
    }
}

impl Eq for GigaScreenAttribute {}

impl Hash for GigaScreenAttribute {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.fingerprint.hash(state);
    }
}

/// Index into the family's candidate list of the lowest scoring attribute for
/// every whole block, row by row.
pub fn attribute_grid(image: &RgbImage, family: GigaScreenPaletteFamily, metric: ColourDistance) -> Vec<usize> {
    let candidates = family.candidates();

    colour::whole_blocks(image.width(), image.height())
        .map(|(x, y)| {
            let tally = colour::tally(&colour::block_pixels(image, x, y));
            let mut best = 0;
            let mut best_score = f64::MAX;

            for (index, candidate) in candidates.iter().enumerate() {
                let score = candidate.score(&tally, metric);

                if score < best_score {
                    best = index;
                    best_score = score;
                }
            }

            best
        })
        .collect()
}

/// Halves the height of an image by averaging each pair of rows. A trailing
/// odd row is dropped.
pub fn average_row_pairs(image: &RgbImage) -> RgbImage {
    RgbImage::from_fn(image.width(), image.height() / 2, |x, y| {
        let upper = colour::to_colour(*image.get_pixel(x, y * 2));
        let lower = colour::to_colour(*image.get_pixel(x, y * 2 + 1));
        colour::to_pixel(colour::average(upper, lower))
    })
}

/// The apparent image and the two screens that produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct GigaScreenConversion {
    pub image: RgbImage,
    pub screen1: RgbImage,
    pub screen2: RgbImage,
}

/// Resolves every whole block of an image already dithered to the GigaScreen
/// palette to its best four colour attribute. Pixels outside whole blocks
/// keep their dithered colour and are black on both screens.
pub fn convert(dithered: &RgbImage, options: &Options, cache: &GigaScreenCache) -> GigaScreenConversion {
    let source = if options.interlaced() {
        average_row_pairs(dithered)
    } else {
        dithered.clone()
    };

    let family = options.gigascreen_attribute_mode;
    let metric = options.colour_distance;
    let candidates = family.candidates();
    let grid = cache.attribute_grid(&source, family, metric);

    debug!(
        "Resolving {} GigaScreen blocks from {} {family:?} candidates",
        grid.len(),
        candidates.len()
    );

    let mut image = source.clone();
    let mut screen1 = RgbImage::from_pixel(source.width(), source.height(), Rgb([0, 0, 0]));
    let mut screen2 = screen1.clone();

    for ((x, y), &index) in colour::whole_blocks(source.width(), source.height()).zip(grid.iter()) {
        let attribute = &candidates[index];

        for dy in 0..ATTRIBUTE_BLOCK_SIZE {
            for dx in 0..ATTRIBUTE_BLOCK_SIZE {
                let pixel = colour::to_colour(*source.get_pixel(x + dx, y + dy));
                let resolved = attribute.closest(pixel, metric);

                image.put_pixel(x + dx, y + dy, colour::to_pixel(resolved.colour));
                screen1.put_pixel(x + dx, y + dy, colour::to_pixel(resolved.screen1));
                screen2.put_pixel(x + dx, y + dy, colour::to_pixel(resolved.screen2));
            }
        }
    }

    if family == GigaScreenPaletteFamily::Mixed {
        debug!("Keeping computed screen order for mixed brightness palettes");
    } else {
        options.gigascreen_palette_order.apply(&mut screen1, &mut screen2);
    }

    GigaScreenConversion { image, screen1, screen2 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::colour::{BLACK, WHITE, hex};

    #[test]
    fn candidate_counts() {
        assert_eq!(GigaScreenPaletteFamily::HalfBright.candidates().len(), 549);
        assert_eq!(GigaScreenPaletteFamily::Bright.candidates().len(), 549);
        assert_eq!(GigaScreenPaletteFamily::Mixed.candidates().len(), 1296);
    }

    #[test]
    fn candidates_are_unique() {
        for family in GigaScreenPaletteFamily::value_variants() {
            let unique: HashSet<_> = family.candidates().iter().collect();
            assert_eq!(unique.len(), family.candidates().len(), "{family:?}");
        }
    }

    #[test]
    fn duplicate_combinations_collapse() {
        let red = hex(0xCD_0000);
        let single = GigaScreenAttribute::new(red, red, red, red);
        assert_eq!(single.unique_colour_count(), 1);

        let two = GigaScreenAttribute::new(BLACK, BLACK, BLACK, WHITE);
        assert_eq!(two.unique_colour_count(), 2);

        let four = GigaScreenAttribute::new(BLACK, red, hex(0x00_00FF), WHITE);
        assert_eq!(four.unique_colour_count(), 4);
    }

    #[test]
    fn equality_ignores_screen_assignment() {
        let a = GigaScreenAttribute::new(BLACK, WHITE, BLACK, WHITE);
        let b = GigaScreenAttribute::new(WHITE, BLACK, WHITE, BLACK);

        assert_eq!(a, b);
        assert_ne!(a.ink1, b.ink1);
    }

    #[test]
    fn closest_reports_source_colours() {
        let attribute = GigaScreenAttribute::new(BLACK, WHITE, BLACK, WHITE);
        let grey = attribute.closest(hex(0x80_8080), ColourDistance::Euclidean);

        assert_eq!(grey.colour, hex(0x7F_7F7F));
        assert_eq!(grey.screen1, BLACK);
        assert_eq!(grey.screen2, WHITE);
    }

    #[test]
    fn exact_blocks_score_zero() {
        let attribute = GigaScreenAttribute::new(BLACK, WHITE, BLACK, WHITE);
        let tally = [(BLACK, 10), (WHITE, 50), (hex(0x7F_7F7F), 4)];

        assert!(attribute.score(&tally, ColourDistance::Classic).abs() < f64::EPSILON);
        assert!(attribute.score(&[(hex(0xFF_0000), 1)], ColourDistance::Classic) > 0.0);
    }

    #[test]
    fn family_brightness() {
        assert!(!GigaScreenPaletteFamily::HalfBright.is_bright(Screen::Second));
        assert!(GigaScreenPaletteFamily::Bright.is_bright(Screen::First));
        assert!(!GigaScreenPaletteFamily::Mixed.is_bright(Screen::First));
        assert!(GigaScreenPaletteFamily::Mixed.is_bright(Screen::Second));
    }

    #[test]
    fn row_pairs_are_averaged() {
        let image = RgbImage::from_fn(2, 5, |_, y| if y % 2 == 0 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let averaged = average_row_pairs(&image);

        assert_eq!(averaged.dimensions(), (2, 2));
        assert!(averaged.pixels().all(|pixel| *pixel == Rgb([127, 127, 127])));
    }

    #[test]
    fn conversion_screens_blend_into_the_image() {
        let image = RgbImage::from_fn(16, 12, |x, y| {
            colour::to_pixel(colour::GIGASCREEN_ALL[((x + y * 3) % 7) as usize * 11])
        });
        let options = Options {
            colour_mode: crate::choice::ColourChoice::GigaScreen,
            ..Options::default()
        };
        let cache = GigaScreenCache::default();

        let converted = convert(&image, &options, &cache);

        for y in 0..8 {
            for x in 0..16 {
                let first = colour::to_colour(*converted.screen1.get_pixel(x, y));
                let second = colour::to_colour(*converted.screen2.get_pixel(x, y));
                assert_eq!(colour::to_colour(*converted.image.get_pixel(x, y)), colour::average(first, second));
                assert!(HALF_BRIGHT.contains(&first) && HALF_BRIGHT.contains(&second));
            }
        }

        for y in 8..12 {
            for x in 0..16 {
                assert_eq!(converted.image.get_pixel(x, y), image.get_pixel(x, y));
                assert_eq!(converted.screen1.get_pixel(x, y), &Rgb([0, 0, 0]));
            }
        }
    }
}
