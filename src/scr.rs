//! SCR encoding: a raw dump of Spectrum screen memory.
//!
//! A screen is 6144 bytes of bitmap followed by 768 attribute bytes. Bitmap
//! rows are interleaved: the screen is split into thirds of 64 lines and each
//! third stores the first pixel line of all eight character rows, then the
//! second, and so on. Within a byte the leftmost pixel is bit 7.
//!
//! Each attribute byte is `FBPPPIII`: flash (always clear), bright, paper and
//! ink.

use image::RgbImage;
use log::debug;

use crate::colour::{self, ATTRIBUTE_BLOCK_SIZE, COLUMNS, Colour, ROWS, SCREEN_HEIGHT, SCREEN_WIDTH};
use crate::gigascreen::Screen;
use crate::options::Options;
use crate::pipeline::{ResultImage, ResultImageKind};
use crate::preprocess;

pub const BITMAP_SIZE: usize = (SCREEN_WIDTH * SCREEN_HEIGHT / 8) as usize;
pub const ATTRIBUTES_SIZE: usize = (COLUMNS * ROWS) as usize;
pub const SCR_SIZE: usize = BITMAP_SIZE + ATTRIBUTES_SIZE;
pub const GIGASCREEN_SCR_SIZE: usize = SCR_SIZE * 2;

const THIRD_HEIGHT: u32 = SCREEN_HEIGHT / 3;
const BRIGHT_BIT: u8 = 0x40;

/// The colours and bright flag of one attribute block as encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockAttribute {
    pub ink: Colour,
    pub paper: Colour,
    pub bright: bool,
}

impl BlockAttribute {
    pub fn to_byte(self) -> u8 {
        let ink = colour::spectrum_index(self.ink).unwrap_or(0) & 7;
        let paper = colour::spectrum_index(self.paper).unwrap_or(0) & 7;
        let bright = if self.bright { BRIGHT_BIT } else { 0 };

        ink | (paper << 3) | bright
    }
}

/// Picks ink and paper for every block of a 256x192 image, row by row. The
/// first pixel seeds the ink, the last pixel that differs from it becomes
/// paper, and the two swap if ink is the majority so that the dominant colour
/// is the background. `bright` receives `(paper, ink)`.
pub fn block_attributes(image: &RgbImage, bright: impl Fn(Colour, Colour) -> bool) -> Vec<BlockAttribute> {
    colour::whole_blocks(image.width(), image.height())
        .map(|(x, y)| {
            let pixels = colour::block_pixels(image, x, y);
            let mut ink = pixels[0];
            let mut paper = ink;
            let mut ink_count = 0;
            let mut paper_count = 0;

            for &pixel in &pixels {
                if pixel == ink {
                    ink_count += 1;
                } else {
                    paper = pixel;
                    paper_count += 1;
                }
            }

            if ink_count > paper_count {
                std::mem::swap(&mut ink, &mut paper);
            }

            BlockAttribute {
                ink,
                paper,
                bright: bright(paper, ink),
            }
        })
        .collect()
}

/// Encodes one screen. Images of any other size are first resized to 256x192.
pub fn encode_screen(image: &RgbImage, bright: impl Fn(Colour, Colour) -> bool) -> Vec<u8> {
    let image = preprocess::resize(image, SCREEN_WIDTH, SCREEN_HEIGHT);
    let attributes = block_attributes(&image, bright);
    let mut scr = Vec::with_capacity(SCR_SIZE);

    for third in (0..SCREEN_HEIGHT).step_by(THIRD_HEIGHT as usize) {
        for line in 0..ATTRIBUTE_BLOCK_SIZE {
            for y in (third + line..third + THIRD_HEIGHT).step_by(ATTRIBUTE_BLOCK_SIZE as usize) {
                for column in 0..COLUMNS {
                    let attribute = attributes[((y / ATTRIBUTE_BLOCK_SIZE) * COLUMNS + column) as usize];
                    let mut byte = 0_u8;

                    for bit in 0..8 {
                        let pixel = colour::to_colour(*image.get_pixel(column * 8 + bit, y));

                        if attribute.ink != attribute.paper && pixel == attribute.ink {
                            byte |= 0x80 >> bit;
                        }
                    }

                    scr.push(byte);
                }
            }
        }
    }

    scr.extend(attributes.iter().map(|attribute| attribute.to_byte()));
    scr
}

/// Encodes the output of a conversion: one screen normally, or both
/// GigaScreen screens concatenated. A single screen sets the bright bit of a
/// block when either of its final colours is bright; attribute resolution
/// has already moved both into one brightness set.
pub fn convert(results: &[ResultImage], options: &Options) -> Vec<u8> {
    let supporting: Vec<&RgbImage> = results
        .iter()
        .filter(|result| result.kind == ResultImageKind::Supporting)
        .map(|result| &result.image)
        .collect();

    if let [screen1, screen2] = supporting.as_slice() {
        let family = options.gigascreen_attribute_mode;
        debug!("Encoding GigaScreen SCR pair with {family:?} attributes");

        let mut scr = encode_screen(screen1, |_, _| family.is_bright(Screen::First));
        scr.extend(encode_screen(screen2, |_, _| family.is_bright(Screen::Second)));
        return scr;
    }

    let Some(image) = results
        .iter()
        .find(|result| result.kind == ResultImageKind::Final)
        .map(|result| &result.image)
    else {
        return Vec::new();
    };

    encode_screen(image, |paper, ink| colour::is_bright_set(paper) || colour::is_bright_set(ink))
}

/// The first screen of SCR data.
pub fn scr1(data: &[u8]) -> &[u8] {
    &data[..data.len().min(SCR_SIZE)]
}

/// The second screen of GigaScreen SCR data, if present.
pub fn scr2(data: &[u8]) -> Option<&[u8]> {
    data.get(SCR_SIZE..GIGASCREEN_SCR_SIZE)
}

#[cfg(test)]
mod tests {
    use image::Rgb;

    use super::*;
    use crate::colour::{BLACK, BRIGHT, HALF_BRIGHT, WHITE};

    #[test]
    fn sizes() {
        assert_eq!(BITMAP_SIZE, 6144);
        assert_eq!(ATTRIBUTES_SIZE, 768);
        assert_eq!(SCR_SIZE, 6912);
        assert_eq!(GIGASCREEN_SCR_SIZE, 13824);
    }

    #[test]
    fn attribute_byte_layout() {
        let attribute = BlockAttribute {
            ink: BRIGHT[2],
            paper: HALF_BRIGHT[5],
            bright: true,
        };

        assert_eq!(attribute.to_byte(), 0b0110_1010);
    }

    #[test]
    fn majority_colour_becomes_paper() {
        let image = RgbImage::from_fn(8, 8, |x, y| if x == 0 && y < 4 { Rgb([0, 0, 0]) } else { Rgb([255, 255, 255]) });
        let attributes = block_attributes(&image, |_, _| false);

        assert_eq!(attributes[0].ink, BLACK);
        assert_eq!(attributes[0].paper, WHITE);
    }

    #[test]
    fn bitmap_is_interleaved_by_thirds() {
        let mut image = RgbImage::from_pixel(256, 192, Rgb([255, 255, 255]));
        // Leftmost pixel of line 1, line 8 and line 64.
        for y in [1, 8, 64] {
            image.put_pixel(0, y, Rgb([0, 0, 0]));
        }

        let scr = encode_screen(&image, |_, _| true);

        assert_eq!(scr.len(), SCR_SIZE);
        assert_eq!(scr[0], 0);
        // line 8 is the second character row of the first pixel line
        assert_eq!(scr[32], 0x80);
        // line 1 follows all eight character rows of line 0
        assert_eq!(scr[256], 0x80);
        // line 64 starts the second third
        assert_eq!(scr[2048], 0x80);
        assert_eq!(scr.iter().take(BITMAP_SIZE).filter(|&&byte| byte != 0).count(), 3);

        // ink black, paper white, bright
        assert_eq!(scr[BITMAP_SIZE], 7 << 3 | 0x40);
        assert_eq!(scr[BITMAP_SIZE + 1], 7 | 7 << 3 | 0x40);
    }

    #[test]
    fn favoured_bright_block_keeps_bright_bit() {
        use crate::attribute::AttributeStrategy;
        use crate::dither::{DitherStrategy, ErrorDiffusionKernel};
        use crate::gigascreen::GigaScreenCache;
        use crate::pipeline;

        // Left half of every block bright red, right half black. Black is
        // not a bright colour, so the block straddles brightness sets.
        let source = RgbImage::from_fn(256, 192, |x, _| {
            if x % 8 < 4 { Rgb([255, 0, 0]) } else { Rgb([0, 0, 0]) }
        });
        let options = Options {
            dither: DitherStrategy::ErrorDiffusion(ErrorDiffusionKernel::NoDither),
            attribute_mode: AttributeStrategy::FavourMostPopular,
            ..Options::default()
        };

        let results = pipeline::convert(&source, &options, &GigaScreenCache::default()).unwrap();
        assert_eq!(pipeline::final_image(&results).unwrap().get_pixel(0, 0), &Rgb([255, 0, 0]));

        let scr = convert(&results, &options);

        assert!(scr[..BITMAP_SIZE].iter().all(|&byte| byte == 0xF0));
        // ink red, paper black, bright
        assert!(scr[BITMAP_SIZE..].iter().all(|&byte| byte == (2 | 0x40)));
    }

    #[test]
    fn bright_bit_follows_final_colours() {
        let half_bright = RgbImage::from_fn(256, 192, |x, _| {
            colour::to_pixel(if x % 2 == 0 { HALF_BRIGHT[2] } else { BLACK })
        });
        let scr = convert(
            &[ResultImage {
                kind: ResultImageKind::Final,
                image: half_bright,
            }],
            &Options::default(),
        );

        assert!(scr[BITMAP_SIZE..].iter().all(|&byte| byte & BRIGHT_BIT == 0));
    }

    #[test]
    fn other_sizes_are_resized() {
        let image = RgbImage::from_pixel(128, 96, Rgb([0, 0, 0]));

        assert_eq!(encode_screen(&image, |_, _| false).len(), SCR_SIZE);
    }

    #[test]
    fn screen_split() {
        let data: Vec<u8> = (0..GIGASCREEN_SCR_SIZE).map(|i| (i / SCR_SIZE) as u8).collect();

        assert!(scr1(&data).iter().all(|&byte| byte == 0));
        assert!(scr2(&data).is_some_and(|screen| screen.len() == SCR_SIZE && screen.iter().all(|&byte| byte == 1)));
        assert_eq!(scr2(&data[..SCR_SIZE]), None);
    }
}
