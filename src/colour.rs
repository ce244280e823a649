//! Spectrum colour tables and the colour helpers shared by every stage.
//!
//! Colours are plain 24-bit [`RGB8`] values. The Spectrum palette index of a
//! colour is 0-7 for the half bright set and 8-15 for the bright set; black is
//! shared by both sets and always reports index 0.

use std::sync::LazyLock;

use image::{Rgb, RgbImage};
use rgb::RGB8;

use crate::distance::ColourDistance;

pub type Colour = RGB8;

/// Side length of a Spectrum attribute block in pixels.
pub const ATTRIBUTE_BLOCK_SIZE: u32 = 8;

pub const SCREEN_WIDTH: u32 = 256;
pub const SCREEN_HEIGHT: u32 = 192;

/// Attribute blocks per screen row and column.
pub const COLUMNS: u32 = SCREEN_WIDTH / ATTRIBUTE_BLOCK_SIZE;
pub const ROWS: u32 = SCREEN_HEIGHT / ATTRIBUTE_BLOCK_SIZE;

/// Components at or above this value are treated as "light" when preferring detail.
const PREFER_DETAIL_COMPONENT_BOUNDARY: i32 = 127;

pub const fn hex(value: u32) -> Colour {
    RGB8 {
        r: (value >> 16) as u8,
        g: (value >> 8) as u8,
        b: value as u8,
    }
}

pub const BLACK: Colour = hex(0x00_0000);
pub const WHITE: Colour = hex(0xFF_FFFF);

pub const BRIGHT: [Colour; 8] = [
    BLACK,
    hex(0x00_00FF),
    hex(0xFF_0000),
    hex(0xFF_00FF),
    hex(0x00_FF00),
    hex(0x00_FFFF),
    hex(0xFF_FF00),
    WHITE,
];

pub const HALF_BRIGHT: [Colour; 8] = [
    BLACK,
    hex(0x00_00CD),
    hex(0xCD_0000),
    hex(0xCD_00CD),
    hex(0x00_CD00),
    hex(0x00_CDCD),
    hex(0xCD_CD00),
    hex(0xCD_CDCD),
];

/// Half bright primaries only, with black and white at the ends.
pub const REDUCED_HALF_BRIGHT: [Colour; 5] = [
    BLACK,
    hex(0x00_00CD),
    hex(0xCD_0000),
    hex(0x00_CD00),
    hex(0xCD_CDCD),
];

/// Every distinct Spectrum colour: half bright 0-7 followed by bright 1-7.
pub const ALL: [Colour; 15] = [
    HALF_BRIGHT[0],
    HALF_BRIGHT[1],
    HALF_BRIGHT[2],
    HALF_BRIGHT[3],
    HALF_BRIGHT[4],
    HALF_BRIGHT[5],
    HALF_BRIGHT[6],
    HALF_BRIGHT[7],
    BRIGHT[1],
    BRIGHT[2],
    BRIGHT[3],
    BRIGHT[4],
    BRIGHT[5],
    BRIGHT[6],
    BRIGHT[7],
];

/// Every colour obtainable by averaging two Spectrum colours, in first-seen order.
pub static GIGASCREEN_ALL: LazyLock<Vec<Colour>> = LazyLock::new(|| {
    let mut colours = Vec::new();

    for first in ALL {
        for second in ALL {
            let colour = average(first, second);

            if !colours.contains(&colour) {
                colours.push(colour);
            }
        }
    }

    colours
});

pub fn to_colour(pixel: Rgb<u8>) -> Colour {
    RGB8::new(pixel[0], pixel[1], pixel[2])
}

pub fn to_pixel(colour: Colour) -> Rgb<u8> {
    Rgb([colour.r, colour.g, colour.b])
}

/// Top-left corners of every whole attribute block, row by row. Partial
/// blocks at the right and bottom edges are skipped.
pub fn whole_blocks(width: u32, height: u32) -> impl Iterator<Item = (u32, u32)> {
    let size = ATTRIBUTE_BLOCK_SIZE;

    (0..height / size).flat_map(move |row| (0..width / size).map(move |column| (column * size, row * size)))
}

/// The pixels of the attribute block at `(x, y)`, row-major.
pub fn block_pixels(image: &RgbImage, x: u32, y: u32) -> Vec<Colour> {
    let mut pixels = Vec::with_capacity((ATTRIBUTE_BLOCK_SIZE * ATTRIBUTE_BLOCK_SIZE) as usize);

    for dy in 0..ATTRIBUTE_BLOCK_SIZE {
        for dx in 0..ATTRIBUTE_BLOCK_SIZE {
            pixels.push(to_colour(*image.get_pixel(x + dx, y + dy)));
        }
    }

    pixels
}

/// Counts occurrences of each colour, most frequent first. Equal counts keep
/// first-seen order.
pub fn tally(pixels: &[Colour]) -> Vec<(Colour, usize)> {
    let mut counts: Vec<(Colour, usize)> = Vec::new();

    for &pixel in pixels {
        match counts.iter_mut().find(|(colour, _)| *colour == pixel) {
            Some((_, count)) => *count += 1,
            None => counts.push((pixel, 1)),
        }
    }

    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
}

/// Packs a colour into `0x00RRGGBB`.
pub fn pack(colour: Colour) -> u32 {
    (u32::from(colour.r) << 16) | (u32::from(colour.g) << 8) | u32::from(colour.b)
}

pub fn clamp_component(value: i32) -> u8 {
    value.clamp(0, 255) as u8
}

pub fn average(first: Colour, second: Colour) -> Colour {
    RGB8::new(
        ((u16::from(first.r) + u16::from(second.r)) / 2) as u8,
        ((u16::from(first.g) + u16::from(second.g)) / 2) as u8,
        ((u16::from(first.b) + u16::from(second.b)) / 2) as u8,
    )
}

/// NTSC luma of a colour in the range 0-255.
pub fn luma(colour: Colour) -> f32 {
    f32::from(colour.r) * 0.299 + f32::from(colour.g) * 0.587 + f32::from(colour.b) * 0.114
}

/// Finds the entry of `colour_set` with the lowest distance to the given
/// components. Components may lie outside 0-255 (ordered dither offsets are
/// not clamped). On a tie the earliest entry wins.
///
/// # Panics
///
/// Panics if `colour_set` is empty.
pub fn closest_colour(red: i32, green: i32, blue: i32, colour_set: &[Colour], metric: ColourDistance) -> Colour {
    let mut best = colour_set[0];
    let mut best_distance = f64::MAX;

    for &colour in colour_set {
        let distance = metric.distance(red, green, blue, colour);

        if distance < best_distance {
            best = colour;
            best_distance = distance;
        }
    }

    best
}

/// As [`closest_colour`], but when `prefer_detail` is set dark pixels snap to
/// the first entry (black) and light pixels to the last entry (white).
pub fn closest_colour_with_detail(
    red: i32,
    green: i32,
    blue: i32,
    colour_set: &[Colour],
    prefer_detail: bool,
    metric: ColourDistance,
) -> Colour {
    if prefer_detail {
        let boundary = PREFER_DETAIL_COMPONENT_BOUNDARY;

        if red < boundary && green < boundary && blue < boundary {
            return colour_set[0];
        }

        if red >= boundary && green >= boundary && blue >= boundary {
            return colour_set[colour_set.len() - 1];
        }
    }

    closest_colour(red, green, blue, colour_set, metric)
}

/// Whether a colour belongs to the bright set. Black belongs to both sets and
/// is reported as not bright.
pub fn is_bright_set(colour: Colour) -> bool {
    colour != BLACK && BRIGHT.contains(&colour)
}

/// Spectrum palette index: 0-7 for half bright colours, 8-15 for bright ones.
pub fn spectrum_index(colour: Colour) -> Option<u8> {
    if let Some(index) = HALF_BRIGHT.iter().position(|&c| c == colour) {
        return Some(index as u8);
    }

    BRIGHT.iter().position(|&c| c == colour).map(|index| index as u8 + 8)
}

/// Ink if every component is below `threshold`, otherwise paper.
pub fn monochrome_colour(red: i32, green: i32, blue: i32, threshold: u8, ink: Colour, paper: Colour) -> Colour {
    let threshold = i32::from(threshold);

    if red < threshold && green < threshold && blue < threshold {
        ink
    } else {
        paper
    }
}

/// Maps monochrome pixels back to black (ink) and white (paper).
pub fn black_and_white_from_monochrome(pixels: &[Colour], paper: Colour) -> Vec<Colour> {
    pixels
        .iter()
        .map(|&pixel| if pixel == paper { WHITE } else { BLACK })
        .collect()
}

/// Maps black and white pixels onto the chosen monochrome ink and paper.
pub fn monochrome_from_black_and_white(pixels: &[Colour], ink: Colour, paper: Colour) -> Vec<Colour> {
    pixels
        .iter()
        .map(|&pixel| if pixel == WHITE { paper } else { ink })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn palettes_start_black_and_end_white() {
        for set in [&BRIGHT[..], &ALL[..], &GIGASCREEN_ALL[..]] {
            assert_eq!(set[0], BLACK);
            assert_eq!(set[set.len() - 1], WHITE);
        }

        assert_eq!(REDUCED_HALF_BRIGHT[0], BLACK);
        assert_eq!(REDUCED_HALF_BRIGHT[4], HALF_BRIGHT[7]);
    }

    #[test]
    fn all_is_fifteen_distinct_colours() {
        for (index, colour) in ALL.iter().enumerate() {
            assert!(!ALL[..index].contains(colour));
        }
    }

    #[test]
    fn gigascreen_palette_has_102_colours() {
        assert_eq!(GIGASCREEN_ALL.len(), 102);
    }

    #[test]
    fn spectrum_indices() {
        assert_eq!(spectrum_index(BLACK), Some(0));
        assert_eq!(spectrum_index(hex(0xCD_0000)), Some(2));
        assert_eq!(spectrum_index(hex(0xFF_0000)), Some(10));
        assert_eq!(spectrum_index(WHITE), Some(15));
        assert_eq!(spectrum_index(hex(0x12_3456)), None);
    }

    #[test]
    fn brightness_set_membership() {
        assert!(!is_bright_set(BLACK));
        assert!(is_bright_set(WHITE));
        assert!(is_bright_set(hex(0x00_FFFF)));
        assert!(!is_bright_set(hex(0x00_CDCD)));
    }

    #[test]
    fn earliest_entry_wins_ties() {
        let set = [hex(0x00_0010), hex(0x10_0000)];

        assert_eq!(closest_colour(8, 0, 8, &set, ColourDistance::Classic), set[0]);
    }

    #[test]
    fn prefer_detail_snaps_extremes() {
        let red = closest_colour_with_detail(100, 20, 20, &ALL, true, ColourDistance::Euclidean);
        assert_eq!(red, BLACK);

        let light = closest_colour_with_detail(200, 130, 127, &ALL, true, ColourDistance::Euclidean);
        assert_eq!(light, WHITE);

        let mixed = closest_colour_with_detail(250, 0, 0, &ALL, true, ColourDistance::Euclidean);
        assert_eq!(mixed, hex(0xFF_0000));
    }

    #[test]
    fn monochrome_round_trip() {
        let ink = BRIGHT[1];
        let paper = BRIGHT[6];
        let original = [BLACK, WHITE, WHITE, BLACK];

        let monochrome = monochrome_from_black_and_white(&original, ink, paper);
        assert_eq!(monochrome, vec![ink, paper, paper, ink]);
        assert_eq!(black_and_white_from_monochrome(&monochrome, paper), original);
    }

    #[test]
    fn tally_orders_by_count_then_first_seen() {
        let red = hex(0xFF_0000);
        let blue = hex(0x00_00FF);
        let pixels = [blue, red, red, BLACK, BLACK, WHITE];

        assert_eq!(tally(&pixels), vec![(red, 2), (BLACK, 2), (blue, 1), (WHITE, 1)]);
    }

    #[test]
    fn whole_blocks_skip_partial_edges() {
        let blocks: Vec<_> = whole_blocks(20, 17).collect();

        assert_eq!(blocks, vec![(0, 0), (8, 0), (0, 8), (8, 8)]);
    }

    #[test]
    fn monochrome_threshold() {
        assert_eq!(monochrome_colour(127, 127, 127, 128, BLACK, WHITE), BLACK);
        assert_eq!(monochrome_colour(127, 128, 0, 128, BLACK, WHITE), WHITE);
    }
}
