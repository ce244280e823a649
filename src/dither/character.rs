//! Character dithering: every 8x8 block becomes the closest glyph of the
//! Spectrum ROM font.
//!
//! The source is first dithered to monochrome with Stucki, then each block is
//! compared pixel by pixel with every glyph drawn in the monochrome ink and
//! paper. The glyph with the most matching pixels replaces the block. The same
//! matching, done in black and white, turns a converted image into text.

use image::RgbImage;

use crate::choice::ColourChoice;
use crate::colour::{self, ATTRIBUTE_BLOCK_SIZE, BLACK, Colour, WHITE};
use crate::options::Options;

use super::{DitherStrategy, ErrorDiffusionKernel};

/// Code of the first glyph in [`FONT`].
const FIRST_CODE: u8 = 0x20;

/// The ROM character set from $3D00, codes $20-$7F. One byte per pixel row,
/// leftmost pixel in bit 7.
#[rustfmt::skip]
pub const FONT: [[u8; 8]; 96] = [
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00], // space
    [0x00, 0x10, 0x10, 0x10, 0x10, 0x00, 0x10, 0x00], // !
    [0x00, 0x24, 0x24, 0x00, 0x00, 0x00, 0x00, 0x00], // "
    [0x00, 0x24, 0x7E, 0x24, 0x24, 0x7E, 0x24, 0x00], // #
    [0x00, 0x08, 0x3E, 0x28, 0x3E, 0x0A, 0x3E, 0x08], // $
    [0x00, 0x62, 0x64, 0x08, 0x10, 0x26, 0x46, 0x00], // %
    [0x00, 0x10, 0x28, 0x10, 0x2A, 0x44, 0x3A, 0x00], // &
    [0x00, 0x08, 0x10, 0x00, 0x00, 0x00, 0x00, 0x00], // '
    [0x00, 0x04, 0x08, 0x08, 0x08, 0x08, 0x04, 0x00], // (
    [0x00, 0x20, 0x10, 0x10, 0x10, 0x10, 0x20, 0x00], // )
    [0x00, 0x00, 0x14, 0x08, 0x3E, 0x08, 0x14, 0x00], // *
    [0x00, 0x00, 0x08, 0x08, 0x3E, 0x08, 0x08, 0x00], // +
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x08, 0x08, 0x10], // ,
    [0x00, 0x00, 0x00, 0x00, 0x3E, 0x00, 0x00, 0x00], // -
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x18, 0x18, 0x00], // .
    [0x00, 0x00, 0x02, 0x04, 0x08, 0x10, 0x20, 0x00], // /
    [0x00, 0x3C, 0x46, 0x4A, 0x52, 0x62, 0x3C, 0x00], // 0
    [0x00, 0x18, 0x28, 0x08, 0x08, 0x08, 0x3E, 0x00], // 1
    [0x00, 0x3C, 0x42, 0x02, 0x3C, 0x40, 0x7E, 0x00], // 2
    [0x00, 0x3C, 0x42, 0x0C, 0x02, 0x42, 0x3C, 0x00], // 3
    [0x00, 0x08, 0x18, 0x28, 0x48, 0x7E, 0x08, 0x00], // 4
    [0x00, 0x7E, 0x40, 0x7C, 0x02, 0x42, 0x3C, 0x00], // 5
    [0x00, 0x3C, 0x40, 0x7C, 0x42, 0x42, 0x3C, 0x00], // 6
    [0x00, 0x7E, 0x02, 0x04, 0x08, 0x10, 0x10, 0x00], // 7
    [0x00, 0x3C, 0x42, 0x3C, 0x42, 0x42, 0x3C, 0x00], // 8
    [0x00, 0x3C, 0x42, 0x42, 0x3E, 0x02, 0x3C, 0x00], // 9
    [0x00, 0x00, 0x00, 0x10, 0x00, 0x00, 0x10, 0x00], // :
    [0x00, 0x00, 0x10, 0x00, 0x00, 0x10, 0x10, 0x20], // ;
    [0x00, 0x00, 0x04, 0x08, 0x10, 0x08, 0x04, 0x00], // <
    [0x00, 0x00, 0x00, 0x3E, 0x00, 0x3E, 0x00, 0x00], // =
    [0x00, 0x00, 0x10, 0x08, 0x04, 0x08, 0x10, 0x00], // >
    [0x00, 0x3C, 0x42, 0x04, 0x08, 0x00, 0x08, 0x00], // ?
    [0x00, 0x3C, 0x4A, 0x56, 0x5E, 0x40, 0x3C, 0x00], // @
    [0x00, 0x3C, 0x42, 0x42, 0x7E, 0x42, 0x42, 0x00], // A
    [0x00, 0x7C, 0x42, 0x7C, 0x42, 0x42, 0x7C, 0x00], // B
    [0x00, 0x3C, 0x42, 0x40, 0x40, 0x42, 0x3C, 0x00], // C
    [0x00, 0x78, 0x44, 0x42, 0x42, 0x44, 0x78, 0x00], // D
    [0x00, 0x7E, 0x40, 0x7C, 0x40, 0x40, 0x7E, 0x00], // E
    [0x00, 0x7E, 0x40, 0x7C, 0x40, 0x40, 0x40, 0x00], // F
    [0x00, 0x3C, 0x42, 0x40, 0x4E, 0x42, 0x3C, 0x00], // G
    [0x00, 0x42, 0x42, 0x7E, 0x42, 0x42, 0x42, 0x00], // H
    [0x00, 0x3E, 0x08, 0x08, 0x08, 0x08, 0x3E, 0x00], // I
    [0x00, 0x02, 0x02, 0x02, 0x42, 0x42, 0x3C, 0x00], // J
    [0x00, 0x44, 0x48, 0x70, 0x48, 0x44, 0x42, 0x00], // K
    [0x00, 0x40, 0x40, 0x40, 0x40, 0x40, 0x7E, 0x00], // L
    [0x00, 0x42, 0x66, 0x5A, 0x42, 0x42, 0x42, 0x00], // M
    [0x00, 0x42, 0x62, 0x52, 0x4A, 0x46, 0x42, 0x00], // N
    [0x00, 0x3C, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00], // O
    [0x00, 0x7C, 0x42, 0x42, 0x7C, 0x40, 0x40, 0x00], // P
    [0x00, 0x3C, 0x42, 0x42, 0x52, 0x4A, 0x3C, 0x00], // Q
    [0x00, 0x7C, 0x42, 0x42, 0x7C, 0x44, 0x42, 0x00], // R
    [0x00, 0x3C, 0x40, 0x3C, 0x02, 0x42, 0x3C, 0x00], // S
    [0x00, 0xFE, 0x10, 0x10, 0x10, 0x10, 0x10, 0x00], // T
    [0x00, 0x42, 0x42, 0x42, 0x42, 0x42, 0x3C, 0x00], // U
    [0x00, 0x42, 0x42, 0x42, 0x42, 0x24, 0x18, 0x00], // V
    [0x00, 0x42, 0x42, 0x42, 0x42, 0x5A, 0x24, 0x00], // W
    [0x00, 0x42, 0x24, 0x18, 0x18, 0x24, 0x42, 0x00], // X
    [0x00, 0x82, 0x44, 0x28, 0x10, 0x10, 0x10, 0x00], // Y
    [0x00, 0x7E, 0x04, 0x08, 0x10, 0x20, 0x7E, 0x00], // Z
    [0x00, 0x0E, 0x08, 0x08, 0x08, 0x08, 0x0E, 0x00], // [
    [0x00, 0x00, 0x40, 0x20, 0x10, 0x08, 0x04, 0x00], // \
    [0x00, 0x70, 0x10, 0x10, 0x10, 0x10, 0x70, 0x00], // ]
    [0x00, 0x10, 0x38, 0x54, 0x10, 0x10, 0x10, 0x00], // up arrow
    [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xFF], // _
    [0x00, 0x1C, 0x22, 0x78, 0x20, 0x20, 0x7E, 0x00], // pound
    [0x00, 0x00, 0x38, 0x04, 0x3C, 0x44, 0x3C, 0x00], // a
    [0x00, 0x20, 0x20, 0x3C, 0x22, 0x22, 0x3C, 0x00], // b
    [0x00, 0x00, 0x1C, 0x20, 0x20, 0x20, 0x1C, 0x00], // c
    [0x00, 0x04, 0x04, 0x3C, 0x44, 0x44, 0x3C, 0x00], // d
    [0x00, 0x00, 0x38, 0x44, 0x78, 0x40, 0x3C, 0x00], // e
    [0x00, 0x0C, 0x10, 0x18, 0x10, 0x10, 0x10, 0x00], // f
    [0x00, 0x00, 0x3C, 0x44, 0x44, 0x3C, 0x04, 0x38], // g
    [0x00, 0x40, 0x40, 0x78, 0x44, 0x44, 0x44, 0x00], // h
    [0x00, 0x10, 0x00, 0x30, 0x10, 0x10, 0x38, 0x00], // i
    [0x00, 0x04, 0x00, 0x04, 0x04, 0x04, 0x24, 0x18], // j
    [0x00, 0x20, 0x28, 0x30, 0x30, 0x28, 0x24, 0x00], // k
    [0x00, 0x10, 0x10, 0x10, 0x10, 0x10, 0x0C, 0x00], // l
    [0x00, 0x00, 0x68, 0x54, 0x54, 0x54, 0x54, 0x00], // m
    [0x00, 0x00, 0x78, 0x44, 0x44, 0x44, 0x44, 0x00], // n
    [0x00, 0x00, 0x38, 0x44, 0x44, 0x44, 0x38, 0x00], // o
    [0x00, 0x00, 0x78, 0x44, 0x44, 0x78, 0x40, 0x40], // p
    [0x00, 0x00, 0x3C, 0x44, 0x44, 0x3C, 0x04, 0x06], // q
    [0x00, 0x00, 0x1C, 0x20, 0x20, 0x20, 0x20, 0x00], // r
    [0x00, 0x00, 0x38, 0x40, 0x38, 0x04, 0x78, 0x00], // s
    [0x00, 0x10, 0x38, 0x10, 0x10, 0x10, 0x0C, 0x00], // t
    [0x00, 0x00, 0x44, 0x44, 0x44, 0x44, 0x38, 0x00], // u
    [0x00, 0x00, 0x44, 0x44, 0x28, 0x28, 0x10, 0x00], // v
    [0x00, 0x00, 0x44, 0x54, 0x54, 0x54, 0x28, 0x00], // w
    [0x00, 0x00, 0x44, 0x28, 0x10, 0x28, 0x44, 0x00], // x
    [0x00, 0x00, 0x44, 0x44, 0x44, 0x3C, 0x04, 0x38], // y
    [0x00, 0x00, 0x7C, 0x08, 0x10, 0x20, 0x7C, 0x00], // z
    [0x00, 0x0E, 0x08, 0x30, 0x08, 0x08, 0x0E, 0x00], // {
    [0x00, 0x08, 0x08, 0x08, 0x08, 0x08, 0x08, 0x00], // |
    [0x00, 0x70, 0x10, 0x0C, 0x10, 0x10, 0x70, 0x00], // }
    [0x00, 0x14, 0x28, 0x00, 0x00, 0x00, 0x00, 0x00], // ~
    [0x3C, 0x42, 0x99, 0xA1, 0xA1, 0x99, 0x42, 0x3C], // copyright
];

/// The Unicode character for a glyph index. The Spectrum puts an up arrow,
/// a pound sign and a copyright sign where ASCII has `^`, `` ` `` and DEL.
pub fn glyph_char(index: usize) -> char {
    match index as u8 + FIRST_CODE {
        0x5E => '\u{2191}',
        0x60 => '\u{A3}',
        0x7F => '\u{A9}',
        code => char::from(code),
    }
}

/// A glyph as 64 row-major pixels: set bits black, clear bits white.
fn glyph_pixels(glyph: &[u8; 8]) -> Vec<Colour> {
    glyph
        .iter()
        .flat_map(|&row| (0..8).map(move |bit| if row & (0x80 >> bit) == 0 { WHITE } else { BLACK }))
        .collect()
}

/// Index of the glyph matching the most pixels of `block`. The earliest glyph
/// wins a tie.
fn best_glyph(block: &[Colour], draw: impl Fn(&[Colour]) -> Vec<Colour>) -> usize {
    let mut best = 0;
    let mut best_score = 0;

    for (index, glyph) in FONT.iter().enumerate() {
        let drawn = draw(&glyph_pixels(glyph));
        let score = drawn.iter().zip(block).filter(|(a, b)| a == b).count();

        if index == 0 || score > best_score {
            best = index;
            best_score = score;
        }
    }

    best
}

/// Pre-dithers to monochrome and replaces every whole block with its closest
/// glyph in the monochrome ink and paper.
pub fn dither(image: &mut RgbImage, options: &Options) {
    let monochrome = Options {
        colour_mode: ColourChoice::Monochrome,
        dither: DitherStrategy::ErrorDiffusion(ErrorDiffusionKernel::Stucki),
        ..options.clone()
    };
    ErrorDiffusionKernel::Stucki.dither(image, &monochrome);

    let ink = monochrome.monochrome_ink();
    let paper = monochrome.monochrome_paper();

    for (x, y) in colour::whole_blocks(image.width(), image.height()) {
        let block = colour::block_pixels(image, x, y);
        let draw = |pixels: &[Colour]| colour::monochrome_from_black_and_white(pixels, ink, paper);
        let glyph = draw(&glyph_pixels(&FONT[best_glyph(&block, draw)]));

        for (i, pixel) in glyph.into_iter().enumerate() {
            let i = i as u32;
            image.put_pixel(
                x + i % ATTRIBUTE_BLOCK_SIZE,
                y + i / ATTRIBUTE_BLOCK_SIZE,
                colour::to_pixel(pixel),
            );
        }
    }
}

/// One character per whole block, one line per block row. Any pixel other
/// than the monochrome paper counts as ink.
pub fn to_text(image: &RgbImage, options: &Options) -> String {
    let paper = options.monochrome_paper();
    let columns = image.width() / ATTRIBUTE_BLOCK_SIZE;
    let mut text = String::new();

    for (x, y) in colour::whole_blocks(image.width(), image.height()) {
        let block = colour::black_and_white_from_monochrome(&colour::block_pixels(image, x, y), paper);
        text.push(glyph_char(best_glyph(&block, <[Colour]>::to_vec)));

        if x / ATTRIBUTE_BLOCK_SIZE + 1 == columns {
            text.push('\n');
        }
    }

    text
}
