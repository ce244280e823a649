//! TAP tape images.
//!
//! A TAP file is a sequence of blocks, each preceded by a 2-byte
//! little-endian length. A block holds a flag byte, its data and an XOR
//! checksum of the flag and data. A screen is stored as a header block
//! (flag $00, 17 bytes describing a `CODE` file) followed by a data block
//! (flag $FF) holding the SCR bytes.

use log::debug;

use crate::error::{Error, Result};
use crate::scr::{GIGASCREEN_SCR_SIZE, SCR_SIZE};

pub const HEADER_FLAG: u8 = 0x00;
pub const DATA_FLAG: u8 = 0xFF;

/// Header type byte for a `CODE` (bytes) file.
const CODE_FILE: u8 = 3;
const NAME_LENGTH: usize = 10;
pub const DEFAULT_NAME: &str = "Loading...";
/// Start of screen memory.
const SCREEN_ADDRESS: u16 = 16384;
/// Second header parameter, unused for `CODE` files.
const UNUSED_PARAMETER: u16 = 32768;

/// XOR of every byte.
pub fn checksum(bytes: &[u8]) -> u8 {
    bytes.iter().fold(0, |acc, &byte| acc ^ byte)
}

/// Frames `flag + data + checksum` with its length.
fn block(flag: u8, data: &[u8]) -> Vec<u8> {
    let mut contents = Vec::with_capacity(data.len() + 2);
    contents.push(flag);
    contents.extend_from_slice(data);
    contents.push(checksum(&contents));

    let length = contents.len() as u16;
    let mut framed = Vec::with_capacity(contents.len() + 2);
    framed.extend_from_slice(&length.to_le_bytes());
    framed.extend(contents);
    framed
}

/// The 17 header bytes for a screen `CODE` file. Names are truncated or
/// padded with spaces to ten characters; non-ASCII characters become `?`.
fn screen_header(name: &str, length: u16) -> Vec<u8> {
    let mut header = Vec::with_capacity(17);
    header.push(CODE_FILE);

    let mut padded: Vec<u8> = name
        .chars()
        .take(NAME_LENGTH)
        .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
        .collect();
    padded.resize(NAME_LENGTH, b' ');
    header.extend(padded);

    header.extend_from_slice(&length.to_le_bytes());
    header.extend_from_slice(&SCREEN_ADDRESS.to_le_bytes());
    header.extend_from_slice(&UNUSED_PARAMETER.to_le_bytes());
    header
}

/// Wraps one 6912-byte screen as a header block and a data block.
pub fn create_tap_part(scr: &[u8], name: &str) -> Result<Vec<u8>> {
    if scr.len() != SCR_SIZE {
        return Err(Error::ScrLength {
            expected: SCR_SIZE,
            actual: scr.len(),
        });
    }

    let mut part = block(HEADER_FLAG, &screen_header(name, SCR_SIZE as u16));
    part.extend(block(DATA_FLAG, scr));
    Ok(part)
}

/// One part for a normal screen, two for a GigaScreen pair.
pub fn create_tap_parts(scr: &[u8], name: &str) -> Result<Vec<Vec<u8>>> {
    match scr.len() {
        SCR_SIZE => Ok(vec![create_tap_part(scr, name)?]),
        GIGASCREEN_SCR_SIZE => {
            let (first, second) = scr.split_at(SCR_SIZE);
            Ok(vec![create_tap_part(first, name)?, create_tap_part(second, name)?])
        }
        actual => Err(Error::ScrLength {
            expected: SCR_SIZE,
            actual,
        }),
    }
}

/// Concatenates an already framed loader program and the screen parts.
pub fn create_tap(loader: &[u8], parts: &[Vec<u8>]) -> Vec<u8> {
    let size = loader.len() + parts.iter().map(Vec::len).sum::<usize>();
    debug!("Assembling tape of {} parts, {size} bytes", parts.len());

    let mut tap = Vec::with_capacity(size);
    tap.extend_from_slice(loader);

    for part in parts {
        tap.extend_from_slice(part);
    }

    tap
}

/// A single block from a TAP file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapBlock {
    /// $00 for a header, $FF for data.
    pub flag: u8,
    /// Excludes the flag and checksum bytes.
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TapFile {
    pub blocks: Vec<TapBlock>,
}

impl TapFile {
    /// Splits TAP bytes into blocks, verifying every length and checksum.
    pub fn parse(data: &[u8]) -> Result<Self> {
        let mut blocks = Vec::new();
        let mut offset = 0;

        while offset < data.len() {
            let Some(&[low, high]) = data.get(offset..offset + 2) else {
                return Err(Error::MalformedTape(format!(
                    "expected 2-byte length at offset {offset}"
                )));
            };

            let length = usize::from(u16::from_le_bytes([low, high]));
            let start = offset + 2;

            if length < 2 {
                return Err(Error::MalformedTape(format!(
                    "block at offset {offset} has length {length}, minimum is 2"
                )));
            }

            let Some(contents) = data.get(start..start + length) else {
                return Err(Error::MalformedTape(format!(
                    "block at offset {offset} needs {length} bytes, only {} remain",
                    data.len() - start
                )));
            };

            let (body, stored) = contents.split_at(length - 1);

            if checksum(body) != stored[0] {
                return Err(Error::MalformedTape(format!(
                    "block at offset {offset}: checksum mismatch (expected ${:02X}, got ${:02X})",
                    checksum(body),
                    stored[0]
                )));
            }

            blocks.push(TapBlock {
                flag: body[0],
                data: body[1..].to_vec(),
            });

            offset = start + length;
        }

        Ok(Self { blocks })
    }
}
