//! Manual ID3v2 tag reader and in-place frame writer
//!
//! Header layout (10 bytes): `"ID3"`, major version, revision, flags,
//! 4-byte syncsafe size. The frame stream follows: 4-byte frame id,
//! 4-byte syncsafe frame size, 2 flag bytes, frame body. Text frame
//! bodies start with an encoding byte (0x00 Latin-1, 0x03 UTF-8).
//!
//! Writing overwrites a frame body in place, zero-padding to the
//! original body length, so the tag region never grows and neighboring
//! frames are never moved. A value longer than the reserved body is
//! rejected with an explicit error; it is never silently truncated.

use crate::{ParseError, Result};
use std::path::Path;

const HEADER_LEN: usize = 10;
const FRAME_HEADER_LEN: usize = 10;

/// Decode a 4-byte syncsafe integer (7 data bits per byte)
pub fn decode_syncsafe(bytes: &[u8; 4]) -> u32 {
    (u32::from(bytes[0] & 0x7F) << 21)
        | (u32::from(bytes[1] & 0x7F) << 14)
        | (u32::from(bytes[2] & 0x7F) << 7)
        | u32::from(bytes[3] & 0x7F)
}

/// Encode a value as a 4-byte syncsafe integer
pub fn encode_syncsafe(value: u32) -> [u8; 4] {
    [
        ((value >> 21) & 0x7F) as u8,
        ((value >> 14) & 0x7F) as u8,
        ((value >> 7) & 0x7F) as u8,
        (value & 0x7F) as u8,
    ]
}

/// One frame in the tag region
#[derive(Debug, Clone)]
pub struct Id3Frame {
    /// Four-character frame id, e.g. `TIT2`
    pub id: String,

    /// The two frame flag bytes, carried through untouched
    pub flags: [u8; 2],

    /// Raw frame body including the encoding byte for text frames
    pub body: Vec<u8>,

    /// Absolute offset of the body within the file
    body_offset: usize,
}

impl Id3Frame {
    /// Decode a text frame body (encoding byte + text, trailing NULs
    /// stripped). Returns `None` for an empty body.
    pub fn text(&self) -> Option<String> {
        let (encoding, rest) = self.body.split_first()?;
        let rest: &[u8] = match rest.iter().rposition(|b| *b != 0) {
            Some(last) => &rest[..=last],
            None => &[],
        };
        let decoded = match encoding {
            // Latin-1; lossy is acceptable for the ASCII range we care about
            0x00 => rest.iter().map(|b| char::from(*b)).collect(),
            _ => String::from_utf8_lossy(rest).into_owned(),
        };
        Some(decoded)
    }
}

/// A parsed ID3v2 tag region
#[derive(Debug, Clone)]
pub struct Id3Tag {
    /// (major, revision) from the header
    pub version: (u8, u8),

    /// Header flag byte
    pub flags: u8,

    /// Declared tag size, excluding the 10-byte header
    pub tag_size: usize,

    /// Frames in file order
    pub frames: Vec<Id3Frame>,
}

impl Id3Tag {
    /// Read and parse the tag at the start of a file
    pub fn read(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Self::parse(&bytes)
    }

    /// Parse a tag from raw file bytes
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < HEADER_LEN || &bytes[0..3] != b"ID3" {
            return Err(ParseError::NotId3(
                "missing ID3 header magic".to_string(),
            ));
        }

        let version = (bytes[3], bytes[4]);
        let flags = bytes[5];
        let size_bytes: [u8; 4] = bytes[6..10].try_into().expect("slice is 4 bytes");
        let tag_size = decode_syncsafe(&size_bytes) as usize;

        let region = bytes
            .get(HEADER_LEN..HEADER_LEN + tag_size)
            .ok_or(ParseError::TruncatedTag(HEADER_LEN + tag_size))?;

        let mut frames = Vec::new();
        let mut offset = 0usize;

        while offset + FRAME_HEADER_LEN <= region.len() {
            let header = &region[offset..offset + FRAME_HEADER_LEN];
            if header[0] == 0 {
                break; // zero padding reached
            }

            let id = match std::str::from_utf8(&header[0..4]) {
                Ok(id) if id.bytes().all(|b| b.is_ascii_uppercase() || b.is_ascii_digit()) => {
                    id.to_string()
                }
                _ => {
                    tracing::warn!("Stopping at malformed frame id at offset {offset}");
                    break;
                }
            };

            let size_bytes: [u8; 4] = header[4..8].try_into().expect("slice is 4 bytes");
            let frame_size = decode_syncsafe(&size_bytes) as usize;
            let frame_flags = [header[8], header[9]];

            let body_start = offset + FRAME_HEADER_LEN;
            let body = region
                .get(body_start..body_start + frame_size)
                .ok_or(ParseError::TruncatedTag(HEADER_LEN + body_start))?
                .to_vec();

            frames.push(Id3Frame {
                id,
                flags: frame_flags,
                body,
                body_offset: HEADER_LEN + body_start,
            });

            offset = body_start + frame_size;
        }

        Ok(Self {
            version,
            flags,
            tag_size,
            frames,
        })
    }

    /// First frame with the given id
    pub fn frame(&self, id: &str) -> Option<&Id3Frame> {
        self.frames.iter().find(|f| f.id == id)
    }

    /// Decoded text of the first frame with the given id
    pub fn text(&self, id: &str) -> Option<String> {
        self.frame(id).and_then(Id3Frame::text)
    }

    /// Song title (`TIT2`)
    pub fn title(&self) -> Option<String> {
        self.text("TIT2")
    }
}

/// Overwrite the body of the first frame with the given id in place.
///
/// The new value is UTF-8 encoded behind an encoding byte and
/// zero-padded to the original body length. The frame's declared size,
/// all other frames, and everything after the tag region stay untouched.
///
/// # Errors
/// `FrameNotFound` when the frame is absent, `FrameValueTooLong` when
/// the encoded value does not fit in the reserved body.
pub fn write_text_frame(path: &Path, id: &str, value: &str) -> Result<()> {
    let mut bytes = std::fs::read(path)?;
    let tag = Id3Tag::parse(&bytes)?;

    let frame = tag.frame(id).ok_or_else(|| ParseError::FrameNotFound {
        id: id.to_string(),
    })?;

    let mut encoded = Vec::with_capacity(value.len() + 1);
    encoded.push(0x03); // UTF-8
    encoded.extend_from_slice(value.as_bytes());

    if encoded.len() > frame.body.len() {
        return Err(ParseError::FrameValueTooLong {
            id: id.to_string(),
            value_len: encoded.len(),
            body_len: frame.body.len(),
        });
    }

    let start = frame.body_offset;
    let end = start + frame.body.len();
    bytes[start..start + encoded.len()].copy_from_slice(&encoded);
    bytes[start + encoded.len()..end].fill(0);

    std::fs::write(path, bytes)?;
    Ok(())
}
