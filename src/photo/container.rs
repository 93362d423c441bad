//! Byte-level attestation embedding for PNG and JPEG containers.
//!
//! The attestation JSON rides in a PNG `tEXt` chunk or a JPEG `COM`
//! segment. Pixel data is never touched, and `strip` removes the field
//! byte-identically, which is what makes strip-then-rehash verification
//! exact.

use super::PhotoError;

/// tEXt keyword carrying the attestation JSON.
pub const PNG_KEYWORD: &[u8] = b"WingsealAttestation";
/// COM-segment payload prefix distinguishing our comment from others.
pub const JPEG_PREFIX: &[u8] = b"WINGSEAL\0";

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
const SOI: [u8; 2] = [0xFF, 0xD8];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

pub fn detect(image: &[u8]) -> Option<ImageFormat> {
    if image.starts_with(&PNG_SIGNATURE) {
        Some(ImageFormat::Png)
    } else if image.starts_with(&SOI) {
        Some(ImageFormat::Jpeg)
    } else {
        None
    }
}

/// Embed `json` as the attestation field, replacing any existing one.
pub fn embed(image: &[u8], json: &str) -> Result<Vec<u8>, PhotoError> {
    match detect(image).ok_or(PhotoError::UnsupportedFormat)? {
        ImageFormat::Png => {
            let (clean, _) = png_split(image)?;
            png_insert(&clean, json)
        }
        ImageFormat::Jpeg => {
            let (clean, _) = jpeg_split(image)?;
            jpeg_insert(&clean, json)
        }
    }
}

/// The embedded attestation JSON, if present.
pub fn read(image: &[u8]) -> Result<Option<String>, PhotoError> {
    match detect(image).ok_or(PhotoError::UnsupportedFormat)? {
        ImageFormat::Png => Ok(png_split(image)?.1),
        ImageFormat::Jpeg => Ok(jpeg_split(image)?.1),
    }
}

/// The image with the attestation field removed — the canonical byte
/// form the photo hash covers.
pub fn strip(image: &[u8]) -> Result<Vec<u8>, PhotoError> {
    match detect(image).ok_or(PhotoError::UnsupportedFormat)? {
        ImageFormat::Png => Ok(png_split(image)?.0),
        ImageFormat::Jpeg => Ok(jpeg_split(image)?.0),
    }
}

// --- PNG ---

/// Walk the chunk stream, dropping attestation tEXt chunks and picking
/// up their JSON payload.
fn png_split(image: &[u8]) -> Result<(Vec<u8>, Option<String>), PhotoError> {
    let mut out = Vec::with_capacity(image.len());
    out.extend_from_slice(&PNG_SIGNATURE);
    let mut found = None;

    let mut pos = PNG_SIGNATURE.len();
    while pos < image.len() {
        if pos + 12 > image.len() {
            return Err(PhotoError::Codec("png", "truncated chunk header"));
        }
        let data_len =
            u32::from_be_bytes(image[pos..pos + 4].try_into().unwrap()) as usize;
        let end = pos
            .checked_add(12 + data_len)
            .filter(|&e| e <= image.len())
            .ok_or(PhotoError::Codec("png", "chunk overruns file"))?;
        let chunk_type = &image[pos + 4..pos + 8];
        let data = &image[pos + 8..pos + 8 + data_len];

        if chunk_type == b"tEXt" && is_attestation_text(data) {
            if found.is_none() {
                let json = &data[PNG_KEYWORD.len() + 1..];
                found = Some(
                    String::from_utf8(json.to_vec())
                        .map_err(|_| PhotoError::Codec("png", "attestation is not UTF-8"))?,
                );
            }
        } else {
            out.extend_from_slice(&image[pos..end]);
        }
        pos = end;
    }
    Ok((out, found))
}

fn is_attestation_text(data: &[u8]) -> bool {
    data.len() > PNG_KEYWORD.len()
        && &data[..PNG_KEYWORD.len()] == PNG_KEYWORD
        && data[PNG_KEYWORD.len()] == 0
}

/// Insert a fresh attestation tEXt chunk ahead of IEND. `clean` must be
/// attestation-free output of [`png_split`].
fn png_insert(clean: &[u8], json: &str) -> Result<Vec<u8>, PhotoError> {
    // tEXt text is nominally Latin-1; the attestation JSON is ASCII
    // (base64 and ISO-8601 fields only).
    let mut data = Vec::with_capacity(PNG_KEYWORD.len() + 1 + json.len());
    data.extend_from_slice(PNG_KEYWORD);
    data.push(0);
    data.extend_from_slice(json.as_bytes());

    let mut chunk = Vec::with_capacity(12 + data.len());
    chunk.extend_from_slice(&(data.len() as u32).to_be_bytes());
    chunk.extend_from_slice(b"tEXt");
    chunk.extend_from_slice(&data);
    let mut crc_input = b"tEXt".to_vec();
    crc_input.extend_from_slice(&data);
    chunk.extend_from_slice(&crc32(&crc_input).to_be_bytes());

    // Locate IEND and splice the chunk in front of it.
    let mut pos = PNG_SIGNATURE.len();
    while pos < clean.len() {
        if pos + 12 > clean.len() {
            return Err(PhotoError::Codec("png", "truncated chunk header"));
        }
        let data_len =
            u32::from_be_bytes(clean[pos..pos + 4].try_into().unwrap()) as usize;
        if &clean[pos + 4..pos + 8] == b"IEND" {
            let mut out = Vec::with_capacity(clean.len() + chunk.len());
            out.extend_from_slice(&clean[..pos]);
            out.extend_from_slice(&chunk);
            out.extend_from_slice(&clean[pos..]);
            return Ok(out);
        }
        pos += 12 + data_len;
    }
    Err(PhotoError::Codec("png", "IEND chunk missing"))
}

/// CRC-32 (zlib polynomial) over chunk type + data.
fn crc32(bytes: &[u8]) -> u32 {
    let mut crc = 0xFFFF_FFFFu32;
    for &b in bytes {
        crc ^= b as u32;
        for _ in 0..8 {
            crc = if crc & 1 != 0 {
                (crc >> 1) ^ 0xEDB8_8320
            } else {
                crc >> 1
            };
        }
    }
    !crc
}

// --- JPEG ---

/// Walk marker segments up to SOS/EOI, dropping our COM segment. Entropy
/// data after SOS is copied verbatim.
fn jpeg_split(image: &[u8]) -> Result<(Vec<u8>, Option<String>), PhotoError> {
    let mut out = Vec::with_capacity(image.len());
    out.extend_from_slice(&SOI);
    let mut found = None;

    let mut pos = 2;
    while pos < image.len() {
        if pos + 2 > image.len() || image[pos] != 0xFF {
            return Err(PhotoError::Codec("jpeg", "expected marker"));
        }
        let marker = image[pos + 1];
        match marker {
            // Standalone markers: TEM and restarts.
            0x01 | 0xD0..=0xD7 => {
                out.extend_from_slice(&image[pos..pos + 2]);
                pos += 2;
            }
            // SOS (entropy-coded data follows) or EOI: copy the rest.
            0xDA | 0xD9 => {
                out.extend_from_slice(&image[pos..]);
                break;
            }
            _ => {
                if pos + 4 > image.len() {
                    return Err(PhotoError::Codec("jpeg", "truncated segment header"));
                }
                let seg_len =
                    u16::from_be_bytes(image[pos + 2..pos + 4].try_into().unwrap()) as usize;
                if seg_len < 2 || pos + 2 + seg_len > image.len() {
                    return Err(PhotoError::Codec("jpeg", "segment overruns file"));
                }
                let end = pos + 2 + seg_len;
                let payload = &image[pos + 4..end];
                if marker == 0xFE && payload.starts_with(JPEG_PREFIX) {
                    if found.is_none() {
                        found = Some(
                            String::from_utf8(payload[JPEG_PREFIX.len()..].to_vec()).map_err(
                                |_| PhotoError::Codec("jpeg", "attestation is not UTF-8"),
                            )?,
                        );
                    }
                } else {
                    out.extend_from_slice(&image[pos..end]);
                }
                pos = end;
            }
        }
    }
    Ok((out, found))
}

/// Insert a fresh attestation COM segment right after SOI. `clean` must
/// be attestation-free output of [`jpeg_split`].
fn jpeg_insert(clean: &[u8], json: &str) -> Result<Vec<u8>, PhotoError> {
    let payload_len = JPEG_PREFIX.len() + json.len();
    // Segment length field covers itself (2 bytes) plus the payload.
    let seg_len = payload_len + 2;
    if seg_len > u16::MAX as usize {
        return Err(PhotoError::MetadataWrite("attestation exceeds COM segment size"));
    }

    let mut out = Vec::with_capacity(clean.len() + 4 + payload_len);
    out.extend_from_slice(&SOI);
    out.extend_from_slice(&[0xFF, 0xFE]);
    out.extend_from_slice(&(seg_len as u16).to_be_bytes());
    out.extend_from_slice(JPEG_PREFIX);
    out.extend_from_slice(json.as_bytes());
    out.extend_from_slice(&clean[2..]);
    Ok(out)
}
