//! PNG encoding for RGBA figures.
//!
//! Supports two encoding modes:
//! - **Indexed PNG (color type 3)**: Used when image has ≤256 unique colors,
//!   which is the common case for flat-colored contour figures.
//! - **RGBA PNG (color type 6)**: Fallback for images with >256 colors
//!   (anti-aliased strokes, rendered text).
//!
//! Text metadata such as the figure title is stored in `tEXt` chunks, or
//! `iTXt` when the text is not representable in Latin-1.

use rayon::prelude::*;
use std::collections::HashMap;
use std::io::Write;

use grid_common::{ContourError, ContourResult};

/// Maximum colors for indexed PNG (PNG8)
const MAX_PALETTE_SIZE: usize = 256;

/// Minimum pixels to benefit from parallel palette extraction
const PARALLEL_THRESHOLD: usize = 4096;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

type Palette = Vec<(u8, u8, u8, u8)>;

/// Encode RGBA pixels, choosing indexed or RGBA color automatically.
///
/// `text` holds (keyword, value) metadata pairs written before the image data.
pub fn encode_png(
    pixels: &[u8],
    width: usize,
    height: usize,
    text: &[(&str, &str)],
) -> ContourResult<Vec<u8>> {
    if pixels.len() != width * height * 4 {
        return Err(ContourError::RenderError(format!(
            "pixel buffer holds {} bytes, expected {} for {}x{}",
            pixels.len(),
            width * height * 4,
            width,
            height
        )));
    }

    let num_pixels = pixels.len() / 4;
    let palette_result = if num_pixels >= PARALLEL_THRESHOLD {
        extract_palette_parallel(pixels)
    } else {
        extract_palette_sequential(pixels)
    };

    let mut png = Vec::new();
    png.extend_from_slice(&PNG_SIGNATURE);

    match palette_result {
        Some((palette, indices)) => {
            write_chunk(&mut png, b"IHDR", &ihdr(width, height, 3));
            write_text_chunks(&mut png, text)?;
            write_palette(&mut png, &palette);
            let idat = deflate_scanlines(&indices, width, height, 1)?;
            write_chunk(&mut png, b"IDAT", &idat);
        }
        None => {
            write_chunk(&mut png, b"IHDR", &ihdr(width, height, 6));
            write_text_chunks(&mut png, text)?;
            let idat = deflate_scanlines(pixels, width, height, 4)?;
            write_chunk(&mut png, b"IDAT", &idat);
        }
    }

    write_chunk(&mut png, b"IEND", &[]);
    Ok(png)
}

/// IHDR payload for 8-bit images of the given color type.
fn ihdr(width: usize, height: usize, color_type: u8) -> Vec<u8> {
    let mut data = Vec::with_capacity(13);
    data.extend_from_slice(&(width as u32).to_be_bytes());
    data.extend_from_slice(&(height as u32).to_be_bytes());
    data.push(8); // bit depth
    data.push(color_type);
    data.push(0); // compression method
    data.push(0); // filter method
    data.push(0); // interlace method
    data
}

/// PLTE plus tRNS when any palette entry is translucent.
fn write_palette(png: &mut Vec<u8>, palette: &[(u8, u8, u8, u8)]) {
    let plte: Vec<u8> = palette.iter().flat_map(|&(r, g, b, _)| [r, g, b]).collect();
    write_chunk(png, b"PLTE", &plte);

    if palette.iter().any(|&(_, _, _, a)| a < 255) {
        let trns: Vec<u8> = palette.iter().map(|&(_, _, _, a)| a).collect();
        write_chunk(png, b"tRNS", &trns);
    }
}

fn write_text_chunks(png: &mut Vec<u8>, text: &[(&str, &str)]) -> ContourResult<()> {
    for &(keyword, value) in text {
        if keyword.is_empty() || keyword.len() > 79 || !keyword.is_ascii() {
            return Err(ContourError::RenderError(format!(
                "invalid PNG text keyword '{}'",
                keyword
            )));
        }

        let mut data = Vec::with_capacity(keyword.len() + value.len() + 5);
        data.extend_from_slice(keyword.as_bytes());
        data.push(0);

        let latin1: Option<Vec<u8>> = value
            .chars()
            .map(|c| u8::try_from(u32::from(c)).ok())
            .collect();

        match latin1 {
            Some(bytes) => {
                data.extend_from_slice(&bytes);
                write_chunk(png, b"tEXt", &data);
            }
            None => {
                // uncompressed, no language tag, no translated keyword
                data.extend_from_slice(&[0, 0, 0, 0]);
                data.extend_from_slice(value.as_bytes());
                write_chunk(png, b"iTXt", &data);
            }
        }
    }
    Ok(())
}

/// Pack RGBA bytes into a u32 for faster hashing and comparison
#[inline(always)]
fn pack_color(r: u8, g: u8, b: u8, a: u8) -> u32 {
    (r as u32) | ((g as u32) << 8) | ((b as u32) << 16) | ((a as u32) << 24)
}

/// Unpack u32 back to RGBA tuple
#[inline(always)]
fn unpack_color(packed: u32) -> (u8, u8, u8, u8) {
    (
        packed as u8,
        (packed >> 8) as u8,
        (packed >> 16) as u8,
        (packed >> 24) as u8,
    )
}

/// Sequential palette extraction for small images.
fn extract_palette_sequential(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let mut color_to_index: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);
    let mut indices: Vec<u8> = Vec::with_capacity(pixels.len() / 4);

    for chunk in pixels.chunks_exact(4) {
        let packed = pack_color(chunk[0], chunk[1], chunk[2], chunk[3]);

        let index = match color_to_index.get(&packed) {
            Some(&idx) => idx,
            None => {
                if palette.len() >= MAX_PALETTE_SIZE {
                    return None;
                }
                let idx = palette.len() as u8;
                palette.push((chunk[0], chunk[1], chunk[2], chunk[3]));
                color_to_index.insert(packed, idx);
                idx
            }
        };
        indices.push(index);
    }

    Some((palette, indices))
}

/// Parallel palette extraction for larger images.
///
/// Unique colors are collected per chunk, merged, and pixels are then mapped
/// to palette indices in a second parallel pass.
fn extract_palette_parallel(pixels: &[u8]) -> Option<(Palette, Vec<u8>)> {
    let chunk_pixels = (pixels.len() / 4 / rayon::current_num_threads()).max(256);

    let unique_colors: Vec<u32> = pixels
        .par_chunks(chunk_pixels * 4)
        .flat_map(|chunk| {
            let mut local_colors: HashMap<u32, ()> = HashMap::with_capacity(MAX_PALETTE_SIZE);
            for pixel in chunk.chunks_exact(4) {
                local_colors.insert(pack_color(pixel[0], pixel[1], pixel[2], pixel[3]), ());
                if local_colors.len() > MAX_PALETTE_SIZE {
                    break;
                }
            }
            local_colors.into_keys().collect::<Vec<_>>()
        })
        .collect();

    let mut global_colors: HashMap<u32, u8> = HashMap::with_capacity(MAX_PALETTE_SIZE);
    let mut palette: Palette = Vec::with_capacity(MAX_PALETTE_SIZE);

    for packed in unique_colors {
        if !global_colors.contains_key(&packed) {
            if palette.len() >= MAX_PALETTE_SIZE {
                return None;
            }
            global_colors.insert(packed, palette.len() as u8);
            palette.push(unpack_color(packed));
        }
    }

    let mut indices = vec![0u8; pixels.len() / 4];
    indices
        .par_chunks_mut(chunk_pixels)
        .zip(pixels.par_chunks(chunk_pixels * 4))
        .for_each(|(idx_chunk, px_chunk)| {
            for (idx, pixel) in idx_chunk.iter_mut().zip(px_chunk.chunks_exact(4)) {
                let packed = pack_color(pixel[0], pixel[1], pixel[2], pixel[3]);
                *idx = global_colors.get(&packed).copied().unwrap_or(0);
            }
        });

    Some((palette, indices))
}

/// Prefix each scanline with filter byte 0 and zlib-compress.
fn deflate_scanlines(
    data: &[u8],
    width: usize,
    height: usize,
    bytes_per_pixel: usize,
) -> ContourResult<Vec<u8>> {
    let stride = width * bytes_per_pixel;
    let mut uncompressed = Vec::with_capacity(height * (1 + stride));
    for row in data.chunks_exact(stride.max(1)).take(height) {
        uncompressed.push(0); // filter type: none
        uncompressed.extend_from_slice(row);
    }

    let mut encoder = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::default());
    let compress_err = |e: std::io::Error| ContourError::RenderError(format!("IDAT compression failed: {}", e));
    encoder.write_all(&uncompressed).map_err(compress_err)?;
    encoder.finish().map_err(compress_err)
}

/// Write a PNG chunk
fn write_chunk(png: &mut Vec<u8>, chunk_type: &[u8; 4], data: &[u8]) {
    png.extend_from_slice(&(data.len() as u32).to_be_bytes());
    png.extend_from_slice(chunk_type);
    png.extend_from_slice(data);

    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    png.extend_from_slice(&hasher.finalize().to_be_bytes());
}

/// Read back the text metadata of an encoded PNG as (keyword, value) pairs.
pub fn read_text_chunks(png: &[u8]) -> Vec<(String, String)> {
    let mut out = Vec::new();
    if png.len() < 8 || png[..8] != PNG_SIGNATURE {
        return out;
    }

    let mut pos = 8;
    while pos + 8 <= png.len() {
        let len = u32::from_be_bytes([png[pos], png[pos + 1], png[pos + 2], png[pos + 3]]) as usize;
        let kind = &png[pos + 4..pos + 8];
        let Some(data) = png.get(pos + 8..pos + 8 + len) else {
            break;
        };

        if let Some(split) = data.iter().position(|&b| b == 0) {
            let keyword = String::from_utf8_lossy(&data[..split]).into_owned();
            match kind {
                b"tEXt" => {
                    let value = data[split + 1..].iter().map(|&b| b as char).collect();
                    out.push((keyword, value));
                }
                b"iTXt" => {
                    // skip compression flag, method, language tag and translated keyword
                    let rest = data.get(split + 3..).unwrap_or(&[]);
                    let mut nul = rest.iter().enumerate().filter(|&(_, &b)| b == 0).map(|(i, _)| i);
                    if let (Some(_), Some(second)) = (nul.next(), nul.next()) {
                        let value = String::from_utf8_lossy(&rest[second + 1..]).into_owned();
                        out.push((keyword, value));
                    }
                }
                _ => {}
            }
        }

        pos += 12 + len;
    }

    out
}
