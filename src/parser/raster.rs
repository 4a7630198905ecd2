//! Embedded raster image decoding and PNG normalisation.

use std::io::Cursor;

use image::{DynamicImage, ImageFormat, RgbImage};
use lopdf::{Object, Stream};

use super::backend::{number, stream_content, stream_filters, LopdfBackend};
use crate::error::{Error, Result};

/// Colour model of decoded samples.
#[derive(Debug, Clone, PartialEq)]
enum ColorModel {
    Gray,
    Rgb,
    Cmyk,
    /// Palette of RGB triples indexed by sample value
    Indexed(Vec<[u8; 3]>),
}

impl ColorModel {
    fn components(&self) -> usize {
        match self {
            ColorModel::Gray | ColorModel::Indexed(_) => 1,
            ColorModel::Rgb => 3,
            ColorModel::Cmyk => 4,
        }
    }
}

/// Decode an image XObject into an RGB image.
///
/// Alpha (soft masks) is dropped and CMYK is converted, so every result is
/// plain 8-bit RGB.
pub fn decode_image(backend: &LopdfBackend, stream: &Stream) -> Result<RgbImage> {
    let filters = stream_filters(stream);
    match filters.last().map(String::as_str) {
        Some("DCTDecode") => {
            let data = if filters.len() > 1 {
                // Lossless filters applied on top of the JPEG data
                let mut outer = stream.clone();
                outer.dict.set(
                    "Filter",
                    Object::Array(
                        filters[..filters.len() - 1]
                            .iter()
                            .map(|f| Object::Name(f.as_bytes().to_vec()))
                            .collect(),
                    ),
                );
                stream_content(&outer)?
            } else {
                stream.content.clone()
            };
            let img = image::load_from_memory_with_format(&data, ImageFormat::Jpeg)?;
            Ok(img.to_rgb8())
        }
        Some(other @ ("JPXDecode" | "JBIG2Decode" | "CCITTFaxDecode")) => Err(
            Error::ImageExtract(format!("unsupported image filter {other}")),
        ),
        _ => decode_samples(backend, stream),
    }
}

/// Encode an image as PNG.
pub fn encode_png(img: &RgbImage) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    DynamicImage::ImageRgb8(img.clone()).write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)?;
    Ok(buffer)
}

fn decode_samples(backend: &LopdfBackend, stream: &Stream) -> Result<RgbImage> {
    let dict = &stream.dict;
    let int = |key: &[u8]| {
        dict.get(key)
            .ok()
            .and_then(|o| number(backend.resolve(o)))
            .map(|v| v as u32)
    };

    let width = int(b"Width").filter(|w| *w > 0);
    let height = int(b"Height").filter(|h| *h > 0);
    let (Some(width), Some(height)) = (width, height) else {
        return Err(Error::ImageExtract("image without dimensions".to_string()));
    };

    let is_mask = matches!(dict.get(b"ImageMask"), Ok(Object::Boolean(true)));
    let bits = if is_mask {
        1
    } else {
        int(b"BitsPerComponent").unwrap_or(8)
    };
    let model = if is_mask {
        ColorModel::Gray
    } else {
        dict.get(b"ColorSpace")
            .map(|cs| color_model(backend, cs))
            .unwrap_or(ColorModel::Rgb)
    };

    let data = stream_content(stream)?;
    let components = model.components();
    let samples = unpack_samples(&data, width as usize, height as usize, components, bits)?;

    let mut rgb = Vec::with_capacity(width as usize * height as usize * 3);
    let max = ((1u32 << bits.min(8)) - 1) as f32;
    let scale = |v: u8| {
        if bits >= 8 {
            v
        } else {
            (v as f32 * 255.0 / max).round() as u8
        }
    };

    for pixel in samples.chunks_exact(components) {
        match &model {
            ColorModel::Gray => {
                // Mask samples of 0 are painted (black).
                let v = if is_mask && pixel[0] != 0 {
                    255
                } else {
                    scale(pixel[0])
                };
                rgb.extend_from_slice(&[v, v, v]);
            }
            ColorModel::Rgb => rgb.extend(pixel.iter().map(|&v| scale(v))),
            ColorModel::Cmyk => {
                let [c, m, y, k] = [pixel[0], pixel[1], pixel[2], pixel[3]].map(|v| scale(v) as f32 / 255.0);
                rgb.extend_from_slice(&[
                    ((1.0 - c) * (1.0 - k) * 255.0).round() as u8,
                    ((1.0 - m) * (1.0 - k) * 255.0).round() as u8,
                    ((1.0 - y) * (1.0 - k) * 255.0).round() as u8,
                ]);
            }
            ColorModel::Indexed(palette) => {
                let entry = palette.get(pixel[0] as usize).copied().unwrap_or([0, 0, 0]);
                rgb.extend_from_slice(&entry);
            }
        }
    }

    RgbImage::from_raw(width, height, rgb)
        .ok_or_else(|| Error::ImageExtract("image data does not match dimensions".to_string()))
}

/// Unpack rows of `bits`-wide samples into one byte per sample.
fn unpack_samples(
    data: &[u8],
    width: usize,
    height: usize,
    components: usize,
    bits: u32,
) -> Result<Vec<u8>> {
    if !matches!(bits, 1 | 2 | 4 | 8 | 16) {
        return Err(Error::ImageExtract(format!(
            "unsupported bits per component: {bits}"
        )));
    }
    let per_row = width * components;
    let row_bytes = (per_row * bits as usize).div_ceil(8);
    let needed = row_bytes.checked_mul(height).filter(|n| *n > 0);
    let Some(needed) = needed else {
        return Err(Error::ImageExtract(format!(
            "invalid image geometry: {}x{} with {} components",
            width, height, components
        )));
    };
    if data.len() < needed {
        return Err(Error::ImageExtract(format!(
            "image data too short: {} bytes for {}x{}",
            data.len(),
            width,
            height
        )));
    }

    let mut samples = Vec::with_capacity(per_row * height);
    for row in data.chunks_exact(row_bytes).take(height) {
        match bits {
            8 => samples.extend_from_slice(&row[..per_row]),
            // Keep the high byte of 16-bit samples.
            16 => samples.extend(row.chunks_exact(2).take(per_row).map(|p| p[0])),
            // 1, 2 or 4 bits, packed from the high bit.
            _ => {
                let per_byte = 8 / bits as usize;
                let mask = (1u8 << bits) - 1;
                for i in 0..per_row {
                    let byte = row[i / per_byte];
                    let shift = 8 - bits as usize * (i % per_byte + 1);
                    samples.push((byte >> shift) & mask);
                }
            }
        }
    }
    Ok(samples)
}

fn color_model(backend: &LopdfBackend, cs: &Object) -> ColorModel {
    match backend.resolve(cs) {
        Object::Name(name) => match name.as_slice() {
            b"DeviceGray" | b"CalGray" | b"G" => ColorModel::Gray,
            b"DeviceCMYK" | b"CMYK" => ColorModel::Cmyk,
            _ => ColorModel::Rgb,
        },
        Object::Array(items) => {
            let family = items.first().and_then(|o| o.as_name_str().ok());
            match family {
                Some("ICCBased") => {
                    let n = items
                        .get(1)
                        .and_then(|o| backend.resolve_dict(o))
                        .and_then(|d| d.get(b"N").ok())
                        .and_then(number)
                        .unwrap_or(3.0) as usize;
                    match n {
                        1 => ColorModel::Gray,
                        4 => ColorModel::Cmyk,
                        _ => ColorModel::Rgb,
                    }
                }
                Some("Indexed" | "I") => indexed_palette(backend, items),
                Some("CalRGB" | "Lab") => ColorModel::Rgb,
                Some("CalGray") => ColorModel::Gray,
                Some("Separation" | "DeviceN") => ColorModel::Gray,
                _ => ColorModel::Rgb,
            }
        }
        _ => ColorModel::Rgb,
    }
}

fn indexed_palette(backend: &LopdfBackend, items: &[Object]) -> ColorModel {
    let base = items
        .get(1)
        .map(|o| color_model(backend, o))
        .unwrap_or(ColorModel::Rgb);
    let lookup: Vec<u8> = match items.get(3).map(|o| backend.resolve(o)) {
        Some(Object::String(bytes, _)) => bytes.clone(),
        Some(Object::Stream(s)) => stream_content(s).unwrap_or_default(),
        _ => Vec::new(),
    };

    let palette = match base {
        ColorModel::Gray => lookup.iter().map(|&v| [v, v, v]).collect(),
        ColorModel::Cmyk => lookup
            .chunks_exact(4)
            .map(|p| {
                let [c, m, y, k] = [p[0], p[1], p[2], p[3]].map(|v| v as f32 / 255.0);
                [
                    ((1.0 - c) * (1.0 - k) * 255.0).round() as u8,
                    ((1.0 - m) * (1.0 - k) * 255.0).round() as u8,
                    ((1.0 - y) * (1.0 - k) * 255.0).round() as u8,
                ]
            })
            .collect(),
        _ => lookup.chunks_exact(3).map(|p| [p[0], p[1], p[2]]).collect(),
    };
    ColorModel::Indexed(palette)
}
