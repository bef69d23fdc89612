//! TIFF/GeoTIFF decoding for the supported subset.
//!
//! Accepts both byte orders, chunky and planar sample layouts, and any
//! strip partitioning, but only uncompressed IEEE float32 samples. Any
//! layout outside the subset is a `RasterIo` error naming the file.

use crate::tags::*;
use raster_common::{CrsCode, GeoTransform, RasterError, RasterResult};
use std::collections::HashMap;
use std::path::Path;

/// Everything decoded from a raster file. `bands` is `None` when only
/// the metadata was requested.
#[derive(Debug)]
pub(crate) struct DecodedTiff {
    pub width: usize,
    pub height: usize,
    pub band_count: usize,
    pub crs: Option<CrsCode>,
    pub transform: GeoTransform,
    pub nodata: Option<f64>,
    pub bands: Option<Vec<Vec<f32>>>,
}

/// Decode a TIFF byte buffer. `read_pixels` controls whether strip data
/// is materialized or only the directory is parsed.
pub(crate) fn decode(path: &Path, bytes: &[u8], read_pixels: bool) -> RasterResult<DecodedTiff> {
    let err = |message: String| RasterError::raster_io(path, message);

    let reader = ByteReader::new(bytes).map_err(err)?;
    let ifd = reader.read_ifd().map_err(err)?;

    let width = ifd.required_scalar(TAG_IMAGE_WIDTH, "ImageWidth").map_err(err)? as usize;
    let height = ifd
        .required_scalar(TAG_IMAGE_LENGTH, "ImageLength")
        .map_err(err)? as usize;
    let band_count = ifd.scalar(TAG_SAMPLES_PER_PIXEL).unwrap_or(1) as usize;

    if width == 0 || height == 0 || band_count == 0 {
        return Err(err(format!(
            "invalid dimensions {}x{} with {} bands",
            width, height, band_count
        )));
    }

    let compression = ifd.scalar(TAG_COMPRESSION).unwrap_or(COMPRESSION_NONE);
    if compression != COMPRESSION_NONE {
        return Err(err(format!("unsupported compression {}", compression)));
    }

    if let Some(bits) = ifd.numeric(TAG_BITS_PER_SAMPLE) {
        if bits.iter().any(|&b| b != 32) {
            return Err(err(format!("unsupported bits per sample {:?}", bits)));
        }
    }
    let formats = ifd
        .numeric(TAG_SAMPLE_FORMAT)
        .unwrap_or_else(|| vec![1; band_count]);
    if formats.iter().any(|&f| f != SAMPLE_FORMAT_IEEE_FLOAT) {
        return Err(err("only IEEE float32 samples are supported".to_string()));
    }

    let transform = read_transform(&ifd).map_err(err)?;
    let crs = read_crs(&ifd)?;
    let nodata = read_nodata(&ifd).map_err(err)?;

    let bands = if read_pixels {
        Some(read_bands(&reader, &ifd, width, height, band_count).map_err(err)?)
    } else {
        None
    };

    Ok(DecodedTiff {
        width,
        height,
        band_count,
        crs,
        transform,
        nodata,
        bands,
    })
}

/// Georeferencing from the pixel-scale and tiepoint tags.
fn read_transform(ifd: &Ifd) -> Result<GeoTransform, String> {
    let scale = ifd
        .doubles(TAG_MODEL_PIXEL_SCALE)
        .ok_or_else(|| "missing ModelPixelScale tag".to_string())?;
    let tiepoint = ifd
        .doubles(TAG_MODEL_TIEPOINT)
        .ok_or_else(|| "missing ModelTiepoint tag".to_string())?;

    if scale.len() < 2 || tiepoint.len() < 6 {
        return Err("truncated georeferencing tags".to_string());
    }
    let (sx, sy) = (scale[0], scale[1]);
    if !(sx > 0.0 && sy > 0.0 && sx.is_finite() && sy.is_finite()) {
        return Err(format!("invalid pixel scale ({}, {})", sx, sy));
    }

    // Tiepoint maps raster position (i, j) to world position (x, y).
    let origin_x = tiepoint[3] - tiepoint[0] * sx;
    let origin_y = tiepoint[4] + tiepoint[1] * sy;
    Ok(GeoTransform::from_origin(origin_x, origin_y, sx, sy))
}

/// EPSG code from the GeoKey directory, if present.
fn read_crs(ifd: &Ifd) -> RasterResult<Option<CrsCode>> {
    let keys = match ifd.numeric(TAG_GEO_KEY_DIRECTORY) {
        Some(keys) => keys,
        None => return Ok(None),
    };
    if keys.len() < 4 {
        return Ok(None);
    }

    let num_keys = keys[3] as usize;
    for k in 0..num_keys {
        let base = 4 + k * 4;
        if base + 3 >= keys.len() {
            break;
        }
        let (id, location, value) = (keys[base], keys[base + 1], keys[base + 3]);
        if location == 0 && (id == KEY_GEOGRAPHIC_TYPE as u64 || id == KEY_PROJECTED_CS_TYPE as u64)
        {
            return Ok(Some(CrsCode::from_epsg(value as u32)?));
        }
    }
    Ok(None)
}

/// Nodata sentinel from the GDAL ASCII tag, if present.
fn read_nodata(ifd: &Ifd) -> Result<Option<f64>, String> {
    let raw = match ifd.ascii(TAG_GDAL_NODATA) {
        Some(raw) => raw,
        None => return Ok(None),
    };
    let trimmed = raw.trim_matches(|c: char| c == '\0' || c.is_whitespace());
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<f64>()
        .map(Some)
        .map_err(|_| format!("unparsable nodata value '{}'", trimmed))
}

/// Materialize pixel data as one `Vec<f32>` per band, row-major.
fn read_bands(
    reader: &ByteReader<'_>,
    ifd: &Ifd,
    width: usize,
    height: usize,
    band_count: usize,
) -> Result<Vec<Vec<f32>>, String> {
    let offsets = ifd
        .numeric(TAG_STRIP_OFFSETS)
        .ok_or_else(|| "missing StripOffsets".to_string())?;
    let counts = ifd
        .numeric(TAG_STRIP_BYTE_COUNTS)
        .ok_or_else(|| "missing StripByteCounts".to_string())?;
    if offsets.len() != counts.len() {
        return Err("strip offset/count mismatch".to_string());
    }

    let planar = ifd.scalar(TAG_PLANAR_CONFIGURATION).unwrap_or(PLANAR_CHUNKY);
    if planar != PLANAR_CHUNKY && planar != PLANAR_SEPARATE {
        return Err(format!("unsupported planar configuration {}", planar));
    }

    let rows_per_strip = ifd
        .scalar(TAG_ROWS_PER_STRIP)
        .unwrap_or(height as u64)
        .max(1) as usize;
    let strips_per_band = height.div_ceil(rows_per_strip);

    let expected_strips = if planar == PLANAR_SEPARATE {
        strips_per_band * band_count
    } else {
        strips_per_band
    };
    if offsets.len() != expected_strips {
        return Err(format!(
            "expected {} strips, found {}",
            expected_strips,
            offsets.len()
        ));
    }

    let pixels = width * height;
    let mut bands = vec![Vec::with_capacity(pixels); band_count];

    for (strip, (&offset, &count)) in offsets.iter().zip(counts.iter()).enumerate() {
        let values = reader.read_f32_run(offset as usize, count as usize)?;

        if planar == PLANAR_SEPARATE {
            let band = strip / strips_per_band;
            bands[band].extend_from_slice(&values);
        } else {
            // Chunky layout interleaves samples per pixel.
            for (i, value) in values.iter().enumerate() {
                let band = i % band_count;
                bands[band].push(*value);
            }
        }
    }

    for (i, band) in bands.iter().enumerate() {
        if band.len() != pixels {
            return Err(format!(
                "band {} has {} samples, expected {}",
                i,
                band.len(),
                pixels
            ));
        }
    }
    Ok(bands)
}

/// One parsed IFD entry with its raw value bytes resolved.
struct IfdEntry {
    field_type: u16,
    values: Vec<u8>,
    le: bool,
}

/// A parsed image file directory keyed by tag.
struct Ifd {
    entries: HashMap<u16, IfdEntry>,
}

impl Ifd {
    /// All numeric values (SHORT/LONG) of a tag.
    fn numeric(&self, tag: u16) -> Option<Vec<u64>> {
        let entry = self.entries.get(&tag)?;
        let size = type_size(entry.field_type)?;
        let read = |chunk: &[u8]| -> u64 {
            let mut buf = [0u8; 8];
            for (i, b) in chunk.iter().enumerate() {
                buf[if entry.le { i } else { chunk.len() - 1 - i }] = *b;
            }
            u64::from_le_bytes(buf)
        };
        match entry.field_type {
            TYPE_SHORT | TYPE_LONG | 1 => {
                Some(entry.values.chunks_exact(size).map(read).collect())
            }
            _ => None,
        }
    }

    /// DOUBLE values of a tag.
    fn doubles(&self, tag: u16) -> Option<Vec<f64>> {
        let entry = self.entries.get(&tag)?;
        if entry.field_type != TYPE_DOUBLE {
            return None;
        }
        Some(
            entry
                .values
                .chunks_exact(8)
                .map(|chunk| {
                    let mut buf = [0u8; 8];
                    buf.copy_from_slice(chunk);
                    if entry.le {
                        f64::from_le_bytes(buf)
                    } else {
                        f64::from_be_bytes(buf)
                    }
                })
                .collect(),
        )
    }

    /// ASCII value of a tag.
    fn ascii(&self, tag: u16) -> Option<String> {
        let entry = self.entries.get(&tag)?;
        if entry.field_type != TYPE_ASCII {
            return None;
        }
        Some(String::from_utf8_lossy(&entry.values).into_owned())
    }

    /// First numeric value of a tag.
    fn scalar(&self, tag: u16) -> Option<u64> {
        self.numeric(tag)?.first().copied()
    }

    /// First numeric value of a mandatory tag.
    fn required_scalar(&self, tag: u16, name: &str) -> Result<u64, String> {
        self.scalar(tag)
            .ok_or_else(|| format!("missing required tag {}", name))
    }
}

/// Bounds-checked access into the raw file bytes.
struct ByteReader<'a> {
    bytes: &'a [u8],
    le: bool,
    ifd_offset: usize,
}

impl<'a> ByteReader<'a> {
    fn new(bytes: &'a [u8]) -> Result<Self, String> {
        if bytes.len() < 8 {
            return Err("file too small to be a TIFF".to_string());
        }
        let le = match &bytes[0..2] {
            b"II" => true,
            b"MM" => false,
            _ => return Err("not a TIFF file (bad byte-order mark)".to_string()),
        };
        let mut reader = Self {
            bytes,
            le,
            ifd_offset: 0,
        };
        if reader.u16(2)? != 42 {
            return Err("not a TIFF file (bad magic number)".to_string());
        }
        reader.ifd_offset = reader.u32(4)? as usize;
        Ok(reader)
    }

    fn slice(&self, offset: usize, len: usize) -> Result<&'a [u8], String> {
        self.bytes
            .get(offset..offset + len)
            .ok_or_else(|| format!("read past end of file at offset {}", offset))
    }

    fn u16(&self, offset: usize) -> Result<u16, String> {
        let b = self.slice(offset, 2)?;
        Ok(if self.le {
            u16::from_le_bytes([b[0], b[1]])
        } else {
            u16::from_be_bytes([b[0], b[1]])
        })
    }

    fn u32(&self, offset: usize) -> Result<u32, String> {
        let b = self.slice(offset, 4)?;
        let arr = [b[0], b[1], b[2], b[3]];
        Ok(if self.le {
            u32::from_le_bytes(arr)
        } else {
            u32::from_be_bytes(arr)
        })
    }

    /// Parse the first IFD into a tag map, resolving external values.
    fn read_ifd(&self) -> Result<Ifd, String> {
        let count = self.u16(self.ifd_offset)? as usize;
        let mut entries = HashMap::with_capacity(count);

        for i in 0..count {
            let base = self.ifd_offset + 2 + i * 12;
            let tag = self.u16(base)?;
            let field_type = self.u16(base + 2)?;
            let value_count = self.u32(base + 4)? as usize;

            let size = match type_size(field_type) {
                Some(size) => size,
                // Unknown field types are skipped, not fatal.
                None => continue,
            };
            let byte_len = size
                .checked_mul(value_count)
                .ok_or_else(|| format!("tag {} value overflow", tag))?;

            let values = if byte_len <= 4 {
                self.slice(base + 8, byte_len)?.to_vec()
            } else {
                let offset = self.u32(base + 8)? as usize;
                self.slice(offset, byte_len)?.to_vec()
            };

            entries.insert(
                tag,
                IfdEntry {
                    field_type,
                    values,
                    le: self.le,
                },
            );
        }

        Ok(Ifd { entries })
    }

    /// Read a run of contiguous float32 samples.
    fn read_f32_run(&self, offset: usize, byte_count: usize) -> Result<Vec<f32>, String> {
        if byte_count % 4 != 0 {
            return Err(format!("strip byte count {} is not float-aligned", byte_count));
        }
        let raw = self.slice(offset, byte_count)?;
        Ok(raw
            .chunks_exact(4)
            .map(|chunk| {
                let arr = [chunk[0], chunk[1], chunk[2], chunk[3]];
                if self.le {
                    f32::from_le_bytes(arr)
                } else {
                    f32::from_be_bytes(arr)
                }
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster_common::GeoTransform;

    fn encoded_raster() -> Vec<u8> {
        crate::encoder::encode(
            Path::new("test.tif"),
            4,
            3,
            &[vec![1.0; 12]],
            &GeoTransform::from_origin(0.0, 3.0, 1.0, 1.0),
            Some(CrsCode::Epsg4326),
            None,
        )
        .unwrap()
    }

    /// Overwrite the inline SHORT value of an IFD entry in an
    /// encoder-produced (little-endian, single-IFD) buffer.
    fn patch_short_tag(bytes: &mut [u8], tag: u16, value: u16) {
        let count = u16::from_le_bytes([bytes[8], bytes[9]]) as usize;
        for i in 0..count {
            let base = 10 + i * 12;
            if u16::from_le_bytes([bytes[base], bytes[base + 1]]) == tag {
                bytes[base + 8..base + 10].copy_from_slice(&value.to_le_bytes());
                return;
            }
        }
        panic!("tag {} not present in IFD", tag);
    }

    fn decode_err(bytes: &[u8]) -> String {
        match decode(Path::new("test.tif"), bytes, true).unwrap_err() {
            RasterError::RasterIo { message, .. } => message,
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_compressed_data_rejected() {
        let mut bytes = encoded_raster();
        patch_short_tag(&mut bytes, crate::tags::TAG_COMPRESSION, 5);
        assert!(decode_err(&bytes).contains("unsupported compression 5"));
    }

    #[test]
    fn test_non_32bit_samples_rejected() {
        let mut bytes = encoded_raster();
        patch_short_tag(&mut bytes, crate::tags::TAG_BITS_PER_SAMPLE, 16);
        assert!(decode_err(&bytes).contains("bits per sample"));
    }

    #[test]
    fn test_integer_sample_format_rejected() {
        let mut bytes = encoded_raster();
        patch_short_tag(&mut bytes, crate::tags::TAG_SAMPLE_FORMAT, 1);
        assert!(decode_err(&bytes).contains("IEEE float32"));
    }

    #[test]
    fn test_unpatched_buffer_still_decodes() {
        let decoded = decode(Path::new("test.tif"), &encoded_raster(), true).unwrap();
        assert_eq!((decoded.width, decoded.height), (4, 3));
    }
}
