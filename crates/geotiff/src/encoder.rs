//! GeoTIFF encoding.
//!
//! Always writes little-endian, uncompressed float32 samples, one strip
//! per band (planar layout), with pixel-scale/tiepoint georeferencing,
//! an optional GeoKey EPSG entry, and an optional GDAL nodata tag.

use crate::tags::*;
use raster_common::{CrsCode, GeoTransform, RasterError, RasterResult};
use std::path::Path;

/// Encode a raster into a complete TIFF byte buffer.
pub(crate) fn encode(
    path: &Path,
    width: usize,
    height: usize,
    bands: &[Vec<f32>],
    transform: &GeoTransform,
    crs: Option<CrsCode>,
    nodata: Option<f64>,
) -> RasterResult<Vec<u8>> {
    if width == 0 || height == 0 || bands.is_empty() {
        return Err(RasterError::raster_io(
            path,
            format!("cannot encode empty raster {}x{}x{}", width, height, bands.len()),
        ));
    }
    for (i, band) in bands.iter().enumerate() {
        if band.len() != width * height {
            return Err(RasterError::raster_io(
                path,
                format!(
                    "band {} has {} samples, expected {}",
                    i,
                    band.len(),
                    width * height
                ),
            ));
        }
    }
    if !transform.is_north_up() {
        return Err(RasterError::raster_io(
            path,
            "only north-up transforms can be encoded".to_string(),
        ));
    }

    let band_count = bands.len();
    let (xres, yres) = transform.resolution();
    let (origin_x, origin_y) = transform.origin();

    let mut entries: Vec<(u16, FieldData)> = vec![
        (TAG_IMAGE_WIDTH, FieldData::Longs(vec![width as u32])),
        (TAG_IMAGE_LENGTH, FieldData::Longs(vec![height as u32])),
        (
            TAG_BITS_PER_SAMPLE,
            FieldData::Shorts(vec![32; band_count]),
        ),
        (
            TAG_COMPRESSION,
            FieldData::Shorts(vec![COMPRESSION_NONE as u16]),
        ),
        (TAG_PHOTOMETRIC, FieldData::Shorts(vec![1])),
        // Strip offsets are patched once the data area is laid out.
        (TAG_STRIP_OFFSETS, FieldData::Longs(vec![0; band_count])),
        (
            TAG_SAMPLES_PER_PIXEL,
            FieldData::Shorts(vec![band_count as u16]),
        ),
        (TAG_ROWS_PER_STRIP, FieldData::Longs(vec![height as u32])),
        (
            TAG_STRIP_BYTE_COUNTS,
            FieldData::Longs(vec![(width * height * 4) as u32; band_count]),
        ),
        (
            TAG_PLANAR_CONFIGURATION,
            FieldData::Shorts(vec![if band_count > 1 {
                PLANAR_SEPARATE as u16
            } else {
                PLANAR_CHUNKY as u16
            }]),
        ),
        (
            TAG_SAMPLE_FORMAT,
            FieldData::Shorts(vec![SAMPLE_FORMAT_IEEE_FLOAT as u16; band_count]),
        ),
        (
            TAG_MODEL_PIXEL_SCALE,
            FieldData::Doubles(vec![xres, yres, 0.0]),
        ),
        (
            TAG_MODEL_TIEPOINT,
            FieldData::Doubles(vec![0.0, 0.0, 0.0, origin_x, origin_y, 0.0]),
        ),
    ];

    if let Some(crs) = crs {
        entries.push((TAG_GEO_KEY_DIRECTORY, FieldData::Shorts(geo_keys(crs))));
    }
    if let Some(nodata) = nodata {
        let mut ascii = format!("{}", nodata).into_bytes();
        ascii.push(0);
        entries.push((TAG_GDAL_NODATA, FieldData::Ascii(ascii)));
    }

    // Layout: header, IFD, external tag values, then strip data.
    let n = entries.len();
    let ifd_start = 8usize;
    let ifd_len = 2 + n * 12 + 4;

    let mut cursor = ifd_start + ifd_len;
    let mut external_offsets: Vec<Option<usize>> = vec![None; n];
    for (i, (_, data)) in entries.iter().enumerate() {
        let len = data.byte_len();
        if len > 4 {
            if cursor % 2 == 1 {
                cursor += 1;
            }
            external_offsets[i] = Some(cursor);
            cursor += len;
        }
    }

    let mut strip_start = cursor;
    if strip_start % 4 != 0 {
        strip_start += 4 - strip_start % 4;
    }
    let band_bytes = width * height * 4;
    if let Some((_, data)) = entries.iter_mut().find(|(tag, _)| *tag == TAG_STRIP_OFFSETS) {
        *data = FieldData::Longs(
            (0..band_count)
                .map(|b| (strip_start + b * band_bytes) as u32)
                .collect(),
        );
    }

    let total = strip_start + band_count * band_bytes;
    let mut out = Vec::with_capacity(total);

    // Header
    out.extend_from_slice(b"II");
    out.extend_from_slice(&42u16.to_le_bytes());
    out.extend_from_slice(&(ifd_start as u32).to_le_bytes());

    // IFD
    out.extend_from_slice(&(n as u16).to_le_bytes());
    for (i, (tag, data)) in entries.iter().enumerate() {
        out.extend_from_slice(&tag.to_le_bytes());
        out.extend_from_slice(&data.field_type().to_le_bytes());
        out.extend_from_slice(&(data.count() as u32).to_le_bytes());
        match external_offsets[i] {
            Some(offset) => out.extend_from_slice(&(offset as u32).to_le_bytes()),
            None => {
                let mut inline = data.to_bytes();
                inline.resize(4, 0);
                out.extend_from_slice(&inline);
            }
        }
    }
    out.extend_from_slice(&0u32.to_le_bytes()); // no further IFDs

    // External tag values
    for (i, (_, data)) in entries.iter().enumerate() {
        if let Some(offset) = external_offsets[i] {
            while out.len() < offset {
                out.push(0);
            }
            out.extend_from_slice(&data.to_bytes());
        }
    }

    // Strip data, one strip per band
    while out.len() < strip_start {
        out.push(0);
    }
    for band in bands {
        for value in band {
            out.extend_from_slice(&value.to_le_bytes());
        }
    }

    Ok(out)
}

/// GeoKey directory declaring the raster's EPSG code.
fn geo_keys(crs: CrsCode) -> Vec<u16> {
    let (model_type, key_id) = if crs.is_geographic() {
        (MODEL_TYPE_GEOGRAPHIC, KEY_GEOGRAPHIC_TYPE)
    } else {
        (MODEL_TYPE_PROJECTED, KEY_PROJECTED_CS_TYPE)
    };
    vec![
        1,
        1,
        0,
        3, // directory header: version 1.1, three keys
        KEY_GT_MODEL_TYPE,
        0,
        1,
        model_type,
        KEY_GT_RASTER_TYPE,
        0,
        1,
        RASTER_TYPE_PIXEL_IS_AREA,
        key_id,
        0,
        1,
        crs.epsg() as u16,
    ]
}

/// Typed tag payload with its TIFF wire representation.
enum FieldData {
    Shorts(Vec<u16>),
    Longs(Vec<u32>),
    Doubles(Vec<f64>),
    Ascii(Vec<u8>),
}

impl FieldData {
    fn field_type(&self) -> u16 {
        match self {
            FieldData::Shorts(_) => TYPE_SHORT,
            FieldData::Longs(_) => TYPE_LONG,
            FieldData::Doubles(_) => TYPE_DOUBLE,
            FieldData::Ascii(_) => TYPE_ASCII,
        }
    }

    fn count(&self) -> usize {
        match self {
            FieldData::Shorts(v) => v.len(),
            FieldData::Longs(v) => v.len(),
            FieldData::Doubles(v) => v.len(),
            FieldData::Ascii(v) => v.len(),
        }
    }

    fn byte_len(&self) -> usize {
        match self {
            FieldData::Shorts(v) => v.len() * 2,
            FieldData::Longs(v) => v.len() * 4,
            FieldData::Doubles(v) => v.len() * 8,
            FieldData::Ascii(v) => v.len(),
        }
    }

    fn to_bytes(&self) -> Vec<u8> {
        match self {
            FieldData::Shorts(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            FieldData::Longs(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            FieldData::Doubles(v) => v.iter().flat_map(|x| x.to_le_bytes()).collect(),
            FieldData::Ascii(v) => v.clone(),
        }
    }
}
