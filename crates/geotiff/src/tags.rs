//! TIFF tag and GeoKey constants for the supported subset.

// Baseline TIFF tags
pub const TAG_IMAGE_WIDTH: u16 = 256;
pub const TAG_IMAGE_LENGTH: u16 = 257;
pub const TAG_BITS_PER_SAMPLE: u16 = 258;
pub const TAG_COMPRESSION: u16 = 259;
pub const TAG_PHOTOMETRIC: u16 = 262;
pub const TAG_STRIP_OFFSETS: u16 = 273;
pub const TAG_SAMPLES_PER_PIXEL: u16 = 277;
pub const TAG_ROWS_PER_STRIP: u16 = 278;
pub const TAG_STRIP_BYTE_COUNTS: u16 = 279;
pub const TAG_PLANAR_CONFIGURATION: u16 = 284;
pub const TAG_SAMPLE_FORMAT: u16 = 339;

// GeoTIFF tags
pub const TAG_MODEL_PIXEL_SCALE: u16 = 33550;
pub const TAG_MODEL_TIEPOINT: u16 = 33922;
pub const TAG_GEO_KEY_DIRECTORY: u16 = 34735;

// GDAL extension
pub const TAG_GDAL_NODATA: u16 = 42113;

// Field types
pub const TYPE_ASCII: u16 = 2;
pub const TYPE_SHORT: u16 = 3;
pub const TYPE_LONG: u16 = 4;
pub const TYPE_DOUBLE: u16 = 12;

// GeoKeys
pub const KEY_GT_MODEL_TYPE: u16 = 1024;
pub const KEY_GT_RASTER_TYPE: u16 = 1025;
pub const KEY_GEOGRAPHIC_TYPE: u16 = 2048;
pub const KEY_PROJECTED_CS_TYPE: u16 = 3072;

pub const MODEL_TYPE_PROJECTED: u16 = 1;
pub const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
pub const RASTER_TYPE_PIXEL_IS_AREA: u16 = 1;

pub const COMPRESSION_NONE: u64 = 1;
pub const SAMPLE_FORMAT_IEEE_FLOAT: u64 = 3;
pub const PLANAR_CHUNKY: u64 = 1;
pub const PLANAR_SEPARATE: u64 = 2;

/// Byte size of one value of a TIFF field type, if supported.
pub fn type_size(field_type: u16) -> Option<usize> {
    match field_type {
        1 | TYPE_ASCII => Some(1),      // BYTE, ASCII
        TYPE_SHORT => Some(2),          // SHORT
        TYPE_LONG => Some(4),           // LONG
        5 => Some(8),                   // RATIONAL
        TYPE_DOUBLE => Some(8),         // DOUBLE
        11 => Some(4),                  // FLOAT
        _ => None,
    }
}
