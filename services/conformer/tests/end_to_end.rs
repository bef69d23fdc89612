//! Full-flow test composing the mosaic and conformance crates the way
//! the service binary drives them.

use conformance::ConformancePipeline;
use geotiff::RasterDataset;
use mosaic::build_mosaics;
use raster_common::{
    variable_stem, BandLimits, ConformanceSchema, CrsCode, ExpectedVariableSet, RasterError,
    EXPECTED_VARIABLES,
};
use test_utils::{write_test_raster, RasterSpec};

fn schema() -> ConformanceSchema {
    ConformanceSchema {
        coordinate_reference_system: 4326,
        spatial_resolution: (0.0, 0.0),
        number_of_bands: BandLimits { max: 3 },
        default_crs: 4326,
    }
}

#[test]
fn test_full_working_set_mosaics_and_conforms() {
    let root = tempfile::tempdir().unwrap();
    let tile_a = root.path().join("tile_a");
    let tile_b = root.path().join("tile_b");
    std::fs::create_dir_all(&tile_a).unwrap();
    std::fs::create_dir_all(&tile_b).unwrap();

    // agb is split across two adjacent tiles; every other variable is a
    // single fragment, one of them without a declared CRS.
    let base = RasterSpec {
        width: 4,
        height: 4,
        ..RasterSpec::default()
    };
    write_test_raster(&tile_a.join("agb.tif"), &base);
    write_test_raster(
        &tile_b.join("agb.tif"),
        &RasterSpec {
            origin: (-1.96, 54.0),
            ..base.clone()
        },
    );
    for name in EXPECTED_VARIABLES.iter().filter(|&&n| n != "agb") {
        let spec = if *name == "ele" {
            RasterSpec {
                crs: None,
                ..base.clone()
            }
        } else {
            base.clone()
        };
        write_test_raster(&tile_a.join(format!("{}.tif", name)), &spec);
    }

    let mosaic_dir = root.path().join("lidar_raster");
    let mosaics = build_mosaics(&[tile_a, tile_b], &mosaic_dir).unwrap();
    assert_eq!(mosaics.len(), EXPECTED_VARIABLES.len());

    // Bootstrap the CRS-less mosaic, as the service does before validation.
    let schema = schema();
    for path in &mosaics {
        let descriptor = geotiff::read_descriptor(path).unwrap();
        if descriptor.crs.is_none() {
            let mut dataset = RasterDataset::open(path).unwrap();
            dataset.set_crs(schema.bootstrap_crs().unwrap());
            dataset.write_to(path).unwrap();
        }
    }

    // Learn the target resolution from the first mosaic.
    let reference = geotiff::read_descriptor(&mosaics[0]).unwrap();
    let schema = schema.with_resolution(reference.resolution());
    assert_eq!(schema.spatial_resolution, (0.01, 0.01));

    let stems: Vec<String> = mosaics.iter().filter_map(|p| variable_stem(p)).collect();
    ExpectedVariableSet::default().check(&stems).unwrap();

    let pipeline = ConformancePipeline::new(schema, 0.0).unwrap();
    let reports = pipeline.run_directory(&mosaic_dir).unwrap();
    assert_eq!(reports.len(), EXPECTED_VARIABLES.len());
    assert!(reports.iter().all(|r| r.accepted()));

    // The split variable came out as one union-extent raster.
    let agb = geotiff::read_descriptor(&mosaic_dir.join("agb.tif")).unwrap();
    assert_eq!((agb.width, agb.height), (8, 4));
    assert_eq!(agb.crs, Some(CrsCode::Epsg4326));
}

#[test]
fn test_incomplete_working_set_rejected_before_validation() {
    let root = tempfile::tempdir().unwrap();
    let tile = root.path().join("tile");
    std::fs::create_dir_all(&tile).unwrap();

    for name in ["agb", "ele", "int"] {
        write_test_raster(&tile.join(format!("{}.tif", name)), &RasterSpec::default());
    }

    let mosaic_dir = root.path().join("lidar_raster");
    let mosaics = build_mosaics(&[tile], &mosaic_dir).unwrap();
    let stems: Vec<String> = mosaics.iter().filter_map(|p| variable_stem(p)).collect();

    let err = ExpectedVariableSet::default().check(&stems).unwrap_err();
    match err {
        RasterError::VariableSetMismatch { missing, extra } => {
            assert_eq!(missing.len(), EXPECTED_VARIABLES.len() - 3);
            assert!(extra.is_empty());
        }
        other => panic!("unexpected error {other:?}"),
    }
}
