//! Fragment grouping and per-variable mosaic output.

use crate::merge::merge_fragments;
use raster_common::{files, RasterError, RasterResult};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// One logical variable and the ordered fragments that make it up.
///
/// The group key is the lowercased filename stem, so `AGB.tif` and
/// `agb.TIF` in different tile directories belong to the same group.
#[derive(Debug, Clone)]
pub struct VariableGroup {
    pub name: String,
    pub fragments: Vec<PathBuf>,
}

/// Enumerate raster files across `source_dirs` and group them by
/// logical variable name.
///
/// Fragment order within a group follows the order of the source
/// directories, with files sorted by name inside each directory. A
/// directory that cannot be listed is a fatal `DirectoryAccess` error;
/// a directory with no raster files contributes nothing and is only
/// logged.
pub fn collect_groups(source_dirs: &[PathBuf]) -> RasterResult<Vec<VariableGroup>> {
    let mut groups: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

    for dir in source_dirs {
        let paths = files::list_raster_files(dir)?;
        if paths.is_empty() {
            warn!(dir = %dir.display(), "no raster files found in directory");
            continue;
        }
        for path in paths {
            let stem = match files::variable_stem(&path) {
                Some(stem) => stem,
                None => continue,
            };
            groups.entry(stem).or_default().push(path);
        }
    }

    Ok(groups
        .into_iter()
        .map(|(name, fragments)| VariableGroup { name, fragments })
        .collect())
}

/// Produce exactly one raster per distinct variable name under `dest_dir`.
///
/// Single-fragment groups are copied byte-for-byte; multi-fragment
/// groups are merged. Merge output goes through a temp file and rename,
/// so a failed merge leaves no partial destination.
pub fn build_mosaics(source_dirs: &[PathBuf], dest_dir: &Path) -> RasterResult<Vec<PathBuf>> {
    std::fs::create_dir_all(dest_dir)
        .map_err(|source| RasterError::directory_access(dest_dir, source))?;

    let groups = collect_groups(source_dirs)?;
    let mut outputs = Vec::with_capacity(groups.len());

    for group in groups {
        let dest = dest_dir.join(format!("{}.tif", group.name));

        if group.fragments.len() == 1 {
            let src = &group.fragments[0];
            std::fs::copy(src, &dest).map_err(|e| {
                RasterError::raster_io(src, format!("cannot copy fragment: {}", e))
            })?;
            info!(variable = %group.name, "single fragment copied through");
        } else {
            let merged = merge_fragments(&group.fragments)?;
            merged.write_to(&dest)?;
            info!(
                variable = %group.name,
                fragments = group.fragments.len(),
                "fragments merged"
            );
        }

        outputs.push(dest);
    }

    info!(variables = outputs.len(), dest = %dest_dir.display(), "mosaic build complete");
    Ok(outputs)
}
