use crate::archive::{unpack_zip, Workspace};
use crate::util;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{error, info, warn};

pub const CORES_PATTERN: &str = "@CORES@";
pub const SOLUTION_PATTERN: &str = "@SOL_NUMBER@";
pub const INDEX_PATTERN: &str = "@INDEX@";

const XCLBIN_SUBDIR: &str = "archive/project/bin/xclbin";

/// Output of the partition solver: which core-count/solution pairs map onto
/// which unique hardware partition.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlacementMap {
    pub count: u64,
    pub solutions: Vec<Solution>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct Solution {
    pub cores: u64,
    pub index: u64,
    pub hash_index: u64,
}

impl PlacementMap {
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("read mapping {}", path.display()))?;
        serde_json::from_str(&raw).with_context(|| format!("parse mapping {}", path.display()))
    }
}

/// Copies the xclbin directory of each solution's artifact archive into its
/// multicore binary directory. Archives shared by several solutions are
/// unpacked once. Returns the number of solutions placed.
pub fn place_artifacts(
    map: &PlacementMap,
    bin_pattern: &str,
    artifact_pattern: &str,
) -> Result<u64> {
    info!(count = map.count, "placing solutions");
    let workspace = Workspace::create(Path::new("."))?;
    let mut unpacked: HashMap<u64, PathBuf> = HashMap::new();
    let mut placed = 0u64;
    for sol in &map.solutions {
        match place_one(sol, bin_pattern, artifact_pattern, &workspace, &mut unpacked) {
            Ok(true) => placed += 1,
            Ok(false) => {}
            Err(err) => {
                error!(
                    solution = sol.index,
                    cores = sol.cores,
                    error = %format!("{err:#}"),
                    "placement failed"
                );
            }
        }
    }
    Ok(placed)
}

fn place_one(
    sol: &Solution,
    bin_pattern: &str,
    artifact_pattern: &str,
    workspace: &Workspace,
    unpacked: &mut HashMap<u64, PathBuf>,
) -> Result<bool> {
    let bin_dir = bin_pattern
        .replace(CORES_PATTERN, &sol.cores.to_string())
        .replace(SOLUTION_PATTERN, &sol.index.to_string());
    let artifact =
        PathBuf::from(artifact_pattern.replace(INDEX_PATTERN, &sol.hash_index.to_string()));
    info!(
        cores = sol.cores,
        solution = sol.index,
        bin = %bin_dir,
        artifact = %artifact.display(),
        "placing solution"
    );
    if !artifact.is_file() {
        warn!(artifact = %artifact.display(), "artifact archive missing, skipping copy");
        return Ok(false);
    }
    let extract_dir = match unpacked.get(&sol.hash_index) {
        Some(dir) => dir.clone(),
        None => {
            let dir = workspace.path().join(sol.hash_index.to_string());
            util::ensure_dir(&dir)?;
            info!(dest = %dir.display(), "extracting artifacts");
            unpack_zip(&artifact, &dir)?;
            unpacked.insert(sol.hash_index, dir.clone());
            dir
        }
    };
    let src = extract_dir.join(XCLBIN_SUBDIR);
    let dst = Path::new(&bin_dir).join("xclbin");
    if dst.exists() {
        info!(dst = %dst.display(), "overwriting existing files");
        std::fs::remove_dir_all(&dst).with_context(|| format!("remove {}", dst.display()))?;
    }
    util::copy_dir_all(&src, &dst)?;
    Ok(true)
}
