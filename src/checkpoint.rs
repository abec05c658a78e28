//! Parameter and statistics checkpointing
//!
//! Training snapshots the model parameters together with the loss history so
//! an interrupted run can resume from the recorded step. Snapshots are
//! bincode-serialized to a single file that is atomically overwritten on each
//! save.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};

/// Checkpoint file name inside the checkpoint directory.
const CHECKPOINT_FILE: &str = "pixelcnn.ckpt";

/// Parameters of one layer, in model layer order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayerState {
    /// Convolution weights, flat `[out_c][in_c][ky][kx]` layout.
    pub weights: Vec<f32>,
    /// Bias per output channel.
    pub biases: Vec<f32>,
}

/// A full training snapshot: parameters plus scalar statistics.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Checkpoint {
    /// Training step at which this snapshot was taken; resumption restarts
    /// from `step + 1`.
    pub step: usize,
    /// Per-layer parameter tensors, in model layer order.
    pub layers: Vec<LayerState>,
    /// Average train loss recorded at each test interval.
    pub train_losses: Vec<f32>,
    /// Average test loss recorded at each test interval.
    pub test_losses: Vec<f32>,
}

/// Persist a checkpoint under `dir`, creating the directory if needed.
///
/// Writes to a temporary file first and renames it into place, so a crash
/// mid-write never clobbers the previous snapshot. Returns the path written.
pub fn save_checkpoint(dir: &Path, checkpoint: &Checkpoint) -> Result<PathBuf, Box<dyn Error>> {
    fs::create_dir_all(dir)?;
    let path = dir.join(CHECKPOINT_FILE);
    let tmp = dir.join(format!("{}.tmp", CHECKPOINT_FILE));

    let file = File::create(&tmp)?;
    let mut writer = BufWriter::new(file);
    bincode::serialize_into(&mut writer, checkpoint)?;
    drop(writer);
    fs::rename(&tmp, &path)?;

    Ok(path)
}

/// Load the checkpoint under `dir`, if one exists.
///
/// Returns `Ok(None)` when no snapshot file is present (a fresh run), and an
/// error only for unreadable or undecodable files.
pub fn load_checkpoint(dir: &Path) -> Result<Option<Checkpoint>, Box<dyn Error>> {
    let path = dir.join(CHECKPOINT_FILE);
    if !path.exists() {
        return Ok(None);
    }

    let file = File::open(&path)?;
    let reader = BufReader::new(file);
    let checkpoint = bincode::deserialize_from(reader)?;
    Ok(Some(checkpoint))
}
