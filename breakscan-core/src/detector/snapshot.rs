//! Detector snapshot persistence.
//!
//! The snapshot is a single bincode blob holding everything needed to resume
//! a live detector: the bar history, the active peak set, the id counter,
//! the breakout log, and the exact configuration that produced the state.
//! Writes go to a `.tmp` sibling and are renamed into place so a crash can
//! at worst leave a stale-but-consistent file. A small JSON sidecar carries
//! human-readable metadata.

use std::fs;
use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::domain::{BarSeries, BreakoutRecord, Peak, PeakIdGen};

use super::config::DetectorConfig;
use super::Detector;

/// Persistence failure. Non-fatal by contract: the autosave path logs these
/// and keeps the in-memory state authoritative.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O: {0}")]
    Io(#[from] std::io::Error),

    #[error("snapshot encode: {0}")]
    Encode(String),

    #[error("snapshot decode: {0}")]
    Decode(String),

    #[error("snapshot metadata: {0}")]
    Meta(String),
}

/// On-disk detector state.
#[derive(Debug, Serialize, Deserialize)]
struct DetectorSnapshot {
    symbol: String,
    config: DetectorConfig,
    series: BarSeries,
    active_peaks: Vec<Peak>,
    id_gen: PeakIdGen,
    breakout_history: Vec<BreakoutRecord>,
}

/// JSON sidecar written next to the blob for quick inspection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SnapshotMeta {
    pub symbol: String,
    pub data_points: usize,
    pub active_peaks_count: usize,
    pub last_date: Option<NaiveDate>,
    /// BLAKE3 hex digest of the snapshot blob.
    pub data_hash: String,
}

impl Detector {
    pub(super) fn snapshot_path(&self) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{}.bin", self.config.cache_file_stem(&self.symbol)))
    }

    fn meta_path(&self) -> PathBuf {
        self.config
            .cache_dir
            .join(format!("{}_meta.json", self.config.cache_file_stem(&self.symbol)))
    }

    /// Serialise the current state to the cache path, atomically.
    pub fn save(&self) -> Result<(), SnapshotError> {
        let snapshot = DetectorSnapshot {
            symbol: self.symbol.clone(),
            config: self.config.clone(),
            series: self.series.clone(),
            active_peaks: self.active_peaks.clone(),
            id_gen: self.id_gen.clone(),
            breakout_history: self.breakout_history.clone(),
        };
        let blob = bincode::serialize(&snapshot).map_err(|e| SnapshotError::Encode(e.to_string()))?;

        fs::create_dir_all(&self.config.cache_dir)?;

        let path = self.snapshot_path();
        let tmp_path = path.with_extension("bin.tmp");
        fs::write(&tmp_path, &blob)?;
        if let Err(e) = fs::rename(&tmp_path, &path) {
            let _ = fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        let meta = SnapshotMeta {
            symbol: self.symbol.clone(),
            data_points: self.series.len(),
            active_peaks_count: self.active_peaks.len(),
            last_date: self.series.last_date(),
            data_hash: blake3::hash(&blob).to_hex().to_string(),
        };
        let meta_json =
            serde_json::to_string_pretty(&meta).map_err(|e| SnapshotError::Meta(e.to_string()))?;
        fs::write(self.meta_path(), meta_json)?;

        Ok(())
    }

    /// Restore state from the cache path if present and compatible.
    ///
    /// Returns `Ok(true)` when state was restored. A missing file, a torn or
    /// undecodable blob, or a configuration mismatch all count as "no cache"
    /// and leave the current state untouched.
    pub fn load(&mut self) -> Result<bool, SnapshotError> {
        let path = self.snapshot_path();
        let blob = match fs::read(&path) {
            Ok(blob) => blob,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e.into()),
        };

        let snapshot: DetectorSnapshot = match bincode::deserialize(&blob) {
            Ok(s) => s,
            Err(e) => {
                warn!(symbol = %self.symbol, error = %e, "torn detector snapshot, ignoring");
                return Ok(false);
            }
        };

        if snapshot.symbol != self.symbol || snapshot.config != self.config {
            warn!(
                symbol = %self.symbol,
                "detector snapshot produced by a different configuration, ignoring"
            );
            return Ok(false);
        }

        self.series = snapshot.series;
        self.active_peaks = snapshot.active_peaks;
        self.id_gen = snapshot.id_gen;
        self.breakout_history = snapshot.breakout_history;
        Ok(true)
    }

    /// Remove the snapshot blob and its metadata sidecar.
    pub fn clear_cache(&self) -> Result<(), SnapshotError> {
        for path in [self.snapshot_path(), self.meta_path()] {
            match fs::remove_file(&path) {
                Ok(()) => {}
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(())
    }

    /// Best-effort save on the autosave cadence; failures log and continue.
    pub(super) fn autosave(&self) {
        if let Err(e) = self.save() {
            warn!(symbol = %self.symbol, error = %e, "detector snapshot save failed");
        }
    }

    /// Best-effort restore during construction.
    pub(super) fn try_restore(&mut self) {
        if let Err(e) = self.load() {
            warn!(symbol = %self.symbol, error = %e, "detector snapshot load failed");
        }
    }
}
