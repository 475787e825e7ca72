//! Report output port.

use crate::domain::backtest::BacktestRun;
use crate::domain::error::StratscopeError;
use std::path::{Path, PathBuf};

/// Port for exporting a finished backtest run.
pub trait ReportPort {
    /// Writes the run's artifacts under `output_dir` and returns the paths written.
    fn write_run(&self, run: &BacktestRun, output_dir: &Path)
    -> Result<Vec<PathBuf>, StratscopeError>;

    /// Default implementation: writes each run in turn.
    fn write_runs(
        &self,
        runs: &[BacktestRun],
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, StratscopeError> {
        let mut written = Vec::new();
        for run in runs {
            written.extend(self.write_run(run, output_dir)?);
        }
        Ok(written)
    }
}
