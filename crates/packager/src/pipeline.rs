//! Two-stage repository pipeline: compress, then generate.

use crate::compressor::{CompressionSummary, Compressor};
use crate::config::RepoSettings;
use crate::generator::{GenerationSummary, Generator};
use crate::report::RunReport;
use repoprep_common::{Error, Result};
use tracing::info;

/// Runs both stages against one repository root.
///
/// Stage two only accepts the summary returned by stage one, so it cannot
/// start before every archive has been built or restored.
pub struct Pipeline {
    settings: RepoSettings,
}

impl Pipeline {
    pub fn new(settings: RepoSettings) -> Result<Self> {
        if !settings.repo_root.is_dir() {
            return Err(Error::Config(format!(
                "Repository root {} is not a directory",
                settings.repo_root.display()
            )));
        }
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &RepoSettings {
        &self.settings
    }

    /// Stage one. Returns a disabled summary when compression is off.
    pub fn compress(&self) -> Result<CompressionSummary> {
        if !self.settings.compress_addons {
            info!("Compression disabled, leaving add-on folders as they are");
            return Ok(CompressionSummary::disabled());
        }
        info!(
            "Compressing add-ons in {}",
            self.settings.repo_root.display()
        );
        Compressor::new(&self.settings.repo_root, self.settings.filter()).run()
    }

    /// Stage two.
    pub fn generate(&self, compressed: &CompressionSummary) -> Result<GenerationSummary> {
        info!(
            "Generating repository manifest in {}",
            self.settings.repo_root.display()
        );
        Generator::new(&self.settings.repo_root, self.settings.filter()).run(compressed)
    }

    /// Run both stages in order.
    pub fn run(&self) -> Result<RunReport> {
        let compression = self.compress()?;
        let generation = self.generate(&compression)?;
        Ok(RunReport {
            repo_root: self.settings.repo_root.clone(),
            compression: Some(compression),
            generation: Some(generation),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::GenerationOutcome;
    use tempfile::tempdir;

    #[test]
    fn test_missing_root_rejected() {
        let dir = tempdir().unwrap();
        let settings = RepoSettings::new(dir.path().join("missing"));
        assert!(matches!(Pipeline::new(settings), Err(Error::Config(_))));
    }

    #[test]
    fn test_compression_toggle() {
        let dir = tempdir().unwrap();
        let addon = dir.path().join("sample");
        std::fs::create_dir(&addon).unwrap();
        std::fs::write(
            addon.join("addon.xml"),
            r#"<addon id="sample" version="1.0"/>"#,
        )
        .unwrap();
        std::fs::write(addon.join("main.py"), "").unwrap();

        let mut settings = RepoSettings::new(dir.path());
        settings.compress_addons = false;
        let report = Pipeline::new(settings).unwrap().run().unwrap();

        assert!(!report.compression.as_ref().unwrap().enabled);
        assert!(addon.join("main.py").exists());
        assert!(!addon.join("sample-1.0.zip").exists());
        assert!(matches!(
            report.generation.unwrap().outcome,
            GenerationOutcome::Written { .. }
        ));
    }
}
