//! Repoprep packager - compress add-ons and generate the repository manifest.

pub mod archive;
pub mod compressor;
pub mod config;
pub mod curate;
pub mod extract;
pub mod generator;
pub mod layout;
pub mod pipeline;
pub mod report;

pub use compressor::{CompressOutcome, CompressionSummary, Compressor};
pub use config::RepoSettings;
pub use generator::{GenerationOutcome, GenerationSummary, Generator};
pub use layout::{AddonDir, DirectoryFilter};
pub use pipeline::Pipeline;
pub use report::RunReport;
