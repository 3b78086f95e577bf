/// Extraction mode
///
/// This module handles:
/// - Resolving files, folders and wildcards to image paths (scan.rs)
/// - Talking to the local vision model (client.rs)
/// - Cleaning up the returned keyword list (keywords.rs)
///
/// Each image becomes one CSV row on the output: `path, keyword..., RANK n, hash`,
/// or `path, <diagnostic>` when anything about that image failed.

pub mod client;
pub mod keywords;
pub mod scan;

#[cfg(test)]
pub(crate) mod testing;

use base64::{engine::general_purpose, Engine as _};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::hash;
use client::{ChatClient, ExtractError};

/// Vision model served by the local Ollama instance
pub const MODEL_NAME: &str = "gemma3:12b";

/// Instruction sent along with every image
pub const PROMPT: &str = concat!(
    "Provide just a comma-separated list of keywords that someone searching for this image,",
    " or one with a similar visual or emotional tone, might use to find it, including dominant colors and themes, with no comments.",
    " As a single keyword, one time, display the word RANK and how good the image is, on a scale from 1 to 10, such as 'RANK 4'.",
    " As the final keyword, specify the high-level type of the image, such as photo, drawing, receipt or whatever it is.",
);

/// Where the model server listens
pub const OLLAMA_BASE: &str = "http://localhost:11434";

/// Chat API path on the model server
pub const CHAT_ENDPOINT: &str = "/api/chat";

/// Default per-request timeout in seconds
pub const DEFAULT_TIMEOUT_SECS: u64 = 15;

/// Settings for one extraction run
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractConfig {
    pub base_url: String,
    pub endpoint: String,
    pub model: String,
    pub prompt: String,
    pub timeout_secs: u64,
}

impl Default for ExtractConfig {
    fn default() -> Self {
        Self {
            base_url: OLLAMA_BASE.to_string(),
            endpoint: CHAT_ENDPOINT.to_string(),
            model: MODEL_NAME.to_string(),
            prompt: PROMPT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

impl ExtractConfig {
    /// Default settings with a custom timeout
    pub fn with_timeout(timeout_secs: u64) -> Self {
        Self {
            timeout_secs,
            ..Self::default()
        }
    }
}

/// Summary of a finished batch
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BatchSummary {
    pub described: usize,
    pub failed: usize,
}

/// Run every image through the model, writing one CSV row per image
///
/// A failing image never stops the batch; only a failure to write the
/// output itself is returned as an error.
pub fn run_batch<W: Write>(
    client: &ChatClient,
    images: &[PathBuf],
    output: W,
) -> Result<BatchSummary, csv::Error> {
    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .has_headers(false)
        .from_writer(output);
    let mut summary = BatchSummary::default();

    info!("Sending {} image(s) to {}", images.len(), client.url());

    for path in images {
        debug!("--- Processing {} ---", path.display());
        let row = match describe_image(client, path) {
            Ok(fields) => {
                summary.described += 1;
                row_for(path, fields)
            }
            Err(err) => {
                summary.failed += 1;
                debug!("{}: {}", path.display(), err);
                row_for(path, vec![err.to_string()])
            }
        };
        writer.write_record(&row)?;
        writer.flush()?;
    }

    info!(
        "Done: {} described, {} failed",
        summary.described, summary.failed
    );
    Ok(summary)
}

/// Read, send and post-process a single image
fn describe_image(client: &ChatClient, path: &Path) -> Result<Vec<String>, ExtractError> {
    let bytes = std::fs::read(path).map_err(ExtractError::Read)?;
    let image_b64 = general_purpose::STANDARD.encode(&bytes);

    let text = client
        .describe(&image_b64)?
        .filter(|text| !text.is_empty())
        .ok_or(ExtractError::NoText)?;

    Ok(keywords::process_keywords(&text, &hash::sha256_hex(&bytes)))
}

fn row_for(path: &Path, fields: Vec<String>) -> Vec<String> {
    let mut row = Vec::with_capacity(fields.len() + 1);
    row.push(path.display().to_string());
    row.extend(fields);
    row
}
