//! Typed view over the ComfyUI `/history` payload.
//!
//! The history endpoint answers with `{ "<prompt_id>": { "outputs": { "<node>": { "images": [...] } } } }`.
//! Only the parts needed to locate a generated image are modelled; every
//! other field is ignored.

use std::collections::BTreeMap;

use serde::Deserialize;

/// One prompt's execution record.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryEntry {
    #[serde(default)]
    pub outputs: BTreeMap<String, NodeOutput>,
}

/// Output of a single node.
#[derive(Debug, Default, Deserialize)]
pub struct NodeOutput {
    #[serde(default)]
    pub images: Vec<OutputImage>,
}

/// A file written by a `SaveImage` (or preview) node.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct OutputImage {
    pub filename: String,
    #[serde(default)]
    pub subfolder: String,
    #[serde(rename = "type", default = "default_image_type")]
    pub kind: String,
}

fn default_image_type() -> String {
    "output".to_string()
}

/// Find the first image produced for `prompt_id`.
///
/// Returns `None` while the prompt is still queued or running (no entry
/// yet) or when it finished without image outputs. A malformed entry is
/// treated the same as a missing one.
pub fn find_first_image(history: &serde_json::Value, prompt_id: &str) -> Option<OutputImage> {
    let raw = history.get(prompt_id)?;
    let entry: HistoryEntry = serde_json::from_value(raw.clone()).ok()?;
    entry
        .outputs
        .into_values()
        .find_map(|output| output.images.into_iter().next())
}
