//! Flux text-to-image workflow template.
//!
//! ComfyUI accepts a workflow as a JSON graph keyed by node id. The
//! template is cloned for every submission and the prompt, seed, sampler,
//! size and output prefix are written into well-known nodes.

use serde_json::{json, Value};

use crate::config::ComfyUIConfig;

/// `VAEDecode` -> `SaveImage`: output filename prefix.
pub const NODE_SAVE_IMAGE: &str = "9";
/// `EmptySD3LatentImage`: output size.
pub const NODE_LATENT_IMAGE: &str = "27";
/// `CheckpointLoaderSimple`: model checkpoint.
pub const NODE_CHECKPOINT: &str = "30";
/// `KSampler`: seed and sampler settings.
pub const NODE_SAMPLER: &str = "31";
/// `CLIPTextEncode`: negative conditioning.
pub const NODE_NEGATIVE: &str = "33";
/// `CLIPTextEncodeFlux`: dual CLIP-L / T5-XXL prompt.
pub const NODE_FLUX_PROMPT: &str = "41";

/// Short prompt used when a scene arrives with an empty one.
const FALLBACK_PROMPT: &str = "A vibrant children's book illustration in a modern cartoon style.";

/// Errors raised while loading or rendering a workflow template.
#[derive(Debug, thiserror::Error)]
pub enum WorkflowError {
    #[error("Failed to read workflow template {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Workflow template is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Workflow template is missing node {0}")]
    MissingNode(&'static str),
}

/// Per-submission values written into the template.
#[derive(Debug, Clone)]
pub struct WorkflowParams<'a> {
    /// CLIP-L prompt (short description).
    pub prompt: &'a str,
    /// T5-XXL prompt (detailed description); may be empty.
    pub detailed_prompt: &'a str,
    pub seed: u64,
    pub filename_prefix: &'a str,
}

/// A parsed workflow graph plus the settings applied on every render.
#[derive(Debug, Clone)]
pub struct WorkflowTemplate {
    graph: Value,
    config: ComfyUIConfig,
}

impl WorkflowTemplate {
    /// Load the template named by `config.workflow_path`, or the built-in
    /// Flux graph when no path is configured.
    pub fn load(config: ComfyUIConfig) -> Result<Self, WorkflowError> {
        let graph = match &config.workflow_path {
            Some(path) => {
                let raw = std::fs::read_to_string(path).map_err(|source| WorkflowError::Read {
                    path: path.clone(),
                    source,
                })?;
                serde_json::from_str(&raw)?
            }
            None => builtin_flux_graph(),
        };
        let template = Self { graph, config };
        template.check_nodes()?;
        Ok(template)
    }

    /// Produce a ready-to-submit workflow for one scene.
    pub fn render(&self, params: &WorkflowParams<'_>) -> Result<Value, WorkflowError> {
        let mut graph = self.graph.clone();
        let cfg = &self.config;

        let prompt = if params.prompt.trim().is_empty() {
            FALLBACK_PROMPT
        } else {
            params.prompt
        };
        let clip_l = if cfg.positive_prompt_prefix.is_empty() {
            prompt.to_string()
        } else {
            format!("{} {prompt}", cfg.positive_prompt_prefix)
        };

        let flux = node_inputs(&mut graph, NODE_FLUX_PROMPT)?;
        flux["clip_l"] = json!(clip_l);
        flux["t5xxl"] = json!(params.detailed_prompt);
        flux["guidance"] = json!(cfg.guidance);

        let sampler = node_inputs(&mut graph, NODE_SAMPLER)?;
        sampler["seed"] = json!(params.seed);
        sampler["steps"] = json!(cfg.steps);
        sampler["cfg"] = json!(cfg.cfg);
        sampler["sampler_name"] = json!(cfg.sampler);
        sampler["scheduler"] = json!(cfg.scheduler);

        let latent = node_inputs(&mut graph, NODE_LATENT_IMAGE)?;
        latent["width"] = json!(cfg.image_width);
        latent["height"] = json!(cfg.image_height);

        node_inputs(&mut graph, NODE_SAVE_IMAGE)?["filename_prefix"] =
            json!(params.filename_prefix);

        // Optional nodes: user-supplied templates may not carry them.
        if let Ok(negative) = node_inputs(&mut graph, NODE_NEGATIVE) {
            negative["text"] = json!(cfg.negative_prompt);
        }
        if let Some(model) = &cfg.model {
            if let Ok(loader) = node_inputs(&mut graph, NODE_CHECKPOINT) {
                loader["ckpt_name"] = json!(model);
            }
        }

        Ok(graph)
    }

    fn check_nodes(&self) -> Result<(), WorkflowError> {
        for node in [
            NODE_FLUX_PROMPT,
            NODE_SAMPLER,
            NODE_LATENT_IMAGE,
            NODE_SAVE_IMAGE,
        ] {
            if self.graph.get(node).and_then(|n| n.get("inputs")).is_none() {
                return Err(WorkflowError::MissingNode(node));
            }
        }
        Ok(())
    }
}

fn node_inputs<'g>(graph: &'g mut Value, node: &'static str) -> Result<&'g mut Value, WorkflowError> {
    graph
        .get_mut(node)
        .and_then(|n| n.get_mut("inputs"))
        .ok_or(WorkflowError::MissingNode(node))
}

/// The Flux dev text-to-image graph.
fn builtin_flux_graph() -> Value {
    json!({
        "8": {
            "class_type": "VAEDecode",
            "inputs": { "samples": ["31", 0], "vae": ["30", 2] }
        },
        "9": {
            "class_type": "SaveImage",
            "inputs": { "filename_prefix": "ComfyUI", "images": ["8", 0] }
        },
        "27": {
            "class_type": "EmptySD3LatentImage",
            "inputs": { "width": 1024, "height": 1024, "batch_size": 1 }
        },
        "30": {
            "class_type": "CheckpointLoaderSimple",
            "inputs": { "ckpt_name": "flux1-dev-fp8.safetensors" }
        },
        "31": {
            "class_type": "KSampler",
            "inputs": {
                "seed": 0,
                "steps": 20,
                "cfg": 1.0,
                "sampler_name": "euler",
                "scheduler": "simple",
                "denoise": 1.0,
                "model": ["30", 0],
                "positive": ["41", 0],
                "negative": ["33", 0],
                "latent_image": ["27", 0]
            }
        },
        "33": {
            "class_type": "CLIPTextEncode",
            "inputs": { "text": "", "clip": ["30", 1] }
        },
        "41": {
            "class_type": "CLIPTextEncodeFlux",
            "inputs": { "clip_l": "", "t5xxl": "", "guidance": 3.5, "clip": ["30", 1] }
        }
    })
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn params<'a>(prompt: &'a str, detailed: &'a str) -> WorkflowParams<'a> {
        WorkflowParams {
            prompt,
            detailed_prompt: detailed,
            seed: 42,
            filename_prefix: "story_scene_1_42",
        }
    }

    #[test]
    fn render_writes_prompt_seed_and_size() {
        let template = WorkflowTemplate::load(ComfyUIConfig::default()).unwrap();
        let graph = template.render(&params("a dragon", "a shy dragon at dusk")).unwrap();

        let flux = &graph[NODE_FLUX_PROMPT]["inputs"];
        assert!(flux["clip_l"].as_str().unwrap().ends_with("a dragon"));
        assert_eq!(flux["t5xxl"], "a shy dragon at dusk");
        assert_eq!(graph[NODE_SAMPLER]["inputs"]["seed"], 42);
        assert_eq!(graph[NODE_SAMPLER]["inputs"]["sampler_name"], "dpmpp_2m");
        assert_eq!(graph[NODE_LATENT_IMAGE]["inputs"]["width"], 960);
        assert_eq!(graph[NODE_SAVE_IMAGE]["inputs"]["filename_prefix"], "story_scene_1_42");
    }

    #[test]
    fn render_does_not_mutate_template() {
        let template = WorkflowTemplate::load(ComfyUIConfig::default()).unwrap();
        template.render(&params("first", "")).unwrap();
        let second = template.render(&params("second", "")).unwrap();
        assert!(second[NODE_FLUX_PROMPT]["inputs"]["clip_l"]
            .as_str()
            .unwrap()
            .ends_with("second"));
    }

    #[test]
    fn empty_prompt_uses_fallback() {
        let config = ComfyUIConfig {
            positive_prompt_prefix: String::new(),
            ..ComfyUIConfig::default()
        };
        let template = WorkflowTemplate::load(config).unwrap();
        let graph = template.render(&params("   ", "")).unwrap();
        assert_eq!(graph[NODE_FLUX_PROMPT]["inputs"]["clip_l"], FALLBACK_PROMPT);
    }

    #[test]
    fn missing_template_file_is_reported() {
        let config = ComfyUIConfig {
            workflow_path: Some("/nonexistent/workflow.json".into()),
            ..ComfyUIConfig::default()
        };
        assert_matches!(WorkflowTemplate::load(config), Err(WorkflowError::Read { .. }));
    }
}
