//! ONNX cross-encoder re-ranker
//!
//! Scores each (query, passage) pair in one forward pass of a sequence
//! classification model such as bge-reranker-base. The single logit per pair
//! goes through a sigmoid, so scores land in (0, 1).

use async_trait::async_trait;
use ort::session::{builder::GraphOptimizationLevel, Session};
use ort::value::Tensor;
use parking_lot::Mutex;
use std::path::Path;
use std::sync::Arc;
use tokenizers::{Tokenizer, TruncationParams};

use crate::config::RerankerConfig;
use crate::error::{Error, Result};

use super::reranker::Reranker;

struct CrossEncoderModel {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    /// BERT-style exports take segment ids, XLM-RoBERTa exports do not
    wants_token_types: bool,
}

/// Cross-encoder loaded from a local cache, downloaded on first use
#[derive(Clone)]
pub struct CrossEncoderReranker {
    model: Arc<CrossEncoderModel>,
    batch_size: usize,
}

impl CrossEncoderReranker {
    pub async fn load(config: &RerankerConfig) -> Result<Self> {
        tracing::info!("Initializing cross-encoder: {}", config.cross_encoder_model);

        let dir = config
            .cache_dir
            .join(config.cross_encoder_model.replace('/', "--"));
        std::fs::create_dir_all(&dir).map_err(|e| {
            Error::Config(format!("Failed to create reranker cache {}: {}", dir.display(), e))
        })?;

        let model_path = dir.join("model.onnx");
        let tokenizer_path = dir.join("tokenizer.json");
        let base = format!(
            "https://huggingface.co/{}/resolve/main",
            config.cross_encoder_model
        );
        if !model_path.exists() {
            download(&format!("{}/onnx/model.onnx", base), &model_path).await?;
        }
        if !tokenizer_path.exists() {
            download(&format!("{}/tokenizer.json", base), &tokenizer_path).await?;
        }

        let session = Session::builder()
            .map_err(|e| model_error("create session builder", e))?
            .with_optimization_level(GraphOptimizationLevel::Level3)
            .map_err(|e| model_error("set optimization level", e))?
            .with_intra_threads(4)
            .map_err(|e| model_error("set threads", e))?
            .commit_from_file(&model_path)
            .map_err(|e| model_error("load model", e))?;
        let wants_token_types = session
            .inputs
            .iter()
            .any(|input| input.name == "token_type_ids");

        let mut tokenizer =
            Tokenizer::from_file(&tokenizer_path).map_err(|e| model_error("load tokenizer", e))?;
        tokenizer
            .with_truncation(Some(TruncationParams {
                max_length: config.max_length,
                ..Default::default()
            }))
            .map_err(|e| model_error("configure truncation", e))?;
        tokenizer.with_padding(None);

        tracing::info!("Cross-encoder ready ({})", model_path.display());

        Ok(Self {
            model: Arc::new(CrossEncoderModel {
                session: Mutex::new(session),
                tokenizer,
                wants_token_types,
            }),
            batch_size: config.batch_size.max(1),
        })
    }
}

impl CrossEncoderModel {
    fn score_batch(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        let pairs: Vec<(String, String)> = passages
            .iter()
            .map(|p| (query.to_string(), p.clone()))
            .collect();
        let encodings = self
            .tokenizer
            .encode_batch(pairs, true)
            .map_err(|e| model_error("tokenize", e))?;

        let rows: Vec<EncodedPair> = encodings
            .iter()
            .map(|e| EncodedPair {
                ids: e.get_ids().to_vec(),
                mask: e.get_attention_mask().to_vec(),
                type_ids: e.get_type_ids().to_vec(),
            })
            .collect();
        let packed = pack_batch(&rows);
        let shape = vec![rows.len(), packed.seq_len];

        let input_ids = Tensor::from_array((shape.clone(), packed.input_ids.into_boxed_slice()))
            .map_err(|e| model_error("build input_ids", e))?;
        let attention_mask =
            Tensor::from_array((shape.clone(), packed.attention_mask.into_boxed_slice()))
                .map_err(|e| model_error("build attention_mask", e))?;

        let mut inputs = vec![
            ("input_ids", input_ids.into_dyn()),
            ("attention_mask", attention_mask.into_dyn()),
        ];
        if self.wants_token_types {
            let token_type_ids =
                Tensor::from_array((shape, packed.token_type_ids.into_boxed_slice()))
                    .map_err(|e| model_error("build token_type_ids", e))?;
            inputs.push(("token_type_ids", token_type_ids.into_dyn()));
        }

        let mut session = self.session.lock();
        let outputs = session.run(inputs).map_err(|e| model_error("run inference", e))?;
        let output_iter: Vec<_> = outputs.iter().collect();
        let logits = output_iter
            .iter()
            .find(|(name, _)| *name == "logits")
            .or_else(|| output_iter.first())
            .map(|(_, v)| v)
            .ok_or_else(|| Error::Internal("cross-encoder produced no output".to_string()))?;

        let (dims, data) = logits
            .try_extract_tensor::<f32>()
            .map_err(|e| model_error("read logits", e))?;
        let dims: Vec<usize> = dims.iter().map(|&d| d as usize).collect();
        Ok(logits_to_scores(&dims, data, rows.len())?
            .into_iter()
            .map(sigmoid)
            .collect())
    }
}

#[async_trait]
impl Reranker for CrossEncoderReranker {
    async fn score(&self, query: &str, passages: &[String]) -> Result<Vec<f32>> {
        if passages.is_empty() {
            return Ok(Vec::new());
        }

        let model = Arc::clone(&self.model);
        let query = query.to_string();
        let passages = passages.to_vec();
        let batch_size = self.batch_size;

        tokio::task::spawn_blocking(move || {
            let mut scores = Vec::with_capacity(passages.len());
            for batch in passages.chunks(batch_size) {
                scores.extend(model.score_batch(&query, batch)?);
            }
            Ok(scores)
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    fn name(&self) -> &'static str {
        "cross_encoder"
    }
}

/// Token ids of one tokenized pair
#[derive(Debug, Clone)]
struct EncodedPair {
    ids: Vec<u32>,
    mask: Vec<u32>,
    type_ids: Vec<u32>,
}

/// Row-major model inputs, right-padded with zeros to the longest row
#[derive(Debug, PartialEq)]
struct PackedBatch {
    input_ids: Vec<i64>,
    attention_mask: Vec<i64>,
    token_type_ids: Vec<i64>,
    seq_len: usize,
}

fn pack_batch(rows: &[EncodedPair]) -> PackedBatch {
    let seq_len = rows.iter().map(|r| r.ids.len()).max().unwrap_or(0);
    let size = rows.len() * seq_len;
    let mut packed = PackedBatch {
        input_ids: vec![0; size],
        attention_mask: vec![0; size],
        token_type_ids: vec![0; size],
        seq_len,
    };

    for (i, row) in rows.iter().enumerate() {
        let offset = i * seq_len;
        for (j, &id) in row.ids.iter().enumerate() {
            packed.input_ids[offset + j] = i64::from(id);
            packed.attention_mask[offset + j] = row.mask.get(j).copied().map_or(1, i64::from);
            packed.token_type_ids[offset + j] = row.type_ids.get(j).copied().map_or(0, i64::from);
        }
    }
    packed
}

/// One relevance logit per row.
///
/// Single-label heads give `[batch, 1]` (or `[batch]`); two-label heads give
/// `[batch, 2]`, in which case the last column is the "relevant" class.
fn logits_to_scores(dims: &[usize], data: &[f32], batch: usize) -> Result<Vec<f32>> {
    let width = match dims {
        [rows] if *rows == batch => 1,
        [rows, width] if *rows == batch && *width > 0 => *width,
        _ => {
            return Err(Error::Internal(format!(
                "unexpected cross-encoder output shape {:?} for {} pairs",
                dims, batch
            )))
        }
    };
    if data.len() < batch * width {
        return Err(Error::Internal(format!(
            "cross-encoder returned {} values for {} pairs",
            data.len(),
            batch
        )));
    }
    Ok((0..batch).map(|i| data[i * width + width - 1]).collect())
}

fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

fn model_error(step: &str, e: impl std::fmt::Display) -> Error {
    Error::ProviderUnavailable {
        provider: "cross_encoder".to_string(),
        message: format!("failed to {}: {}", step, e),
    }
}

async fn download(url: &str, path: &Path) -> Result<()> {
    tracing::info!("Downloading {}", url);

    let response = reqwest::get(url).await.map_err(|e| model_error("download", e))?;
    if !response.status().is_success() {
        return Err(model_error("download", format!("HTTP {} for {}", response.status(), url)));
    }
    let bytes = response.bytes().await.map_err(|e| model_error("download", e))?;

    // Write under a temporary name so an interrupted download is never loaded
    let tmp = path.with_extension("part");
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, path)?;

    tracing::info!("Saved {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}
