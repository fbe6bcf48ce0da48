//! CRAG loop: generate, have a judge check faithfulness, revise on failure
//!
//! The first candidate is always generated. Each rejected candidate is revised
//! at most `max_iters` times, so one run makes at most `max_iters + 1`
//! generation calls. A run that exhausts its revisions still returns the last
//! candidate, flagged `ok = false` with the judge's final reason.

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{Error, Result};
use crate::generation::PromptBuilder;
use crate::providers::llm::generate_structured;
use crate::providers::{bounded, GenerationOptions, LlmProvider};
use crate::types::RankedChunk;

/// Judge output
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroundingVerdict {
    pub ok: bool,
    #[serde(default)]
    pub reason: String,
}

/// Final candidate of a CRAG run
#[derive(Debug, Clone, PartialEq)]
pub struct CragOutcome {
    pub text: String,
    pub ok: bool,
    pub reason: String,
    /// Generation calls made (first candidate included)
    pub generations: usize,
}

/// Runs the generate → judge → revise loop
#[derive(Clone)]
pub struct GroundingVerifier {
    generator: Arc<dyn LlmProvider>,
    judge: Arc<dyn LlmProvider>,
    max_iters: usize,
    judge_context: usize,
    timeout: Duration,
}

impl GroundingVerifier {
    pub fn new(
        generator: Arc<dyn LlmProvider>,
        judge: Arc<dyn LlmProvider>,
        max_iters: usize,
        judge_context: usize,
        timeout: Duration,
    ) -> Self {
        Self {
            generator,
            judge,
            max_iters,
            judge_context,
            timeout,
        }
    }

    pub fn max_iters(&self) -> usize {
        self.max_iters
    }

    /// Context shown to the judge: the first passages joined by blank lines
    pub fn judge_context(&self, passages: &[RankedChunk]) -> String {
        passages
            .iter()
            .take(self.judge_context)
            .map(|p| p.chunk.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Run the loop.
    ///
    /// `revise(previous, reason)` builds the prompt for the next candidate.
    pub async fn run<F>(&self, first_prompt: &str, judge_context: &str, revise: F) -> Result<CragOutcome>
    where
        F: Fn(&str, &str) -> String + Send + Sync,
    {
        let mut text = self.generate(first_prompt).await?;
        let mut generations = 1;

        for iteration in 0..=self.max_iters {
            let verdict = match self.grade(judge_context, &text).await {
                Ok(verdict) => verdict,
                Err(Error::GenerationParse(message)) => {
                    tracing::warn!("[CRAG] judge output unreadable, stopping: {}", message);
                    return Ok(CragOutcome {
                        text,
                        ok: false,
                        reason: format!("judge output could not be parsed: {}", message),
                        generations,
                    });
                }
                Err(e) => return Err(e),
            };

            if verdict.ok {
                tracing::info!("[CRAG] passed (iter {}): {}", iteration, verdict.reason);
                return Ok(CragOutcome {
                    text,
                    ok: true,
                    reason: verdict.reason,
                    generations,
                });
            }

            if iteration == self.max_iters {
                tracing::warn!(
                    "[CRAG] still failing after {} revisions: {}",
                    self.max_iters,
                    verdict.reason
                );
                return Ok(CragOutcome {
                    text,
                    ok: false,
                    reason: verdict.reason,
                    generations,
                });
            }

            tracing::info!("[CRAG] failed (iter {}): {}, revising", iteration, verdict.reason);
            let prompt = revise(&text, &verdict.reason);
            text = self.generate(&prompt).await?;
            generations += 1;
        }

        // The loop always returns on its last iteration
        Err(Error::internal("CRAG loop ended without a verdict"))
    }

    async fn generate(&self, prompt: &str) -> Result<String> {
        let options = GenerationOptions::default();
        let text = bounded(
            self.generator.name(),
            "generate",
            self.timeout,
            self.generator.generate(prompt, &options),
        )
        .await?;
        Ok(text.trim().to_string())
    }

    async fn grade(&self, context: &str, candidate: &str) -> Result<GroundingVerdict> {
        let prompt = PromptBuilder::judge(context, candidate);
        let options = GenerationOptions {
            temperature: Some(0.0),
            json: true,
        };
        bounded(
            self.judge.name(),
            "judge",
            self.timeout,
            generate_structured::<GroundingVerdict>(self.judge.as_ref(), &prompt, &options),
        )
        .await
    }
}
