//! Bounded-retry configuration generation.

use std::sync::Arc;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::{AttemptFailure, GenerationError};
use crate::extract::{extract, ExtractedConfig};
use crate::obs::emit_attempt_failed;
use crate::prompt::{render_prompt, HostContext};
use crate::settings::DEFAULT_MAX_ATTEMPTS;
use crate::traits::ModelQuery;

/// A configuration accepted by the generator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedConfig {
    /// Trimmed JSON text as written by the model.
    pub config_text: String,
    /// Declared logical name; also the name of the deployed object.
    pub name: String,
    /// Attempt (1-based) that produced this configuration.
    pub attempt: u32,
}

impl ValidatedConfig {
    fn from_extracted(extracted: ExtractedConfig, attempt: u32) -> Self {
        Self {
            config_text: extracted.config_text,
            name: extracted.name,
            attempt,
        }
    }

    /// Short SHA-256 of the payload, for spotting repeated generations in logs.
    pub fn digest(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.config_text.as_bytes());
        let full = hex::encode(hasher.finalize());
        full[..12].to_string()
    }
}

/// Asks the model for a configuration until one validates or attempts run out.
///
/// Every attempt sends the identical prompt; variation comes only from the
/// model. There is no delay between attempts.
pub struct ConfigGenerator {
    model: Arc<dyn ModelQuery>,
    max_attempts: u32,
    log_replies: bool,
}

impl ConfigGenerator {
    pub fn new(model: Arc<dyn ModelQuery>) -> Self {
        Self {
            model,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            log_replies: false,
        }
    }

    /// Set the attempt budget. Zero is treated as one.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Log every raw reply at info level.
    pub fn with_reply_logging(mut self, enabled: bool) -> Self {
        self.log_replies = enabled;
        self
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Generate a validated configuration for `hint`.
    pub async fn generate(
        &self,
        hint: &str,
        context: &HostContext,
    ) -> Result<ValidatedConfig, GenerationError> {
        let prompt = render_prompt(hint, context);
        let mut attempt = 0;

        loop {
            attempt += 1;
            debug!(attempt, prompt_len = prompt.len(), "Querying model");

            match self.attempt(&prompt).await {
                Ok(extracted) => {
                    let config = ValidatedConfig::from_extracted(extracted, attempt);
                    info!(
                        attempt,
                        name = %config.name,
                        digest = %config.digest(),
                        "Model produced a valid configuration"
                    );
                    return Ok(config);
                }
                Err(failure) => {
                    emit_attempt_failed(attempt, self.max_attempts, &failure);
                    if attempt >= self.max_attempts {
                        return Err(GenerationError::ExhaustedRetries {
                            attempts: attempt,
                            last: failure,
                        });
                    }
                }
            }
        }
    }

    async fn attempt(&self, prompt: &str) -> Result<ExtractedConfig, AttemptFailure> {
        let reply = self.model.query(prompt).await?;
        if self.log_replies {
            info!(reply = %reply, "Model reply");
        }
        Ok(extract(&reply)?)
    }
}
