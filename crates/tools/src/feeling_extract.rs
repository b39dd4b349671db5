//! feeling_extract: record how the user feels.
//!
//! Purely local: no service is called. The feeling is stamped with the
//! turn's "now" in the configured timezone.

use async_trait::async_trait;
use lifechat_core::error::ToolError;
use lifechat_core::record::Feeling;
use lifechat_core::tool::{Tool, ToolContext, ToolResult};

/// Suggested labels; the model may use others.
pub const SUGGESTED_FEELINGS: [&str; 10] = [
    "calm", "motivated", "stressed", "anxious", "happy", "sad", "angry", "relaxed", "excited",
    "tired",
];

pub struct FeelingExtractTool;

impl FeelingExtractTool {
    /// Build a [`Feeling`] from the model's arguments.
    ///
    /// Fails only when the labels are missing or the score is not an
    /// integer in 1..=10.
    pub fn extract(
        &self,
        arguments: &serde_json::Value,
        context: &ToolContext,
    ) -> Result<Feeling, ToolError> {
        let labels: Vec<String> = match arguments.get("feelings") {
            Some(serde_json::Value::Array(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            // Some models send "stressed, relieved"
            Some(serde_json::Value::String(s)) => s.split(',').map(str::to_string).collect(),
            _ => {
                return Err(ToolError::InvalidArguments(
                    "Missing 'feelings' argument".into(),
                ));
            }
        };

        let score = score_argument(arguments.get("score"))?;

        Feeling::new(labels, score, context.local_now())
            .map_err(|e| ToolError::InvalidArguments(e.to_string()))
    }
}

fn score_argument(value: Option<&serde_json::Value>) -> Result<i64, ToolError> {
    let invalid = || ToolError::InvalidArguments("'score' must be an integer from 1 to 10".into());
    match value {
        Some(serde_json::Value::Number(n)) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => Ok(i),
            (None, Some(f)) if f.fract() == 0.0 => Ok(f as i64),
            _ => Err(invalid()),
        },
        Some(serde_json::Value::String(s)) => s.trim().parse::<i64>().map_err(|_| invalid()),
        _ => Err(invalid()),
    }
}

#[async_trait]
impl Tool for FeelingExtractTool {
    fn name(&self) -> &str {
        "feeling_extract"
    }

    fn description(&self) -> &str {
        "Record how the user feels right now. Call this whenever the message expresses \
         an emotion. Suggested labels: calm, motivated, stressed, anxious, happy, sad, \
         angry, relaxed, excited, tired."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "feelings": {
                    "type": "array",
                    "items": { "type": "string" },
                    "minItems": 1,
                    "description": "Emotion labels, lower case"
                },
                "score": {
                    "type": "integer",
                    "minimum": 1,
                    "maximum": 10,
                    "description": "Overall intensity from 1 (very low) to 10 (very high)"
                }
            },
            "required": ["feelings", "score"]
        })
    }

    async fn execute(
        &self,
        arguments: serde_json::Value,
        context: &ToolContext,
    ) -> Result<ToolResult, ToolError> {
        let feeling = self.extract(&arguments, context)?;
        let data = serde_json::to_value(&feeling).map_err(|e| ToolError::ExecutionFailed {
            tool_name: self.name().into(),
            reason: e.to_string(),
        })?;
        Ok(ToolResult::ok(data))
    }
}
