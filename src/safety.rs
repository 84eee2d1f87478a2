//! Content-filtering thresholds sent with every generation request.

use serde::{Deserialize, Serialize};

/// Harm categories the Gemini API lets callers tune.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HarmCategory {
    /// Harassment.
    #[serde(rename = "HARM_CATEGORY_HARASSMENT")]
    Harassment,
    /// Hate speech.
    #[serde(rename = "HARM_CATEGORY_HATE_SPEECH")]
    HateSpeech,
    /// Sexually explicit content.
    #[serde(rename = "HARM_CATEGORY_SEXUALLY_EXPLICIT")]
    SexuallyExplicit,
    /// Dangerous content.
    #[serde(rename = "HARM_CATEGORY_DANGEROUS_CONTENT")]
    DangerousContent,
}

/// Blocking threshold for a single harm category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    /// Never block.
    #[default]
    BlockNone,
    /// Block only high-probability harm.
    BlockOnlyHigh,
    /// Block medium and high.
    BlockMediumAndAbove,
    /// Block low, medium and high.
    BlockLowAndAbove,
    /// Turn the filter off entirely.
    Off,
}

/// One `{category, threshold}` entry of the request's `safetySettings`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SafetySetting {
    /// Category the threshold applies to.
    pub category: HarmCategory,
    /// Threshold for that category.
    pub threshold: HarmBlockThreshold,
}

/// Thresholds for the four configurable categories.
///
/// Batch runs always send the default, which blocks nothing; the policy is
/// not read from the config file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SafetyPolicy {
    /// Harassment threshold.
    pub harassment: HarmBlockThreshold,
    /// Hate speech threshold.
    pub hate_speech: HarmBlockThreshold,
    /// Sexually explicit threshold.
    pub sexually_explicit: HarmBlockThreshold,
    /// Dangerous content threshold.
    pub dangerous_content: HarmBlockThreshold,
}

impl SafetyPolicy {
    /// Expand the policy into the wire list, one entry per category.
    #[must_use]
    pub fn settings(&self) -> Vec<SafetySetting> {
        vec![
            SafetySetting { category: HarmCategory::Harassment, threshold: self.harassment },
            SafetySetting { category: HarmCategory::HateSpeech, threshold: self.hate_speech },
            SafetySetting {
                category: HarmCategory::SexuallyExplicit,
                threshold: self.sexually_explicit,
            },
            SafetySetting {
                category: HarmCategory::DangerousContent,
                threshold: self.dangerous_content,
            },
        ]
    }
}
