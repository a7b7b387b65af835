//! Model router: selects the backend model and generation settings per turn.
//!
//! Priority is strict, first match wins:
//! 1. an attached image forces the pro (vision-capable) model
//! 2. thinking mode uses the pro model with an extended-reasoning budget
//! 3. fast mode uses the lightweight model
//! 4. everything else uses the standard model

use tutor_config::{AppConfig, ModelsConfig};
use tutor_core::profile::{ModelMode, ResponseProfile};
use tutor_core::provider::GenerationConfig;

/// The routing outcome for one turn.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteDecision {
    pub profile: ResponseProfile,
    pub model: String,
    pub temperature: f32,
    pub reasoning_budget: Option<u32>,
    /// Whether the profile differs from the one bound to the live handle.
    pub needs_handle_swap: bool,
}

impl RouteDecision {
    /// Whether the system instruction gets the conciseness override.
    pub fn augments_instruction(&self) -> bool {
        self.profile == ResponseProfile::Thinking
    }

    /// Generation settings for a handle bound to this decision.
    pub fn generation_config(&self, system_instruction: String) -> GenerationConfig {
        GenerationConfig {
            system_instruction,
            temperature: self.temperature,
            reasoning_budget: self.reasoning_budget,
        }
    }
}

/// Routes turns to backend models.
#[derive(Debug, Clone)]
pub struct ModelRouter {
    models: ModelsConfig,
    temperature: f32,
    thinking_budget: u32,
}

impl ModelRouter {
    pub fn new(models: ModelsConfig, temperature: f32, thinking_budget: u32) -> Self {
        Self {
            models,
            temperature,
            thinking_budget,
        }
    }

    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            config.models.clone(),
            config.temperature,
            config.thinking_budget,
        )
    }

    /// Resolve the profile for a turn and compare it to the bound one.
    pub fn resolve(
        &self,
        mode: ModelMode,
        has_image: bool,
        bound: Option<ResponseProfile>,
    ) -> RouteDecision {
        let profile = ResponseProfile::resolve(mode, has_image);
        let mut decision = self.decision_for(profile);
        decision.needs_handle_swap = bound != Some(profile);
        decision
    }

    /// The decision used when a session opens.
    pub fn initial(&self) -> RouteDecision {
        let mut decision = self.decision_for(ResponseProfile::Standard);
        decision.needs_handle_swap = true;
        decision
    }

    fn decision_for(&self, profile: ResponseProfile) -> RouteDecision {
        let reasoning_budget =
            (profile == ResponseProfile::Thinking).then_some(self.thinking_budget);
        RouteDecision {
            profile,
            model: self.model_for(profile).to_string(),
            temperature: self.temperature,
            reasoning_budget,
            needs_handle_swap: false,
        }
    }

    /// The model used for a profile.
    pub fn model_for(&self, profile: ResponseProfile) -> &str {
        match profile {
            ResponseProfile::ImageForced | ResponseProfile::Thinking => &self.models.pro,
            ResponseProfile::Fast => &self.models.fast,
            ResponseProfile::Standard => &self.models.standard,
        }
    }

    /// One-line description of a mode for status bars.
    pub fn describe(&self, mode: ModelMode) -> String {
        match mode {
            ModelMode::Thinking => {
                format!("Deep thinking mode active ({}).", self.models.pro)
            }
            ModelMode::Fast => format!("Fast mode active ({}).", self.models.fast),
            ModelMode::Standard => "Standard AI mode.".into(),
        }
    }
}

impl Default for ModelRouter {
    fn default() -> Self {
        Self::from_config(&AppConfig::default())
    }
}
