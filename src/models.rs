//! Data models and structures
//!
//! Defines the generation profile and request/result values that flow
//! through a single `/img` invocation, plus runtime configuration.

use std::fmt;
use std::path::Path;
use std::str::FromStr;
use uuid::Uuid;

const DEFAULT_RUNWARE_BASE_URL: &str = "https://api.runware.ai";
const DEFAULT_TELEGRAM_API_URL: &str = "https://api.telegram.org";
const DEFAULT_POLL_TIMEOUT_SECS: u64 = 30;

/// Runware model selection, addressed by AIR identifier.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageModel {
    FluxSchnell,
    FluxDev,
    Civitai618578,
    Civitai81458,
    Civitai101055,
    Custom(String),
}

impl ImageModel {
    pub fn air_id(&self) -> &str {
        match self {
            ImageModel::FluxSchnell => "runware:100@1",
            ImageModel::FluxDev => "runware:101@1",
            ImageModel::Civitai618578 => "civitai:618578@693048",
            ImageModel::Civitai81458 => "civitai:81458@132760",
            ImageModel::Civitai101055 => "civitai:101055@128078",
            ImageModel::Custom(air) => air,
        }
    }
}

impl Default for ImageModel {
    fn default() -> Self {
        ImageModel::FluxDev
    }
}

impl fmt::Display for ImageModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.air_id())
    }
}

impl FromStr for ImageModel {
    type Err = crate::Error;

    fn from_str(s: &str) -> crate::Result<Self> {
        let value = s.trim();
        match value.to_ascii_lowercase().as_str() {
            "flux-schnell" | "runware:100@1" => Ok(ImageModel::FluxSchnell),
            "flux-dev" | "runware:101@1" => Ok(ImageModel::FluxDev),
            "civitai-618578" | "civitai:618578@693048" => Ok(ImageModel::Civitai618578),
            "civitai-81458" | "civitai:81458@132760" => Ok(ImageModel::Civitai81458),
            "civitai-101055" | "civitai:101055@128078" => Ok(ImageModel::Civitai101055),
            _ if is_air_id(value) => Ok(ImageModel::Custom(value.to_string())),
            _ => Err(crate::Error::Config(format!(
                "Unknown IMAGE_MODEL '{}'. Expected a known alias or an AIR id like provider:id@version",
                value
            ))),
        }
    }
}

fn is_air_id(value: &str) -> bool {
    let Some((provider, rest)) = value.split_once(':') else {
        return false;
    };
    let Some((id, version)) = rest.split_once('@') else {
        return false;
    };
    !provider.is_empty() && !id.is_empty() && !version.is_empty()
}

/// Fixed parameter set applied to every generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationProfile {
    pub model: ImageModel,
    pub number_results: u32,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    pub use_cache: bool,
    pub include_cost: bool,
}

impl GenerationProfile {
    pub fn with_model(mut self, model: ImageModel) -> Self {
        self.model = model;
        self
    }
}

impl Default for GenerationProfile {
    fn default() -> Self {
        Self {
            model: ImageModel::default(),
            number_results: 1,
            width: 1024,
            height: 1024,
            steps: 30,
            cfg_scale: 10.0,
            use_cache: false,
            include_cost: true,
        }
    }
}

/// Everything sent to the provider for one generation attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub task_uuid: Uuid,
    pub prompt: String,
    pub profile: GenerationProfile,
}

/// One candidate output returned by the provider.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImageResult {
    pub task_uuid: Option<String>,
    pub image_uuid: Option<String>,
    pub image_url: Option<String>,
    pub cost: Option<f64>,
}

impl ImageResult {
    pub fn with_url(url: impl Into<String>) -> Self {
        Self {
            image_url: Some(url.into()),
            ..Default::default()
        }
    }

    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = Some(cost);
        self
    }
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    pub runware_api_key: String,
    pub telegram_bot_token: String,
    pub image_model: ImageModel,
    pub runware_base_url: String,
    pub telegram_api_url: String,
    pub poll_timeout_secs: u64,
}

impl Config {
    /// Load `.env` (or `env_file` when given) and then read the process environment.
    pub fn load(env_file: Option<&Path>) -> crate::Result<Self> {
        match env_file {
            Some(path) => {
                dotenvy::from_path(path)?;
            }
            None => {
                dotenvy::dotenv().ok();
            }
        }
        Self::from_env()
    }

    pub fn from_env() -> crate::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> crate::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or_else(|| crate::Error::Config(format!("{} not set", key)))
        };

        let image_model = match lookup("IMAGE_MODEL") {
            Some(value) if !value.trim().is_empty() => value.parse()?,
            _ => ImageModel::default(),
        };

        let poll_timeout_secs = match lookup("POLL_TIMEOUT_SECS") {
            Some(value) => value.trim().parse().map_err(|_| {
                crate::Error::Config(format!(
                    "POLL_TIMEOUT_SECS must be a whole number of seconds, got '{}'",
                    value
                ))
            })?,
            None => DEFAULT_POLL_TIMEOUT_SECS,
        };

        Ok(Self {
            runware_api_key: required("RUNWARE_API_KEY")?,
            telegram_bot_token: required("TELEGRAM_BOT_TOKEN")?,
            image_model,
            runware_base_url: lookup("RUNWARE_BASE_URL")
                .unwrap_or_else(|| DEFAULT_RUNWARE_BASE_URL.to_string()),
            telegram_api_url: lookup("TELEGRAM_API_URL")
                .unwrap_or_else(|| DEFAULT_TELEGRAM_API_URL.to_string()),
            poll_timeout_secs,
        })
    }

    pub fn generation_profile(&self) -> GenerationProfile {
        GenerationProfile::default().with_model(self.image_model.clone())
    }
}
