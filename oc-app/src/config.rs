//! Environment-driven configuration for onechat.
//!
//! Values come from process environment variables (optionally seeded from a
//! local `.env` file); command-line flags override them in `commands`.

use anyhow::Result;

pub const DEFAULT_MODEL: &str = "gpt-4";
pub const DEFAULT_TEMPERATURE: f32 = 0.1;
pub const DEFAULT_SYSTEM_PROMPT: &str = "What's the meaning of life?";
pub const DEFAULT_PROJECT: &str = "onechat";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub system_prompt: String,
    pub project: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: oc_llm::DEFAULT_BASE_URL.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            project: DEFAULT_PROJECT.to_string(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let mut cfg = Self::default();
        cfg.apply_env_overrides()?;
        Ok(cfg)
    }

    fn apply_env_overrides(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("OPENAI_API_KEY") {
            if !v.trim().is_empty() {
                self.api_key = v;
            }
        }
        if let Ok(v) = std::env::var("OPENAI_BASE_URL") {
            if !v.trim().is_empty() {
                self.base_url = v;
            }
        }
        if let Ok(v) = std::env::var("ONECHAT_MODEL") {
            if !v.trim().is_empty() {
                self.model = v;
            }
        }
        if let Ok(v) = std::env::var("ONECHAT_TEMPERATURE") {
            if !v.trim().is_empty() {
                self.temperature = parse_temperature(&v)?;
            }
        }
        if let Ok(v) = std::env::var("ONECHAT_SYSTEM_PROMPT") {
            if !v.trim().is_empty() {
                self.system_prompt = v;
            }
        }
        if let Ok(v) = std::env::var("ONECHAT_PROJECT") {
            if !v.trim().is_empty() {
                self.project = v;
            }
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_key.trim().is_empty() {
            return Err(anyhow::anyhow!(
                "OPENAI_API_KEY is required (set it in the environment or a local .env)"
            ));
        }
        validate_base_url(&self.base_url)?;
        if self.model.trim().is_empty() {
            return Err(anyhow::anyhow!("model must not be blank"));
        }
        validate_temperature(self.temperature)?;
        if self.system_prompt.is_empty() {
            return Err(anyhow::anyhow!("system prompt must not be empty"));
        }
        Ok(())
    }
}

fn parse_temperature(raw: &str) -> Result<f32> {
    let t: f32 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("ONECHAT_TEMPERATURE must be a number, got {raw:?}"))?;
    validate_temperature(t)?;
    Ok(t)
}

fn validate_temperature(t: f32) -> Result<()> {
    if !t.is_finite() || !(0.0..=2.0).contains(&t) {
        return Err(anyhow::anyhow!(
            "temperature must be within 0.0..=2.0, got {t}"
        ));
    }
    Ok(())
}

fn validate_base_url(url: &str) -> Result<()> {
    if !(url.starts_with("https://") || url.starts_with("http://")) {
        return Err(anyhow::anyhow!(
            "base URL must start with http:// or https://, got {url:?}"
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn configured() -> AppConfig {
        AppConfig {
            api_key: "sk-test".to_string(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn defaults_validate_once_key_is_set() {
        let cfg = configured();
        cfg.validate().expect("defaults are valid");
        assert_eq!(cfg.model, "gpt-4");
        assert_eq!(cfg.base_url, oc_llm::DEFAULT_BASE_URL);
        assert_eq!(cfg.system_prompt, "What's the meaning of life?");
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let cfg = AppConfig {
            api_key: "   ".to_string(),
            ..AppConfig::default()
        };
        let err = cfg.validate().expect_err("blank key must fail");
        assert!(err.to_string().contains("OPENAI_API_KEY"));
    }

    #[test]
    fn non_http_base_url_is_rejected() {
        let cfg = AppConfig {
            base_url: "file:///etc/passwd".to_string(),
            ..configured()
        };
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn temperature_must_be_in_range() {
        for bad in [-0.5, 2.5, f32::NAN, f32::INFINITY] {
            let cfg = AppConfig {
                temperature: bad,
                ..configured()
            };
            assert!(cfg.validate().is_err(), "temperature {bad} must fail");
        }
        let cfg = AppConfig {
            temperature: 2.0,
            ..configured()
        };
        cfg.validate().expect("boundary temperature is valid");
    }

    #[test]
    fn temperature_parsing_reports_the_raw_value() {
        assert_eq!(parse_temperature(" 0.7 ").expect("parses"), 0.7);
        let err = parse_temperature("warm").expect_err("non-numeric must fail");
        assert!(err.to_string().contains("warm"));
        assert!(parse_temperature("3.0").is_err(), "range check applies");
    }
}
