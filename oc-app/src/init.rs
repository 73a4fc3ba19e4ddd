//! `.env` scaffolding for `onechat init`.
//!
//! Writes the environment template into the working directory without
//! overwriting an existing file.

use anyhow::Result;
use std::path::{Path, PathBuf};

const ENV_TEMPLATE: &str = include_str!("../templates/env.example");

#[derive(Debug, Clone)]
pub enum InitOutcome {
    Created(PathBuf),
    Kept(PathBuf),
}

pub async fn initialize(dir: &Path) -> Result<InitOutcome> {
    let target = dir.join(".env");
    match tokio::fs::metadata(&target).await {
        Ok(_) => Ok(InitOutcome::Kept(target)),
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| anyhow::anyhow!("create {}: {e}", dir.display()))?;
            tokio::fs::write(&target, ENV_TEMPLATE)
                .await
                .map_err(|e| anyhow::anyhow!("write {}: {e}", target.display()))?;
            Ok(InitOutcome::Created(target))
        }
        Err(err) => Err(anyhow::anyhow!(
            "inspect {}: {err}",
            target.display()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::{ENV_TEMPLATE, InitOutcome, initialize};
    use std::path::PathBuf;
    use uuid::Uuid;

    fn temp_dir(name: &str) -> PathBuf {
        std::env::temp_dir().join(format!("onechat-init-{name}-{}", Uuid::new_v4()))
    }

    #[tokio::test]
    async fn init_writes_template_when_missing() {
        let dir = temp_dir("create");
        let outcome = initialize(&dir).await.expect("init succeeds");

        match outcome {
            InitOutcome::Created(path) => {
                let written = std::fs::read_to_string(&path).expect("template readable");
                assert_eq!(written, ENV_TEMPLATE);
                assert!(written.contains("OPENAI_API_KEY="));
            }
            InitOutcome::Kept(path) => panic!("unexpected kept {}", path.display()),
        }

        let _ = std::fs::remove_dir_all(dir);
    }

    #[tokio::test]
    async fn init_never_overwrites_an_existing_env() {
        let dir = temp_dir("keep");
        std::fs::create_dir_all(&dir).expect("temp dir");
        let existing = dir.join(".env");
        std::fs::write(&existing, "OPENAI_API_KEY=sk-keep-me\n").expect("seed .env");

        let outcome = initialize(&dir).await.expect("init succeeds");
        assert!(matches!(outcome, InitOutcome::Kept(_)));
        assert_eq!(
            std::fs::read_to_string(&existing).expect("still readable"),
            "OPENAI_API_KEY=sk-keep-me\n"
        );

        let _ = std::fs::remove_dir_all(dir);
    }
}
