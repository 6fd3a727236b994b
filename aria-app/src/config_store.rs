use anyhow::Context;
use aria_core::AppConfig;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn at_path(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> anyhow::Result<AppConfig> {
        let bytes = std::fs::read(&self.path)
            .with_context(|| format!("read config: {}", self.path.display()))?;
        let cfg: AppConfig = serde_json::from_slice(&bytes).context("decode config JSON")?;
        Ok(cfg)
    }

    /// First run has no config file; that is defaults, not an error.
    pub fn load_or_default(&self) -> anyhow::Result<AppConfig> {
        if !self.path.exists() {
            return Ok(AppConfig::default());
        }
        self.load()
    }

    pub fn save(&self, cfg: &AppConfig) -> anyhow::Result<()> {
        let json = serde_json::to_vec_pretty(cfg).context("encode config JSON")?;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create config directory: {}", parent.display()))?;
        }

        // Atomic-ish write: write temp then replace.
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, json).with_context(|| format!("write temp: {}", tmp.display()))?;
        replace_file(&tmp, &self.path)
            .with_context(|| format!("replace file: {}", self.path.display()))?;
        Ok(())
    }
}

fn replace_file(tmp: &Path, dst: &Path) -> anyhow::Result<()> {
    let backup = dst.with_extension("bak");

    if dst.exists() {
        let _ = std::fs::remove_file(&backup);
        std::fs::rename(dst, &backup)
            .with_context(|| format!("failed rename {} -> {}", dst.display(), backup.display()))?;
    }

    if let Err(e) = std::fs::rename(tmp, dst) {
        // Try to restore the previous file if we had one.
        if backup.exists() {
            let _ = std::fs::rename(&backup, dst);
        }
        let _ = std::fs::remove_file(tmp);
        return Err(anyhow::Error::new(e)
            .context(format!("failed rename {} -> {}", tmp.display(), dst.display())));
    }

    let _ = std::fs::remove_file(&backup);
    Ok(())
}
