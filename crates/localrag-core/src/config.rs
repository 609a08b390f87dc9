//! Lightweight configuration loader and path helpers.
//!
//! Uses Figment to merge built-in defaults + `config.toml` + `config.<env>.toml`
//! + `APP_*` env vars (`__` separates nested keys). Provides helpers to expand
//! `~` and `${VAR}` and to resolve relative paths against a known base directory.

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::chunker::ChunkingConfig;
use crate::error::{Error, Result};
use crate::types::SizeUnit;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagConfig {
    pub chunking: ChunkingConfig,
    pub retrieval: RetrievalConfig,
    pub blend: BlendConfig,
    pub store: StoreConfig,
    pub embedding: EmbeddingConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self { top_k: 5 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BlendConfig {
    pub budget: usize,
    pub unit: SizeUnit,
    pub separator: String,
    /// Word-set Jaccard similarity at or above which a passage counts as a near duplicate.
    pub dedup_threshold: f32,
}

impl Default for BlendConfig {
    fn default() -> Self {
        Self {
            budget: 2000,
            unit: SizeUnit::Chars,
            separator: "\n\n".to_string(),
            dedup_threshold: 0.9,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// JSON-lines snapshot; `~` and `${VAR}` are expanded.
    pub snapshot_path: Option<String>,
    /// Maximum number of chunk embeddings in flight during `store`.
    pub embed_concurrency: usize,
    pub embed_timeout_ms: Option<u64>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { snapshot_path: None, embed_concurrency: 4, embed_timeout_ms: Some(30_000) }
    }
}

impl StoreConfig {
    #[must_use]
    pub fn embed_timeout(&self) -> Option<Duration> {
        self.embed_timeout_ms.map(Duration::from_millis)
    }

    /// Snapshot location resolved against `base` when relative.
    #[must_use]
    pub fn snapshot_path_in(&self, base: &Path) -> Option<PathBuf> {
        self.snapshot_path.as_deref().map(|p| resolve_with_base(base, p))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingConfig {
    /// Which embedder implementation is injected at startup.
    pub backend: String,
    pub dim: usize,
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self { backend: "hash".to_string(), dim: 1024 }
    }
}

impl RagConfig {
    pub fn validate(&self) -> Result<()> {
        self.chunking.validate()?;
        if self.retrieval.top_k == 0 {
            return Err(Error::InvalidConfig("retrieval.top_k must be greater than zero".into()));
        }
        if !(0.0..=1.0).contains(&self.blend.dedup_threshold) {
            return Err(Error::InvalidConfig(format!(
                "blend.dedup_threshold must lie in [0, 1], got {}",
                self.blend.dedup_threshold
            )));
        }
        if self.store.embed_concurrency == 0 {
            return Err(Error::InvalidConfig(
                "store.embed_concurrency must be greater than zero".into(),
            ));
        }
        if self.store.embed_timeout_ms == Some(0) {
            return Err(Error::InvalidConfig(
                "store.embed_timeout_ms must be greater than zero".into(),
            ));
        }
        if self.embedding.dim == 0 {
            return Err(Error::InvalidConfig("embedding.dim must be greater than zero".into()));
        }
        Ok(())
    }
}

pub struct Config {
    figment: Figment,
    env_name: String,
}

impl Config {
    pub fn load() -> Result<Self> {
        let env_name = env::var("RUST_ENV").unwrap_or_else(|_| "dev".to_string());

        let mut figment = Figment::from(Serialized::defaults(RagConfig::default()))
            .merge(Toml::file("config.toml"));
        match env_name.as_str() {
            "dev" | "development" => figment = figment.merge(Toml::file("config.dev.toml")),
            "prod" | "production" => figment = figment.merge(Toml::file("config.prod.toml")),
            "test" | "testing" => figment = figment.merge(Toml::file("config.test.toml")),
            _ => {}
        }
        figment = figment.merge(Env::prefixed("APP_").split("__"));

        let config = Self { figment, env_name };
        config.validate_for_env()?;
        Ok(config)
    }

    /// Wrap an already assembled figment, e.g. one built by a host application.
    pub fn from_figment(figment: Figment, env_name: impl Into<String>) -> Result<Self> {
        let config = Self { figment, env_name: env_name.into() };
        config.validate_for_env()?;
        Ok(config)
    }

    pub fn get<T>(&self, key: &str) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        self.figment
            .extract_inner(key)
            .map_err(|e| Error::InvalidConfig(format!("Failed to get '{}': {}", key, e)))
    }

    /// The typed retrieval configuration, validated.
    pub fn rag(&self) -> Result<RagConfig> {
        let rag: RagConfig = self
            .figment
            .extract()
            .map_err(|e| Error::InvalidConfig(e.to_string()))?;
        rag.validate()?;
        Ok(rag)
    }

    #[must_use]
    pub fn env_name(&self) -> &str {
        &self.env_name
    }

    fn validate_for_env(&self) -> Result<()> {
        let rag = self.rag()?;
        match self.env_name.as_str() {
            "prod" | "production" => {
                if rag.store.snapshot_path.is_none() {
                    return Err(Error::InvalidConfig(
                        "store.snapshot_path is required in production".into(),
                    ));
                }
            }
            "dev" | "development" | "test" | "testing" => {}
            other => tracing::debug!(env = other, "no environment-specific config rules"),
        }
        Ok(())
    }
}

/// Expand a user-provided path string:
/// - Expands leading '~' to the user's home directory
/// - Expands ${VAR} and $VAR environment variables
/// - Returns a PathBuf without attempting to canonicalize
pub fn expand_path<S: AsRef<str>>(input: S) -> PathBuf {
    let s = input.as_ref();
    let expanded_env = shellexpand::env(s).unwrap_or(std::borrow::Cow::Borrowed(s));
    let expanded = shellexpand::tilde(&expanded_env);
    PathBuf::from(expanded.as_ref())
}

/// Resolve a possibly relative path against a given base directory after expansion.
/// If `p` is absolute, it's returned as-is; otherwise `base.join(p)` is returned.
pub fn resolve_with_base<S: AsRef<str>>(base: &Path, p: S) -> PathBuf {
    let p = expand_path(p);
    if p.is_absolute() { p } else { base.join(p) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_valid() {
        let config = RagConfig::default();
        config.validate().expect("defaults validate");
        assert_eq!(config.blend.separator, "\n\n");
        assert_eq!(config.chunking.unit, SizeUnit::Chars);
    }

    #[test]
    fn files_and_env_layer_over_defaults() {
        Jail::expect_with(|jail| {
            jail.set_env("RUST_ENV", "test");
            jail.create_file("config.toml", "[chunking]\nmax_size = 300\noverlap = 40\n")?;
            jail.create_file("config.test.toml", "[retrieval]\ntop_k = 3\n")?;
            jail.set_env("APP_CHUNKING__OVERLAP", "50");
            jail.set_env("APP_BLEND__UNIT", "words");

            let config = Config::load().expect("load");
            let rag = config.rag().expect("rag");
            assert_eq!(config.env_name(), "test");
            assert_eq!(rag.chunking.max_size, 300);
            assert_eq!(rag.chunking.overlap, 50);
            assert_eq!(rag.retrieval.top_k, 3);
            assert_eq!(rag.blend.unit, SizeUnit::Words);
            assert_eq!(rag.store.embed_concurrency, 4);
            assert_eq!(config.get::<usize>("chunking.max_size").expect("key"), 300);
            Ok(())
        });
    }

    #[test]
    fn invalid_overlap_is_rejected_at_load() {
        Jail::expect_with(|jail| {
            jail.set_env("RUST_ENV", "dev");
            jail.create_file("config.toml", "[chunking]\nmax_size = 100\noverlap = 100\n")?;
            assert!(matches!(Config::load(), Err(Error::InvalidConfig(_))));
            Ok(())
        });
    }

    #[test]
    fn production_requires_snapshot_path() {
        Jail::expect_with(|jail| {
            jail.set_env("RUST_ENV", "prod");
            assert!(Config::load().is_err());
            jail.create_file("config.prod.toml", "[store]\nsnapshot_path = \"passages.jsonl\"\n")?;
            let rag = Config::load().expect("load").rag().expect("rag");
            let path = rag.store.snapshot_path_in(Path::new("/var/lib/localrag")).expect("path");
            assert_eq!(path, PathBuf::from("/var/lib/localrag/passages.jsonl"));
            Ok(())
        });
    }

    #[test]
    fn validation_catches_bad_sections() {
        let mut config = RagConfig::default();
        config.blend.dedup_threshold = 1.5;
        assert!(config.validate().is_err());

        let mut config = RagConfig::default();
        config.store.embed_concurrency = 0;
        assert!(config.validate().is_err());

        let mut config = RagConfig::default();
        config.store.embed_timeout_ms = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn resolve_keeps_absolute_paths() {
        let base = Path::new("/base");
        assert_eq!(resolve_with_base(base, "/abs/file"), PathBuf::from("/abs/file"));
        assert_eq!(resolve_with_base(base, "rel/file"), PathBuf::from("/base/rel/file"));
    }
}
