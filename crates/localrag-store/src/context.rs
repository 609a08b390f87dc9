//! Composition of ranked passages into one bounded context string.

use std::collections::HashSet;

use localrag_core::config::BlendConfig;
use localrag_core::error::{Error, Result};
use localrag_core::types::{Passage, SizeUnit};

#[derive(Debug, Clone)]
pub struct ContextBlender {
    unit: SizeUnit,
    separator: String,
    dedup_threshold: f32,
}

impl Default for ContextBlender {
    fn default() -> Self {
        let config = BlendConfig::default();
        Self {
            unit: config.unit,
            separator: config.separator,
            dedup_threshold: config.dedup_threshold,
        }
    }
}

impl ContextBlender {
    pub fn new(config: &BlendConfig) -> Result<Self> {
        if !(0.0..=1.0).contains(&config.dedup_threshold) {
            return Err(Error::InvalidConfig(format!(
                "dedup_threshold must lie in [0, 1], got {}",
                config.dedup_threshold
            )));
        }
        Ok(Self {
            unit: config.unit,
            separator: config.separator.clone(),
            dedup_threshold: config.dedup_threshold,
        })
    }

    #[must_use]
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    #[must_use]
    pub fn with_unit(mut self, unit: SizeUnit) -> Self {
        self.unit = unit;
        self
    }

    /// Join passage texts in rank order without exceeding `budget`.
    #[must_use]
    pub fn blend(&self, ranked: &[Passage], budget: usize) -> String {
        self.blend_texts(ranked.iter().map(|p| p.text.as_str()), budget)
    }

    /// Near duplicates of an already selected text are skipped. Selection
    /// stops at the first text that would overflow `budget`; texts are never
    /// truncated.
    pub fn blend_texts<'a>(
        &self,
        ranked: impl IntoIterator<Item = &'a str>,
        budget: usize,
    ) -> String {
        let separator_cost = self.unit.measure(&self.separator);
        let mut selected: Vec<(&str, HashSet<String>)> = Vec::new();
        let mut out = String::new();
        let mut used = 0usize;

        for text in ranked {
            if text.trim().is_empty() {
                continue;
            }
            let words = word_set(text);
            let duplicate = selected.iter().any(|(kept, kept_words)| {
                kept.contains(text) || jaccard(kept_words, &words) >= self.dedup_threshold
            });
            if duplicate {
                tracing::debug!(len = text.len(), "skipping near-duplicate passage");
                continue;
            }
            // Measuring parts separately can only overcount words, never undercount.
            let joiner = if selected.is_empty() { 0 } else { separator_cost };
            let cost = self.unit.measure(text) + joiner;
            if used + cost > budget {
                break;
            }
            if !selected.is_empty() {
                out.push_str(&self.separator);
            }
            out.push_str(text);
            used += cost;
            selected.push((text, words));
        }
        out
    }
}

fn word_set(text: &str) -> HashSet<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f32 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f32 / union as f32
}
