//! Test fixtures for pipeline testing.

use std::sync::Arc;

use anyhow::Context;

use super::mocks::{CounterAgent, SuffixAgent, WaitKAgent};
use crate::agents::{Agent, AgentConfig, AgentRegistry};
use crate::core::SegmentType;
use crate::pipeline::{TreePipeline, TreePipelineBuilder};

/// Builds the canonical fan-out tree `a -> [b, c]`.
///
/// `a` appends `"1"`, each leaf appends its own name, so pushing `"x"`
/// yields `"x1b"` and `"x1c"`.
///
/// # Panics
///
/// Panics if `output_index` is out of range.
#[must_use]
pub fn fan_out_tree(output_index: Option<usize>) -> TreePipeline {
    let mut builder = TreePipelineBuilder::new("fan-out")
        .node("a", Arc::new(SuffixAgent::new("a", "1")), &["b", "c"])
        .node("b", Arc::new(SuffixAgent::new("b", "b")), &[])
        .node("c", Arc::new(SuffixAgent::new("c", "c")), &[]);
    if let Some(index) = output_index {
        builder = builder.output_index(index);
    }
    builder.build().expect("fan-out fixture is valid")
}

/// Builds a speech-to-text and speech-to-speech tree.
///
/// `asr` (speech to text) feeds `mt` (text) and `tts` (text to speech), so
/// the composite target type is `text_speech`.
#[must_use]
pub fn speech_tree() -> TreePipeline {
    TreePipelineBuilder::new("speech")
        .node(
            "asr",
            Arc::new(
                SuffixAgent::new("asr", "").with_types(SegmentType::SPEECH, SegmentType::TEXT),
            ),
            &["mt", "tts"],
        )
        .node("mt", Arc::new(SuffixAgent::new("mt", ":mt")), &[])
        .node(
            "tts",
            Arc::new(
                SuffixAgent::new("tts", ":tts").with_types(SegmentType::TEXT, SegmentType::SPEECH),
            ),
            &[],
        )
        .build()
        .expect("speech fixture is valid")
}

/// Creates a registry with the mock agent kinds `suffix`, `wait_k` and
/// `counter`.
///
/// Recognised keys: `name`, `suffix`, `source_type`, `target_type`, `k`.
#[must_use]
pub fn mock_registry() -> AgentRegistry {
    let registry = AgentRegistry::new();

    registry.register("suffix", |config: &AgentConfig| {
        let agent = SuffixAgent::new(
            string_field(config, "name")?.unwrap_or("suffix"),
            string_field(config, "suffix")?.unwrap_or_default(),
        )
        .with_types(
            type_field(config, "source_type")?,
            type_field(config, "target_type")?,
        );
        Ok(Arc::new(agent) as Arc<dyn Agent>)
    });

    registry.register("wait_k", |config: &AgentConfig| {
        let k = match config.get("k") {
            Some(value) => value.as_u64().context("'k' must be a non-negative integer")?,
            None => 1,
        };
        let agent = WaitKAgent::new(
            string_field(config, "name")?.unwrap_or("wait_k"),
            usize::try_from(k)?,
        )
        .with_type(type_field(config, "source_type")?);
        Ok(Arc::new(agent) as Arc<dyn Agent>)
    });

    registry.register("counter", |config: &AgentConfig| {
        let agent = CounterAgent::new(string_field(config, "name")?.unwrap_or("counter"));
        Ok(Arc::new(agent) as Arc<dyn Agent>)
    });

    registry
}

fn string_field<'a>(config: &'a AgentConfig, key: &str) -> anyhow::Result<Option<&'a str>> {
    config
        .get(key)
        .map(|value| {
            value
                .as_str()
                .with_context(|| format!("'{key}' must be a string"))
        })
        .transpose()
}

fn type_field(config: &AgentConfig, key: &str) -> anyhow::Result<SegmentType> {
    Ok(string_field(config, key)?
        .map_or(SegmentType::TEXT, |tag| SegmentType::new(tag.to_string())))
}
