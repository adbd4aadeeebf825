use std::{env, fs, path::PathBuf};

use anyhow::{Context, Result};
use domain::{
    pipeline::{self, PipelineConfig, ResourcePlan},
    reader::{self, ReaderConfig},
};
use serde::Deserialize;

/// Deployment document: any combination of a pipeline and its worker.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SynthConfig {
    #[serde(default)]
    pipeline: Option<PipelineConfig>,
    #[serde(default)]
    reader: Option<ReaderConfig>,
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();

    let config_path =
        PathBuf::from(env::var("SYNTH_CONFIG").unwrap_or_else(|_| "synth.json".to_string()));
    let raw = fs::read_to_string(&config_path)
        .with_context(|| format!("Failed to read {}", config_path.display()))?;
    let config: SynthConfig = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid configuration in {}", config_path.display()))?;

    let plan = synthesize(&config)?;
    let template = serde_json::to_string_pretty(&plan.to_template())?;

    match env::var("SYNTH_OUTPUT") {
        Ok(output) => {
            fs::write(&output, template).with_context(|| format!("Failed to write {}", output))?;
            tracing::info!("Wrote template to {}", output);
        }
        Err(_) => println!("{}", template),
    }

    Ok(())
}

fn synthesize(config: &SynthConfig) -> Result<ResourcePlan> {
    if config.pipeline.is_none() && config.reader.is_none() {
        anyhow::bail!("Nothing to synthesize: configure a pipeline, a reader or both");
    }

    let mut plan = ResourcePlan::new();

    if let Some(pipeline_config) = &config.pipeline {
        let planned = pipeline::plan(pipeline_config).context("Invalid pipeline configuration")?;
        tracing::info!(
            "Pipeline {} with backup {:?}",
            planned.stream_name,
            planned.backup_mode()
        );
        plan.merge(planned.plan)?;
    }

    if let Some(reader_config) = &config.reader {
        if let Some(pipeline_config) = &config.pipeline {
            if reader_config.kinesis_firehose_name != pipeline_config.delivery_stream_name {
                tracing::warn!(
                    "Reader forwards to {} which is not the planned stream {}",
                    reader_config.kinesis_firehose_name,
                    pipeline_config.delivery_stream_name
                );
            }
        }
        plan.merge(reader::plan(reader_config).context("Invalid reader configuration")?)?;
    }

    Ok(plan)
}
