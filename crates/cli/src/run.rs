//! Wiring for the posting loop

use anyhow::{Context, Result};
use infopost_adapters::{
    bluesky::{BlueskyPublisher, Credentials, StubPublisher},
    llm::{self, GeminiGenerator, StubGenerator},
};
use infopost_domain::{
    Category, Publisher, SystemClock, TextGenerator,
    usecases::{ContentGenerator, GenerateConfig, Scheduler, SchedulerConfig},
};
use secrecy::ExposeSecret;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::args::Cli;
use crate::config::{AppConfig, load_secret};

pub async fn execute(cli: Cli) -> Result<()> {
    let config = AppConfig::load(cli.config.as_deref())?;
    let dry_run = cli.dry_run || config.general.dry_run;

    tracing::info!(
        dry_run = dry_run,
        once = cli.once,
        interval_secs = config.general.interval_secs,
        provider = %config.llm.provider,
        "Starting infopost"
    );

    let generator = build_generator(&config)?;
    let publisher = build_publisher(&config, dry_run)?;

    let content = ContentGenerator::new(
        generator,
        Arc::new(SystemClock),
        generate_config_from_config(&config),
    );

    let scheduler = Scheduler::new(
        content,
        publisher,
        SchedulerConfig {
            interval: Duration::from_secs(config.general.interval_secs),
            dry_run,
            publish_timeout: Duration::from_secs(config.general.publish_timeout_secs),
            max_cycles: cli.once.then_some(1),
        },
    );

    // Set up graceful shutdown
    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received");
            signal_token.cancel();
        }
    });

    let cycles = scheduler.run(shutdown).await;

    tracing::info!(cycles, "infopost stopped");
    Ok(())
}

fn build_generator(config: &AppConfig) -> Result<Arc<dyn TextGenerator>> {
    let llm_config = llm::LlmConfig {
        model: config.llm.model.clone(),
        temperature: config.llm.temperature,
        max_output_tokens: config.llm.max_output_tokens,
        timeout_secs: config.llm.timeout_secs,
        retries: config.llm.retries,
    };

    match config.llm.provider.as_str() {
        "stub" => Ok(Arc::new(StubGenerator::default())),
        _ => {
            let api_key = load_secret(&config.llm.gemini.api_key_env, "gemini")?;
            let generator = GeminiGenerator::with_base_url(
                api_key,
                config.llm.gemini.base_url.clone(),
                llm_config,
            )
            .context("Failed to build Gemini client")?;
            Ok(Arc::new(generator))
        }
    }
}

fn build_publisher(config: &AppConfig, dry_run: bool) -> Result<Arc<dyn Publisher>> {
    if dry_run {
        return Ok(Arc::new(StubPublisher::new()));
    }

    let identifier = load_secret(&config.bluesky.identifier_env, "bluesky identifier")?;
    let password = load_secret(&config.bluesky.password_env, "bluesky password")?;

    let credentials = Credentials {
        identifier: identifier.expose_secret().trim().to_string(),
        password,
    };

    let publisher = BlueskyPublisher::with_service(
        credentials,
        config.bluesky.service.clone(),
        config.bluesky.max_chars,
    )
    .context("Failed to build Bluesky client")?;

    Ok(Arc::new(publisher))
}

fn generate_config_from_config(config: &AppConfig) -> GenerateConfig {
    GenerateConfig {
        categories: config
            .general
            .categories
            .iter()
            .map(|name| name.trim())
            .filter(|name| !name.is_empty())
            .map(Category::new)
            .collect(),
        max_length: config.general.max_post_length,
        generation_timeout: Duration::from_secs(config.general.generation_timeout_secs),
    }
}
