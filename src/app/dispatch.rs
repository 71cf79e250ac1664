use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::app::status::{render_config, render_options};
use crate::cli::commands::{Cli, Commands};
use trigger_desk::Config;
use trigger_desk::api::TriggerClient;
use trigger_desk::channel::PushChannel;
use trigger_desk::form::TriggerForm;
use trigger_desk::model::Id;
use trigger_desk::nuke::{self, PgTeardown};

/// Connect the push channel, mount a form on it and wait for both snapshots.
async fn open_form(config: &Config) -> Result<(PushChannel, TriggerForm)> {
    let channel_url = config.channel_url()?;
    let channel = PushChannel::connect(&channel_url)
        .await
        .with_context(|| format!("connect push channel at {channel_url}"))?;

    let mut form = TriggerForm::new();
    form.mount(&channel)?;

    let timeout = Duration::from_secs(config.snapshot_timeout_secs);
    tokio::time::timeout(timeout, form.wait_until_loaded())
        .await
        .with_context(|| {
            format!(
                "no tags/messages snapshot within {}s",
                config.snapshot_timeout_secs
            )
        })??;

    info!(
        tags = form.state().tags().count(),
        messages = form.state().messages().count(),
        "reference data loaded"
    );
    Ok((channel, form))
}

async fn show_options(config: &Config, json: bool) -> Result<()> {
    let (channel, mut form) = open_form(config).await?;
    let options = form.state().options();
    form.unmount(&channel);

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&options).context("serialize options")?
        );
    } else {
        print!("{}", render_options(&options));
    }
    Ok(())
}

async fn create_trigger(
    config: &Config,
    tag: Option<String>,
    trigger_message: Option<String>,
    message: String,
) -> Result<()> {
    let client = TriggerClient::new(&config.server_url()?);
    let (channel, mut form) = open_form(config).await?;

    let state = form.state_mut();
    state.select_tag(tag.map(Id::from))?;
    state.select_trigger_message(trigger_message.map(Id::from))?;
    state.select_triggered_message(Some(Id::from(message)))?;

    let result = form.submit(&client, &channel).await;
    form.unmount(&channel);
    let reply = result.context("create trigger")?;

    if reply.is_null() {
        println!("Trigger created.");
    } else {
        println!("Trigger created: {reply}");
    }
    Ok(())
}

async fn run_nuke(config: &Config) -> Result<()> {
    let database_url = config.database_url()?;
    let target = PgTeardown::connect(database_url)
        .await
        .context("connect to database")?;
    let report = nuke::nuke(&target).await?;
    println!(
        "NUKED!!! dropped {} table(s): {}",
        report.dropped_tables.len(),
        report.dropped_tables.join(", ")
    );
    Ok(())
}

pub async fn dispatch(cli: Cli, config: Config) -> Result<()> {
    match cli.command {
        Commands::Options { json } => show_options(&config, json).await,

        Commands::Create {
            tag,
            trigger_message,
            message,
        } => create_trigger(&config, tag, trigger_message, message).await,

        Commands::Nuke => run_nuke(&config).await,

        Commands::Config => {
            println!("{}", render_config(&config));
            Ok(())
        }
    }
}
