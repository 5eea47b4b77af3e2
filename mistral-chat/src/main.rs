#![allow(clippy::must_use_candidate, clippy::missing_errors_doc)]

mod args;

use std::collections::BTreeMap;
use std::future::Future;
use std::io::Write;
use std::path::Path;
use std::process::ExitCode;

use args::Args;
use clap::Parser;
use futures::StreamExt;
use mistral_client::MistralClient;
use mistral_config::Config;
use mistral_types::{ChatEvent, ChatRequest};
use tokio_util::sync::CancellationToken;

const DEFAULT_CONFIG_PATH: &str = "mistral.toml";

/// Exit status after Ctrl-C, as a shell reports SIGINT
const CANCELLED_EXIT_CODE: u8 = 130;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();

    // Load configuration
    let config = load_config(args.config.as_deref(), Path::new("."))?;

    // Initialize logging
    mistral_telemetry::init(&config.logging)?;

    tracing::debug!(
        base_url = %config.api.base_url,
        defaults = ?config.defaults.present_keys(),
        validation = config.validation.enabled,
        "configuration loaded"
    );

    let client = MistralClient::from_config(&config.api)?.with_validation(config.validation.enabled);

    if args.list_models {
        list_models(&client).await?;
        return Ok(ExitCode::SUCCESS);
    }

    let request = args.chat_request(&config.defaults);

    if args.dry_run {
        println!("{}", render_dry_run(&request, config.validation.enabled)?);
        return Ok(ExitCode::SUCCESS);
    }

    // Cancel the in-flight request on Ctrl-C
    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown_clone.cancel();
        }
    });

    match run_until_cancelled(send(&client, &request), &shutdown).await? {
        Outcome::Completed => Ok(ExitCode::SUCCESS),
        Outcome::Cancelled => {
            tracing::warn!("request cancelled");
            Ok(ExitCode::from(CANCELLED_EXIT_CODE))
        }
    }
}

/// How a request run ended
#[derive(Debug, PartialEq, Eq)]
enum Outcome {
    Completed,
    Cancelled,
}

/// Drive `work` to completion unless `shutdown` fires first
async fn run_until_cancelled<F>(work: F, shutdown: &CancellationToken) -> anyhow::Result<Outcome>
where
    F: Future<Output = anyhow::Result<()>>,
{
    tokio::select! {
        result = work => result.map(|()| Outcome::Completed),
        () = shutdown.cancelled() => Ok(Outcome::Cancelled),
    }
}

/// Load the given config file, or `mistral.toml` in `dir` if present, or built-in defaults
fn load_config(path: Option<&Path>, dir: &Path) -> anyhow::Result<Config> {
    match path {
        Some(path) => Config::load(path),
        None => {
            let default_path = dir.join(DEFAULT_CONFIG_PATH);
            if default_path.exists() {
                Config::load(&default_path)
            } else {
                Ok(Config::default())
            }
        }
    }
}

/// Pretty JSON body that would be sent, checked first when validation is on
fn render_dry_run(request: &ChatRequest, validate: bool) -> anyhow::Result<String> {
    if validate {
        mistral_types::validate(&request.params)?;
    }

    Ok(serde_json::to_string_pretty(request)?)
}

async fn list_models(client: &MistralClient) -> anyhow::Result<()> {
    let models = client.list_models().await?;

    for model in models {
        println!("{}", model.id);
    }

    Ok(())
}

async fn send(client: &MistralClient, request: &ChatRequest) -> anyhow::Result<()> {
    if !request.stream {
        let response = client.chat_completion(request).await?;

        for choice in &response.choices {
            println!("{}", choice.message.content.as_deref().unwrap_or_default());
        }

        return Ok(());
    }

    let mut events = client.chat_completion_stream(request).await?;
    let mut stdout = std::io::stdout();

    // Choice 0 is printed live, the others once the stream is done
    let mut pending: BTreeMap<u32, String> = BTreeMap::new();

    while let Some(event) = events.next().await {
        match event? {
            ChatEvent::ContentDelta { index: 0, content } => {
                write!(stdout, "{content}")?;
                stdout.flush()?;
            }
            ChatEvent::ContentDelta { index, content } => {
                pending.entry(index).or_default().push_str(&content);
            }
            ChatEvent::Done { finish_reason, usage } => {
                writeln!(stdout)?;
                for text in pending.values() {
                    writeln!(stdout, "{text}")?;
                }
                tracing::debug!(?finish_reason, ?usage, "stream finished");
                break;
            }
        }
    }

    Ok(())
}
