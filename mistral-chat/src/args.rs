use std::path::PathBuf;

use clap::Parser;
use mistral_types::{ChatRequest, Message, RequestParameters};

/// Mistral chat client
#[derive(Debug, Parser)]
#[command(name = "mistral-chat", about = "Send chat completions to the Mistral API")]
pub struct Args {
    /// Path to configuration file (defaults to ./mistral.toml when present)
    #[arg(short, long, env = "MISTRAL_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(flatten)]
    pub params: ParamArgs,

    /// System message sent before the prompt
    #[arg(long)]
    pub system: Option<String>,

    /// Print tokens as they arrive
    #[arg(long)]
    pub stream: bool,

    /// Print the request body and exit without sending it
    #[arg(long)]
    pub dry_run: bool,

    /// List available models and exit
    #[arg(long, conflicts_with_all = ["prompt", "stream", "dry_run"])]
    pub list_models: bool,

    /// User prompt
    #[arg(required_unless_present = "list_models")]
    pub prompt: Option<String>,
}

/// Per-call parameter overrides, layered over `[defaults]`
#[derive(Debug, Clone, Default, clap::Args)]
pub struct ParamArgs {
    /// Target model
    #[arg(short, long)]
    pub model: Option<String>,

    /// Maximum tokens to generate
    #[arg(long, allow_negative_numbers = true)]
    pub max_tokens: Option<i64>,

    /// Sampling temperature
    #[arg(short, long, allow_negative_numbers = true)]
    pub temperature: Option<f64>,

    /// Nucleus sampling threshold
    #[arg(long, allow_negative_numbers = true)]
    pub top_p: Option<f64>,

    /// Seed for reproducible sampling
    #[arg(long, allow_negative_numbers = true)]
    pub random_seed: Option<i64>,

    /// Number of completions
    #[arg(short = 'n', long = "completions", allow_negative_numbers = true)]
    pub n: Option<i64>,

    /// Enable content-safety filtering (true or false)
    #[arg(long)]
    pub safe_mode: Option<bool>,

    /// Reasoning behavior mode
    #[arg(long)]
    pub reasoning_mode: Option<String>,

    /// Presence penalty
    #[arg(long, allow_negative_numbers = true)]
    pub presence_penalty: Option<f64>,

    /// Frequency penalty
    #[arg(long, allow_negative_numbers = true)]
    pub frequency_penalty: Option<f64>,
}

impl From<ParamArgs> for RequestParameters {
    fn from(args: ParamArgs) -> Self {
        Self {
            model: args.model,
            max_tokens: args.max_tokens,
            temperature: args.temperature,
            top_p: args.top_p,
            random_seed: args.random_seed,
            n: args.n,
            safe_mode: args.safe_mode,
            reasoning_mode: args.reasoning_mode,
            presence_penalty: args.presence_penalty,
            frequency_penalty: args.frequency_penalty,
        }
    }
}

impl Args {
    /// Build the chat request, with command-line parameters overriding `defaults`
    pub fn chat_request(&self, defaults: &RequestParameters) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);

        if let Some(ref system) = self.system {
            messages.push(Message::system(system.as_str()));
        }
        if let Some(ref prompt) = self.prompt {
            messages.push(Message::user(prompt.as_str()));
        }

        let params = RequestParameters::from(self.params.clone()).merge(defaults.clone());

        ChatRequest::new(messages).with_params(params).with_stream(self.stream)
    }
}
