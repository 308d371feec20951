use anyhow::Result;
use clap::Parser;
use clap::builder::NonEmptyStringValueParser;
use coverart::Config;
use coverart::http::{MAX_RETRIES, RETRY_DELAY_MS, RetryPolicy};
use serde::Serialize;
use std::process::ExitCode;
use std::time::Duration;

/// coverart - Cover Art Archive lookup
///
/// Prints the front-cover image URL of a release. Exits with status 1 when
/// no URL could be resolved, whether because the release has no art or
/// because the lookup failed (see the log on stderr).
///
/// Examples:
///   coverart 76df3287-6cda-33eb-8e9a-044b5e15ffdd
#[derive(Parser, Debug)]
#[command(author, version = env!("COVERART_VERSION"), about)]
struct Cli {
    /// Release identifier to look up
    #[arg(value_name = "ALBUM_ID", value_parser = NonEmptyStringValueParser::new())]
    album_id: String,

    /// Art archive URL (defaults to http://coverartarchive.org)
    #[arg(long = "api-url", env = "COVERART_API_URL", value_name = "URL")]
    api_url: Option<String>,

    /// User agent sent with requests
    #[arg(long = "user-agent", value_name = "UA")]
    user_agent: Option<String>,

    /// Re-attempts on 429 and 5xx responses
    #[arg(long, value_name = "N", default_value_t = MAX_RETRIES)]
    retries: u32,

    /// Linear backoff unit; the n-th retry waits n times this
    #[arg(long = "retry-delay-ms", value_name = "MS", default_value_t = RETRY_DELAY_MS)]
    retry_delay_ms: u64,

    /// Print the result as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Serialize)]
struct Lookup<'a> {
    album_id: &'a str,
    url: Option<&'a str>,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();

    let retry = RetryPolicy::linear(cli.retries, Duration::from_millis(cli.retry_delay_ms));
    let config = Config::new(cli.api_url, cli.user_agent, retry);
    let url = config.resolver()?.album_art(&cli.album_id).await;

    if cli.json {
        let lookup = Lookup {
            album_id: &cli.album_id,
            url: url.as_deref(),
        };
        println!("{}", serde_json::to_string(&lookup)?);
    } else if let Some(url) = &url {
        println!("{}", url);
    }

    Ok(if url.is_some() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
