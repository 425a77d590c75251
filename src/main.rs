use clap::Parser;
use fileai::ai::OpenAiClient;
use fileai::{AppConfig, Dispatcher};
use std::error::Error;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "fileai", version)]
#[command(about = "Summarize text files and describe images with an AI model")]
struct Args {
    /// Path to the file to be analyzed
    #[arg(short, long)]
    file: PathBuf,

    /// Config file (default: prompts/prompts.json, then <config dir>/fileai/config.json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print a {"filename", "description"} JSON object instead of plain text
    #[arg(long)]
    json: bool,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL for OpenAI-compatible servers
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    // Before parsing so .env values reach clap's env fallback
    fileai::init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = AppConfig::load(args.config.as_deref())?.with_api_key(args.api_key);
    if let Some(base_url) = args.base_url {
        config = config.with_base_url(base_url);
    }

    let gateway = OpenAiClient::new(&config.base_url, config.request_timeout_secs)?;
    let dispatcher = Dispatcher::new(config, gateway);

    let result = dispatcher.analyze_file(&args.file).await?;

    if args.json {
        println!("{}", serde_json::to_string(&result)?);
    } else {
        println!("{}", result.summary_or_description);
    }

    Ok(())
}
