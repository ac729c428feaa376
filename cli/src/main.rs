use clap::{Parser, Subcommand};

mod commands;
mod util;

#[derive(Parser)]
#[command(name = "tonebridge", version, about = "Tonebridge CLI: talk to the tone-aware chat API and manage its chat log")]
struct Cli {
    /// API base URL
    #[arg(long, env = "TONEBRIDGE_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    /// Chat log user (Basic auth)
    #[arg(long, env = "TONEBRIDGE_LOG_USER")]
    log_user: Option<String>,

    /// Chat log password (Basic auth)
    #[arg(long, env = "TONEBRIDGE_LOG_PASS", hide_env_values = true)]
    log_pass: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// Send a single turn and print the raw response
    Message {
        /// User text (omit to send an empty turn)
        #[arg(long)]
        text: Option<String>,
        /// Context object from the previous turn, as JSON
        #[arg(long)]
        context: Option<String>,
        /// Print compact JSON
        #[arg(long)]
        raw: bool,
    },
    /// Interactive conversation on stdin/stdout
    Chat,
    /// Export the chat log
    Chats {
        /// CSV instead of a JSON table
        #[arg(long)]
        csv: bool,
    },
    /// Delete every chat log entry
    ClearLogs,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let code = match cli.command {
        Commands::Health => commands::health::run(&cli.api_url).await,
        Commands::Message { text, context, raw } => {
            commands::message::run(&cli.api_url, text.as_deref(), context.as_deref(), raw).await
        }
        Commands::Chat => commands::chat::run(&cli.api_url).await,
        Commands::Chats { csv } => {
            commands::logs::export(&cli.api_url, cli.log_user, cli.log_pass, csv).await
        }
        Commands::ClearLogs => commands::logs::clear(&cli.api_url, cli.log_user, cli.log_pass).await,
    };

    std::process::exit(code);
}
