//! `gamelink`: drive the game backend API from the command line.
//!
//! Every subcommand goes through the same `RequestExecutor` or `SocketSession`
//! the game uses, so identity headers, timeout rules and error notices behave
//! exactly as they do in the client.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use serde_json::Value;

use gamelink_net::config::load_config_or_default;
use gamelink_net::events::{ErrorNotice, FnSink};
use gamelink_net::observability::init_logging;
use gamelink_net::resilience::timeouts::{RequestTimeout, TIMEOUT_SENTINEL};
use gamelink_net::ws::{ReadyState, SocketMessage};
use gamelink_net::{ApiResult, MultipartForm, RequestExecutor, SocketEvent, SocketSession};

#[derive(Parser)]
#[command(name = "gamelink")]
#[command(about = "Client for the game backend API and socket server", long_about = None)]
struct Cli {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the session token
    #[arg(long)]
    token: Option<String>,

    /// Override the log level (e.g. "debug", "gamelink_net=trace")
    #[arg(long)]
    log_level: Option<String>,

    /// Request timeout in seconds; omit for the default
    #[arg(short, long, default_value_t = TIMEOUT_SENTINEL, allow_negative_numbers = true)]
    timeout: i32,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// GET a URL and print the JSON response
    Get { url: String },
    /// POST a body and print the JSON response
    Post { url: String, body: String },
    /// PUT a body and print the JSON response
    Put { url: String, body: String },
    /// PATCH a body and print the JSON response
    Patch { url: String, body: String },
    /// POST a multipart form
    Form {
        url: String,
        /// Text field, as name=value
        #[arg(short, long = "field", value_parser = parse_pair)]
        fields: Vec<(String, String)>,
        /// File part, as name=path
        #[arg(long = "file", value_parser = parse_pair)]
        files: Vec<(String, String)>,
    },
    /// Download and decode an image
    Texture {
        url: String,
        /// Also keep the raw bytes under <storage root>/<key>/<file name>
        #[arg(long, requires = "file_name")]
        key: Option<String>,
        #[arg(long)]
        file_name: Option<String>,
    },
    /// Stream a URL to a local file
    Download { url: String, dest: PathBuf },
    /// Open a socket, send messages and print events
    Socket {
        /// Socket URL; falls back to the configured one
        url: Option<String>,
        /// Text frame to send once open (repeatable)
        #[arg(short, long)]
        send: Vec<String>,
        /// Seconds to listen before disconnecting
        #[arg(short, long, default_value_t = 5)]
        wait: u64,
    },
}

fn parse_pair(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected name=value, got {s:?}"))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config_or_default(cli.config.as_deref())?;
    if let Some(token) = cli.token {
        config.identity.token = token;
    }
    if let Some(level) = cli.log_level {
        config.observability.log_level = level;
    }
    init_logging(&config.observability)?;

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "gamelink starting");

    let timeout = RequestTimeout::from(cli.timeout);
    let sink = Arc::new(FnSink(|notice: ErrorNotice| {
        eprintln!("error notice: status {} body {}", notice.status, notice.body);
    }));

    match cli.command {
        Commands::Socket { url, send, wait } => {
            let url = url
                .or_else(|| config.socket.url.clone())
                .ok_or("no socket url given and none configured")?;
            run_socket(url, send, Duration::from_secs(wait)).await?;
        }
        command => {
            let executor = RequestExecutor::from_config(&config, sink)?;
            run_http(&executor, command, timeout).await?;
        }
    }

    Ok(())
}

async fn run_http(
    executor: &RequestExecutor,
    command: Commands,
    timeout: RequestTimeout,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Get { url } => print_json(executor.get(&url, timeout).await)?,
        Commands::Post { url, body } => print_json(executor.post(&url, &body, timeout).await)?,
        Commands::Put { url, body } => print_json(executor.put(&url, &body, timeout).await)?,
        Commands::Patch { url, body } => print_json(executor.patch(&url, &body, timeout).await)?,
        Commands::Form { url, fields, files } => {
            let mut form = MultipartForm::new();
            for (name, value) in fields {
                form = form.field(name, value);
            }
            for (name, path) in files {
                let data = tokio::fs::read(&path).await?;
                let filename = PathBuf::from(&path)
                    .file_name()
                    .map(|f| f.to_string_lossy().into_owned())
                    .unwrap_or_else(|| path.clone());
                form = form.file(name, filename, "application/octet-stream", data);
            }
            print_json(executor.post_form(&url, &form, timeout).await)?;
        }
        Commands::Texture { url, key, file_name } => {
            let texture = executor.get_texture(&url).await?;
            println!("{}x{} ({} bytes rgba)", texture.width, texture.height, texture.rgba.len());
            if let (Some(key), Some(file_name)) = (key, file_name) {
                let path = executor.save_texture(&key, &url, &file_name).await?;
                println!("saved {}", path.display());
            }
        }
        Commands::Download { url, dest } => {
            let bytes = executor.download_file(&url, &dest, timeout).await?;
            println!("wrote {bytes} bytes to {}", dest.display());
        }
        Commands::Socket { .. } => return Err("socket is not an HTTP command".into()),
    }
    Ok(())
}

fn print_json(result: ApiResult<Value>) -> Result<(), Box<dyn std::error::Error>> {
    let value = result?;
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

async fn run_socket(
    url: String,
    outgoing: Vec<String>,
    wait: Duration,
) -> Result<(), Box<dyn std::error::Error>> {
    let (session, mut events) = SocketSession::new(url)?;
    session.connect();

    let deadline = tokio::time::sleep(wait);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            _ = &mut deadline, if session.is_alive() => {
                session.disconnect();
            }
            event = events.recv() => match event {
                Some(SocketEvent::Open) => {
                    println!("open");
                    for message in &outgoing {
                        session.send(message)?;
                    }
                }
                Some(SocketEvent::Message(SocketMessage::Text(text))) => println!("text: {text}"),
                Some(SocketEvent::Message(SocketMessage::Binary(data))) => {
                    println!("binary: {} bytes", data.len())
                }
                Some(SocketEvent::Message(SocketMessage::Ping(_))) => println!("ping"),
                Some(SocketEvent::Error(error)) => {
                    eprintln!("error: {error}");
                    // Failed handshakes produce no close event
                    if session.ready_state() == ReadyState::Closed {
                        break;
                    }
                }
                Some(SocketEvent::Close { code, reason }) => {
                    println!("closed: {code} {reason}");
                    break;
                }
                None => break,
            }
        }
    }
    Ok(())
}
