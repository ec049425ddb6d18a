use std::fs;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use pagechat_core::{RawPage, Response, SCRAPE_PREFIX, Session, SessionConfig};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;
use url::Url;

mod echo;

const VERSION: &str = env!("CARGO_PKG_VERSION");
const MIN_ANSWER_CHARS: u64 = 20;

/// Chat with a web page from the terminal
#[derive(Parser, Debug)]
#[command(name = "pagechat")]
#[command(author = "Pagechat Contributors")]
#[command(version)]
#[command(about = "Scrape a web page, then ask questions about it", long_about = None)]
struct Args {
    /// Page to scrape before the first message
    #[arg(long, value_name = "URL", conflicts_with = "html")]
    url: Option<String>,

    /// Local HTML file to load instead of fetching
    #[arg(long, value_name = "FILE")]
    html: Option<PathBuf>,

    /// URL the local HTML file is treated as coming from (default: its file:// URL)
    #[arg(long, value_name = "URL", requires = "html")]
    base_url: Option<String>,

    /// Ask a single question and exit instead of reading stdin
    #[arg(short = 'q', long, value_name = "QUESTION")]
    question: Option<String>,

    /// Print each reply as a JSON line
    #[arg(long)]
    json: bool,

    /// HTTP timeout in seconds
    #[arg(long, default_value = "15", value_name = "SECS")]
    timeout: u64,

    /// Maximum number of redirects to follow
    #[arg(long, default_value = "5", value_name = "NUM")]
    max_redirects: usize,

    /// Custom User-Agent for HTTP requests
    #[arg(long, value_name = "UA")]
    user_agent: Option<String>,

    /// Maximum answer length in characters (at least 20)
    #[arg(
        long,
        default_value = "600",
        value_name = "NUM",
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(MIN_ANSWER_CHARS..)
    )]
    max_answer_chars: usize,

    /// Generate shell completion script
    #[arg(long, value_name = "SHELL")]
    completions: Option<Shell>,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

/// Renders replies in the format the user asked for
struct Output {
    json: bool,
    verbose: bool,
    failed: bool,
}

impl Output {
    fn emit(&mut self, response: &Response) -> anyhow::Result<()> {
        self.failed |= response.is_error();
        if self.json {
            return echo::print_json(response);
        }
        echo::print_response(response);
        if self.verbose {
            echo::print_details(response);
        }
        Ok(())
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("warn,pagechat_core=debug,pagechat=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).with_writer(io::stderr).with_target(false).init();
}

fn session_config(args: &Args) -> SessionConfig {
    let mut builder = SessionConfig::builder()
        .timeout(args.timeout)
        .max_redirects(args.max_redirects)
        .max_answer_chars(args.max_answer_chars);

    if let Some(ua) = &args.user_agent {
        builder = builder.user_agent(ua.as_str());
    }

    builder.build()
}

/// Reads a local file into a page, resolving links against `base_url` or the file's own URL.
fn load_html(path: &Path, base_url: Option<&str>) -> anyhow::Result<RawPage> {
    let html = fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path.display()))?;

    let base = match base_url {
        Some(url) => Url::parse(url).with_context(|| format!("Invalid base URL: {url}"))?,
        None => {
            let absolute = fs::canonicalize(path).with_context(|| format!("Failed to resolve {}", path.display()))?;
            Url::from_file_path(&absolute)
                .map_err(|()| anyhow::anyhow!("Cannot build a file URL for {}", absolute.display()))?
        }
    };

    tracing::debug!(path = %path.display(), base = %base, bytes = html.len(), "loaded local html");
    Ok(RawPage::from_html(base, html))
}

async fn repl(session: &Session, output: &mut Output) -> anyhow::Result<()> {
    let interactive = io::stdin().is_terminal();
    if interactive && !output.json {
        echo::print_hint();
    }

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if interactive {
            echo::print_prompt();
        }

        let Some(line) = lines.next_line().await.context("Failed to read from stdin")? else {
            break;
        };
        let line = line.trim();

        if line.is_empty() {
            continue;
        }
        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        let response = session.handle(line).await;
        output.emit(&response)?;
    }

    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Some(shell) = args.completions {
        clap_complete::generate(shell, &mut Args::command(), "pagechat", &mut io::stdout());
        return ExitCode::SUCCESS;
    }

    init_tracing(args.verbose);

    match run(&args).await {
        Ok(code) => code,
        Err(err) => {
            echo::print_error(&format!("{err:#}"));
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> anyhow::Result<ExitCode> {
    if args.verbose {
        echo::print_banner();
        echo::print_info("Debug logging enabled");
        eprintln!();
    }

    let session = Session::new(session_config(args)).context("Failed to build HTTP client")?;
    let mut output = Output { json: args.json, verbose: args.verbose, failed: false };

    if let Some(path) = &args.html {
        let page = load_html(path, args.base_url.as_deref())?;
        output.emit(&session.ingest(&page))?;
    } else if let Some(url) = &args.url {
        output.emit(&session.handle(&format!("{SCRAPE_PREFIX} {url}")).await)?;
    }

    match &args.question {
        Some(question) => {
            output.emit(&session.handle(question).await)?;
            Ok(if output.failed { ExitCode::FAILURE } else { ExitCode::SUCCESS })
        }
        None => {
            repl(&session, &mut output).await?;
            session.shutdown();
            Ok(ExitCode::SUCCESS)
        }
    }
}
