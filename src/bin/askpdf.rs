//! CLI binary for edgequake-askpdf.
//!
//! A thin shell over the library's [`Session`]: maps flags to a
//! `ClientConfig`, prints notifications as coloured lines, and shows a spinner
//! while a request is in flight.

use anyhow::{Context, Result};
use clap::Parser;
use edgequake_askpdf::{
    Answer, AskPdfError, ClientConfig, Document, ErrorKind, Level, Notification, Notifier,
    RagClient, Session, DEFAULT_BASE_URL,
};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── Terminal notifier ────────────────────────────────────────────────────────

/// Prints each notification as one line on stderr.
struct TerminalNotifier {
    quiet: bool,
}

impl Notifier for TerminalNotifier {
    fn notify(&self, notification: Notification) {
        match notification.level {
            Level::Success if !self.quiet => {
                eprintln!("{} {}", green("✓"), notification.message);
            }
            Level::Success => {}
            Level::Error => eprintln!("{} {}", red("✗"), red(&notification.message)),
        }
    }
}

/// Spinner shown while a request is in flight.
fn spinner(enabled: bool, message: &str) -> Option<ProgressBar> {
    if !enabled {
        return None;
    }
    let bar = ProgressBar::new_spinner();
    bar.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {prefix:.bold}  {msg}  ⏱ {elapsed}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]),
    );
    bar.set_prefix("askpdf");
    bar.set_message(message.to_string());
    bar.enable_steady_tick(Duration::from_millis(80));
    Some(bar)
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Upload a PDF, then ask a question
  askpdf --upload paper.pdf --ask "What is the main contribution?"

  # Upload from a URL
  askpdf --upload https://arxiv.org/pdf/1706.03762

  # Ask several questions against an already uploaded document
  askpdf --ask "Who are the authors?" --ask "Summarise section 3"

  # Print the raw answer text instead of markup
  askpdf --raw --ask "List the key results"

  # Interactive prompt
  askpdf --interactive --upload paper.pdf

INTERACTIVE COMMANDS:
  :upload <PDF|URL>   select and upload a document
  :answer             print the last answer again
  :help               show this list
  :quit               exit
  anything else       ask it as a question

ENVIRONMENT VARIABLES:
  ASKPDF_SERVER       Backend address (default http://localhost:8000)
  ASKPDF_TIMEOUT      Per-request timeout in seconds (default: none)
  RUST_LOG            Override the log filter
"#;

/// Upload a PDF to a RAG backend and ask questions about it.
#[derive(Parser, Debug)]
#[command(
    name = "askpdf",
    version,
    about = "Upload a PDF to a RAG backend and ask questions about it",
    long_about = "Upload a PDF document to a retrieval-augmented-generation backend exposing \
/upload-pdf and /ask, then ask natural-language questions. Answers are rendered from \
Markdown into markup.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    /// Backend address.
    #[arg(long, env = "ASKPDF_SERVER", default_value = DEFAULT_BASE_URL)]
    server: String,

    /// PDF file path or HTTP/HTTPS URL to upload before asking.
    #[arg(short, long)]
    upload: Option<String>,

    /// Question to ask (repeatable, asked in order).
    #[arg(short, long)]
    ask: Vec<String>,

    /// Read questions and commands from stdin.
    #[arg(short, long)]
    interactive: bool,

    /// Print the answer text as returned instead of rendered markup.
    #[arg(long, env = "ASKPDF_RAW")]
    raw: bool,

    /// Do not escape HTML in answers before rendering.
    #[arg(long, env = "ASKPDF_NO_ESCAPE")]
    no_escape: bool,

    /// Per-request timeout in seconds.
    #[arg(long, env = "ASKPDF_TIMEOUT",
          value_parser = clap::value_parser!(u64).range(1..))]
    timeout: Option<u64>,

    /// Output one JSON object per answer.
    #[arg(long, env = "ASKPDF_JSON")]
    json: bool,

    /// Disable the spinner.
    #[arg(long, env = "ASKPDF_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, env = "ASKPDF_VERBOSE")]
    verbose: bool,

    /// Suppress all output except answers and errors.
    #[arg(short, long, env = "ASKPDF_QUIET")]
    quiet: bool,
}

/// JSON shape printed with `--json`.
#[derive(Serialize)]
struct AnswerOutput<'a> {
    question: &'a str,
    answer: &'a str,
    html: String,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The spinner and notification lines carry the user feedback; library
    // INFO logs would interleave with them, so default to errors only.
    let show_progress = !cli.quiet && !cli.no_progress && !cli.json;
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
        "error"
    } else {
        "info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    // ── Build session ────────────────────────────────────────────────────
    let config = build_config(&cli)?;
    let client = RagClient::new(config).context("Failed to create backend client")?;
    let notifier = Arc::new(TerminalNotifier { quiet: cli.quiet });
    let session = Session::new(client).with_notifier(notifier);

    let shell = Shell {
        cli: &cli,
        session: &session,
        show_progress,
    };

    // ── One-shot operations ──────────────────────────────────────────────
    // A failure the notifier already printed only sets the exit status.
    if let Some(ref input) = cli.upload {
        if let Some(code) = settle(shell.upload(input).await.context("Upload failed"))? {
            return Ok(code);
        }
    }

    for question in &cli.ask {
        if let Some(code) = settle(shell.ask(question).await.context("Ask failed"))? {
            return Ok(code);
        }
    }

    // ── Interactive prompt ───────────────────────────────────────────────
    if cli.interactive {
        shell.repl().await?;
    }

    Ok(ExitCode::SUCCESS)
}

/// `Some(FAILURE)` for an error the user has already seen, the error itself
/// for one that still needs printing.
fn settle(result: Result<()>) -> Result<Option<ExitCode>> {
    match result {
        Ok(()) => Ok(None),
        Err(e) if already_notified(&e) => Ok(Some(ExitCode::FAILURE)),
        Err(e) => Err(e),
    }
}

/// Map CLI args to `ClientConfig`.
fn build_config(cli: &Cli) -> Result<ClientConfig> {
    let mut builder = ClientConfig::builder()
        .base_url(cli.server.as_str())
        .escape_html(!cli.no_escape);
    if let Some(secs) = cli.timeout {
        builder = builder.timeout_secs(secs);
    }
    builder.build().context("Invalid configuration")
}

struct Shell<'a> {
    cli: &'a Cli,
    session: &'a Session,
    show_progress: bool,
}

impl Shell<'_> {
    async fn upload(&self, input: &str) -> Result<()> {
        let document = Document::resolve(input, self.cli.timeout)
            .await
            .with_context(|| format!("Cannot use '{input}'"))?;
        self.session.select_document(document);

        let bar = spinner(self.show_progress, &format!("Uploading {input}…"));
        let result = self.session.upload().await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        let summary = result?;
        if !self.cli.quiet {
            if let Some(chunks) = summary.chunks {
                eprintln!("   {}", dim(&format!("{chunks} chunks indexed")));
            }
        }
        Ok(())
    }

    async fn ask(&self, question: &str) -> Result<()> {
        let bar = spinner(self.show_progress, "Waiting for answer…");
        let result = self.session.ask_question(question).await;
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }

        let answer = result?;
        self.print_answer(question, &answer)
    }

    fn print_answer(&self, question: &str, answer: &Answer) -> Result<()> {
        let stdout = io::stdout();
        let mut handle = stdout.lock();

        if self.cli.json {
            let out = AnswerOutput {
                question,
                answer: answer.text(),
                html: self.session.rendered_answer(),
            };
            let json = serde_json::to_string(&out).context("Failed to serialise answer")?;
            writeln!(handle, "{json}").context("Failed to write to stdout")?;
            return Ok(());
        }

        let body = if self.cli.raw {
            answer.text().to_string()
        } else {
            self.session.rendered_answer()
        };
        writeln!(handle, "{body}").context("Failed to write to stdout")?;
        Ok(())
    }

    async fn repl(&self) -> Result<()> {
        if !self.cli.quiet {
            eprintln!(
                "{} {}  {}",
                cyan("◆"),
                bold("askpdf"),
                dim(&format!("{} · type :help", self.session.client().config().base_url))
            );
        }

        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            if !self.cli.quiet {
                eprint!("{} ", cyan("askpdf>"));
                io::stderr().flush().ok();
            }

            let Some(line) = lines.next_line().await.context("Failed to read stdin")? else {
                break;
            };
            let line = line.trim();

            match parse_command(line) {
                Command::Empty => {}
                Command::Quit => break,
                Command::Help => eprintln!("{}", command_help()),
                Command::ShowAnswer => {
                    let body = if self.cli.raw {
                        self.session.answer()
                    } else {
                        self.session.rendered_answer()
                    };
                    println!("{body}");
                }
                Command::Upload(input) => {
                    if let Err(e) = self.upload(input).await {
                        report(&e);
                    }
                }
                Command::UploadMissingPath => {
                    eprintln!("{} {}", red("✗"), red("Usage: :upload <PDF|URL>"));
                }
                Command::Ask(question) => {
                    if let Err(e) = self.ask(question).await {
                        report(&e);
                    }
                }
            }
        }
        Ok(())
    }
}

/// Session failures reach the user through the notifier; selection
/// failures (missing file, not a PDF) happen before the session sees them.
fn already_notified(e: &anyhow::Error) -> bool {
    e.downcast_ref::<AskPdfError>()
        .is_some_and(|e| e.kind() != ErrorKind::Input)
}

/// Print an error unless the notifier has already shown it.
fn report(e: &anyhow::Error) {
    if !already_notified(e) {
        eprintln!("{} {}", red("✗"), red(&format!("{e:#}")));
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Command<'a> {
    Empty,
    Quit,
    Help,
    ShowAnswer,
    Upload(&'a str),
    UploadMissingPath,
    Ask(&'a str),
}

fn parse_command(line: &str) -> Command<'_> {
    match line {
        "" => Command::Empty,
        ":q" | ":quit" | ":exit" => Command::Quit,
        ":h" | ":help" => Command::Help,
        ":a" | ":answer" => Command::ShowAnswer,
        ":upload" | ":u" => Command::UploadMissingPath,
        _ => {
            if let Some(rest) = line
                .strip_prefix(":upload ")
                .or_else(|| line.strip_prefix(":u "))
            {
                let path = rest.trim();
                if path.is_empty() {
                    Command::UploadMissingPath
                } else {
                    Command::Upload(path)
                }
            } else {
                Command::Ask(line)
            }
        }
    }
}

fn command_help() -> String {
    [
        ":upload <PDF|URL>   select and upload a document",
        ":answer             print the last answer again",
        ":help               show this list",
        ":quit               exit",
        "anything else       ask it as a question",
    ]
    .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(parse_command(""), Command::Empty);
        assert_eq!(parse_command(":quit"), Command::Quit);
        assert_eq!(parse_command(":help"), Command::Help);
        assert_eq!(parse_command(":answer"), Command::ShowAnswer);
        assert_eq!(parse_command(":upload"), Command::UploadMissingPath);
        assert_eq!(
            parse_command(":upload  paper.pdf "),
            Command::Upload("paper.pdf")
        );
        assert_eq!(parse_command(":u a.pdf"), Command::Upload("a.pdf"));
        assert_eq!(
            parse_command("what is :upload?"),
            Command::Ask("what is :upload?")
        );
    }

    #[test]
    fn input_errors_are_printed_by_the_shell() {
        let e = anyhow::Error::new(AskPdfError::FileNotFound {
            path: "x.pdf".into(),
        })
        .context("Cannot use 'x.pdf'");
        assert!(!already_notified(&e));

        let e = anyhow::Error::new(AskPdfError::ServerStatus {
            endpoint: "http://localhost:8000/upload-pdf".into(),
            status: 500,
            body: String::new(),
        });
        assert!(already_notified(&e));

        assert!(!already_notified(&anyhow::anyhow!("other")));
    }

    #[test]
    fn stdout_errors_are_printed_by_the_shell() {
        let e = anyhow::Error::new(io::Error::from(io::ErrorKind::BrokenPipe))
            .context("Failed to write to stdout");
        assert!(!already_notified(&e));
    }

    #[test]
    fn notified_failures_only_set_the_exit_status() {
        assert!(matches!(settle(Ok(())), Ok(None)));

        let rejected = anyhow::Error::new(AskPdfError::ServerStatus {
            endpoint: "http://localhost:8000/ask".into(),
            status: 500,
            body: String::new(),
        })
        .context("Ask failed");
        assert!(matches!(settle(Err(rejected)), Ok(Some(_))));

        let missing = anyhow::Error::new(AskPdfError::FileNotFound {
            path: "x.pdf".into(),
        })
        .context("Upload failed");
        let err = settle(Err(missing)).unwrap_err();
        assert!(format!("{err:#}").starts_with("Upload failed"));
    }

    #[test]
    fn cli_parses_repeated_questions() {
        let cli = Cli::try_parse_from(["askpdf", "--ask", "a", "--ask", "b", "--upload", "x.pdf"])
            .unwrap();
        assert_eq!(cli.ask, vec!["a", "b"]);
        assert_eq!(cli.upload.as_deref(), Some("x.pdf"));
    }

    #[test]
    fn cli_rejects_zero_timeout() {
        assert!(Cli::try_parse_from(["askpdf", "--timeout", "0", "--ask", "a"]).is_err());
    }

    #[test]
    fn build_config_applies_flags() {
        let cli = Cli::try_parse_from([
            "askpdf",
            "--server",
            "http://rag:9000/",
            "--no-escape",
            "--timeout",
            "15",
            "--ask",
            "q",
        ])
        .unwrap();
        let config = build_config(&cli).unwrap();
        assert_eq!(config.base_url, "http://rag:9000");
        assert_eq!(config.timeout_secs, Some(15));
        assert!(!config.render.escape_html);
    }
}
