//! Purpose: `pixpeek` CLI entry point and command dispatch bootstrap.
//! Role: Binary crate root; parses args, runs commands, emits JSON on stdout.
//! Invariants: Commands emit JSON on stdout (pretty on a TTY, compact otherwise).
//! Invariants: Non-interactive errors are emitted as JSON on stderr.
//! Invariants: Process exit code is derived from `api::to_exit_code`.
//! Invariants: Logs go to stderr through `tracing`; stdout stays machine-readable.
#![allow(clippy::result_large_err)]
use std::error::Error as StdError;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use clap::{
    Args, CommandFactory, Parser, Subcommand, ValueEnum, ValueHint,
    error::ErrorKind as ClapErrorKind,
};
use clap_complete::aot::Shell;
use serde_json::{Map, Value, json};
use tracing_subscriber::EnvFilter;

mod color_json;
mod command_dispatch;
mod output_json;

use color_json::colorize_json;
use pixpeek::api::{Error, ErrorKind, FetchOptions, to_exit_code};
use pixpeek::notice::{Notice, notice_json};

#[derive(Copy, Clone, Debug)]
struct RunOutcome {
    exit_code: i32,
}

impl RunOutcome {
    fn ok() -> Self {
        Self { exit_code: 0 }
    }
}

fn main() {
    init_tracing();
    let exit_code = match run() {
        Ok(outcome) => outcome.exit_code,
        Err((err, color_mode)) => {
            emit_error(&err, color_mode);
            to_exit_code(err.kind())
        }
    };
    std::process::exit(exit_code);
}

fn run() -> Result<RunOutcome, (Error, ColorMode)> {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => match err.kind() {
            ClapErrorKind::DisplayHelp
            | ClapErrorKind::DisplayVersion
            | ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => {
                err.print().map_err(|io_err| {
                    (
                        Error::new(ErrorKind::Io)
                            .with_message("failed to write help")
                            .with_source(io_err),
                        ColorMode::Auto,
                    )
                })?;
                let exit_code = if matches!(
                    err.kind(),
                    ClapErrorKind::DisplayHelpOnMissingArgumentOrSubcommand
                ) {
                    2
                } else {
                    0
                };
                return Ok(RunOutcome { exit_code });
            }
            _ => {
                return Err((
                    Error::new(ErrorKind::Usage)
                        .with_message(clap_error_summary(&err))
                        .with_hint(clap_error_hint(&err)),
                    ColorMode::Auto,
                ));
            }
        },
    };

    let color_mode = cli.color;
    command_dispatch::dispatch_command(cli.command, color_mode)
        .map_err(add_io_hint)
        .map_err(add_internal_hint)
        .map_err(|err| (err, color_mode))
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(io::stderr)
        .try_init();
}

#[derive(Parser)]
#[command(
    name = "pixpeek",
    version,
    about = "Decode Pix copy-and-paste payloads and the tokens they point to",
    help_template = r#"{about-with-newline}
{before-help}USAGE
  {usage}

COMMANDS
{subcommands}

OPTIONS
{options}

{after-help}
"#,
    long_about = None,
    before_help = r#"A dynamic Pix code carries a URL (template tag 26..51, sub-tag 25).
That URL serves a signed header.payload.signature token describing the charge.

Mental model:
  - `tlv` shows the raw fields of a payload
  - `url` finds the payload location
  - `token` decodes token text you already have
  - `resolve` does all of it: find, fetch, decode
"#,
    after_help = r#"EXAMPLES
  $ pixpeek url '00020126...6304ABCD'
  $ pbpaste | pixpeek resolve --payload-only
  $ pixpeek token "$(cat token.txt)"

LEARN MORE
  $ pixpeek <command> --help
  RUST_LOG=debug pixpeek resolve ...   # request logging on stderr"#,
    arg_required_else_help = true,
    disable_help_subcommand = false
)]
struct Cli {
    #[arg(
        long,
        default_value = "auto",
        value_enum,
        global = true,
        help = "Colorize stderr diagnostics and pretty JSON output: auto|always|never"
    )]
    color: ColorMode,

    #[command(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, ValueEnum)]
enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    fn use_color(self, is_tty: bool) -> bool {
        match self {
            ColorMode::Auto => is_tty,
            ColorMode::Always => true,
            ColorMode::Never => false,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Scheme {
    Https,
    Http,
}

impl Scheme {
    fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

#[derive(Args, Clone, Debug)]
struct InputArgs {
    #[arg(
        short = 'f',
        long = "file",
        help = "Read input from a file (use - for stdin)",
        value_hint = ValueHint::FilePath
    )]
    file: Option<PathBuf>,
}

#[derive(Args, Clone, Debug)]
struct FetchArgs {
    #[arg(
        long,
        default_value_t = 10_000,
        help = "Request timeout in milliseconds"
    )]
    timeout_ms: u64,
    #[arg(
        long,
        value_enum,
        default_value = "https",
        help = "Scheme prefixed to the payload location: https|http"
    )]
    scheme: Scheme,
}

impl FetchArgs {
    fn options(&self) -> FetchOptions {
        FetchOptions::default()
            .with_scheme(self.scheme.as_str())
            .with_timeout(Duration::from_millis(self.timeout_ms))
    }
}

#[derive(Subcommand)]
enum Command {
    #[command(
        about = "Decode a TLV string into its fields",
        long_about = r#"Decode a TLV (tag, 2-digit length, value) string and list its fields in order.

By default short trailing values are kept as-is and reported with a notice on stderr."#,
        after_help = r#"EXAMPLES
  $ pixpeek tlv 000201260925050123453039865802BR
  $ pixpeek tlv --nested -f payload.txt
  $ pixpeek tlv --strict '0102ab0210xyz'     # exits 5 (TruncatedTlv)"#
    )]
    Tlv {
        #[arg(help = "TLV string (reads stdin when omitted or -)")]
        input: Option<String>,
        #[command(flatten)]
        source: InputArgs,
        #[arg(long, help = "Fail on records whose declared length exceeds the input")]
        strict: bool,
        #[arg(long, help = "Also decode merchant account templates (tags 26..51)")]
        nested: bool,
    },
    #[command(
        about = "Print the payload URL embedded in a Pix payload",
        after_help = r#"EXAMPLES
  $ pixpeek url '00020126...6304ABCD'
  # {"tag":"26","url":"pix.example.com/qr/v2/..."}

NOTES
  - Exits 3 (NotFound) when no template carries sub-tag 25 (static codes)"#
    )]
    Url {
        #[arg(help = "Pix copy-and-paste string (reads stdin when omitted or -)")]
        payload: Option<String>,
        #[command(flatten)]
        source: InputArgs,
    },
    #[command(
        about = "Decode a header.payload.signature token",
        after_help = r#"EXAMPLES
  $ pixpeek token "$(cat token.txt)"
  $ pixpeek token --payload-only -f token.txt

NOTES
  - The signature is printed as-is and never verified"#
    )]
    Token {
        #[arg(help = "Token text (reads stdin when omitted or -)")]
        token: Option<String>,
        #[command(flatten)]
        source: InputArgs,
        #[arg(long, help = "Print only the decoded payload")]
        payload_only: bool,
    },
    #[command(about = "Fetch the raw token text a Pix payload points to")]
    Fetch {
        #[arg(help = "Pix copy-and-paste string (reads stdin when omitted or -)")]
        payload: Option<String>,
        #[command(flatten)]
        source: InputArgs,
        #[command(flatten)]
        fetch: FetchArgs,
    },
    #[command(
        about = "Find, fetch, and decode the token behind a Pix payload",
        after_help = r#"EXAMPLES
  $ pixpeek resolve '00020126...6304ABCD'
  $ pbpaste | pixpeek resolve --payload-only"#
    )]
    Resolve {
        #[arg(help = "Pix copy-and-paste string (reads stdin when omitted or -)")]
        payload: Option<String>,
        #[command(flatten)]
        source: InputArgs,
        #[command(flatten)]
        fetch: FetchArgs,
        #[arg(long, help = "Print only the decoded token payload")]
        payload_only: bool,
    },
    #[command(about = "Generate shell completion scripts")]
    Completion {
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(about = "Print version information as JSON")]
    Version,
}

fn read_input(inline: Option<String>, source: &InputArgs, what: &str) -> Result<String, Error> {
    if inline.is_some() && source.file.is_some() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("{what} given both inline and with --file"))
            .with_hint("Pass one of them."));
    }
    let text = match (inline, &source.file) {
        (Some(text), _) if text != "-" => text,
        (None, Some(path)) if path.as_os_str() != "-" => std::fs::read_to_string(path)
            .map_err(|err| {
                Error::new(map_io_error_kind(&err))
                    .with_message(format!("failed to read {what} from {}", path.display()))
                    .with_source(err)
            })?,
        _ => read_stdin(what)?,
    };
    Ok(text.trim().to_string())
}

fn read_stdin(what: &str) -> Result<String, Error> {
    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(Error::new(ErrorKind::Usage)
            .with_message(format!("missing {what}"))
            .with_hint(format!("Pass the {what} as an argument, with --file, or on stdin.")));
    }
    let mut text = String::new();
    stdin.read_to_string(&mut text).map_err(|err| {
        Error::new(ErrorKind::Io)
            .with_message("failed to read stdin")
            .with_source(err)
    })?;
    Ok(text)
}

fn map_io_error_kind(err: &io::Error) -> ErrorKind {
    match err.kind() {
        io::ErrorKind::NotFound => ErrorKind::NotFound,
        io::ErrorKind::PermissionDenied => ErrorKind::Permission,
        _ => ErrorKind::Io,
    }
}

fn add_io_hint(err: Error) -> Error {
    if err.hint().is_some() {
        return err;
    }
    match err.kind() {
        ErrorKind::Permission => {
            err.with_hint("Permission denied. Check file permissions or the server's access rules.")
        }
        ErrorKind::Io => err.with_hint(
            "I/O or network failure. Check connectivity and that the payload location is reachable.",
        ),
        _ => err,
    }
}

fn add_internal_hint(err: Error) -> Error {
    if err.kind() != ErrorKind::Internal || err.hint().is_some() {
        return err;
    }
    err.with_hint("Unexpected failure. Retry with RUST_LOG=debug and share the command if it persists.")
}

fn emit_json(value: Value, color_mode: ColorMode) {
    let is_tty = io::stdout().is_terminal();
    let use_color = color_mode.use_color(is_tty);
    let json = if is_tty || use_color {
        colorize_json(&value, use_color)
    } else {
        serde_json::to_string(&value)
            .unwrap_or_else(|_| "{\"error\":\"json encode failed\"}".to_string())
    };
    println!("{json}");
}

#[derive(Copy, Clone, Debug)]
enum AnsiColor {
    Red,
    Yellow,
}

fn colorize_label(label: &str, enabled: bool, color: AnsiColor) -> String {
    if !enabled {
        return label.to_string();
    }
    let code = match color {
        AnsiColor::Red => "31",
        AnsiColor::Yellow => "33",
    };
    format!("\u{1b}[{code}m{label}\u{1b}[0m")
}

fn emit_error(err: &Error, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        eprintln!("{}", error_text(err, color_mode.use_color(is_tty)));
        return;
    }

    let value = error_json(err);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"error\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn notice_time_now() -> Option<String> {
    use time::format_description::well_known::Rfc3339;
    let duration = SystemTime::now().duration_since(UNIX_EPOCH).ok()?;
    let ts = time::OffsetDateTime::from_unix_timestamp_nanos(duration.as_nanos() as i128).ok()?;
    ts.format(&Rfc3339).ok()
}

fn emit_notice(notice: &Notice, color_mode: ColorMode) {
    let is_tty = io::stderr().is_terminal();
    if is_tty {
        let label = colorize_label("notice:", color_mode.use_color(is_tty), AnsiColor::Yellow);
        eprintln!("{label} {}", notice.message);
        return;
    }

    let value = notice_json(notice);
    let json = serde_json::to_string(&value).unwrap_or_else(|_| {
        "{\"notice\":{\"kind\":\"Internal\",\"message\":\"json encode failed\"}}".to_string()
    });
    eprintln!("{json}");
}

fn error_message(err: &Error) -> String {
    if let Some(message) = err.message() {
        return message.to_string();
    }
    match err.kind() {
        ErrorKind::Internal => "internal error".to_string(),
        ErrorKind::Usage => "usage error".to_string(),
        ErrorKind::NotFound => "not found".to_string(),
        ErrorKind::MalformedToken => "malformed token".to_string(),
        ErrorKind::TruncatedTlv => "truncated tlv record".to_string(),
        ErrorKind::Permission => "permission denied".to_string(),
        ErrorKind::Io => "i/o error".to_string(),
    }
}

fn error_causes(err: &Error) -> Vec<String> {
    let mut causes = Vec::new();
    let mut cur = err.source();
    while let Some(source) = cur {
        causes.push(source.to_string());
        cur = source.source();
    }
    causes
}

fn error_json(err: &Error) -> Value {
    let mut inner = Map::new();
    inner.insert("kind".to_string(), json!(format!("{:?}", err.kind())));
    inner.insert("message".to_string(), json!(error_message(err)));
    if let Some(hint) = err.hint() {
        inner.insert("hint".to_string(), json!(hint));
    }
    if let Some(tag) = err.tag() {
        inner.insert("tag".to_string(), json!(tag));
    }
    if let Some(offset) = err.offset() {
        inner.insert("offset".to_string(), json!(offset));
    }
    let causes = error_causes(err);
    if !causes.is_empty() {
        inner.insert("causes".to_string(), json!(causes));
    }

    let mut outer = Map::new();
    outer.insert("error".to_string(), Value::Object(inner));
    Value::Object(outer)
}

fn error_text(err: &Error, use_color: bool) -> String {
    let mut lines = Vec::new();
    lines.push(format!(
        "{} {}",
        colorize_label("error:", use_color, AnsiColor::Red),
        error_message(err)
    ));

    if let Some(hint) = err.hint() {
        lines.push(format!(
            "{} {hint}",
            colorize_label("hint:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(tag) = err.tag() {
        lines.push(format!(
            "{} {tag}",
            colorize_label("tag:", use_color, AnsiColor::Yellow)
        ));
    }
    if let Some(offset) = err.offset() {
        lines.push(format!(
            "{} {offset}",
            colorize_label("offset:", use_color, AnsiColor::Yellow)
        ));
    }

    let causes = error_causes(err);
    if let Some(cause) = causes.first() {
        lines.push(format!(
            "{} {cause}",
            colorize_label("caused by:", use_color, AnsiColor::Yellow)
        ));
    }

    lines.join("\n")
}

fn clap_error_summary(err: &clap::Error) -> String {
    for line in err.to_string().lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        if let Some(rest) = trimmed.strip_prefix("error:") {
            return rest.trim().to_string();
        }
        return trimmed.to_string();
    }
    "invalid arguments".to_string()
}

fn clap_error_hint(err: &clap::Error) -> String {
    let rendered = err.to_string();
    let usage = rendered
        .lines()
        .find_map(|line| line.trim().strip_prefix("Usage: "))
        .map(str::trim);
    let subcommand = usage.and_then(|usage| {
        let mut tokens = usage.split_whitespace();
        tokens.find(|token| *token == "pixpeek")?;
        tokens
            .next()
            .filter(|token| !token.starts_with(['-', '<', '[']))
    });

    match subcommand {
        Some(name) => format!("Try `pixpeek {name} --help`."),
        None => "Try `pixpeek --help`.".to_string(),
    }
}
