//! CLI binary for newsclip.
//!
//! A thin shim over the library crate: it stands in for a selection UI by
//! listing image candidates and taking the picks as `--select` flags.

use anyhow::{Context, Result};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use newsclip::inbox::DEFAULT_SENDER;
use newsclip::naming::{INBOX_PREFIX, UPLOAD_PREFIX};
use newsclip::{
    build_to_file, default_filename, extract_from, extract_from_inbox, image_candidates,
    selection_triples,
    BuildConfig, BuildProgressCallback, Element, ExtractConfig, GmailInbox, HttpImageFetcher,
    ImageCandidate, Inbox, PreFilter, ProgressCallback, Selection, DEFAULT_TITLE,
};
use std::io;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
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

// ── CLI progress callback using indicatif ────────────────────────────────────

/// Renders a bar over the selection pages and one log line per page.
struct CliProgressCallback {
    bar: ProgressBar,
    missing: AtomicUsize,
}

impl CliProgressCallback {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(0);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  \
             [{bar:42.green/238}] {pos:>3}/{len} pages  \
             ⏱ {elapsed_precise}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);

        bar.set_style(style);
        bar.set_prefix("Building");
        bar.enable_steady_tick(Duration::from_millis(80));

        Arc::new(Self {
            bar,
            missing: AtomicUsize::new(0),
        })
    }
}

impl BuildProgressCallback for CliProgressCallback {
    fn on_build_start(&self, total_selections: usize) {
        self.bar.set_length(total_selections as u64);
        self.bar.println(format!(
            "{} {}",
            cyan("◆"),
            bold(&format!("Clipping {total_selections} images…"))
        ));
    }

    fn on_page_start(&self, page_num: usize, _total: usize) {
        self.bar.set_message(format!("page {page_num}"));
    }

    fn on_page_complete(&self, page_num: usize, total: usize, image_placed: bool) {
        if image_placed {
            self.bar.println(format!(
                "  {} Page {:>3}/{:<3}",
                green("✓"),
                page_num,
                total
            ));
        }
        self.bar.inc(1);
    }

    fn on_image_error(&self, page_num: usize, total: usize, error: &str) {
        self.missing.fetch_add(1, Ordering::SeqCst);
        let msg = if error.chars().count() > 80 {
            format!("{}\u{2026}", error.chars().take(79).collect::<String>())
        } else {
            error.to_string()
        };
        self.bar.println(format!(
            "  {} Page {:>3}/{:<3}  {}",
            red("✗"),
            page_num,
            total,
            red(&msg)
        ));
    }

    fn on_build_complete(&self, total_pages: usize, bytes: usize) {
        self.bar.finish_and_clear();
        let missing = self.missing.load(Ordering::SeqCst);
        eprintln!(
            "{} {} pages  {}{}",
            if missing == 0 { green("✔") } else { cyan("⚠") },
            bold(&total_pages.to_string()),
            dim(&format!("{} KiB", bytes / 1024)),
            if missing == 0 {
                String::new()
            } else {
                format!("  ({} images missing)", red(&missing.to_string()))
            }
        );
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # List the images in a saved newsletter, with the text before each
  newsclip extract issue.html

  # Keep two charts, one with a note
  newsclip build issue.html --select 42 --select "97:rates are turning"

  # Strip a licence banner before extracting
  newsclip extract issue.html --strip-start "Unauthorized" --strip-end "prohibited."

  # Work from the mailbox
  newsclip inbox list
  newsclip inbox fetch 18c0f0a1b2c3d4e5
  newsclip inbox fetch 18c0f0a1b2c3d4e5 --select 42

ENVIRONMENT VARIABLES:
  NEWSCLIP_GMAIL_TOKEN       OAuth access token for the Gmail API
  NEWSCLIP_GMAIL_TOKEN_FILE  File holding that token
  NEWSCLIP_TITLE             Title-page heading
  NEWSCLIP_IMAGE_CACHE       Keep downloaded images in this directory
  RUST_LOG                   Log filter, e.g. newsclip=debug
"#;

/// Clip images and commentary from HTML newsletters into a PDF.
#[derive(Parser, Debug)]
#[command(
    name = "newsclip",
    version,
    about = "Clip images and commentary from HTML newsletters into a PDF",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "NEWSCLIP_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "NEWSCLIP_QUIET")]
    quiet: bool,

    /// Disable progress bar.
    #[arg(long, global = true, env = "NEWSCLIP_NO_PROGRESS")]
    no_progress: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the selectable images in a newsletter.
    Extract {
        /// Local HTML file path or HTTP/HTTPS URL.
        input: String,
        #[command(flatten)]
        filter: FilterArgs,
        /// Print the full element list as JSON.
        #[arg(long)]
        json: bool,
    },
    /// Build a PDF from selected images of a newsletter.
    Build {
        /// Local HTML file path or HTTP/HTTPS URL.
        input: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        build: BuildArgs,
    },
    /// Work with newsletters in a Gmail mailbox.
    Inbox {
        #[command(flatten)]
        auth: AuthArgs,
        #[command(subcommand)]
        action: InboxAction,
    },
}

#[derive(Subcommand, Debug)]
enum InboxAction {
    /// List recent messages from a sender.
    List {
        #[arg(long, env = "NEWSCLIP_SENDER", default_value = DEFAULT_SENDER)]
        sender: String,
        #[arg(long)]
        json: bool,
    },
    /// Show a message's images, or build a PDF from it with --select.
    Fetch {
        /// Gmail message id (from `inbox list`).
        id: String,
        #[command(flatten)]
        filter: FilterArgs,
        #[command(flatten)]
        build: BuildArgs,
    },
}

#[derive(Args, Debug)]
struct FilterArgs {
    /// Remove everything from this marker…
    #[arg(long, env = "NEWSCLIP_STRIP_START", requires = "strip_end")]
    strip_start: Option<String>,

    /// …up to and including this one (first occurrence only).
    #[arg(long, env = "NEWSCLIP_STRIP_END", requires = "strip_start")]
    strip_end: Option<String>,

    /// Drop the body before this text.
    #[arg(long, env = "NEWSCLIP_TRUNCATE_BEFORE", conflicts_with = "strip_start")]
    truncate_before: Option<String>,
}

impl FilterArgs {
    fn to_config(&self) -> ExtractConfig {
        let prefilter = match (&self.strip_start, &self.strip_end, &self.truncate_before) {
            (Some(start), Some(end), _) => PreFilter::strip_between(start, end),
            (_, _, Some(sentinel)) => PreFilter::truncate_before(sentinel),
            _ => PreFilter::None,
        };
        ExtractConfig::with_prefilter(prefilter)
    }
}

#[derive(Args, Debug)]
struct BuildArgs {
    /// Image to keep, by index, optionally with a note: `42` or `42:note`.
    #[arg(short, long = "select", value_name = "INDEX[:NOTE]")]
    selections: Vec<String>,

    /// Keep every image.
    #[arg(long, conflicts_with = "selections")]
    all_images: bool,

    /// Write the PDF here. Default: dated file name in the current directory.
    #[arg(short, long, env = "NEWSCLIP_OUTPUT")]
    output: Option<PathBuf>,

    /// Title-page heading.
    #[arg(long, env = "NEWSCLIP_TITLE", default_value = DEFAULT_TITLE)]
    title: String,

    /// Date under the title (YYYY-MM-DD). Default: today.
    #[arg(long, env = "NEWSCLIP_DATE")]
    date: Option<NaiveDate>,

    /// Keep downloaded images in this directory.
    #[arg(long, env = "NEWSCLIP_IMAGE_CACHE")]
    image_cache: Option<PathBuf>,

    /// Fail if any selected image could not be placed.
    #[arg(long)]
    strict: bool,

    /// Print build stats as JSON.
    #[arg(long)]
    json: bool,
}

impl BuildArgs {
    fn wants_build(&self) -> bool {
        self.all_images || !self.selections.is_empty()
    }
}

#[derive(Args, Debug)]
struct AuthArgs {
    /// Gmail OAuth access token.
    #[arg(long, env = "NEWSCLIP_GMAIL_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// File holding the access token.
    #[arg(long, env = "NEWSCLIP_GMAIL_TOKEN_FILE", conflicts_with = "token")]
    token_file: Option<PathBuf>,
}

impl AuthArgs {
    fn inbox(&self) -> Result<GmailInbox> {
        match (&self.token, &self.token_file) {
            (Some(token), _) => Ok(GmailInbox::new(token.trim())),
            (None, Some(path)) => {
                GmailInbox::from_token_file(path).context("Failed to load Gmail token")
            }
            (None, None) => anyhow::bail!(
                "No Gmail token: pass --token / --token-file or set NEWSCLIP_GMAIL_TOKEN"
            ),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar replaces INFO logs; --verbose brings them all back.
    let show_progress = !cli.quiet && !cli.no_progress;
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

    match cli.command {
        Command::Extract {
            ref input,
            ref filter,
            json,
        } => {
            let elements = extract_from(input, &filter.to_config())
                .await
                .context("Failed to extract newsletter")?;
            print_elements(&elements, json)?;
        }
        Command::Build {
            ref input,
            ref filter,
            ref build,
        } => {
            let elements = extract_from(input, &filter.to_config())
                .await
                .context("Failed to extract newsletter")?;
            let today = today(build);
            let fallback = default_filename(UPLOAD_PREFIX, None, today);
            run_build(&cli, &elements, build, fallback).await?;
        }
        Command::Inbox {
            ref auth,
            ref action,
        } => {
            let inbox = auth.inbox()?;
            match action {
                InboxAction::List { sender, json } => {
                    let messages = inbox
                        .list_messages(sender)
                        .await
                        .context("Failed to list messages")?;
                    if *json {
                        println!("{}", serde_json::to_string_pretty(&messages)?);
                    } else {
                        for m in &messages {
                            println!(
                                "{}  {}  {}",
                                bold(&m.id),
                                m.date.as_deref().unwrap_or("-"),
                                m.subject.as_deref().unwrap_or(&m.snippet)
                            );
                        }
                    }
                }
                InboxAction::Fetch { id, filter, build } => {
                    let (elements, date) = extract_from_inbox(&inbox, id, &filter.to_config())
                        .await
                        .context("Failed to extract message")?;
                    if build.wants_build() {
                        let fallback = default_filename(INBOX_PREFIX, date.as_deref(), today(build));
                        run_build(&cli, &elements, build, fallback).await?;
                    } else {
                        print_elements(&elements, build.json)?;
                    }
                }
            }
        }
    }

    Ok(())
}

fn today(build: &BuildArgs) -> NaiveDate {
    build
        .date
        .unwrap_or_else(|| chrono::Local::now().date_naive())
}

fn print_elements(elements: &[Element], json: bool) -> Result<()> {
    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(elements).context("Failed to serialise elements")?
        );
        return Ok(());
    }
    let candidates = image_candidates(elements);
    for c in &candidates {
        print_candidate(c);
    }
    eprintln!("{}", dim(&format!("{} images", candidates.len())));
    Ok(())
}

fn print_candidate(c: &ImageCandidate) {
    println!("{} {}", bold(&format!("[{}]", c.index)), cyan(&c.src));
    let preview: String = c.text.split_whitespace().collect::<Vec<_>>().join(" ");
    if !preview.is_empty() {
        let short: String = preview.chars().take(160).collect();
        println!("    {}", dim(&short));
    }
}

/// Parse `42` or `42:some note`.
fn parse_selection(s: &str) -> Result<Selection> {
    let (index, note) = match s.split_once(':') {
        Some((i, n)) => (i, n),
        None => (s, ""),
    };
    let index: usize = index
        .trim()
        .parse()
        .with_context(|| format!("Invalid selection index: '{}'", index.trim()))?;
    Ok(Selection::new(index, note.trim()))
}

async fn run_build(
    cli: &Cli,
    elements: &[Element],
    args: &BuildArgs,
    fallback_name: String,
) -> Result<()> {
    let selections: Vec<Selection> = if args.all_images {
        image_candidates(elements)
            .into_iter()
            .map(|c| Selection::new(c.index, ""))
            .collect()
    } else {
        args.selections
            .iter()
            .map(|s| parse_selection(s))
            .collect::<Result<_>>()?
    };

    let triples = selection_triples(elements, &selections).context("Invalid selection")?;

    let show_progress = !cli.quiet && !cli.no_progress && !args.json;
    let progress_cb: Option<ProgressCallback> = if show_progress {
        Some(CliProgressCallback::new() as Arc<dyn BuildProgressCallback>)
    } else {
        None
    };

    let mut builder = BuildConfig::builder().title(&args.title);
    if let Some(date) = args.date {
        builder = builder.generated_on(date);
    }
    if let Some(ref dir) = args.image_cache {
        builder = builder.image_cache_dir(dir);
    }
    if let Some(cb) = progress_cb {
        builder = builder.progress_callback(cb);
    }
    let config = builder.build().context("Invalid configuration")?;

    let fetcher = HttpImageFetcher::from_config(&config);

    let output_path = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(fallback_name));

    let doc = build_to_file(&triples, &output_path, &config, &fetcher)
        .await
        .context("Failed to build document")?;

    if args.json {
        println!(
            "{}",
            serde_json::to_string_pretty(&doc.stats).context("Failed to serialise stats")?
        );
    } else if !cli.quiet {
        eprintln!(
            "{}  {} pages  {}ms  →  {}",
            if doc.stats.images_missing == 0 {
                green("✔")
            } else {
                cyan("⚠")
            },
            doc.stats.total_pages,
            doc.stats.total_duration_ms,
            bold(&output_path.display().to_string()),
        );
    }

    if args.strict {
        doc.into_result()
            .context("Some selected images could not be placed")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selection_with_and_without_note() {
        assert_eq!(parse_selection("42").unwrap(), Selection::new(42, ""));
        assert_eq!(
            parse_selection("7: rates: turning").unwrap(),
            Selection::new(7, "rates: turning")
        );
        assert!(parse_selection("x:note").is_err());
    }

    #[test]
    fn cli_parses_build() {
        let cli = Cli::try_parse_from([
            "newsclip", "build", "issue.html", "-s", "3", "-s", "9:hi", "--date", "2024-01-01",
        ])
        .unwrap();
        match cli.command {
            Command::Build { input, build, .. } => {
                assert_eq!(input, "issue.html");
                assert_eq!(build.selections, vec!["3", "9:hi"]);
                assert_eq!(build.date, NaiveDate::from_ymd_opt(2024, 1, 1));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn strip_markers_come_in_pairs() {
        assert!(Cli::try_parse_from(["newsclip", "extract", "a.html", "--strip-start", "x"]).is_err());
        let cli = Cli::try_parse_from([
            "newsclip", "extract", "a.html", "--strip-start", "x", "--strip-end", "y",
        ])
        .unwrap();
        match cli.command {
            Command::Extract { filter, .. } => {
                assert_eq!(filter.to_config().prefilter, PreFilter::strip_between("x", "y"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
