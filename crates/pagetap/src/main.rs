use anyhow::{Context, bail};
use clap::{Parser, Subcommand};
use pagetap_common::formatter::{export_filename, render_report, render_session};
use pagetap_core::instrument::Instrumentation;
use pagetap_engine::config::ConfigLoader;
use pagetap_engine::file_host::FileHost;
use pagetap_engine::host::Host;
use pagetap_engine::runner::{self, now_ms};
use pagetap_h::CdpHost;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(name = "pagetap", version, about = "Element inspection and session recording for web pages")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults: ./pagetap.yaml, ~/.pagetap/config.yaml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Launch the browser in visible mode (not headless)
    #[arg(long)]
    visible: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Capture one element into a markdown report
    Inspect {
        /// Page to navigate to (omit with --from-file)
        url: Option<String>,

        /// CSS selector of the element to capture
        #[arg(long)]
        selector: String,

        /// Free-text annotation included in the report
        #[arg(long, default_value = "")]
        comment: String,

        /// Output path (defaults to the conventional filename)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Offline mode: read a page capture (JSON) instead of a browser
        #[arg(long)]
        from_file: Option<PathBuf>,
    },
    /// Record a session (console, network, interactions, snapshots)
    Record {
        /// Page to navigate to (omit with --from-file)
        url: Option<String>,

        /// Stop automatically after this many seconds (Ctrl-C always works)
        #[arg(long)]
        duration_secs: Option<u64>,

        /// Take a storage snapshot every N seconds
        #[arg(long)]
        snapshot_interval_secs: Option<u64>,

        /// Free-text annotation included in the report
        #[arg(long, default_value = "")]
        comment: String,

        /// Output path (defaults to the conventional filename)
        #[arg(long)]
        out: Option<PathBuf>,

        /// Offline mode: read a page capture (JSON) instead of a browser
        #[arg(long)]
        from_file: Option<PathBuf>,

        /// Offline mode: event stream (JSONL) replayed into the session
        #[arg(long)]
        events: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logs go to stderr; stdout carries only output paths and status lines.
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let config = match &args.config {
        Some(path) => ConfigLoader::load_from(path)
            .await
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ConfigLoader::load_default().await?,
    };
    let probe_settings = config.probe.clone();
    let mut instrumentation = Instrumentation::new(config.instrument_config());
    instrumentation.install_always_on();

    match args.command {
        Command::Inspect {
            url,
            selector,
            comment,
            out,
            from_file,
        } => {
            let mut host =
                open_host(url.as_deref(), from_file, None, args.visible, &probe_settings).await?;
            let result = runner::inspect(&mut *host, &mut instrumentation, &selector, &comment)
                .await
                .context("inspection failed");
            host.close().await.ok();
            let report = result?;

            let markdown = render_report(&report);
            let path = out.unwrap_or_else(|| {
                let (tag, id) = split_short_id(&report.element.short_id);
                PathBuf::from(export_filename(now_ms(), &report.url, tag, id))
            });
            std::fs::write(&path, markdown)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }
        Command::Record {
            url,
            duration_secs,
            snapshot_interval_secs,
            comment,
            out,
            from_file,
            events,
        } => {
            instrumentation.install_session_tap();
            let offline = from_file.is_some();
            let mut host =
                open_host(url.as_deref(), from_file, events, args.visible, &probe_settings).await?;

            let mut page = host.capture_page().await?;
            let session_id =
                runner::start_session(&mut instrumentation, &page, None, now_ms())
                    .context("starting session")?;

            if offline {
                // Replay mode: one drain covers the whole recorded stream.
                runner::pump(&mut *host, &mut instrumentation, &mut page).await?;
            } else {
                eprintln!("recording {} (Ctrl-C to stop)", session_id);
                let deadline = duration_secs.map(|secs| now_ms() + secs * 1000);
                let mut next_snapshot =
                    snapshot_interval_secs.map(|secs| now_ms() + secs * 1000);
                let mut poll = tokio::time::interval(Duration::from_millis(250));

                loop {
                    tokio::select! {
                        _ = tokio::signal::ctrl_c() => break,
                        _ = poll.tick() => {
                            if let Err(e) = runner::pump(&mut *host, &mut instrumentation, &mut page).await {
                                tracing::warn!("event drain failed: {}", e);
                            }
                            let now = now_ms();
                            if let Some(at) = next_snapshot
                                && now >= at
                            {
                                runner::take_snapshot(&mut instrumentation, &page, None, now);
                                next_snapshot = Some(now + snapshot_interval_secs.unwrap_or(0) * 1000);
                            }
                            if let Some(deadline) = deadline
                                && now >= deadline
                            {
                                break;
                            }
                        }
                    }
                }
            }

            // Final drain so late events make it into this generation.
            runner::pump(&mut *host, &mut instrumentation, &mut page).await.ok();
            let status = runner::session_status(&instrumentation, now_ms());
            eprintln!(
                "captured {} console / {} network / {} interactions / {} snapshots",
                status.console_entries,
                status.network_entries,
                status.interactions,
                status.snapshots
            );

            let session = runner::stop_session(&mut instrumentation, now_ms())
                .context("no active session to stop")?;
            host.close().await.ok();

            let markdown = render_session(&session, &comment);
            let path = out.unwrap_or_else(|| {
                PathBuf::from(export_filename(now_ms(), &session.url, "session", None))
            });
            std::fs::write(&path, markdown)
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }
    }

    Ok(())
}

async fn open_host(
    url: Option<&str>,
    from_file: Option<PathBuf>,
    events: Option<PathBuf>,
    visible: bool,
    probe_settings: &pagetap_engine::config::ProbeSettings,
) -> anyhow::Result<Box<dyn Host>> {
    let mut host: Box<dyn Host> = match from_file {
        Some(capture) => Box::new(FileHost::new(capture, events)),
        None => {
            if url.is_none() {
                bail!("either a URL or --from-file is required");
            }
            Box::new(
                CdpHost::new_with_visibility(visible).with_probe_settings(probe_settings.clone()),
            )
        }
    };
    host.launch().await.context("launching host")?;
    if let Some(url) = url {
        let nav = host.navigate(url).await.context("navigation failed")?;
        tracing::info!("at {} ({})", nav.url, nav.title);
    }
    Ok(host)
}

/// `button#submit` -> ("button", Some("submit")); `div.card` -> ("div", None)
fn split_short_id(short_id: &str) -> (&str, Option<&str>) {
    if let Some((tag, id)) = short_id.split_once('#') {
        return (tag, Some(id));
    }
    match short_id.split_once('.') {
        Some((tag, _)) => (tag, None),
        None => (short_id, None),
    }
}
