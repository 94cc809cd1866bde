use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{info, level_filters::LevelFilter};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use supply_notifier::config::{AppConfig, CliConfig, FileConfig, DEFAULT_API_BASE_URL};
use supply_notifier::notifications::badge_label;
use supply_notifier::{Notification, Notifier, TickOutcome};

mod cli_style;
use cli_style::get_styles;

fn parse_path(s: &str) -> Result<PathBuf> {
    let path_buf = PathBuf::from(s);
    let original_path = match path_buf.canonicalize() {
        Ok(path) => path,
        Err(msg) => {
            if msg.kind() == std::io::ErrorKind::NotFound {
                path_buf
            } else {
                return Err(msg).with_context(|| format!("Error resolving path: {}", s));
            }
        }
    };
    if original_path.is_absolute() {
        return Ok(original_path);
    }
    let cwd = std::env::current_dir()?;
    Ok(cwd.join(original_path))
}

#[derive(Parser, Debug)]
#[command(
    name = "supply-notifier",
    version = concat!(env!("CARGO_PKG_VERSION"), " (", env!("GIT_HASH"), ")"),
    styles = get_styles()
)]
struct CliArgs {
    /// Directory holding the notifier database.
    #[clap(long, value_parser = parse_path)]
    pub db_dir: Option<PathBuf>,

    /// Optional TOML config file. Its values override command line flags.
    #[clap(long, value_parser = parse_path)]
    pub config: Option<PathBuf>,

    /// Base URL of the request-status API.
    #[clap(long, default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: String,

    /// Poll on behalf of this student instead of the logged-in one.
    #[clap(long)]
    pub student_id: Option<String>,

    /// Seconds between polls.
    #[clap(long, default_value_t = 10)]
    pub poll_interval_secs: u64,

    /// Timeout in seconds for API requests.
    #[clap(long, default_value_t = 30)]
    pub http_timeout_sec: u64,

    /// Seconds between unread badge refreshes.
    #[clap(long, default_value_t = 30)]
    pub badge_refresh_secs: u64,

    /// How far ahead of its start an approved request gets a reminder.
    #[clap(long, default_value_t = 24)]
    pub reminder_window_hours: u32,

    /// Number of days to keep notifications. Set to 0 to disable pruning.
    #[clap(long, default_value_t = 30)]
    pub retention_days: u32,

    /// Interval in hours between pruning runs. Only used if retention_days > 0.
    #[clap(long, default_value_t = 24)]
    pub prune_interval_hours: u64,

    /// Maximum number of notifications kept. Set to 0 for no limit.
    #[clap(long, default_value_t = 100)]
    pub max_notifications: usize,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Poll in the background until interrupted.
    Run,

    /// Run a single poll and report what it found.
    PollOnce,

    /// Show the notification history, newest first.
    List {
        /// Only show unread notifications.
        #[clap(long)]
        unread: bool,
    },

    /// Show the number of unread notifications.
    UnreadCount,

    /// Mark one notification as read.
    MarkRead { id: String },

    /// Mark every notification as read.
    MarkAllRead,

    /// Delete one notification.
    Delete { id: String },

    /// Delete the whole history.
    Clear,

    /// Delete notifications older than the retention period.
    Prune {
        /// Override the configured retention period.
        #[clap(long)]
        days: Option<u32>,
    },

    /// Remember the student to poll for.
    Login { student_id: String },

    /// Forget the logged-in student.
    Logout,
}

impl CliArgs {
    fn to_cli_config(&self) -> CliConfig {
        CliConfig {
            db_dir: self.db_dir.clone(),
            api_base_url: self.api_base_url.clone(),
            student_id: self.student_id.clone(),
            poll_interval_secs: self.poll_interval_secs,
            http_timeout_sec: self.http_timeout_sec,
            badge_refresh_secs: self.badge_refresh_secs,
            reminder_window_hours: self.reminder_window_hours,
            retention_days: self.retention_days,
            prune_interval_hours: self.prune_interval_hours,
            max_notifications: self.max_notifications,
        }
    }
}

fn print_notification(notification: &Notification) {
    let marker = if notification.is_read { " " } else { "*" };
    let date = notification
        .created_at_utc()
        .map(|dt| dt.format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_default();
    println!(
        "{} {}  {}  [{}] {}",
        marker, notification.id, date, notification.kind, notification.title
    );
    println!("    {}", notification.message);
}

async fn run(notifier: &Notifier) -> Result<()> {
    let cancel = CancellationToken::new();
    let handles = notifier.start_background(cancel.clone()).await;

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for shutdown signal")?;
    info!("Shutting down...");

    notifier.scheduler.stop().await;
    cancel.cancel();
    for handle in handles {
        let _ = handle.await;
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli_args = CliArgs::parse();

    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .with_env_var("LOG_LEVEL")
                .from_env_lossy(),
        )
        .try_init()
        .context("Failed to initialize logging")?;

    let file_config = cli_args
        .config
        .as_deref()
        .map(FileConfig::load)
        .transpose()?;
    let config = AppConfig::resolve(&cli_args.to_cli_config(), file_config)?;
    let notifier = Notifier::open(config)?;
    let store = &notifier.notifications;

    match cli_args.command {
        Command::Run => run(&notifier).await?,
        Command::PollOnce => match notifier.scheduler.poll_now().await? {
            TickOutcome::NoIdentity => println!("No student logged in, nothing to poll"),
            TickOutcome::Completed {
                transitions,
                notified,
                reminders,
            } => println!(
                "{} status changes, {} notifications, {} reminders",
                transitions, notified, reminders
            ),
        },
        Command::List { unread } => {
            let notifications = if unread {
                store.get_unread()?
            } else {
                store.get_all()?
            };
            if notifications.is_empty() {
                println!("No notifications");
            }
            for notification in &notifications {
                print_notification(notification);
            }
        }
        Command::UnreadCount => {
            let count = store.get_unread_count()?;
            match badge_label(count) {
                Some(label) => println!("{}", label),
                None => println!("0"),
            }
        }
        Command::MarkRead { id } => {
            if !store.mark_read(&id)? {
                bail!("No notification with id {}", id);
            }
        }
        Command::MarkAllRead => {
            let count = store.mark_all_read()?;
            println!("Marked {} notifications as read", count);
        }
        Command::Delete { id } => {
            if !store.delete(&id)? {
                bail!("No notification with id {}", id);
            }
        }
        Command::Clear => {
            let count = store.clear_all()?;
            println!("Deleted {} notifications", count);
        }
        Command::Prune { days } => {
            let days = days.unwrap_or(notifier.config.notifications.retention_days);
            if days == 0 {
                println!("Pruning disabled (retention_days = 0)");
            } else {
                let count = store.prune_older_than(days)?;
                println!("Pruned {} notifications older than {} days", count, days);
            }
        }
        Command::Login { student_id } => {
            notifier.login(&student_id)?;
            println!("Logged in as {}", student_id.trim());
        }
        Command::Logout => {
            notifier.logout()?;
            println!("Logged out");
        }
    }

    Ok(())
}
