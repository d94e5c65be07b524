use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use sift::app::{App, View};
use sift::config::Config;
use sift::hn::TOP_STORIES_LIMIT;
use sift::storage::{Database, DatabaseError};
use sift::ui;
use sift::util::browser_url;

/// Get the config directory path (~/.config/sift/)
fn get_config_dir() -> Result<PathBuf> {
    let home = std::env::var("HOME").context("HOME environment variable not set")?;
    let config_dir = PathBuf::from(home).join(".config").join("sift");
    Ok(config_dir)
}

#[derive(Parser, Debug)]
#[command(name = "sift", about = "Terminal Hacker News reader with read/saved triage")]
struct Args {
    /// Clear the read and saved sets before doing anything else
    #[arg(long)]
    reset_state: bool,

    /// One-shot command; without one, sift starts the interactive shell
    #[command(subcommand)]
    command: Option<CliCommand>,
}

#[derive(Subcommand, Debug)]
enum CliCommand {
    /// Print the unread feed and exit
    Unread,
    /// Print the read stories still on the front pages and exit
    Read,
    /// Print the saved stories still on the front pages and exit
    Saved,
    /// Print the front page by raw rank (triage shown, not applied) and exit
    Top,
    /// Add story ids to the read set
    Mark {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Remove story ids from the read set
    Unmark {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Toggle story ids in the saved set
    Save {
        #[arg(required = true)]
        ids: Vec<String>,
    },
    /// Look a story up by id and open it in the browser
    Open { id: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing for debug logging
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    // Set up config directory
    let config_dir = get_config_dir()?;
    if !config_dir.exists() {
        std::fs::create_dir_all(&config_dir).context("Failed to create config directory")?;
        println!("Created config directory: {}", config_dir.display());
    }

    // Directory holds only this user's state; keep it user-only on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        match std::fs::metadata(&config_dir) {
            Ok(metadata) => {
                let mut perms = metadata.permissions();
                perms.set_mode(0o700);
                if let Err(e) = std::fs::set_permissions(&config_dir, perms) {
                    tracing::warn!(
                        path = %config_dir.display(),
                        error = %e,
                        "Failed to set config directory permissions to 0700"
                    );
                }
            }
            Err(e) => {
                tracing::warn!(
                    path = %config_dir.display(),
                    error = %e,
                    "Failed to read config directory metadata"
                );
            }
        }
    }

    let config = Config::load(&config_dir.join("config.toml"))
        .context("Failed to load configuration")?;

    // Open database
    let db_path = config_dir.join("state.db");
    let db_path_str = db_path
        .to_str()
        .ok_or_else(|| anyhow::anyhow!("Invalid UTF-8 in database path"))?;
    let db = match Database::open(db_path_str).await {
        Ok(db) => db,
        Err(DatabaseError::InstanceLocked) => {
            eprintln!(
                "Error: Another instance of sift appears to be running. Please close it and try again."
            );
            std::process::exit(1);
        }
        Err(e) => {
            return Err(anyhow::anyhow!("Failed to open database: {}", e));
        }
    };

    // Handle --reset-state flag
    if args.reset_state {
        db.clear_triage().await.context("Failed to clear triage state")?;
        println!("Triage state cleared.");
    }

    let mut app = App::new(db, &config)
        .await
        .context("Failed to create application")?;

    match args.command {
        None => {
            ui::run(&mut app).await?;
            println!("Goodbye!");
        }
        Some(command) => run_command(&mut app, command).await?,
    }

    Ok(())
}

async fn run_command(app: &mut App, command: CliCommand) -> Result<()> {
    match command {
        CliCommand::Unread => print_view(app, View::Unread).await,
        CliCommand::Read => print_view(app, View::Read).await,
        CliCommand::Saved => print_view(app, View::Saved).await,
        CliCommand::Top => {
            let stories = app
                .firebase
                .top_stories(TOP_STORIES_LIMIT)
                .await
                .context("Failed to load top stories")?;
            print!("{}", ui::render_top_list(&stories, &app.triage));
            Ok(())
        }
        CliCommand::Mark { ids } => {
            for raw in &ids {
                let id = story_id(raw)?;
                if app.mark_read_by_id(id).await? {
                    println!("Marked read: {id}");
                } else {
                    println!("Already in the read set: {id}");
                }
            }
            Ok(())
        }
        CliCommand::Unmark { ids } => {
            for raw in &ids {
                let id = story_id(raw)?;
                if app.unmark_read_by_id(id).await? {
                    println!("Removed from the read set: {id}");
                } else {
                    println!("Not in the read set: {id}");
                }
            }
            Ok(())
        }
        CliCommand::Save { ids } => {
            for raw in &ids {
                let id = story_id(raw)?;
                if app.toggle_saved_by_id(id).await? {
                    println!("Saved: {id}");
                } else {
                    println!("Unsaved: {id}");
                }
            }
            Ok(())
        }
        CliCommand::Open { id } => open_by_id(app, &id).await,
    }
}

/// One-shot `open`: a single item lookup on the Firebase endpoint, since the
/// story may not be anywhere near the search front pages anymore.
async fn open_by_id(app: &mut App, raw: &str) -> Result<()> {
    let id = story_id(raw)?;
    let numeric: u64 = id.parse().context("Story id out of range")?;

    let story = app
        .firebase
        .item(numeric)
        .await
        .context("Failed to fetch the story")?
        .and_then(|item| item.into_story());
    let Some(story) = story else {
        anyhow::bail!("No story with id {id}");
    };

    let url = browser_url(&story.link())?;
    open::that(url.as_str()).context("Failed to open browser")?;
    println!("Opening: {}", story.title);

    if app.mark_read_on_open {
        app.mark_read_by_id(id).await?;
    }
    Ok(())
}

async fn print_view(app: &mut App, view: View) -> Result<()> {
    app.activate_view(view)
        .await
        .with_context(|| format!("Failed to load the {} view", view.as_str()))?;
    print!("{}", ui::render_list(app.view, &app.stories, &app.triage));
    Ok(())
}

/// Ids are numeric strings on both APIs; catching typos here keeps junk
/// out of the persisted sets.
fn story_id(raw: &str) -> Result<&str> {
    let id = raw.trim();
    if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
        anyhow::bail!("Story ids are numeric, got `{raw}`");
    }
    Ok(id)
}
