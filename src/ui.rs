//! Interactive shell: a prompt-per-line command loop over the session state.
//!
//! Rendering is plain numbered text, one story per entry. Commands address
//! stories by their on-screen number, so the list is re-rendered whenever a
//! command changes what's visible; numbers always refer to the list the
//! user is looking at.
//!
//! Fetch failures print a single message plus a retry hint and leave the
//! previous list on screen; nothing is partially applied.

use std::fmt::Write as _;
use std::io::Write as _;

use anyhow::Result;
use tokio::io::AsyncBufReadExt;

use crate::app::{App, View};
use crate::hn::{FetchError, Story, TOP_STORIES_LIMIT};
use crate::storage::TriageSets;
use crate::util::{browser_url, host_for_display, relative_time};

const HELP: &str = "\
Commands:
  unread | read | saved   switch view (always loads fresh)
  refresh                 reload the current view
  mark N                  toggle read state of story N
  save N                  toggle saved state of story N
  open N                  open story N in the browser
  top                     front page by raw rank (triage shown, not applied)
  help                    show this text
  quit                    exit";

// ============================================================================
// Command Parsing
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Activate(View),
    Refresh,
    /// Zero-based index into the visible list.
    ToggleRead(usize),
    ToggleSaved(usize),
    Open(usize),
    Top,
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` is a blank line; `Err` carries the
/// message to show the user.
fn parse_command(line: &str) -> Result<Option<Command>, String> {
    let mut words = line.split_whitespace();
    let Some(verb) = words.next() else {
        return Ok(None);
    };

    let cmd = match verb {
        "unread" | "u" => Command::Activate(View::Unread),
        "read" | "r" => Command::Activate(View::Read),
        "saved" | "s" => Command::Activate(View::Saved),
        "refresh" => Command::Refresh,
        "mark" | "m" => Command::ToggleRead(parse_position(verb, words.next())?),
        "save" => Command::ToggleSaved(parse_position(verb, words.next())?),
        "open" | "o" => Command::Open(parse_position(verb, words.next())?),
        "top" | "t" => Command::Top,
        "help" | "h" | "?" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => return Err(format!("Unknown command `{}`. Type `help`.", other)),
    };

    if let Some(extra) = words.next() {
        return Err(format!("Unexpected argument `{}`. Type `help`.", extra));
    }
    Ok(Some(cmd))
}

/// On-screen numbers are 1-based; commands carry 0-based indexes.
fn parse_position(verb: &str, arg: Option<&str>) -> Result<usize, String> {
    let Some(arg) = arg else {
        return Err(format!("`{verb}` needs a story number, e.g. `{verb} 3`"));
    };
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(format!("Not a story number: `{arg}`")),
    }
}

// ============================================================================
// Rendering
// ============================================================================

/// Render one view's numbered story list, with per-view triage flags.
pub fn render_list(view: View, stories: &[Story], triage: &TriageSets) -> String {
    let mut out = String::new();

    if stories.is_empty() {
        let empty = match view {
            View::Unread => "No unread stories above the score filter.",
            View::Read => "Nothing marked read (or none of it is on the front pages anymore).",
            View::Saved => "Nothing saved (or none of it is on the front pages anymore).",
        };
        let _ = writeln!(out, "\n  {empty}\n");
        return out;
    }

    let heading = match view {
        View::Unread => "Unread",
        View::Read => "Read",
        View::Saved => "Saved",
    };
    let _ = writeln!(out, "\n  {heading} ({} stories)\n", stories.len());

    for (i, story) in stories.iter().enumerate() {
        // The unread feed excludes triaged ids by construction, so flags only
        // show where mixed states are possible.
        let flags = match view {
            View::Unread => String::new(),
            View::Read => flag_text(&[("saved", triage.is_saved(&story.id))]),
            View::Saved => flag_text(&[("read", triage.is_read(&story.id))]),
        };
        render_row(&mut out, i + 1, story, &flags);
    }
    out
}

/// Render the raw-rank front page with both triage flags annotated.
pub fn render_top_list(stories: &[Story], triage: &TriageSets) -> String {
    let mut out = String::new();
    if stories.is_empty() {
        let _ = writeln!(out, "\n  The front page came back empty.\n");
        return out;
    }

    let _ = writeln!(out, "\n  Top Stories ({} shown)\n", stories.len());
    for (i, story) in stories.iter().enumerate() {
        let flags = flag_text(&[
            ("read", triage.is_read(&story.id)),
            ("saved", triage.is_saved(&story.id)),
        ]);
        render_row(&mut out, i + 1, story, &flags);
    }
    let _ = writeln!(
        out,
        "  (triage markers only; `mark`/`save`/`open` keep addressing the active view)"
    );
    out
}

fn render_row(out: &mut String, number: usize, story: &Story, flags: &str) {
    let _ = writeln!(out, "{:>4}. {}{}", number, story.title, flags);

    let mut detail = format!("{} points · by {}", story.score, story.by);
    let _ = write!(detail, " · {}", relative_time(story.time));
    if let Some(comments) = story.comment_count {
        let _ = write!(detail, " · {comments} comments");
    }
    if let Some(url) = &story.url {
        let _ = write!(detail, " · {}", host_for_display(url));
    }
    let _ = writeln!(out, "      {detail}");
}

fn flag_text(flags: &[(&str, bool)]) -> String {
    let active: Vec<&str> = flags
        .iter()
        .filter(|(_, on)| *on)
        .map(|(name, _)| *name)
        .collect();
    if active.is_empty() {
        String::new()
    } else {
        format!("  [{}]", active.join(", "))
    }
}

fn print_fetch_error(err: &FetchError) {
    println!("Error: {err}");
    println!("Nothing was changed. Run `refresh` to retry.");
}

// ============================================================================
// Shell Loop
// ============================================================================

/// Run the interactive shell until `quit` or EOF.
pub async fn run(app: &mut App) -> Result<()> {
    let initial = app.restore_view().await;
    match app.activate_view(initial).await {
        Ok(()) => print!("{}", render_list(app.view, &app.stories, &app.triage)),
        Err(e) => print_fetch_error(&e),
    }
    println!("Type `help` for commands.");

    let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("sift> ");
        std::io::stdout().flush()?;

        // EOF (piped input ran out, or Ctrl-D) ends the session.
        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        let cmd = match parse_command(&line) {
            Ok(Some(cmd)) => cmd,
            Ok(None) => continue,
            Err(msg) => {
                println!("{msg}");
                continue;
            }
        };

        let visible_before = app.stories.len();
        let mut loaded = false;
        match cmd {
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Activate(view) => match app.activate_view(view).await {
                Ok(()) => loaded = true,
                Err(e) => print_fetch_error(&e),
            },
            Command::Refresh => match app.refresh().await {
                Ok(()) => loaded = true,
                Err(e) => print_fetch_error(&e),
            },
            Command::ToggleRead(index) => match app.toggle_read(index).await {
                Ok(msg) => println!("{msg}"),
                Err(e) => println!("{e}"),
            },
            Command::ToggleSaved(index) => match app.toggle_saved(index).await {
                Ok(msg) => println!("{msg}"),
                Err(e) => println!("{e}"),
            },
            Command::Open(index) => open_story(app, index).await?,
            Command::Top => match app.firebase.top_stories(TOP_STORIES_LIMIT).await {
                Ok(stories) => print!("{}", render_top_list(&stories, &app.triage)),
                Err(e) => print_fetch_error(&e),
            },
        }

        // The one place the view list renders: after every fresh load, and
        // after a mutation that changed what's visible (a dropped row
        // invalidates the numbers the next command would use).
        if loaded || app.stories.len() != visible_before {
            print!("{}", render_list(app.view, &app.stories, &app.triage));
        }
    }
    Ok(())
}

async fn open_story(app: &mut App, index: usize) -> Result<()> {
    let story = match app.story(index) {
        Ok(story) => story,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };
    let title = story.title.clone();
    let link = story.link();

    // Validate before open::that() so an API-supplied URL can't smuggle in
    // a non-http scheme.
    let url = match browser_url(&link) {
        Ok(url) => url,
        Err(e) => {
            println!("{e}");
            return Ok(());
        }
    };

    if let Err(e) = open::that(url.as_str()) {
        println!("Failed to open browser: {e}");
        return Ok(());
    }
    println!("Opening: {title}");

    if app.mark_read_on_open {
        app.mark_read(index).await?;
    }
    Ok(())
}

// ============================================================================
// Tests
// ============================================================================
