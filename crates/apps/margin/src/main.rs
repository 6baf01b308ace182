//! Margin - print a chat response with its notes highlighted
//!
//! Usage: margin <message.txt> [--notes notes.json] [--add FROM TO CONTENT]...
//!
//! Notes are loaded from the JSON file (if given), new ones are added
//! through the same validation and optimistic path the chat client uses,
//! and the file is written back with the result.

mod render;

use anyhow::{Context, Result, bail};
use chat::{AnnotationStore, ClientSettings, InMemoryRemote, Note, TargetId};
use log::{error, info, warn};
use std::path::{Path, PathBuf};
use std::sync::Arc;

const USAGE: &str = "usage: margin <message.txt> [--notes notes.json] [--add FROM TO CONTENT]...";

#[derive(Debug, PartialEq)]
struct Args {
    message: PathBuf,
    notes: Option<PathBuf>,
    additions: Vec<Addition>,
}

#[derive(Debug, PartialEq)]
struct Addition {
    from_index: usize,
    to_index: usize,
    content: String,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Result<Args> {
    let mut message = None;
    let mut notes = None;
    let mut additions = Vec::new();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--notes" => {
                notes = Some(PathBuf::from(args.next().context("--notes needs a path")?));
            }
            "--add" => {
                let from_index = args
                    .next()
                    .context("--add needs FROM TO CONTENT")?
                    .parse()
                    .context("FROM must be a character offset")?;
                let to_index = args
                    .next()
                    .context("--add needs FROM TO CONTENT")?
                    .parse()
                    .context("TO must be a character offset")?;
                let content = args.next().context("--add needs FROM TO CONTENT")?;
                additions.push(Addition {
                    from_index,
                    to_index,
                    content,
                });
            }
            flag if flag.starts_with("--") => bail!("unknown option {flag}\n{USAGE}"),
            _ if message.is_none() => message = Some(PathBuf::from(&arg)),
            _ => bail!("unexpected argument {arg}\n{USAGE}"),
        }
    }

    Ok(Args {
        message: message.context(USAGE)?,
        notes,
        additions,
    })
}

fn load_notes(path: &Path) -> Result<Vec<Note>> {
    if !path.exists() {
        return Ok(Vec::new());
    }
    config::load_json_file(path)
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Initialize logging
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    // Bootstrap config directory
    if let Err(e) = config::init() {
        error!("Failed to initialize config directory: {}", e);
    }

    if let Err(e) = run(std::env::args().skip(1)).await {
        error!("{:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: impl Iterator<Item = String>) -> Result<()> {
    let args = parse_args(args)?;
    let settings = ClientSettings::load().unwrap_or_else(|e| {
        warn!("Using default client settings: {:#}", e);
        ClientSettings::default()
    });

    let text = std::fs::read_to_string(&args.message)
        .with_context(|| format!("Failed to read message: {}", args.message.display()))?;
    let target_id = TargetId::new(
        args.message
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "message".to_string()),
    );

    let remote = Arc::new(InMemoryRemote::new());
    if let Some(path) = &args.notes {
        for mut note in load_notes(path)? {
            note.target_id = target_id.clone();
            remote.insert_note(note);
        }
    }

    let store = AnnotationStore::new(Arc::clone(&remote), target_id, &settings)
        .with_text_len(text.chars().count());
    store.fetch().await?;

    for addition in &args.additions {
        match store
            .add(&addition.content, addition.from_index, addition.to_index)
            .await
        {
            Ok(note) => info!("Added {} at {}..{}", note.id, note.from_index, note.to_index),
            Err(e) => warn!(
                "Skipped note at {}..{}: {}",
                addition.from_index, addition.to_index, e
            ),
        }
    }

    let notes = store.notes();
    println!("{}", render::render_annotated(&text, &notes));

    if let Some(path) = &args.notes {
        config::save_json_file(path, &notes)?;
        info!("Saved {} notes to {}", notes.len(), path.display());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn args(list: &[&str]) -> impl Iterator<Item = String> {
        list.iter().map(|s| s.to_string()).collect::<Vec<_>>().into_iter()
    }

    #[test]
    fn test_parse_args() {
        let parsed = parse_args(args(&["msg.txt", "--notes", "n.json", "--add", "4", "9", "quick"]))
            .unwrap();
        assert_eq!(parsed.message, PathBuf::from("msg.txt"));
        assert_eq!(parsed.notes, Some(PathBuf::from("n.json")));
        assert_eq!(
            parsed.additions,
            vec![Addition {
                from_index: 4,
                to_index: 9,
                content: "quick".to_string()
            }]
        );
    }

    #[test]
    fn test_parse_args_errors() {
        assert!(parse_args(args(&[])).is_err());
        assert!(parse_args(args(&["msg.txt", "--add", "4", "x", "y"])).is_err());
        assert!(parse_args(args(&["msg.txt", "--verbose"])).is_err());
        assert!(parse_args(args(&["a.txt", "b.txt"])).is_err());
    }

    #[tokio::test]
    async fn test_run_adds_and_saves_notes() {
        let dir = TempDir::new().unwrap();
        let message = dir.path().join("resp.txt");
        let notes = dir.path().join("notes.json");
        std::fs::write(&message, "The quick brown fox").unwrap();

        let argv = [
            message.to_str().unwrap(),
            "--notes",
            notes.to_str().unwrap(),
            "--add",
            "4",
            "9",
            "adjective",
            "--add",
            "5",
            "12",
            "overlaps quick",
        ];
        run(args(&argv)).await.unwrap();

        let saved: Vec<Note> = config::load_json_file(&notes).unwrap();
        assert_eq!(saved.len(), 1);
        assert_eq!(saved[0].content, "adjective");
        assert_eq!(saved[0].target_id, TargetId::new("resp"));

        // A second run picks the saved note up again
        run(args(&[message.to_str().unwrap(), "--notes", notes.to_str().unwrap()]))
            .await
            .unwrap();
        let saved: Vec<Note> = config::load_json_file(&notes).unwrap();
        assert_eq!(saved.len(), 1);
    }
}
