use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;

use crate::commands::*;
use crate::events::{StatePayload, EVENT_STATE_UPDATED};
use crate::location::{format_clock, header_line, resolve_location};
use crate::models::{Coordinates, OpenSection};
use crate::render::{render_state, task_line};
use crate::reorder::DragError;
use crate::storage::{KeyValueStore, StorageError};
use crate::state::AppState;

const DATA_DIR_NAME: &str = "tinytasks";

#[derive(Parser, Debug, Clone)]
#[command(
    name = "tinytasks",
    version,
    about = "Task management made simple.",
    disable_help_subcommand = true
)]
pub struct Cli {
    #[arg(long = "data", env = "TINYTASKS_HOME", global = true, help = "Directory holding tasks, settings and logs")]
    pub data: Option<PathBuf>,

    #[arg(long, global = true, help = "Print the command result as JSON")]
    pub json: bool,

    #[arg(long = "no-clock", global = true, help = "Leave the clock and location out of the header")]
    pub no_clock: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    #[command(about = "Show the list (default)")]
    List,
    #[command(about = "Add a task to the end of the list")]
    Add {
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    #[command(about = "Complete an active task")]
    Done { task: String },
    #[command(about = "Move a completed task back to the list")]
    Reopen { task: String },
    #[command(about = "Archive an active task")]
    Archive { task: String },
    #[command(about = "Move an active task to the deleted bin")]
    Delete { task: String },
    #[command(about = "Replace the text of an active task")]
    Edit {
        task: String,
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,
    },
    #[command(about = "Bring a task back from a bin")]
    Restore {
        #[arg(value_enum)]
        from: Bin,
        task: String,
    },
    #[command(about = "Forget a deleted task for good")]
    Purge { task: String },
    #[command(about = "Move a task from one position to another (1-based)")]
    Move { from: usize, to: usize },
    #[command(about = "Expand a section, or collapse it if already expanded")]
    Section {
        #[arg(value_enum)]
        section: SectionArg,
    },
    #[command(about = "Configure the location shown in the header")]
    Location {
        #[command(subcommand)]
        action: LocationAction,
    },
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bin {
    Archived,
    Deleted,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum SectionArg {
    Completed,
    Archived,
    Deleted,
    None,
}

impl SectionArg {
    fn open_section(self) -> Option<OpenSection> {
        match self {
            SectionArg::Completed => Some(OpenSection::Completed),
            SectionArg::Archived => Some(OpenSection::Archived),
            SectionArg::Deleted => Some(OpenSection::Deleted),
            SectionArg::None => None,
        }
    }
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum LocationAction {
    #[command(about = "Store coordinates for the city label")]
    Set {
        #[arg(allow_negative_numbers = true)]
        latitude: f64,
        #[arg(allow_negative_numbers = true)]
        longitude: f64,
    },
    #[command(about = "Stop showing a location")]
    Clear,
}

pub struct CliCtx {
    data: Option<PathBuf>,
}

impl CliCtx {
    pub fn new(data: Option<PathBuf>) -> Self {
        Self { data }
    }
}

impl CommandCtx for CliCtx {
    fn data_dir(&self) -> Result<PathBuf, StorageError> {
        if let Some(path) = &self.data {
            return Ok(path.clone());
        }
        dirs::data_dir()
            .map(|dir| dir.join(DATA_DIR_NAME))
            .ok_or_else(|| StorageError::Io(std::io::Error::other("no user data directory")))
    }

    fn emit_state_updated(&self, payload: StatePayload) {
        log::debug!(
            "{EVENT_STATE_UPDATED} tasks={} completed={} archived={} deleted={}",
            payload.tasks.len(),
            payload.completed_tasks.len(),
            payload.archived_tasks.len(),
            payload.deleted_tasks.len()
        );
    }
}

#[derive(Debug)]
pub struct Outcome {
    pub ok: bool,
    pub output: String,
}

struct Reply {
    ok: bool,
    json: serde_json::Value,
    message: Option<String>,
}

fn reply<T: Serialize>(result: CommandResult<T>, describe: impl FnOnce(&T) -> String) -> Reply {
    let message = match (&result.data, &result.error) {
        (_, Some(error)) => Some(format!("error: {error}")),
        (Some(data), None) => Some(describe(data)),
        (None, None) => Some("nothing changed".to_string()),
    };
    let ok = result.ok;
    let json = serde_json::to_value(&result).unwrap_or(serde_json::Value::Null);
    Reply { ok, json, message }
}

fn joined(words: &[String]) -> String {
    words.join(" ")
}

fn dispatch<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    command: Command,
) -> Reply {
    match command {
        Command::List => Reply {
            ok: true,
            json: serde_json::to_value(ok(state.snapshot())).unwrap_or(serde_json::Value::Null),
            message: None,
        },
        Command::Add { text } => reply(add_task_impl(ctx, state, &joined(&text)), |task| {
            format!("added: {}", task_line(task))
        }),
        Command::Done { task } => reply(complete_task_impl(ctx, state, &task), |task| {
            format!("completed: {}", task_line(task))
        }),
        Command::Reopen { task } => reply(reopen_task_impl(ctx, state, &task), |task| {
            format!("reopened: {}", task_line(task))
        }),
        Command::Archive { task } => reply(archive_task_impl(ctx, state, &task), |task| {
            format!("archived: {}", task_line(task))
        }),
        Command::Delete { task } => reply(delete_task_impl(ctx, state, &task), |task| {
            format!("deleted: {}", task_line(task))
        }),
        Command::Edit { task, text } => {
            reply(edit_task_impl(ctx, state, &task, &joined(&text)), |task| {
                format!("edited: {}", task_line(task))
            })
        }
        Command::Restore { from, task } => {
            let from = match from {
                Bin::Archived => OpenSection::Archived,
                Bin::Deleted => OpenSection::Deleted,
            };
            reply(restore_task_impl(ctx, state, from, &task), |task| {
                format!("restored: {}", task_line(task))
            })
        }
        Command::Purge { task } => reply(purge_task_impl(ctx, state, &task), |task| {
            format!("permanently deleted: {}", task_line(task))
        }),
        Command::Move { from, to } => {
            if from == 0 || to == 0 {
                return reply(err::<bool>("positions start at 1"), |_| String::new());
            }
            let len = state.tasks().len();
            if from > len || to > len {
                let error = DragError::OutOfBounds {
                    source: from,
                    target: to,
                    len,
                };
                return reply(err::<bool>(&error.to_string()), |_| String::new());
            }
            reply(
                reorder_task_impl(ctx, state, from - 1, to - 1),
                |moved| {
                    if *moved {
                        format!("moved {from} to {to}")
                    } else {
                        "nothing changed".to_string()
                    }
                },
            )
        }
        Command::Section { section } => reply(
            toggle_section_impl(ctx, state, section.open_section()),
            |open| match open {
                Some(section) => format!("{} expanded", section.collection().label()),
                None => "sections collapsed".to_string(),
            },
        ),
        Command::Location { action } => {
            let location = match action {
                LocationAction::Set {
                    latitude,
                    longitude,
                } => Some(Coordinates {
                    latitude,
                    longitude,
                }),
                LocationAction::Clear => None,
            };
            reply(set_location_impl(ctx, location), |settings| {
                match settings.location {
                    Some(at) => format!("location set to {}, {}", at.latitude, at.longitude),
                    None => "location cleared".to_string(),
                }
            })
        }
    }
}

fn header(ctx: &impl CommandCtx, no_clock: bool) -> Option<String> {
    if no_clock {
        return None;
    }
    let settings = load_settings_impl(ctx);
    if !settings.show_clock {
        return None;
    }
    let clock = format_clock(&chrono::Local::now());
    let location = resolve_location(&settings);
    header_line(Some(clock), location.as_ref())
}

pub fn execute(cli: Cli, ctx: &impl CommandCtx) -> Outcome {
    let mut state = load_state_impl(ctx);
    let command = cli.command.unwrap_or(Command::List);
    let shows_list = !matches!(command, Command::Location { .. });
    let reply = dispatch(ctx, &mut state, command);

    if cli.json {
        return Outcome {
            ok: reply.ok,
            output: format!(
                "{}\n",
                serde_json::to_string_pretty(&reply.json).unwrap_or_default()
            ),
        };
    }

    let mut output = String::new();
    if let Some(message) = &reply.message {
        output.push_str(message);
        output.push('\n');
    }
    if reply.ok && shows_list {
        if reply.message.is_some() {
            output.push('\n');
        }
        let header = header(ctx, cli.no_clock);
        output.push_str(&render_state(
            &state.snapshot(),
            None,
            header.as_deref(),
        ));
    }
    Outcome {
        ok: reply.ok,
        output,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(dir: &std::path::Path, args: &[&str]) -> Outcome {
        let mut argv = vec!["tinytasks", "--no-clock", "--data"];
        argv.push(dir.to_str().unwrap());
        argv.extend_from_slice(args);
        let cli = Cli::try_parse_from(argv).expect("arguments should parse");
        let ctx = CliCtx::new(cli.data.clone());
        execute(cli, &ctx)
    }

    #[test]
    fn parses_commands_and_defaults_to_list() {
        let cli = Cli::try_parse_from(["tinytasks"]).unwrap();
        assert_eq!(cli.command, None);
        assert!(!cli.json);

        let cli = Cli::try_parse_from(["tinytasks", "add", "Buy", "milk"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Add {
                text: vec!["Buy".into(), "milk".into()]
            })
        );

        let cli = Cli::try_parse_from(["tinytasks", "restore", "deleted", "2", "--json"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Restore {
                from: Bin::Deleted,
                task: "2".into()
            })
        );
        assert!(cli.json);

        let cli =
            Cli::try_parse_from(["tinytasks", "location", "set", "-33.87", "151.21"]).unwrap();
        assert_eq!(
            cli.command,
            Some(Command::Location {
                action: LocationAction::Set {
                    latitude: -33.87,
                    longitude: 151.21
                }
            })
        );

        assert!(Cli::try_parse_from(["tinytasks", "add"]).is_err());
        assert!(Cli::try_parse_from(["tinytasks", "section", "sideways"]).is_err());
    }

    #[test]
    fn add_then_list_shows_the_task() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(dir.path(), &["add", "Buy", "milk"]);
        assert!(outcome.ok);
        assert!(outcome.output.starts_with("added: Buy milk\n\ntinytasks.io\n"));

        let outcome = run(dir.path(), &[]);
        assert!(outcome.output.contains("Tasks (1)\n   1. [ ] Buy milk\n"));
    }

    #[test]
    fn walk_through_the_bins() {
        let dir = tempfile::tempdir().unwrap();
        run(dir.path(), &["add", "Buy milk"]);
        run(dir.path(), &["add", "Walk dog"]);
        run(dir.path(), &["done", "1"]);
        run(dir.path(), &["archive", "1"]);

        let outcome = run(dir.path(), &["section", "archived"]);
        assert!(outcome.output.starts_with("Archived expanded\n"));
        assert!(outcome.output.contains("Tasks (0)\n"));
        assert!(outcome.output.contains("v Archived (1)\n   1. [ ] Walk dog\n"));

        let outcome = run(dir.path(), &["restore", "archived", "1"]);
        assert!(outcome.output.starts_with("restored: Walk dog\n"));
        assert!(outcome.output.contains("Tasks (1)\n   1. [ ] Walk dog\n"));
        assert!(!outcome.output.contains("Archived ("));

        let outcome = run(dir.path(), &["section", "archived"]);
        assert!(outcome.output.starts_with("sections collapsed\n"));
    }

    #[test]
    fn move_uses_one_based_positions() {
        let dir = tempfile::tempdir().unwrap();
        for text in ["A", "B", "C", "D"] {
            run(dir.path(), &["add", text]);
        }
        let outcome = run(dir.path(), &["move", "1", "3"]);
        assert!(outcome.ok);
        assert!(outcome.output.contains("   1. [ ] B\n   2. [ ] C\n   3. [ ] A\n   4. [ ] D\n"));

        let outcome = run(dir.path(), &["move", "0", "1"]);
        assert!(!outcome.ok);
        assert_eq!(outcome.output, "error: positions start at 1\n");

        let outcome = run(dir.path(), &["move", "1", "9"]);
        assert!(!outcome.ok);
        assert_eq!(
            outcome.output,
            "error: cannot move position 1 to 9 in a list of 4\n"
        );

        let outcome = run(dir.path(), &["move", "9", "1"]);
        assert!(!outcome.ok);
        assert_eq!(
            outcome.output,
            "error: cannot move position 9 to 1 in a list of 4\n"
        );

        let outcome = run(dir.path(), &["move", "4", "1"]);
        assert!(outcome.ok);
        assert!(outcome.output.contains("   1. [ ] D\n   2. [ ] B\n"));

        let outcome = run(dir.path(), &["move", "2", "2"]);
        assert!(outcome.ok);
        assert!(outcome.output.starts_with("nothing changed\n"));
    }

    #[test]
    fn unknown_task_reports_nothing_changed() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(dir.path(), &["done", "7"]);
        assert!(outcome.ok);
        assert!(outcome.output.starts_with("nothing changed\n"));
        let outcome = run(dir.path(), &["add", "   "]);
        assert!(outcome.output.starts_with("nothing changed\n"));
        assert!(outcome.output.contains("Tasks (0)"));
    }

    #[test]
    fn json_output_is_the_command_envelope() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(dir.path(), &["--json", "add", "Read"]);
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["data"]["text"], "Read");
        assert_eq!(value["data"]["completed"], false);
        assert_eq!(value["error"], serde_json::Value::Null);

        let outcome = run(dir.path(), &["--json", "list"]);
        let value: serde_json::Value = serde_json::from_str(&outcome.output).unwrap();
        assert_eq!(value["ok"], true);
        assert_eq!(value["error"], serde_json::Value::Null);
        assert_eq!(value["data"]["tasks"][0]["text"], "Read");
        assert_eq!(value["data"]["completedTasks"], serde_json::json!([]));
        assert_eq!(value["data"]["openSection"], serde_json::Value::Null);
    }

    #[test]
    fn location_commands_update_settings_without_listing() {
        let dir = tempfile::tempdir().unwrap();
        let outcome = run(dir.path(), &["location", "set", "41.01", "28.97"]);
        assert!(outcome.ok);
        assert_eq!(outcome.output, "location set to 41.01, 28.97\n");
        assert!(dir.path().join("settings.json").is_file());

        let outcome = run(dir.path(), &["location", "clear"]);
        assert_eq!(outcome.output, "location cleared\n");

        let outcome = run(dir.path(), &["location", "set", "91", "0"]);
        assert!(!outcome.ok);
        assert!(outcome.output.starts_with("error: latitude"));
    }
}
