use std::path::PathBuf;

use crate::events::StatePayload;
use crate::models::{Collection, Coordinates, OpenSection, Settings, Task};
use crate::state::AppState;
use crate::storage::{KeyValueStore, MemoryStore, Storage, StorageError};

#[derive(Debug, serde::Serialize)]
pub struct CommandResult<T> {
    pub ok: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

pub trait CommandCtx {
    fn data_dir(&self) -> Result<PathBuf, StorageError>;
    fn emit_state_updated(&self, payload: StatePayload);
}

pub(crate) fn ok<T>(data: T) -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: Some(data),
        error: None,
    }
}

fn unchanged<T>() -> CommandResult<T> {
    CommandResult {
        ok: true,
        data: None,
        error: None,
    }
}

pub(crate) fn err<T>(message: &str) -> CommandResult<T> {
    CommandResult {
        ok: false,
        data: None,
        error: Some(message.to_string()),
    }
}

fn emit_if_changed<S: KeyValueStore, T>(
    ctx: &impl CommandCtx,
    state: &AppState<S>,
    outcome: Option<T>,
) -> CommandResult<T> {
    match outcome {
        Some(data) => {
            ctx.emit_state_updated(state.snapshot());
            ok(data)
        }
        None => unchanged(),
    }
}

pub fn open_store(ctx: &impl CommandCtx) -> Box<dyn KeyValueStore> {
    let storage = match ctx.data_dir() {
        Ok(root) => Storage::new(root),
        Err(error) => {
            log::warn!("no data directory ({error}); tasks will not be saved");
            return Box::new(MemoryStore::new());
        }
    };
    if let Err(error) = storage.ensure_dirs() {
        log::warn!(
            "cannot create {} ({error}); tasks will not be saved",
            storage.root().display()
        );
        return Box::new(MemoryStore::new());
    }
    Box::new(storage)
}

pub fn load_state_impl(ctx: &impl CommandCtx) -> AppState<Box<dyn KeyValueStore>> {
    AppState::hydrate(open_store(ctx))
}

pub fn load_settings_impl(ctx: &impl CommandCtx) -> Settings {
    let root = match ctx.data_dir() {
        Ok(root) => root,
        Err(_) => return Settings::default(),
    };
    match Storage::new(root).load_settings() {
        Ok(file) => file.settings,
        Err(StorageError::Io(error)) if error.kind() == std::io::ErrorKind::NotFound => {
            Settings::default()
        }
        Err(error) => {
            log::warn!("ignoring unreadable settings: {error}");
            Settings::default()
        }
    }
}

pub fn set_location_impl(
    ctx: &impl CommandCtx,
    location: Option<Coordinates>,
) -> CommandResult<Settings> {
    if let Some(coordinates) = location {
        let valid = (-90.0..=90.0).contains(&coordinates.latitude)
            && (-180.0..=180.0).contains(&coordinates.longitude);
        if !valid {
            return err("latitude must be within ±90 and longitude within ±180");
        }
    }
    let root = match ctx.data_dir() {
        Ok(path) => path,
        Err(e) => return err(&format!("data_dir error: {e}")),
    };
    let storage = Storage::new(root);
    if let Err(error) = storage.ensure_dirs() {
        return err(&format!("storage error: {error}"));
    }
    let mut settings = load_settings_impl(ctx);
    settings.location = location;
    if let Err(error) = storage.save_settings(&settings) {
        return err(&format!("storage error: {error}"));
    }
    ok(settings)
}

pub fn add_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    text: &str,
) -> CommandResult<Task> {
    let added = state.add_task(text);
    emit_if_changed(ctx, state, added)
}

pub fn complete_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    reference: &str,
) -> CommandResult<Task> {
    let moved = state
        .resolve(Collection::Active, reference)
        .and_then(|id| state.toggle_active_task(&id));
    emit_if_changed(ctx, state, moved)
}

pub fn reopen_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    reference: &str,
) -> CommandResult<Task> {
    let moved = state
        .resolve(Collection::Completed, reference)
        .and_then(|id| state.toggle_completed_task(&id));
    emit_if_changed(ctx, state, moved)
}

pub fn delete_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    reference: &str,
) -> CommandResult<Task> {
    let moved = state
        .resolve(Collection::Active, reference)
        .and_then(|id| state.delete_task(&id));
    emit_if_changed(ctx, state, moved)
}

pub fn archive_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    reference: &str,
) -> CommandResult<Task> {
    let moved = state
        .resolve(Collection::Active, reference)
        .and_then(|id| state.archive_task(&id));
    emit_if_changed(ctx, state, moved)
}

pub fn edit_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    reference: &str,
    text: &str,
) -> CommandResult<Task> {
    let edited = state
        .resolve(Collection::Active, reference)
        .and_then(|id| state.edit_task(&id, text));
    emit_if_changed(ctx, state, edited)
}

pub fn restore_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    from: OpenSection,
    reference: &str,
) -> CommandResult<Task> {
    let restored = match from {
        OpenSection::Archived => state
            .resolve(Collection::Archived, reference)
            .and_then(|id| state.restore_from_archive(&id)),
        OpenSection::Deleted => state
            .resolve(Collection::Deleted, reference)
            .and_then(|id| state.restore_from_deleted(&id)),
        OpenSection::Completed => {
            return err("completed tasks are reopened, not restored");
        }
    };
    emit_if_changed(ctx, state, restored)
}

pub fn purge_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    reference: &str,
) -> CommandResult<Task> {
    let removed = state
        .resolve(Collection::Deleted, reference)
        .and_then(|id| state.permanently_delete(&id));
    emit_if_changed(ctx, state, removed)
}

pub fn toggle_section_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    section: Option<OpenSection>,
) -> CommandResult<Option<OpenSection>> {
    let open = state.set_open_section(section);
    ctx.emit_state_updated(state.snapshot());
    ok(open)
}

pub fn reorder_task_impl<S: KeyValueStore>(
    ctx: &impl CommandCtx,
    state: &mut AppState<S>,
    source: usize,
    target: usize,
) -> CommandResult<bool> {
    match state.reorder_active(source, target) {
        Ok(true) => {
            ctx.emit_state_updated(state.snapshot());
            ok(true)
        }
        Ok(false) => ok(false),
        Err(error) => err(&error.to_string()),
    }
}
