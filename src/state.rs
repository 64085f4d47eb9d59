use crate::events::StatePayload;
use crate::models::{Collection, OpenSection, Task};
use crate::persist::{PersistentStore, OPEN_SECTION_KEY};
use crate::reorder::{move_item, DragError, DragGesture};
use crate::storage::KeyValueStore;

enum Placement {
    Front,
    Back,
}

/// Every mutation writes the collections it touched before returning.
/// [`AppState::hydrate`] is the only constructor, so nothing is saved before
/// everything has been loaded.
pub struct AppState<S: KeyValueStore> {
    store: PersistentStore<S>,
    tasks: Vec<Task>,
    completed_tasks: Vec<Task>,
    archived_tasks: Vec<Task>,
    deleted_tasks: Vec<Task>,
    open_section: Option<OpenSection>,
    gesture: Option<DragGesture>,
}

impl<S: KeyValueStore> AppState<S> {
    pub fn hydrate(backend: S) -> Self {
        let store = PersistentStore::new(backend);
        let tasks = store.load(Collection::Active.storage_key(), Vec::new());
        let completed_tasks = store.load(Collection::Completed.storage_key(), Vec::new());
        let archived_tasks = store.load(Collection::Archived.storage_key(), Vec::new());
        let deleted_tasks = store.load(Collection::Deleted.storage_key(), Vec::new());
        let open_section = store.load(OPEN_SECTION_KEY, None);
        let state = Self {
            store,
            tasks,
            completed_tasks,
            archived_tasks,
            deleted_tasks,
            open_section,
            gesture: None,
        };
        log::info!(
            "hydrated tasks={} completed={} archived={} deleted={} open_section={:?}",
            state.tasks.len(),
            state.completed_tasks.len(),
            state.archived_tasks.len(),
            state.deleted_tasks.len(),
            state.open_section
        );
        state
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn completed_tasks(&self) -> &[Task] {
        &self.completed_tasks
    }

    pub fn archived_tasks(&self) -> &[Task] {
        &self.archived_tasks
    }

    pub fn deleted_tasks(&self) -> &[Task] {
        &self.deleted_tasks
    }

    pub fn collection(&self, collection: Collection) -> &[Task] {
        match collection {
            Collection::Active => &self.tasks,
            Collection::Completed => &self.completed_tasks,
            Collection::Archived => &self.archived_tasks,
            Collection::Deleted => &self.deleted_tasks,
        }
    }

    pub fn open_section(&self) -> Option<OpenSection> {
        self.open_section
    }

    pub fn gesture(&self) -> Option<&DragGesture> {
        self.gesture.as_ref()
    }

    pub fn snapshot(&self) -> StatePayload {
        StatePayload {
            tasks: self.tasks.clone(),
            completed_tasks: self.completed_tasks.clone(),
            archived_tasks: self.archived_tasks.clone(),
            deleted_tasks: self.deleted_tasks.clone(),
            open_section: self.open_section,
        }
    }

    pub fn resolve(&self, collection: Collection, reference: &str) -> Option<String> {
        let items = self.collection(collection);
        let reference = reference.trim();
        if let Ok(position) = reference.parse::<usize>() {
            if position >= 1 && position <= items.len() {
                return Some(items[position - 1].id.clone());
            }
        }
        items
            .iter()
            .find(|task| task.id == reference)
            .map(|task| task.id.clone())
    }

    pub fn add_task(&mut self, text: &str) -> Option<Task> {
        let task = Task::create(text)?;
        self.tasks.push(task.clone());
        self.persist(&[Collection::Active]);
        log::debug!("added task id={}", task.id);
        Some(task)
    }

    pub fn toggle_active_task(&mut self, id: &str) -> Option<Task> {
        self.transfer(
            id,
            Collection::Active,
            Collection::Completed,
            Placement::Front,
            Some(true),
        )
    }

    pub fn toggle_completed_task(&mut self, id: &str) -> Option<Task> {
        self.transfer(
            id,
            Collection::Completed,
            Collection::Active,
            Placement::Back,
            Some(false),
        )
    }

    pub fn delete_task(&mut self, id: &str) -> Option<Task> {
        self.transfer(
            id,
            Collection::Active,
            Collection::Deleted,
            Placement::Front,
            None,
        )
    }

    pub fn archive_task(&mut self, id: &str) -> Option<Task> {
        self.transfer(
            id,
            Collection::Active,
            Collection::Archived,
            Placement::Front,
            None,
        )
    }

    pub fn restore_from_archive(&mut self, id: &str) -> Option<Task> {
        self.transfer(
            id,
            Collection::Archived,
            Collection::Active,
            Placement::Back,
            Some(false),
        )
    }

    pub fn restore_from_deleted(&mut self, id: &str) -> Option<Task> {
        self.transfer(
            id,
            Collection::Deleted,
            Collection::Active,
            Placement::Back,
            Some(false),
        )
    }

    pub fn edit_task(&mut self, id: &str, new_text: &str) -> Option<Task> {
        let new_text = new_text.trim();
        if new_text.is_empty() {
            return None;
        }
        let task = self.tasks.iter_mut().find(|task| task.id == id)?;
        if task.text == new_text {
            return None;
        }
        task.text = new_text.to_string();
        let edited = task.clone();
        self.persist(&[Collection::Active]);
        Some(edited)
    }

    pub fn permanently_delete(&mut self, id: &str) -> Option<Task> {
        let task = take(&mut self.deleted_tasks, id)?;
        self.persist(&[Collection::Deleted]);
        log::info!("permanently deleted task id={id}");
        Some(task)
    }

    pub fn set_open_section(&mut self, section: Option<OpenSection>) -> Option<OpenSection> {
        self.open_section = if self.open_section == section {
            None
        } else {
            section
        };
        let open_section = self.open_section;
        self.store.save(OPEN_SECTION_KEY, &open_section);
        open_section
    }

    pub fn begin_drag(&mut self, source: usize) -> Result<(), DragError> {
        if let Some(gesture) = &self.gesture {
            return Err(DragError::GestureInProgress {
                source: gesture.source,
            });
        }
        if source >= self.tasks.len() {
            return Err(DragError::OutOfBounds {
                source,
                target: source,
                len: self.tasks.len(),
            });
        }
        self.gesture = Some(DragGesture::new(source));
        Ok(())
    }

    pub fn drag_enter(&mut self, index: usize) -> bool {
        match self.gesture.as_mut() {
            Some(gesture) => gesture.enter(index),
            None => false,
        }
    }

    pub fn cancel_drag(&mut self) -> bool {
        self.gesture.take().is_some()
    }

    pub fn end_drag(&mut self) -> Result<bool, DragError> {
        let Some(gesture) = self.gesture.take() else {
            return Ok(false);
        };
        let Some((source, target)) = gesture.planned_move() else {
            return Ok(false);
        };
        if let Err(error) = move_item(&mut self.tasks, source, target) {
            log::error!("rejected reorder: {error}");
            return Err(error);
        }
        self.persist(&[Collection::Active]);
        Ok(true)
    }

    pub fn reorder_active(&mut self, source: usize, target: usize) -> Result<bool, DragError> {
        let len = self.tasks.len();
        if self.gesture.is_none() && (source >= len || target >= len) {
            let error = DragError::OutOfBounds {
                source,
                target,
                len,
            };
            log::error!("rejected reorder: {error}");
            return Err(error);
        }
        self.begin_drag(source)?;
        self.drag_enter(target);
        self.end_drag()
    }

    fn transfer(
        &mut self,
        id: &str,
        from: Collection,
        to: Collection,
        placement: Placement,
        completed: Option<bool>,
    ) -> Option<Task> {
        let mut task = take(self.collection_mut(from), id)?;
        if let Some(completed) = completed {
            task.completed = completed;
        }
        let destination = self.collection_mut(to);
        match placement {
            Placement::Front => destination.insert(0, task.clone()),
            Placement::Back => destination.push(task.clone()),
        }
        self.persist(&[from, to]);
        log::debug!("moved task id={id} from={from:?} to={to:?}");
        Some(task)
    }

    fn collection_mut(&mut self, collection: Collection) -> &mut Vec<Task> {
        match collection {
            Collection::Active => &mut self.tasks,
            Collection::Completed => &mut self.completed_tasks,
            Collection::Archived => &mut self.archived_tasks,
            Collection::Deleted => &mut self.deleted_tasks,
        }
    }

    fn persist(&mut self, collections: &[Collection]) {
        for collection in collections {
            let items = match collection {
                Collection::Active => &self.tasks,
                Collection::Completed => &self.completed_tasks,
                Collection::Archived => &self.archived_tasks,
                Collection::Deleted => &self.deleted_tasks,
            };
            self.store.save(collection.storage_key(), items);
        }
    }
}

fn take(items: &mut Vec<Task>, id: &str) -> Option<Task> {
    let index = items.iter().position(|task| task.id == id)?;
    Some(items.remove(index))
}
