#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DragGesture {
    pub source: usize,
    pub target: Option<usize>,
}

impl DragGesture {
    pub fn new(source: usize) -> Self {
        Self {
            source,
            target: None,
        }
    }

    pub fn enter(&mut self, index: usize) -> bool {
        if self.target == Some(index) {
            return false;
        }
        self.target = Some(index);
        true
    }

    pub fn planned_move(&self) -> Option<(usize, usize)> {
        match self.target {
            Some(target) if target != self.source => Some((self.source, target)),
            _ => None,
        }
    }

    pub fn feedback(&self, index: usize) -> RowFeedback {
        let shift = match self.target {
            Some(target) if index > self.source && index <= target => Some(Shift::Up),
            Some(target) if index < self.source && index >= target => Some(Shift::Down),
            _ => None,
        };
        RowFeedback {
            dragging: index == self.source,
            drop_marker: self.target == Some(index) && index != self.source,
            shift,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shift {
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RowFeedback {
    pub dragging: bool,
    pub drop_marker: bool,
    pub shift: Option<Shift>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DragError {
    GestureInProgress { source: usize },
    OutOfBounds { source: usize, target: usize, len: usize },
}

impl std::fmt::Display for DragError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DragError::GestureInProgress { source } => {
                write!(f, "a drag from position {source} is still in progress")
            }
            DragError::OutOfBounds {
                source,
                target,
                len,
            } => write!(
                f,
                "cannot move position {source} to {target} in a list of {len}"
            ),
        }
    }
}

impl std::error::Error for DragError {}

/// Delete-then-insert: the item at `source` is removed first and `target`
/// indexes the shortened list. `[A,B,C,D]` with `(0, 2)` gives
/// `[B,C,A,D]`; `(2, 0)` gives `[C,A,B,D]`.
pub fn move_item<T>(items: &mut Vec<T>, source: usize, target: usize) -> Result<(), DragError> {
    let len = items.len();
    if source >= len || target >= len {
        return Err(DragError::OutOfBounds {
            source,
            target,
            len,
        });
    }
    let item = items.remove(source);
    items.insert(target, item);
    Ok(())
}
