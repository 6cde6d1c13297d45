//! view::gesture
//!
//! Click and long-press-drag selection.
//!
//! # State Machine
//!
//! ```text
//! Idle --pointer_down--> PressArmed --timer--> Dragging --pointer_up--> Idle
//!                            |
//!                            +--pointer_up--> Idle (click, if on the pressed cell)
//!                            +--pointer_leave--> Idle
//! ```
//!
//! Arming starts a [`LongPressTimer`]; every way out of `PressArmed` other
//! than the timer firing cancels it. Each arm gets a fresh token and a
//! firing token that no longer matches the armed press is ignored.

use std::collections::HashMap;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::debug;

use super::selection::{apply_range, SelectionMap, ShelfGrid};
use super::Cell;

/// Delay before a held press turns into a drag.
pub const DEFAULT_LONG_PRESS: Duration = Duration::from_millis(300);

/// Identifies one armed press.
pub type PressToken = u64;

/// Schedules long-press notifications.
pub trait LongPressTimer {
    /// Deliver `token` after `delay` unless cancelled first.
    fn arm(&mut self, token: PressToken, delay: Duration);

    /// Stop a pending delivery. Unknown tokens are ignored.
    fn cancel(&mut self, token: PressToken);
}

/// Timer backed by tokio tasks; tokens arrive on the paired receiver.
///
/// Must be used from within a tokio runtime.
#[derive(Debug)]
pub struct TokioTimer {
    sender: mpsc::UnboundedSender<PressToken>,
    pending: HashMap<PressToken, JoinHandle<()>>,
}

impl TokioTimer {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<PressToken>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (
            Self {
                sender,
                pending: HashMap::new(),
            },
            receiver,
        )
    }
}

impl LongPressTimer for TokioTimer {
    fn arm(&mut self, token: PressToken, delay: Duration) {
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            let _ = sender.send(token);
        });
        self.pending.retain(|_, h| !h.is_finished());
        self.pending.insert(token, handle);
    }

    fn cancel(&mut self, token: PressToken) {
        if let Some(handle) = self.pending.remove(&token) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        for (_, handle) in self.pending.drain() {
            handle.abort();
        }
    }
}

/// Where the gesture is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureState {
    Idle,
    PressArmed { cell: Cell, token: PressToken },
    Dragging { anchor: Cell, target: Cell },
}

/// Drives a [`SelectionMap`] from pointer events on one shelf.
#[derive(Debug)]
pub struct SelectionController<T: LongPressTimer> {
    timer: T,
    delay: Duration,
    state: GestureState,
    next_token: PressToken,
    selection: SelectionMap,
    before: SelectionMap,
    multi_select: bool,
}

impl<T: LongPressTimer> SelectionController<T> {
    pub fn new(timer: T, delay: Duration) -> Self {
        Self {
            timer,
            delay,
            state: GestureState::Idle,
            next_token: 0,
            selection: SelectionMap::new(),
            before: SelectionMap::new(),
            multi_select: false,
        }
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    pub fn selection(&self) -> &SelectionMap {
        &self.selection
    }

    /// Whether clicks toggle independently instead of replacing.
    pub fn multi_select(&self) -> bool {
        self.multi_select
    }

    pub fn set_multi_select(&mut self, multi_select: bool) {
        self.multi_select = multi_select;
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Deselect everything and leave multi-select.
    pub fn clear(&mut self) {
        self.disarm();
        self.state = GestureState::Idle;
        self.selection.clear();
        self.multi_select = false;
    }

    fn disarm(&mut self) {
        if let GestureState::PressArmed { token, .. } = self.state {
            self.timer.cancel(token);
        }
    }

    /// Pointer pressed over `cell`: arm the long-press timer.
    pub fn pointer_down(&mut self, cell: Cell) {
        self.disarm();
        let token = self.next_token;
        self.next_token += 1;
        self.timer.arm(token, self.delay);
        self.state = GestureState::PressArmed { cell, token };
    }

    /// The timer for `token` fired. Returns true if a drag started.
    pub fn timer_elapsed(&mut self, token: PressToken, grid: &ShelfGrid) -> bool {
        let GestureState::PressArmed { cell, token: armed } = self.state else {
            return false;
        };
        if armed != token {
            debug!(token, armed, "ignoring stale long-press");
            return false;
        }

        self.before = self.selection.clone();
        self.multi_select = true;
        self.state = GestureState::Dragging {
            anchor: cell,
            target: cell,
        };
        apply_range(&mut self.selection, &self.before, grid, cell, cell);
        true
    }

    /// Pointer moved onto `cell`; extends an active drag.
    pub fn pointer_enter(&mut self, cell: Cell, grid: &ShelfGrid) {
        if let GestureState::Dragging { anchor, .. } = self.state {
            self.state = GestureState::Dragging {
                anchor,
                target: cell,
            };
            apply_range(&mut self.selection, &self.before, grid, anchor, cell);
        }
    }

    /// Pointer left the pressed cell before the timer fired.
    pub fn pointer_leave(&mut self) {
        if let GestureState::PressArmed { .. } = self.state {
            self.disarm();
            self.state = GestureState::Idle;
        }
    }

    /// Pointer released over `cell`.
    ///
    /// Ends a drag, or clicks when released over the pressed cell. A
    /// release anywhere else, or with no press, selects nothing.
    pub fn pointer_up(&mut self, cell: Cell) {
        match self.state {
            GestureState::Dragging { .. } => {
                self.state = GestureState::Idle;
                if self.selection.selected_count() == 1 {
                    self.multi_select = false;
                }
            }
            GestureState::PressArmed { cell: pressed, .. } => {
                self.disarm();
                self.state = GestureState::Idle;
                if pressed == cell {
                    self.click(cell);
                }
            }
            GestureState::Idle => {}
        }
    }

    /// Toggle `cell`.
    ///
    /// Outside multi-select, selecting a cell first deselects every other
    /// cell. In multi-select, dropping to a single selected cell leaves
    /// multi-select.
    pub fn click(&mut self, cell: Cell) {
        let selecting = !self.selection.get(&cell);
        if !self.multi_select && selecting {
            self.selection.clear();
        }
        self.selection.set(cell, selecting);
        if self.multi_select && self.selection.selected_count() == 1 {
            self.multi_select = false;
        }
    }
}
