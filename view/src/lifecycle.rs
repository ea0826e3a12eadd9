//! Host activity lifecycle forwarding.

/// Identifies the host activity (or window) a view belongs to.
pub type OwnerId = u64;

/// Activity callbacks a host reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
    /// The activity was created.
    Created,
    /// The activity became visible.
    Started,
    /// The activity gained focus.
    Resumed,
    /// The activity lost focus.
    Paused,
    /// The activity is no longer visible.
    Stopped,
    /// The activity is gone.
    Destroyed,
}

/// State reached after a sequence of [`LifecycleEvent`]s.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LifecycleState {
    /// Terminal state.
    Destroyed,
    /// No event seen yet.
    #[default]
    Initialized,
    /// Created, or stopped again.
    Created,
    /// Visible, or paused again.
    Started,
    /// In the foreground.
    Resumed,
}

impl LifecycleState {
    /// State after `event`.
    #[must_use]
    pub const fn after(self, event: LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::Created | LifecycleEvent::Stopped => Self::Created,
            LifecycleEvent::Started | LifecycleEvent::Paused => Self::Started,
            LifecycleEvent::Resumed => Self::Resumed,
            LifecycleEvent::Destroyed => Self::Destroyed,
        }
    }
}

/// Filters host-wide activity callbacks down to one owner.
///
/// Events for other owners are ignored; after the owner is destroyed nothing
/// more is forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleProxy {
    owner: OwnerId,
    state: LifecycleState,
}

impl LifecycleProxy {
    /// Bind to `owner`.
    #[must_use]
    pub const fn new(owner: OwnerId) -> Self {
        Self {
            owner,
            state: LifecycleState::Initialized,
        }
    }

    /// The bound owner.
    #[must_use]
    pub const fn owner(&self) -> OwnerId {
        self.owner
    }

    /// Current state.
    #[must_use]
    pub const fn state(&self) -> LifecycleState {
        self.state
    }

    /// Whether the owner has been destroyed.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.state == LifecycleState::Destroyed
    }

    /// Accept a host callback, returning it if it should be forwarded.
    pub fn accept(&mut self, owner: OwnerId, event: LifecycleEvent) -> Option<LifecycleEvent> {
        if owner != self.owner || self.is_finished() {
            return None;
        }
        self.state = self.state.after(event);
        Some(event)
    }
}
