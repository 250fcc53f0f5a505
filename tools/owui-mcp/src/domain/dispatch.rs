use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchState {
    Received,
    Resolved,
    Validated,
    Invoked,
    Completed,
    Failed,
}

/// One protocol request moving through the gateway. Transitions are strictly
/// ordered; `fail` is reachable from every state except `Completed`.
#[derive(Debug, Clone)]
pub struct DispatchRun {
    pub id: Uuid,
    pub state: DispatchState,
}

impl DispatchRun {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            state: DispatchState::Received,
        }
    }

    pub fn resolve(&mut self) {
        assert!(matches!(self.state, DispatchState::Received));
        self.state = DispatchState::Resolved;
    }

    pub fn validate(&mut self) {
        assert!(matches!(self.state, DispatchState::Resolved));
        self.state = DispatchState::Validated;
    }

    pub fn invoke(&mut self) {
        assert!(matches!(self.state, DispatchState::Validated));
        self.state = DispatchState::Invoked;
    }

    pub fn complete(&mut self) {
        assert!(matches!(self.state, DispatchState::Invoked));
        self.state = DispatchState::Completed;
    }

    pub fn fail(&mut self) {
        assert!(!matches!(self.state, DispatchState::Completed));
        self.state = DispatchState::Failed;
    }
}

impl DispatchState {
    pub fn as_str(&self) -> &'static str {
        match self {
            DispatchState::Received => "received",
            DispatchState::Resolved => "resolved",
            DispatchState::Validated => "validated",
            DispatchState::Invoked => "invoked",
            DispatchState::Completed => "completed",
            DispatchState::Failed => "failed",
        }
    }
}
