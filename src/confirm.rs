//! Single-slot confirmation for destructive actions.

/// A pending confirmation: the message shown to the user and the action to run
/// if they accept.
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmationRequest<A> {
    pub message: String,
    pub action: A,
}

/// Single-slot modal confirmation. A new request replaces whatever is open.
#[derive(Debug, Clone)]
pub struct ConfirmationGate<A> {
    slot: Option<ConfirmationRequest<A>>,
}

impl<A> Default for ConfirmationGate<A> {
    fn default() -> Self {
        Self { slot: None }
    }
}

impl<A> ConfirmationGate<A> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the gate, returning the request it displaced, if any.
    pub fn request(
        &mut self,
        message: impl Into<String>,
        action: A,
    ) -> Option<ConfirmationRequest<A>> {
        self.slot.replace(ConfirmationRequest {
            message: message.into(),
            action,
        })
    }

    pub fn is_open(&self) -> bool {
        self.slot.is_some()
    }

    pub fn current(&self) -> Option<&ConfirmationRequest<A>> {
        self.slot.as_ref()
    }

    /// Close the gate and hand back the action the caller must now run.
    pub fn confirm(&mut self) -> Option<A> {
        self.slot.take().map(|request| request.action)
    }

    /// Close the gate without running anything.
    pub fn cancel(&mut self) -> bool {
        self.slot.take().is_some()
    }
}
