//! Definer/invoker security context.
//!
//! Execution carries an explicit stack of frames. Every privilege check reads
//! the principal of the top frame:
//!
//! - the bottom frame is the session user
//! - a view or trigger pushes its definer (the owner of its schema)
//! - a routine pushes the session user, however deeply it is nested
//!
//! Each frame also carries the role whose privileges the principal may use.
//! The session frame holds the session's current role and routine frames
//! inherit it. A definer frame only holds the role its view or trigger was
//! compiled under.

use sqlauthz_catalog::ObjectId;

/// Why a frame was pushed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    Session,
    View(ObjectId),
    Trigger(ObjectId),
    Routine(ObjectId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub kind: FrameKind,
    pub principal: String,
    pub role: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SecurityContext {
    frames: Vec<Frame>,
}

impl SecurityContext {
    pub fn new(session_user: &str) -> Self {
        SecurityContext {
            frames: vec![Frame { kind: FrameKind::Session, principal: session_user.to_string(), role: None }],
        }
    }

    /// Set the session frame's current role.
    pub fn with_role(mut self, role: Option<&str>) -> Self {
        if let Some(session) = self.frames.first_mut() {
            session.role = role.map(str::to_string);
        }
        self
    }

    /// Principal whose privileges apply right now.
    pub fn current_principal(&self) -> &str {
        self.frames.last().map(|f| f.principal.as_str()).unwrap_or_default()
    }

    /// Role available to the current principal right now.
    pub fn current_role(&self) -> Option<&str> {
        self.frames.last().and_then(|f| f.role.as_deref())
    }

    pub fn session_user(&self) -> &str {
        self.frames.first().map(|f| f.principal.as_str()).unwrap_or_default()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of trigger frames on the stack.
    pub fn trigger_depth(&self) -> usize {
        self.frames.iter().filter(|f| matches!(f.kind, FrameKind::Trigger(_))).count()
    }

    /// Run `f` with a definer-rights frame for a view or trigger.
    pub fn as_definer<T>(&mut self, kind: FrameKind, definer: &str, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push_definer(kind, definer, None);
        let output = f(self);
        self.pop();
        output
    }

    /// Run `f` with an invoker-rights frame for a routine body.
    pub fn as_invoker<T>(&mut self, routine: ObjectId, f: impl FnOnce(&mut Self) -> T) -> T {
        self.push_invoker(routine);
        let output = f(self);
        self.pop();
        output
    }

    pub(crate) fn push_definer(&mut self, kind: FrameKind, definer: &str, role: Option<&str>) {
        self.frames.push(Frame { kind, principal: definer.to_string(), role: role.map(str::to_string) });
    }

    pub(crate) fn push_invoker(&mut self, routine: ObjectId) {
        let role = self.frames.first().and_then(|f| f.role.clone());
        let principal = self.session_user().to_string();
        self.frames.push(Frame { kind: FrameKind::Routine(routine), principal, role });
    }

    /// Pop the top frame. The session frame is never popped.
    pub(crate) fn pop(&mut self) {
        if self.frames.len() > 1 {
            self.frames.pop();
        }
    }
}
