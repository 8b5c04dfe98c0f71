//! Session state: the ephemeral, uncommitted draft for the active question.
//!
//! One instance per conversation, driven from a single logical context.
//! Nothing here is persisted or shared; the flow coordinator owns the
//! instance and the conversation driver mutates the UI flags.

/// Accumulates partial input into one committable answer and tracks the
/// UI-adjacent phase flags for the question currently being asked.
#[derive(Debug, Default)]
pub struct SessionState {
    active_question_id: Option<String>,
    draft_text: String,
    is_new_session: bool,
    is_editing: bool,
    is_saving: bool,
}

impl SessionState {
    /// Create an idle session with no active question
    pub fn new() -> Self {
        Self::default()
    }

    /// The question currently being answered, if any
    pub fn active_question_id(&self) -> Option<&str> {
        self.active_question_id.as_deref()
    }

    /// Accumulated uncommitted answer text. Never implicitly trimmed;
    /// trimming happens only at commit time.
    pub fn draft_text(&self) -> &str {
        &self.draft_text
    }

    /// True until the first transcript update after activation
    pub fn is_new_session(&self) -> bool {
        self.is_new_session
    }

    /// Whether the user is editing a previously given answer
    pub fn is_editing(&self) -> bool {
        self.is_editing
    }

    /// Whether a commit is in flight
    pub fn is_saving(&self) -> bool {
        self.is_saving
    }

    /// Make `question_id` the active question and start a fresh session
    /// for it.
    pub fn activate(&mut self, question_id: Option<String>) {
        self.active_question_id = question_id;
        self.start_new_session();
    }

    /// Mark the session new and clear the draft
    pub fn start_new_session(&mut self) {
        self.is_new_session = true;
        self.draft_text.clear();
    }

    /// Replace the draft with the latest transcript. The first update after
    /// a new session permanently flips the new-session flag.
    pub fn update_transcript(&mut self, text: impl Into<String>) {
        self.draft_text = text.into();
        self.is_new_session = false;
    }

    /// Clear the draft without touching the new-session flag
    pub fn clear_transcript(&mut self) {
        self.draft_text.clear();
    }

    /// Mark a commit as in flight
    pub fn begin_saving_answer(&mut self) {
        self.is_saving = true;
    }

    /// Mark the in-flight commit as finished, successfully or not
    pub fn end_saving_answer(&mut self) {
        self.is_saving = false;
    }

    /// Set the editing flag; owned by the conversation driver
    pub fn set_editing(&mut self, editing: bool) {
        self.is_editing = editing;
    }
}
