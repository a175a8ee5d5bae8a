//! Per-user dialog state: one registry shared by both roles, plus the
//! generic step advancer both engines run on.

pub mod admin;
pub mod candidate;

use dashmap::DashMap;

use crate::domain::{ChatId, UserId};

pub use admin::{AdminDialog, AdminEngine};
pub use candidate::{CandidateDialog, CandidateEngine};

/// Transient per-user dialog record. Never persisted; a process restart
/// loses all in-flight dialogs and users restart from the flow entry point.
#[derive(Clone, Debug)]
pub enum DialogState {
    Candidate(CandidateDialog),
    Admin(AdminDialog),
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DialogKind {
    Candidate,
    Admin,
}

/// Keyed store for dialog state. At most one state per user id; the role is
/// fixed at flow start for the dialog's lifetime. Entries for different users
/// never contend.
///
/// The engines `take` the state, process the input, and `begin` it again
/// unless the flow finished, so terminal persistence and state removal form
/// a single logical step.
#[derive(Default)]
pub struct DialogRegistry {
    inner: DashMap<UserId, DialogState>,
}

impl DialogRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Atomic insert; overwrites any prior state for the user.
    pub fn begin(&self, user: UserId, state: DialogState) {
        self.inner.insert(user, state);
    }

    /// Atomic remove-and-return.
    pub fn take(&self, user: UserId) -> Option<DialogState> {
        self.inner.remove(&user).map(|(_, state)| state)
    }

    pub fn kind(&self, user: UserId) -> Option<DialogKind> {
        self.inner.get(&user).map(|entry| match entry.value() {
            DialogState::Candidate(_) => DialogKind::Candidate,
            DialogState::Admin(_) => DialogKind::Admin,
        })
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Free-form continuation input as the router hands it to an engine. The
/// attachment is still transport-held; the engine downloads it only when the
/// current step accepts files.
#[derive(Clone, Debug)]
pub struct FreeInput {
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub username: Option<String>,
    pub text: Option<String>,
    pub attachment: Option<IncomingFile>,
}

#[derive(Clone, Debug)]
pub struct IncomingFile {
    pub file_id: String,
    pub file_name: Option<String>,
    pub kind: FileKind,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FileKind {
    Photo,
    Document,
}

/// Step input after any attachment has been materialized to a local path.
#[derive(Clone, Debug, Default)]
pub struct StepInput {
    pub text: Option<String>,
    pub file: Option<String>,
}

impl StepInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            file: None,
        }
    }

    pub fn file(path: impl Into<String>) -> Self {
        Self {
            text: None,
            file: Some(path.into()),
        }
    }
}

/// Download the input's attachment into the upload dir when the current step
/// accepts files; otherwise pass the text through untouched.
pub(crate) async fn materialize(
    messenger: &dyn crate::messaging::port::MessagingPort,
    upload_dir: &std::path::Path,
    prefix: &str,
    input: &FreeInput,
    accepts_file: bool,
) -> crate::Result<StepInput> {
    let text = input.text.clone();

    let file = match (&input.attachment, accepts_file) {
        (Some(attachment), true) => {
            let name = crate::utils::upload_file_name(
                prefix,
                input.user_id,
                attachment.file_name.as_deref(),
                attachment.kind,
            );
            let dest = upload_dir.join(name);
            messenger.download_file(&attachment.file_id, &dest).await?;
            Some(dest.to_string_lossy().to_string())
        }
        _ => None,
    };

    Ok(StepInput { text, file })
}

/// One step of a flow definition: prompt, re-prompt, and a field setter that
/// rejects by returning false (state unchanged, input can be retried).
pub struct StepDef<F> {
    pub prompt: &'static str,
    pub invalid: &'static str,
    pub accepts_file: bool,
    pub apply: fn(&mut F, &StepInput) -> bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Progress {
    /// Step accepted; reply with the next step's prompt.
    Next(&'static str),
    /// Validation failed; reply and stay on the current step.
    Rejected(&'static str),
    /// Last step accepted; the engine persists and drops the dialog.
    Done,
}

/// Shared advance/validate skeleton for both engines. Each successful call is
/// a strict state advance; each rejection leaves `step` untouched.
pub fn advance<F>(
    flow: &[StepDef<F>],
    step: &mut usize,
    fields: &mut F,
    input: &StepInput,
) -> Progress {
    let def = &flow[*step];
    if !(def.apply)(fields, input) {
        return Progress::Rejected(def.invalid);
    }

    *step += 1;
    match flow.get(*step) {
        Some(next) => Progress::Next(next.prompt),
        None => Progress::Done,
    }
}
