//! The pure state-transition function.
//!
//! `decide` maps (current session, inbound event) to exactly one [`Step`], an
//! explicit tagged action the engine then executes. No I/O happens here; the
//! engine performs the side effects a step calls for and commits the
//! resulting session mutation, so transition logic stays exhaustively
//! unit-testable and a transport failure can never leave the session state
//! inconsistent.
//!
//! Per-state precedence is fixed: explicit named commands are matched first,
//! then the state's fallback. Unknown text inside a conversion menu re-prompts
//! rather than aborting (users can retry without re-uploading); unknown text
//! in `Initial` leniently answers with the generic menu; unknown text in
//! `FileNamed` is a hard reset. That asymmetry is by design.

use crate::domain::media::{ConversionTarget, MediaKind};
use crate::domain::session::{PendingMedia, Session, SessionState};

use super::event::InboundMessage;
use super::menu::MenuId;

/// The single action an inbound event resolves to.
///
/// Steps carry everything the engine needs to execute the effect; the engine
/// decides success/failure messaging and the final session mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// Answer free-form `Initial` text: optional assistant reply + generic menu.
    ShowGenericMenu { query: Option<String> },
    /// Enter the retrieve flow: list stored files, prompt for a name.
    EnterRetrieve,
    /// Enter the manage flow: prompt for a file, wait in `Idle`.
    EnterManage,
    /// `Idle` without media: ask for a file again.
    PromptSendFile,
    /// Media arrived with a caption: hold it named, offer file actions.
    HoldNamedMedia { name: String, media: PendingMedia },
    /// Media arrived without a caption: hold it and ask for a name.
    HoldUnnamedMedia { media: PendingMedia },
    /// `AwaitingFileName` without text: re-prompt.
    PromptForName,
    /// Retrieve flow answer: resolve the stored file and send it.
    DeliverStored { name: String },
    /// Upload flow answer: name the pending file, offer file actions.
    NamePending { name: String },
    /// Forward the pending media descriptor to the ingestion collaborator.
    ForwardToIngestion,
    /// Download the pending media and open the matching conversion menu.
    BeginConversion { kind: MediaKind },
    /// Unsupported pending media type for conversion.
    RejectConversion,
    /// Download the pending PDF and enter the Q&A loop.
    BeginAi,
    /// `ai` requested for non-PDF media.
    RejectAi,
    /// A valid conversion option was picked: convert, upload, deliver.
    RunConversion { target: ConversionTarget },
    /// Unrecognized option inside a menu state: re-prompt, stay put.
    RetryMenu { menu: MenuId },
    /// Leave the Q&A loop.
    ExitAi,
    /// Non-text input in the Q&A loop: restate the prompt, stay put.
    PromptAi,
    /// Answer a question about the staged document.
    AnswerQuestion { question: String },
    /// Unexpected input terminating a flow: notify and reset.
    UnexpectedReset,
}

/// Computes the single step for an inbound event.
///
/// Exactly one step (possibly a no-op-ish re-prompt) is returned per event;
/// no queuing or batching happens at this level.
pub fn decide(session: &Session, msg: &InboundMessage) -> Step {
    match session.state {
        SessionState::Initial => decide_initial(msg),
        SessionState::Idle => decide_idle(msg),
        SessionState::AwaitingFileName => decide_awaiting_name(session, msg),
        SessionState::FileNamed => decide_file_named(session, msg),
        SessionState::PdfConversionMenu => decide_menu(MediaKind::Pdf, msg),
        SessionState::DocxConversionMenu => decide_menu(MediaKind::Docx, msg),
        SessionState::ImageConversionMenu => decide_menu(MediaKind::Image, msg),
        SessionState::AiMode => decide_ai(msg),
    }
}

fn decide_initial(msg: &InboundMessage) -> Step {
    match msg.command_token().as_deref() {
        Some("retrieve") => Step::EnterRetrieve,
        Some("manage") => Step::EnterManage,
        _ if msg.has_media() => decide_idle(msg),
        _ => Step::ShowGenericMenu {
            query: msg.body.clone(),
        },
    }
}

fn decide_idle(msg: &InboundMessage) -> Step {
    match (&msg.media, &msg.body) {
        (Some(media), Some(name)) => Step::HoldNamedMedia {
            name: name.clone(),
            media: media.clone(),
        },
        (Some(media), None) => Step::HoldUnnamedMedia {
            media: media.clone(),
        },
        (None, _) => Step::PromptSendFile,
    }
}

fn decide_awaiting_name(session: &Session, msg: &InboundMessage) -> Step {
    match &msg.body {
        Some(name) if session.retrieve_flow => Step::DeliverStored { name: name.clone() },
        Some(name) => Step::NamePending { name: name.clone() },
        None => Step::PromptForName,
    }
}

fn decide_file_named(session: &Session, msg: &InboundMessage) -> Step {
    // A fresh attachment replaces the held file; this also makes a
    // duplicated media delivery converge instead of tripping the reset.
    if msg.has_media() {
        return decide_idle(msg);
    }
    match msg.command_token().as_deref() {
        Some("upload") => Step::ForwardToIngestion,
        Some("retrieve") => Step::EnterRetrieve,
        Some("convert") => match session.pending_kind() {
            Some(kind) => Step::BeginConversion { kind },
            None => Step::RejectConversion,
        },
        Some("ai") => match session.pending_kind() {
            Some(MediaKind::Pdf) => Step::BeginAi,
            _ => Step::RejectAi,
        },
        _ => Step::UnexpectedReset,
    }
}

fn decide_menu(kind: MediaKind, msg: &InboundMessage) -> Step {
    match msg
        .command_token()
        .and_then(|token| ConversionTarget::parse(kind, &token))
    {
        Some(target) => Step::RunConversion { target },
        None => Step::RetryMenu {
            menu: MenuId::for_kind(kind),
        },
    }
}

fn decide_ai(msg: &InboundMessage) -> Step {
    match msg.command_token().as_deref() {
        Some("exit") => Step::ExitAi,
        Some(_) => Step::AnswerQuestion {
            question: msg.body.clone().unwrap_or_default(),
        },
        None => Step::PromptAi,
    }
}
