//! The conversation engine.
//!
//! Consumes one inbound event at a time, serializes processing per identity,
//! computes the pure state transition, then executes the resulting effects:
//! collaborator calls first (download, convert, upload, list/resolve, Q&A),
//! then outbound commands, each individually fault-isolated.
//!
//! Failure policy: file-pipeline failures (download/convert/upload/ingest)
//! notify the user and clear the session, because the staged state is no
//! longer trustworthy. Read-only failures (list/resolve/Q&A/assistant) notify
//! and leave the session in place so the user can retry. No automatic
//! retries.

use std::path::PathBuf;
use std::sync::Arc;

use tracing::{error, info, warn};

use crate::domain::conversation::{decide, replies, InboundMessage, MenuId, OutboundCommand, Step};
use crate::domain::foundation::Identity;
use crate::domain::media::{ConversionTarget, MediaKind};
use crate::domain::session::{Session, SessionState};
use crate::ports::{
    AssistantReplier, ChatTransport, DocumentQa, FileStore, FormatConverter, IngestionClient,
    MediaFetcher, SessionStore, UploadDescriptor,
};

/// Drives the per-user state machine and file-lifecycle orchestration.
pub struct ConversationEngine {
    sessions: Arc<dyn SessionStore>,
    transport: Arc<dyn ChatTransport>,
    files: Arc<dyn FileStore>,
    ingestion: Arc<dyn IngestionClient>,
    fetcher: Arc<dyn MediaFetcher>,
    converter: Arc<dyn FormatConverter>,
    qa: Arc<dyn DocumentQa>,
    assistant: Option<Arc<dyn AssistantReplier>>,
    staging_root: PathBuf,
}

impl ConversationEngine {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        transport: Arc<dyn ChatTransport>,
        files: Arc<dyn FileStore>,
        ingestion: Arc<dyn IngestionClient>,
        fetcher: Arc<dyn MediaFetcher>,
        converter: Arc<dyn FormatConverter>,
        qa: Arc<dyn DocumentQa>,
        staging_root: PathBuf,
    ) -> Self {
        Self {
            sessions,
            transport,
            files,
            ingestion,
            fetcher,
            converter,
            qa,
            assistant: None,
            staging_root,
        }
    }

    /// Enables the conversational fallback for free-form entry-state text.
    pub fn with_assistant(mut self, assistant: Arc<dyn AssistantReplier>) -> Self {
        self.assistant = Some(assistant);
        self
    }

    /// Processes one inbound event to completion.
    ///
    /// Holds the identity's session lock for the whole evaluation, so a
    /// duplicate webhook delivery cannot interleave its read-modify-write
    /// with this one. Every failure path ends with an explicit chat message;
    /// nothing propagates to the caller.
    pub async fn handle(&self, msg: InboundMessage) {
        let identity = msg.from.clone();
        let lock = self.sessions.entry_lock(&identity).await;
        let _guard = lock.lock().await;

        let session = self
            .sessions
            .get(&identity)
            .await
            .unwrap_or_else(|| Session::new(identity.clone()));

        let step = decide(&session, &msg);
        info!(identity = %identity, state = ?session.state, step = ?step_name(&step),
            "processing inbound event");

        self.execute(session, step).await;
    }

    async fn execute(&self, mut session: Session, step: Step) {
        let identity = session.identity.clone();

        match step {
            Step::ShowGenericMenu { query } => {
                let mut cmds = Vec::new();
                if let (Some(assistant), Some(q)) = (&self.assistant, &query) {
                    match assistant.reply(q).await {
                        Ok(reply) => cmds.push(OutboundCommand::text(reply)),
                        Err(e) => {
                            warn!(identity = %identity, error = %e, "assistant reply failed");
                            cmds.push(OutboundCommand::text(replies::ASSISTANT_FALLBACK));
                        }
                    }
                }
                cmds.push(OutboundCommand::SendMenu(MenuId::Generic));
                // No session mutation: absence of a session is Initial.
                self.send_all(&identity, &session, cmds).await;
            }

            Step::EnterRetrieve => match self.files.list(&identity).await {
                Ok(names) if names.is_empty() => {
                    self.clear(&session).await;
                    self.send_all(
                        &identity,
                        &session,
                        vec![
                            OutboundCommand::text(replies::NO_STORED_FILES),
                            OutboundCommand::SendMenu(MenuId::Generic),
                        ],
                    )
                    .await;
                }
                Ok(names) => {
                    session.retrieve_flow = true;
                    session.transition(SessionState::AwaitingFileName);
                    let listing = replies::stored_files_list(&names);
                    self.sessions.upsert(session.clone()).await;
                    self.send_all(&identity, &session, vec![OutboundCommand::text(listing)])
                        .await;
                }
                Err(e) => {
                    // Read-only step: retry-safe, session untouched.
                    warn!(identity = %identity, error = %e, "listing stored files failed");
                    self.send_all(
                        &identity,
                        &session,
                        vec![OutboundCommand::text(replies::LIST_FAILED)],
                    )
                    .await;
                }
            },

            Step::EnterManage => {
                session.transition(SessionState::Idle);
                self.sessions.upsert(session.clone()).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::text(replies::PROMPT_MANAGE)],
                )
                .await;
            }

            Step::PromptSendFile => {
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::text(replies::PROMPT_SEND_FILE)],
                )
                .await;
            }

            Step::HoldNamedMedia { name, media } => {
                session.pending_media = Some(media);
                session.file_name = Some(name);
                session.retrieve_flow = false;
                session.transition(SessionState::FileNamed);
                self.sessions.upsert(session.clone()).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::SendMenu(MenuId::FileActions)],
                )
                .await;
            }

            Step::HoldUnnamedMedia { media } => {
                session.pending_media = Some(media);
                session.retrieve_flow = false;
                session.transition(SessionState::AwaitingFileName);
                self.sessions.upsert(session.clone()).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::text(replies::PROMPT_FILE_NAME)],
                )
                .await;
            }

            Step::PromptForName => {
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::text(replies::PROMPT_FILE_NAME)],
                )
                .await;
            }

            Step::DeliverStored { name } => match self.files.resolve(&identity, &name).await {
                Ok(Some(url)) => {
                    self.clear(&session).await;
                    self.send_all(&identity, &session, vec![OutboundCommand::media(url, name)])
                        .await;
                }
                Ok(None) => {
                    self.clear(&session).await;
                    self.send_all(
                        &identity,
                        &session,
                        vec![
                            OutboundCommand::text(replies::FILE_NOT_FOUND),
                            OutboundCommand::SendMenu(MenuId::Retrieve),
                        ],
                    )
                    .await;
                }
                Err(e) => {
                    warn!(identity = %identity, error = %e, "resolving stored file failed");
                    self.send_all(
                        &identity,
                        &session,
                        vec![OutboundCommand::text(replies::RETRIEVE_FAILED)],
                    )
                    .await;
                }
            },

            Step::NamePending { name } => {
                session.file_name = Some(name);
                session.transition(SessionState::FileNamed);
                self.sessions.upsert(session.clone()).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::SendMenu(MenuId::FileActions)],
                )
                .await;
            }

            Step::ForwardToIngestion => {
                let (Some(media), Some(name)) =
                    (session.pending_media.clone(), session.file_name.clone())
                else {
                    self.unexpected_reset(&session).await;
                    return;
                };
                let descriptor = UploadDescriptor {
                    owner: identity.clone(),
                    file_name: name,
                    remote_url: media.remote_url,
                    content_type: media.content_type,
                };
                let outcome = self.ingestion.ingest(&descriptor).await;
                self.clear(&session).await;
                let reply = match outcome {
                    Ok(()) => replies::UPLOAD_OK,
                    Err(e) => {
                        error!(identity = %identity, error = %e, "ingestion failed");
                        replies::UPLOAD_FAILED
                    }
                };
                self.send_all(&identity, &session, vec![OutboundCommand::text(reply)])
                    .await;
            }

            Step::BeginConversion { kind } => {
                if !self.stage_pending_media(&mut session).await {
                    self.fail_pipeline(&session, replies::DOWNLOAD_FAILED).await;
                    return;
                }
                session.transition(menu_state(kind));
                self.sessions.upsert(session.clone()).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::SendMenu(MenuId::for_kind(kind))],
                )
                .await;
            }

            Step::RejectConversion => {
                self.clear(&session).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::text(replies::UNSUPPORTED_MEDIA)],
                )
                .await;
            }

            Step::BeginAi => {
                if !self.stage_pending_media(&mut session).await {
                    self.fail_pipeline(&session, replies::DOWNLOAD_FAILED).await;
                    return;
                }
                session.transition(SessionState::AiMode);
                self.sessions.upsert(session.clone()).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::text(replies::AI_READY)],
                )
                .await;
            }

            Step::RejectAi => {
                // Protocol violation, not a pipeline failure: re-prompt in place.
                self.send_all(
                    &identity,
                    &session,
                    vec![
                        OutboundCommand::text(replies::AI_PDF_ONLY),
                        OutboundCommand::SendMenu(MenuId::FileActions),
                    ],
                )
                .await;
            }

            Step::RunConversion { target } => {
                self.run_conversion(session, target).await;
            }

            Step::RetryMenu { menu } => {
                self.send_all(
                    &identity,
                    &session,
                    vec![
                        OutboundCommand::text(replies::MENU_RETRY),
                        OutboundCommand::SendMenu(menu),
                    ],
                )
                .await;
            }

            Step::ExitAi => {
                self.clear(&session).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![
                        OutboundCommand::text(replies::AI_EXIT),
                        OutboundCommand::SendMenu(MenuId::Generic),
                    ],
                )
                .await;
            }

            Step::PromptAi => {
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::text(replies::AI_READY)],
                )
                .await;
            }

            Step::AnswerQuestion { question } => {
                let Some(document) = session.local_path.clone() else {
                    self.unexpected_reset(&session).await;
                    return;
                };
                match self.qa.answer(&document, &question).await {
                    Ok(answer) => {
                        self.send_all(&identity, &session, vec![OutboundCommand::text(answer)])
                            .await;
                    }
                    Err(e) => {
                        warn!(identity = %identity, error = %e, "document Q&A failed");
                        self.send_all(
                            &identity,
                            &session,
                            vec![OutboundCommand::text(replies::AI_FAILED)],
                        )
                        .await;
                    }
                }
            }

            Step::UnexpectedReset => {
                self.unexpected_reset(&session).await;
            }
        }
    }

    /// Converts the staged file, uploads the result, and delivers the URL.
    ///
    /// Any failure clears the session; in particular a failed upload must not
    /// produce a media message with a broken URL.
    async fn run_conversion(&self, session: Session, target: ConversionTarget) {
        let identity = session.identity.clone();
        let Some(input) = session.local_path.clone() else {
            self.unexpected_reset(&session).await;
            return;
        };

        let converted = match self.converter.convert(&input, target).await {
            Ok(path) => path,
            Err(e) => {
                error!(identity = %identity, state = ?session.state, error = %e,
                    "conversion failed");
                self.fail_pipeline(&session, replies::CONVERSION_FAILED).await;
                return;
            }
        };

        match self.files.upload(&converted).await {
            Ok(url) => {
                self.clear(&session).await;
                self.send_all(
                    &identity,
                    &session,
                    vec![OutboundCommand::media(url, replies::CONVERSION_READY)],
                )
                .await;
            }
            Err(e) => {
                error!(identity = %identity, state = ?session.state, error = %e,
                    "uploading conversion result failed");
                self.fail_pipeline(&session, replies::CONVERSION_FAILED).await;
            }
        }
    }

    /// Downloads the session's pending media into its private staging
    /// directory, recording the local path. Returns false on any failure.
    async fn stage_pending_media(&self, session: &mut Session) -> bool {
        let Some(media) = session.pending_media.clone() else {
            return false;
        };
        let workdir = match self.ensure_workdir(session) {
            Ok(dir) => dir,
            Err(e) => {
                error!(identity = %session.identity, error = %e,
                    "could not create staging directory");
                return false;
            }
        };
        let stem = sanitize_stem(session.file_name.as_deref().unwrap_or("file"));
        match self
            .fetcher
            .fetch(&media.remote_url, &media.content_type, &workdir, &stem)
            .await
        {
            Ok(path) => {
                session.local_path = Some(path);
                true
            }
            Err(e) => {
                error!(identity = %session.identity, url = %media.remote_url, error = %e,
                    "media download failed");
                false
            }
        }
    }

    /// Per-session staging directory, created on first use.
    ///
    /// Each session gets a private directory so concurrent users can never
    /// collide on staged files.
    fn ensure_workdir(&self, session: &mut Session) -> std::io::Result<PathBuf> {
        if let Some(dir) = &session.workdir {
            return Ok(dir.clone());
        }
        std::fs::create_dir_all(&self.staging_root)?;
        let dir = tempfile::Builder::new()
            .prefix(&format!("{}-", sanitize_stem(session.identity.as_str())))
            .tempdir_in(&self.staging_root)?
            .into_path();
        session.workdir = Some(dir.clone());
        Ok(dir)
    }

    /// Pipeline failure: notify, then tear the session down.
    async fn fail_pipeline(&self, session: &Session, message: &str) {
        self.clear(session).await;
        self.send_all(
            &session.identity,
            session,
            vec![OutboundCommand::text(message)],
        )
        .await;
    }

    async fn unexpected_reset(&self, session: &Session) {
        warn!(identity = %session.identity, state = ?session.state,
            "unexpected input; resetting session");
        self.clear(session).await;
        self.send_all(
            &session.identity,
            session,
            vec![OutboundCommand::text(replies::UNEXPECTED)],
        )
        .await;
    }

    /// Removes the session record and its staging directory (best-effort).
    async fn clear(&self, session: &Session) {
        self.sessions.clear(&session.identity).await;
        if let Some(dir) = &session.workdir {
            if let Err(e) = tokio::fs::remove_dir_all(dir).await {
                warn!(identity = %session.identity, dir = %dir.display(), error = %e,
                    "failed to remove staging directory");
            }
        }
    }

    /// Executes outbound commands, each independently fault-isolated.
    ///
    /// Sends happen after the session mutation has been committed; a
    /// transport failure is logged and never unwinds the transition.
    async fn send_all(&self, to: &Identity, session: &Session, commands: Vec<OutboundCommand>) {
        for command in commands {
            let result = match &command {
                OutboundCommand::SendText(body) => self.transport.send_text(to, body).await,
                OutboundCommand::SendMenu(menu) => self.transport.send_menu(to, *menu).await,
                OutboundCommand::SendMedia { url, caption } => {
                    self.transport.send_media(to, url, caption).await
                }
            };
            if let Err(e) = result {
                warn!(identity = %to, state = ?session.state, error = %e,
                    "outbound command failed");
            }
        }
    }
}

fn menu_state(kind: MediaKind) -> SessionState {
    match kind {
        MediaKind::Pdf => SessionState::PdfConversionMenu,
        MediaKind::Docx => SessionState::DocxConversionMenu,
        MediaKind::Image => SessionState::ImageConversionMenu,
    }
}

/// Keeps staged file names shell- and filesystem-safe.
fn sanitize_stem(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}

fn step_name(step: &Step) -> &'static str {
    match step {
        Step::ShowGenericMenu { .. } => "show_generic_menu",
        Step::EnterRetrieve => "enter_retrieve",
        Step::EnterManage => "enter_manage",
        Step::PromptSendFile => "prompt_send_file",
        Step::HoldNamedMedia { .. } => "hold_named_media",
        Step::HoldUnnamedMedia { .. } => "hold_unnamed_media",
        Step::PromptForName => "prompt_for_name",
        Step::DeliverStored { .. } => "deliver_stored",
        Step::NamePending { .. } => "name_pending",
        Step::ForwardToIngestion => "forward_to_ingestion",
        Step::BeginConversion { .. } => "begin_conversion",
        Step::RejectConversion => "reject_conversion",
        Step::BeginAi => "begin_ai",
        Step::RejectAi => "reject_ai",
        Step::RunConversion { .. } => "run_conversion",
        Step::RetryMenu { .. } => "retry_menu",
        Step::ExitAi => "exit_ai",
        Step::PromptAi => "prompt_ai",
        Step::AnswerQuestion { .. } => "answer_question",
        Step::UnexpectedReset => "unexpected_reset",
    }
}
