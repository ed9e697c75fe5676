//! Integration tests for the full conversation engine.
//!
//! These tests drive complete WhatsApp conversations end-to-end:
//! 1. Inbound messages go through the engine exactly as webhook deliveries do
//! 2. The real in-memory session store provides per-identity locking
//! 3. All external collaborators are in-memory test doubles
//!
//! Covered flows: store-and-ingest, caption shortcut, conversion, retrieval,
//! AI mode, the pipeline/read-only failure split, and duplicate-delivery
//! serialization.

use async_trait::async_trait;
use proptest::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Mutex;

use filebridge::adapters::session::InMemorySessionStore;
use filebridge::application::ConversationEngine;
use filebridge::domain::conversation::{replies, InboundMessage, MenuId, OutboundCommand};
use filebridge::domain::foundation::Identity;
use filebridge::domain::media::ConversionTarget;
use filebridge::domain::session::{PendingMedia, SessionState};
use filebridge::ports::{
    AssistantError, AssistantReplier, ChatTransport, ConvertError, DocumentQa, FetchError,
    FileStore, FileStoreError, FormatConverter, IngestionClient, IngestionError, MediaFetcher,
    QaError, SessionStore, TransportError, UploadDescriptor,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

#[derive(Default)]
struct RecordingTransport {
    sent: Mutex<Vec<OutboundCommand>>,
}

impl RecordingTransport {
    async fn commands(&self) -> Vec<OutboundCommand> {
        self.sent.lock().await.clone()
    }

    async fn drain(&self) -> Vec<OutboundCommand> {
        std::mem::take(&mut *self.sent.lock().await)
    }
}

#[async_trait]
impl ChatTransport for RecordingTransport {
    async fn send_text(&self, _to: &Identity, body: &str) -> Result<(), TransportError> {
        self.sent
            .lock()
            .await
            .push(OutboundCommand::text(body.to_string()));
        Ok(())
    }

    async fn send_menu(&self, _to: &Identity, menu: MenuId) -> Result<(), TransportError> {
        self.sent.lock().await.push(OutboundCommand::SendMenu(menu));
        Ok(())
    }

    async fn send_media(
        &self,
        _to: &Identity,
        url: &str,
        caption: &str,
    ) -> Result<(), TransportError> {
        self.sent
            .lock()
            .await
            .push(OutboundCommand::media(url.to_string(), caption.to_string()));
        Ok(())
    }
}

#[derive(Default)]
struct StubFileStore {
    stored: Mutex<Vec<(String, String)>>, // (name, url)
    fail_reads: bool,
    fail_uploads: bool,
}

impl StubFileStore {
    fn with_stored(names_urls: &[(&str, &str)]) -> Self {
        Self {
            stored: Mutex::new(
                names_urls
                    .iter()
                    .map(|(n, u)| (n.to_string(), u.to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }
}

#[async_trait]
impl FileStore for StubFileStore {
    async fn upload(&self, local_path: &Path) -> Result<String, FileStoreError> {
        if self.fail_uploads {
            return Err(FileStoreError::UploadFailed("gateway down".into()));
        }
        Ok(format!(
            "https://blobs.test/{}",
            local_path.file_name().unwrap().to_string_lossy()
        ))
    }

    async fn resolve(
        &self,
        _owner: &Identity,
        file_name: &str,
    ) -> Result<Option<String>, FileStoreError> {
        if self.fail_reads {
            return Err(FileStoreError::IndexQuery("index down".into()));
        }
        Ok(self
            .stored
            .lock()
            .await
            .iter()
            .find(|(n, _)| n == file_name)
            .map(|(_, u)| u.clone()))
    }

    async fn list(&self, _owner: &Identity) -> Result<Vec<String>, FileStoreError> {
        if self.fail_reads {
            return Err(FileStoreError::IndexQuery("index down".into()));
        }
        Ok(self
            .stored
            .lock()
            .await
            .iter()
            .map(|(n, _)| n.clone())
            .collect())
    }
}

#[derive(Default)]
struct RecordingIngestion {
    received: Mutex<Vec<UploadDescriptor>>,
}

#[async_trait]
impl IngestionClient for RecordingIngestion {
    async fn ingest(&self, descriptor: &UploadDescriptor) -> Result<(), IngestionError> {
        self.received.lock().await.push(descriptor.clone());
        Ok(())
    }
}

/// Writes a real file into the staging directory, like the Twilio fetcher.
struct WritingFetcher {
    fail: bool,
}

#[async_trait]
impl MediaFetcher for WritingFetcher {
    async fn fetch(
        &self,
        _url: &str,
        _content_type: &str,
        dest_dir: &Path,
        stem: &str,
    ) -> Result<PathBuf, FetchError> {
        if self.fail {
            return Err(FetchError::Status(404));
        }
        let path = dest_dir.join(format!("{stem}.pdf"));
        tokio::fs::write(&path, b"staged").await?;
        Ok(path)
    }
}

struct StubConverter {
    fail: bool,
}

#[async_trait]
impl FormatConverter for StubConverter {
    async fn convert(
        &self,
        input: &Path,
        target: ConversionTarget,
    ) -> Result<PathBuf, ConvertError> {
        if self.fail {
            return Err(ConvertError::Tool("converter exploded".into()));
        }
        let output = input.with_extension(target.output_extension());
        tokio::fs::write(&output, b"converted").await?;
        Ok(output)
    }
}

struct CannedQa;

#[async_trait]
impl DocumentQa for CannedQa {
    async fn answer(&self, _document: &Path, question: &str) -> Result<String, QaError> {
        Ok(format!("answer to: {question}"))
    }
}

struct CannedAssistant;

#[async_trait]
impl AssistantReplier for CannedAssistant {
    async fn reply(&self, _query: &str) -> Result<String, AssistantError> {
        Ok("I can store, convert, and answer questions about files.".into())
    }
}

struct Harness {
    engine: Arc<ConversationEngine>,
    sessions: Arc<InMemorySessionStore>,
    transport: Arc<RecordingTransport>,
    ingestion: Arc<RecordingIngestion>,
    _staging: tempfile::TempDir,
}

struct HarnessOptions {
    files: StubFileStore,
    fetch_fails: bool,
    convert_fails: bool,
    assistant: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        Self {
            files: StubFileStore::default(),
            fetch_fails: false,
            convert_fails: false,
            assistant: false,
        }
    }
}

fn harness(options: HarnessOptions) -> Harness {
    let staging = tempfile::tempdir().expect("staging dir");
    let sessions = Arc::new(InMemorySessionStore::new());
    let transport = Arc::new(RecordingTransport::default());
    let ingestion = Arc::new(RecordingIngestion::default());

    let mut engine = ConversationEngine::new(
        sessions.clone(),
        transport.clone(),
        Arc::new(options.files),
        ingestion.clone(),
        Arc::new(WritingFetcher {
            fail: options.fetch_fails,
        }),
        Arc::new(StubConverter {
            fail: options.convert_fails,
        }),
        Arc::new(CannedQa),
        staging.path().to_path_buf(),
    );
    if options.assistant {
        engine = engine.with_assistant(Arc::new(CannedAssistant));
    }

    Harness {
        engine: Arc::new(engine),
        sessions,
        transport,
        ingestion,
        _staging: staging,
    }
}

fn user() -> Identity {
    Identity::new("whatsapp:+15551234567")
}

fn text(body: &str) -> InboundMessage {
    InboundMessage::new(user(), Some(body.to_string()), None).expect("valid message")
}

fn pdf(caption: Option<&str>) -> InboundMessage {
    InboundMessage::new(
        user(),
        caption.map(str::to_string),
        Some(PendingMedia {
            remote_url: "https://media.test/m0".into(),
            content_type: "application/pdf".into(),
        }),
    )
    .expect("valid message")
}

fn texts(commands: &[OutboundCommand]) -> Vec<String> {
    commands
        .iter()
        .filter_map(|c| match c {
            OutboundCommand::SendText(body) => Some(body.clone()),
            _ => None,
        })
        .collect()
}

// =============================================================================
// Store-and-ingest flow
// =============================================================================

#[tokio::test]
async fn stores_a_file_end_to_end() {
    let h = harness(HarnessOptions::default());

    // Fresh identity sends an unnamed PDF.
    h.engine.handle(pdf(None)).await;
    assert_eq!(
        texts(&h.transport.drain().await),
        vec![replies::PROMPT_FILE_NAME]
    );
    let session = h.sessions.get(&user()).await.expect("session exists");
    assert_eq!(session.state, SessionState::AwaitingFileName);

    // Naming it offers the file-actions menu.
    h.engine.handle(text("taxes 2025")).await;
    assert_eq!(
        h.transport.drain().await,
        vec![OutboundCommand::SendMenu(MenuId::FileActions)]
    );

    // Picking upload forwards the descriptor and ends the conversation.
    h.engine.handle(text("upload")).await;
    assert_eq!(texts(&h.transport.drain().await), vec![replies::UPLOAD_OK]);

    let received = h.ingestion.received.lock().await;
    assert_eq!(received.len(), 1);
    assert_eq!(received[0].file_name, "taxes 2025");
    assert_eq!(received[0].remote_url, "https://media.test/m0");
    drop(received);

    assert!(h.sessions.get(&user()).await.is_none(), "session cleared");
}

#[tokio::test]
async fn caption_names_the_file_in_one_step() {
    let h = harness(HarnessOptions::default());

    h.engine.handle(pdf(Some("contract"))).await;
    assert_eq!(
        h.transport.drain().await,
        vec![OutboundCommand::SendMenu(MenuId::FileActions)]
    );

    let session = h.sessions.get(&user()).await.expect("session exists");
    assert_eq!(session.state, SessionState::FileNamed);
    assert_eq!(session.file_name.as_deref(), Some("contract"));
}

// =============================================================================
// Conversion flow
// =============================================================================

#[tokio::test]
async fn converts_a_named_pdf_and_delivers_the_result() {
    let h = harness(HarnessOptions::default());

    h.engine.handle(pdf(Some("report"))).await;
    h.transport.drain().await;

    // "convert" stages the file and offers the PDF menu.
    h.engine.handle(text("convert")).await;
    assert_eq!(
        h.transport.drain().await,
        vec![OutboundCommand::SendMenu(MenuId::Pdf)]
    );
    let session = h.sessions.get(&user()).await.expect("session exists");
    assert_eq!(session.state, SessionState::PdfConversionMenu);
    assert!(session.local_path.is_some(), "media staged locally");

    // Picking a format delivers the converted file.
    h.engine.handle(text("word")).await;
    let commands = h.transport.drain().await;
    assert!(matches!(
        &commands[..],
        [OutboundCommand::SendMedia { url, caption }]
            if url.starts_with("https://blobs.test/") && caption == replies::CONVERSION_READY
    ));
    assert!(h.sessions.get(&user()).await.is_none(), "session cleared");
}

#[tokio::test]
async fn unrecognized_menu_reply_reoffers_the_menu() {
    let h = harness(HarnessOptions::default());

    h.engine.handle(pdf(Some("report"))).await;
    h.engine.handle(text("convert")).await;
    h.transport.drain().await;

    h.engine.handle(text("sideways")).await;
    let commands = h.transport.drain().await;
    assert_eq!(
        commands,
        vec![
            OutboundCommand::text(replies::MENU_RETRY),
            OutboundCommand::SendMenu(MenuId::Pdf),
        ]
    );
    // Still in the menu: a valid pick afterwards succeeds.
    let session = h.sessions.get(&user()).await.expect("session preserved");
    assert_eq!(session.state, SessionState::PdfConversionMenu);
}

// =============================================================================
// Retrieval flow
// =============================================================================

#[tokio::test]
async fn retrieves_a_stored_file_by_name() {
    let h = harness(HarnessOptions {
        files: StubFileStore::with_stored(&[("notes", "https://blobs.test/notes.pdf")]),
        ..Default::default()
    });

    h.engine.handle(text("retrieve")).await;
    let listing = texts(&h.transport.drain().await);
    assert_eq!(listing.len(), 1);
    assert!(listing[0].contains("notes"));

    h.engine.handle(text("notes")).await;
    let commands = h.transport.drain().await;
    assert_eq!(
        commands,
        vec![OutboundCommand::media(
            "https://blobs.test/notes.pdf".to_string(),
            "notes".to_string()
        )]
    );
    assert!(h.sessions.get(&user()).await.is_none(), "session cleared");
}

#[tokio::test]
async fn retrieval_is_repeatable_with_the_same_result() {
    let h = harness(HarnessOptions {
        files: StubFileStore::with_stored(&[("notes", "https://blobs.test/notes.pdf")]),
        ..Default::default()
    });

    // Retrieval reads the index without mutating it; running the whole flow
    // twice delivers the same URL both times.
    for _ in 0..2 {
        h.engine.handle(text("retrieve")).await;
        h.transport.drain().await;
        h.engine.handle(text("notes")).await;
        assert_eq!(
            h.transport.drain().await,
            vec![OutboundCommand::media(
                "https://blobs.test/notes.pdf".to_string(),
                "notes".to_string()
            )]
        );
    }
}

#[tokio::test]
async fn retrieve_with_no_stored_files_resets_to_the_generic_menu() {
    let h = harness(HarnessOptions::default());

    h.engine.handle(text("retrieve")).await;
    let commands = h.transport.drain().await;
    assert_eq!(
        commands,
        vec![
            OutboundCommand::text(replies::NO_STORED_FILES),
            OutboundCommand::SendMenu(MenuId::Generic),
        ]
    );
    assert!(h.sessions.get(&user()).await.is_none());
}

#[tokio::test]
async fn unknown_stored_name_reoffers_the_retrieve_menu() {
    let h = harness(HarnessOptions {
        files: StubFileStore::with_stored(&[("notes", "https://blobs.test/notes.pdf")]),
        ..Default::default()
    });

    h.engine.handle(text("retrieve")).await;
    h.transport.drain().await;

    h.engine.handle(text("nonexistent")).await;
    let commands = h.transport.drain().await;
    assert_eq!(
        commands,
        vec![
            OutboundCommand::text(replies::FILE_NOT_FOUND),
            OutboundCommand::SendMenu(MenuId::Retrieve),
        ]
    );
}

// =============================================================================
// AI mode
// =============================================================================

#[tokio::test]
async fn ai_mode_answers_questions_until_exit() {
    let h = harness(HarnessOptions::default());

    h.engine.handle(pdf(Some("paper"))).await;
    h.transport.drain().await;

    h.engine.handle(text("ai")).await;
    assert_eq!(texts(&h.transport.drain().await), vec![replies::AI_READY]);

    h.engine.handle(text("what is the conclusion?")).await;
    assert_eq!(
        texts(&h.transport.drain().await),
        vec!["answer to: what is the conclusion?"]
    );
    // Session survives across questions.
    assert_eq!(
        h.sessions.get(&user()).await.expect("session").state,
        SessionState::AiMode
    );

    h.engine.handle(text("exit")).await;
    let commands = h.transport.drain().await;
    assert_eq!(
        commands,
        vec![
            OutboundCommand::text(replies::AI_EXIT),
            OutboundCommand::SendMenu(MenuId::Generic),
        ]
    );
    assert!(h.sessions.get(&user()).await.is_none());
}

#[tokio::test]
async fn ai_on_non_pdf_reprompts_without_clearing() {
    let h = harness(HarnessOptions::default());

    let image = InboundMessage::new(
        user(),
        Some("pic".to_string()),
        Some(PendingMedia {
            remote_url: "https://media.test/m1".into(),
            content_type: "image/png".into(),
        }),
    )
    .expect("valid message");
    h.engine.handle(image).await;
    h.transport.drain().await;

    h.engine.handle(text("ai")).await;
    let commands = h.transport.drain().await;
    assert_eq!(
        commands,
        vec![
            OutboundCommand::text(replies::AI_PDF_ONLY),
            OutboundCommand::SendMenu(MenuId::FileActions),
        ]
    );
    assert_eq!(
        h.sessions.get(&user()).await.expect("session").state,
        SessionState::FileNamed
    );
}

// =============================================================================
// Failure policy
// =============================================================================

#[tokio::test]
async fn pipeline_failure_clears_the_session() {
    let h = harness(HarnessOptions {
        convert_fails: true,
        ..Default::default()
    });

    h.engine.handle(pdf(Some("report"))).await;
    h.engine.handle(text("convert")).await;
    h.transport.drain().await;

    h.engine.handle(text("word")).await;
    assert_eq!(
        texts(&h.transport.drain().await),
        vec![replies::CONVERSION_FAILED]
    );
    assert!(h.sessions.get(&user()).await.is_none(), "session cleared");
}

#[tokio::test]
async fn download_failure_clears_the_session() {
    let h = harness(HarnessOptions {
        fetch_fails: true,
        ..Default::default()
    });

    h.engine.handle(pdf(Some("report"))).await;
    h.transport.drain().await;

    h.engine.handle(text("convert")).await;
    assert_eq!(
        texts(&h.transport.drain().await),
        vec![replies::DOWNLOAD_FAILED]
    );
    assert!(h.sessions.get(&user()).await.is_none());
}

#[tokio::test]
async fn read_only_failure_preserves_the_session() {
    let h = harness(HarnessOptions {
        files: StubFileStore {
            fail_reads: true,
            ..Default::default()
        },
        ..Default::default()
    });

    // Park the session somewhere first.
    h.engine.handle(pdf(Some("report"))).await;
    h.transport.drain().await;

    h.engine.handle(text("retrieve")).await;
    assert_eq!(texts(&h.transport.drain().await), vec![replies::LIST_FAILED]);
    // The held file is still there; upload still works.
    h.engine.handle(text("upload")).await;
    assert_eq!(texts(&h.transport.drain().await), vec![replies::UPLOAD_OK]);
}

// =============================================================================
// Entry state and assistant
// =============================================================================

#[tokio::test]
async fn free_text_without_assistant_offers_the_generic_menu() {
    let h = harness(HarnessOptions::default());

    h.engine.handle(text("hello there")).await;
    assert_eq!(
        h.transport.drain().await,
        vec![OutboundCommand::SendMenu(MenuId::Generic)]
    );
    assert!(h.sessions.get(&user()).await.is_none(), "no session created");
}

#[tokio::test]
async fn free_text_with_assistant_gets_a_reply_before_the_menu() {
    let h = harness(HarnessOptions {
        assistant: true,
        ..Default::default()
    });

    h.engine.handle(text("what can you do?")).await;
    let commands = h.transport.drain().await;
    assert_eq!(commands.len(), 2);
    assert!(matches!(&commands[0], OutboundCommand::SendText(body)
        if body.contains("store")));
    assert_eq!(commands[1], OutboundCommand::SendMenu(MenuId::Generic));
}

// =============================================================================
// Duplicate-delivery serialization
// =============================================================================

#[tokio::test]
async fn duplicate_deliveries_for_one_identity_are_serialized() {
    let h = harness(HarnessOptions::default());

    // Twilio retries can deliver the same media event twice, concurrently.
    let first = {
        let engine = h.engine.clone();
        tokio::spawn(async move { engine.handle(pdf(Some("dup"))).await })
    };
    let second = {
        let engine = h.engine.clone();
        tokio::spawn(async move { engine.handle(pdf(Some("dup"))).await })
    };
    first.await.expect("task");
    second.await.expect("task");

    // Both processed whole: two menu sends, one consistent final state.
    let commands = h.transport.commands().await;
    assert_eq!(
        commands,
        vec![
            OutboundCommand::SendMenu(MenuId::FileActions),
            OutboundCommand::SendMenu(MenuId::FileActions),
        ]
    );
    let session = h.sessions.get(&user()).await.expect("session exists");
    assert_eq!(session.state, SessionState::FileNamed);
    assert_eq!(session.file_name.as_deref(), Some("dup"));
}

// =============================================================================
// Properties
// =============================================================================

proptest! {
    /// Every inbound event produces at least one outbound command, whatever
    /// state the conversation is in.
    #[test]
    fn every_event_gets_a_response(bodies in proptest::collection::vec("[a-z ?!.]{1,24}", 1..8)) {
        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .expect("runtime");
        rt.block_on(async move {
            let h = harness(HarnessOptions::default());
            for body in bodies {
                let Ok(msg) = InboundMessage::new(user(), Some(body), None) else {
                    continue; // all-whitespace input never reaches the engine
                };
                h.engine.handle(msg).await;
                let commands = h.transport.drain().await;
                assert!(!commands.is_empty(), "an event went unanswered");
            }
        });
    }
}
