//! Per-identity conversation sessions.
//!
//! A session records a single user's in-progress multi-turn interaction: the
//! current state-machine position plus the in-flight file transfer (remote
//! media reference, user-supplied name, locally staged copy). Sessions are
//! volatile; a process restart loses in-flight conversations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::domain::foundation::Identity;

/// A received attachment that has not yet been processed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingMedia {
    /// Transport-hosted URL the file can be downloaded from.
    pub remote_url: String,
    /// MIME type reported by the transport.
    pub content_type: String,
}

/// Position in the conversation state machine.
///
/// Absence of a session is equivalent to `Initial`. `Retrieve` and `Manage`
/// from the interaction design are entry actions, not resting states: their
/// work runs within one event and the session lands in `AwaitingFileName`
/// resp. `Idle`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No flow in progress.
    Initial,
    /// Waiting for the user to upload or forward a file.
    Idle,
    /// A name is needed, either for a pending upload or to pick a stored file.
    AwaitingFileName,
    /// A pending file has a name; waiting for an action (upload/convert/ai).
    FileNamed,
    /// Waiting for a PDF conversion option.
    PdfConversionMenu,
    /// Waiting for a DOCX conversion option.
    DocxConversionMenu,
    /// Waiting for an image conversion option.
    ImageConversionMenu,
    /// Question-answering loop over the staged PDF.
    AiMode,
}

/// Server-side record of one identity's in-progress interaction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub identity: Identity,
    pub state: SessionState,
    /// Set when a file has been received but not yet named/processed.
    pub pending_media: Option<PendingMedia>,
    /// User-supplied display name for the pending file.
    pub file_name: Option<String>,
    /// Set once the pending file has been staged locally.
    pub local_path: Option<PathBuf>,
    /// Disambiguates what an `AwaitingFileName` answer resolves to: picking a
    /// stored file to retrieve (true) vs. naming a fresh upload (false).
    pub retrieve_flow: bool,
    /// Private staging directory for downloads and conversion outputs.
    pub workdir: Option<PathBuf>,
    pub updated_at: DateTime<Utc>,
}

impl Session {
    /// Creates a fresh session in `Initial`.
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            state: SessionState::Initial,
            pending_media: None,
            file_name: None,
            local_path: None,
            retrieve_flow: false,
            workdir: None,
            updated_at: Utc::now(),
        }
    }

    /// Moves the session to a new state, touching the update timestamp.
    pub fn transition(&mut self, state: SessionState) {
        self.state = state;
        self.updated_at = Utc::now();
    }

    /// The media kind of the pending attachment, if one exists and is
    /// supported.
    pub fn pending_kind(&self) -> Option<crate::domain::media::MediaKind> {
        self.pending_media
            .as_ref()
            .and_then(|m| crate::domain::media::MediaKind::from_content_type(&m.content_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::media::MediaKind;

    fn session() -> Session {
        Session::new(Identity::new("whatsapp:+1555"))
    }

    #[test]
    fn new_session_starts_initial_and_empty() {
        let s = session();
        assert_eq!(s.state, SessionState::Initial);
        assert!(s.pending_media.is_none());
        assert!(s.file_name.is_none());
        assert!(s.local_path.is_none());
        assert!(!s.retrieve_flow);
    }

    #[test]
    fn transition_updates_state() {
        let mut s = session();
        s.transition(SessionState::Idle);
        assert_eq!(s.state, SessionState::Idle);
    }

    #[test]
    fn pending_kind_classifies_media() {
        let mut s = session();
        assert_eq!(s.pending_kind(), None);

        s.pending_media = Some(PendingMedia {
            remote_url: "https://example.com/f".into(),
            content_type: "application/pdf".into(),
        });
        assert_eq!(s.pending_kind(), Some(MediaKind::Pdf));

        s.pending_media.as_mut().unwrap().content_type = "audio/mpeg".into();
        assert_eq!(s.pending_kind(), None);
    }
}
