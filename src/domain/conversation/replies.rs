//! Canned user-facing reply text.
//!
//! Centralized so the engine and its tests agree on exact wording.

pub const PROMPT_SEND_FILE: &str = "Please send or forward the file you want me to work with.";
pub const PROMPT_MANAGE: &str =
    "Upload or forward the file you want to store, and give it a name in the caption.";
pub const PROMPT_FILE_NAME: &str = "Please provide a name for your file.";
pub const PROMPT_STORED_LIST: &str = "Reply with the name of the file you want me to send back.";
pub const NO_STORED_FILES: &str = "You don't have any stored files yet.";
pub const FILE_NOT_FOUND: &str = "I couldn't find a stored file with that name.";
pub const UPLOAD_OK: &str = "Your file has been stored successfully.";
pub const UPLOAD_FAILED: &str = "Sorry, storing your file failed. Please try again.";
pub const CONVERSION_READY: &str = "Here is your converted file!";
pub const CONVERSION_FAILED: &str =
    "Sorry, the conversion failed. Please re-send the file and try again.";
pub const DOWNLOAD_FAILED: &str =
    "Sorry, I couldn't fetch your file from WhatsApp. Please re-send it.";
pub const UNSUPPORTED_MEDIA: &str =
    "That file type isn't supported for conversion. I can work with PDF, Word, and images.";
pub const AI_PDF_ONLY: &str = "AI insights are available for PDF files only.";
pub const AI_READY: &str =
    "Ask me anything about your document. Type 'exit' when you're done.";
pub const AI_EXIT: &str = "Leaving AI mode. Anything else I can help with?";
pub const AI_FAILED: &str =
    "Sorry, I couldn't answer that one. Try rephrasing your question.";
pub const LIST_FAILED: &str =
    "Sorry, I couldn't fetch your stored files right now. Please try again.";
pub const RETRIEVE_FAILED: &str =
    "Sorry, I couldn't look up that file right now. Please try again.";
pub const MENU_RETRY: &str = "Something went wrong. Please pick one of the menu options.";
pub const UNEXPECTED: &str =
    "Something unexpected happened, so I've reset our conversation. Send a file to start over.";
pub const ASSISTANT_FALLBACK: &str = "I'm here to help! Upload a file to get started with \
storing, retrieving, or converting it, or ask questions about your files.";

/// Formats the stored-file listing sent at the start of the retrieve flow.
pub fn stored_files_list(names: &[String]) -> String {
    let mut out = String::from("Here are your files:\n");
    for name in names {
        out.push_str("- ");
        out.push_str(name);
        out.push('\n');
    }
    out.push('\n');
    out.push_str(PROMPT_STORED_LIST);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stored_files_list_includes_every_name_and_prompt() {
        let listing = stored_files_list(&["report.pdf".into(), "cat.png".into()]);
        assert!(listing.contains("- report.pdf"));
        assert!(listing.contains("- cat.png"));
        assert!(listing.ends_with(PROMPT_STORED_LIST));
    }
}
