//! Media fetcher adapters.

mod twilio_media;

pub use twilio_media::TwilioMediaFetcher;
