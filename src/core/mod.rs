pub mod dialogue;
pub mod llm;
pub mod storage;
pub mod tts;
pub mod twiml;

// Re-export commonly used types for convenience
pub use dialogue::{CallInput, CallOutcome, Dialogue, DialogueStep, NextState, Turn};

pub use llm::{AzureOpenAIChat, ChatError};

pub use storage::{BlobPublisher, StorageConnection, StorageError, blob_name};

pub use tts::{AzureSpeechSynthesizer, SpeechPublisher, SynthesisError};

pub use twiml::{TWIML_CONTENT_TYPE, TwimlBuilder, escape_xml};
