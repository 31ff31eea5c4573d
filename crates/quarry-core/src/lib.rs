pub mod config;
pub mod llm;
pub mod research;
pub mod search;

pub use config::Config;
pub use llm::{LLMError, LLM};
pub use research::{Clarification, ResearchEvent, ResearchOutcome, ResearchReport, ResearchRunner};
pub use search::{SearchBackend, SearchError};
