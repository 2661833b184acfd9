pub mod conversation;
pub mod error;
pub mod event;
pub mod form;
pub mod fuzzy;
pub mod matcher;
pub mod model;
pub mod notify;
pub mod preprocess;
pub mod responder;
pub mod server;
pub mod session;
pub mod settings;
pub mod store;
pub mod triggers;

pub use conversation::{DialogueEngine, EngineConfig};
pub use event::InboundEvent;
pub use model::{DialogueEntry, KnowledgeBase, PhraseEntry, ReservedEntries, Role};
pub use session::{Mode, SessionState};
pub use settings::Settings;
