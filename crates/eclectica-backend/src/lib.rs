mod error;
mod events;
mod info;
mod language;
mod traits;
mod types;

pub use error::{BackendError, NetworkStage};
pub use events::{EventSink, InstallEvent, InstallPhase};
pub use info::{InfoMap, keys};
pub use language::{Language, UnknownLanguage};
pub use traits::{BackendContext, InstallTarget, LanguageBackend};
pub use types::InstalledVersion;

pub use eclectica_versions::{RemoteVersion, Version};
