pub mod overlay;
pub mod provider;
pub mod session;
pub mod source;

// Re-exports for convenience
pub use provider::{LandmarkProvider, RecordedLandmarks, RecordedProvider};
pub use session::{Delivery, Session, SessionError, SessionHandle, SessionUpdate, spawn_session};
pub use source::{BlankFrameSource, FrameSource, ImageDirSource};
