//! Inkmark Core Library
//!
//! Platform-agnostic engine for placing line and score marks on a fixed page:
//! gesture handling, alignment snapping, undo history and the pinch-zoom
//! viewport. Marks live in a [`MarkStore`]; the engine only edits them.

pub mod config;
pub mod geometry;
pub mod history;
pub mod input;
pub mod interaction;
pub mod marks;
pub mod selection;
pub mod session;
pub mod snap;
pub mod store;
pub mod tools;
pub mod viewport;

pub use config::EditorConfig;
pub use history::{History, HistoryEntry};
pub use input::{InputRouter, PointerEvent, PointerKind, PointerPhase};
pub use interaction::{EditorState, Gesture, MarkOp};
pub use marks::{Endpoint, LineMark, Mark, MarkData, MarkId, MarkKind, MarkPatch, ScoreMark};
pub use session::{EditorError, EditorResult, MarkEdit, Session};
pub use snap::{SnapGuides, SnapResult, SnapThreshold};
pub use store::{CrdtMarkStore, MarkStore, MarksInbox, MemoryMarkStore, StoreError, Subscription};
pub use tools::EditMode;
pub use viewport::Viewport;
