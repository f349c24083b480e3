//! Interactive viewer core: coordinate pipeline, session state, search
//! navigation and gesture-driven annotation.

pub mod gesture;
pub mod search;
pub mod session;
pub mod transform;

pub use gesture::{AnnotationPlacer, Gesture, GestureTracker, Tool};
pub use search::{Match, SearchCursor};
pub use session::Session;
pub use transform::{DisplayTransform, compute_display_transform, view_to_page};
