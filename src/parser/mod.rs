mod element_stream;
mod selector;

// Re-export public API
pub use element_stream::ElementStream;
pub use selector::{classify, strip_activity_prefix, Projection, Selection};
