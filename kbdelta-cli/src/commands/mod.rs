//! CLI command implementations.

pub mod apply;
pub mod edit;
pub mod export;
pub mod note;
pub mod search;
pub mod sections;
pub mod status;
pub mod undo;

pub use apply::apply_file;
pub use edit::set_value;
pub use export::export_changes;
pub use note::{general_note, note};
pub use search::{search_values, SearchOptions};
pub use sections::{list_sections, show_path};
pub use status::status;
pub use undo::undo;
