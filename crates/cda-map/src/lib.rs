//! Template-driven conversion of stored clinical document entries into
//! typed records.

pub mod batch;
pub mod build;
pub mod config;
pub mod datetime;
pub mod resolver;
pub mod sections;
pub mod stored;

pub use batch::{ConversionOutcome, SkippedEntry, convert_entries, convert_entry, convert_store};
pub use build::build_record;
pub use config::{ConfigError, default_templates, load_templates, parse_templates};
pub use datetime::normalize_date_time;
pub use resolver::{Resolver, resolve};
pub use sections::record_kind;
pub use stored::{StoredEntry, stored_entries};
