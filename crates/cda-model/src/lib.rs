pub mod document;
pub mod error;
pub mod flat;
pub mod record;
pub mod registry;
pub mod table;
pub mod template;
pub mod tree;

pub use document::{AuthorRecord, DocumentExtraction, PatientRecord, Section, SectionMeta, Sections};
pub use error::{ExtractError, MappingError, StoreError};
pub use flat::FlatValueMap;
pub use record::{ClinicalRecord, HasIdentifier, RecordBundle, RecordKind};
pub use table::{CellValue, Row, StoreSnapshot, TableName, WorkOrderStore};
pub use template::{FieldPaths, MappingTemplates, ResourceTemplate, TemplateNode};
pub use tree::{Attributes, Children, NodeField, Slot, TreeNode};
