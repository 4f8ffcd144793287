//! MOF Value Types
//!
//! Leaf vocabulary shared by the kernel and its collaborators:
//! - Stable handles into the kernel arenas (`id` module)
//! - The dynamic `Value` carried by feature slots and notifications
//! - Primitive value kinds with parse/format/default behavior
//! - The external type-name translation table

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod error;
pub mod id;
pub mod kind;
pub mod translate;
pub mod value;

pub use error::ValueError;
pub use id::{ClassifierId, FeatureId, ObjectId, OperationId, PackageId, ResourceId};
pub use kind::ValueKind;
pub use translate::{lookup_type_name, TypeBinding};
pub use value::Value;
