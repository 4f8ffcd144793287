//! MOF Core
//!
//! A reflective object kernel: schemas that can be edited while instances
//! exist, objects whose slots are typed by those schemas, and synchronous
//! change notification for every mutation.
//!
//! The kernel keeps three kinds of edges consistent on every write:
//! - containment: an object has at most one container
//! - opposites: paired references always mirror each other
//! - inverse relations: every object knows who references it, so deleting
//!   it can cut every edge that touches it
//!
//! ```ignore
//! use mof_core::{ClassBuilder, FeatureBuilder, Kernel, Value};
//!
//! let mut kernel = Kernel::new();
//! let e_string = kernel.builtins().unwrap().e_string;
//! let node = kernel.define_class(
//!     ClassBuilder::new("Node")
//!         .feature(FeatureBuilder::attribute("name", e_string))
//!         .feature(FeatureBuilder::reference_to_owner("children").many().containment()),
//! )?;
//! let root = kernel.create_object(node)?;
//! let child = kernel.create_object(node)?;
//! let children = kernel.feature_by_name(root, "children")?;
//! kernel.append(root, children, Value::Object(child))?;
//! assert_eq!(kernel.container(child)?, Some(root));
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

pub mod config;
pub mod error;
pub mod instance_type;
pub mod kernel;
pub mod notification;
pub mod object;
pub mod schema;

pub use config::{ConfigError, KernelOptions, ListenerErrorPolicy};
pub use error::{KernelError, KernelResult};
pub use instance_type::{BoundParameter, InstanceType, MethodSlot, OperationBody};
pub use kernel::Kernel;
pub use notification::{
    FeatureKey, Listener, ListenerId, MetaFeature, Notification, NotificationKind, NotifierId, SchemaElement,
};
pub use object::{CollectionKind, ProxyState, Resolver};
pub use schema::{
    Annotation, Builtins, Class, ClassBuilder, Classifier, ClassifierKind, DataType, Derivation, EnumLiteral,
    Enumeration, Feature, FeatureBuilder, FeatureKind, Operation, OperationBuilder, Package, Parameter, Schema,
    UNBOUNDED,
};

pub use mof_types;
pub use mof_types::{ClassifierId, FeatureId, ObjectId, OperationId, PackageId, ResourceId, Value, ValueKind};
