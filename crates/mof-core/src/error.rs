//! Kernel errors

use mof_types::{ObjectId, ValueError};
use thiserror::Error;

/// Result type used throughout the kernel
pub type KernelResult<T> = Result<T, KernelError>;

/// Errors raised by schema edits, feature access and object graph mutation
///
/// Validation errors are raised before the graph is touched, so a rejected
/// mutation leaves the objects exactly as they were. Listener errors and
/// `NotificationDepthExceeded` are reported after the edit has been applied.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum KernelError {
    /// A value failed the declared type check of a feature or parameter
    #[error("Expected type {expected}, but got type {actual} with value {value} instead")]
    BadValue {
        /// Declared type
        expected: String,
        /// Runtime type of the rejected value
        actual: String,
        /// Rendering of the rejected value
        value: String,
    },

    /// Mutation of a derived (computed) feature
    #[error("Feature {feature} is derived and cannot be modified")]
    Unsupported {
        /// Feature name
        feature: String,
    },

    /// Instantiation of an abstract class or interface
    #[error("Can't instantiate abstract class {class}")]
    AbstractInstantiation {
        /// Class name
        class: String,
    },

    /// The resolver could not produce a target for a proxy
    #[error("Cannot resolve proxy {path}: {reason}")]
    Resolution {
        /// Proxy path
        path: String,
        /// Resolver message
        reason: String,
    },

    /// An operation stub was invoked without an installed body
    #[error("Operation {operation} is not yet implemented")]
    NotImplemented {
        /// Operation name
        operation: String,
    },

    /// Object handle does not name a live object or proxy
    #[error("Unknown object: {id}")]
    UnknownObject {
        /// Offending handle
        id: ObjectId,
    },

    /// Classifier handle or name not found
    #[error("Unknown classifier: {name}")]
    UnknownClassifier {
        /// Name or handle of the classifier
        name: String,
    },

    /// Feature handle or name not found
    #[error("Unknown feature: {name}")]
    UnknownFeature {
        /// Name or handle of the feature
        name: String,
    },

    /// Operation handle or name not found
    #[error("Unknown operation: {name}")]
    UnknownOperation {
        /// Name or handle of the operation
        name: String,
    },

    /// Package handle or name not found
    #[error("Unknown package: {name}")]
    UnknownPackage {
        /// Name or handle of the package
        name: String,
    },

    /// A classifier of another kind was expected
    #[error("Classifier {name} is not a {expected}")]
    WrongClassifierKind {
        /// Classifier name
        name: String,
        /// Kind that was expected
        expected: &'static str,
    },

    /// The object's instance type has no slot for the feature
    #[error("Feature {feature} is not available on instances of {class}")]
    FeatureNotAvailable {
        /// Class of the object
        class: String,
        /// Feature name
        feature: String,
    },

    /// Collection index outside the valid range
    #[error("Index {index} out of bounds for collection of length {len}")]
    IndexOutOfBounds {
        /// Requested index
        index: usize,
        /// Collection length
        len: usize,
    },

    /// Value to remove is not in the collection
    #[error("Value {value} is not in {feature}")]
    ValueNotFound {
        /// Feature name
        feature: String,
        /// Rendering of the value
        value: String,
    },

    /// Value already present in a unique collection
    #[error("Value {value} is already in {feature}")]
    DuplicateValue {
        /// Feature name
        feature: String,
        /// Rendering of the value
        value: String,
    },

    /// A collection operation was applied to a single-valued feature
    #[error("Feature {feature} is single-valued")]
    SingleValued {
        /// Feature name
        feature: String,
    },

    /// Positional access on a set or bag
    #[error("Feature {feature} is unordered and has no positions")]
    Unordered {
        /// Feature name
        feature: String,
    },

    /// Adding a supertype would make a class its own ancestor
    #[error("Class {class} cannot inherit from {super_type}: inheritance cycle")]
    CyclicInheritance {
        /// Class being edited
        class: String,
        /// Rejected supertype
        super_type: String,
    },

    /// Nesting a package would make it its own ancestor
    #[error("Package {package} cannot be nested inside itself")]
    PackageCycle {
        /// Package being nested
        package: String,
    },

    /// A containment assignment would make an object its own ancestor
    #[error("Object {object} cannot be contained by one of its descendants")]
    ContainmentCycle {
        /// Object that would be contained
        object: ObjectId,
    },

    /// A required operation parameter received no argument
    #[error("Operation {operation} is missing required argument {parameter}")]
    MissingArgument {
        /// Operation name
        operation: String,
        /// Parameter name
        parameter: String,
    },

    /// More arguments than parameters
    #[error("Operation {operation} takes {expected} arguments but {actual} were given")]
    TooManyArguments {
        /// Operation name
        operation: String,
        /// Parameter count
        expected: usize,
        /// Argument count
        actual: usize,
    },

    /// Enumeration has no literal with this name or value
    #[error("Enumeration {enumeration} has no literal {literal}")]
    UnknownLiteral {
        /// Enumeration name
        enumeration: String,
        /// Requested literal
        literal: String,
    },

    /// An attribute was used where a reference is required
    #[error("Feature {feature} is not a reference")]
    NotAReference {
        /// Feature name
        feature: String,
    },

    /// Nested notification dispatch went deeper than the configured limit
    #[error("Notification depth exceeded the limit of {limit}")]
    NotificationDepthExceeded {
        /// Configured limit
        limit: usize,
    },

    /// Literal conversion failure
    #[error(transparent)]
    Value(#[from] ValueError),
}
