//! Operations and their parameters

use crate::schema::Annotation;
use mof_types::{ClassifierId, OperationId};

/// Operation parameter
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parameter {
    pub(crate) name: String,
    pub(crate) e_type: Option<ClassifierId>,
    pub(crate) required: bool,
}

impl Parameter {
    /// Required parameter
    pub fn new(name: impl Into<String>, e_type: Option<ClassifierId>) -> Self {
        Self {
            name: name.into(),
            e_type,
            required: true,
        }
    }

    /// Mark as optional; an omitted argument takes the type's default
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Parameter name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type
    pub fn e_type(&self) -> Option<ClassifierId> {
        self.e_type
    }

    /// Whether an argument must be given
    pub fn is_required(&self) -> bool {
        self.required
    }
}

/// Behavioral feature of a class
#[derive(Debug, Clone)]
pub struct Operation {
    pub(crate) id: OperationId,
    pub(crate) name: String,
    pub(crate) owner: Option<ClassifierId>,
    pub(crate) e_type: Option<ClassifierId>,
    pub(crate) parameters: Vec<Parameter>,
    pub(crate) exceptions: Vec<ClassifierId>,
    pub(crate) annotations: Vec<Annotation>,
}

impl Operation {
    /// Operation handle
    pub fn id(&self) -> OperationId {
        self.id
    }

    /// Operation name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Owning class; `None` once removed
    pub fn owner(&self) -> Option<ClassifierId> {
        self.owner
    }

    /// Return type
    pub fn e_type(&self) -> Option<ClassifierId> {
        self.e_type
    }

    /// Parameters in order
    pub fn parameters(&self) -> &[Parameter] {
        &self.parameters
    }

    /// Declared exception types
    pub fn exceptions(&self) -> &[ClassifierId] {
        &self.exceptions
    }

    /// Attached annotations
    pub fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}
