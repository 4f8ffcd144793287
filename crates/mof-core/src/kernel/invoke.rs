//! Operation invocation

use crate::error::{KernelError, KernelResult};
use crate::instance_type::OperationBody;
use crate::kernel::Kernel;
use mof_types::{ClassifierId, ObjectId, Value};
use std::rc::Rc;

impl Kernel {
    /// Call an operation on an object with positional arguments
    ///
    /// Omitted optional parameters take their default. Arguments are type
    /// checked like feature values. An operation without an installed body
    /// fails with `NotImplemented`.
    pub fn invoke(&mut self, object: ObjectId, name: &str, args: &[Value]) -> KernelResult<Value> {
        let class = self.class_of(object)?;
        let object = self.force_resolve(object)?;
        let method = self
            .types
            .find_method(class, name)
            .cloned()
            .ok_or_else(|| KernelError::UnknownOperation {
                name: name.to_string(),
            })?;

        if args.len() > method.parameters.len() {
            return Err(KernelError::TooManyArguments {
                operation: method.name,
                expected: method.parameters.len(),
                actual: args.len(),
            });
        }
        let mut bound = Vec::with_capacity(method.parameters.len());
        for (index, parameter) in method.parameters.iter().enumerate() {
            match args.get(index) {
                Some(arg) => {
                    self.check_value(parameter.e_type, arg)?;
                    bound.push(arg.clone());
                }
                None if parameter.required => {
                    return Err(KernelError::MissingArgument {
                        operation: method.name,
                        parameter: parameter.name.clone(),
                    });
                }
                None => bound.push(parameter.default.clone()),
            }
        }

        match method.body {
            Some(body) => body(self, object, &bound),
            None => Err(KernelError::NotImplemented {
                operation: method.name,
            }),
        }
    }

    /// Install the body of an operation for instances of `class`
    ///
    /// When `class` only inherits the operation, the body overrides it for
    /// `class` and its subtypes.
    pub fn implement_operation(
        &mut self,
        class: ClassifierId,
        name: &str,
        body: impl Fn(&mut Kernel, ObjectId, &[Value]) -> KernelResult<Value> + 'static,
    ) -> KernelResult<()> {
        self.schema.class(class)?;
        let body: OperationBody = Rc::new(body);
        let inherited = self.types.find_method(class, name).cloned();
        let Some(instance_type) = self.types.get_mut(class) else {
            return Err(KernelError::UnknownClassifier {
                name: self.schema.classifier_name(class),
            });
        };
        if let Some(method) = instance_type.method_mut(name) {
            method.body = Some(body);
            return Ok(());
        }
        match inherited {
            Some(mut method) => {
                method.body = Some(body);
                instance_type.add_method(method);
                Ok(())
            }
            None => Err(KernelError::UnknownOperation {
                name: name.to_string(),
            }),
        }
    }
}
