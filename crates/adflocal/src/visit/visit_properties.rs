use super::VisitMut;
use crate::error::ResolveError;
use crate::json_path::PathStep;
use serde_json::Value;

/// Recursively visit all object members and array elements mutably
///
/// Depth-first and in document order. A node is visited before its children, so children of a replaced
/// node are the children of the replacement. The root itself is not visited.
pub trait VisitPropertiesMut {
    fn visit_properties_mut(
        &mut self,
        visitor: &mut dyn VisitMut<Value>,
    ) -> Result<(), ResolveError>;
}

impl VisitPropertiesMut for Value {
    fn visit_properties_mut(
        &mut self,
        visitor: &mut dyn VisitMut<Value>,
    ) -> Result<(), ResolveError> {
        let mut path = vec![];
        walk(self, &mut path, visitor)
    }
}

fn walk(
    value: &mut Value,
    path: &mut Vec<PathStep>,
    visitor: &mut dyn VisitMut<Value>,
) -> Result<(), ResolveError> {
    match value {
        Value::Object(object) => {
            for (key, child) in object.iter_mut() {
                path.push(PathStep::Key(key.clone()));
                let result = visit_then_walk(child, path, visitor);
                path.pop();
                result?;
            }
        }
        Value::Array(array) => {
            for (index, child) in array.iter_mut().enumerate() {
                path.push(PathStep::Index(index));
                let result = visit_then_walk(child, path, visitor);
                path.pop();
                result?;
            }
        }
        _ => {}
    }

    Ok(())
}

fn visit_then_walk(
    child: &mut Value,
    path: &mut Vec<PathStep>,
    visitor: &mut dyn VisitMut<Value>,
) -> Result<(), ResolveError> {
    visitor.visit_mut(path, child)?;
    walk(child, path, visitor)
}
