//! visitor pattern helpers
mod visit_properties;
pub use visit_properties::VisitPropertiesMut;

use crate::error::ResolveError;
use crate::json_path::PathStep;

/// Visitor that visits its subjects mutably
///
/// `path` is the location of the subject relative to the document root.
pub trait VisitMut<T> {
    fn visit_mut(&mut self, path: &[PathStep], value: &mut T) -> Result<(), ResolveError>;
}

// blanket impl for FnMut
impl<T, F> VisitMut<T> for F
where
    F: FnMut(&[PathStep], &mut T) -> Result<(), ResolveError>,
{
    fn visit_mut(&mut self, path: &[PathStep], value: &mut T) -> Result<(), ResolveError> {
        self(path, value)
    }
}
