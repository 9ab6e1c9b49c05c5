use crate::model::Model;

/// A deserialized object that is not a usable model: a bundled label
/// encoder, a metadata dict, a bare list, and so on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpaqueObject {
    type_name: String,
}

impl OpaqueObject {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
        }
    }
}

impl Model for OpaqueObject {
    fn type_name(&self) -> &str {
        &self.type_name
    }
}
