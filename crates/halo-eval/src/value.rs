//! Runtime values.

use crate::heap::ObjRef;

/// A halo runtime value.
///
/// Scalars are stored inline; everything else lives in the interpreter's
/// [`Heap`](crate::heap::Heap) and is referred to by handle. Copying a
/// `Value` never copies an object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Null,
    Int(i64),
    Float(f64),
    Bool(bool),
    Obj(ObjRef),
}

impl Value {
    /// The object handle, if this is a heap value.
    pub fn as_obj(self) -> Option<ObjRef> {
        match self {
            Value::Obj(r) => Some(r),
            _ => None,
        }
    }

    /// Type name for scalars; heap values are named by their object.
    pub fn scalar_type_name(self) -> Option<&'static str> {
        match self {
            Value::Null => Some("null"),
            Value::Int(_) => Some("int"),
            Value::Float(_) => Some("float"),
            Value::Bool(_) => Some("bool"),
            Value::Obj(_) => None,
        }
    }
}
