/// An error while building a schema
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum BuildError {
    #[error("'{name}' is not a valid name for type '{type_name}'")]
    InvalidName { type_name: String, name: String },

    #[error("'{0}' is not a valid type name")]
    InvalidTypeName(String),

    #[error("type '{type_name}' declares the field '{field_name}' more than once")]
    DuplicateField {
        type_name: String,
        field_name: String,
    },
}
