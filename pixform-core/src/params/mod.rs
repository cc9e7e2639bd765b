pub(crate) mod bind;
pub(crate) mod document;
pub(crate) mod schema;
