use snafu::Snafu;

/// Errors raised when parsing text into a [`crate::Path`].
///
/// Thrown synchronously by [`crate::Path::parse`]; never produced by
/// [`crate::Path::remap`], which is total on already-valid paths.
#[derive(Clone, Debug, Eq, PartialEq, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum PathError {
    #[snafu(display("path {:?} does not start with '/'", path))]
    NotAbsolute { path: String },

    #[snafu(display("empty identifier in path {:?}", path))]
    EmptyIdentifier { path: String },

    #[snafu(display("invalid identifier {:?} in path {:?}", ident, path))]
    InvalidIdentifier { ident: String, path: String },

    #[snafu(display("unterminated variant selection in path {:?}", path))]
    UnterminatedVariantSelection { path: String },

    #[snafu(display("empty property name in path {:?}", path))]
    EmptyPropertyName { path: String },
}
