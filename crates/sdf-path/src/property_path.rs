use std::fmt::{self, Display, Formatter};

use snafu::ensure;

use crate::error::{EmptyPropertyNameSnafu, InvalidIdentifierSnafu, PathError};
use crate::prim_path::PrimPath;
use crate::segment::is_valid_identifier;

/// An absolute path identifying a property on a prim: `/A/B.prop` or
/// `/A/B.prop.field`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct PropertyPath {
    pub prim_path: PrimPath,
    pub prop_name: String,
    pub field: Option<String>,
}

impl PropertyPath {
    pub fn new(
        prim_path: PrimPath,
        prop_name: impl Into<String>,
        field: Option<String>,
    ) -> Result<Self, PathError> {
        let prop_name = prop_name.into();
        ensure!(!prop_name.is_empty(), EmptyPropertyNameSnafu { path: format!("{prim_path}.{prop_name}") });
        for segment in prop_name.split(':') {
            ensure!(
                is_valid_identifier(segment),
                InvalidIdentifierSnafu { ident: segment.to_owned(), path: format!("{prim_path}.{prop_name}") }
            );
        }
        if let Some(field) = &field {
            ensure!(
                is_valid_identifier(field),
                InvalidIdentifierSnafu { ident: field.clone(), path: format!("{prim_path}.{prop_name}.{field}") }
            );
        }
        Ok(Self { prim_path, prop_name, field })
    }

    /// The `name` or `name.field` key used to look this property up in a
    /// prim's property map (§3.4).
    pub fn key(&self) -> String {
        match &self.field {
            Some(field) => format!("{}.{field}", self.prop_name),
            None => self.prop_name.clone(),
        }
    }

    pub fn remap(&self, src_root: &PrimPath, dst_root: &PrimPath) -> Self {
        Self {
            prim_path: self.prim_path.remap(src_root, dst_root),
            prop_name: self.prop_name.clone(),
            field: self.field.clone(),
        }
    }
}

impl Display for PropertyPath {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.prim_path, self.prop_name)?;
        if let Some(field) = &self.field {
            write!(f, ".{field}")?;
        }
        Ok(())
    }
}
