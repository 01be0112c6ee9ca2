// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The type catalogue describes structured types field by field. The codecs look types up by
//! name, data type id or binary encoding id to forward extension objects between formats, and
//! fall back to opaque forwarding when a type is not in the catalogue.

use std::{collections::HashMap, sync::Arc};

use parking_lot::RwLockReadGuard;

use crate::{
    sync::RwLock,
    types::{
        builtin_kind::BuiltInKind,
        error::{EncodingError, EncodingResult},
        node_id::NodeId,
    },
};

mod standard;

/// The kind of a field, either a built-in kind or a structured type from the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    BuiltIn(BuiltInKind),
    Structure(&'static str),
}

/// One field of a structured type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescription {
    pub name: &'static str,
    pub kind: FieldKind,
    /// -1 for a scalar, 1 for an array, 2 or more for a matrix
    pub value_rank: i32,
}

impl FieldDescription {
    pub fn scalar(name: &'static str, kind: BuiltInKind) -> Self {
        Self {
            name,
            kind: FieldKind::BuiltIn(kind),
            value_rank: -1,
        }
    }

    pub fn array(name: &'static str, kind: BuiltInKind) -> Self {
        Self {
            name,
            kind: FieldKind::BuiltIn(kind),
            value_rank: 1,
        }
    }

    pub fn matrix(name: &'static str, kind: BuiltInKind, value_rank: i32) -> Self {
        Self {
            name,
            kind: FieldKind::BuiltIn(kind),
            value_rank,
        }
    }

    pub fn structure(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Structure(type_name),
            value_rank: -1,
        }
    }

    pub fn structure_array(name: &'static str, type_name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Structure(type_name),
            value_rank: 1,
        }
    }
}

/// The layout of a structured type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeDescription {
    pub name: &'static str,
    pub data_type_id: NodeId,
    /// The node id of the default binary encoding, which is the type id of an extension object
    /// holding the type
    pub encoding_id: NodeId,
    pub fields: Vec<FieldDescription>,
}

/// A set of type descriptions indexed by name, data type id and encoding id.
#[derive(Debug, Default)]
pub struct TypeCatalogue {
    by_name: HashMap<&'static str, Arc<TypeDescription>>,
    by_data_type_id: HashMap<NodeId, Arc<TypeDescription>>,
    by_encoding_id: HashMap<NodeId, Arc<TypeDescription>>,
}

lazy_static! {
    static ref GLOBAL_CATALOGUE: RwLock<TypeCatalogue> = RwLock::new(TypeCatalogue::standard());
}

impl TypeCatalogue {
    pub fn new() -> TypeCatalogue {
        TypeCatalogue::default()
    }

    /// A catalogue holding the standard structured types the codec knows about
    pub fn standard() -> TypeCatalogue {
        let mut catalogue = TypeCatalogue::new();
        for description in standard::descriptions() {
            catalogue.register(description);
        }
        catalogue
    }

    /// The process wide catalogue used by the codecs
    pub fn global() -> RwLockReadGuard<'static, TypeCatalogue> {
        trace_read_lock!(GLOBAL_CATALOGUE)
    }

    /// Adds a type to the process wide catalogue
    pub fn register_global(description: TypeDescription) {
        trace_write_lock!(GLOBAL_CATALOGUE).register(description);
    }

    /// Adds a type, replacing any type registered under the same name or ids
    pub fn register(&mut self, description: TypeDescription) {
        debug!(
            "Registering type {} data type {} encoding {}",
            description.name, description.data_type_id, description.encoding_id
        );
        let description = Arc::new(description);
        self.by_name.insert(description.name, description.clone());
        self.by_data_type_id
            .insert(description.data_type_id.clone(), description.clone());
        self.by_encoding_id
            .insert(description.encoding_id.clone(), description);
    }

    pub fn by_name(&self, name: &str) -> Option<Arc<TypeDescription>> {
        self.by_name.get(name).cloned()
    }

    pub fn by_data_type_id(&self, data_type_id: &NodeId) -> Option<Arc<TypeDescription>> {
        self.by_data_type_id.get(data_type_id).cloned()
    }

    pub fn by_encoding_id(&self, encoding_id: &NodeId) -> Option<Arc<TypeDescription>> {
        self.by_encoding_id.get(encoding_id).cloned()
    }

    /// Finds the type an extension object type id refers to, which may be either the encoding
    /// id or the data type id
    pub fn by_type_id(&self, type_id: &NodeId) -> Option<Arc<TypeDescription>> {
        self.by_encoding_id(type_id)
            .or_else(|| self.by_data_type_id(type_id))
    }

    /// Like `by_name` but a missing type is an `UnknownType` error
    pub fn resolve(&self, name: &str) -> EncodingResult<Arc<TypeDescription>> {
        self.by_name(name).ok_or_else(|| {
            error!("Type {} is not in the type catalogue", name);
            EncodingError::UnknownType(name.to_string())
        })
    }

    pub fn len(&self) -> usize {
        self.by_name.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_name.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::node_ids::{DataTypeId, ObjectId};

    #[test]
    fn standard_types_indexed() {
        let catalogue = TypeCatalogue::standard();
        assert_eq!(catalogue.len(), 5);
        let argument = catalogue.by_name("Argument").unwrap();
        assert_eq!(argument.data_type_id, NodeId::from(DataTypeId::Argument));
        assert_eq!(
            argument.encoding_id,
            NodeId::from(ObjectId::Argument_Encoding_DefaultBinary)
        );
        assert_eq!(argument.fields.len(), 5);
        assert_eq!(
            catalogue
                .by_type_id(&ObjectId::StatusResult_Encoding_DefaultBinary.into())
                .unwrap()
                .name,
            "StatusResult"
        );
        assert_eq!(
            catalogue.by_type_id(&DataTypeId::Range.into()).unwrap().name,
            "Range"
        );
    }

    #[test]
    fn unknown_type() {
        let catalogue = TypeCatalogue::new();
        assert!(catalogue.is_empty());
        assert!(catalogue.by_encoding_id(&NodeId::new(2, 1000u32)).is_none());
        assert!(matches!(
            catalogue.resolve("Pump"),
            Err(EncodingError::UnknownType(name)) if name == "Pump"
        ));
    }

    #[test]
    fn register_global_type() {
        TypeCatalogue::register_global(TypeDescription {
            name: "CatalogueTestPoint",
            data_type_id: NodeId::new(7, 1u32),
            encoding_id: NodeId::new(7, 2u32),
            fields: vec![
                FieldDescription::scalar("X", BuiltInKind::Double),
                FieldDescription::scalar("Y", BuiltInKind::Double),
            ],
        });
        let global = TypeCatalogue::global();
        assert!(global.by_name("CatalogueTestPoint").is_some());
        assert!(global.by_name("Argument").is_some());
    }
}
