//! Structural schema equality and content hashing.
//!
//! Two schemas are equal when they describe the same shape, regardless of
//! where they live or what they are titled. References resolve through the
//! component table of their own side, so schemas from two documents can be
//! compared directly.

use std::collections::HashSet;

use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use super::schema::{AdditionalProperties, Schema, SchemaRef};

type Schemas = IndexMap<String, SchemaRef>;

/// Compares schemas drawn from a left and a right component table.
pub struct SchemaComparator<'a> {
    left: &'a Schemas,
    right: &'a Schemas,
    visited: HashSet<(String, String)>,
}

impl<'a> SchemaComparator<'a> {
    pub fn new(left: &'a Schemas, right: &'a Schemas) -> Self {
        Self {
            left,
            right,
            visited: HashSet::new(),
        }
    }

    pub fn equal(&mut self, a: &SchemaRef, b: &SchemaRef) -> bool {
        if let (Some(left_name), Some(right_name)) = (a.ref_name(), b.ref_name()) {
            // revisited pair
            if !self
                .visited
                .insert((left_name.to_string(), right_name.to_string()))
            {
                return true;
            }
        }
        let (Some(sa), Some(sb)) = (a.resolve(self.left), b.resolve(self.right)) else {
            return a == b;
        };
        self.equal_schemas(sa, sb)
    }

    fn equal_schemas(&mut self, a: &Schema, b: &Schema) -> bool {
        if shallow(a) != shallow(b) {
            return false;
        }
        if a.properties.len() != b.properties.len() {
            return false;
        }
        for (name, left) in &a.properties {
            match b.properties.get(name) {
                Some(right) if self.equal(left, right) => {}
                _ => return false,
            }
        }
        self.equal_opt(a.items.as_ref(), b.items.as_ref())
            && self.equal_opt(a.not.as_ref(), b.not.as_ref())
            && self.equal_additional(
                a.additional_properties.as_ref(),
                b.additional_properties.as_ref(),
            )
            && self.equal_list(&a.all_of, &b.all_of)
            && self.equal_list(&a.any_of, &b.any_of)
            && self.equal_list(&a.one_of, &b.one_of)
    }

    fn equal_opt(&mut self, a: Option<&SchemaRef>, b: Option<&SchemaRef>) -> bool {
        match (a, b) {
            (None, None) => true,
            (Some(a), Some(b)) => self.equal(a, b),
            _ => false,
        }
    }

    fn equal_additional(
        &mut self,
        a: Option<&AdditionalProperties>,
        b: Option<&AdditionalProperties>,
    ) -> bool {
        match (a, b) {
            (Some(AdditionalProperties::Schema(a)), Some(AdditionalProperties::Schema(b))) => {
                self.equal(a, b)
            }
            (a, b) => a == b,
        }
    }

    fn equal_list(&mut self, a: &[SchemaRef], b: &[SchemaRef]) -> bool {
        a.len() == b.len() && a.iter().zip(b).all(|(x, y)| self.equal(x, y))
    }
}

/// Copy of a schema without its title and child slots, with order-free lists
/// sorted.
fn shallow(schema: &Schema) -> Schema {
    let mut copy = Schema {
        properties: IndexMap::new(),
        items: None,
        not: None,
        all_of: Vec::new(),
        any_of: Vec::new(),
        one_of: Vec::new(),
        title: None,
        ..schema.clone()
    };
    if matches!(copy.additional_properties, Some(AdditionalProperties::Schema(_))) {
        copy.additional_properties = None;
    }
    copy.schema_type.0.sort();
    copy.required.sort();
    copy
}

/// Equality of two slots sharing one component table.
pub fn schemas_equal(a: &SchemaRef, b: &SchemaRef, schemas: &Schemas) -> bool {
    SchemaComparator::new(schemas, schemas).equal(a, b)
}

/// First six hex characters of the SHA-256 of the slot's JSON form.
pub fn content_hash(slot: &SchemaRef) -> String {
    let bytes = serde_json::to_vec(slot).unwrap_or_default();
    let digest = Sha256::digest(&bytes);
    digest
        .iter()
        .take(3)
        .map(|b| format!("{b:02x}"))
        .collect()
}
