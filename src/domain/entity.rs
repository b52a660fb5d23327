use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use super::id::EntityId;

// ============================================================================
// Entity Base Type
// ============================================================================
//
// Pairs an identity with a typed props bag. Two entities are equal iff their
// identities are equal, regardless of props. Fields that can legitimately be
// absent belong in the props as `Maybe<T>`/`Option<T>`; there is no
// sentinel-based existence check.
//
// ============================================================================

/// Base type for domain entities: identity plus mutable props.
#[derive(Debug, Clone)]
pub struct Entity<P> {
    id: EntityId,
    props: P,
}

impl<P> Entity<P> {
    /// Create a brand-new entity with a generated identity.
    pub fn new(props: P) -> Self {
        Self {
            id: EntityId::new(),
            props,
        }
    }

    /// Reconstitute an entity whose identity already exists (e.g. loaded
    /// from storage).
    pub fn with_id(props: P, id: EntityId) -> Self {
        Self { id, props }
    }

    pub fn id(&self) -> &EntityId {
        &self.id
    }

    pub fn props(&self) -> &P {
        &self.props
    }

    pub fn props_mut(&mut self) -> &mut P {
        &mut self.props
    }
}

impl<P: Serialize> Entity<P> {
    /// Serialize to a plain JSON object: the raw identity under `"id"` plus
    /// the props' own fields.
    ///
    /// Nested values follow their serde impls, so value objects flatten to
    /// their inner value, identities to their raw form, and nested entities
    /// recurse.
    pub fn to_value(&self) -> Result<Value> {
        let mut object = match serde_json::to_value(&self.props)
            .context("failed to serialize entity props")?
        {
            Value::Object(map) => map,
            other => {
                let mut map = serde_json::Map::new();
                map.insert("props".to_string(), other);
                map
            }
        };

        object.insert("id".to_string(), serde_json::to_value(&self.id)?);
        Ok(Value::Object(object))
    }
}

// Identity comparison only; props never participate.
impl<P> PartialEq for Entity<P> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<P> Eq for Entity<P> {}

// ============================================================================
// Tests
// ============================================================================
