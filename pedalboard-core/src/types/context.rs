//! Playback context: tempo and meter with hierarchical override
//!
//! A base context is fully specified. A composable context points at a
//! parent and may override either field; anything left unset is read through
//! the parent chain at access time, so edits to the base show up in every
//! child that has not overridden that field.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::{ConfigurationError, ContextField};
use crate::types::time::{validate_tempo, ResolvedContext, TimeSignature};

#[derive(Debug, Default)]
struct Fields {
    /// `None` = not overridden, inherit from parent
    tempo: Option<u32>,
    time_signature: Option<TimeSignature>,
}

#[derive(Debug)]
struct Node {
    parent: Option<Context>,
    fields: RwLock<Fields>,
}

/// Shared, thread-safe handle to a context node. Clones see the same node.
#[derive(Debug, Clone)]
pub struct Context {
    node: Arc<Node>,
}

impl Context {
    /// Create a fully specified base context
    pub fn base(tempo: u32, time_signature: TimeSignature) -> Result<Self, ConfigurationError> {
        validate_tempo(tempo)?;
        time_signature.validate()?;
        Ok(Self::from_parts(None, Some(tempo), Some(time_signature)))
    }

    /// Derive a context that inherits every field it does not override.
    ///
    /// Without a parent all fields must be overridden, see [`Context::validate`].
    pub fn composable(
        parent: Option<&Context>,
        tempo: Option<u32>,
        time_signature: Option<TimeSignature>,
    ) -> Result<Self, ConfigurationError> {
        if let Some(tempo) = tempo {
            validate_tempo(tempo)?;
        }
        if let Some(signature) = time_signature {
            signature.validate()?;
        }
        Ok(Self::from_parts(parent.cloned(), tempo, time_signature))
    }

    /// Shorthand for a composable context inheriting everything from `parent`
    pub fn derive(parent: &Context) -> Self {
        Self::from_parts(Some(parent.clone()), None, None)
    }

    fn from_parts(
        parent: Option<Context>,
        tempo: Option<u32>,
        time_signature: Option<TimeSignature>,
    ) -> Self {
        Context {
            node: Arc::new(Node {
                parent,
                fields: RwLock::new(Fields {
                    tempo,
                    time_signature,
                }),
            }),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, Fields> {
        self.node.fields.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Fields> {
        self.node.fields.write().unwrap_or_else(|e| e.into_inner())
    }

    pub fn parent(&self) -> Option<&Context> {
        self.node.parent.as_ref()
    }

    /// Whether two handles point at the same context node
    pub fn same_as(&self, other: &Context) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    /// Tempo in BPM: own override, else the nearest ancestor's
    pub fn tempo(&self) -> Result<u32, ConfigurationError> {
        if let Some(tempo) = self.read().tempo {
            return Ok(tempo);
        }
        match &self.node.parent {
            Some(parent) => parent.tempo(),
            None => Err(ConfigurationError::UnresolvedContext {
                field: ContextField::Tempo,
            }),
        }
    }

    /// Time signature: own override, else the nearest ancestor's
    pub fn time_signature(&self) -> Result<TimeSignature, ConfigurationError> {
        if let Some(signature) = self.read().time_signature {
            return Ok(signature);
        }
        match &self.node.parent {
            Some(parent) => parent.time_signature(),
            None => Err(ConfigurationError::UnresolvedContext {
                field: ContextField::TimeSignature,
            }),
        }
    }

    pub fn overrides_tempo(&self) -> bool {
        self.read().tempo.is_some()
    }

    pub fn overrides_time_signature(&self) -> bool {
        self.read().time_signature.is_some()
    }

    /// Override the tempo on this node
    pub fn set_tempo(&self, tempo: u32) -> Result<(), ConfigurationError> {
        validate_tempo(tempo)?;
        self.write().tempo = Some(tempo);
        Ok(())
    }

    /// Override the time signature on this node
    pub fn set_time_signature(&self, signature: TimeSignature) -> Result<(), ConfigurationError> {
        signature.validate()?;
        self.write().time_signature = Some(signature);
        Ok(())
    }

    /// Drop the tempo override and read through to the parent again
    pub fn inherit_tempo(&self) {
        self.write().tempo = None;
    }

    /// Drop the time signature override and read through to the parent again
    pub fn inherit_time_signature(&self) {
        self.write().time_signature = None;
    }

    /// Every field must resolve somewhere along the chain
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.tempo()?;
        self.time_signature()?;
        Ok(())
    }

    /// Snapshot the current values
    pub fn resolve(&self) -> Result<ResolvedContext, ConfigurationError> {
        Ok(ResolvedContext::new(self.tempo()?, self.time_signature()?))
    }
}
