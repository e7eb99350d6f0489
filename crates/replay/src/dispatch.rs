//! Named input-event handler table.
//!
//! Replay playback re-invokes recorded events by name, so hosts register a
//! handler per event name with a fixed `(&[f64], InputSource)` signature.
//! The source argument is the replay sentinel: it tells a handler whether
//! the call originated from live input or from playback, so handlers can
//! skip re-recording replayed events or suppress side effects that only
//! make sense live.

use std::collections::HashMap;

use bevy::prelude::*;
use thiserror::Error;

/// Origin of a dispatched input event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource {
    Live,
    Replay,
}

/// Handler signature: positional arguments plus the origin sentinel.
pub type InputHandler = Box<dyn FnMut(&[f64], InputSource) + Send + Sync>;

#[derive(Debug, Error, PartialEq)]
pub enum DispatchError {
    #[error(
        "no input handler registered for {name:?}; register it on the \
         InputDispatcher before replaying"
    )]
    UnknownHandler { name: String },
}

/// Registry of named input handlers.
///
/// Unknown names are a reportable error, never a silent no-op.
#[derive(Resource, Default)]
pub struct InputDispatcher {
    handlers: HashMap<String, InputHandler>,
}

impl InputDispatcher {
    /// Register (or replace) the handler for `name`.
    pub fn register(
        &mut self,
        name: &str,
        handler: impl FnMut(&[f64], InputSource) + Send + Sync + 'static,
    ) {
        self.handlers.insert(name.to_string(), Box::new(handler));
    }

    /// Invoke the handler registered for `name`.
    pub fn dispatch(
        &mut self,
        name: &str,
        args: &[f64],
        source: InputSource,
    ) -> Result<(), DispatchError> {
        match self.handlers.get_mut(name) {
            Some(handler) => {
                handler(args, source);
                Ok(())
            }
            None => Err(DispatchError::UnknownHandler {
                name: name.to_string(),
            }),
        }
    }

    pub fn is_registered(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
