//! Local method dispatch table
//!
//! A closed registry from method name to handler, built once at startup
//! and immutable afterwards. Every request task reads it concurrently
//! without synchronization.

use std::collections::HashMap;

use serde_json::Value;

use crate::error::ProxyResult;
use crate::rate::RateReader;

pub type Handler = Box<dyn Fn(&[Value]) -> ProxyResult<Value> + Send + Sync>;

pub struct Registry {
    handlers: HashMap<&'static str, Handler>,
}

impl Registry {
    /// Builds the registry with the built-in method set.
    pub fn builtin(rate: RateReader) -> Self {
        let mut handlers: HashMap<&'static str, Handler> = HashMap::new();

        // blockPerSecond takes no parameters; extras are ignored.
        handlers.insert(
            "blockPerSecond",
            Box::new(move |_params| Ok(Value::from(rate.get()))),
        );

        Self { handlers }
    }

    pub fn get(&self, method: &str) -> Option<&Handler> {
        self.handlers.get(method)
    }
}
