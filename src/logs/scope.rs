use crate::logs::format::Origin;
use std::net::IpAddr;
use std::sync::RwLock;

/// Source of the actor name and client address for the record being written
pub trait RequestScope: Send + Sync {
    /// Display name of the current actor
    fn actor(&self) -> Option<String>;

    /// Network address of the client that triggered the record
    fn client_ip(&self) -> Option<IpAddr>;

    fn origin(&self) -> Origin {
        Origin {
            actor: self.actor(),
            client_ip: self.client_ip(),
        }
    }
}

/// Scope with no actor and no client, e.g. a background process
#[derive(Debug, Clone, Copy, Default)]
pub struct AnonymousScope;

impl RequestScope for AnonymousScope {
    fn actor(&self) -> Option<String> {
        None
    }

    fn client_ip(&self) -> Option<IpAddr> {
        None
    }
}

/// Scope whose origin can be swapped while sinks hold on to it
#[derive(Debug, Default)]
pub struct SharedScope {
    origin: RwLock<Origin>,
}

impl SharedScope {
    pub fn new(origin: Origin) -> Self {
        Self {
            origin: RwLock::new(origin),
        }
    }

    /// Replace the current origin
    pub fn set(&self, origin: Origin) {
        match self.origin.write() {
            Ok(mut guard) => *guard = origin,
            Err(poisoned) => *poisoned.into_inner() = origin,
        }
    }

    fn current(&self) -> Origin {
        match self.origin.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl RequestScope for SharedScope {
    fn actor(&self) -> Option<String> {
        self.current().actor
    }

    fn client_ip(&self) -> Option<IpAddr> {
        self.current().client_ip
    }

    fn origin(&self) -> Origin {
        self.current()
    }
}
