use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const MAX_KEY_LENGTH: usize = 512;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KvNamespace {
    Bookmarks,
    Settings,
}

impl KvNamespace {
    #[must_use]
    pub const fn prefix(self) -> &'static str {
        match self {
            Self::Bookmarks => "bookmarks",
            Self::Settings => "settings",
        }
    }
}

/// Namespaced, validated storage key. Raw form is `namespace:key`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct KvKey {
    namespace: KvNamespace,
    key: String,
}

impl KvKey {
    pub fn new(namespace: KvNamespace, key: impl Into<String>) -> Result<Self, KvError> {
        let key = key.into();
        Self::validate(&key)?;
        Ok(Self { namespace, key })
    }

    #[must_use]
    pub fn raw(&self) -> String {
        format!("{}:{}", self.namespace.prefix(), self.key)
    }

    #[must_use]
    pub const fn namespace(&self) -> KvNamespace {
        self.namespace
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    fn validate(key: &str) -> Result<(), KvError> {
        if key.trim().is_empty() {
            return Err(KvError::InvalidKey {
                key: key.to_string(),
                reason: "key cannot be empty".to_string(),
            });
        }

        if key.len() > MAX_KEY_LENGTH {
            return Err(KvError::InvalidKey {
                key: key.chars().take(50).collect(),
                reason: format!("key exceeds maximum length of {MAX_KEY_LENGTH} bytes"),
            });
        }

        if key.chars().any(|c| c.is_control()) {
            return Err(KvError::InvalidKey {
                key: key.to_string(),
                reason: "key contains control characters".to_string(),
            });
        }

        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum KvOperation {
    Get {
        key: KvKey,
    },
    /// Upsert; overwrites any existing value under the key.
    Set {
        key: KvKey,
        value: Vec<u8>,
    },
    /// Deleting an absent key reports `Deleted { existed: false }`.
    Delete {
        key: KvKey,
    },
    List {
        namespace: KvNamespace,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KvEntry {
    pub key: String,
    pub value: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum KvOutput {
    Value(Option<Vec<u8>>),
    Written,
    Deleted { existed: bool },
    Entries(Vec<KvEntry>),
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum KvError {
    #[error("invalid key '{key}': {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("storage error: {message}")]
    Storage { message: String },
}

impl KvError {
    #[must_use]
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
        }
    }
}

pub type KvResult = Result<KvOutput, KvError>;

impl Operation for KvOperation {
    type Output = KvResult;
}

pub struct KeyValue<Ev> {
    context: CapabilityContext<KvOperation, Ev>,
}

impl<Ev> Capability<Ev> for KeyValue<Ev> {
    type Operation = KvOperation;
    type MappedSelf<MappedEv> = KeyValue<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        KeyValue::new(self.context.map_event(f))
    }
}

impl<Ev> KeyValue<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<KvOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn run<F>(&self, operation: KvOperation, make_event: F)
    where
        F: FnOnce(KvResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_and_whitespace_keys_are_rejected() {
        assert!(KvKey::new(KvNamespace::Bookmarks, "").is_err());
        assert!(KvKey::new(KvNamespace::Bookmarks, "   ").is_err());
    }

    #[test]
    fn control_characters_are_rejected() {
        assert!(KvKey::new(KvNamespace::Bookmarks, "key\0value").is_err());
        assert!(KvKey::new(KvNamespace::Bookmarks, "key\nvalue").is_err());
    }

    #[test]
    fn overlong_keys_are_rejected() {
        let long = "a".repeat(MAX_KEY_LENGTH + 1);
        assert!(KvKey::new(KvNamespace::Bookmarks, long).is_err());
    }

    #[test]
    fn raw_form_carries_the_namespace_prefix() {
        let key = KvKey::new(KvNamespace::Bookmarks, "report-1").unwrap();
        assert_eq!(key.raw(), "bookmarks:report-1");
    }

    #[test]
    fn operations_round_trip_through_serde() {
        let op = KvOperation::Set {
            key: KvKey::new(KvNamespace::Settings, "push").unwrap(),
            value: vec![1, 2, 3],
        };
        let json = serde_json::to_string(&op).unwrap();
        let back: KvOperation = serde_json::from_str(&json).unwrap();
        assert_eq!(op, back);
    }
}
