use crux_core::capability::{Capability, CapabilityContext, Operation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::push::PushSubscription;

/// Platform side of the push channel: the browser's push manager, owned
/// by the shell. Inbound pushes never arrive here; the service-worker
/// shell handles those with the pure functions in [`crate::push`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "data", rename_all = "snake_case")]
pub enum PushOperation {
    GetSubscription,
    Subscribe { application_server_key: String },
    Unsubscribe,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum PushOutput {
    Subscription(Option<PushSubscription>),
    Unsubscribed { existed: bool },
}

#[derive(Debug, Clone, Error, Serialize, Deserialize, PartialEq, Eq)]
pub enum PushError {
    #[error("push notifications not available on this platform")]
    NotAvailable,

    #[error("permission denied by user")]
    PermissionDenied,

    #[error("platform error: {message}")]
    Platform { message: String },
}

impl PushError {
    #[must_use]
    pub fn platform(message: impl Into<String>) -> Self {
        Self::Platform {
            message: message.into(),
        }
    }

    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::NotAvailable => "Push notifications are not supported on this device.".into(),
            Self::PermissionDenied => "Notification permission was denied.".into(),
            Self::Platform { message } => message.clone(),
        }
    }
}

pub type PushResult = Result<PushOutput, PushError>;

impl Operation for PushOperation {
    type Output = PushResult;
}

pub struct Push<Ev> {
    context: CapabilityContext<PushOperation, Ev>,
}

impl<Ev> Capability<Ev> for Push<Ev> {
    type Operation = PushOperation;
    type MappedSelf<MappedEv> = Push<MappedEv>;

    fn map_event<F, NewEv>(&self, f: F) -> Self::MappedSelf<NewEv>
    where
        F: Fn(NewEv) -> Ev + Send + Sync + 'static,
        Ev: 'static,
        NewEv: 'static + Send,
    {
        Push::new(self.context.map_event(f))
    }
}

impl<Ev> Push<Ev>
where
    Ev: 'static,
{
    pub fn new(context: CapabilityContext<PushOperation, Ev>) -> Self {
        Self { context }
    }

    pub fn get_subscription<F>(&self, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + 'static,
    {
        self.request(PushOperation::GetSubscription, make_event);
    }

    pub fn subscribe<F>(&self, application_server_key: String, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + 'static,
    {
        self.request(
            PushOperation::Subscribe {
                application_server_key,
            },
            make_event,
        );
    }

    pub fn unsubscribe<F>(&self, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + 'static,
    {
        self.request(PushOperation::Unsubscribe, make_event);
    }

    fn request<F>(&self, operation: PushOperation, make_event: F)
    where
        F: FnOnce(PushResult) -> Ev + Send + 'static,
    {
        let context = self.context.clone();
        self.context.spawn(async move {
            let result = context.request_from_shell(operation).await;
            context.update_app(make_event(result));
        });
    }
}
