mod http;
mod kv;
mod push;

pub use self::http::{Http, HttpError, HttpMethod, HttpRequest, HttpResponse, HttpResult};
pub use self::kv::{
    KeyValue, KvEntry, KvError, KvKey, KvNamespace, KvOperation, KvOutput, KvResult,
};
pub use self::push::{Push, PushError, PushOperation, PushOutput, PushResult};

pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub render: Render<Event>,
    pub http: Http<Event>,
    pub kv: KeyValue<Event>,
    pub push: Push<Event>,
}
