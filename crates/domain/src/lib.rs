//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod action;
mod action_path;
mod augmentation;
mod http_method;
mod quota;
mod service_secret;
mod template;

pub use action::{ActionDefinition, ActionKind, EmailActionDefinition, RequestActionDefinition};
pub use action_path::{ActionPath, value_at};
pub use augmentation::{AugmentationSet, ClientIdentity};
pub use http_method::HttpMethod;
pub use quota::{EmailQuotaPolicy, next_utc_midnight, start_of_utc_day};
pub use service_secret::{AuthenticationMethod, ServiceSecret, UrlPattern, patterns_select_url};
pub use template::{resolve_template, value_to_text};
