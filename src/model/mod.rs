use derive_new::new;
use serde::{Deserialize, Serialize};

use crate::database::*;
use crate::define_relation;
use crate::define_table;

pub use channel::*;
pub use timestamp::*;
pub use video::*;
pub use view::*;

mod channel;
mod timestamp;
mod video;
mod view;

/// An account identifier issued by the identity provider. Accounts themselves live outside this service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, new)]
#[serde(transparent)]
pub struct UserId(String);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for UserId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
