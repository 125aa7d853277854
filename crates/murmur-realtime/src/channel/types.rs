//! Channel naming.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Typed channel identifiers.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id")]
pub enum ChannelType {
    /// Private per-user channel carrying every event addressed to that user.
    User(Uuid),
}

impl ChannelType {
    /// Converts back to a channel string.
    pub fn to_channel_string(&self) -> String {
        match self {
            ChannelType::User(id) => format!("user:{id}"),
        }
    }

    /// The canonical private channel name for a user.
    pub fn user_channel(user_id: Uuid) -> String {
        ChannelType::User(user_id).to_channel_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn user_channel_uses_hyphenated_id() {
        let id = Uuid::new_v4();
        let name = ChannelType::user_channel(id);
        assert_eq!(name, format!("user:{}", id.hyphenated()));
        assert_eq!(name, ChannelType::User(id).to_channel_string());
    }
}
