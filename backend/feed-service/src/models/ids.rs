//! Typed identities for users, posts and comments
//!
//! Each identity wraps a UUID and is compared by value. They serialize as the
//! bare UUID string so the wire shape stays `"_id": "<uuid>"`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
        )]
        #[serde(transparent)]
        #[sqlx(transparent)]
        pub struct $name(pub Uuid);

        impl $name {
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            pub fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl From<Uuid> for $name {
            fn from(id: Uuid) -> Self {
                Self(id)
            }
        }

        impl FromStr for $name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Uuid::parse_str(s.trim()).map(Self)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

define_id!(
    /// Identity of a registered account
    UserId
);
define_id!(
    /// Identity of a post aggregate
    PostId
);
define_id!(
    /// Identity of a comment, unique within its parent post
    CommentId
);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_compare_by_value() {
        let raw = Uuid::new_v4();
        assert_eq!(UserId(raw), UserId::from(raw));
        assert_ne!(UserId::new(), UserId::new());
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!("not-an-id".parse::<PostId>().is_err());
        assert!("".parse::<CommentId>().is_err());

        let id = PostId::new();
        assert_eq!(id.to_string().parse::<PostId>().unwrap(), id);
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = UserId::new();
        let json = serde_json::to_value(id).unwrap();
        assert_eq!(json, serde_json::Value::String(id.to_string()));
    }
}
