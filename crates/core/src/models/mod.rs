//! Domain models for articles, comments and profiles.
//!
//! These models are storage-agnostic and represent the canonical
//! form of data within the domain layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::pagination::Node;

// =============================================================================
// Identifiers
// =============================================================================

/// Macro to generate integer id newtypes with common functionality.
///
/// Generates:
/// - `Display` trait implementation
/// - `From<i64>` implementation
/// - `get()` accessor for the raw value
macro_rules! id_newtype {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(pub i64);

        impl $name {
            /// Get the raw database value.
            pub fn get(&self) -> i64 {
                self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl From<i64> for $name {
            fn from(id: i64) -> Self {
                Self(id)
            }
        }
    };
}

id_newtype!(
    /// Identifier of a registered user.
    UserId
);

id_newtype!(
    /// Identifier of an article.
    ArticleId
);

id_newtype!(
    /// Identifier of a comment.
    CommentId
);

// =============================================================================
// Profiles
// =============================================================================

/// Public profile of a user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub user_id: UserId,
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
}

// =============================================================================
// Articles
// =============================================================================

/// A published article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Article {
    pub id: ArticleId,
    /// URL-safe unique handle.
    pub slug: String,
    pub title: String,
    pub description: String,
    pub body: String,
    pub tags: Vec<String>,
    pub author_id: UserId,
    /// Creation instant; orders every article listing.
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node for Article {
    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// =============================================================================
// Comments
// =============================================================================

/// A comment attached to an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comment {
    pub id: CommentId,
    pub article_id: ArticleId,
    pub author_id: UserId,
    pub body: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Node for Comment {
    fn sort_key(&self) -> DateTime<Utc> {
        self.created_at
    }
}

// =============================================================================
// Enriched Views
// =============================================================================

/// A profile as seen by the current viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProfileView {
    pub username: String,
    pub bio: Option<String>,
    pub image: Option<String>,
    /// Whether the viewer follows this user. Always false for anonymous viewers.
    pub following: bool,
}

impl ProfileView {
    pub fn new(profile: Profile, following: bool) -> Self {
        Self {
            username: profile.username,
            bio: profile.bio,
            image: profile.image,
            following,
        }
    }
}

/// An article decorated with author and favorite information.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArticleView {
    pub article: Article,
    pub author: ProfileView,
    pub favorited: bool,
    pub favorites_count: i64,
}

/// A comment decorated with its author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommentView {
    pub comment: Comment,
    pub author: ProfileView,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn article(created_ms: i64) -> Article {
        let ts = DateTime::from_timestamp_millis(created_ms).unwrap();
        Article {
            id: ArticleId(1),
            slug: "hello".into(),
            title: "Hello".into(),
            description: String::new(),
            body: String::new(),
            tags: vec![],
            author_id: UserId(7),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn article_cursor_is_creation_millis() {
        let a = article(1_700_000_000_000);
        assert_eq!(a.cursor().encode(), "1700000000000");
    }

    #[test]
    fn ids_serialize_as_plain_numbers() {
        assert_eq!(serde_json::to_string(&UserId(42)).unwrap(), "42");
        assert_eq!(ArticleId::from(5).to_string(), "5");
    }

    #[test]
    fn profile_view_keeps_public_fields() {
        let profile = Profile {
            user_id: UserId(1),
            username: "jake".into(),
            bio: Some("I work at statefarm".into()),
            image: None,
        };
        let view = ProfileView::new(profile, true);
        assert_eq!(view.username, "jake");
        assert!(view.following);
    }
}
