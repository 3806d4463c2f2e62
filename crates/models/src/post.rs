use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::{errors::ModelError, id};

/// Visibility flag; only `Active` posts are listed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum PostStatus {
    #[default]
    Active,
    Inactive,
}

impl PostStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostStatus::Active => "active",
            PostStatus::Inactive => "inactive",
        }
    }
}

impl fmt::Display for PostStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

impl FromStr for PostStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(PostStatus::Active),
            "inactive" => Ok(PostStatus::Inactive),
            other => Err(ModelError::Validation(format!("unknown status {other:?}"))),
        }
    }
}

/// A post row as returned by the remote table. The slug is the row key:
/// read from `$id`, written back out as `slug`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    #[serde(rename(serialize = "slug", deserialize = "$id"), alias = "slug")]
    pub slug: String,
    pub title: String,
    pub content: String,
    #[serde(rename = "featuredImage", default)]
    pub featured_image: Option<String>,
    pub status: PostStatus,
    #[serde(rename = "userId")]
    pub user_id: String,
    #[serde(rename = "$createdAt", default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(rename = "$updatedAt", default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Input for creating a post.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewPost {
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(default)]
    pub featured_image: Option<String>,
    #[serde(default)]
    pub status: PostStatus,
    pub user_id: String,
}

impl NewPost {
    pub fn validate(&self) -> Result<(), ModelError> {
        id::validate_id(&self.slug)
    }

    /// Column values sent as the row's `data`; the slug travels as the row id.
    pub fn row_data(&self) -> Value {
        json!({
            "title": self.title,
            "content": self.content,
            "featuredImage": self.featured_image,
            "status": self.status,
            "userId": self.user_id,
        })
    }
}

/// Partial update. `None` fields are left out of the request and keep
/// their stored value; the slug and owner cannot be changed.
///
/// `featured_image` distinguishes an absent field (`None`) from an
/// explicit `null` (`Some(None)`), which detaches the stored image key.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none", deserialize_with = "present")]
    pub featured_image: Option<Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<PostStatus>,
}

impl PostPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.content.is_none() && self.featured_image.is_none() && self.status.is_none()
    }

    pub fn clear_featured_image(mut self) -> Self {
        self.featured_image = Some(None);
        self
    }

    pub fn row_data(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| json!({}))
    }
}

// Only called when the key is present, so `null` becomes `Some(None)`.
fn present<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(de).map(Some)
}
