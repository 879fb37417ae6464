use chrono::{DateTime, NaiveDateTime, Utc};
use std::fmt;

use super::StoreError;

/// Fixed classification of a memo.
///
/// Values the store hands back that are not one of the known categories are
/// kept verbatim in `Unrecognized` so they survive a round trip.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Category {
    #[default]
    Personal,
    Work,
    Study,
    Idea,
    Other,
    Unrecognized(String),
}

impl Category {
    /// Known categories in display order.
    pub const ALL: [Category; 5] = [
        Category::Personal,
        Category::Work,
        Category::Study,
        Category::Idea,
        Category::Other,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Category::Personal => "personal",
            Category::Work => "work",
            Category::Study => "study",
            Category::Idea => "idea",
            Category::Other => "other",
            Category::Unrecognized(raw) => raw,
        }
    }

    /// Human readable label; unrecognized values are shown as stored.
    pub fn label(&self) -> &str {
        match self {
            Category::Personal => "Personal",
            Category::Work => "Work",
            Category::Study => "Study",
            Category::Idea => "Idea",
            Category::Other => "Other",
            Category::Unrecognized(raw) => raw,
        }
    }

    /// Next known category, wrapping around. Unrecognized values restart at the first one.
    pub fn next(&self) -> Category {
        let idx = Self::ALL.iter().position(|c| c == self);
        match idx {
            Some(i) => Self::ALL[(i + 1) % Self::ALL.len()].clone(),
            None => Self::ALL[0].clone(),
        }
    }

    pub fn prev(&self) -> Category {
        let idx = Self::ALL.iter().position(|c| c == self);
        match idx {
            Some(0) | None => Self::ALL[Self::ALL.len() - 1].clone(),
            Some(i) => Self::ALL[i - 1].clone(),
        }
    }
}

impl From<String> for Category {
    fn from(value: String) -> Self {
        match value.as_str() {
            "personal" => Category::Personal,
            "work" => Category::Work,
            "study" => Category::Study,
            "idea" => Category::Idea,
            "other" => Category::Other,
            _ => Category::Unrecognized(value),
        }
    }
}

impl From<&str> for Category {
    fn from(value: &str) -> Self {
        Category::from(value.to_string())
    }
}

impl From<Category> for String {
    fn from(value: Category) -> Self {
        match value {
            Category::Unrecognized(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Memo {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Editable subset of a memo, used as input to create and update.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct MemoFormData {
    pub title: String,
    pub content: String,
    pub category: Category,
    pub tags: Option<Vec<String>>,
}

/// Column values written by insert and update.
#[derive(Debug, Clone, Copy)]
pub struct MemoFields<'a> {
    pub title: &'a str,
    pub content: &'a str,
    pub category: &'a str,
    pub tags: &'a [String],
}

impl<'a> From<&'a MemoFormData> for MemoFields<'a> {
    fn from(form: &'a MemoFormData) -> Self {
        MemoFields {
            title: &form.title,
            content: &form.content,
            category: form.category.as_str(),
            tags: form.tags.as_deref().unwrap_or(&[]),
        }
    }
}

/// A row of the `memos` relation exactly as the store returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoRow {
    pub id: String,
    pub title: String,
    pub content: String,
    pub category: String,
    /// JSON array of strings, or NULL.
    pub tags: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl TryFrom<MemoRow> for Memo {
    type Error = StoreError;

    fn try_from(row: MemoRow) -> Result<Self, Self::Error> {
        let tags = match row.tags.as_deref() {
            None => Vec::new(),
            Some(raw) => serde_json::from_str::<Option<Vec<String>>>(raw)
                .map_err(|e| StoreError::Malformed(format!("tags of {}: {}", row.id, e)))?
                .unwrap_or_default(),
        };

        Ok(Memo {
            created_at: parse_timestamp(&row.id, &row.created_at)?,
            updated_at: parse_timestamp(&row.id, &row.updated_at)?,
            category: Category::from(row.category),
            id: row.id,
            title: row.title,
            content: row.content,
            tags,
        })
    }
}

/// RFC3339, or SQLite's own `YYYY-MM-DD HH:MM:SS` text form read as UTC.
fn parse_timestamp(id: &str, raw: &str) -> Result<DateTime<Utc>, StoreError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .or_else(|e| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S%.f")
                .map(|naive| naive.and_utc())
                .map_err(|_| e)
        })
        .map_err(|e| StoreError::Malformed(format!("timestamp {:?} of {}: {}", raw, id, e)))
}
