//! Records exchanged with the reading API

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::HashMap;

use crate::session::Token;

/// Signed-in user identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub books_read: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub currently_reading: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Rating {
    #[serde(default, deserialize_with = "number_or_string")]
    pub average: f64,
    #[serde(default, deserialize_with = "count_or_string")]
    pub count: u32,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookDetails {
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub publisher: Option<String>,
    #[serde(default)]
    pub published_year: Option<i32>,
    #[serde(default)]
    pub page_count: Option<u32>,
    #[serde(default)]
    pub language: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub rating: Option<Rating>,
    #[serde(rename = "ISBN", default)]
    pub isbn: Option<String>,
    /// Category ids
    #[serde(default)]
    pub category: Vec<String>,
    #[serde(default)]
    pub details: Option<BookDetails>,
}

impl Book {
    pub fn publisher(&self) -> Option<&str> {
        self.details.as_ref().and_then(|d| d.publisher.as_deref())
    }

    /// Case-insensitive match against title or publisher
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.title.to_lowercase().contains(&query)
            || self
                .publisher()
                .map(|p| p.to_lowercase().contains(&query))
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorName {
    #[serde(default)]
    pub pen_name: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SocialLinks {
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub twitter: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(rename = "_id", alias = "id")]
    pub id: String,
    #[serde(default)]
    pub name: AuthorName,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub biography: Option<String>,
    #[serde(default)]
    pub social_links: Option<SocialLinks>,
    /// Ids of the author's books
    #[serde(default)]
    pub books: Vec<String>,
    #[serde(default)]
    pub book_count: Option<u32>,
}

impl Author {
    /// Case-insensitive match against pen name or biography
    pub fn matches(&self, query: &str) -> bool {
        let query = query.to_lowercase();
        self.name.pen_name.to_lowercase().contains(&query)
            || self
                .biography
                .as_deref()
                .map(|b| b.to_lowercase().contains(&query))
                .unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadingProgress {
    #[serde(default)]
    pub book: Option<Book>,
    /// Percent complete, 0-100
    #[serde(default)]
    pub progress: Option<f64>,
    #[serde(default)]
    pub current_page: Option<u32>,
    #[serde(default)]
    pub total_pages: Option<u32>,
}

/// Login request body
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub phone: String,
    pub password: String,
}

/// Registration request body
#[derive(Debug, Clone, Serialize)]
pub struct NewUser {
    pub username: String,
    pub phone: String,
    pub password: String,
}

/// Response to login and register
#[derive(Debug, Clone, Deserialize)]
pub struct AuthResponse {
    pub token: Token,
    pub user: User,
}

/// Partial profile update; unset fields are left alone by the server
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

impl UserPatch {
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.phone.is_none() && self.avatar.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordChange {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressUpdate {
    pub current_page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ReadingListEntry<'a> {
    pub book_id: &'a str,
}

/// An author with the books it references resolved
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuthorDetails {
    pub author: Author,
    pub books: Vec<Book>,
}

/// Book list plus the categories needed to label it
#[derive(Debug, Clone, Default, Serialize)]
pub struct Catalog {
    pub books: Vec<Book>,
    pub categories: Vec<Category>,
}

impl Catalog {
    /// Category name for an id, or the id itself when unknown
    pub fn category_name<'a>(&'a self, id: &'a str) -> &'a str {
        self.categories
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.name.as_str())
            .unwrap_or(id)
    }

    pub fn category_lookup(&self) -> HashMap<&str, &str> {
        self.categories
            .iter()
            .map(|c| (c.id.as_str(), c.name.as_str()))
            .collect()
    }

    pub fn search(&self, query: &str) -> Vec<&Book> {
        self.books.iter().filter(|b| b.matches(query)).collect()
    }
}

/// Data behind the home screen
#[derive(Debug, Clone, Default, Serialize)]
pub struct HomeFeed {
    pub recent_books: Vec<Book>,
    pub progress: Option<ReadingProgress>,
}

/// Authors whose pen name or biography contain `query`
pub fn filter_authors<'a>(authors: &'a [Author], query: &str) -> Vec<&'a Author> {
    authors.iter().filter(|a| a.matches(query)).collect()
}

fn number_or_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(f64),
        Text(String),
        Null(()),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(n) => Ok(n),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Raw::Null(()) => Ok(0.0),
    }
}

fn count_or_string<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Integer(u32),
        Number(f64),
        Text(String),
        Null(()),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Integer(n) => Ok(n),
        Raw::Number(n) if n >= 0.0 => Ok(n as u32),
        Raw::Number(n) => Err(serde::de::Error::custom(format!("negative count {}", n))),
        Raw::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
        Raw::Null(()) => Ok(0),
    }
}
