//! Authenticated REST client for the reading API

use futures_util::future::join_all;
use reqwest::{Method, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use super::models::{
    Author, AuthorDetails, AuthResponse, Book, Catalog, Category, Credentials, HomeFeed, NewUser,
    PasswordChange, ProgressUpdate, ReadingListEntry, ReadingProgress, User, UserPatch,
};
use crate::config::ApiConfig;
use crate::error::{Error, Result};
use crate::session::{SessionStore, Token};

/// Which credential a request carries
#[derive(Clone, Copy)]
enum Auth<'a> {
    /// Whatever token the session store holds at call time
    Stored,
    /// A specific token, bypassing the store
    Explicit(&'a Token),
}

/// Error payload the server sends with 4xx/5xx responses
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Single point of outbound network access.
///
/// The bearer token is read from the [`SessionStore`] on every request and
/// never cached here, so a token written by a login is used by the very next
/// call. The client never writes to the store.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: reqwest::Client,
    base_url: String,
    store: SessionStore,
}

impl ApiClient {
    /// Create a client for the configured base URL
    pub fn new(config: &ApiConfig, store: SessionStore) -> Result<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(Error::Config(format!(
                "api.base_url must be an http(s) URL, got '{}'",
                config.base_url
            )));
        }

        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("kayd/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base_url,
            store,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn session_store(&self) -> &SessionStore {
        &self.store
    }

    // Auth

    pub async fn login(&self, phone: &str, password: &str) -> Result<AuthResponse> {
        let body = Credentials {
            phone: phone.to_string(),
            password: password.to_string(),
        };
        self.send_json(Method::POST, "/auth/login", Some(&body), Auth::Stored)
            .await
    }

    pub async fn register(&self, user: &NewUser) -> Result<AuthResponse> {
        self.send_json(Method::POST, "/auth/register", Some(user), Auth::Stored)
            .await
    }

    pub async fn logout(&self) -> Result<()> {
        self.send_empty(Method::POST, "/auth/logout", None::<&()>).await
    }

    // Books, categories, authors

    pub async fn fetch_books(&self) -> Result<Vec<Book>> {
        self.get("/books").await
    }

    pub async fn fetch_recent_books(&self) -> Result<Vec<Book>> {
        self.get("/books/recent").await
    }

    pub async fn fetch_book_details(&self, id: &str) -> Result<Book> {
        self.get(&format!("/books/{}", segment(id)?)).await
    }

    pub async fn fetch_categories(&self) -> Result<Vec<Category>> {
        self.get("/categories").await
    }

    pub async fn fetch_authors(&self) -> Result<Vec<Author>> {
        self.get("/authors").await
    }

    pub async fn fetch_author_details(&self, id: &str) -> Result<Author> {
        self.get(&format!("/authors/{}", segment(id)?)).await
    }

    // Users

    /// Fetch the user a specific token belongs to.
    ///
    /// Used at startup, before the stored token has been confirmed valid.
    pub async fn fetch_user_data(&self, token: &Token) -> Result<User> {
        self.send_json(Method::GET, "/users/me", None::<&()>, Auth::Explicit(token))
            .await
    }

    pub async fn fetch_user_profile(&self, user_id: &str) -> Result<User> {
        self.get(&format!("/users/{}", segment(user_id)?)).await
    }

    pub async fn update_user_profile(&self, user_id: &str, patch: &UserPatch) -> Result<User> {
        let path = format!("/users/{}", segment(user_id)?);
        self.send_json(Method::PUT, &path, Some(patch), Auth::Stored)
            .await
    }

    pub async fn change_password(&self, user_id: &str, change: &PasswordChange) -> Result<()> {
        let path = format!("/users/{}/change-password", segment(user_id)?);
        self.send_empty(Method::PUT, &path, Some(change)).await
    }

    pub async fn delete_user_account(&self, user_id: &str) -> Result<()> {
        let path = format!("/users/{}", segment(user_id)?);
        self.send_empty(Method::DELETE, &path, None::<&()>).await
    }

    // Reading

    /// Current reading progress, or `None` when the user is not reading anything
    pub async fn fetch_reading_progress(&self) -> Result<Option<ReadingProgress>> {
        let response = match self
            .send(Method::GET, "/reading-progress/current", None::<&()>, Auth::Stored)
            .await
        {
            Ok(response) => response,
            Err(Error::Api { status: 404, .. }) => return Ok(None),
            Err(e) => return Err(e),
        };

        if response.status() == StatusCode::NO_CONTENT {
            return Ok(None);
        }

        let bytes = response.bytes().await?;
        let trimmed = String::from_utf8_lossy(&bytes);
        let trimmed = trimmed.trim();
        if trimmed.is_empty() || trimmed == "null" {
            return Ok(None);
        }
        Ok(Some(serde_json::from_str(trimmed)?))
    }

    pub async fn add_to_reading_list(&self, book_id: &str) -> Result<()> {
        let body = ReadingListEntry {
            book_id: segment(book_id)?,
        };
        self.send_empty(Method::POST, "/reading-list", Some(&body))
            .await
    }

    pub async fn update_reading_progress(
        &self,
        book_id: &str,
        update: ProgressUpdate,
    ) -> Result<()> {
        if update.total_pages == 0 || update.current_page > update.total_pages {
            return Err(Error::Validation(format!(
                "Invalid progress: page {} of {}",
                update.current_page, update.total_pages
            )));
        }
        let path = format!("/reading-progress/{}", segment(book_id)?);
        self.send_empty(Method::PUT, &path, Some(&update)).await
    }

    // Screen loaders

    /// Fetch an author and every book it lists.
    ///
    /// Books are fetched concurrently. A book that fails to load is logged
    /// and left out; the remaining books keep the author's order.
    pub async fn fetch_author_with_books(&self, id: &str) -> Result<AuthorDetails> {
        let author = self.fetch_author_details(id).await?;

        let fetches = author.books.iter().map(|book_id| async move {
            match self.fetch_book_details(book_id).await {
                Ok(book) => Some(book),
                Err(e) => {
                    tracing::warn!(book_id = %book_id, error = %e, "Failed to fetch book details");
                    None
                }
            }
        });
        let books = join_all(fetches).await.into_iter().flatten().collect();

        Ok(AuthorDetails { author, books })
    }

    /// Books and categories, fetched together
    pub async fn fetch_catalog(&self) -> Result<Catalog> {
        let (books, categories) = tokio::try_join!(self.fetch_books(), self.fetch_categories())?;
        Ok(Catalog { books, categories })
    }

    /// Recent books and current progress for the home screen.
    ///
    /// Only the recent books are required. A progress fetch that fails is
    /// logged and treated as no progress.
    pub async fn fetch_home(&self) -> Result<HomeFeed> {
        let (books, progress) =
            tokio::join!(self.fetch_recent_books(), self.fetch_reading_progress());

        let progress = progress.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to fetch reading progress");
            None
        });

        Ok(HomeFeed {
            recent_books: books?.into_iter().filter(|b| !b.title.is_empty()).collect(),
            progress: progress.filter(|p| p.book.is_some()),
        })
    }

    // Plumbing

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.send_json(Method::GET, path, None::<&()>, Auth::Stored)
            .await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth<'_>,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.send(method, path, body, auth).await?;
        Ok(response.json::<T>().await?)
    }

    async fn send_empty<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        self.send(method, path, body, Auth::Stored).await?;
        Ok(())
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        auth: Auth<'_>,
    ) -> Result<Response>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}{}", self.base_url, path);

        let token = match auth {
            Auth::Stored => self.store.get().await?,
            Auth::Explicit(token) => Some(token.clone()),
        };

        tracing::debug!(
            method = %method,
            path,
            authenticated = token.is_some(),
            "API request"
        );

        let mut builder = self.http.request(method, &url);
        if let Some(token) = &token {
            builder = builder.header(reqwest::header::AUTHORIZATION, token.bearer());
        }
        if let Some(body) = body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        check_status(response).await
    }
}

/// Turn a non-2xx response into [`Error::Api`], keeping the server's message if it sent one
async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let text = response.text().await.unwrap_or_default();
    let message = serde_json::from_str::<ErrorBody>(&text)
        .ok()
        .and_then(|b| b.message.or(b.error))
        .unwrap_or_default();

    tracing::debug!(
        status = status.as_u16(),
        reason = status.canonical_reason().unwrap_or(""),
        %message,
        "API request rejected"
    );

    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

/// Validate an id used as a single path segment
fn segment(id: &str) -> Result<&str> {
    if id.is_empty() || id.contains(['/', '?', '#']) {
        return Err(Error::Validation(format!("Invalid id: '{}'", id)));
    }
    Ok(id)
}
