//! CLI command implementations

use anyhow::Result;
use console::Term;
use dialoguer::{Input, Password};
use std::fs;

use crate::api::{filter_authors, ApiClient, Author, Book, ProgressUpdate, UserPatch};
use crate::auth::{AuthSession, PasswordChangeForm, RegistrationForm, SessionState};
use crate::cli::{
    confirm, error, info, print_author_detail, print_author_table, print_book_detail,
    print_book_table, print_home, print_profile, print_progress, print_structured, spinner,
    success, warn, OutputFormat, ProfileAction, ReadingAction,
};
use crate::config::{self, Config};
use crate::session::SessionStore;

/// Initialize a new kayd.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(config::loader::CONFIG_FILENAME);

    if config_path.exists() {
        warn("kayd.toml already exists");
        return Ok(());
    }

    let content = config::loader::default_config_content();
    fs::write(config_path, content)?;

    success("Created kayd.toml");
    info("Set api.base_url and run 'kayd login' to sign in");

    Ok(())
}

/// Sign in
pub async fn login(phone: Option<String>, password: Option<String>) -> Result<()> {
    let session = open_session().await?;

    let phone = match phone {
        Some(phone) => phone,
        None => Input::<String>::new().with_prompt("Phone number").interact_text()?,
    };
    let password = match password {
        Some(password) => password,
        None => Password::new().with_prompt("Password").interact()?,
    };

    let pb = spinner("Signing in...");
    let result = session.login(&phone, &password).await;
    pb.finish_and_clear();

    match result {
        Ok(user) => {
            success(&format!("Signed in as {}", user.username));
            Ok(())
        }
        Err(e) => {
            error(&session.error().unwrap_or_else(|| e.to_string()));
            Err(e.into())
        }
    }
}

/// Create an account
pub async fn register(username: Option<String>, phone: Option<String>) -> Result<()> {
    let session = open_session().await?;

    let username = match username {
        Some(username) => username,
        None => Input::<String>::new().with_prompt("Username").interact_text()?,
    };
    let phone = match phone {
        Some(phone) => phone,
        None => Input::<String>::new().with_prompt("Phone number").interact_text()?,
    };
    let password = Password::new().with_prompt("Password").interact()?;
    let confirm_password = Password::new().with_prompt("Confirm password").interact()?;

    let form = RegistrationForm {
        username,
        phone,
        password,
        confirm_password,
    };

    let pb = spinner("Creating account...");
    let result = session.register_with_confirmation(&form).await;
    pb.finish_and_clear();

    match result {
        Ok(user) => {
            success(&format!("Welcome, {}! You're signed in.", user.username));
            Ok(())
        }
        Err(e) => {
            error(&session.error().unwrap_or_else(|| e.to_string()));
            Err(e.into())
        }
    }
}

/// Sign out
pub async fn logout() -> Result<()> {
    let session = open_session().await?;

    match sign_out(&session).await {
        Ok(true) => {
            success("Signed out");
            Ok(())
        }
        Ok(false) => {
            info("Not signed in");
            Ok(())
        }
        Err(e) => {
            error(&session.error().unwrap_or_else(|| e.to_string()));
            Err(e.into())
        }
    }
}

/// Log out if signed in. Returns whether anyone was.
///
/// Without a user there is no server call, but a stored token the server
/// could not verify at startup is still dropped.
async fn sign_out(session: &AuthSession) -> crate::Result<bool> {
    if !session.state().is_authenticated() {
        session.store().clear().await?;
        return Ok(false);
    }
    session.logout().await?;
    Ok(true)
}

/// Show the signed-in user
pub async fn whoami(format: OutputFormat) -> Result<()> {
    let session = open_session().await?;
    let snapshot = session.snapshot();

    if print_structured(&snapshot, format)? {
        return Ok(());
    }

    match &snapshot.state {
        SessionState::Authenticated(user) => {
            success(&format!("Signed in as {} ({})", user.username, user.id));
        }
        _ => info("Not signed in. Run 'kayd login' to sign in."),
    }
    Ok(())
}

/// Home screen
pub async fn home() -> Result<()> {
    let session = open_session().await?;

    let pb = spinner("Loading...");
    let result = session.api().fetch_home().await;
    pb.finish_and_clear();

    match result {
        Ok(feed) => {
            print_home(session.current_user().as_ref(), &feed);
            Ok(())
        }
        Err(e) => {
            error("Failed to load home data. Please try again.");
            Err(e.into())
        }
    }
}

/// List books, optionally filtered
pub async fn books(search: Option<String>, format: OutputFormat) -> Result<()> {
    let session = open_session().await?;

    let pb = spinner("Loading books...");
    let result = session.api().fetch_catalog().await;
    pb.finish_and_clear();

    let catalog = match result {
        Ok(catalog) => catalog,
        Err(e) => {
            error("Failed to load books. Please try again.");
            return Err(e.into());
        }
    };

    let books: Vec<&Book> = match &search {
        Some(query) => catalog.search(query),
        None => catalog.books.iter().collect(),
    };

    if !print_structured(&books, format)? {
        print_book_table(&books, Some(&catalog));
    }
    Ok(())
}

/// Show a book
pub async fn book(id: &str, format: OutputFormat) -> Result<()> {
    let session = open_session().await?;

    let pb = spinner("Loading book...");
    let result = session.api().fetch_book_details(id).await;
    pb.finish_and_clear();

    match result {
        Ok(book) => {
            if !print_structured(&book, format)? {
                print_book_detail(&book);
            }
            Ok(())
        }
        Err(e) => {
            error("Failed to load book details. Please try again.");
            Err(e.into())
        }
    }
}

/// List authors, optionally filtered
pub async fn authors(search: Option<String>, format: OutputFormat) -> Result<()> {
    let session = open_session().await?;

    let pb = spinner("Loading authors...");
    let result = session.api().fetch_authors().await;
    pb.finish_and_clear();

    let all = match result {
        Ok(authors) => authors,
        Err(e) => {
            error("Failed to load authors. Please try again.");
            return Err(e.into());
        }
    };

    let authors: Vec<&Author> = match &search {
        Some(query) => filter_authors(&all, query),
        None => all.iter().collect(),
    };

    if !print_structured(&authors, format)? {
        print_author_table(&authors);
    }
    Ok(())
}

/// Show an author and their books
pub async fn author(id: &str, format: OutputFormat) -> Result<()> {
    let session = open_session().await?;

    let pb = spinner("Loading author...");
    let result = session.api().fetch_author_with_books(id).await;
    pb.finish_and_clear();

    match result {
        Ok(details) => {
            if !print_structured(&details, format)? {
                print_author_detail(&details);
            }
            Ok(())
        }
        Err(e) => {
            error("Failed to load author details. Please try again.");
            Err(e.into())
        }
    }
}

/// Reading list and progress commands
pub async fn reading(action: ReadingAction) -> Result<()> {
    let session = open_session().await?;
    let api = session.api();

    match action {
        ReadingAction::Add { book } => {
            if let Err(e) = api.add_to_reading_list(&book).await {
                error("Failed to add book to reading list. Please try again.");
                return Err(e.into());
            }
            success("Book added to reading list!");
        }
        ReadingAction::Progress { book, page, total } => {
            let update = ProgressUpdate {
                current_page: page,
                total_pages: total,
            };
            if let Err(e) = api.update_reading_progress(&book, update).await {
                error(&e.user_message("Failed to update reading progress. Please try again."));
                return Err(e.into());
            }
            success("Reading progress updated!");
        }
        ReadingAction::Current => match api.fetch_reading_progress().await? {
            Some(progress) if progress.book.is_some() => print_progress(&progress),
            _ => info("You're not reading anything right now."),
        },
    }

    Ok(())
}

/// Profile commands
pub async fn profile(action: ProfileAction) -> Result<()> {
    let session = open_session().await?;
    require_signed_in(&session)?;

    match action {
        ProfileAction::Show { format } => {
            let pb = spinner("Loading profile...");
            let result = session.refresh_profile().await;
            pb.finish_and_clear();

            let user = result.map_err(|e| {
                error(&session.error().unwrap_or_else(|| e.to_string()));
                e
            })?;
            if !print_structured(&user, format)? {
                print_profile(&user);
            }
        }
        ProfileAction::Update {
            username,
            phone,
            avatar,
        } => {
            let patch = UserPatch {
                username,
                phone,
                avatar,
            };
            let user = session.update_profile(&patch).await.map_err(|e| {
                error(&session.error().unwrap_or_else(|| e.to_string()));
                e
            })?;
            success("Profile updated successfully.");
            print_profile(&user);
        }
        ProfileAction::Password => {
            let form = PasswordChangeForm {
                current_password: Password::new().with_prompt("Current password").interact()?,
                new_password: Password::new().with_prompt("New password").interact()?,
                confirm_password: Password::new()
                    .with_prompt("Confirm new password")
                    .interact()?,
            };
            session.change_password(&form).await.map_err(|e| {
                error(&session.error().unwrap_or_else(|| e.to_string()));
                e
            })?;
            success("Password changed successfully.");
        }
        ProfileAction::Delete { force } => {
            if !force
                && !confirm("Are you sure you want to delete your account? This cannot be undone.")
            {
                info("Cancelled");
                return Ok(());
            }
            session.delete_account().await.map_err(|e| {
                error(&session.error().unwrap_or_else(|| e.to_string()));
                e
            })?;
            success("Account deleted successfully.");
        }
    }

    Ok(())
}

// Helper functions

fn load_config() -> Result<Config> {
    config::load_config_or_default().map_err(|e| anyhow::anyhow!("{}", e))
}

/// Build the session at the application root and restore any stored login
async fn open_session() -> Result<AuthSession> {
    let config = load_config()?;
    let store = SessionStore::open(&config.storage).map_err(|e| anyhow::anyhow!("{}", e))?;

    if store.check_first_launch().await? {
        print_onboarding();
    }

    let api = ApiClient::new(&config.api, store)?;
    let session = AuthSession::new(api);

    session.start().await;
    if let Some(message) = session.error() {
        warn(&message);
        session.clear_error();
    }

    Ok(session)
}

fn require_signed_in(session: &AuthSession) -> Result<()> {
    if session.state().is_authenticated() {
        Ok(())
    } else {
        Err(crate::Error::NotAuthenticated.into())
    }
}

fn print_onboarding() {
    let term = Term::stdout();
    let steps = [
        ("Discover Books", "Explore a vast library of books across various genres."),
        ("Track Your Progress", "Keep track of what you read and set reading goals."),
        ("Connect With Authors", "Follow your favourite authors and find new ones."),
    ];

    let _ = term.write_line("Welcome to Kayd!");
    for (title, description) in steps {
        let _ = term.write_line(&format!("  • {}: {}", title, description));
    }
    let _ = term.write_line("Run 'kayd register' to create an account or 'kayd login' to sign in.");
    let _ = term.write_line("");
}
