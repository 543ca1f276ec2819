//! CLI output formatting utilities

use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, ContentArrangement, Table};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use std::time::Duration;

use super::OutputFormat;
use crate::api::{AuthorDetails, Author, Book, Catalog, HomeFeed, ReadingProgress, User};

/// Print a success message
pub fn success(message: &str) {
    println!("{} {}", "✓".green(), message);
}

/// Print an error message
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red(), message);
}

/// Print a warning message
pub fn warn(message: &str) {
    println!("{} {}", "⚠".yellow(), message);
}

/// Print an info message
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue(), message);
}

/// Spinner shown while a request is in flight
pub fn spinner(message: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(message.to_string());
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Print any record as JSON or YAML. Returns false for table format.
pub fn print_structured<T: Serialize>(value: &T, format: OutputFormat) -> Result<bool> {
    match format {
        OutputFormat::Table => Ok(false),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(value)?);
            Ok(true)
        }
        OutputFormat::Yaml => {
            println!("{}", serde_yaml::to_string(value)?);
            Ok(true)
        }
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|n| Cell::new(n).fg(Color::Cyan)).collect()
}

fn rating_cell(book: &Book) -> Cell {
    match &book.rating {
        Some(rating) => Cell::new(format!("★ {:.1} ({})", rating.average, rating.count))
            .fg(Color::Yellow),
        None => Cell::new("-"),
    }
}

/// Print a table of books, labelling categories from the catalog
pub fn print_book_table(books: &[&Book], catalog: Option<&Catalog>) {
    if books.is_empty() {
        info("No books found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Title", "Publisher", "Categories", "Rating"]));

    for book in books {
        let categories = book
            .category
            .iter()
            .take(2)
            .map(|id| match catalog {
                Some(catalog) => catalog.category_name(id).to_string(),
                None => id.clone(),
            })
            .collect::<Vec<_>>()
            .join(", ");

        table.add_row(vec![
            Cell::new(&book.id),
            Cell::new(&book.title),
            Cell::new(book.publisher().unwrap_or("-")),
            Cell::new(categories),
            rating_cell(book),
        ]);
    }

    println!("{table}");
}

/// Print detailed book information
pub fn print_book_detail(book: &Book) {
    println!("{}", book.title.bold().underline());
    println!();

    if let Some(rating) = &book.rating {
        println!(
            "  {} {:.1} ({} reviews)",
            "★".yellow(),
            rating.average,
            rating.count
        );
    }
    if let Some(isbn) = &book.isbn {
        println!("  {} {}", "ISBN:".bold(), isbn);
    }
    if !book.category.is_empty() {
        println!("  {} {}", "Categories:".bold(), book.category.join(", "));
    }

    if let Some(details) = &book.details {
        if let Some(publisher) = &details.publisher {
            println!("  {} {}", "Publisher:".bold(), publisher);
        }
        if let Some(year) = details.published_year {
            println!("  {} {}", "Published:".bold(), year);
        }
        if let Some(pages) = details.page_count {
            println!("  {} {}", "Pages:".bold(), pages);
        }
        if let Some(language) = &details.language {
            println!("  {} {}", "Language:".bold(), language);
        }
        if let Some(description) = &details.description {
            println!();
            println!("  {}", description);
        }
    }
}

/// Print a table of authors
pub fn print_author_table(authors: &[&Author]) {
    if authors.is_empty() {
        info("No authors found.");
        return;
    }

    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header(&["ID", "Pen name", "Books", "Biography"]));

    for author in authors {
        let count = author
            .book_count
            .unwrap_or(author.books.len() as u32)
            .to_string();
        let bio: String = author
            .biography
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(60)
            .collect();

        table.add_row(vec![
            Cell::new(&author.id),
            Cell::new(&author.name.pen_name),
            Cell::new(count),
            Cell::new(bio),
        ]);
    }

    println!("{table}");
}

/// Print an author with their resolved books
pub fn print_author_detail(details: &AuthorDetails) {
    let author = &details.author;
    println!("{}", author.name.pen_name.bold().underline());

    let real_name = [author.name.first_name.as_deref(), author.name.last_name.as_deref()]
        .into_iter()
        .flatten()
        .collect::<Vec<_>>()
        .join(" ");
    if !real_name.is_empty() {
        println!("  {}", real_name.dimmed());
    }
    println!();

    if let Some(bio) = &author.biography {
        println!("  {}", "Biography".bold());
        println!("  {}", bio);
        println!();
    }

    if let Some(links) = &author.social_links {
        if let Some(website) = &links.website {
            println!("  {} {}", "Website:".bold(), website.cyan());
        }
        if let Some(twitter) = &links.twitter {
            println!("  {} {}", "Twitter:".bold(), twitter.cyan());
        }
    }

    println!();
    println!("  {} ({})", "Books".bold(), details.books.len());
    let books: Vec<&Book> = details.books.iter().collect();
    print_book_table(&books, None);
}

/// Print reading progress as a small bar
pub fn print_progress(progress: &ReadingProgress) {
    let title = progress
        .book
        .as_ref()
        .map(|b| b.title.as_str())
        .unwrap_or("Unknown book");
    println!("{}", "Currently Reading".bold());
    println!("  {}", title);

    let percent = progress.progress.unwrap_or(0.0).clamp(0.0, 100.0);
    let filled = (percent / 5.0).round() as usize;
    println!(
        "  [{}{}] {:.0}%",
        "█".repeat(filled).blue(),
        "░".repeat(20 - filled),
        percent
    );

    if let (Some(current), Some(total)) = (progress.current_page, progress.total_pages) {
        println!("  {} / {} pages", current, total);
    }
}

/// Print the home screen
pub fn print_home(user: Option<&User>, feed: &HomeFeed) {
    let name = user.map(|u| u.username.as_str()).unwrap_or("Reader");
    println!("{}", "Welcome back,".bold());
    println!("{}", name);
    println!();

    if let Some(progress) = &feed.progress {
        print_progress(progress);
        println!();
    }

    println!("{}", "Recent Books".bold());
    let books: Vec<&Book> = feed.recent_books.iter().collect();
    print_book_table(&books, None);
}

/// Print a user profile
pub fn print_profile(user: &User) {
    println!("{}", "Profile".bold().underline());
    println!();
    println!("  {} {}", "Username:".bold(), user.username);
    println!(
        "  {} {}",
        "Phone:".bold(),
        user.phone.as_deref().unwrap_or("Not set")
    );
    println!(
        "  {} {} Books Read • {} Currently Reading",
        "Reading Stats:".bold(),
        user.books_read.unwrap_or(0),
        user.currently_reading.unwrap_or(0)
    );
}

/// Confirm an action with the user
pub fn confirm(message: &str) -> bool {
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .unwrap_or(false)
}
