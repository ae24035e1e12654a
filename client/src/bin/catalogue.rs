//! Command-line front end for the catalogue API: sign in, browse and edit
//! authors and books, and read the analytics summary.
#![cfg_attr(not(any(test, doctest)), deny(clippy::unwrap_used))]
#![cfg_attr(not(any(test, doctest)), deny(clippy::expect_used))]

use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use cap_std::{ambient_authority, fs::Dir};
use clap::{Args, Parser, Subcommand};
use client::config::ClientSettings;
use client::domain::ports::{SessionInvalidation, SessionObserver};
use client::domain::{
    ApiClient, AuthService, Author, AuthorChanges, BookChanges, CatalogueService, ClientError,
    ImageUpload, LoginCredentials, NewAuthor, NewBook, Registration,
};
use client::outbound::{http::ReqwestTransport, session::FileSessionStore};
use pagination::{Paginated, PaginationState};
use serde::Serialize;
use tokio::runtime::Builder;
use tracing::{debug, warn};
use tracing_subscriber::{EnvFilter, fmt};

/// `catalogue` command arguments.
#[derive(Debug, Parser)]
#[command(name = "catalogue", about = "Browse and edit the catalogue API", version)]
struct CliArgs {
    #[command(flatten)]
    overrides: SettingsOverrides,
    #[command(subcommand)]
    command: Command,
}

/// Flags overriding loaded settings.
#[derive(Debug, Args)]
struct SettingsOverrides {
    /// Base URL of the catalogue API.
    #[arg(long = "api-url", value_name = "url", global = true)]
    api_url: Option<String>,
    /// File holding the session between invocations.
    #[arg(long = "session-file", value_name = "path", global = true)]
    session_file: Option<PathBuf>,
    /// Per-request deadline in seconds.
    #[arg(long = "timeout-seconds", value_name = "seconds", global = true)]
    timeout_seconds: Option<u64>,
    /// Number of page buttons shown under lists.
    #[arg(long = "window-size", value_name = "pages", global = true)]
    window_size: Option<u32>,
    /// Items per page, when known up front.
    #[arg(long = "page-size", value_name = "items", global = true)]
    page_size: Option<u32>,
    /// Serialise concurrent token refreshes.
    #[arg(long = "coalesce-refresh", global = true)]
    coalesce_refresh: bool,
}

impl SettingsOverrides {
    fn apply(self, mut settings: ClientSettings) -> ClientSettings {
        if self.api_url.is_some() {
            settings.api_url = self.api_url;
        }
        if self.session_file.is_some() {
            settings.session_file = self.session_file;
        }
        if let Some(timeout_seconds) = self.timeout_seconds {
            settings.timeout_seconds = timeout_seconds;
        }
        if let Some(window_size) = self.window_size {
            settings.window_size = window_size;
        }
        if self.page_size.is_some() {
            settings.page_size = self.page_size;
        }
        settings.coalesce_refresh |= self.coalesce_refresh;
        settings
    }
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and keep the session.
    Login {
        #[arg(long)]
        email: String,
        /// Read from standard input when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and keep its session.
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        /// Read from standard input when omitted.
        #[arg(long)]
        password: Option<String>,
    },
    /// Forget the stored session.
    Logout,
    /// Manage authors.
    #[command(subcommand)]
    Authors(AuthorCommand),
    /// Manage books.
    #[command(subcommand)]
    Books(BookCommand),
    /// Show the analytics summary.
    Analytics,
}

#[derive(Debug, Subcommand)]
enum AuthorCommand {
    /// List one page of authors.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// List every author.
    All,
    /// Show one author.
    Show { id: u64 },
    /// Create an author.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        details: Option<String>,
        #[arg(long, value_name = "path")]
        image: Option<Utf8PathBuf>,
    },
    /// Update an author.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        details: Option<String>,
        #[arg(long, value_name = "path")]
        image: Option<Utf8PathBuf>,
    },
    /// Delete an author.
    Delete { id: u64 },
}

#[derive(Debug, Subcommand)]
enum BookCommand {
    /// List one page of books.
    List {
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one book.
    Show { id: u64 },
    /// Create a book.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long)]
        content: String,
        #[arg(long = "author-id")]
        author_id: u64,
        #[arg(long, value_name = "path")]
        image: Option<Utf8PathBuf>,
    },
    /// Update a book.
    Update {
        id: u64,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        content: Option<String>,
        #[arg(long = "author-id")]
        author_id: Option<u64>,
        #[arg(long, value_name = "path")]
        image: Option<Utf8PathBuf>,
    },
    /// Delete a book.
    Delete { id: u64 },
}

/// Observer pointing the user back at `catalogue login`.
struct LoggingSessionObserver;

impl SessionObserver for LoggingSessionObserver {
    fn session_invalidated(&self, reason: SessionInvalidation) {
        warn!(reason = %reason, "session ended; run `catalogue login` to sign in again");
    }
}

struct Services {
    auth: AuthService,
    catalogue: CatalogueService,
    page_size: Option<u32>,
    window_size: u32,
}

fn main() -> io::Result<()> {
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|error| io::Error::other(format!("create Tokio runtime: {error}")))?;
    runtime.block_on(async_main())
}

async fn async_main() -> io::Result<()> {
    let args = CliArgs::try_parse().map_err(io::Error::other)?;
    let settings = ClientSettings::load().map_err(io::Error::other)?;
    let services = build_services(args.overrides.apply(settings))?;

    match args.command {
        Command::Login { email, password } => {
            let password = password_or_stdin(password)?;
            let credentials =
                LoginCredentials::try_from_parts(&email, &password).map_err(io::Error::other)?;
            services
                .auth
                .login(&credentials)
                .await
                .map_err(|err| command_failed("login", &err))?;
            println!("signed in as {}", credentials.email());
        }
        Command::Register {
            name,
            email,
            password,
        } => {
            let password = password_or_stdin(password)?;
            let registration = Registration::try_from_parts(&name, &email, &password)
                .map_err(io::Error::other)?;
            let outcome = services
                .auth
                .register(&registration)
                .await
                .map_err(|err| command_failed("register", &err))?;
            let email = display_or(&outcome.user.email, registration.credentials().email());
            println!("registered {email}");
        }
        Command::Logout => {
            services
                .auth
                .logout()
                .map_err(|err| command_failed("logout", &err))?;
            println!("signed out");
        }
        Command::Authors(command) => run_authors(&services, command).await?,
        Command::Books(command) => run_books(&services, command).await?,
        Command::Analytics => {
            let summary = services
                .catalogue
                .analytics()
                .await
                .map_err(|err| command_failed("analytics", &err))?;
            print_json(&summary)?;
        }
    }
    Ok(())
}

fn build_services(settings: ClientSettings) -> io::Result<Services> {
    let api_url = settings.api_url().map_err(io::Error::other)?;
    let timeout = settings.timeout().map_err(io::Error::other)?;
    let session_file = settings.session_file().map_err(io::Error::other)?;

    let transport = ReqwestTransport::with_timeout(timeout)
        .map_err(|error| io::Error::other(format!("create HTTP client: {error}")))?;
    let session = FileSessionStore::open(&session_file).map_err(io::Error::other)?;
    let client = ApiClient::new(
        api_url.as_str(),
        Arc::new(transport),
        Arc::new(session),
        Arc::new(LoggingSessionObserver),
    )
    .map_err(io::Error::other)?
    .with_refresh_coalescing(settings.coalesce_refresh);

    Ok(Services {
        auth: AuthService::new(client.clone()),
        catalogue: CatalogueService::new(client),
        page_size: settings.page_size,
        window_size: settings.window_size,
    })
}

async fn run_authors(services: &Services, command: AuthorCommand) -> io::Result<()> {
    let catalogue = &services.catalogue;
    match command {
        AuthorCommand::List { page } => {
            let authors = catalogue
                .authors(Some(page))
                .await
                .map_err(|err| command_failed("list authors", &err))?;
            for author in &authors.results {
                println!("{}", author_line(author));
            }
            print_pagination(services, &authors, page);
        }
        AuthorCommand::All => {
            let authors = catalogue
                .all_authors()
                .await
                .map_err(|err| command_failed("list authors", &err))?;
            for author in &authors {
                println!("{}", author_line(author));
            }
        }
        AuthorCommand::Show { id } => {
            let author = catalogue
                .author(id)
                .await
                .map_err(|err| command_failed("show author", &err))?;
            print_json(&author)?;
        }
        AuthorCommand::Create {
            name,
            details,
            image,
        } => {
            let author = NewAuthor {
                name,
                details,
                image: image.as_deref().map(read_image).transpose()?,
            };
            let created = catalogue
                .create_author(author)
                .await
                .map_err(|err| command_failed("create author", &err))?;
            println!("created {}", author_line(&created));
        }
        AuthorCommand::Update {
            id,
            name,
            details,
            image,
        } => {
            let changes = AuthorChanges {
                name,
                details,
                image: image.as_deref().map(read_image).transpose()?,
            };
            let updated = catalogue
                .update_author(id, changes)
                .await
                .map_err(|err| command_failed("update author", &err))?;
            println!("updated {}", author_line(&updated));
        }
        AuthorCommand::Delete { id } => {
            catalogue
                .delete_author(id)
                .await
                .map_err(|err| command_failed("delete author", &err))?;
            println!("deleted author {id}");
        }
    }
    Ok(())
}

async fn run_books(services: &Services, command: BookCommand) -> io::Result<()> {
    let catalogue = &services.catalogue;
    match command {
        BookCommand::List { page } => {
            let books = catalogue
                .books(Some(page))
                .await
                .map_err(|err| command_failed("list books", &err))?;
            for book in &books.results {
                println!("{}\t{}\t{}", book.id, book.name, book.author.name);
            }
            print_pagination(services, &books, page);
        }
        BookCommand::Show { id } => {
            let book = catalogue
                .book(id)
                .await
                .map_err(|err| command_failed("show book", &err))?;
            print_json(&book)?;
        }
        BookCommand::Create {
            name,
            content,
            author_id,
            image,
        } => {
            let book = NewBook {
                name,
                content,
                author_id,
                image: image.as_deref().map(read_image).transpose()?,
            };
            let created = catalogue
                .create_book(book)
                .await
                .map_err(|err| command_failed("create book", &err))?;
            println!("created {}\t{}", created.id, created.name);
        }
        BookCommand::Update {
            id,
            name,
            content,
            author_id,
            image,
        } => {
            let changes = BookChanges {
                name,
                content,
                author_id,
                image: image.as_deref().map(read_image).transpose()?,
            };
            let updated = catalogue
                .update_book(id, changes)
                .await
                .map_err(|err| command_failed("update book", &err))?;
            println!("updated {}\t{}", updated.id, updated.name);
        }
        BookCommand::Delete { id } => {
            catalogue
                .delete_book(id)
                .await
                .map_err(|err| command_failed("delete book", &err))?;
            println!("deleted book {id}");
        }
    }
    Ok(())
}

fn command_failed(command: &str, err: &ClientError) -> io::Error {
    match err.status() {
        Some(status) => io::Error::other(format!("{command} failed ({status}): {err}")),
        None => io::Error::other(format!("{command} failed: {err}")),
    }
}

fn author_line(author: &Author) -> String {
    format!("{}\t{}", author.id, author.name)
}

fn display_or<'a>(value: &'a str, fallback: &'a str) -> &'a str {
    if value.is_empty() { fallback } else { value }
}

fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|error| io::Error::other(format!("render output: {error}")))?;
    println!("{rendered}");
    Ok(())
}

fn print_pagination<T>(services: &Services, page: &Paginated<T>, current_page: u32) {
    let state = page
        .pagination_state(current_page, services.page_size)
        .with_window_size(services.window_size);
    debug!(
        page = state.current_page(),
        total_count = ?state.total_count(),
        total_pages = ?state.total_pages(),
        "rendering page control"
    );
    if let Some(line) = render_pagination(&state) {
        println!();
        println!("{line}");
    }
}

/// Render the page control as text: the current page in brackets, `…` where
/// pages are skipped, and `‹`/`›` when moving back or forward is possible.
fn render_pagination(state: &PaginationState) -> Option<String> {
    if !state.is_visible() {
        return None;
    }
    let window = state.window();
    let current = state.clamped_page();
    let mut tokens = Vec::new();
    if window.has_previous() {
        tokens.push("‹".to_owned());
    }
    if window.starts_after_first_page() {
        tokens.push("…".to_owned());
    }
    tokens.extend(window.pages().iter().map(|&page| {
        if page == current {
            format!("[{page}]")
        } else {
            page.to_string()
        }
    }));
    let more_after = state
        .total_pages()
        .is_some_and(|total_pages| window.ends_before(total_pages));
    if more_after {
        tokens.push("…".to_owned());
    }
    if window.has_next() {
        tokens.push("›".to_owned());
    }
    Some(tokens.join(" "))
}

fn password_or_stdin(password: Option<String>) -> io::Result<String> {
    if let Some(password) = password {
        return Ok(password);
    }
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}

fn read_image(path: &Utf8Path) -> io::Result<ImageUpload> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or_else(|| Utf8Path::new("."));
    let file_name = path
        .file_name()
        .ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "image path must be a file"))?;
    let directory = Dir::open_ambient_dir(parent, ambient_authority())
        .map_err(|error| io::Error::other(format!("open image directory '{parent}': {error}")))?;
    let bytes = directory
        .read(file_name)
        .map_err(|error| io::Error::other(format!("read image '{path}': {error}")))?;
    Ok(ImageUpload::new(file_name, bytes))
}

#[cfg(test)]
mod tests {
    //! Regression coverage for this module.
    use super::*;
    use rstest::rstest;

    fn known(current_page: u32, total_count: u64) -> PaginationState {
        PaginationState::new(current_page)
            .with_page_size(Some(10))
            .with_total_count(Some(total_count))
    }

    #[rstest]
    #[case(known(1, 100), Some("[1] 2 3 4 5 … ›"))]
    #[case(known(5, 100), Some("‹ … 3 4 [5] 6 7 … ›"))]
    #[case(known(10, 100), Some("‹ … 6 7 8 9 [10]"))]
    #[case(known(2, 20), Some("‹ 1 [2]"))]
    #[case(known(1, 10), None)]
    #[case(known(1, 0), None)]
    #[case(PaginationState::new(3).with_has_more(true), Some("‹ 1 2 [3] 4 ›"))]
    fn pagination_lines(#[case] state: PaginationState, #[case] expected: Option<&str>) {
        assert_eq!(render_pagination(&state).as_deref(), expected);
    }

    #[rstest]
    fn flags_override_loaded_settings() {
        let overrides = SettingsOverrides {
            api_url: Some("https://api.example.test".to_owned()),
            session_file: None,
            timeout_seconds: Some(3),
            window_size: None,
            page_size: Some(25),
            coalesce_refresh: true,
        };
        let settings = overrides.apply(ClientSettings {
            session_file: Some(PathBuf::from("kept.json")),
            ..ClientSettings::default()
        });
        assert_eq!(settings.api_url.as_deref(), Some("https://api.example.test"));
        assert_eq!(settings.session_file, Some(PathBuf::from("kept.json")));
        assert_eq!(settings.timeout_seconds, 3);
        assert_eq!(settings.window_size, 5);
        assert_eq!(settings.page_size, Some(25));
        assert!(settings.coalesce_refresh);
    }

    #[rstest]
    fn cli_parses_nested_subcommands() {
        let args = CliArgs::try_parse_from([
            "catalogue",
            "--api-url",
            "https://api.example.test",
            "authors",
            "list",
            "--page",
            "3",
        ])
        .expect("valid arguments");
        assert!(matches!(
            args.command,
            Command::Authors(AuthorCommand::List { page: 3 })
        ));
        assert_eq!(
            args.overrides.api_url.as_deref(),
            Some("https://api.example.test")
        );
    }

    #[rstest]
    fn images_are_read_with_their_file_name() {
        let dir = tempfile::tempdir().expect("temp dir");
        let path = dir.path().join("cover.png");
        std::fs::write(&path, [0x89, 0x50, 0x4e, 0x47]).expect("write image");
        let path = Utf8PathBuf::from_path_buf(path).expect("utf-8 path");

        let upload = read_image(&path).expect("image reads");
        assert_eq!(upload.file_name, "cover.png");
        assert_eq!(upload.content_type.as_deref(), Some("image/png"));
        assert_eq!(upload.bytes, vec![0x89, 0x50, 0x4e, 0x47]);
    }
}
