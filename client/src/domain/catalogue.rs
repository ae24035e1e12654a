//! Typed access to the authors, books and analytics endpoints.
//!
//! Creates and updates travel as multipart forms so an image can ride along
//! with the record fields; only the fields a payload sets are sent.

use chrono::{DateTime, Utc};
use pagination::Paginated;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::{ApiClient, ApiRequest, ClientError, FormPart};

const AUTHORS_PATH: &str = "/api/authors/";
const ALL_AUTHORS_PATH: &str = "/api/authors/all/";
const BOOKS_PATH: &str = "/api/books/";
const ANALYTICS_PATH: &str = "/api/analytics/";
const IMAGE_FIELD: &str = "image";

/// Author record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    /// Identifier.
    pub id: u64,
    /// Display name.
    pub name: String,
    /// Free-form biography.
    #[serde(default)]
    pub details: Option<String>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// URL of the uploaded portrait.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Book record with its author embedded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    /// Identifier.
    pub id: u64,
    /// Title.
    pub name: String,
    /// Body text or synopsis.
    pub content: String,
    /// Author of the book.
    pub author: Author,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
    /// URL of the uploaded cover.
    #[serde(default)]
    pub image_url: Option<String>,
}

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsSummary {
    /// Number of books.
    pub total_books: u64,
    /// Number of authors.
    pub total_authors: u64,
    /// Books created in the last 30 days.
    pub new_books_last30: u64,
    /// Authors created in the last 30 days.
    pub new_authors_last30: u64,
    /// Book growth against the previous period, in percent.
    pub books_growth_pct: f64,
    /// Author growth against the previous period, in percent.
    pub authors_growth_pct: f64,
    /// Per-period creation counts.
    #[serde(default)]
    pub buckets: Vec<AnalyticsBucket>,
}

/// Creation counts for one period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalyticsBucket {
    /// Period label.
    pub label: String,
    /// Books created in the period.
    pub books: u64,
    /// Authors created in the period.
    pub authors: u64,
}

/// Image attached to a create or update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUpload {
    /// File name reported to the server.
    pub file_name: String,
    /// MIME type, when known.
    pub content_type: Option<String>,
    /// File contents.
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    /// Upload named `file_name`, guessing the MIME type from its extension.
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let content_type = guess_image_type(&file_name).map(str::to_owned);
        Self {
            file_name,
            content_type,
            bytes,
        }
    }

    fn into_part(self) -> FormPart {
        FormPart::File {
            name: IMAGE_FIELD.to_owned(),
            file_name: self.file_name,
            content_type: self.content_type,
            bytes: self.bytes,
        }
    }
}

fn guess_image_type(file_name: &str) -> Option<&'static str> {
    let (_, extension) = file_name.rsplit_once('.')?;
    match extension.to_ascii_lowercase().as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        _ => None,
    }
}

/// Fields for a new author.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewAuthor {
    /// Display name.
    pub name: String,
    /// Biography; blank values are not sent.
    pub details: Option<String>,
    /// Portrait.
    pub image: Option<ImageUpload>,
}

/// Fields to change on an author. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AuthorChanges {
    /// New display name.
    pub name: Option<String>,
    /// New biography; an empty string clears it.
    pub details: Option<String>,
    /// New portrait.
    pub image: Option<ImageUpload>,
}

/// Fields for a new book.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NewBook {
    /// Title.
    pub name: String,
    /// Body text.
    pub content: String,
    /// Identifier of the author.
    pub author_id: u64,
    /// Cover image.
    pub image: Option<ImageUpload>,
}

/// Fields to change on a book. `None` leaves a field untouched.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BookChanges {
    /// New title.
    pub name: Option<String>,
    /// New body text.
    pub content: Option<String>,
    /// New author.
    pub author_id: Option<u64>,
    /// New cover image.
    pub image: Option<ImageUpload>,
}

impl NewAuthor {
    fn into_form(self) -> Vec<FormPart> {
        let mut parts = vec![FormPart::text("name", self.name)];
        if let Some(details) = self.details.filter(|details| !details.is_empty()) {
            parts.push(FormPart::text("details", details));
        }
        parts.extend(self.image.map(ImageUpload::into_part));
        parts
    }
}

impl AuthorChanges {
    fn into_form(self) -> Vec<FormPart> {
        let mut parts = Vec::new();
        parts.extend(self.name.map(|name| FormPart::text("name", name)));
        parts.extend(self.details.map(|details| FormPart::text("details", details)));
        parts.extend(self.image.map(ImageUpload::into_part));
        parts
    }
}

impl NewBook {
    fn into_form(self) -> Vec<FormPart> {
        let mut parts = vec![
            FormPart::text("name", self.name),
            FormPart::text("content", self.content),
            FormPart::text("author_id", self.author_id.to_string()),
        ];
        parts.extend(self.image.map(ImageUpload::into_part));
        parts
    }
}

impl BookChanges {
    fn into_form(self) -> Vec<FormPart> {
        let mut parts = Vec::new();
        parts.extend(self.name.map(|name| FormPart::text("name", name)));
        parts.extend(self.content.map(|content| FormPart::text("content", content)));
        parts.extend(
            self.author_id
                .map(|author_id| FormPart::text("author_id", author_id.to_string())),
        );
        parts.extend(self.image.map(ImageUpload::into_part));
        parts
    }
}

fn list_path(base: &str, page: Option<u32>) -> String {
    match page {
        Some(page) if page > 0 => format!("{base}?page={page}"),
        _ => base.to_owned(),
    }
}

fn record_path(base: &str, id: u64) -> String {
    format!("{base}{id}/")
}

/// Catalogue use-cases over one authenticated client.
#[derive(Clone)]
pub struct CatalogueService {
    client: ApiClient,
}

impl CatalogueService {
    /// Wrap `client`.
    pub fn new(client: ApiClient) -> Self {
        Self { client }
    }

    /// Every author, unpaginated.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails.
    pub async fn all_authors(&self) -> Result<Vec<Author>, ClientError> {
        self.client.get(ALL_AUTHORS_PATH).await
    }

    /// One page of authors; `None` asks for the first page.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails.
    pub async fn authors(&self, page: Option<u32>) -> Result<Paginated<Author>, ClientError> {
        self.client.get(&list_path(AUTHORS_PATH, page)).await
    }

    /// One author.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails.
    pub async fn author(&self, id: u64) -> Result<Author, ClientError> {
        self.client.get(&record_path(AUTHORS_PATH, id)).await
    }

    /// Create an author.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails or is rejected.
    pub async fn create_author(&self, author: NewAuthor) -> Result<Author, ClientError> {
        let request = ApiRequest::post(AUTHORS_PATH).with_multipart(author.into_form());
        let created: Author = self.client.request(&request).await?;
        debug!(id = created.id, "author created");
        Ok(created)
    }

    /// Update an author with a full `PUT`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails or is rejected.
    pub async fn update_author(&self, id: u64, changes: AuthorChanges) -> Result<Author, ClientError> {
        let request = ApiRequest::put(record_path(AUTHORS_PATH, id)).with_multipart(changes.into_form());
        self.client.request(&request).await
    }

    /// Delete an author.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails or is rejected.
    pub async fn delete_author(&self, id: u64) -> Result<(), ClientError> {
        self.delete(record_path(AUTHORS_PATH, id)).await
    }

    /// One page of books; `None` asks for the first page.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails.
    pub async fn books(&self, page: Option<u32>) -> Result<Paginated<Book>, ClientError> {
        self.client.get(&list_path(BOOKS_PATH, page)).await
    }

    /// One book.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails.
    pub async fn book(&self, id: u64) -> Result<Book, ClientError> {
        self.client.get(&record_path(BOOKS_PATH, id)).await
    }

    /// Create a book.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails or is rejected.
    pub async fn create_book(&self, book: NewBook) -> Result<Book, ClientError> {
        let request = ApiRequest::post(BOOKS_PATH).with_multipart(book.into_form());
        let created: Book = self.client.request(&request).await?;
        debug!(id = created.id, "book created");
        Ok(created)
    }

    /// Update a book with a full `PUT`.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails or is rejected.
    pub async fn update_book(&self, id: u64, changes: BookChanges) -> Result<Book, ClientError> {
        let request = ApiRequest::put(record_path(BOOKS_PATH, id)).with_multipart(changes.into_form());
        self.client.request(&request).await
    }

    /// Delete a book.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails or is rejected.
    pub async fn delete_book(&self, id: u64) -> Result<(), ClientError> {
        self.delete(record_path(BOOKS_PATH, id)).await
    }

    /// Dashboard analytics.
    ///
    /// # Errors
    ///
    /// Returns a [`ClientError`] when the request fails.
    pub async fn analytics(&self) -> Result<AnalyticsSummary, ClientError> {
        self.client.get(ANALYTICS_PATH).await
    }

    async fn delete(&self, path: String) -> Result<(), ClientError> {
        // Delete endpoints answer 204; some deployments echo a JSON body instead.
        let _: Option<Value> = self.client.request(&ApiRequest::delete(path)).await?;
        Ok(())
    }
}
