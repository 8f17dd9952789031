//! MongoDB Company Repository Implementation
//!
//! This module implements the `CompanyRepository` trait on top of a MongoDB
//! collection. It handles all driver calls and converts driver errors to
//! domain `StoreError`s.

use std::future::Future;

use company_domain::{
    company::{Company, CompanyId, CompanyPatch, CompanyType, FieldChange, StoreError},
    ports::CompanyRepository,
};
use mongodb::{
    bson::{doc, Bson, Document},
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, Database, IndexModel,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, info_span, warn, Instrument};

/// Server error code for a unique index violation
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Name of the unique index backing company name uniqueness
const NAME_INDEX: &str = "company_name_unique";

/// Where the companies live
#[derive(Debug, Clone)]
pub struct MongoSettings {
    pub uri: String,
    pub database: String,
    pub collection: String,
}

impl Default for MongoSettings {
    fn default() -> Self {
        Self {
            uri: "mongodb://localhost:27017".to_string(),
            database: "companydb".to_string(),
            collection: "companies".to_string(),
        }
    }
}

/// Stored shape of a company
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CompanyDocument {
    #[serde(rename = "_id")]
    id: String,
    name: String,
    #[serde(default)]
    description: Option<String>,
    employee_count: i64,
    is_registered: bool,
    #[serde(rename = "type")]
    company_type: CompanyType,
}

impl From<&Company> for CompanyDocument {
    fn from(company: &Company) -> Self {
        Self {
            id: company.id().to_string(),
            name: company.name().to_string(),
            description: company.description().map(str::to_string),
            employee_count: i64::from(company.employee_count()),
            is_registered: company.is_registered(),
            company_type: company.company_type(),
        }
    }
}

impl TryFrom<CompanyDocument> for Company {
    type Error = StoreError;

    fn try_from(document: CompanyDocument) -> Result<Self, Self::Error> {
        let id = CompanyId::parse(&document.id).map_err(|_| {
            StoreError::backend(format!("stored document has malformed _id '{}'", document.id))
        })?;
        let employee_count = u32::try_from(document.employee_count).map_err(|_| {
            StoreError::backend(format!(
                "stored company {} has out-of-range employeeCount {}",
                id, document.employee_count
            ))
        })?;

        Ok(Company::from_parts(
            id,
            document.name,
            document.description,
            employee_count,
            document.is_registered,
            document.company_type,
        ))
    }
}

/// MongoDB-based implementation of the CompanyRepository port
///
/// The collection handle is cheap to clone and shares the client's
/// connection pool; the client itself is owned by the application and
/// closed at shutdown.
///
/// ## Error Handling
///
/// Duplicate-key errors on the name index become `StoreError::DuplicateName`.
/// Every other driver error becomes `StoreError::Backend` with the operation
/// and key in the message.
#[derive(Clone)]
pub struct MongoCompanyRepository {
    database: Database,
    collection: Collection<CompanyDocument>,
}

impl MongoCompanyRepository {
    /// Create a repository over `database.collection`
    ///
    /// # Example
    ///
    /// ```rust,no_run
    /// use company_mongo::MongoCompanyRepository;
    /// use mongodb::Client;
    ///
    /// # async fn example() -> Result<(), mongodb::error::Error> {
    /// let client = Client::with_uri_str("mongodb://localhost:27017").await?;
    /// let repo = MongoCompanyRepository::new(&client, "companydb", "companies");
    /// # Ok(())
    /// # }
    /// ```
    pub fn new(client: &Client, database: &str, collection: &str) -> Self {
        info!(database = %database, collection = %collection, "Initializing MongoCompanyRepository");
        let database = client.database(database);
        Self {
            collection: database.collection(collection),
            database,
        }
    }

    /// Connect a client for `settings` and build the repository on it
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the URI is invalid
    pub async fn connect(settings: &MongoSettings) -> Result<(Client, Self), StoreError> {
        let client = Client::with_uri_str(&settings.uri)
            .await
            .map_err(|err| StoreError::backend(format!("invalid MongoDB URI: {err}")))?;
        let repo = Self::new(&client, &settings.database, &settings.collection);
        Ok((client, repo))
    }

    /// Create the unique index on `name`
    ///
    /// Idempotent; safe to call at every startup.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the index cannot be built, for
    /// example because existing documents already share a name
    pub async fn ensure_indexes(&self) -> Result<(), StoreError> {
        let index = IndexModel::builder()
            .keys(doc! { "name": 1 })
            .options(
                IndexOptions::builder()
                    .name(NAME_INDEX.to_string())
                    .unique(true)
                    .build(),
            )
            .build();

        match self.collection.create_index(index).await {
            Ok(result) => {
                info!(index = %result.index_name, "Unique name index ready");
                Ok(())
            }
            Err(err) => {
                error!(error = ?err, "Failed to create unique name index");
                Err(StoreError::backend(format!(
                    "create_index on '{}' failed: {}",
                    self.collection.name(),
                    err
                )))
            }
        }
    }

    /// Round-trip to the server
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Backend` if the server does not answer
    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|err| StoreError::backend(format!("ping failed: {err}")))
    }

}

fn id_filter(id: &CompanyId) -> Document {
    doc! { "_id": id.to_string() }
}

/// `$set` document holding only the patched fields
fn set_document(patch: &CompanyPatch) -> Document {
    let mut fields = Document::new();
    for change in patch.changes() {
        let value = match change {
            FieldChange::Name(name) => Bson::String(name.clone()),
            FieldChange::Description(Some(text)) => Bson::String(text.clone()),
            FieldChange::Description(None) => Bson::Null,
            FieldChange::EmployeeCount(count) => Bson::Int64(i64::from(*count)),
            FieldChange::IsRegistered(registered) => Bson::Boolean(*registered),
            FieldChange::Type(company_type) => Bson::String(company_type.as_str().to_string()),
        };
        fields.insert(change.field(), value);
    }
    doc! { "$set": fields }
}

/// Whether `err` is a unique violation on the name index (not on `_id`)
fn is_duplicate_name(err: &MongoError) -> bool {
    match err.kind.as_ref() {
        ErrorKind::Write(WriteFailure::WriteError(write_error)) => {
            violates_name_index(write_error.code, &write_error.message)
        }
        _ => false,
    }
}

/// Reads the index name out of an E11000 message
///
/// The server reports `... index: <name> dup key: { <field>: <value> }`.
/// Only the part before `dup key` is inspected, since the key value is
/// user data.
fn violates_name_index(code: i32, message: &str) -> bool {
    if code != DUPLICATE_KEY_CODE {
        return false;
    }
    let head = message.split(" dup key").next().unwrap_or_default();
    head.trim_end().ends_with(&format!("index: {NAME_INDEX}"))
}

fn driver_error(err: MongoError, operation: &str, key: &str, name: Option<&str>) -> StoreError {
    match name {
        Some(name) if is_duplicate_name(&err) => {
            warn!(key = %key, name = %name, "Unique name index rejected write");
            StoreError::DuplicateName(name.to_string())
        }
        _ => {
            error!(key = %key, error = ?err, "MongoDB {operation} failed");
            StoreError::backend(format!("MongoDB {operation} failed for '{key}': {err}"))
        }
    }
}

impl CompanyRepository for MongoCompanyRepository {
    fn insert(&self, company: &Company) -> impl Future<Output = Result<(), StoreError>> + Send {
        let collection = self.collection.clone();
        let document = CompanyDocument::from(company);
        let span = info_span!("mongo.insert", company_id = %document.id);

        async move {
            debug!(collection = %collection.name(), "Inserting company");

            match collection.insert_one(&document).await {
                Ok(_) => {
                    info!("Company inserted");
                    Ok(())
                }
                Err(err) => Err(driver_error(err, "insert_one", &document.id, Some(&document.name))),
            }
        }
        .instrument(span)
    }

    fn find_by_id(
        &self,
        id: &CompanyId,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send {
        let collection = self.collection.clone();
        let key = id.to_string();
        let filter = id_filter(id);
        let span = info_span!("mongo.find_by_id", company_id = %key);

        async move {
            debug!("Finding company by id");

            match collection.find_one(filter).await {
                Ok(Some(document)) => Company::try_from(document).map(Some),
                Ok(None) => {
                    debug!("No company with this id");
                    Ok(None)
                }
                Err(err) => Err(driver_error(err, "find_one", &key, None)),
            }
        }
        .instrument(span)
    }

    fn find_by_name(
        &self,
        name: &str,
    ) -> impl Future<Output = Result<Option<Company>, StoreError>> + Send {
        let collection = self.collection.clone();
        let name = name.to_string();
        let span = info_span!("mongo.find_by_name", company_name = %name);

        async move {
            debug!("Finding company by name");

            match collection.find_one(doc! { "name": name.as_str() }).await {
                Ok(Some(document)) => Company::try_from(document).map(Some),
                Ok(None) => Ok(None),
                Err(err) => Err(driver_error(err, "find_one", &name, None)),
            }
        }
        .instrument(span)
    }

    fn update_fields(
        &self,
        id: &CompanyId,
        patch: &CompanyPatch,
    ) -> impl Future<Output = Result<bool, StoreError>> + Send {
        let collection = self.collection.clone();
        let key = id.to_string();
        let filter = id_filter(id);
        let update = set_document(patch);
        let new_name = patch.new_name().map(str::to_string);
        let span = info_span!("mongo.update_fields", company_id = %key);

        async move {
            debug!(update = %update, "Updating company fields");

            match collection.update_one(filter, update).upsert(false).await {
                Ok(result) => {
                    debug!(matched = result.matched_count, modified = result.modified_count, "Update applied");
                    Ok(result.matched_count > 0)
                }
                Err(err) => Err(driver_error(err, "update_one", &key, new_name.as_deref())),
            }
        }
        .instrument(span)
    }

    fn delete_by_id(&self, id: &CompanyId) -> impl Future<Output = Result<bool, StoreError>> + Send {
        let collection = self.collection.clone();
        let key = id.to_string();
        let filter = id_filter(id);
        let span = info_span!("mongo.delete_by_id", company_id = %key);

        async move {
            debug!("Deleting company");

            match collection.delete_one(filter).await {
                Ok(result) => {
                    info!(deleted = result.deleted_count, "Delete applied");
                    Ok(result.deleted_count > 0)
                }
                Err(err) => Err(driver_error(err, "delete_one", &key, None)),
            }
        }
        .instrument(span)
    }
}
