//! Diesel ORM records for database tables.

use diesel::prelude::*;

use crate::schema;

/// Source record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::sources)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SourceRecord {
    pub id: String,
    pub name: String,
    pub url_pattern: String,
    pub source_type: String,
    pub enabled: i32,
    pub config: String,
    pub search_params: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Source row for insert or replace.
#[derive(Insertable, AsChangeset, Debug)]
#[diesel(table_name = schema::sources)]
pub struct NewSource<'a> {
    pub id: &'a str,
    pub name: &'a str,
    pub url_pattern: &'a str,
    pub source_type: &'a str,
    pub enabled: i32,
    pub config: &'a str,
    pub search_params: &'a str,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Document record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::documents)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentRecord {
    pub id: String,
    pub source_id: String,
    pub url: String,
    pub title: String,
    pub content: String,
    pub content_hash: String,
    pub file_type: String,
    pub video_url: Option<String>,
    pub version: i32,
    pub summary: Option<String>,
    pub tags: String,
    pub file_path: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New document for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::documents)]
pub struct NewDocument<'a> {
    pub id: &'a str,
    pub source_id: &'a str,
    pub url: &'a str,
    pub title: &'a str,
    pub content: &'a str,
    pub content_hash: &'a str,
    pub file_type: &'a str,
    pub video_url: Option<&'a str>,
    pub version: i32,
    pub summary: Option<&'a str>,
    pub tags: &'a str,
    pub file_path: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Document version record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::document_versions)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct DocumentVersionRecord {
    pub id: i32,
    pub document_id: String,
    pub version: i32,
    pub title: String,
    pub content: String,
    pub content_hash: String,
    pub created_at: String,
}

/// New document version for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::document_versions)]
pub struct NewDocumentVersion<'a> {
    pub document_id: &'a str,
    pub version: i32,
    pub title: &'a str,
    pub content: &'a str,
    pub content_hash: &'a str,
    pub created_at: &'a str,
}

/// Collection run record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::collection_runs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CollectionRunRecord {
    pub id: String,
    pub source_id: String,
    pub started_at: String,
    pub finished_at: String,
    pub outcome: String,
    pub message: String,
    pub url_count: i32,
    pub success_count: i32,
    pub failure_count: i32,
}

/// New collection run for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::collection_runs)]
pub struct NewCollectionRun<'a> {
    pub id: &'a str,
    pub source_id: &'a str,
    pub started_at: &'a str,
    pub finished_at: &'a str,
    pub outcome: &'a str,
    pub message: &'a str,
    pub url_count: i32,
    pub success_count: i32,
    pub failure_count: i32,
}

/// Collection log record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::collection_logs)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct CollectionLogRecord {
    pub id: i32,
    pub run_id: String,
    pub source_id: String,
    pub url: String,
    pub status: String,
    pub error_message: Option<String>,
    pub document_id: Option<String>,
    pub executed_at: String,
}

/// New collection log for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::collection_logs)]
pub struct NewCollectionLog<'a> {
    pub run_id: &'a str,
    pub source_id: &'a str,
    pub url: &'a str,
    pub status: &'a str,
    pub error_message: Option<&'a str>,
    pub document_id: Option<&'a str>,
    pub executed_at: &'a str,
}
