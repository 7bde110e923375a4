use bincode::{Decode, Encode};
use serde::Serialize;
use syndica_core::{Article, ArticleId, Timestamp};

#[macro_export]
macro_rules! def_table {
    ($(#[$outer:meta])*
        $name:ident : $k:ty => $v:ty) => {
        #[allow(unused)]
        $(#[$outer])*
        pub mod $name {
            use super::*;
            pub type Key = $k;
            pub type Value = $v;
            pub type Definition<'a> = redb_bincode::TableDefinition<'a, Key, Value>;
            pub trait ReadableTable: redb_bincode::ReadableTable<Key, Value> {}
            impl<RT> ReadableTable for RT where RT: redb_bincode::ReadableTable<Key, Value> {}
            pub type Table<'a> = redb_bincode::Table<'a, Key, Value>;
            pub const TABLE: Definition = redb_bincode::TableDefinition::new(stringify!($name));
        }
    };
}

def_table! {
    /// Tracks database/schema version
    db_version: () => u64
}

// ARTICLES
def_table! {
    /// Articles keyed by insertion-ordered id
    articles: ArticleId => Article
}
def_table! {
    /// Unique index over article titles
    articles_by_title: String => ArticleId
}
def_table! {
    /// Unique index over article source URLs
    articles_by_url: String => ArticleId
}
def_table! {
    /// Next id to hand out on article insert
    articles_next_id: () => u64
}

// JOB METADATA
def_table! {
    /// Last-run timestamps keyed by job name; at most one record per job
    run_metadata: String => Timestamp
}

// OAUTH
def_table! {
    /// Stored refresh tokens keyed by provider name
    oauth_tokens: String => OAuthTokenRecord
}

#[derive(Debug, Encode, Decode, Clone, Serialize)]
pub struct OAuthTokenRecord {
    pub refresh_token: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}
