// Diesel table definitions. Timestamps are RFC3339 text.

diesel::table! {
    sources (id) {
        id -> Text,
        name -> Text,
        url_pattern -> Text,
        source_type -> Text,
        enabled -> Integer,
        config -> Text,
        search_params -> Text,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    documents (id) {
        id -> Text,
        source_id -> Text,
        url -> Text,
        title -> Text,
        content -> Text,
        content_hash -> Text,
        file_type -> Text,
        video_url -> Nullable<Text>,
        version -> Integer,
        summary -> Nullable<Text>,
        tags -> Text,
        file_path -> Nullable<Text>,
        created_at -> Text,
        updated_at -> Text,
    }
}

diesel::table! {
    document_versions (id) {
        id -> Integer,
        document_id -> Text,
        version -> Integer,
        title -> Text,
        content -> Text,
        content_hash -> Text,
        created_at -> Text,
    }
}

diesel::table! {
    collection_runs (id) {
        id -> Text,
        source_id -> Text,
        started_at -> Text,
        finished_at -> Text,
        outcome -> Text,
        message -> Text,
        url_count -> Integer,
        success_count -> Integer,
        failure_count -> Integer,
    }
}

diesel::table! {
    collection_logs (id) {
        id -> Integer,
        run_id -> Text,
        source_id -> Text,
        url -> Text,
        status -> Text,
        error_message -> Nullable<Text>,
        document_id -> Nullable<Text>,
        executed_at -> Text,
    }
}

diesel::joinable!(document_versions -> documents (document_id));

diesel::allow_tables_to_appear_in_same_query!(
    sources,
    documents,
    document_versions,
    collection_runs,
    collection_logs,
);
