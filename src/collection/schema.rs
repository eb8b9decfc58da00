//! Tantivy schema for collection entries.

use tantivy::schema::{
    FAST, Field, IndexRecordOption, NumericOptions, STORED, STRING, Schema, SchemaBuilder,
    TextFieldIndexing, TextOptions,
};

/// Schema fields for one collection entry.
#[derive(Debug)]
pub struct EntrySchema {
    /// Caller-supplied identifier, exact-match indexed.
    pub entry_id: Field,

    /// Id of the entry's vector in the vector file.
    pub vector_id: Field,

    /// Raw text body.
    pub document: Field,

    /// Metadata map serialised as JSON.
    pub metadata: Field,

    /// Timestamp when inserted (UTC seconds).
    pub indexed_at: Field,
}

impl EntrySchema {
    pub fn build() -> (Schema, Self) {
        let mut builder = SchemaBuilder::default();

        let entry_id = builder.add_text_field("entry_id", STRING | STORED | FAST);

        let indexed_u64 = NumericOptions::default()
            .set_indexed()
            .set_stored()
            .set_fast();
        let vector_id = builder.add_u64_field("vector_id", indexed_u64);

        let text_options = TextOptions::default()
            .set_indexing_options(
                TextFieldIndexing::default()
                    .set_tokenizer("default")
                    .set_index_option(IndexRecordOption::WithFreqsAndPositions),
            )
            .set_stored();
        let document = builder.add_text_field("document", text_options);

        let metadata = builder.add_text_field("metadata", STORED);
        let indexed_at = builder.add_u64_field("indexed_at", STORED | FAST);

        let schema = builder.build();
        (
            schema,
            Self {
                entry_id,
                vector_id,
                document,
                metadata,
                indexed_at,
            },
        )
    }
}
