//! Record merger: original row + upstream fields → one flat output row.

use tracing::debug;

use crate::record::{Fields, Record};
use crate::schema::ServiceSchema;

/// Merge upstream fields over an original record.
///
/// Upstream values win on name collisions, since they are freshly fetched;
/// columns only the original has keep their value and position. The identity
/// key column is never overwritten. Every column of `schema` is present in the
/// result, null when `upstream` lacks it, so an all-null `upstream` yields the
/// original row plus null enrichment columns.
pub fn merge(original: &Record, upstream: &Fields, schema: &ServiceSchema) -> Fields {
    let mut out = original.fields().clone();

    let declared = schema.columns.iter().copied();
    // Upstream columns outside the declared schema are carried along.
    let extra = upstream.names().filter(|n| !schema.is_enrichment_column(n));

    for name in declared.chain(extra) {
        if name == original.key_column() {
            debug!(
                key = original.key(),
                column = name,
                "upstream field collides with key column, skipped"
            );
            continue;
        }
        out.set(name, upstream.get(name).map(str::to_string));
    }

    out
}

/// The row emitted when enrichment fails: original fields plus the null shape.
pub fn with_defaults(original: &Record, schema: &ServiceSchema) -> Fields {
    merge(original, &schema.defaults(), schema)
}
