//! Event store database schema: table names, constraint names and the SQL the
//! store runs. The tables themselves are created by `migrations/`.

use accounts_core::repository::UniqueIndex;

/// Unique constraint on `events (stream_id, stream_version)`.
pub const EVENTS_STREAM_VERSION_CONSTRAINT: &str = "events_stream_version_unique";

pub(crate) const SELECT_STREAM: &str = r"
SELECT stream_version, event_name, occurred_at, payload
FROM events
WHERE stream_id = $1 AND stream_version >= $2
ORDER BY stream_version ASC
LIMIT $3
";

pub(crate) const SELECT_MAX_STREAM_VERSION: &str = r"
SELECT COALESCE(MAX(stream_version), 0)
FROM events
WHERE stream_id = $1
";

pub(crate) const INSERT_EVENT: &str = r"
INSERT INTO events (stream_id, stream_version, event_name, occurred_at, payload)
VALUES ($1, $2, $3, $4, $5)
";

pub(crate) const DELETE_STREAM: &str = "DELETE FROM events WHERE stream_id = $1";

/// Statements for one uniqueness side table. `$1` is always the key and `$2`
/// the owning aggregate id, except for `remove`, which binds only the owner.
#[derive(Debug)]
pub(crate) struct SideTable {
    pub(crate) name: &'static str,
    pub(crate) insert: &'static str,
    pub(crate) replace: &'static str,
    pub(crate) remove: &'static str,
    pub(crate) find_owner: &'static str,
}

const UNIQUE_EMAIL_ADDRESSES: SideTable = SideTable {
    name: "unique_email_addresses",
    insert: "INSERT INTO unique_email_addresses (email_address, customer_id) VALUES ($1, $2)",
    replace: "UPDATE unique_email_addresses SET email_address = $1 WHERE customer_id = $2",
    remove: "DELETE FROM unique_email_addresses WHERE customer_id = $1",
    find_owner: "SELECT customer_id FROM unique_email_addresses WHERE email_address = $1",
};

const UNIQUE_IDENTITIES: SideTable = SideTable {
    name: "unique_identities",
    insert: "INSERT INTO unique_identities (email_address, identity_id) VALUES ($1, $2)",
    replace: "UPDATE unique_identities SET email_address = $1 WHERE identity_id = $2",
    remove: "DELETE FROM unique_identities WHERE identity_id = $1",
    find_owner: "SELECT identity_id FROM unique_identities WHERE email_address = $1",
};

/// Every side table, in the order `purge` clears them.
pub(crate) const SIDE_TABLES: [&SideTable; 2] = [&UNIQUE_EMAIL_ADDRESSES, &UNIQUE_IDENTITIES];

pub(crate) fn side_table(index: UniqueIndex) -> &'static SideTable {
    match index {
        UniqueIndex::CustomerEmailAddress => &UNIQUE_EMAIL_ADDRESSES,
        UniqueIndex::IdentityEmailAddress => &UNIQUE_IDENTITIES,
    }
}
