// -
// On-disk names

/// Identity record kept inside every instance's own data directory
pub const IDENTITY_FILE_NAME: &str = "psmdb_telemetry.data";

/// Key of the instance id inside the identity record
pub(crate) const IDENTITY_INSTANCE_ID_KEY: &str = "db_instance_id";

/// Extension of finalized snapshot files
pub(crate) const SNAPSHOT_FILE_EXTENSION: &str = "json";

/// Prefix of in-flight snapshot files; listing ignores them
pub(crate) const SNAPSHOT_TEMP_PREFIX: &str = ".tmp-";

/// How many millisecond bumps a writer tries before giving up on a name
pub(crate) const SNAPSHOT_NAME_ATTEMPTS: u64 = 1000;

// -
// Snapshot source markers

pub(crate) const SOURCE_MONGOD: &str = "mongod";
pub(crate) const SOURCE_MONGOS: &str = "mongos";
pub(crate) const SOURCE_PRO_SUFFIX: &str = "-pro";
