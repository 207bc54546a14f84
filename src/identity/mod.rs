//! Durable instance identity.
//!
//! One record per data directory, created on first start and read on every
//! start after that. The record is a single BSON document, the same dump
//! format the server uses for its other small metadata files:
//!
//! ```text
//! <db_path>/psmdb_telemetry.data
//! { db_instance_id: ObjectId("<24 hex chars>") }
//! ```
//!
//! Ids are ObjectIds rendered as lowercase hex. The internal id is minted for
//! every process run and never persisted.


use std::fs;
use std::io::ErrorKind;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;

use bson::oid::ObjectId;
use bson::Bson;
use bson::Document;
use tracing::info;
use tracing::warn;

use crate::constants::IDENTITY_FILE_NAME;
use crate::constants::IDENTITY_INSTANCE_ID_KEY;
use crate::IdentityError;
use crate::Result;

/// Identity stamped on every snapshot of this process run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstanceIdentity {
    instance_id: String,
    internal_id: String,
}

/// How the identity came to be on this start
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityOrigin {
    /// Existing record read from disk
    Loaded,
    /// No record existed: first run on this data directory
    Created,
    /// A record existed but was unreadable and has been replaced
    Regenerated,
}

impl InstanceIdentity {
    pub fn new(
        instance_id: impl Into<String>,
        internal_id: impl Into<String>,
    ) -> Self {
        Self {
            instance_id: instance_id.into(),
            internal_id: internal_id.into(),
        }
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }

    pub fn internal_id(&self) -> &str {
        &self.internal_id
    }
}

pub(crate) fn generate_id() -> String {
    ObjectId::new().to_hex()
}

pub fn identity_path(db_path: &Path) -> PathBuf {
    db_path.join(IDENTITY_FILE_NAME)
}

/// Loads the identity record from `db_path`, creating it when missing or
/// corrupt. A fresh internal id is generated on every call.
///
/// Failing to persist a newly generated record is returned as an error so
/// the caller can decide whether to run with an unpersisted identity.
pub fn load_or_create(db_path: &Path) -> Result<(InstanceIdentity, IdentityOrigin)> {
    let path = identity_path(db_path);
    let internal_id = generate_id();

    let origin = match read_instance_id(&path) {
        Ok(Some(instance_id)) => {
            info!(instance_id = %instance_id, path = %path.display(), "loaded telemetry identity");
            return Ok((InstanceIdentity::new(instance_id, internal_id), IdentityOrigin::Loaded));
        }
        Ok(None) => {
            info!(path = %path.display(), "no telemetry identity record, first run on this data directory");
            IdentityOrigin::Created
        }
        Err(e) => {
            warn!(error = %e, "telemetry identity record unreadable, generating a new instance id");
            IdentityOrigin::Regenerated
        }
    };

    let oid = ObjectId::new();
    persist_instance_id(&path, oid)?;
    let instance_id = oid.to_hex();
    info!(instance_id = %instance_id, ?origin, "persisted new telemetry identity");

    Ok((InstanceIdentity::new(instance_id, internal_id), origin))
}

/// `Ok(None)` when the record does not exist
fn read_instance_id(path: &Path) -> std::result::Result<Option<String>, IdentityError> {
    let raw = match fs::read(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
        Err(e) => {
            return Err(IdentityError::Corrupt {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })
        }
    };

    let corrupt = |reason: String| IdentityError::Corrupt {
        path: path.to_path_buf(),
        reason,
    };

    let record = Document::from_reader(raw.as_slice()).map_err(|e| corrupt(e.to_string()))?;

    // the id ends up in snapshot file names, so only a real ObjectId is accepted
    match record.get(IDENTITY_INSTANCE_ID_KEY) {
        Some(Bson::ObjectId(oid)) => Ok(Some(oid.to_hex())),
        Some(Bson::String(hex)) => ObjectId::parse_str(hex)
            .map(|oid| Some(oid.to_hex()))
            .map_err(|_| corrupt(format!("{IDENTITY_INSTANCE_ID_KEY} is not an ObjectId"))),
        Some(_) => Err(corrupt(format!("{IDENTITY_INSTANCE_ID_KEY} is not an ObjectId"))),
        None => Err(corrupt(format!("missing {IDENTITY_INSTANCE_ID_KEY}"))),
    }
}

/// Write-then-rename so a crash never leaves a half-written record
fn persist_instance_id(
    path: &Path,
    instance_id: ObjectId,
) -> std::result::Result<(), IdentityError> {
    let persist_err = |source| IdentityError::Persist {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(persist_err)?;
    }

    let mut record = Document::new();
    record.insert(IDENTITY_INSTANCE_ID_KEY, instance_id);
    let mut body = Vec::new();
    record
        .to_writer(&mut body)
        .map_err(|e| persist_err(std::io::Error::new(ErrorKind::InvalidData, e)))?;

    let tmp = path.with_extension("data.tmp");
    {
        let mut file = fs::File::create(&tmp).map_err(persist_err)?;
        file.write_all(&body).map_err(persist_err)?;
        file.sync_all().map_err(persist_err)?;
    }
    fs::rename(&tmp, path).map_err(persist_err)?;
    Ok(())
}
