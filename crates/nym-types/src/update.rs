use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::did::Did;
use crate::error::TypeError;
use crate::field::{deserialize_present, FieldUpdate};
use crate::role::Role;

/// Schema-version marker of a NYM.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum NymVersion {
    /// No DID-to-verkey binding is enforced.
    Legacy,
    /// The DID must be derivable from the initial verkey.
    SelfCertAware,
    /// The DID is fully self-certifying.
    SelfCertified,
}

impl TryFrom<u8> for NymVersion {
    type Error = TypeError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Legacy),
            1 => Ok(Self::SelfCertAware),
            2 => Ok(Self::SelfCertified),
            other => Err(TypeError::UnsupportedVersion(other)),
        }
    }
}

impl From<NymVersion> for u8 {
    fn from(version: NymVersion) -> Self {
        match version {
            NymVersion::Legacy => 0,
            NymVersion::SelfCertAware => 1,
            NymVersion::SelfCertified => 2,
        }
    }
}

/// One NYM write as handed over by the ordering layer, before the ledger
/// assigns its `seqNo` and `txnTime`.
///
/// Every attribute is a [`FieldUpdate`]: `Unset` inherits the value from the
/// identity's previous update, `Set` replaces it.
///
/// In JSON an update is a camelCase object where a missing key is `Unset`
/// and a present key is `Set`, so `"role": null` clears the role:
///
/// ```json
/// {"identifier": "V4SGRU86Z58d6TV7PBUe6f", "dest": "V4SGRU86Z58d6TV7PBUe6f", "diddocContent": "{}"}
/// ```
///
/// Binary formats such as the WAL encoding keep every slot positionally.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributeUpdate {
    /// Author of the write.
    pub identifier: Did,
    /// Subject identity whose record is updated.
    pub dest: Did,
    /// Verification key, possibly abbreviated (`~`-prefixed).
    pub verkey: FieldUpdate<String>,
    /// `Set(None)` clears a previously granted role.
    pub role: FieldUpdate<Option<Role>>,
    /// Encoded DID document content, stored verbatim.
    pub diddoc_content: FieldUpdate<String>,
    pub version: FieldUpdate<NymVersion>,
}

impl AttributeUpdate {
    /// An update touching no attributes.
    pub fn new(identifier: Did, dest: Did) -> Self {
        Self {
            identifier,
            dest,
            verkey: FieldUpdate::Unset,
            role: FieldUpdate::Unset,
            diddoc_content: FieldUpdate::Unset,
            version: FieldUpdate::Unset,
        }
    }

    pub fn with_verkey(mut self, verkey: impl Into<String>) -> Self {
        self.verkey = FieldUpdate::Set(verkey.into());
        self
    }

    pub fn with_role(mut self, role: Option<Role>) -> Self {
        self.role = FieldUpdate::Set(role);
        self
    }

    pub fn with_diddoc_content(mut self, content: impl Into<String>) -> Self {
        self.diddoc_content = FieldUpdate::Set(content.into());
        self
    }

    pub fn with_version(mut self, version: NymVersion) -> Self {
        self.version = FieldUpdate::Set(version);
        self
    }

    /// Returns `true` if the update sets no attribute at all.
    pub fn is_empty(&self) -> bool {
        !self.verkey.is_set()
            && !self.role.is_set()
            && !self.diddoc_content.is_set()
            && !self.version.is_set()
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct JsonUpdateRef<'a> {
    identifier: &'a Did,
    dest: &'a Did,
    #[serde(skip_serializing_if = "Option::is_none")]
    verkey: Option<&'a String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a Option<Role>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    diddoc_content: Option<&'a String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    version: Option<&'a NymVersion>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
struct JsonUpdate {
    identifier: Did,
    dest: Did,
    #[serde(default, deserialize_with = "deserialize_present")]
    verkey: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    role: Option<Option<Role>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    diddoc_content: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    version: Option<NymVersion>,
}

#[derive(Serialize)]
struct StoredUpdateRef<'a> {
    identifier: &'a Did,
    dest: &'a Did,
    verkey: &'a FieldUpdate<String>,
    role: &'a FieldUpdate<Option<Role>>,
    diddoc_content: &'a FieldUpdate<String>,
    version: &'a FieldUpdate<NymVersion>,
}

#[derive(Deserialize)]
struct StoredUpdate {
    identifier: Did,
    dest: Did,
    verkey: FieldUpdate<String>,
    role: FieldUpdate<Option<Role>>,
    diddoc_content: FieldUpdate<String>,
    version: FieldUpdate<NymVersion>,
}

impl Serialize for AttributeUpdate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            JsonUpdateRef {
                identifier: &self.identifier,
                dest: &self.dest,
                verkey: self.verkey.as_set(),
                role: self.role.as_set(),
                diddoc_content: self.diddoc_content.as_set(),
                version: self.version.as_set(),
            }
            .serialize(serializer)
        } else {
            StoredUpdateRef {
                identifier: &self.identifier,
                dest: &self.dest,
                verkey: &self.verkey,
                role: &self.role,
                diddoc_content: &self.diddoc_content,
                version: &self.version,
            }
            .serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for AttributeUpdate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let u = JsonUpdate::deserialize(deserializer)?;
            Ok(Self {
                identifier: u.identifier,
                dest: u.dest,
                verkey: u.verkey.into(),
                role: u.role.into(),
                diddoc_content: u.diddoc_content.into(),
                version: u.version.into(),
            })
        } else {
            let u = StoredUpdate::deserialize(deserializer)?;
            Ok(Self {
                identifier: u.identifier,
                dest: u.dest,
                verkey: u.verkey,
                role: u.role,
                diddoc_content: u.diddoc_content,
                version: u.version,
            })
        }
    }
}
