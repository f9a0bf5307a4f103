use md5::{Digest, Md5};
use serde::Serialize;
use uuid::{Builder, Uuid};

pub const DEFAULT_USERNAME: &str = "OfflineUser";
const OFFLINE_ACCESS_TOKEN: &str = "0";
const MIN_NAME_LEN: usize = 3;
const MAX_NAME_LEN: usize = 16;

/// Credentials handed to the game for an offline session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OfflineIdentity {
    pub username: String,
    pub uuid: Uuid,
    pub access_token: String,
    pub user_type: String,
}

impl OfflineIdentity {
    /// Identity for `raw_name` after sanitising it.
    pub fn new(raw_name: &str) -> Self {
        let username = sanitize_username(raw_name);
        let uuid = offline_uuid(&username);
        Self {
            username,
            uuid,
            access_token: OFFLINE_ACCESS_TOKEN.into(),
            user_type: "mojang".into(),
        }
    }

    /// First non-blank of the explicit name and the saved one, else
    /// [`DEFAULT_USERNAME`].
    pub fn resolve(explicit: Option<&str>, saved: Option<&str>) -> Self {
        let name = [explicit, saved]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|name| !name.is_empty())
            .unwrap_or(DEFAULT_USERNAME);
        Self::new(name)
    }

    /// Dashless uuid as the game expects in `${auth_uuid}`.
    pub fn uuid_simple(&self) -> String {
        self.uuid.simple().to_string()
    }
}

/// Restrict a name to what the game accepts: `[A-Za-z0-9_]`, 3 to 16 chars.
/// Other characters become `_`; short names are padded with `_`.
pub fn sanitize_username(name: &str) -> String {
    let mut cleaned: String = name
        .trim()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    while cleaned.len() < MIN_NAME_LEN {
        cleaned.push('_');
    }
    cleaned.truncate(MAX_NAME_LEN);
    cleaned
}

/// Name-based v3 uuid the vanilla server assigns to offline players.
pub fn offline_uuid(name: &str) -> Uuid {
    let digest = Md5::digest(format!("OfflinePlayer:{name}").as_bytes());
    let mut bytes = [0_u8; 16];
    bytes.copy_from_slice(&digest);
    Builder::from_md5_bytes(bytes).into_uuid()
}
