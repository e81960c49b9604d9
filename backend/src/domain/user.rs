//! User data model.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Validation errors returned by the user value constructors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserValidationError {
    /// The identifier was empty.
    EmptyId,
    /// The identifier was not a UUID.
    InvalidId,
    /// The nickname was empty or whitespace.
    EmptyNickname,
    /// The nickname exceeded [`NICKNAME_MAX`] characters.
    NicknameTooLong {
        /// Maximum accepted length.
        max: usize,
    },
    /// The nickname carried leading or trailing whitespace.
    NicknameUntrimmed,
    /// The nickname contained control characters.
    NicknameControlCharacters,
    /// The credential hash was empty.
    EmptyPasswordHash,
}

impl fmt::Display for UserValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "user id must not be empty"),
            Self::InvalidId => write!(f, "user id must be a valid UUID"),
            Self::EmptyNickname => write!(f, "nickname must not be empty"),
            Self::NicknameTooLong { max } => {
                write!(f, "nickname must be at most {max} characters")
            }
            Self::NicknameUntrimmed => {
                write!(f, "nickname must not start or end with whitespace")
            }
            Self::NicknameControlCharacters => {
                write!(f, "nickname must not contain control characters")
            }
            Self::EmptyPasswordHash => write!(f, "password hash must not be empty"),
        }
    }
}

impl std::error::Error for UserValidationError {}

/// Stable user identifier stored as a UUID.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct UserId(Uuid);

impl UserId {
    /// Validate and construct a [`UserId`] from borrowed input.
    pub fn new(id: impl AsRef<str>) -> Result<Self, UserValidationError> {
        let id = id.as_ref();
        if id.is_empty() {
            return Err(UserValidationError::EmptyId);
        }
        if id.trim() != id {
            return Err(UserValidationError::InvalidId);
        }
        Uuid::parse_str(id)
            .map(Self)
            .map_err(|_| UserValidationError::InvalidId)
    }

    /// Generate a new random [`UserId`].
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }

    /// Wrap a UUID read back from storage.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Access the underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl From<UserId> for String {
    fn from(value: UserId) -> Self {
        value.0.to_string()
    }
}

impl TryFrom<String> for UserId {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Maximum allowed length for a nickname.
pub const NICKNAME_MAX: usize = 32;

/// Public, case-sensitive handle chosen at registration.
///
/// Uniqueness is a store concern; this type only guards the shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Nickname(String);

impl Nickname {
    /// Validate and construct a [`Nickname`].
    pub fn new(nickname: impl Into<String>) -> Result<Self, UserValidationError> {
        let nickname = nickname.into();
        if nickname.trim().is_empty() {
            return Err(UserValidationError::EmptyNickname);
        }
        if nickname.trim() != nickname {
            return Err(UserValidationError::NicknameUntrimmed);
        }
        if nickname.chars().count() > NICKNAME_MAX {
            return Err(UserValidationError::NicknameTooLong { max: NICKNAME_MAX });
        }
        if nickname.chars().any(char::is_control) {
            return Err(UserValidationError::NicknameControlCharacters);
        }
        Ok(Self(nickname))
    }
}

impl AsRef<str> for Nickname {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for Nickname {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_ref())
    }
}

impl From<Nickname> for String {
    fn from(value: Nickname) -> Self {
        value.0
    }
}

impl TryFrom<String> for Nickname {
    type Error = UserValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

/// Opaque credential digest produced by a
/// [`CredentialHasher`](crate::domain::ports::CredentialHasher).
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Wrap a stored digest.
    pub fn new(hash: impl Into<String>) -> Result<Self, UserValidationError> {
        let hash = hash.into();
        if hash.is_empty() {
            return Err(UserValidationError::EmptyPasswordHash);
        }
        Ok(Self(hash))
    }

    /// Wrap a freshly computed hex digest, which is never empty.
    pub(crate) fn from_hex_digest(digest: String) -> Self {
        debug_assert!(!digest.is_empty(), "hex digest must not be empty");
        Self(digest)
    }
}

impl AsRef<str> for PasswordHash {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash(..)")
    }
}

/// Application user.
///
/// ## Invariants
/// - `nickname` is unique across users at any point after a successful
///   insert; the store enforces this.
/// - Users are only ever deleted through the cascade.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    id: UserId,
    nickname: Nickname,
    #[serde(skip)]
    password_hash: PasswordHash,
    created_at: DateTime<Utc>,
}

impl User {
    /// Build a new [`User`] from validated components.
    pub fn new(
        id: UserId,
        nickname: Nickname,
        password_hash: PasswordHash,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            nickname,
            password_hash,
            created_at,
        }
    }

    /// Stable user identifier.
    pub fn id(&self) -> &UserId {
        &self.id
    }

    /// Nickname shown to other users.
    pub fn nickname(&self) -> &Nickname {
        &self.nickname
    }

    /// Stored credential digest.
    pub fn password_hash(&self) -> &PasswordHash {
        &self.password_hash
    }

    /// Registration timestamp.
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Return a copy carrying a replacement credential.
    pub fn with_password_hash(mut self, password_hash: PasswordHash) -> Self {
        self.password_hash = password_hash;
        self
    }
}
