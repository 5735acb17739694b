use uuid::Uuid;

/// Proof of ownership for one acquisition.
///
/// A UUIDv7: 48 bits of millisecond timestamp followed by 74 random bits, so
/// two acquisitions never share a token, even back to back in one process.
/// `Debug` is redacted; the token must not leak into logs or responses.
#[derive(Clone, PartialEq, Eq)]
pub(crate) struct OwnerToken(String);

impl OwnerToken {
    pub(crate) fn generate() -> Self {
        Self(Uuid::now_v7().simple().to_string())
    }

    pub(crate) fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for OwnerToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("OwnerToken(..)")
    }
}
