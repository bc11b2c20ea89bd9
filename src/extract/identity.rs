use sha2::{Digest, Sha256};

/// Number of hex characters of the digest kept in an id
pub const ID_HASH_LENGTH: usize = 16;

/// Which field an entry id was derived from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IdentityKind {
    Link,
    Title,
}

impl IdentityKind {
    fn prefix(&self) -> &'static str {
        match self {
            Self::Link => "link",
            Self::Title => "title",
        }
    }
}

/// Derives a stable entry id from its link, or from its title when there is no link
///
/// The id is `link-` or `title-` followed by the first
/// [`ID_HASH_LENGTH`] hex characters of the SHA-256 of the source.
///
/// # Returns
///
/// * `Some(String)` - The id
/// * `None` - Both fields are absent
///
/// # Examples
///
/// ```
/// use feed_scotty::identify;
///
/// let id = identify(Some("https://ex.com/a"), Some("A")).unwrap();
/// assert!(id.starts_with("link-"));
/// assert_eq!(id, identify(Some("https://ex.com/a"), Some("Renamed")).unwrap());
/// ```
pub fn identify(link: Option<&str>, title: Option<&str>) -> Option<String> {
    let (kind, source) = match (link, title) {
        (Some(link), _) => (IdentityKind::Link, link),
        (None, Some(title)) => (IdentityKind::Title, title),
        (None, None) => return None,
    };

    let digest = hex::encode(Sha256::digest(source.as_bytes()));
    Some(format!("{}-{}", kind.prefix(), &digest[..ID_HASH_LENGTH]))
}
