use chrono::Utc;

pub type Time = chrono::DateTime<Utc>;

mod error;
pub use error::Error;

mod gateway;
pub use gateway::{Gateway, GatewayError};

mod post;
pub use post::{NewPost, Post, PostEdit, PostId, ANONYMOUS};

// All `validate` functions in this crate are run both client-side, before
// anything is sent, and server-side, on every request. Keep them cheap.

pub fn validate_string(s: &str) -> Result<(), Error> {
    if s.contains('\0') {
        return Err(Error::NullByteInString(String::from(s)));
    }
    Ok(())
}

/// Content must contain something other than whitespace
pub fn validate_content(s: &str) -> Result<(), Error> {
    validate_string(s)?;
    if s.trim().is_empty() {
        return Err(Error::EmptyContent);
    }
    Ok(())
}

/// Blank author names are stored as no author name at all
pub fn normalize_author_name(name: Option<String>) -> Option<String> {
    name.and_then(|n| {
        let trimmed = n.trim();
        match trimmed.is_empty() {
            true => None,
            false => Some(String::from(trimmed)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_validation() {
        assert_eq!(validate_content("hello"), Ok(()));
        assert_eq!(validate_content("  hello  "), Ok(()));
        assert_eq!(validate_content(""), Err(Error::EmptyContent));
        assert_eq!(validate_content("   \n\t "), Err(Error::EmptyContent));
        assert_eq!(
            validate_content("foo\0bar"),
            Err(Error::NullByteInString(String::from("foo\0bar"))),
        );
    }

    #[test]
    fn author_name_normalization() {
        assert_eq!(normalize_author_name(None), None);
        assert_eq!(normalize_author_name(Some(String::new())), None);
        assert_eq!(normalize_author_name(Some(String::from("   "))), None);
        assert_eq!(
            normalize_author_name(Some(String::from(" hanako "))),
            Some(String::from("hanako")),
        );
    }
}
