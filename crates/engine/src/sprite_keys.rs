use thiserror::Error;

pub const MAX_SPRITE_KEY_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SpriteKeyError {
    #[error("sprite key must not be empty")]
    Empty,
    #[error("sprite key is {len} bytes, limit is {MAX_SPRITE_KEY_LEN}")]
    TooLong { len: usize },
    #[error("sprite key must not start or end with '/'")]
    EdgeSlash,
    #[error("sprite key must not contain an empty path segment")]
    EmptySegment,
    #[error("sprite key must not contain '..'")]
    ParentTraversal,
    #[error("sprite key contains invalid character '{character}'")]
    InvalidCharacter { character: char },
}

/// Keys name files under the sprite directory, so they are restricted to
/// lowercase relative paths.
pub fn validate_sprite_key(key: &str) -> Result<(), SpriteKeyError> {
    if key.is_empty() {
        return Err(SpriteKeyError::Empty);
    }
    if key.len() > MAX_SPRITE_KEY_LEN {
        return Err(SpriteKeyError::TooLong { len: key.len() });
    }
    if key.starts_with('/') || key.ends_with('/') {
        return Err(SpriteKeyError::EdgeSlash);
    }
    if key.contains("//") {
        return Err(SpriteKeyError::EmptySegment);
    }
    if key.contains("..") {
        return Err(SpriteKeyError::ParentTraversal);
    }
    match key
        .chars()
        .find(|ch| !(ch.is_ascii_lowercase() || ch.is_ascii_digit() || matches!(ch, '_' | '/' | '-')))
    {
        Some(character) => Err(SpriteKeyError::InvalidCharacter { character }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_fighter_and_effect_keys() {
        for key in ["fighter/idle", "fighter/run_3", "fx/double-jump", "stage/main"] {
            assert!(validate_sprite_key(key).is_ok(), "key={key}");
        }
    }

    #[test]
    fn rejects_invalid_keys() {
        for key in ["", "/a", "a/", "a//b", "..", "a/../b", r"a\b", "A", "a.png"] {
            assert!(validate_sprite_key(key).is_err(), "key={key}");
        }
    }

    #[test]
    fn reports_offending_character() {
        assert_eq!(
            validate_sprite_key("fighter/Idle"),
            Err(SpriteKeyError::InvalidCharacter { character: 'I' })
        );
    }

    #[test]
    fn rejects_overlong_keys() {
        let key = "a".repeat(MAX_SPRITE_KEY_LEN + 1);
        assert_eq!(
            validate_sprite_key(&key),
            Err(SpriteKeyError::TooLong {
                len: MAX_SPRITE_KEY_LEN + 1
            })
        );
    }
}
