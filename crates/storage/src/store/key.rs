//! Key prefixing.

const SEPARATOR: char = '_';

/// `prefix_key` when `prefix` is non-empty, else `key` unchanged.
pub fn add_prefix(key: &str, prefix: &str) -> String {
    if prefix.is_empty() {
        key.to_owned()
    } else {
        format!("{prefix}{SEPARATOR}{key}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefix_is_joined_with_underscore() {
        assert_eq!(add_prefix("token", "ENCRYPTED"), "ENCRYPTED_token");
        assert_eq!(add_prefix("a_b", "P"), "P_a_b");
        assert_eq!(add_prefix("ключ", "前缀"), "前缀_ключ");
    }

    #[test]
    fn empty_prefix_leaves_key_bare() {
        assert_eq!(add_prefix("token", ""), "token");
    }
}
