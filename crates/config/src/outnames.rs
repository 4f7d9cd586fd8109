//! Validates the `outNames` option (§6): when supplied, its count must
//! match the output width exactly and every name must match
//! `[A-Za-z_][A-Za-z0-9_]*`. When omitted, this crate does not invent
//! names here -- the engine falls back to left-key / payload-column names
//! at assembly time.

use value::{JoinError, JoinResult};

fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

pub fn resolve(out_names: Option<Vec<String>>, output_width: usize) -> JoinResult<Vec<String>> {
    match out_names {
        None => Ok(Vec::new()),
        Some(names) => {
            if names.len() != output_width {
                return Err(JoinError::Config(format!(
                    "outNames has {} entries but output has {output_width} columns",
                    names.len()
                )));
            }
            for n in &names {
                if !is_valid_identifier(n) {
                    return Err(JoinError::Config(format!("invalid outNames entry '{n}'")));
                }
            }
            Ok(names)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_matching_count_and_valid_identifiers() {
        let names = resolve(Some(vec!["a".into(), "_b1".into()]), 2).unwrap();
        assert_eq!(names, vec!["a".to_string(), "_b1".to_string()]);
    }

    #[test]
    fn rejects_count_mismatch() {
        assert!(resolve(Some(vec!["a".into()]), 2).is_err());
    }

    #[test]
    fn rejects_invalid_identifier_shape() {
        assert!(resolve(Some(vec!["1bad".into()]), 1).is_err());
        assert!(resolve(Some(vec!["bad-name".into()]), 1).is_err());
    }

    #[test]
    fn none_resolves_to_empty() {
        assert_eq!(resolve(None, 3).unwrap(), Vec::<String>::new());
    }
}
