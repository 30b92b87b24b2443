use crate::{EmberError, ErrorCode};

impl From<std::io::Error> for EmberError {
    fn from(err: std::io::Error) -> Self {
        EmberError::new(ErrorCode::Unknown, err.to_string())
    }
}

impl From<serde_json::Error> for EmberError {
    fn from(err: serde_json::Error) -> Self {
        EmberError::new(ErrorCode::SerializationFailed, err.to_string())
    }
}

impl From<serde_yaml::Error> for EmberError {
    fn from(err: serde_yaml::Error) -> Self {
        EmberError::new(ErrorCode::InvalidYaml, err.to_string())
    }
}

/// Levenshtein-based suggestion; `None` when nothing is within distance 3.
pub fn find_closest_match(target: &str, options: &[String]) -> Option<String> {
    let mut best_match: Option<&str> = None;
    let mut min_distance = usize::MAX;

    for option in options {
        let distance = levenshtein(target, option);
        if distance < min_distance && distance <= 3 {
            min_distance = distance;
            best_match = Some(option.as_str());
        }
    }

    best_match.map(|s| s.to_string())
}

fn levenshtein(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for (i, ca) in a.iter().enumerate() {
        curr[0] = i + 1;
        for (j, cb) in b.iter().enumerate() {
            let cost = usize::from(ca != cb);
            curr[j + 1] = (prev[j + 1] + 1).min(curr[j] + 1).min(prev[j] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levenshtein_distance() {
        assert_eq!(levenshtein("kitten", "sitting"), 3);
        assert_eq!(levenshtein("book", "back"), 2);
        assert_eq!(levenshtein("", ""), 0);
        assert_eq!(levenshtein("same", "same"), 0);
        assert_eq!(levenshtein("", "abc"), 3);
    }

    #[test]
    fn test_find_closest_match() {
        let options = vec![
            "emp_no".to_string(),
            "last_name".to_string(),
            "hire_date".to_string(),
        ];

        assert_eq!(
            find_closest_match("emp_no", &options),
            Some("emp_no".to_string())
        );
        assert_eq!(
            find_closest_match("empno", &options),
            Some("emp_no".to_string())
        );
        assert_eq!(find_closest_match("completely_different", &options), None);
    }

    #[test]
    fn test_io_error_mapping() {
        let io_err = std::io::Error::other("File error");
        let err: EmberError = io_err.into();
        assert_eq!(err.code, ErrorCode::Unknown);
        assert!(err.message.contains("File error"));
    }
}
