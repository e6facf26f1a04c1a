//! CLI command implementations, one module per verb.

pub mod add;
pub mod count;
pub mod delete_all;
pub mod export;
pub mod print;
pub mod remove;

use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

use crate::error::AppError;

/// Opens the newline-delimited domain input: the given file, or stdin.
pub(crate) fn input_reader(path: Option<&Path>) -> Result<Box<dyn BufRead>, AppError> {
    match path {
        Some(p) => {
            let file = File::open(p).map_err(|e| {
                if e.kind() == io::ErrorKind::NotFound {
                    AppError::FileNotFound {
                        path: p.to_path_buf(),
                    }
                } else {
                    AppError::Io(e)
                }
            })?;
            Ok(Box::new(BufReader::with_capacity(1024 * 1024, file)))
        }
        None => Ok(Box::new(BufReader::new(io::stdin().lock()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_file_maps_to_file_not_found() {
        let err = input_reader(Some(Path::new("/no/such/domains.txt")))
            .map(|_| ())
            .unwrap_err();
        assert!(matches!(err, AppError::FileNotFound { .. }));
        assert_eq!(err.exit_code(), 5);
    }

    #[test]
    fn existing_file_opens() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("domains.txt");
        std::fs::write(&path, "example.com\n").unwrap();

        let mut reader = input_reader(Some(&path)).unwrap();
        let mut line = String::new();
        reader.read_line(&mut line).unwrap();
        assert_eq!(line.trim(), "example.com");
    }
}
