/// CSV catalog loading
///
/// Reads the rows written by extraction mode back into `ImageRecord`s.
/// A row is `path, field...`; among the fields, a `RANK n` token becomes the
/// rank and a 64-character hex token becomes the hash, and everything else
/// is a keyword. A file that fails to parse anywhere is dropped entirely.
use csv::ReaderBuilder;
use std::fs::File;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{error, info};

use super::data::{ImageRecord, DEFAULT_RANK};
use crate::extract::keywords::{dedup_case_insensitive, parse_rank};
use crate::hash;

/// A CSV file that could not be loaded
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("cannot open {path}: {source}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed CSV in {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

/// Parse the fields of one row into a record
///
/// `csv_dir` is where the CSV file lives; relative filenames are looked up
/// there as well as in the working directory. Returns `None` for rows with
/// fewer than two fields.
pub fn parse_row<'a, I>(fields: I, csv_dir: &Path) -> Option<ImageRecord>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut fields = fields.into_iter();
    let filename = fields.next()?.to_string();
    let rest: Vec<&str> = fields.collect();
    if rest.is_empty() {
        return None;
    }

    let mut rank = DEFAULT_RANK;
    let mut hash_token = None;
    let mut keywords = Vec::new();

    for item in rest.iter().map(|f| f.trim()).filter(|f| !f.is_empty()) {
        if let Some(value) = parse_rank(item) {
            rank = value;
        } else if hash::is_sha256_hex(item) {
            hash_token = Some(item.to_lowercase());
        } else {
            keywords.push(item);
        }
    }

    let hash = hash_token.unwrap_or_else(|| hash::sha256_hex(filename.as_bytes()));
    let full_path = locate(&filename, csv_dir);

    Some(ImageRecord {
        keywords: dedup_case_insensitive(keywords),
        filename,
        rank,
        hash,
        full_path,
    })
}

/// First existing candidate for a CSV filename, made absolute
fn locate(filename: &str, csv_dir: &Path) -> Option<PathBuf> {
    let mut candidates = vec![PathBuf::from(filename), csv_dir.join(filename)];
    if let Ok(cwd) = std::env::current_dir() {
        candidates.push(cwd.join(filename));
    }

    candidates
        .into_iter()
        .find(|p| p.exists())
        .map(|p| p.canonicalize().unwrap_or(p))
}

/// Parse a whole CSV file
///
/// Either every row is read or the file yields an error; partial results
/// are never returned.
pub fn parse_csv_file(path: &Path) -> Result<Vec<ImageRecord>, CatalogError> {
    let file = File::open(path).map_err(|source| CatalogError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    let mut reader = ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(file);

    let csv_dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut records = Vec::new();

    for row in reader.records() {
        let row = row.map_err(|source| CatalogError::Csv {
            path: path.to_path_buf(),
            source,
        })?;
        if let Some(record) = parse_row(row.iter(), csv_dir) {
            records.push(record);
        }
    }

    Ok(records)
}

/// Load several CSV files, skipping any that fail
pub fn load_csv_files(paths: &[PathBuf]) -> Vec<ImageRecord> {
    let mut all = Vec::new();
    for path in paths {
        let shown = path.canonicalize().unwrap_or_else(|_| path.clone());
        info!("Processing CSV file: {}", shown.display());
        match parse_csv_file(path) {
            Ok(records) => {
                info!("📄 {} row(s) from {}", records.len(), shown.display());
                all.extend(records);
            }
            Err(err) => error!("Error parsing CSV file {}: {}", shown.display(), err),
        }
    }
    all
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const HASH: &str = "abc1230000000000000000000000000000000000000000000000000000000def";

    #[test]
    fn test_example_row() {
        let line = format!("photo1.jpg,cat,Cat,RANK 7,dog,{}", HASH);
        let record = parse_row(line.split(','), Path::new(".")).unwrap();

        assert_eq!(record.filename, "photo1.jpg");
        assert_eq!(record.keywords, vec!["cat", "dog"]);
        assert_eq!(record.rank, 7);
        assert_eq!(record.hash, HASH);
    }

    #[test]
    fn test_hash_is_lowercased_and_not_a_keyword() {
        let upper = HASH.to_uppercase();
        let record = parse_row(["a.png", "sky", upper.as_str()], Path::new(".")).unwrap();
        assert_eq!(record.hash, HASH);
        assert_eq!(record.keywords, vec!["sky"]);
    }

    #[test]
    fn test_defaults_when_tokens_missing() {
        let record = parse_row(["a.png", " sky ", "", "sea"], Path::new(".")).unwrap();
        assert_eq!(record.rank, DEFAULT_RANK);
        assert_eq!(record.hash, hash::sha256_hex(b"a.png"));
        assert_eq!(record.keywords, vec!["sky", "sea"]);
    }

    #[test]
    fn test_oversized_rank_is_not_a_keyword() {
        let record = parse_row(["a.png", "sky", "RANK 99999999999"], Path::new(".")).unwrap();
        assert_eq!(record.rank, u32::MAX);
        assert_eq!(record.keywords, vec!["sky"]);
    }

    #[test]
    fn test_short_rows_are_skipped() {
        assert!(parse_row(["lonely.png"], Path::new(".")).is_none());
        assert!(parse_row(std::iter::empty(), Path::new(".")).is_none());
    }

    #[test]
    fn test_filename_resolved_next_to_csv() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("pic.png"), b"x").unwrap();
        fs::write(
            dir.path().join("keywords.txt"),
            format!("pic.png,red,RANK 3,{}\nother.png,blue\n", HASH),
        )
        .unwrap();

        let records = parse_csv_file(&dir.path().join("keywords.txt")).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(
            records[0].full_path,
            Some(dir.path().join("pic.png").canonicalize().unwrap())
        );
        assert_eq!(records[0].rank, 3);
        assert_eq!(records[1].full_path, None);
    }

    #[test]
    fn test_quoted_fields_keep_commas() {
        let dir = tempfile::tempdir().unwrap();
        let csv_path = dir.path().join("quoted.txt");
        fs::write(&csv_path, "\"/tmp/a, b.png\",\"red, blue\",green\n").unwrap();

        let records = parse_csv_file(&csv_path).unwrap();
        assert_eq!(records[0].filename, "/tmp/a, b.png");
        assert_eq!(records[0].keywords, vec!["red, blue", "green"]);
    }

    #[test]
    fn test_bad_file_is_discarded_whole() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("good.txt");
        let bad = dir.path().join("bad.txt");
        fs::write(&good, "a.png,cat\n").unwrap();
        // Valid first row, then invalid UTF-8
        let mut bytes = b"b.png,dog\nc.png,".to_vec();
        bytes.extend_from_slice(&[0xff, 0xfe, b'\n']);
        fs::write(&bad, bytes).unwrap();

        assert!(parse_csv_file(&bad).is_err());

        let missing = dir.path().join("missing.txt");
        let records = load_csv_files(&[bad, good, missing]);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].filename, "a.png");
    }
}
