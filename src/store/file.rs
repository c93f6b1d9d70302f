//! Flat-file credential store.
//!
//! The file is newline-delimited text: a fixed header line followed by one
//! `identifier,password_hash` record per line. Every operation reads the whole
//! file; every mutation renders the whole record set and atomically replaces
//! the file (temporary file in the same directory, fsync, rename), so a failed
//! write never leaves a partial file behind.

use super::{
    validate_identifier, CredentialRecord, CredentialStore, PasswordHasher, StoreError, DELIMITER,
};
use async_trait::async_trait;
use secrecy::SecretString;
use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};
use tempfile::NamedTempFile;
use tokio::sync::Mutex;
use tracing::{debug, instrument};

pub const HEADER: &str = "username,password";

#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    hasher: PasswordHasher,
    // Serializes read-check-rewrite so concurrent registrations cannot lose updates.
    write_lock: Mutex<()>,
}

impl FileStore {
    /// Open the store at `path`, creating a header-only file when missing.
    ///
    /// # Errors
    /// Returns an error if the file cannot be created or its content is not a
    /// credential file.
    pub async fn open(path: impl AsRef<Path>, hasher: PasswordHasher) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();

        let init_path = path.clone();
        tokio::task::spawn_blocking(move || init_file(&init_path)).await??;

        debug!("Credential file ready: {}", path.display());

        Ok(Self {
            path,
            hasher,
            write_lock: Mutex::new(()),
        })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn load(&self) -> Result<Vec<CredentialRecord>, StoreError> {
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || read_records(&path)).await?
    }

    async fn find(&self, identifier: &str) -> Result<Option<CredentialRecord>, StoreError> {
        Ok(self
            .load()
            .await?
            .into_iter()
            .find(|record| record.identifier == identifier))
    }
}

#[async_trait]
impl CredentialStore for FileStore {
    async fn exists(&self, identifier: &str) -> Result<bool, StoreError> {
        Ok(self.find(identifier).await?.is_some())
    }

    #[instrument(skip(self, password))]
    async fn verify(&self, identifier: &str, password: &SecretString) -> Result<bool, StoreError> {
        match self.find(identifier).await? {
            Some(record) => self.hasher.verify(password, &record.password_hash).await,
            None => Ok(false),
        }
    }

    #[instrument(skip(self, password))]
    async fn insert(&self, identifier: &str, password: &SecretString) -> Result<(), StoreError> {
        validate_identifier(identifier)?;

        // Early reject without paying for a hash; re-checked under the lock.
        if self.exists(identifier).await? {
            return Err(StoreError::Duplicate);
        }

        let record = CredentialRecord {
            identifier: identifier.to_string(),
            password_hash: self.hasher.hash(password).await?,
        };

        let _guard = self.write_lock.lock().await;

        let path = self.path.clone();
        tokio::task::spawn_blocking(move || {
            let mut records = read_records(&path)?;

            if records.iter().any(|r| r.identifier == record.identifier) {
                return Err(StoreError::Duplicate);
            }

            records.push(record);
            write_records(&path, &records)
        })
        .await?
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.load().await.map(|_| ())
    }
}

fn init_file(path: &Path) -> Result<(), StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content).map(|_| ()),
        Err(e) if e.kind() == ErrorKind::NotFound => write_records(path, &[]),
        Err(e) => Err(e.into()),
    }
}

fn read_records(path: &Path) -> Result<Vec<CredentialRecord>, StoreError> {
    match fs::read_to_string(path) {
        Ok(content) => parse(&content),
        // removed behind our back; the next write recreates it
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Vec::new()),
        Err(e) => Err(e.into()),
    }
}

/// Parse file content into records. Line numbers in errors are 1-based.
///
/// # Errors
/// Returns `StoreError::Corrupt` on a wrong header or a malformed record.
pub fn parse(content: &str) -> Result<Vec<CredentialRecord>, StoreError> {
    let mut lines = content.lines();

    match lines.next() {
        None => return Ok(Vec::new()),
        Some(header) if header.trim_end() == HEADER => (),
        Some(_) => return Err(StoreError::Corrupt { line: 1 }),
    }

    let mut records = Vec::new();

    for (index, line) in lines.enumerate() {
        let line_number = index + 2;
        let line = line.trim_end();

        if line.is_empty() {
            continue;
        }

        let Some((identifier, password_hash)) = line.split_once(DELIMITER) else {
            return Err(StoreError::Corrupt { line: line_number });
        };

        if validate_identifier(identifier).is_err() || password_hash.is_empty() {
            return Err(StoreError::Corrupt { line: line_number });
        }

        records.push(CredentialRecord {
            identifier: identifier.to_string(),
            password_hash: password_hash.to_string(),
        });
    }

    Ok(records)
}

#[must_use]
pub fn render(records: &[CredentialRecord]) -> String {
    let mut content = String::with_capacity(HEADER.len() + 1 + records.len() * 96);
    content.push_str(HEADER);
    content.push('\n');

    for record in records {
        content.push_str(&record.identifier);
        content.push(DELIMITER);
        content.push_str(&record.password_hash);
        content.push('\n');
    }

    content
}

fn write_records(path: &Path, records: &[CredentialRecord]) -> Result<(), StoreError> {
    let dir = path
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(render(records).as_bytes())?;
    tmp.as_file().sync_all()?;
    tmp.persist(path).map_err(|e| e.error)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn secret(s: &str) -> SecretString {
        SecretString::from(s.to_string())
    }

    async fn test_store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("users.csv"), PasswordHasher::new(4).unwrap())
            .await
            .unwrap();
        (dir, store)
    }

    #[tokio::test]
    async fn test_open_creates_header() {
        let (_dir, store) = test_store().await;
        let content = fs::read_to_string(store.path()).unwrap();
        assert_eq!(content, "username,password\n");
    }

    #[tokio::test]
    async fn test_open_rejects_foreign_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("users.csv");
        fs::write(&path, "name;hash\nalice1;x\n").unwrap();

        let result = FileStore::open(&path, PasswordHasher::new(4).unwrap()).await;
        assert!(matches!(result, Err(StoreError::Corrupt { line: 1 })));
    }

    #[tokio::test]
    async fn test_insert_then_verify() {
        let (_dir, store) = test_store().await;

        store.insert("alice1", &secret("Passw0rd!")).await.unwrap();

        assert!(store.exists("alice1").await.unwrap());
        assert!(!store.exists("Alice1").await.unwrap());
        assert!(store.verify("alice1", &secret("Passw0rd!")).await.unwrap());
        assert!(!store.verify("alice1", &secret("wrong")).await.unwrap());
        assert!(!store.verify("alice1", &secret("passw0rd!")).await.unwrap());
        assert!(!store.verify("nobody", &secret("Passw0rd!")).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_insert_rejected() {
        let (_dir, store) = test_store().await;

        store.insert("alice1", &secret("Passw0rd!")).await.unwrap();
        let second = store.insert("alice1", &secret("Other1!")).await;

        assert!(matches!(second, Err(StoreError::Duplicate)));
        // original password still wins
        assert!(store.verify("alice1", &secret("Passw0rd!")).await.unwrap());
        assert!(!store.verify("alice1", &secret("Other1!")).await.unwrap());
    }

    #[tokio::test]
    async fn test_delimiter_rejected_before_write() {
        let (_dir, store) = test_store().await;
        store.insert("alice1", &secret("Passw0rd!")).await.unwrap();
        let before = fs::read_to_string(store.path()).unwrap();

        let result = store
            .insert("mallory,$2b$04$injected", &secret("Passw0rd!"))
            .await;

        assert!(matches!(result, Err(StoreError::InvalidIdentifier)));
        assert_eq!(fs::read_to_string(store.path()).unwrap(), before);
    }

    fn dir_entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[tokio::test]
    async fn test_failed_write_surfaces_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        fs::create_dir(&data).unwrap();
        let store = FileStore::open(data.join("users.csv"), PasswordHasher::new(4).unwrap())
            .await
            .unwrap();

        fs::remove_dir_all(&data).unwrap();

        let result = store.insert("alice1", &secret("Passw0rd!")).await;
        assert!(matches!(result, Err(StoreError::Io(_))), "{result:?}");

        // nothing recreated: no store file, no stray temp file
        assert!(!data.exists());
        assert!(dir_entries(dir.path()).is_empty());
    }

    #[tokio::test]
    async fn test_failed_write_keeps_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let data = dir.path().join("data");
        let moved = dir.path().join("data-moved");
        fs::create_dir(&data).unwrap();
        let store = FileStore::open(data.join("users.csv"), PasswordHasher::new(4).unwrap())
            .await
            .unwrap();
        store.insert("alice1", &secret("Passw0rd!")).await.unwrap();
        let before = fs::read(store.path()).unwrap();

        fs::rename(&data, &moved).unwrap();
        let result = store.insert("bob22", &secret("Secr3tPass")).await;
        fs::rename(&moved, &data).unwrap();

        assert!(matches!(result, Err(StoreError::Io(_))), "{result:?}");
        assert_eq!(fs::read(store.path()).unwrap(), before);
        assert_eq!(dir_entries(&data), vec!["users.csv".to_string()]);
        assert!(store.verify("alice1", &secret("Passw0rd!")).await.unwrap());
        assert!(!store.exists("bob22").await.unwrap());
    }

    #[test]
    fn test_failed_rename_removes_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // a non-empty directory where the store file should be: rename fails
        let target = dir.path().join("users.csv");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), "x").unwrap();

        let records = vec![CredentialRecord {
            identifier: "alice1".to_string(),
            password_hash: "$2b$04$abc".to_string(),
        }];
        let result = write_records(&target, &records);

        assert!(matches!(result, Err(StoreError::Io(_))), "{result:?}");
        assert_eq!(dir_entries(dir.path()), vec!["users.csv".to_string()]);
        assert_eq!(dir_entries(&target), vec!["keep".to_string()]);
    }

    #[tokio::test]
    async fn test_file_holds_hashes_not_plaintext() {
        let (_dir, store) = test_store().await;
        store.insert("alice1", &secret("Passw0rd!")).await.unwrap();
        store.insert("bob22", &secret("Secr3tPass")).await.unwrap();

        let content = fs::read_to_string(store.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], HEADER);
        assert!(lines[1].starts_with("alice1,$2b$04$"));
        assert!(lines[2].starts_with("bob22,$2b$04$"));
        assert!(!content.contains("Passw0rd!"));
        assert!(content.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_records_survive_reopen() {
        let (dir, store) = test_store().await;
        store.insert("alice1", &secret("Passw0rd!")).await.unwrap();
        drop(store);

        let reopened = FileStore::open(dir.path().join("users.csv"), PasswordHasher::new(4).unwrap())
            .await
            .unwrap();
        assert!(reopened.verify("alice1", &secret("Passw0rd!")).await.unwrap());
    }

    #[tokio::test]
    async fn test_concurrent_inserts_are_not_lost() {
        let (_dir, store) = test_store().await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let store = Arc::clone(&store);
                tokio::spawn(async move {
                    store
                        .insert(&format!("user{i}"), &secret("Passw0rd!"))
                        .await
                })
            })
            .collect();

        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let records = parse(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(records.len(), 8);
        for i in 0..8 {
            assert!(store.exists(&format!("user{i}")).await.unwrap());
        }
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_inserts_only_one_wins() {
        let (_dir, store) = test_store().await;
        let store = Arc::new(store);

        let handles: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                tokio::spawn(async move { store.insert("alice1", &secret("Passw0rd!")).await })
            })
            .collect();

        let mut ok = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(()) => ok += 1,
                Err(StoreError::Duplicate) => (),
                Err(e) => panic!("unexpected error: {e}"),
            }
        }

        assert_eq!(ok, 1);
        let records = parse(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_parse_skips_blank_lines() {
        let records = parse("username,password\n\nalice1,$2b$04$abc\r\n\n").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].identifier, "alice1");
        assert_eq!(records[0].password_hash, "$2b$04$abc");
    }

    #[test]
    fn test_parse_empty_content() {
        assert!(parse("").unwrap().is_empty());
    }

    #[test]
    fn test_parse_reports_corrupt_line() {
        let content = "username,password\nalice1,$2b$04$abc\nbroken-line\n";
        assert!(matches!(parse(content), Err(StoreError::Corrupt { line: 3 })));

        let content = "username,password\nalice1,\n";
        assert!(matches!(parse(content), Err(StoreError::Corrupt { line: 2 })));
    }

    #[test]
    fn test_render_matches_parse() {
        let records = vec![CredentialRecord {
            identifier: "alice1".to_string(),
            password_hash: "$2b$04$abc".to_string(),
        }];
        let content = render(&records);
        assert_eq!(content, "username,password\nalice1,$2b$04$abc\n");
        assert_eq!(parse(&content).unwrap(), records);
    }
}
