//! Candidate word sources
//!
//! A [`WordSource`] hands out each word exactly once, however many workers
//! pull from it concurrently, and knows up-front how many words it holds.

use crate::BusterError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs::File;
use tokio::io::{AsyncBufReadExt, BufReader, Lines};
use tokio::sync::Mutex;

/// Thread-safe, finite sequence of candidate words
#[async_trait]
pub trait WordSource: Send + Sync {
    /// Returns the next word, or `None` once the source is exhausted
    async fn next_word(&self) -> Option<String>;

    /// Total number of words, used for progress reporting
    fn total_hint(&self) -> usize;
}

/// Normalizes a raw wordlist line, `None` for lines that aren't words
fn clean_line(line: &str) -> Option<&str> {
    let word = line.trim();
    if word.is_empty() || word.starts_with('#') {
        None
    } else {
        Some(word)
    }
}

/// Wordlist streamed lazily from a file
///
/// Blank lines and `#` comments are skipped.
pub struct FileWordlist {
    path: PathBuf,
    lines: Mutex<Lines<BufReader<File>>>,
    total: usize,
}

impl FileWordlist {
    /// Opens a wordlist file and counts its words
    ///
    /// # Arguments
    ///
    /// * `path` - Path to the wordlist
    ///
    /// # Returns
    ///
    /// * `Ok(FileWordlist)` - Wordlist ready to be drained
    /// * `Err(BusterError)` - The file is missing or unreadable
    pub async fn open(path: &Path) -> Result<Self, BusterError> {
        let wordlist_error = |source| BusterError::Wordlist {
            path: path.display().to_string(),
            source,
        };

        let total = count_words(path).await.map_err(wordlist_error)?;
        let file = File::open(path).await.map_err(wordlist_error)?;

        tracing::debug!("Wordlist {} holds {} words", path.display(), total);

        Ok(Self {
            path: path.to_path_buf(),
            lines: Mutex::new(BufReader::new(file).lines()),
            total,
        })
    }
}

async fn count_words(path: &Path) -> std::io::Result<usize> {
    let file = File::open(path).await?;
    let mut lines = BufReader::new(file).lines();
    let mut total = 0;
    while let Some(line) = lines.next_line().await? {
        if clean_line(&line).is_some() {
            total += 1;
        }
    }
    Ok(total)
}

#[async_trait]
impl WordSource for FileWordlist {
    async fn next_word(&self) -> Option<String> {
        let mut lines = self.lines.lock().await;
        loop {
            match lines.next_line().await {
                Ok(Some(line)) => {
                    if let Some(word) = clean_line(&line) {
                        return Some(word.to_string());
                    }
                }
                Ok(None) => return None,
                Err(e) => {
                    tracing::error!("Failed to read wordlist {}: {}", self.path.display(), e);
                    return None;
                }
            }
        }
    }

    fn total_hint(&self) -> usize {
        self.total
    }
}

/// Wordlist held in memory
pub struct MemoryWordlist {
    words: std::sync::Mutex<std::vec::IntoIter<String>>,
    total: usize,
}

impl MemoryWordlist {
    pub fn new<I, S>(words: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let words: Vec<String> = words.into_iter().map(Into::into).collect();
        Self {
            total: words.len(),
            words: std::sync::Mutex::new(words.into_iter()),
        }
    }
}

#[async_trait]
impl WordSource for MemoryWordlist {
    async fn next_word(&self) -> Option<String> {
        match self.words.lock() {
            Ok(mut words) => words.next(),
            Err(poisoned) => poisoned.into_inner().next(),
        }
    }

    fn total_hint(&self) -> usize {
        self.total
    }
}
