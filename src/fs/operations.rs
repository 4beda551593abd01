use std::{
    fs::File,
    io::{self, Read},
    path::Path,
};

use anyhow::{Context, Result};
use fs4::tokio::AsyncFileExt;
use tokio::io::AsyncWriteExt;

/// Amount of bytes inspected when deciding whether a file is text.
pub const TEXT_SNIFF_LEN: usize = 8000;

/// A file is considered text if its first [TEXT_SNIFF_LEN] bytes are valid UTF-8. A multi-byte
/// character cut off by the end of the window doesn't count against the file.
pub fn is_text_file(path: &Path) -> bool {
    match read_prefix(path, TEXT_SNIFF_LEN) {
        Ok(chunk) => match std::str::from_utf8(&chunk) {
            Ok(_) => true,
            Err(e) => e.error_len().is_none() && chunk.len() == TEXT_SNIFF_LEN,
        },
        Err(_) => false,
    }
}

fn read_prefix(path: &Path, limit: usize) -> io::Result<Vec<u8>> {
    let mut chunk = Vec::with_capacity(limit);
    File::open(path)?
        .take(limit as u64)
        .read_to_end(&mut chunk)?;
    Ok(chunk)
}

/// Replaces the whole content of `path`. The file is truncated only after an exclusive lock has
/// been taken, so two writers can't interleave their bytes. Whoever writes last wins.
pub async fn write_locked(path: &Path, content: &[u8]) -> Result<()> {
    let mut file = tokio::fs::File::options()
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .await
        .with_context(|| format!("Can't open {path:?} for writing"))?;

    file.lock_exclusive()?;
    let result = replace_content(&mut file, content).await;
    file.unlock_async().await?;
    result.with_context(|| format!("Can't write {path:?}"))
}

async fn replace_content(file: &mut tokio::fs::File, content: &[u8]) -> io::Result<()> {
    file.set_len(0).await?;
    file.write_all(content).await?;
    file.flush().await?;
    file.sync_data().await
}

#[cfg(test)]
mod tests {
    use std::fs;

    use anyhow::Result;
    use tempfile::tempdir;

    use super::{is_text_file, write_locked, TEXT_SNIFF_LEN};

    #[test]
    fn utf8_files_are_text() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("notes.md");
        fs::write(&path, "héllo wörld\n")?;
        assert!(is_text_file(&path));
        Ok(())
    }

    #[test]
    fn binary_files_are_not_text() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("image.png");
        fs::write(&path, [0x89, b'P', b'N', b'G', 0xff, 0xfe, 0x00])?;
        assert!(!is_text_file(&path));
        Ok(())
    }

    #[test]
    fn character_split_by_sniff_window_is_text() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("long.txt");
        let mut content = "a".repeat(TEXT_SNIFF_LEN - 1);
        content.push('ö');
        fs::write(&path, content)?;
        assert!(is_text_file(&path));
        Ok(())
    }

    #[test]
    fn missing_file_is_not_text() {
        assert!(!is_text_file(std::path::Path::new("/definitely/not/here.txt")));
    }

    #[tokio::test]
    async fn write_locked_replaces_longer_content() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("data.json");
        fs::write(&path, "a much longer previous content")?;

        write_locked(&path, b"{}").await?;

        assert_eq!(fs::read_to_string(&path)?, "{}");
        Ok(())
    }
}
