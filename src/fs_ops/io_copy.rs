//! Streaming copy with durability.
//!
//! - Writes to a newly created destination file (create_new; never clobbers).
//! - The destination is created with the caller's permission bits (Unix).
//! - Buffered I/O with large (1 MiB) buffers to reduce syscall count.
//! - Data and metadata are forced to stable storage (`sync_all`) before returning.
//!
//! Snapshot semantics: the source is read once from start to EOF; bytes
//! appended concurrently are not included.

use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Write};
use std::path::Path;

use crate::errors::{BackupError, Result};

const BUF_SIZE: usize = 1024 * 1024;

/// Copy `src` -> `dst`, fsync the destination, return the number of bytes written.
/// `mode` is the permission set the new file is created with (ignored off Unix).
pub(super) fn copy_streaming(src: &Path, dst: &Path, mode: u32) -> Result<u64> {
    let src_f = File::open(src).map_err(|source| BackupError::FileOpenFailed {
        path: src.to_path_buf(),
        source,
    })?;

    let mut opts = OpenOptions::new();
    opts.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        opts.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    let dst_f = opts.open(dst).map_err(|source| BackupError::FileOpenFailed {
        path: dst.to_path_buf(),
        source,
    })?;

    let write_err = |source: io::Error| BackupError::FileWriteFailed {
        src: src.to_path_buf(),
        dst: dst.to_path_buf(),
        source,
    };

    let mut reader = BufReader::with_capacity(BUF_SIZE, src_f);
    let mut writer = BufWriter::with_capacity(BUF_SIZE, dst_f);
    let bytes = io::copy(&mut reader, &mut writer).map_err(write_err)?;
    writer.flush().map_err(write_err)?;
    writer.get_ref().sync_all().map_err(write_err)?;

    Ok(bytes)
}
