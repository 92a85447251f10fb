//! Lazy file byte streams and the capacity-limited sink.
//!
//! Readers expose files (or archive byte ranges) as pull-based
//! `Iterator<Item = Result<u8>>` streams, buffered underneath so the
//! per-byte granularity costs one branch, not one syscall. The sink
//! enforces the session's write quota: the quota counter is owned by the
//! caller and passed `&mut` into every write, descending monotonically
//! across an entire decompress operation.

use defish_core::error::Result;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

/// A lazy byte stream over any buffered reader.
#[derive(Debug)]
pub struct ByteStream<R: Read> {
    bytes: io::Bytes<R>,
}

impl<R: Read> Iterator for ByteStream<R> {
    type Item = Result<u8>;

    fn next(&mut self) -> Option<Self::Item> {
        self.bytes.next().map(|byte| byte.map_err(Into::into))
    }
}

/// Open a whole file as a lazy byte stream.
pub fn open_file_stream(path: &Path) -> Result<ByteStream<BufReader<File>>> {
    let reader = BufReader::new(File::open(path)?);
    Ok(ByteStream {
        bytes: reader.bytes(),
    })
}

/// Open exactly the byte range `[start, start + length)` of a file as a
/// lazy byte stream.
pub fn open_segment_stream(
    path: &Path,
    start: u64,
    length: u64,
) -> Result<ByteStream<io::Take<BufReader<File>>>> {
    let mut reader = BufReader::new(File::open(path)?);
    reader.seek(SeekFrom::Start(start))?;
    Ok(ByteStream {
        bytes: reader.take(length).bytes(),
    })
}

/// Outcome of a quota-limited write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteStatus {
    /// The whole stream was written.
    Complete,
    /// The quota ran out; the stream was abandoned mid-way.
    LimitReached,
}

/// Write a lazy byte stream to `path`, consuming from the shared quota.
///
/// Returns the number of bytes written together with whether the stream
/// completed. The quota is decremented in place; once it reaches zero the
/// stream is dropped where it stands; partial output is not rolled back.
pub fn write_limited(
    path: &Path,
    stream: impl Iterator<Item = Result<u8>>,
    quota: &mut u64,
) -> Result<(u64, WriteStatus)> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut written = 0u64;
    for byte in stream {
        if *quota == 0 {
            writer.flush()?;
            return Ok((written, WriteStatus::LimitReached));
        }
        writer.write_all(&[byte?])?;
        *quota -= 1;
        written += 1;
    }
    writer.flush()?;
    Ok((written, WriteStatus::Complete))
}

#[cfg(test)]
mod tests {
    use super::*;
    use defish_core::error::DefishError;

    #[test]
    fn test_file_stream_reads_whole_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"stream me").unwrap();
        let bytes: Vec<u8> = open_file_stream(&path)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(bytes, b"stream me");
    }

    #[test]
    fn test_segment_stream_reads_exact_range() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        std::fs::write(&path, b"0123456789").unwrap();
        let bytes: Vec<u8> = open_segment_stream(&path, 3, 4)
            .unwrap()
            .collect::<Result<_>>()
            .unwrap();
        assert_eq!(bytes, b"3456");
    }

    #[test]
    fn test_write_limited_complete() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut quota = 100;
        let (written, status) =
            write_limited(&path, b"hello".iter().copied().map(Ok), &mut quota).unwrap();
        assert_eq!((written, status), (5, WriteStatus::Complete));
        assert_eq!(quota, 95);
        assert_eq!(std::fs::read(&path).unwrap(), b"hello");
    }

    #[test]
    fn test_write_limited_stops_at_quota() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut quota = 3;
        let (written, status) =
            write_limited(&path, b"hello".iter().copied().map(Ok), &mut quota).unwrap();
        assert_eq!((written, status), (3, WriteStatus::LimitReached));
        assert_eq!(quota, 0);
        assert_eq!(std::fs::read(&path).unwrap(), b"hel");
    }

    #[test]
    fn test_write_limited_propagates_stream_errors() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bin");
        let mut quota = 100;
        let stream = vec![Ok(1u8), Err(DefishError::corrupted("boom"))].into_iter();
        assert!(write_limited(&path, stream, &mut quota).is_err());
    }
}
