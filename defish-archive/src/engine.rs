//! Archive assembly and extraction.
//!
//! The [`Engine`] owns one compress or decompress session. Compression
//! writes the header with a zeroed tree pointer, streams every file's
//! compressed region while recording its offset and length into the tree,
//! then appends the tree region and patches the pointer in place.
//! Decompression reads the tree first (the pointer makes that a single
//! seek), then extracts file regions one by one under a shared write
//! quota.

use crate::flags::Flags;
use crate::io::{self, WriteStatus};
use crate::pipeline::{self, PipelineConfig};
use crate::tree::{DirNode, FileNode};
use defish_core::error::{DefishError, Result};
use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, SeekFrom, Write};
use std::path::PathBuf;

/// File extension of the container format, without the leading dot.
pub const ARCHIVE_EXTENSION: &str = "defish";

/// Default per-session write quota: 3 MiB.
pub const DEFAULT_WRITE_LIMIT: u64 = 3 * 1024 * 1024;

/// Header length: flags byte plus the four-byte tree pointer.
const HEADER_LEN: u64 = 5;

/// Summary of a finished compress session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompressReport {
    /// Path of the archive that was written.
    pub archive: PathBuf,
    /// Number of files stored.
    pub files_stored: usize,
    /// Total size of the source files.
    pub original_size: u64,
    /// Total archive size, header and tree region included.
    pub bytes_written: u64,
}

/// Summary of a finished decompress session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecompressReport {
    /// Number of files restored in full.
    pub files_restored: usize,
    /// Total bytes written to the destination.
    pub bytes_written: u64,
    /// True when the write quota ran out before the archive was fully
    /// extracted. Files already restored stay on disk.
    pub quota_exhausted: bool,
}

/// One compress or decompress session over a source and destination path.
#[derive(Debug, Clone)]
pub struct Engine {
    src: PathBuf,
    dst: PathBuf,
    seed: Option<u64>,
    use_lz77: bool,
    write_limit: u64,
    pipeline: PipelineConfig,
}

impl Engine {
    /// Create an engine reading from `src` and writing under `dst`.
    ///
    /// For compression `src` is the file or directory to store and `dst`
    /// the directory the archive lands in. For decompression `src` is the
    /// archive and `dst` the directory to extract into.
    pub fn new(src: impl Into<PathBuf>, dst: impl Into<PathBuf>) -> Self {
        Self {
            src: src.into(),
            dst: dst.into(),
            seed: None,
            use_lz77: false,
            write_limit: DEFAULT_WRITE_LIMIT,
            pipeline: PipelineConfig::default(),
        }
    }

    /// Enable the cipher stage with the given key stream seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Enable or disable the LZ77 stage (compression only; extraction
    /// follows the archive's flags).
    #[must_use]
    pub fn with_lz77(mut self, use_lz77: bool) -> Self {
        self.use_lz77 = use_lz77;
        self
    }

    /// Replace the default write quota.
    #[must_use]
    pub fn with_write_limit(mut self, limit: u64) -> Self {
        self.write_limit = limit;
        self
    }

    /// Replace the default pipeline tuning.
    #[must_use]
    pub fn with_pipeline(mut self, pipeline: PipelineConfig) -> Self {
        self.pipeline = pipeline;
        self
    }

    /// Compress the source into a new `.defish` archive.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, on a source name that cannot be represented,
    /// and with [`DefishError::WriteLimitReached`] when the archive would
    /// exceed the write quota. A failed session leaves a partial archive
    /// behind.
    pub fn compress(&self) -> Result<CompressReport> {
        let mut tree = DirNode::build(&self.src)?;
        let flags = Flags::new(self.seed.is_some(), self.use_lz77);
        let archive = self.dst.join(format!("{}.{ARCHIVE_EXTENSION}", tree.name));

        if self.write_limit < HEADER_LEN {
            return Err(DefishError::write_limit_reached(self.write_limit));
        }
        let mut writer = BufWriter::new(File::create(&archive)?);
        writer.write_all(&[flags.to_byte()])?;
        writer.write_all(&[0u8; 4])?;

        let mut offset = HEADER_LEN;
        self.write_regions(&mut tree, flags, &mut writer, &mut offset)?;
        let tree_pointer = region_offset(offset)?;

        let tree_bytes = tree.encode()?;
        let tree_len = u32::try_from(tree_bytes.len())
            .map_err(|_| DefishError::corrupted("directory tree exceeds 4 GiB"))?;
        // The tree region counts against the quota like everything else.
        if offset + 4 + u64::from(tree_len) > self.write_limit {
            writer.flush()?;
            return Err(DefishError::write_limit_reached(self.write_limit));
        }
        writer.write_all(&tree_len.to_be_bytes())?;
        writer.write_all(&tree_bytes)?;
        writer.flush()?;

        // Patch the forward reference now that the tree offset is known.
        let mut file = writer
            .into_inner()
            .map_err(|e| DefishError::Io(e.into_error()))?;
        file.seek(SeekFrom::Start(1))?;
        file.write_all(&tree_pointer.to_be_bytes())?;

        let original_size: u64 = tree.all_files().iter().map(|f| f.original_size).sum();
        Ok(CompressReport {
            archive,
            files_stored: tree.file_count(),
            original_size,
            bytes_written: offset + 4 + u64::from(tree_len),
        })
    }

    /// Stream each file's compressed region, recording archive positions
    /// into the tree. Files before subdirectories, matching the tree's
    /// serialization order.
    fn write_regions(
        &self,
        dir: &mut DirNode,
        flags: Flags,
        writer: &mut BufWriter<File>,
        offset: &mut u64,
    ) -> Result<()> {
        for file in &mut dir.files {
            let start = *offset;
            let path = file
                .path
                .clone()
                .ok_or_else(|| DefishError::invalid_config("file node has no source path"))?;
            let input = io::open_file_stream(&path)?;
            let stream = pipeline::compress_stream(input, flags, self.seed, self.pipeline)?;
            for byte in stream {
                if *offset >= self.write_limit {
                    writer.flush()?;
                    return Err(DefishError::write_limit_reached(self.write_limit));
                }
                writer.write_all(&[byte?])?;
                *offset += 1;
            }
            file.offset = region_offset(start)?;
            file.length = region_offset(*offset - start)?;
        }
        for sub in &mut dir.dirs {
            self.write_regions(sub, flags, writer, offset)?;
        }
        Ok(())
    }

    /// Extract every file of the archive under the destination directory.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors, on a corrupt archive, and with
    /// [`DefishError::PasswordRequired`] when the archive is enciphered
    /// and no seed was supplied. Running out of the write quota is not an
    /// error; it is reported via [`DecompressReport::quota_exhausted`].
    pub fn decompress(&self) -> Result<DecompressReport> {
        let (flags, mut tree) = self.read_tree()?;
        if flags.cipher() && self.seed.is_none() {
            return Err(DefishError::PasswordRequired);
        }
        tree.assign_paths(&self.dst);

        let mut quota = self.write_limit;
        let mut report = DecompressReport {
            files_restored: 0,
            bytes_written: 0,
            quota_exhausted: false,
        };
        self.restore_dir(&tree, flags, &mut quota, &mut report)?;
        Ok(report)
    }

    fn restore_dir(
        &self,
        dir: &DirNode,
        flags: Flags,
        quota: &mut u64,
        report: &mut DecompressReport,
    ) -> Result<()> {
        for file in &dir.files {
            if report.quota_exhausted {
                return Ok(());
            }
            self.restore_file(file, flags, quota, report)?;
        }
        for sub in &dir.dirs {
            self.restore_dir(sub, flags, quota, report)?;
        }
        Ok(())
    }

    fn restore_file(
        &self,
        file: &FileNode,
        flags: Flags,
        quota: &mut u64,
        report: &mut DecompressReport,
    ) -> Result<()> {
        let path = file
            .path
            .clone()
            .ok_or_else(|| DefishError::invalid_config("file node has no destination path"))?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let region = io::open_segment_stream(
            &self.src,
            u64::from(file.offset),
            u64::from(file.length),
        )?;
        let stream = pipeline::decompress_stream(region, flags, self.seed, self.pipeline)?;
        let (written, status) = io::write_limited(&path, stream, quota)?;
        report.bytes_written += written;
        match status {
            WriteStatus::Complete => report.files_restored += 1,
            WriteStatus::LimitReached => report.quota_exhausted = true,
        }
        Ok(())
    }

    /// Read the archive's flags byte and directory tree without
    /// extracting anything.
    ///
    /// # Errors
    ///
    /// Fails on I/O errors and on a truncated or malformed tree region.
    pub fn read_tree(&self) -> Result<(Flags, DirNode)> {
        let mut file = File::open(&self.src)?;
        let mut header = [0u8; 5];
        file.read_exact(&mut header)
            .map_err(|e| eof_or_io(e, 5))?;
        let flags = Flags::from_byte(header[0]);
        let tree_pointer = u32::from_be_bytes([header[1], header[2], header[3], header[4]]);

        file.seek(SeekFrom::Start(u64::from(tree_pointer)))?;
        let mut len_bytes = [0u8; 4];
        file.read_exact(&mut len_bytes)
            .map_err(|e| eof_or_io(e, 4))?;
        let tree_len = u32::from_be_bytes(len_bytes) as usize;
        let mut tree_bytes = vec![0u8; tree_len];
        file.read_exact(&mut tree_bytes)
            .map_err(|e| eof_or_io(e, tree_len))?;
        Ok((flags, DirNode::decode(&tree_bytes)?))
    }
}

/// Report a short read as truncation; pass every other I/O failure through.
fn eof_or_io(error: std::io::Error, expected: usize) -> DefishError {
    if error.kind() == std::io::ErrorKind::UnexpectedEof {
        DefishError::unexpected_eof(expected)
    } else {
        DefishError::Io(error)
    }
}

/// Narrow an archive position to the four-byte field the format uses.
fn region_offset(value: u64) -> Result<u32> {
    u32::try_from(value)
        .map_err(|_| DefishError::corrupted("archive exceeds the 4 GiB addressable range"))
}
