//! The archive's directory tree: in-memory nodes, filesystem construction,
//! and the explicit binary serialization carried in the tree region.
//!
//! Serialized layout, recursive descent (all integers big-endian):
//!
//! ```text
//! dir  : name_len(2B) + name(UTF-8)
//!        file_count(4B) + file*
//!        dir_count(4B) + dir*
//! file : name_len(2B) + name(UTF-8)
//!        offset(4B) + length(4B) + original_size(8B)
//! ```
//!
//! Filesystem paths are never serialized (offsets are archive-relative)
//! and are reattached under a destination root on decode.

use defish_core::error::{DefishError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// A file inside the tree with its archive region and origin metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// File name without any directory components.
    pub name: String,
    /// Filesystem location: the source on compress, the destination on
    /// decompress. Never serialized.
    pub path: Option<PathBuf>,
    /// Start of this file's compressed region, absolute archive offset.
    pub offset: u32,
    /// Length of the compressed region in bytes.
    pub length: u32,
    /// Size of the original file, for statistics.
    pub original_size: u64,
}

/// A directory with its files and subdirectories.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirNode {
    /// Directory name (the root keeps the source's name).
    pub name: String,
    /// Files directly inside this directory.
    pub files: Vec<FileNode>,
    /// Nested directories.
    pub dirs: Vec<DirNode>,
}

impl DirNode {
    /// An empty directory.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            files: Vec::new(),
            dirs: Vec::new(),
        }
    }

    /// Build a tree from the filesystem.
    ///
    /// A directory source walks recursively; a single-file source becomes
    /// a root directory named after the file's stem holding that one
    /// file. Entries are sorted by name so the traversal order, and with
    /// it the archive layout, is deterministic.
    pub fn build(path: &Path) -> Result<Self> {
        if path.is_dir() {
            return Self::build_dir(path);
        }
        let stem = path
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut root = Self::new(stem);
        root.files.push(FileNode::from_path(path)?);
        Ok(root)
    }

    fn build_dir(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let mut node = Self::new(name);
        let mut entries: Vec<PathBuf> = fs::read_dir(path)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<_>>()?;
        entries.sort();
        for entry in entries {
            if entry.is_dir() {
                node.dirs.push(Self::build_dir(&entry)?);
            } else {
                node.files.push(FileNode::from_path(&entry)?);
            }
        }
        Ok(node)
    }

    /// Total number of files in the tree.
    pub fn file_count(&self) -> usize {
        self.files.len() + self.dirs.iter().map(Self::file_count).sum::<usize>()
    }

    /// Visit every file depth-first, files before subdirectories. This is
    /// the traversal order that fixes the archive layout.
    pub fn for_each_file_mut<F>(&mut self, visit: &mut F)
    where
        F: FnMut(&mut FileNode),
    {
        for file in &mut self.files {
            visit(file);
        }
        for dir in &mut self.dirs {
            dir.for_each_file_mut(visit);
        }
    }

    /// Collect references to every file in traversal order.
    pub fn all_files(&self) -> Vec<&FileNode> {
        let mut result: Vec<&FileNode> = self.files.iter().collect();
        for dir in &self.dirs {
            result.extend(dir.all_files());
        }
        result
    }

    /// Reattach filesystem paths under `root`; each file lands at
    /// `root/<this dir's name>/.../<file name>`.
    pub fn assign_paths(&mut self, root: &Path) {
        let base = root.join(&self.name);
        for file in &mut self.files {
            file.path = Some(base.join(&file.name));
        }
        for dir in &mut self.dirs {
            dir.assign_paths(&base);
        }
    }

    /// Serialize the tree; paths are not part of the format.
    pub fn encode(&self) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        self.encode_into(&mut out)?;
        Ok(out)
    }

    fn encode_into(&self, out: &mut Vec<u8>) -> Result<()> {
        write_name(out, &self.name)?;
        out.extend_from_slice(&(self.files.len() as u32).to_be_bytes());
        for file in &self.files {
            write_name(out, &file.name)?;
            out.extend_from_slice(&file.offset.to_be_bytes());
            out.extend_from_slice(&file.length.to_be_bytes());
            out.extend_from_slice(&file.original_size.to_be_bytes());
        }
        out.extend_from_slice(&(self.dirs.len() as u32).to_be_bytes());
        for dir in &self.dirs {
            dir.encode_into(out)?;
        }
        Ok(())
    }

    /// Parse a serialized tree, rejecting trailing garbage.
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        let mut cursor = Cursor::new(bytes);
        let tree = Self::decode_from(&mut cursor)?;
        if !cursor.is_at_end() {
            return Err(DefishError::corrupted("trailing bytes after tree"));
        }
        Ok(tree)
    }

    fn decode_from(cursor: &mut Cursor<'_>) -> Result<Self> {
        let name = cursor.read_name()?;
        let mut node = Self::new(name);
        let file_count = cursor.read_u32()?;
        for _ in 0..file_count {
            let name = cursor.read_name()?;
            let offset = cursor.read_u32()?;
            let length = cursor.read_u32()?;
            let original_size = cursor.read_u64()?;
            node.files.push(FileNode {
                name,
                path: None,
                offset,
                length,
                original_size,
            });
        }
        let dir_count = cursor.read_u32()?;
        for _ in 0..dir_count {
            node.dirs.push(Self::decode_from(cursor)?);
        }
        Ok(node)
    }
}

impl FileNode {
    /// Describe a filesystem file; region fields are filled in during
    /// compression.
    pub fn from_path(path: &Path) -> Result<Self> {
        let name = path
            .file_name()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let original_size = fs::metadata(path)?.len();
        Ok(Self {
            name,
            path: Some(path.to_path_buf()),
            offset: 0,
            length: 0,
            original_size,
        })
    }

    /// Compression ratio (compressed/original), `None` for empty files or
    /// files not yet assigned a region.
    pub fn compression_ratio(&self) -> Option<f64> {
        if self.original_size == 0 {
            return None;
        }
        Some(self.length as f64 / self.original_size as f64)
    }
}

fn write_name(out: &mut Vec<u8>, name: &str) -> Result<()> {
    let bytes = name.as_bytes();
    if bytes.len() > u16::MAX as usize {
        return Err(DefishError::invalid_config(format!(
            "name too long for tree format: {} bytes",
            bytes.len()
        )));
    }
    out.extend_from_slice(&(bytes.len() as u16).to_be_bytes());
    out.extend_from_slice(bytes);
    Ok(())
}

/// Bounds-checked reader over the serialized tree bytes.
struct Cursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    fn is_at_end(&self) -> bool {
        self.pos == self.bytes.len()
    }

    fn take(&mut self, count: usize) -> Result<&'a [u8]> {
        let available = self.bytes.len() - self.pos;
        if available < count {
            return Err(DefishError::unexpected_eof(count - available));
        }
        let slice = &self.bytes[self.pos..self.pos + count];
        self.pos += count;
        Ok(slice)
    }

    fn read_u16(&mut self) -> Result<u16> {
        let raw = self.take(2)?;
        Ok(u16::from_be_bytes([raw[0], raw[1]]))
    }

    fn read_u32(&mut self) -> Result<u32> {
        let raw = self.take(4)?;
        Ok(u32::from_be_bytes([raw[0], raw[1], raw[2], raw[3]]))
    }

    fn read_u64(&mut self) -> Result<u64> {
        let raw = self.take(8)?;
        let mut buf = [0u8; 8];
        buf.copy_from_slice(raw);
        Ok(u64::from_be_bytes(buf))
    }

    fn read_name(&mut self) -> Result<String> {
        let length = self.read_u16()? as usize;
        let raw = self.take(length)?;
        String::from_utf8(raw.to_vec())
            .map_err(|_| DefishError::corrupted("name is not valid UTF-8"))
    }
}
