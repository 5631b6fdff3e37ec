//! Memory-mapped access to binary inputs (ELF binaries, preprocessed translation units).
//!
//! See [`MappedFile`] for details.

use std::fs::File;
use std::io;
use std::ops::Deref;
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;

#[derive(Debug)]
enum Backing {
    Mmap(Mmap),
    Buf(Vec<u8>),
}

impl Deref for Backing {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        match self {
            Backing::Mmap(mmap) => mmap,
            Backing::Buf(buf) => buf,
        }
    }
}

/// A cheaply cloneable view over the bytes of a file, mapped into memory.
///
/// Every stage in the pipeline reads its inputs (ELF binaries, `.i` translation units) through
/// this type rather than `std::fs::read`, so that large artifacts are not copied into the heap
/// just to be hashed or parsed once.
#[derive(Clone, Debug)]
pub struct MappedFile {
    backing: Arc<Backing>,
}

impl MappedFile {
    /// Opens and memory-maps the file at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> io::Result<Self> {
        let file = File::open(path)?;
        Self::map_file(file)
    }

    /// Memory-maps an already-open file handle.
    pub fn map_file(file: File) -> io::Result<Self> {
        let backing = match unsafe { Mmap::map(&file) } {
            Ok(mmap) => Backing::Mmap(mmap),
            // Empty files cannot be mmapped on some platforms; treat them as an empty buffer
            // rather than failing the whole stage.
            Err(err) if err.kind() == io::ErrorKind::InvalidInput => Backing::Buf(Vec::new()),
            Err(err) => return Err(err),
        };

        Ok(MappedFile {
            backing: Arc::new(backing),
        })
    }

    /// Wraps an in-memory buffer, for tests and synthetic inputs.
    pub fn from_vec(buffer: Vec<u8>) -> Self {
        MappedFile {
            backing: Arc::new(Backing::Buf(buffer)),
        }
    }

    /// Returns the bytes backing this view.
    pub fn as_slice(&self) -> &[u8] {
        &self.backing
    }
}

impl AsRef<[u8]> for MappedFile {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Deref for MappedFile {
    type Target = [u8];

    fn deref(&self) -> &Self::Target {
        self.as_slice()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn open_empty_file() {
        let tmp = tempfile::NamedTempFile::new().unwrap();
        let view = MappedFile::open(tmp.path()).unwrap();
        assert_eq!(view.as_slice(), b"");
    }

    #[test]
    fn open_file_with_content() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"int main(void) { return 0; }").unwrap();
        let view = MappedFile::open(tmp.path()).unwrap();
        assert_eq!(view.as_slice(), b"int main(void) { return 0; }");
    }

    #[test]
    fn from_vec_roundtrip() {
        let view = MappedFile::from_vec(vec![1, 2, 3]);
        assert_eq!(&*view, &[1, 2, 3]);
    }
}
