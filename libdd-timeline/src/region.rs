// Copyright 2026-Present Datadog, Inc. https://www.datadoghq.com/
// SPDX-License-Identifier: Apache-2.0

//! Byte regions a timeline can live in.
//!
//! The timeline itself only needs one contiguous, writable block of memory.
//! Where it comes from is up to the caller: a file mapped `MAP_SHARED` so
//! that other processes can map it too, a POSIX named shared memory object,
//! or plain process-private heap memory.
//!
//! None of these types unlink anything on drop. Dropping a region only
//! removes it from this process's address space; removing the name is an
//! explicit step ([`ShmRegion::unlink`], or deleting the file).

use core::ptr::NonNull;

/// A contiguous block of writable memory.
///
/// # Safety
///
/// Implementors must guarantee that the block returned by [`region`] is
/// valid for reads and writes for as long as the implementing value is
/// alive, that its address and length never change, that it is aligned to
/// at least 8 bytes, and that nothing else in this process holds Rust
/// references into it.
///
/// [`region`]: SharedRegion::region
pub unsafe trait SharedRegion {
    fn region(&self) -> NonNull<[u8]>;
}

#[repr(C, align(64))]
#[derive(Clone, Copy)]
struct CacheLine([u8; 64]);

/// Zeroed, process-private memory, 64-byte aligned.
pub struct HeapRegion {
    lines: NonNull<CacheLine>,
    count: usize,
}

impl HeapRegion {
    /// Allocates at least `size` zeroed bytes (rounded up to 64).
    pub fn new(size: usize) -> Self {
        let count = size.div_ceil(64).max(1);
        let boxed = vec![CacheLine([0; 64]); count].into_boxed_slice();
        let lines = NonNull::from(Box::leak(boxed)).cast::<CacheLine>();
        Self { lines, count }
    }
}

unsafe impl SharedRegion for HeapRegion {
    fn region(&self) -> NonNull<[u8]> {
        NonNull::slice_from_raw_parts(self.lines.cast::<u8>(), self.count * 64)
    }
}

// SAFETY: the block is owned exclusively by this value.
unsafe impl Send for HeapRegion {}

impl Drop for HeapRegion {
    fn drop(&mut self) {
        // SAFETY: `lines` and `count` came from a leaked Box<[CacheLine]>.
        unsafe {
            drop(Box::from_raw(core::ptr::slice_from_raw_parts_mut(
                self.lines.as_ptr(),
                self.count,
            )));
        }
    }
}

#[cfg(unix)]
pub use self::unix::{FileRegion, ShmRegion};

#[cfg(unix)]
mod unix {
    use super::SharedRegion;
    use core::ffi::c_void;
    use core::num::NonZeroUsize;
    use core::ptr::NonNull;
    use libc::off_t;
    use nix::fcntl::OFlag;
    use nix::sys::mman::{mmap, munmap, shm_open, shm_unlink, MapFlags, ProtFlags};
    use nix::sys::stat::Mode;
    use nix::unistd::ftruncate;
    use std::ffi::CString;
    use std::fs::{File, OpenOptions};
    use std::io;
    use std::os::fd::AsFd;
    use std::path::{Path, PathBuf};

    /// A read/write `MAP_SHARED` mapping of a whole file descriptor.
    struct Mapping {
        ptr: NonNull<c_void>,
        len: usize,
    }

    impl Mapping {
        fn map<F: AsFd>(fd: F, len: usize) -> io::Result<Mapping> {
            let length = NonZeroUsize::new(len).ok_or_else(|| {
                io::Error::new(io::ErrorKind::InvalidInput, "cannot map an empty region")
            })?;
            // SAFETY: a fresh mapping with no fixed address cannot alias any
            // existing Rust object.
            let ptr = unsafe {
                mmap(
                    None,
                    length,
                    ProtFlags::PROT_READ | ProtFlags::PROT_WRITE,
                    MapFlags::MAP_SHARED,
                    fd,
                    0,
                )?
            };
            Ok(Mapping { ptr, len })
        }

        fn region(&self) -> NonNull<[u8]> {
            NonNull::slice_from_raw_parts(self.ptr.cast::<u8>(), self.len)
        }
    }

    // SAFETY: a mapping is not tied to the thread that created it.
    unsafe impl Send for Mapping {}

    impl Drop for Mapping {
        fn drop(&mut self) {
            unsafe {
                _ = munmap(self.ptr, self.len);
            }
        }
    }

    /// A regular file mapped into memory, e.g. under `/dev/shm` or a run
    /// directory. Any process can map the same path to read the timeline.
    pub struct FileRegion {
        mapping: Mapping,
        path: PathBuf,
    }

    impl FileRegion {
        /// Creates (or truncates) the file at `path`, sizes it to `size`
        /// zeroed bytes and maps it.
        pub fn create(path: impl AsRef<Path>, size: usize) -> io::Result<FileRegion> {
            let path = path.as_ref();
            let file = OpenOptions::new()
                .read(true)
                .write(true)
                .create(true)
                .truncate(true)
                .open(path)?;
            file.set_len(size as u64)?;
            Ok(FileRegion {
                mapping: Mapping::map(&file, size)?,
                path: path.to_path_buf(),
            })
        }

        /// Maps an existing file at its current size.
        pub fn open(path: impl AsRef<Path>) -> io::Result<FileRegion> {
            let path = path.as_ref();
            let file = OpenOptions::new().read(true).write(true).open(path)?;
            let size = file.metadata()?.len() as usize;
            Ok(FileRegion {
                mapping: Mapping::map(&file, size)?,
                path: path.to_path_buf(),
            })
        }

        pub fn path(&self) -> &Path {
            &self.path
        }
    }

    unsafe impl SharedRegion for FileRegion {
        fn region(&self) -> NonNull<[u8]> {
            self.mapping.region()
        }
    }

    /// A POSIX named shared memory object (`shm_open`).
    pub struct ShmRegion {
        mapping: Mapping,
        name: CString,
    }

    impl ShmRegion {
        /// Creates the object `name` (which should start with `/`) if needed,
        /// sizes it to `size` bytes and maps it.
        pub fn create(name: &str, size: usize) -> io::Result<ShmRegion> {
            let name = shm_name(name)?;
            let fd = shm_open(
                name.as_bytes(),
                OFlag::O_CREAT | OFlag::O_RDWR,
                Mode::S_IWUSR | Mode::S_IRUSR | Mode::S_IRGRP | Mode::S_IROTH,
            )?;
            ftruncate(&fd, size as off_t)?;
            Ok(ShmRegion {
                mapping: Mapping::map(&fd, size)?,
                name,
            })
        }

        /// Maps an existing object at its current size.
        pub fn open(name: &str) -> io::Result<ShmRegion> {
            let name = shm_name(name)?;
            let fd = shm_open(name.as_bytes(), OFlag::O_RDWR, Mode::empty())?;
            let file = File::from(fd);
            let size = file.metadata()?.len() as usize;
            Ok(ShmRegion {
                mapping: Mapping::map(&file, size)?,
                name,
            })
        }

        pub fn name(&self) -> &str {
            self.name.to_str().unwrap_or_default()
        }

        /// Removes the name. Existing mappings, including this one, stay
        /// valid until they are dropped.
        pub fn unlink(&self) -> io::Result<()> {
            shm_unlink(self.name.as_bytes())?;
            Ok(())
        }
    }

    unsafe impl SharedRegion for ShmRegion {
        fn region(&self) -> NonNull<[u8]> {
            self.mapping.region()
        }
    }

    fn shm_name(name: &str) -> io::Result<CString> {
        CString::new(name).map_err(|e| io::Error::new(io::ErrorKind::InvalidInput, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_and_read(region: &dyn SharedRegion) {
        let block = region.region();
        let base = block.cast::<u8>().as_ptr();
        unsafe {
            base.write(0xAB);
            base.add(block.len() - 1).write(0xCD);
            assert_eq!(base.read(), 0xAB);
            assert_eq!(base.add(block.len() - 1).read(), 0xCD);
        }
    }

    #[test]
    fn heap_region_is_zeroed_and_aligned() {
        let region = HeapRegion::new(100);
        let block = region.region();
        assert_eq!(block.len(), 128);
        assert_eq!(block.cast::<u8>().as_ptr() as usize % 64, 0);
        let bytes = unsafe { core::slice::from_raw_parts(block.cast::<u8>().as_ptr(), 128) };
        assert!(bytes.iter().all(|&b| b == 0));
        write_and_read(&region);
    }

    #[test]
    fn heap_region_never_empty() {
        assert_eq!(HeapRegion::new(0).region().len(), 64);
    }

    #[test]
    #[cfg(unix)]
    #[cfg_attr(miri, ignore)]
    fn file_region_is_shared_between_mappings() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("timeline");
        let writer = FileRegion::create(&path, 4096).unwrap();
        assert_eq!(writer.path(), path.as_path());
        write_and_read(&writer);

        let reader = FileRegion::open(&path).unwrap();
        let block = reader.region();
        assert_eq!(block.len(), 4096);
        assert_eq!(unsafe { block.cast::<u8>().as_ptr().read() }, 0xAB);
    }

    #[test]
    #[cfg(unix)]
    #[cfg_attr(miri, ignore)]
    fn file_region_rejects_empty() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileRegion::create(dir.path().join("empty"), 0).is_err());
    }

    #[test]
    #[cfg(target_os = "linux")]
    #[cfg_attr(miri, ignore)]
    fn named_shm_region() {
        let name = format!("/libdd-timeline-test-{}", std::process::id());
        let writer = ShmRegion::create(&name, 8192).unwrap();
        assert_eq!(writer.name(), name);
        write_and_read(&writer);

        let reader = ShmRegion::open(&name).unwrap();
        assert_eq!(reader.region().len(), 8192);
        assert_eq!(unsafe { reader.region().cast::<u8>().as_ptr().read() }, 0xAB);

        writer.unlink().unwrap();
        assert!(ShmRegion::open(&name).is_err());
    }
}
