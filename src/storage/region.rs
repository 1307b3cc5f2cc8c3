//! # Mapped Regions
//!
//! `MappedRegion` is the single-owner handle over one `mmap()` result. Every
//! byte a column stores lives inside exactly one region, and every region is
//! released exactly once, when its handle is dropped.
//!
//! ## Modes
//!
//! - **Anonymous**: `PROT_READ | PROT_WRITE`, `MAP_PRIVATE | MAP_ANON`. The
//!   kernel hands out zero-filled pages, so freshly grown capacity reads as
//!   zeros without an explicit memset.
//! - **File-backed**: `PROT_READ`, `MAP_SHARED` over a caller-supplied
//!   descriptor at offset 0. Reads are served from the OS page cache; nothing
//!   is copied at construction.
//!
//! ## Ownership
//!
//! The handle is move-only. There is no `Clone`, so two live handles over one
//! mapping cannot exist. `Default` produces the empty handle (null pointer,
//! zero length); `std::mem::take` on an owner therefore leaves behind a handle
//! whose drop does nothing.
//!
//! ## Release Policy
//!
//! `munmap` failure aborts the process. A storage layer that cannot return
//! address space to the kernel has lost track of its memory, and every unmap
//! site (drop, growth) goes through the same path, so the policy is uniform.
//!
//! `memmap2` is not used here: its `Drop` discards the `munmap` return code,
//! which would make the abort policy unenforceable.

use std::fmt;
use std::io;
use std::os::fd::{AsFd, AsRawFd};
use std::ptr;

use eyre::{Result, WrapErr};
use tracing::{debug, error};

pub struct MappedRegion {
    ptr: *mut u8,
    len: usize,
    writable: bool,
}

// SAFETY: MappedRegion exclusively owns its mapping. Shared references only
// permit reads (as_slice), and writes require &mut self (as_mut_slice), so
// the usual aliasing rules carry the synchronization. The pointer is never
// tied to the creating thread.
unsafe impl Send for MappedRegion {}
// SAFETY: see Send. &MappedRegion exposes no interior mutability.
unsafe impl Sync for MappedRegion {}

impl MappedRegion {
    /// Returns a handle that owns nothing.
    pub const fn empty() -> Self {
        Self {
            ptr: ptr::null_mut(),
            len: 0,
            writable: false,
        }
    }

    /// Maps `len` zero-filled, writable bytes.
    ///
    /// A zero length yields the empty handle, since `mmap` rejects empty
    /// mappings.
    pub fn anonymous(len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self::empty());
        }

        // SAFETY: a null hint with MAP_ANON and fd -1 asks the kernel for a
        // fresh private mapping that aliases no existing Rust allocation. The
        // result is checked against MAP_FAILED before use.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ | libc::PROT_WRITE,
                libc::MAP_PRIVATE | libc::MAP_ANON,
                -1,
                0,
            )
        };

        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error())
                .wrap_err_with(|| format!("failed to create anon map of {} bytes", len));
        }

        debug!(len, "mapped anonymous region");

        Ok(Self {
            ptr: addr.cast(),
            len,
            writable: true,
        })
    }

    /// Maps the first `len` bytes of `file` read-only.
    ///
    /// `len` may extend past the end of the file into the final page, which
    /// the kernel zero-fills. Touching whole pages beyond the file's last
    /// page raises SIGBUS, so callers only read within `file size + padding`.
    pub fn file<F: AsFd>(file: &F, len: usize) -> Result<Self> {
        if len == 0 {
            return Ok(Self::empty());
        }

        let fd = file.as_fd().as_raw_fd();

        // SAFETY: the descriptor is borrowed for the duration of the call and
        // mmap takes its own reference to the open file. PROT_READ mappings
        // are never written through; as_mut_slice refuses read-only regions.
        let addr = unsafe {
            libc::mmap(
                ptr::null_mut(),
                len,
                libc::PROT_READ,
                libc::MAP_SHARED,
                fd,
                0,
            )
        };

        if addr == libc::MAP_FAILED {
            return Err(io::Error::last_os_error())
                .wrap_err_with(|| format!("failed to map {} bytes of fd {}", len, fd));
        }

        debug!(len, fd, "mapped file region");

        Ok(Self {
            ptr: addr.cast(),
            len,
            writable: false,
        })
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.ptr.is_null()
    }

    pub fn is_writable(&self) -> bool {
        self.writable
    }

    /// Base address of the mapping, null for the empty handle.
    pub fn as_ptr(&self) -> *const u8 {
        self.ptr
    }

    pub fn as_slice(&self) -> &[u8] {
        if self.ptr.is_null() {
            return &[];
        }

        // SAFETY: ptr is a live mapping of exactly len readable bytes owned by
        // self; the returned borrow ends before self can be dropped.
        unsafe { std::slice::from_raw_parts(self.ptr, self.len) }
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        if self.ptr.is_null() {
            return &mut [];
        }

        assert!(self.writable, "attempted to write through a read-only mapping");

        // SAFETY: the mapping is PROT_WRITE (checked above), exclusively
        // owned, and &mut self guarantees no other borrow of it exists.
        unsafe { std::slice::from_raw_parts_mut(self.ptr, self.len) }
    }

    /// Hints the kernel to read `[offset, offset + len)` ahead of access.
    pub fn advise_willneed(&self, offset: usize, len: usize) {
        if self.ptr.is_null() || offset >= self.len || len == 0 {
            return;
        }

        let end = offset.saturating_add(len).min(self.len);
        let page = page_size();
        let aligned_start = offset - offset % page;

        // SAFETY: madvise(MADV_WILLNEED) is advisory and never changes the
        // contents of the mapping. aligned_start is rounded down to a page
        // boundary inside the mapping (mmap returns page-aligned bases), and
        // end is clamped to self.len, so the range stays within the region.
        unsafe {
            libc::madvise(
                self.ptr.add(aligned_start).cast(),
                end - aligned_start,
                libc::MADV_WILLNEED,
            );
        }
    }
}

impl Default for MappedRegion {
    fn default() -> Self {
        Self::empty()
    }
}

impl Drop for MappedRegion {
    fn drop(&mut self) {
        if self.ptr.is_null() {
            return;
        }

        // SAFETY: ptr/len describe a mapping created by this handle and never
        // unmapped before; after this call the handle is gone, so no slice
        // derived from it can be observed.
        let rc = unsafe { libc::munmap(self.ptr.cast(), self.len) };
        if rc != 0 {
            let err = io::Error::last_os_error();
            error!(len = self.len, %err, "failed to unmap column region");
            std::process::abort();
        }
    }
}

impl fmt::Debug for MappedRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedRegion")
            .field("ptr", &self.ptr)
            .field("len", &self.len)
            .field("writable", &self.writable)
            .finish()
    }
}

fn page_size() -> usize {
    // SAFETY: sysconf has no memory-safety preconditions.
    let size = unsafe { libc::sysconf(libc::_SC_PAGESIZE) };
    if size <= 0 {
        4096
    } else {
        size as usize
    }
}
