//! WebAssembly linear memory.
//!
//! A memory instance owns a contiguous byte buffer sized in 64 KiB
//! pages. Every access widens the effective address to `u64` before
//! the bounds check, so `offset + width` can never wrap. Growth is
//! capped by the memory type's declared maximum, the engine's
//! configured page cap, and the architectural 65536; a failed grow
//! leaves the memory unchanged and is reported as -1, not a trap.

use wvm_error::{codes, kinds, Error, Result};
use wvm_types::MemoryType;

use crate::prelude::Vec;

/// WebAssembly page size (64 KiB).
pub const PAGE_SIZE: usize = 65536;

/// Architectural upper bound on page counts.
pub const MAX_PAGES: u32 = 65536;

/// A linear memory instance.
#[derive(Debug)]
pub struct MemoryInstance {
    /// Declared memory type
    ty: MemoryType,
    /// Engine-configured page cap
    max_pages_cap: u32,
    /// Current page count
    current_pages: u32,
    /// Backing bytes, always `current_pages * PAGE_SIZE` long
    data: Vec<u8>,
}

impl MemoryInstance {
    /// Allocate a memory with its minimum page count, zero-filled.
    ///
    /// Fails if the minimum itself exceeds the configured cap.
    pub fn new(ty: MemoryType, max_pages_cap: u32) -> Result<Self> {
        let cap = effective_cap(&ty, max_pages_cap);
        if ty.limits.min > cap {
            return Err(Error::resource_error(
                codes::MEMORY_LIMIT_EXCEEDED,
                "memory minimum exceeds the configured page cap",
            ));
        }
        Ok(Self {
            ty,
            max_pages_cap,
            current_pages: ty.limits.min,
            data: crate::prelude::vec![0; ty.limits.min as usize * PAGE_SIZE],
        })
    }

    /// Declared memory type.
    #[must_use]
    pub const fn ty(&self) -> MemoryType {
        self.ty
    }

    /// Current size in pages (`memory.size`).
    #[must_use]
    pub const fn size(&self) -> u32 {
        self.current_pages
    }

    /// Current size in bytes.
    #[must_use]
    pub fn size_in_bytes(&self) -> u64 {
        self.data.len() as u64
    }

    /// Grow by `pages`, returning the old page count, or -1 if the
    /// result would exceed the cap. The buffer is untouched on
    /// failure.
    pub fn grow(&mut self, pages: u32) -> i32 {
        let cap = effective_cap(&self.ty, self.max_pages_cap);
        let Some(new_pages) = self.current_pages.checked_add(pages) else {
            return -1;
        };
        if new_pages > cap {
            return -1;
        }
        let old_pages = self.current_pages;
        self.current_pages = new_pages;
        self.data.resize(new_pages as usize * PAGE_SIZE, 0);
        old_pages as i32
    }

    /// Borrow `width` bytes at the effective address, trapping when
    /// `effective + width` passes the end of memory.
    pub fn bytes(&self, effective: u64, width: u32) -> Result<&[u8]> {
        let end = effective + u64::from(width);
        if end > self.size_in_bytes() {
            return Err(kinds::out_of_bounds_memory_access());
        }
        Ok(&self.data[effective as usize..end as usize])
    }

    /// Mutably borrow `width` bytes at the effective address, with the
    /// same bounds rule as [`bytes`].
    ///
    /// [`bytes`]: Self::bytes
    pub fn bytes_mut(&mut self, effective: u64, width: u32) -> Result<&mut [u8]> {
        let end = effective + u64::from(width);
        if end > self.size_in_bytes() {
            return Err(kinds::out_of_bounds_memory_access());
        }
        Ok(&mut self.data[effective as usize..end as usize])
    }

    /// Load up to eight bytes little-endian, zero- or sign-extending
    /// into a u64 payload.
    pub fn load_scalar(&self, effective: u64, width: u32, signed: bool) -> Result<u64> {
        let bytes = self.bytes(effective, width)?;
        let mut raw = [0u8; 8];
        raw[..width as usize].copy_from_slice(bytes);
        let mut value = u64::from_le_bytes(raw);
        if signed && width < 8 {
            let shift = 64 - width * 8;
            value = (((value << shift) as i64) >> shift) as u64;
        }
        Ok(value)
    }

    /// Store the low `width` bytes of `value` little-endian.
    pub fn store_scalar(&mut self, effective: u64, width: u32, value: u64) -> Result<()> {
        let bytes = self.bytes_mut(effective, width)?;
        bytes.copy_from_slice(&value.to_le_bytes()[..width as usize]);
        Ok(())
    }

    /// Copy a slice into memory at `offset` (segment initialization).
    pub fn write(&mut self, offset: u64, data: &[u8]) -> Result<()> {
        let target = self.bytes_mut(offset, data.len() as u32)?;
        target.copy_from_slice(data);
        Ok(())
    }
}

/// The page count growth may never pass: the tightest of the declared
/// maximum, the configured cap, and the architectural limit.
fn effective_cap(ty: &MemoryType, max_pages_cap: u32) -> u32 {
    let mut cap = MAX_PAGES.min(max_pages_cap);
    if let Some(max) = ty.limits.max {
        cap = cap.min(max);
    }
    cap
}

#[cfg(test)]
mod tests {
    use super::*;
    use wvm_types::Limits;

    fn memory(min: u32, max: Option<u32>) -> MemoryInstance {
        let limits = max.map_or(Limits::at_least(min), |max| Limits::bounded(min, max));
        MemoryInstance::new(MemoryType { limits }, MAX_PAGES).unwrap()
    }

    #[test]
    fn fresh_memory_is_zeroed() {
        let mem = memory(1, None);
        assert_eq!(mem.size(), 1);
        assert_eq!(mem.bytes(0, 4).unwrap(), [0, 0, 0, 0]);
        assert_eq!(mem.bytes(65532, 4).unwrap(), [0, 0, 0, 0]);
    }

    #[test]
    fn bounds_check_widens() {
        let mem = memory(1, None);
        // One byte past the end.
        assert!(mem.bytes(65536, 1).is_err());
        // Straddling the end.
        assert!(mem.bytes(65533, 4).is_err());
        // An address that would wrap a u32 if not widened.
        assert!(mem.bytes(u64::from(u32::MAX), 8).is_err());
    }

    #[test]
    fn failed_access_leaves_memory_unchanged() {
        let mut mem = memory(1, None);
        mem.store_scalar(0, 4, 0xDEAD_BEEF).unwrap();
        assert!(mem.store_scalar(65533, 4, 7).is_err());
        assert_eq!(mem.load_scalar(0, 4, false).unwrap(), 0xDEAD_BEEF);
        assert_eq!(mem.size(), 1);
    }

    #[test]
    fn grow_returns_old_size_or_minus_one() {
        let mut mem = memory(1, Some(3));
        assert_eq!(mem.grow(1), 1);
        assert_eq!(mem.size(), 2);
        assert_eq!(mem.grow(2), -1);
        assert_eq!(mem.size(), 2);
        assert_eq!(mem.grow(1), 2);
        assert_eq!(mem.grow(0), 3);
    }

    #[test]
    fn config_cap_bounds_growth() {
        let mut mem =
            MemoryInstance::new(MemoryType { limits: Limits::at_least(1) }, 2).unwrap();
        assert_eq!(mem.grow(1), 1);
        assert_eq!(mem.grow(1), -1);
    }

    #[test]
    fn allocation_respects_config_cap() {
        let err =
            MemoryInstance::new(MemoryType { limits: Limits::at_least(4) }, 2).unwrap_err();
        assert_eq!(err.code, codes::MEMORY_LIMIT_EXCEEDED);
    }

    #[test]
    fn sign_extension_on_load() {
        let mut mem = memory(1, None);
        mem.store_scalar(8, 1, 0x80).unwrap();
        assert_eq!(mem.load_scalar(8, 1, false).unwrap(), 0x80);
        assert_eq!(mem.load_scalar(8, 1, true).unwrap() as i64, -128);
    }
}
