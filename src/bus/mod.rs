//! Facilities for simulating the memory bus of the simulated machine.

use byteorder::{ByteOrder, LittleEndian};

mod ram;

pub use ram::{RamBus, new_ram_bus};

//===========================================================================//

/// Mask applied to every virtual address to get the physical address.  This
/// strips the top bit, mapping the high (kseg0-style) virtual region onto the
/// flat backing store.
pub const PHYS_ADDR_MASK: u32 = 0x7fff_ffff;

/// Returns the physical address for the given virtual address.
pub fn phys_addr(addr: u32) -> u32 {
    addr & PHYS_ADDR_MASK
}

//===========================================================================//

/// The width of a single memory access.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Width {
    /// A one-byte access.
    Byte,
    /// A two-byte access.
    Half,
    /// A four-byte access.
    Word,
}

impl Width {
    /// Returns the number of bytes covered by an access of this width.
    pub fn len(self) -> usize {
        match self {
            Width::Byte => 1,
            Width::Half => 2,
            Width::Word => 4,
        }
    }

    /// Returns a mask that keeps only the low bytes covered by this width.
    pub fn mask(self) -> u32 {
        !0u32 >> ((4 - self.len()) << 3)
    }
}

//===========================================================================//

/// A simulated memory bus.
///
/// Implementations deal in physical addresses only; the provided
/// [`SimBus::read`] and [`SimBus::write`] methods take care of translating
/// virtual addresses.  Implementations should *not* panic when given an
/// address that is out of range.
pub trait SimBus {
    /// Returns a human-readable description of this simulated memory bus.
    fn description(&self) -> String;

    /// Returns the number of bytes of backing storage on this bus.
    fn size(&self) -> usize;

    /// Returns the value of a single byte at the given physical address.
    fn read_byte(&self, paddr: u32) -> u8;

    /// Writes a single byte at the given physical address.
    fn write_byte(&mut self, paddr: u32, data: u8);

    /// Reads `width` bytes (little-endian) from the given virtual address.
    /// The result is masked to the width of the access.
    fn read(&self, addr: u32, width: Width) -> u32 {
        let paddr = phys_addr(addr);
        let mut buf = [0u8; 4];
        for (offset, byte) in buf.iter_mut().take(width.len()).enumerate() {
            *byte = self.read_byte(paddr.wrapping_add(offset as u32));
        }
        LittleEndian::read_u32(&buf) & width.mask()
    }

    /// Writes the low `width` bytes of `value` (little-endian) to the given
    /// virtual address.
    fn write(&mut self, addr: u32, width: Width, value: u32) {
        let paddr = phys_addr(addr);
        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, value);
        for (offset, &byte) in buf.iter().take(width.len()).enumerate() {
            self.write_byte(paddr.wrapping_add(offset as u32), byte);
        }
    }
}

//===========================================================================//


//===========================================================================//
