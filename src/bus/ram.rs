use super::SimBus;

//===========================================================================//

/// Returns a new simulated RAM bus of the given size (in bytes), initially
/// zeroed.  Panics if the size is not a power of 2.
pub fn new_ram_bus(size: usize) -> Box<dyn SimBus> {
    Box::new(RamBus::new(vec![0u8; size].into_boxed_slice()))
}

//===========================================================================//

/// A simulated RAM bus.  Accesses beyond the RAM size will be mirrored.
pub struct RamBus {
    ram: Box<[u8]>,
}

impl RamBus {
    /// Returns a new simulated RAM bus using the given byte array as the
    /// contents of RAM.  Panics if the length of the byte array is not a power
    /// of 2.
    pub fn new(ram: Box<[u8]>) -> RamBus {
        assert!(ram.len().is_power_of_two());
        RamBus { ram }
    }

    fn index(&self, paddr: u32) -> usize {
        (paddr as usize) & (self.ram.len() - 1)
    }
}

impl SimBus for RamBus {
    fn description(&self) -> String {
        let size = self.ram.len();
        if size < 1024 {
            format!("{size}B RAM")
        } else if size < 1024 * 1024 {
            format!("{}kB RAM", size >> 10)
        } else {
            format!("{}MB RAM", size >> 20)
        }
    }

    fn size(&self) -> usize {
        self.ram.len()
    }

    fn read_byte(&self, paddr: u32) -> u8 {
        self.ram[self.index(paddr)]
    }

    fn write_byte(&mut self, paddr: u32, data: u8) {
        let index = self.index(paddr);
        self.ram[index] = data;
    }
}

//===========================================================================//


//===========================================================================//
