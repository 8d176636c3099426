use crate::bus::{SimBus, phys_addr};
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;

//===========================================================================//

macro_rules! invalid_data {
    ($e:expr) => {
        return Err(::std::io::Error::new(::std::io::ErrorKind::InvalidData,
                                         $e))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err(::std::io::Error::new(::std::io::ErrorKind::InvalidData,
                                         format!($fmt, $($arg)+)))
    };
}

//===========================================================================//

/// The address the instruction image is loaded at.
pub const INST_LOAD_ADDR: u32 = 0x8000_0000;

/// The address the data image is loaded at.
pub const DATA_LOAD_ADDR: u32 = 0x8001_0000;

//===========================================================================//

/// Copies an entire flat binary image into memory, starting at the physical
/// address that `addr` maps to.  Returns the number of bytes loaded.
pub fn load_image<R: Read>(
    bus: &mut dyn SimBus,
    mut reader: R,
    addr: u32,
) -> io::Result<usize> {
    let mut image = Vec::<u8>::new();
    reader.read_to_end(&mut image)?;
    let start = phys_addr(addr) as usize;
    if start + image.len() > bus.size() {
        invalid_data!(
            "image of {} bytes at 0x{:08x} does not fit in {}",
            image.len(),
            addr,
            bus.description()
        );
    }
    for (offset, &byte) in image.iter().enumerate() {
        bus.write_byte((start + offset) as u32, byte);
    }
    Ok(image.len())
}

/// Loads a program's instruction image, and its data image if there is one.
/// A missing data image is not an error.
pub fn load_program(
    bus: &mut dyn SimBus,
    inst_path: &Path,
    data_path: &Path,
) -> io::Result<()> {
    let inst = BufReader::new(File::open(inst_path)?);
    let len = load_image(bus, inst, INST_LOAD_ADDR)?;
    log::info!(
        "loaded {} bytes of instructions from {}",
        len,
        inst_path.display()
    );
    match File::open(data_path) {
        Ok(file) => {
            let len = load_image(bus, BufReader::new(file), DATA_LOAD_ADDR)?;
            log::info!(
                "loaded {} bytes of data from {}",
                len,
                data_path.display()
            );
        }
        Err(error) if error.kind() == io::ErrorKind::NotFound => {
            log::warn!("no data image at {}", data_path.display());
        }
        Err(error) => return Err(error),
    }
    Ok(())
}

//===========================================================================//

#[cfg(test)]
mod tests {
    use super::{DATA_LOAD_ADDR, INST_LOAD_ADDR, load_image, load_program};
    use crate::bus::{Width, new_ram_bus};
    use std::io;
    use std::path::PathBuf;

    fn temp_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("temu-load-{}-{}", std::process::id(), name))
    }

    #[test]
    fn image_lands_at_masked_address() {
        let mut bus = new_ram_bus(0x2_0000);
        let image: &[u8] = &[0x05, 0x00, 0x08, 0x24, 0xaa];
        let len = load_image(&mut *bus, image, INST_LOAD_ADDR).unwrap();
        assert_eq!(len, 5);
        assert_eq!(bus.read(INST_LOAD_ADDR, Width::Word), 0x2408_0005);
        assert_eq!(bus.read_byte(0x0000_0004), 0xaa);
        let data: &[u8] = &[0x78, 0x56, 0x34, 0x12];
        load_image(&mut *bus, data, DATA_LOAD_ADDR).unwrap();
        assert_eq!(bus.read(0x0001_0000, Width::Word), 0x1234_5678);
    }

    #[test]
    fn oversized_image_is_rejected() {
        let mut bus = new_ram_bus(0x10);
        let image = [0u8; 0x11];
        let error =
            load_image(&mut *bus, &image[..], INST_LOAD_ADDR).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
        let error = load_image(&mut *bus, &image[..4], 0x8000_000d)
            .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn missing_data_image_is_not_an_error() {
        let inst_path = temp_path("inst.bin");
        std::fs::write(&inst_path, [0x01, 0x00, 0x08, 0x24]).unwrap();
        let mut bus = new_ram_bus(0x2_0000);
        load_program(&mut *bus, &inst_path, &temp_path("no-data.bin"))
            .unwrap();
        assert_eq!(bus.read(INST_LOAD_ADDR, Width::Word), 0x2408_0001);
        let error = load_program(
            &mut *bus,
            &temp_path("no-inst.bin"),
            &temp_path("no-data.bin"),
        )
        .unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::NotFound);
        std::fs::remove_file(&inst_path).unwrap();
    }
}

//===========================================================================//
