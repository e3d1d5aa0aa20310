//! Paged memory map for the 24-bit address bus.
//!
//! The address space is split into 256 regions of 64 KiB, selected by
//! address bits 23-16. Each region has a read backing and a write backing:
//! either a bank of bytes owned by the map, or I/O routed to the host. A
//! fresh map sends every region to the host, so there is no such thing as
//! an unmapped access.
//!
//! Banks hold big-endian bytes and are sized in powers of two. A bank
//! smaller than a region mirrors across it; a larger bank is spread over
//! consecutive regions by [`MemoryMap::map_ram`] and friends.

use crate::bus::M68kHost;

/// Region selector shift.
pub const REGION_SHIFT: u32 = 16;
/// Bytes per region.
pub const REGION_SIZE: u32 = 1 << REGION_SHIFT;
/// Number of regions.
pub const REGION_COUNT: usize = 256;
/// The 68000 drives 24 address lines.
pub const ADDRESS_MASK: u32 = 0x00FF_FFFF;

/// Handle to a bank added with [`MemoryMap::add_bank`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BankId(usize);

/// Where accesses to a region go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backing {
    /// Directly into `bank`, at `offset` plus the address within the region.
    Memory { bank: BankId, offset: u32 },
    /// To the host's `read_*`/`write_*` callbacks.
    Io,
}

/// Read and write routing for one 64 KiB region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Region {
    pub read: Backing,
    pub write: Backing,
}

impl Region {
    pub const IO: Self = Self {
        read: Backing::Io,
        write: Backing::Io,
    };
}

#[derive(Debug, Clone)]
struct Bank {
    data: Box<[u8]>,
    mask: u32,
}

/// The region table plus the banks it points into.
#[derive(Debug, Clone)]
pub struct MemoryMap {
    regions: [Region; REGION_COUNT],
    banks: Vec<Bank>,
}

impl Default for MemoryMap {
    fn default() -> Self {
        Self::new()
    }
}

#[inline]
fn slot(addr: u32) -> usize {
    ((addr & ADDRESS_MASK) >> REGION_SHIFT) as usize
}

impl MemoryMap {
    /// A map with every region routed to the host.
    #[must_use]
    pub fn new() -> Self {
        Self {
            regions: [Region::IO; REGION_COUNT],
            banks: Vec::new(),
        }
    }

    /// Add a zero-filled bank of `size` bytes.
    ///
    /// # Panics
    ///
    /// If `size` is not a power of two or is smaller than two bytes.
    pub fn add_bank(&mut self, size: usize) -> BankId {
        self.add_bank_with(vec![0; size])
    }

    /// Add a bank holding `data` (a ROM image, say).
    ///
    /// # Panics
    ///
    /// If the length is not a power of two or is smaller than two bytes.
    pub fn add_bank_with(&mut self, data: Vec<u8>) -> BankId {
        let size = data.len();
        assert!(
            size >= 2 && size.is_power_of_two() && size <= 1 << 24,
            "bank size {size:#X} must be a power of two between 2 bytes and 16 MiB"
        );
        self.banks.push(Bank {
            data: data.into_boxed_slice(),
            mask: (size - 1) as u32,
        });
        BankId(self.banks.len() - 1)
    }

    /// Map `bank` for reading and writing over `[start, start + len)`.
    pub fn map_ram(&mut self, start: u32, len: u32, bank: BankId) {
        self.map_with(start, len, bank, true);
    }

    /// Map `bank` for reading; writes over the same range go to the host.
    pub fn map_rom(&mut self, start: u32, len: u32, bank: BankId) {
        self.map_with(start, len, bank, false);
    }

    /// Route `[start, start + len)` to the host for reads and writes.
    pub fn map_io(&mut self, start: u32, len: u32) {
        for s in Self::slots(start, len) {
            self.regions[s] = Region::IO;
        }
    }

    /// Replace one region's routing.
    pub fn set_region(&mut self, index: u8, region: Region) {
        if let Backing::Memory { bank, .. } = region.read {
            self.check_bank(bank);
        }
        if let Backing::Memory { bank, .. } = region.write {
            self.check_bank(bank);
        }
        self.regions[usize::from(index)] = region;
    }

    #[must_use]
    pub fn region(&self, index: u8) -> Region {
        self.regions[usize::from(index)]
    }

    /// Region covering `addr`.
    #[must_use]
    pub fn region_at(&self, addr: u32) -> Region {
        self.regions[slot(addr)]
    }

    #[must_use]
    pub fn bank(&self, id: BankId) -> &[u8] {
        &self.banks[id.0].data
    }

    pub fn bank_mut(&mut self, id: BankId) -> &mut [u8] {
        &mut self.banks[id.0].data
    }

    /// Copy `bytes` into a bank starting at `offset`, wrapping at its end.
    pub fn load(&mut self, id: BankId, offset: u32, bytes: &[u8]) {
        let bank = &mut self.banks[id.0];
        for (i, &b) in bytes.iter().enumerate() {
            let index = (offset.wrapping_add(i as u32) & bank.mask) as usize;
            bank.data[index] = b;
        }
    }

    fn check_bank(&self, bank: BankId) {
        assert!(bank.0 < self.banks.len(), "bank {} does not exist", bank.0);
    }

    fn slots(start: u32, len: u32) -> std::ops::Range<usize> {
        assert!(
            start % REGION_SIZE == 0 && len % REGION_SIZE == 0,
            "mapping {start:#08X}+{len:#X} is not aligned to 64 KiB regions"
        );
        let first = slot(start);
        let count = (len >> REGION_SHIFT) as usize;
        first..(first + count).min(REGION_COUNT)
    }

    fn map_with(&mut self, start: u32, len: u32, bank: BankId, writable: bool) {
        self.check_bank(bank);
        for (n, s) in Self::slots(start, len).enumerate() {
            let memory = Backing::Memory {
                bank,
                offset: (n as u32) << REGION_SHIFT,
            };
            self.regions[s] = Region {
                read: memory,
                write: if writable { memory } else { Backing::Io },
            };
        }
    }

    #[inline]
    fn index(&self, bank: BankId, offset: u32, addr: u32) -> (&Bank, usize) {
        let bank = &self.banks[bank.0];
        let i = (offset.wrapping_add(addr & (REGION_SIZE - 1)) & bank.mask) as usize;
        (bank, i)
    }

    // ========================================================================
    // Accessors
    // ========================================================================
    //
    // No alignment checks here: the CPU raises address errors before it
    // gets this far. Long accesses are two word accesses, high word first.

    pub fn read_byte<H: M68kHost + ?Sized>(&self, host: &mut H, addr: u32) -> u8 {
        let addr = addr & ADDRESS_MASK;
        match self.regions[slot(addr)].read {
            Backing::Memory { bank, offset } => {
                let (bank, i) = self.index(bank, offset, addr);
                bank.data[i]
            }
            Backing::Io => host.read_byte(addr),
        }
    }

    pub fn read_word<H: M68kHost + ?Sized>(&self, host: &mut H, addr: u32) -> u16 {
        let addr = addr & ADDRESS_MASK;
        match self.regions[slot(addr)].read {
            Backing::Memory { bank, offset } => {
                let (bank, i) = self.index(bank, offset, addr);
                let lo = (i + 1) & bank.mask as usize;
                u16::from_be_bytes([bank.data[i], bank.data[lo]])
            }
            Backing::Io => host.read_word(addr),
        }
    }

    pub fn read_long<H: M68kHost + ?Sized>(&self, host: &mut H, addr: u32) -> u32 {
        let hi = self.read_word(host, addr);
        let lo = self.read_word(host, addr.wrapping_add(2));
        (u32::from(hi) << 16) | u32::from(lo)
    }

    /// Program-space word fetch for opcodes, extension words and PC-relative
    /// operands.
    #[inline]
    pub fn fetch_word<H: M68kHost + ?Sized>(&self, host: &mut H, addr: u32) -> u16 {
        self.read_word(host, addr)
    }

    pub fn write_byte<H: M68kHost + ?Sized>(&mut self, host: &mut H, addr: u32, value: u8) {
        let addr = addr & ADDRESS_MASK;
        match self.regions[slot(addr)].write {
            Backing::Memory { bank, offset } => {
                let bank = &mut self.banks[bank.0];
                let i = (offset.wrapping_add(addr & (REGION_SIZE - 1)) & bank.mask) as usize;
                bank.data[i] = value;
            }
            Backing::Io => host.write_byte(addr, value),
        }
    }

    pub fn write_word<H: M68kHost + ?Sized>(&mut self, host: &mut H, addr: u32, value: u16) {
        let addr = addr & ADDRESS_MASK;
        match self.regions[slot(addr)].write {
            Backing::Memory { bank, offset } => {
                let bank = &mut self.banks[bank.0];
                let i = (offset.wrapping_add(addr & (REGION_SIZE - 1)) & bank.mask) as usize;
                let [hi, lo] = value.to_be_bytes();
                bank.data[i] = hi;
                bank.data[(i + 1) & bank.mask as usize] = lo;
            }
            Backing::Io => host.write_word(addr, value),
        }
    }

    pub fn write_long<H: M68kHost + ?Sized>(&mut self, host: &mut H, addr: u32, value: u32) {
        self.write_word(host, addr, (value >> 16) as u16);
        self.write_word(host, addr.wrapping_add(2), value as u16);
    }
}
