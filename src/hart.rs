//! A simple concrete hart for the M/F/D semantics
//!
//! This is the smallest machine that can host the semantic functions
//! in this crate: an integer and a floating-point register file, the
//! handful of CSRs the semantics read and write, a sparse byte-map
//! memory, and an optional linear address translation. It implements
//! the [`Eei`] trait and is the state the tests execute against; a
//! full simulator would implement [`Eei`] on its own hart instead.
//!
//! The default hart has registers, program counter and memory all
//! initialised to zero, advertises the M, F and D extensions in
//! misa, and uses physical addressing.

use crate::eei::{AccessKind, Eei, Exception, Wordsize, Xlen};

use self::csr::CsrFile;
use self::memory::{AccessError, Memory};
use self::registers::{FRegisters, Registers};

pub mod csr;
pub mod memory;
pub mod registers;

/// Address translation of the simple hart
///
/// `Bare` is physical addressing: translation is the identity and
/// never faults. `Window` models a single linear mapping: virtual
/// addresses in [base, base + size) map to physical [0, size), and
/// anything outside the window page-faults. One window is enough to
/// exercise every translation outcome the semantics can observe.
#[derive(Debug, Default, Copy, Clone)]
pub enum Translation {
    #[default]
    Bare,
    Window { base: u64, size: u64 },
}

#[derive(Debug)]
pub struct Hart {
    pc: u64,
    xlen: Xlen,
    registers: Registers,
    fregisters: FRegisters,
    csr: CsrFile,
    pub memory: Memory,
    pub translation: Translation,
}

impl Default for Hart {
    fn default() -> Self {
        Self::new(Xlen::Xlen32)
    }
}

impl Hart {
    /// Make a hart with misa advertising M, F and D
    pub fn new(xlen: Xlen) -> Self {
        Self::with_extensions(xlen, "MFD")
    }

    /// Make a hart advertising only the given extension letters
    pub fn with_extensions(xlen: Xlen, extensions: &str) -> Self {
        Self {
            pc: 0,
            xlen,
            registers: Registers::new(xlen),
            fregisters: FRegisters::default(),
            csr: CsrFile::new(extensions),
            memory: Memory::new(xlen),
            translation: Translation::Bare,
        }
    }

    fn access_fault(access: AccessKind) -> Exception {
        match access {
            AccessKind::Load => Exception::LoadAccessFault,
            AccessKind::Store => Exception::StoreAccessFault,
        }
    }

    fn page_fault(access: AccessKind) -> Exception {
        match access {
            AccessKind::Load => Exception::LoadPageFault,
            AccessKind::Store => Exception::StorePageFault,
        }
    }
}

impl Eei for Hart {
    fn xlen(&self) -> Xlen {
        self.xlen
    }

    fn pc(&self) -> u64 {
        self.pc
    }

    fn set_pc(&mut self, pc: u64) {
        self.pc = pc & self.xlen.mask();
    }

    fn x(&self, n: u8) -> u64 {
        self.registers.read(n)
    }

    fn set_x(&mut self, n: u8, value: u64) {
        self.registers.write(n, value);
    }

    fn f(&self, n: u8) -> u64 {
        self.fregisters.read(n)
    }

    fn set_f(&mut self, n: u8, value: u64) {
        self.fregisters.write(n, value);
    }

    fn read_csr(&self, addr: u16) -> u64 {
        self.csr.read(addr)
    }

    fn write_csr(&mut self, addr: u16, value: u64) {
        self.csr.write(addr, value);
    }

    fn translate(&mut self, access: AccessKind, vaddr: u64) -> Result<u64, Exception> {
        match self.translation {
            Translation::Bare => Ok(vaddr),
            Translation::Window { base, size } => {
                if vaddr >= base && vaddr - base < size {
                    Ok(vaddr - base)
                } else {
                    Err(Self::page_fault(access))
                }
            }
        }
    }

    fn read_memory(&mut self, paddr: u64, width: Wordsize) -> Result<u64, Exception> {
        self.memory
            .read(paddr, width)
            .map_err(|AccessError::OutOfBounds(_)| Self::access_fault(AccessKind::Load))
    }

    fn write_memory(&mut self, paddr: u64, value: u64, width: Wordsize) -> Result<(), Exception> {
        self.memory
            .write(paddr, value, width)
            .map_err(|AccessError::OutOfBounds(_)| Self::access_fault(AccessKind::Store))
    }
}
