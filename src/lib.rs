//! Instruction-set semantics for the RISC-V M, F and D extensions
//!
//! This crate implements the architectural behaviour of the integer
//! multiply/divide extension (chapter 7 of the unprivileged
//! specification, version 20191213) and the single- and
//! double-precision floating-point extensions (chapters 11 and 12),
//! for both 32-bit and 64-bit base ISAs.
//!
//! The crate does not fetch or dispatch instructions. Each extension
//! is exposed as a set of family functions (see the [`mext`] and
//! [`fdext`] modules) which take an execution environment, a raw
//! 32-bit instruction and a compressed-expansion flag. A family
//! function returns `true` if it recognised and executed the
//! instruction (updating registers, `fflags`, the program counter, or
//! the trap CSRs through the environment). It returns `false`, with
//! the environment untouched, if the instruction does not belong to
//! it or is an illegal encoding. A caller tries families in turn and
//! raises an illegal-instruction trap if none claims the instruction.
//!
//! The execution environment is the [`eei::Eei`] trait; the [`hart`]
//! module provides a simple concrete machine implementing it, which
//! is also what the tests run against.

#![forbid(unsafe_code)]

pub mod alu;
pub mod csr;
pub mod eei;
pub mod fdext;
pub mod hart;
pub mod instr_type;
pub mod mext;
pub mod opcodes;
pub mod softfloat;
pub mod utils;
