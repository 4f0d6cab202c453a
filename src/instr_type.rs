//! Instruction layouts and field extraction
//!
//! The M, F and D extensions use three of the base instruction
//! formats (R, I and S) plus the R4 format introduced for the fused
//! multiply-add instructions (section 11.1 of the unprivileged
//! specification). Decoding is pure bit slicing; immediates are kept
//! in their natural field width and sign-extended at the point of
//! use.

use crate::utils::extract_field;

#[derive(Debug, Clone, Copy)]
pub struct Rtype {
    pub rs1: u8,
    pub rs2: u8,
    pub rd: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Itype {
    pub rs1: u8,
    pub imm: u16,
    pub rd: u8,
}

#[derive(Debug, Clone, Copy)]
pub struct Stype {
    pub rs1: u8,
    pub rs2: u8,
    pub imm: u16,
}

/// The R4 layout used by FMADD/FMSUB/FNMSUB/FNMADD: three source
/// registers, a two-bit format field, and the rounding-mode field in
/// place of funct3.
#[derive(Debug, Clone, Copy)]
pub struct R4type {
    pub rs1: u8,
    pub rs2: u8,
    pub rs3: u8,
    pub funct2: u32,
    pub rd: u8,
}

pub fn decode_rtype(instr: u32) -> Rtype {
    Rtype {
        rs1: rs1(instr),
        rs2: rs2(instr),
        rd: rd(instr),
    }
}

pub fn decode_itype(instr: u32) -> Itype {
    Itype {
        rs1: rs1(instr),
        imm: imm_itype(instr),
        rd: rd(instr),
    }
}

pub fn decode_stype(instr: u32) -> Stype {
    Stype {
        rs1: rs1(instr),
        rs2: rs2(instr),
        imm: imm_stype(instr),
    }
}

pub fn decode_r4type(instr: u32) -> R4type {
    R4type {
        rs1: rs1(instr),
        rs2: rs2(instr),
        rs3: rs3(instr),
        funct2: funct2(instr),
        rd: rd(instr),
    }
}

/// Makes a function called field_name which gets that field from a
/// 32-bit instruction. Specify the output type using field_type
/// (generally picked to be the smallest type which will fit the
/// field). The function will extract instr[end:start] (verilog
/// notation).
macro_rules! make_field_getter {
    ($field_name:ident, $field_type:ty, $end:expr, $start:expr) => {
        /// Get the field $field_name from instruction (bits
        /// instr[$end:$start] in verilog notation).
        pub fn $field_name(instr: u32) -> $field_type {
            extract_field(instr, $end, $start).try_into().unwrap()
        }
    };
}

make_field_getter!(opcode, u32, 6, 0);
make_field_getter!(rd, u8, 11, 7);
make_field_getter!(funct3, u32, 14, 12);
make_field_getter!(rs1, u8, 19, 15);
make_field_getter!(rs2, u8, 24, 20);
make_field_getter!(funct7, u32, 31, 25);
make_field_getter!(rs3, u8, 31, 27);
make_field_getter!(funct2, u32, 26, 25);
make_field_getter!(imm_itype, u16, 31, 20);

/// The rm (rounding mode) field occupies the funct3 bits in the
/// floating-point computational instructions.
pub fn rm(instr: u32) -> u32 {
    funct3(instr)
}

/// Get the immediate field in an S-type instruction
pub fn imm_stype(instr: u32) -> u16 {
    let imm11_5: u16 = extract_field(instr, 31, 25).try_into().unwrap();
    let imm4_0: u16 = extract_field(instr, 11, 7).try_into().unwrap();
    (imm11_5 << 5) | imm4_0
}
