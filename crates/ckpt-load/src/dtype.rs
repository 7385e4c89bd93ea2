//! Element types found in SafeTensors files and their widening to `f32`.

use std::fmt;
use std::str::FromStr;

/// A SafeTensors element type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dtype {
    F64,
    F32,
    F16,
    BF16,
    I64,
    I32,
    I16,
    I8,
    U8,
    Bool,
}

impl Dtype {
    /// Size of one element in bytes.
    pub fn size(self) -> usize {
        match self {
            Dtype::F64 | Dtype::I64 => 8,
            Dtype::F32 | Dtype::I32 => 4,
            Dtype::F16 | Dtype::BF16 | Dtype::I16 => 2,
            Dtype::I8 | Dtype::U8 | Dtype::Bool => 1,
        }
    }

    /// Decode little-endian element bytes, widening every value to `f32`.
    ///
    /// `bytes.len()` must be a multiple of [`Dtype::size`]; trailing bytes
    /// are ignored.
    pub fn decode(self, bytes: &[u8]) -> Vec<f32> {
        match self {
            Dtype::F64 => chunks::<8>(bytes).map(|c| f64::from_le_bytes(c) as f32).collect(),
            Dtype::F32 => chunks::<4>(bytes).map(f32::from_le_bytes).collect(),
            Dtype::F16 => chunks::<2>(bytes).map(|c| f16_to_f32(u16::from_le_bytes(c))).collect(),
            Dtype::BF16 => chunks::<2>(bytes).map(|c| bf16_to_f32(u16::from_le_bytes(c))).collect(),
            Dtype::I64 => chunks::<8>(bytes).map(|c| i64::from_le_bytes(c) as f32).collect(),
            Dtype::I32 => chunks::<4>(bytes).map(|c| i32::from_le_bytes(c) as f32).collect(),
            Dtype::I16 => chunks::<2>(bytes).map(|c| f32::from(i16::from_le_bytes(c))).collect(),
            Dtype::I8 => bytes.iter().map(|&b| f32::from(b as i8)).collect(),
            Dtype::U8 => bytes.iter().map(|&b| f32::from(b)).collect(),
            Dtype::Bool => bytes.iter().map(|&b| if b != 0 { 1.0 } else { 0.0 }).collect(),
        }
    }
}

impl FromStr for Dtype {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "F64" => Dtype::F64,
            "F32" => Dtype::F32,
            "F16" => Dtype::F16,
            "BF16" => Dtype::BF16,
            "I64" => Dtype::I64,
            "I32" => Dtype::I32,
            "I16" => Dtype::I16,
            "I8" => Dtype::I8,
            "U8" => Dtype::U8,
            "BOOL" => Dtype::Bool,
            other => return Err(other.to_string()),
        })
    }
}

impl fmt::Display for Dtype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Dtype::F64 => "F64",
            Dtype::F32 => "F32",
            Dtype::F16 => "F16",
            Dtype::BF16 => "BF16",
            Dtype::I64 => "I64",
            Dtype::I32 => "I32",
            Dtype::I16 => "I16",
            Dtype::I8 => "I8",
            Dtype::U8 => "U8",
            Dtype::Bool => "BOOL",
        };
        f.write_str(s)
    }
}

fn chunks<const N: usize>(bytes: &[u8]) -> impl Iterator<Item = [u8; N]> + '_ {
    bytes.chunks_exact(N).map(|c| {
        let mut arr = [0u8; N];
        arr.copy_from_slice(c);
        arr
    })
}

/// BF16 is the upper half of an IEEE-754 `f32`.
fn bf16_to_f32(bits: u16) -> f32 {
    f32::from_bits(u32::from(bits) << 16)
}

/// IEEE-754 half precision to single precision, exact for every input.
fn f16_to_f32(bits: u16) -> f32 {
    let sign = u32::from(bits >> 15) << 31;
    let exp = u32::from((bits >> 10) & 0x1f);
    let mant = u32::from(bits & 0x3ff);

    match (exp, mant) {
        (0, 0) => f32::from_bits(sign),
        (0, _) => {
            // Subnormal: mant * 2^-24.
            let magnitude = mant as f32 * f32::from_bits(0x3380_0000);
            if sign != 0 {
                -magnitude
            } else {
                magnitude
            }
        }
        (0x1f, _) => f32::from_bits(sign | 0x7f80_0000 | (mant << 13)),
        _ => f32::from_bits(sign | ((exp + 112) << 23) | (mant << 13)),
    }
}
