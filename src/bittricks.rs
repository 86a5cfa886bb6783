// SPDX-License-Identifier: Parity-7.0.0 OR PolyForm-Noncommercial-1.0.0
/*!
alignment arithmetic.
*/

/// Rounds `value` up to the next multiple of `alignment`, which must be a power of two.
pub const fn align_up(value: u64, alignment: u64) -> u64 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

pub const fn align_up_u32(value: u32, alignment: u32) -> u32 {
    debug_assert!(alignment.is_power_of_two());
    (value + alignment - 1) & !(alignment - 1)
}

/// Extent of a mip level, never smaller than 1.
pub const fn mip_extent(base: u32, mip: u32) -> u32 {
    let e = base >> mip;
    if e == 0 { 1 } else { e }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn aligns() {
        assert_eq!(align_up(0, 256), 0);
        assert_eq!(align_up(1, 256), 256);
        assert_eq!(align_up(256, 256), 256);
        assert_eq!(align_up(257, 256), 512);
        assert_eq!(align_up_u32(100 * 4, 256), 512);
    }

    #[test]
    fn mips() {
        assert_eq!(mip_extent(64, 0), 64);
        assert_eq!(mip_extent(64, 3), 8);
        assert_eq!(mip_extent(3, 4), 1);
    }
}
