//! Morton (z-order) codes for deep zoom collections.
//!
//! `morton` puts the bits of `x` on the odd positions of the code and the bits
//! of `y` on the even positions; `reverse_morton` is its exact inverse. A
//! collection's item number is decoded with `reverse_morton`, and the decoded
//! point is then read with its axes swapped (see
//! [`CollectionItem`](crate::tiles::collection::CollectionItem)).

/// Spread the low 32 bits of `v` so that bit `i` lands on bit `2i`
fn spread(v: u32) -> u64 {
    let mut v = v as u64;
    v = (v | (v << 16)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v << 8)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v << 4)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v << 2)) & 0x3333_3333_3333_3333;
    v = (v | (v << 1)) & 0x5555_5555_5555_5555;
    v
}

/// Gather the even bits of `v` back into a dense 32-bit value
fn gather(v: u64) -> u32 {
    let mut v = v & 0x5555_5555_5555_5555;
    v = (v | (v >> 1)) & 0x3333_3333_3333_3333;
    v = (v | (v >> 2)) & 0x0F0F_0F0F_0F0F_0F0F;
    v = (v | (v >> 4)) & 0x00FF_00FF_00FF_00FF;
    v = (v | (v >> 8)) & 0x0000_FFFF_0000_FFFF;
    v = (v | (v >> 16)) & 0x0000_0000_FFFF_FFFF;
    v as u32
}

/// Morton number of the point `(x, y)`
pub fn morton(x: u32, y: u32) -> u64 {
    (spread(x) << 1) | spread(y)
}

/// The point `(x, y)` encoded by the Morton number `n`
pub fn reverse_morton(n: u64) -> (u32, u32) {
    (gather(n >> 1), gather(n))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_codes() {
        // y occupies the low bit of each pair, x the high bit
        assert_eq!(reverse_morton(0), (0, 0));
        assert_eq!(reverse_morton(1), (0, 1));
        assert_eq!(reverse_morton(2), (1, 0));
        assert_eq!(reverse_morton(3), (1, 1));
        assert_eq!(reverse_morton(4), (0, 2));
        assert_eq!(reverse_morton(11), (3, 1));
        assert_eq!(morton(3, 5), 0b011011);
    }

    #[test]
    fn test_extremes() {
        assert_eq!(morton(u32::MAX, u32::MAX), u64::MAX);
        assert_eq!(reverse_morton(u64::MAX), (u32::MAX, u32::MAX));
        assert_eq!(reverse_morton(morton(u32::MAX, 0)), (u32::MAX, 0));
    }

    mod property_tests {
        use super::*;

        proptest! {
            #[test]
            fn test_encode_then_decode(x in any::<u32>(), y in any::<u32>()) {
                prop_assert_eq!(reverse_morton(morton(x, y)), (x, y));
            }

            #[test]
            fn test_decode_then_encode(n in any::<u64>()) {
                let (x, y) = reverse_morton(n);
                prop_assert_eq!(morton(x, y), n);
            }
        }
    }
}
