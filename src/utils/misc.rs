/// Derives a per-pixel RNG seed from pixel coordinates only.
///
/// Packs `(x, y)` into one word and runs it through the splitmix64 finalizer,
/// so neighbouring pixels get unrelated streams and the result does not
/// depend on which worker handles the pixel.
pub fn pixel_seed(x: usize, y: usize) -> u64 {
    let packed = ((x as u64) << 32) ^ (y as u64 & 0xFFFF_FFFF);
    let mut z = packed.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
