//! WebSocket frame masking
//!
//! XOR masking is self-inverse: the same transform masks and unmasks.
//! The hot loop works a u64 at a time with the 4-byte key doubled up,
//! falling back to byte-wise XOR for the tail.

/// Convert a 32-bit masking key to its wire form (network byte order).
///
/// A key of 0 is, by convention, "no masking" throughout this crate.
#[inline]
pub fn mask_bytes(masking_key: u32) -> [u8; 4] {
    masking_key.to_be_bytes()
}

/// XOR `data` in-place with the repeating 4-byte mask.
///
/// Used for both masking (before transmit) and unmasking (after receipt).
#[inline]
pub fn apply_mask(data: &mut [u8], mask: [u8; 4]) {
    if data.is_empty() {
        return;
    }

    let mask_u64 = u64::from_ne_bytes([
        mask[0], mask[1], mask[2], mask[3], mask[0], mask[1], mask[2], mask[3],
    ]);

    let mut chunks = data.chunks_exact_mut(8);
    for chunk in &mut chunks {
        let word = u64::from_ne_bytes(chunk.try_into().unwrap()) ^ mask_u64;
        chunk.copy_from_slice(&word.to_ne_bytes());
    }

    let tail_start = data.len() & !7;
    for (i, byte) in data[tail_start..].iter_mut().enumerate() {
        *byte ^= mask[(tail_start + i) & 3];
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masking_is_self_inverse() {
        let mask = [0x37, 0xfa, 0x21, 0x3d];
        let original: Vec<u8> = (0..=255u8).cycle().take(1031).collect();

        let mut data = original.clone();
        apply_mask(&mut data, mask);
        assert_ne!(data, original);
        apply_mask(&mut data, mask);
        assert_eq!(data, original);
    }

    #[test]
    fn matches_bytewise_xor() {
        let mask = [0xde, 0xad, 0xbe, 0xef];
        for len in [0usize, 1, 3, 7, 8, 9, 15, 16, 17, 125] {
            let original: Vec<u8> = (0..len as u32).map(|i| (i * 7) as u8).collect();
            let mut fast = original.clone();
            apply_mask(&mut fast, mask);

            let slow: Vec<u8> = original
                .iter()
                .enumerate()
                .map(|(i, b)| b ^ mask[i & 3])
                .collect();
            assert_eq!(fast, slow, "len {}", len);
        }
    }

    #[test]
    fn key_in_network_byte_order() {
        assert_eq!(mask_bytes(0x11223344), [0x11, 0x22, 0x33, 0x44]);
        assert_eq!(mask_bytes(0), [0, 0, 0, 0]);
    }
}
