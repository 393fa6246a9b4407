//! Mip chain for the glyph atlas, built on the CPU before upload.
//!
//! Glyphs are oversampled and drawn scaled down, so minified labels sample the smaller levels.

/// Number of levels down to 1x1.
#[inline]
pub fn mip_level_count(width: u32, height: u32) -> u32 {
    32 - width.max(height).max(1).leading_zeros()
}

/// Halves an RGBA8 image with a 2x2 box filter. The last row or column of odd sizes is reused.
pub fn downsample(width: u32, height: u32, pixels: &[u8]) -> (u32, u32, Vec<u8>) {
    let out_w = (width / 2).max(1);
    let out_h = (height / 2).max(1);
    let mut out = vec![0u8; (out_w * out_h * 4) as usize];

    for y in 0..out_h {
        for x in 0..out_w {
            let x0 = (x * 2).min(width - 1);
            let x1 = (x * 2 + 1).min(width - 1);
            let y0 = (y * 2).min(height - 1);
            let y1 = (y * 2 + 1).min(height - 1);
            for c in 0..4 {
                let at = |px: u32, py: u32| u32::from(pixels[((py * width + px) * 4) as usize + c]);
                let sum = at(x0, y0) + at(x1, y0) + at(x0, y1) + at(x1, y1);
                out[((y * out_w + x) * 4) as usize + c] = ((sum + 2) / 4) as u8;
            }
        }
    }
    (out_w, out_h, out)
}

/// Levels 1.. of the chain for a `width` x `height` base image.
pub fn mip_chain(width: u32, height: u32, pixels: &[u8]) -> Vec<(u32, u32, Vec<u8>)> {
    let levels = mip_level_count(width, height);
    let mut chain: Vec<(u32, u32, Vec<u8>)> = Vec::with_capacity(levels.saturating_sub(1) as usize);
    for _ in 1..levels {
        let next = match chain.last() {
            Some((w, h, data)) => downsample(*w, *h, data),
            None => downsample(width, height, pixels),
        };
        chain.push(next);
    }
    chain
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_count() {
        assert_eq!(mip_level_count(1, 1), 1);
        assert_eq!(mip_level_count(8, 8), 4);
        assert_eq!(mip_level_count(1024, 3), 11);
        assert_eq!(mip_level_count(5, 2), 3);
    }

    #[test]
    fn test_downsample_averages_quads() {
        #[rustfmt::skip]
        let pixels = [
            0, 0, 0, 255,     255, 255, 255, 255,
            255, 255, 255, 255, 0, 0, 0, 255,
        ];
        let (w, h, out) = downsample(2, 2, &pixels);
        assert_eq!((w, h), (1, 1));
        assert_eq!(out, vec![128, 128, 128, 255]);
    }

    #[test]
    fn test_chain_ends_at_single_texel() {
        let pixels = vec![200u8; 6 * 3 * 4];
        let chain = mip_chain(6, 3, &pixels);

        let sizes: Vec<(u32, u32)> = chain.iter().map(|(w, h, _)| (*w, *h)).collect();
        assert_eq!(sizes, vec![(3, 1), (1, 1)]);
        for (w, h, data) in &chain {
            assert_eq!(data.len(), (w * h * 4) as usize);
            assert!(data.iter().all(|v| *v == 200));
        }
    }
}
