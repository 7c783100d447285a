// Linear-light alpha compositing with table lookups instead of powf.
// Used when the ink layer is laid over the camera background.

pub struct GammaLut {
    // sRGB(0..255) -> linear (0..1)
    srgb_to_linear: [f32; 256],
    // linear(0..1) -> sRGB(0..255), quantized to 4096 steps
    linear_to_srgb: [u8; 4096],
}

impl GammaLut {
    pub fn new() -> Self {
        let mut s2l = [0.0f32; 256];
        for (v, out) in s2l.iter_mut().enumerate() {
            let c = v as f32 / 255.0;
            *out = if c <= 0.04045 { c / 12.92 } else { ((c + 0.055) / 1.055).powf(2.4) };
        }

        let mut l2s = [0u8; 4096];
        for (i, out) in l2s.iter_mut().enumerate() {
            let l = i as f32 / 4095.0;
            let s = if l <= 0.003_130_8 { 12.92 * l } else { 1.055 * l.powf(1.0 / 2.4) - 0.055 };
            *out = (s * 255.0).round().clamp(0.0, 255.0) as u8;
        }

        Self { srgb_to_linear: s2l, linear_to_srgb: l2s }
    }

    #[inline]
    pub fn srgb_u8_to_linear(&self, v: u8) -> f32 {
        self.srgb_to_linear[v as usize]
    }

    #[inline]
    pub fn linear_to_srgb_u8(&self, l: f32) -> u8 {
        let idx = (l.clamp(0.0, 1.0) * 4095.0).round() as usize;
        self.linear_to_srgb[idx]
    }

    /// `src` over `dst`, weighted by src's alpha byte. Result is opaque.
    #[inline]
    pub fn over(&self, dst: u32, src: u32) -> u32 {
        let a = (src >> 24) as u8;
        match a {
            0 => dst | 0xFF00_0000,
            255 => src,
            _ => {
                let a = a as f32 / 255.0;
                let mix = |shift: u32| {
                    let d = self.srgb_u8_to_linear(((dst >> shift) & 0xFF) as u8);
                    let s = self.srgb_u8_to_linear(((src >> shift) & 0xFF) as u8);
                    self.linear_to_srgb_u8(a * s + (1.0 - a) * d) as u32
                };
                0xFF00_0000 | (mix(16) << 16) | (mix(8) << 8) | mix(0)
            }
        }
    }
}

impl Default for GammaLut {
    fn default() -> Self {
        Self::new()
    }
}
