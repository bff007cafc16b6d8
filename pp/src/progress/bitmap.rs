//! Fixed-size fill bitmap for dense-mode progress

/// One bit per cell, packed into `u64` words
#[derive(Debug, Clone)]
pub struct FillBitmap {
    words: Vec<u64>,
    len: u64,
}

impl FillBitmap {
    pub fn new(len: u64) -> Self {
        let word_count = len.div_ceil(64) as usize;
        Self {
            words: vec![0; word_count],
            len,
        }
    }

    #[cfg(test)]
    fn get(&self, idx: u64) -> bool {
        if idx >= self.len {
            return false;
        }
        let word = (idx >> 6) as usize;
        let bit = idx & 63;
        self.words[word] & (1u64 << bit) != 0
    }

    /// Set a bit, returning true only if it was previously clear
    #[inline]
    pub fn set(&mut self, idx: u64) -> bool {
        if idx >= self.len {
            return false;
        }
        let word = (idx >> 6) as usize;
        let mask = 1u64 << (idx & 63);
        let was_clear = self.words[word] & mask == 0;
        self.words[word] |= mask;
        was_clear
    }

    /// Iterate over set indices in ascending order
    pub fn iter_set(&self) -> impl Iterator<Item = u64> + '_ {
        self.words.iter().enumerate().flat_map(|(w, &word)| {
            let base = (w as u64) << 6;
            let mut remaining = word;
            std::iter::from_fn(move || {
                if remaining == 0 {
                    return None;
                }
                let bit = u64::from(remaining.trailing_zeros());
                remaining &= remaining - 1;
                Some(base + bit)
            })
        })
    }
}
