//! Virtual-key codes, the pressed-key set and modifier flags.

/// Virtual-key codes referenced by the engine itself.
///
/// Everything else is reached through the binding table.
pub mod vk {
    pub const TAB: u32 = 0x09;
    pub const RETURN: u32 = 0x0D;
    pub const SHIFT: u32 = 0x10;
    pub const CONTROL: u32 = 0x11;
    pub const MENU: u32 = 0x12;
    pub const CAPITAL: u32 = 0x14;
    pub const LWIN: u32 = 0x5B;
    pub const RWIN: u32 = 0x5C;
    pub const LSHIFT: u32 = 0xA0;
    pub const RSHIFT: u32 = 0xA1;
    pub const LCONTROL: u32 = 0xA2;
    pub const RCONTROL: u32 = 0xA3;
    pub const LMENU: u32 = 0xA4;
    pub const RMENU: u32 = 0xA5;
}

/// Set of virtual-key codes in the `0..256` range.
///
/// Stored as a 256-bit mask so a snapshot is a plain copy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct KeySet([u64; 4]);

impl KeySet {
    pub const fn new() -> Self {
        Self([0; 4])
    }

    #[inline(always)]
    fn slot(vk: u32) -> Option<(usize, u64)> {
        (vk < 256).then(|| ((vk / 64) as usize, 1u64 << (vk % 64)))
    }

    /// Adds `vk`, returning `true` if it was not already present.
    /// Codes outside `0..256` are ignored.
    #[inline]
    pub fn insert(&mut self, vk: u32) -> bool {
        match Self::slot(vk) {
            Some((word, bit)) => {
                let fresh = self.0[word] & bit == 0;
                self.0[word] |= bit;
                fresh
            }
            None => false,
        }
    }

    /// Removes `vk`, returning `true` if it was present.
    #[inline]
    pub fn remove(&mut self, vk: u32) -> bool {
        match Self::slot(vk) {
            Some((word, bit)) => {
                let present = self.0[word] & bit != 0;
                self.0[word] &= !bit;
                present
            }
            None => false,
        }
    }

    #[inline]
    pub fn contains(&self, vk: u32) -> bool {
        Self::slot(vk).is_some_and(|(word, bit)| self.0[word] & bit != 0)
    }

    pub fn contains_any(&self, keys: &[u32]) -> bool {
        keys.iter().any(|&k| self.contains(k))
    }

    /// True if any code is in both sets.
    #[inline]
    pub fn intersects(&self, other: &KeySet) -> bool {
        self.0.iter().zip(other.0.iter()).any(|(a, b)| a & b != 0)
    }

    pub fn is_empty(&self) -> bool {
        self.0.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.0.iter().map(|w| w.count_ones() as usize).sum()
    }

    pub fn clear(&mut self) {
        self.0 = [0; 4];
    }

    /// Iterates the contained codes in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u32> + '_ {
        self.0.iter().enumerate().flat_map(|(word, bits)| {
            let mut bits = *bits;
            std::iter::from_fn(move || {
                if bits == 0 {
                    return None;
                }
                let offset = bits.trailing_zeros();
                bits &= bits - 1;
                Some(word as u32 * 64 + offset)
            })
        })
    }
}

impl FromIterator<u32> for KeySet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = KeySet::new();
        for vk in iter {
            set.insert(vk);
        }
        set
    }
}

/// Modifier flags derived from a [`KeySet`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Modifiers {
    pub ctrl: bool,
    pub alt: bool,
    pub shift: bool,
    pub meta: bool,
}

impl Modifiers {
    pub fn from_keys(keys: &KeySet) -> Self {
        Self {
            ctrl: keys.contains_any(&[vk::LCONTROL, vk::RCONTROL, vk::CONTROL]),
            alt: keys.contains_any(&[vk::LMENU, vk::RMENU, vk::MENU]),
            shift: keys.contains_any(&[vk::LSHIFT, vk::RSHIFT, vk::SHIFT]),
            meta: keys.contains_any(&[vk::LWIN, vk::RWIN]),
        }
    }

    /// Ctrl or the Windows key suspends interception so OS shortcuts work.
    #[inline(always)]
    pub fn passthrough(&self) -> bool {
        self.ctrl || self.meta
    }
}
