//! Per-language orthography -> phoneme tables.
//! Only Hindi (Devanagari) is populated; other languages score at word level.

/// Maps single orthographic units (letters, vowel signs, marks) to a phonetic
/// symbol. An empty symbol marks a unit that is pronounced as nothing (virama).
#[derive(Debug, Clone, Copy)]
pub struct PhonemeMap {
    units: &'static [(char, &'static str)],
}

#[rustfmt::skip]
const HINDI: &[(char, &str)] = &[
    ('अ', "a"), ('आ', "aa"), ('इ', "i"), ('ई', "ii"), ('उ', "u"), ('ऊ', "uu"), ('ऋ', "ri"),
    ('ए', "e"), ('ऐ', "ai"), ('ओ', "o"), ('औ', "au"),
    ('क', "k"), ('ख', "kh"), ('ग', "g"), ('घ', "gh"), ('ङ', "ng"),
    ('च', "ch"), ('छ', "chh"), ('ज', "j"), ('झ', "jh"), ('ञ', "ny"),
    ('ट', "t"), ('ठ', "th"), ('ड', "d"), ('ढ', "dh"), ('ण', "n"),
    ('त', "t"), ('थ', "th"), ('द', "d"), ('ध', "dh"), ('न', "n"),
    ('प', "p"), ('फ', "ph"), ('ब', "b"), ('भ', "bh"), ('म', "m"),
    ('य', "y"), ('र', "r"), ('ल', "l"), ('व', "v"),
    ('श', "sh"), ('ष', "sh"), ('स', "s"), ('ह', "h"),
    ('ा', "aa"), ('ि', "i"), ('ी', "ii"), ('ु', "u"), ('ू', "uu"), ('ृ', "ri"),
    ('े', "e"), ('ै', "ai"), ('ो', "o"), ('ौ', "au"), ('ं', "n"), ('ः', "h"), ('्', ""),
];

impl PhonemeMap {
    /// Table for a language code ("hi") or name ("Hindi"), case-insensitive.
    pub fn for_language(language: &str) -> Option<Self> {
        let language = language.trim();
        if language.eq_ignore_ascii_case("hi") || language.eq_ignore_ascii_case("hindi") {
            Some(Self { units: HINDI })
        } else {
            None
        }
    }

    pub fn symbol(&self, unit: char) -> Option<&'static str> {
        self.units
            .iter()
            .find(|(c, _)| *c == unit)
            .map(|(_, symbol)| *symbol)
    }

    /// Phoneme sequence for `text`. Whitespace, unmapped units and silent
    /// marks contribute nothing.
    pub fn decompose(&self, text: &str) -> Vec<&'static str> {
        text.chars()
            .filter(|c| !c.is_whitespace())
            .filter_map(|c| self.symbol(c))
            .filter(|symbol| !symbol.is_empty())
            .collect()
    }
}
