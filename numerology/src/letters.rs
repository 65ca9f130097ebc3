//! Pythagorean letter table.
//!
//! Letters cycle through 1-9: A J S = 1, B K T = 2, ... I R = 9.
//! Only ASCII letters are mapped; everything else is skipped by callers.

/// Classification of a letter for name-based calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LetterClass {
    /// A, E, I, O, U
    Vowel,
    /// Every other letter, including Y
    Consonant,
}

/// Pythagorean value of a letter, or `None` for anything outside A-Z.
pub fn letter_value(c: char) -> Option<u32> {
    if !c.is_ascii_alphabetic() {
        return None;
    }
    let offset = c.to_ascii_uppercase() as u32 - 'A' as u32;
    Some(offset % 9 + 1)
}

/// Classify an ASCII letter. `Y` is always treated as a consonant.
pub fn classify(c: char) -> Option<LetterClass> {
    if !c.is_ascii_alphabetic() {
        return None;
    }
    match c.to_ascii_uppercase() {
        'A' | 'E' | 'I' | 'O' | 'U' => Some(LetterClass::Vowel),
        _ => Some(LetterClass::Consonant),
    }
}

/// Values of every mapped letter in `name` matching `filter`, in order.
pub(crate) fn values_where<'a>(
    name: &'a str,
    filter: impl Fn(LetterClass) -> bool + 'a,
) -> impl Iterator<Item = u32> + 'a {
    name.chars().filter_map(move |c| {
        let class = classify(c)?;
        if filter(class) {
            letter_value(c)
        } else {
            None
        }
    })
}
