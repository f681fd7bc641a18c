//! Bilingual (Nepali/English) term dictionary and Devanagari helpers.
//!
//! Tables are built once on first use and never mutated afterwards.

use ahash::AHashMap;
use once_cell::sync::Lazy;
use std::borrow::Cow;

/// Nepali term → English term. Multi-word phrases are matched word-for-word.
const TERMS: &[(&str, &str)] = &[
    ("नेपाल सरकार", "Government of Nepal"),
    ("सवारी चालक अनुमतिपत्र", "Driving License"),
    ("चालक अनुमतिपत्र", "Driving License"),
    ("यातायात व्यवस्था विभाग", "Department of Transport Management"),
    ("यातायात व्यवस्था कार्यालय", "Transport Management Office"),
    ("यातायात व्यवस्था सेवा कार्यालय", "Transport Management Service Office"),
    ("कार्यालय", "Office"),
    ("प्रदेश", "Province"),
    ("जिल्ला", "District"),
    ("महानगरपालिका", "Metropolitan City"),
    ("उपमहानगरपालिका", "Sub-Metropolitan City"),
    ("नगरपालिका", "Municipality"),
    ("गाउँपालिका", "Rural Municipality"),
    ("वडा", "Ward"),
    ("वडा नं", "Ward No"),
    ("टोल", "Tole"),
    ("कोशी", "Koshi"),
    ("मधेश", "Madhesh"),
    ("बागमती", "Bagmati"),
    ("गण्डकी", "Gandaki"),
    ("लुम्बिनी", "Lumbini"),
    ("कर्णाली", "Karnali"),
    ("सुदूरपश्चिम", "Sudurpashchim"),
    ("काठमाडौं", "Kathmandu"),
    ("ललितपुर", "Lalitpur"),
    ("भक्तपुर", "Bhaktapur"),
    ("पोखरा", "Pokhara"),
    ("कास्की", "Kaski"),
    ("चितवन", "Chitwan"),
    ("मोरङ", "Morang"),
    ("झापा", "Jhapa"),
    ("रुपन्देही", "Rupandehi"),
    ("मोटरसाइकल", "Motorcycle"),
    ("स्कुटर", "Scooter"),
    ("मोपेड", "Moped"),
    ("कार", "Car"),
    ("जीप", "Jeep"),
    ("पुरुष", "Male"),
    ("महिला", "Female"),
];

/// Devanagari consonants used as licence category letters, in A..K order.
const CATEGORY_LETTERS: [(char, char); 11] = [
    ('क', 'A'),
    ('ख', 'B'),
    ('ग', 'C'),
    ('घ', 'D'),
    ('ङ', 'E'),
    ('च', 'F'),
    ('छ', 'G'),
    ('ज', 'H'),
    ('झ', 'I'),
    ('ञ', 'J'),
    ('ट', 'K'),
];

/// Devanagari spellings of blood-group letters.
const BLOOD_GROUP_LETTERS: &[(&str, &str)] = &[("एबी", "AB"), ("ए", "A"), ("बी", "B"), ("ओ", "O")];

static NEPALI_TO_ENGLISH: Lazy<AHashMap<&'static str, &'static str>> = Lazy::new(|| TERMS.iter().copied().collect());

/// Keys are lower-cased English terms. The first Nepali spelling listed wins.
static ENGLISH_TO_NEPALI: Lazy<AHashMap<String, &'static str>> = Lazy::new(|| {
    let mut map = AHashMap::with_capacity(TERMS.len());
    for (nepali, english) in TERMS {
        map.entry(english.to_lowercase()).or_insert(*nepali);
    }
    map
});

static MAX_PHRASE_WORDS: Lazy<usize> = Lazy::new(|| {
    TERMS
        .iter()
        .map(|(nepali, _)| nepali.split_whitespace().count())
        .max()
        .unwrap_or(1)
});

pub fn to_english(term: &str) -> Option<&'static str> {
    NEPALI_TO_ENGLISH.get(collapse(term).as_str()).copied()
}

pub fn to_nepali(term: &str) -> Option<&'static str> {
    ENGLISH_TO_NEPALI.get(&collapse(term).to_lowercase()).copied()
}

/// Replaces every known Nepali word or phrase in `text` with its English term.
///
/// Matching is whole-word and greedy on the longest phrase, so `कार्यालय` is never read
/// as `कार`. Trailing punctuation on a word is preserved. Whitespace is collapsed.
pub fn translate_to_english(text: &str) -> String {
    let words: Vec<&str> = text.split_whitespace().collect();
    let mut out: Vec<String> = Vec::with_capacity(words.len());
    let mut i = 0;

    'outer: while i < words.len() {
        let longest = (*MAX_PHRASE_WORDS).min(words.len() - i);
        for len in (1..=longest).rev() {
            let last = words[i + len - 1];
            let trimmed_last = last.trim_end_matches(is_trailing_punct);
            let suffix = &last[trimmed_last.len()..];

            let mut phrase = words[i..i + len - 1].join(" ");
            if !phrase.is_empty() {
                phrase.push(' ');
            }
            phrase.push_str(trimmed_last);

            if let Some(english) = NEPALI_TO_ENGLISH.get(phrase.as_str()) {
                out.push(format!("{}{}", english, suffix));
                i += len;
                continue 'outer;
            }
        }
        out.push(words[i].to_string());
        i += 1;
    }

    out.join(" ")
}

/// ASCII copy of `text` with Devanagari digits (०-९) transliterated.
pub fn transliterate_digits(text: &str) -> Cow<'_, str> {
    if !text.chars().any(is_devanagari_digit) {
        return Cow::Borrowed(text);
    }
    Cow::Owned(
        text.chars()
            .map(|c| match devanagari_digit_value(c) {
                Some(d) => char::from(b'0' + d),
                None => c,
            })
            .collect(),
    )
}

pub fn is_devanagari_digit(c: char) -> bool {
    ('०'..='९').contains(&c)
}

fn devanagari_digit_value(c: char) -> Option<u8> {
    if is_devanagari_digit(c) {
        Some((c as u32 - '०' as u32) as u8)
    } else {
        None
    }
}

/// Latin category letter for a Devanagari consonant (`क` → `A` … `ट` → `K`).
pub fn category_letter(c: char) -> Option<char> {
    CATEGORY_LETTERS.iter().find(|(dev, _)| *dev == c).map(|(_, latin)| *latin)
}

/// Replaces Devanagari blood-group letters with Latin ones. Longest spelling first.
pub fn latinize_blood_group(text: &str) -> String {
    let mut out = text.to_string();
    for (dev, latin) in BLOOD_GROUP_LETTERS {
        out = out.replace(dev, latin);
    }
    out
}

fn is_trailing_punct(c: char) -> bool {
    matches!(c, ',' | '.' | ';' | ':' | '।')
}

fn collapse(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_both_directions() {
        assert_eq!(to_english("यातायात व्यवस्था कार्यालय"), Some("Transport Management Office"));
        assert_eq!(to_nepali("transport management office"), Some("यातायात व्यवस्था कार्यालय"));
        assert_eq!(to_nepali("Driving License"), Some("सवारी चालक अनुमतिपत्र"));
        assert_eq!(to_english("unknown"), None);
    }

    #[test]
    fn test_every_term_round_trips_through_english() {
        for (nepali, english) in TERMS {
            let back = to_nepali(english).unwrap();
            assert_eq!(to_english(back), Some(*english), "{}", nepali);
        }
    }

    #[test]
    fn test_translate_prefers_longest_phrase_and_whole_words() {
        assert_eq!(
            translate_to_english("यातायात व्यवस्था कार्यालय, काठमाडौं"),
            "Transport Management Office, Kathmandu"
        );
        assert_eq!(translate_to_english("ललितपुर महानगरपालिका वडा नं 5"), "Lalitpur Metropolitan City Ward No 5");
        assert_eq!(translate_to_english("Ekantakuna   Lalitpur"), "Ekantakuna Lalitpur");
    }

    #[test]
    fn test_transliterate_digits() {
        assert_eq!(transliterate_digits("०३-०६६-०४१६०५"), "03-066-041605");
        assert!(matches!(transliterate_digits("plain 123"), Cow::Borrowed(_)));
    }

    #[test]
    fn test_category_letters() {
        assert_eq!(category_letter('क'), Some('A'));
        assert_eq!(category_letter('ख'), Some('B'));
        assert_eq!(category_letter('ट'), Some('K'));
        assert_eq!(category_letter('म'), None);
    }

    #[test]
    fn test_latinize_blood_group() {
        assert_eq!(latinize_blood_group("एबी+"), "AB+");
        assert_eq!(latinize_blood_group("ओ -"), "O -");
    }
}
