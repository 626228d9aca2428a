//! Cyrillic→Latin slug transliteration.

/// Slug length cap in characters.
const SLUG_MAX_CHARS: usize = 80;

/// Transliterate one lowercase Cyrillic character, `None` for pass-through.
fn translit(ch: char) -> Option<&'static str> {
    Some(match ch {
        'а' => "a",
        'б' => "b",
        'в' => "v",
        'г' => "g",
        'д' => "d",
        'е' | 'ё' => "e",
        'ж' => "zh",
        'з' => "z",
        'и' => "i",
        'й' => "y",
        'к' => "k",
        'л' => "l",
        'м' => "m",
        'н' => "n",
        'о' => "o",
        'п' => "p",
        'р' => "r",
        'с' => "s",
        'т' => "t",
        'у' => "u",
        'ф' => "f",
        'х' => "h",
        'ц' => "c",
        'ч' => "ch",
        'ш' => "sh",
        'щ' => "sch",
        'ъ' | 'ь' => "",
        'ы' => "y",
        'э' => "e",
        'ю' => "yu",
        'я' => "ya",
        _ => return None,
    })
}

/// Build a URL slug from a (possibly Cyrillic) keyword.
///
/// The result always matches `^[a-z0-9-]{1,80}$`; an unusable input yields
/// `"kw"`.
pub fn slugify_ru_to_lat(s: &str) -> String {
    let mut out = String::new();
    for ch in s.to_lowercase().chars() {
        match translit(ch) {
            Some(mapped) => out.push_str(mapped),
            None => out.push(ch),
        }
    }

    // Keep only latin letters, digits, hyphens, and spaces.
    let cleaned: String = out
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || *c == ' ')
        .collect();
    let hyphenated = cleaned.trim().replace(' ', "-");

    // Collapse hyphen runs.
    let mut slug = String::with_capacity(hyphenated.len());
    for ch in hyphenated.chars() {
        if ch == '-' && slug.ends_with('-') {
            continue;
        }
        slug.push(ch);
    }

    let slug: String = slug.chars().take(SLUG_MAX_CHARS).collect();
    if slug.is_empty() { "kw".into() } else { slug }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transliterates_common_keywords() {
        assert_eq!(slugify_ru_to_lat("банковская гарантия"), "bankovskaya-garantiya");
        assert_eq!(slugify_ru_to_lat("срок выпуска БГ"), "srok-vypuska-bg");
        assert_eq!(slugify_ru_to_lat("жёсткий щит"), "zhestkiy-schit");
    }

    #[test]
    fn strips_punctuation_and_collapses_hyphens() {
        assert_eq!(slugify_ru_to_lat("БГ — 44-ФЗ (тендер)!"), "bg-44-fz-tender");
        assert_eq!(slugify_ru_to_lat("a  -  b"), "a-b");
    }

    #[test]
    fn soft_and_hard_signs_vanish() {
        assert_eq!(slugify_ru_to_lat("объём"), "obem");
        assert_eq!(slugify_ru_to_lat("статья"), "statya");
    }

    #[test]
    fn empty_or_foreign_input_falls_back() {
        assert_eq!(slugify_ru_to_lat(""), "kw");
        assert_eq!(slugify_ru_to_lat("!!!"), "kw");
        assert_eq!(slugify_ru_to_lat("中文"), "kw");
    }

    #[test]
    fn caps_at_eighty_chars() {
        let long = "гарантия ".repeat(20);
        let slug = slugify_ru_to_lat(&long);
        assert!(slug.len() <= 80);
        assert!(regex::Regex::new("^[a-z0-9-]{1,80}$").unwrap().is_match(&slug));
    }
}
