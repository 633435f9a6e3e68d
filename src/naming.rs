//! Singular/plural name inference and method-name helpers.
//!
//! Inflection applies to the last word of the identifier, so
//! `lesson_names` becomes `lesson_name` and `childNodes` becomes
//! `childNode`.

use crate::config::NamingConfig;
use tracing::warn;

/// Irregular plurals, plus `-se`/`-ze`/`-che` words the suffix rules would
/// truncate.
const IRREGULARS: &[(&str, &str)] = &[
    ("people", "person"),
    ("children", "child"),
    ("men", "man"),
    ("women", "woman"),
    ("mice", "mouse"),
    ("geese", "goose"),
    ("feet", "foot"),
    ("teeth", "tooth"),
    ("indices", "index"),
    ("matrices", "matrix"),
    ("vertices", "vertex"),
    ("criteria", "criterion"),
    ("phenomena", "phenomenon"),
    ("analyses", "analysis"),
    ("axes", "axis"),
    ("aliases", "alias"),
    ("statuses", "status"),
    ("series", "series"),
    ("species", "species"),
    ("news", "news"),
    ("quizzes", "quiz"),
    ("houses", "house"),
    ("responses", "response"),
    ("courses", "course"),
    ("cases", "case"),
    ("causes", "cause"),
    ("bases", "base"),
    ("databases", "database"),
    ("phases", "phase"),
    ("purposes", "purpose"),
    ("licenses", "license"),
    ("releases", "release"),
    ("uses", "use"),
    ("sizes", "size"),
    ("prizes", "prize"),
    ("caches", "cache"),
    ("niches", "niche"),
];

/// Singulars ending in `ie`, whose plural must not take the `ies` → `y` rule.
const IE_WORDS: &[&str] = &[
    "movie", "cookie", "pie", "tie", "lie", "die", "zombie", "rookie", "calorie", "prairie",
    "hippie", "selfie", "goalie", "genie", "smoothie", "necktie", "brownie",
];

const ES_SUFFIXES: &[&str] = &["ches", "shes", "ses", "xes", "zes"];

/// How a singular token was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Inflection {
    Override,
    Irregular,
    Suffix(&'static str),
    /// No rule matched; the token equals the plural.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Singular {
    pub token: String,
    pub inflection: Inflection,
}

impl Singular {
    pub fn is_ambiguous(&self) -> bool {
        self.inflection == Inflection::Unchanged
    }
}

/// Resolves the per-item name for a singular parameter. An explicit
/// override bypasses inference entirely.
pub fn resolve(name: &str, explicit: Option<&str>, naming: &NamingConfig) -> Singular {
    match explicit {
        Some(token) => Singular {
            token: token.to_string(),
            inflection: Inflection::Override,
        },
        None => singularize(name, naming),
    }
}

/// Infers the singular form of an English plural identifier.
pub fn singularize(plural: &str, naming: &NamingConfig) -> Singular {
    if let Some(token) = naming.irregulars.get(&plural.to_ascii_lowercase()) {
        return Singular {
            token: token.clone(),
            inflection: Inflection::Irregular,
        };
    }

    let (head, word) = split_last_word(plural);
    let (singular_word, inflection) = singularize_word(word, naming);
    if inflection == Inflection::Unchanged {
        warn!(
            "Cannot infer a singular form for `{}`; using it unchanged",
            plural
        );
    }
    Singular {
        token: format!("{}{}", head, singular_word),
        inflection,
    }
}

fn singularize_word(word: &str, naming: &NamingConfig) -> (String, Inflection) {
    let lower = word.to_ascii_lowercase();

    let irregular = naming
        .irregulars
        .get(&lower)
        .map(String::as_str)
        .or_else(|| lookup(IRREGULARS, &lower));
    if let Some(singular) = irregular {
        return (match_case(word, singular), Inflection::Irregular);
    }

    if let Some(stem) = lower.strip_suffix("ies") {
        let vowel_led = stem.chars().last().map_or(true, is_vowel);
        if vowel_led || IE_WORDS.contains(&format!("{}ie", stem).as_str()) {
            return (word[..word.len() - 1].to_string(), Inflection::Suffix("s"));
        }
        let y = if word.ends_with("IES") { "Y" } else { "y" };
        return (
            format!("{}{}", &word[..word.len() - 3], y),
            Inflection::Suffix("ies"),
        );
    }

    if let Some(suffix) = ES_SUFFIXES.iter().copied().find(|s| lower.ends_with(s)) {
        return (word[..word.len() - 2].to_string(), Inflection::Suffix(suffix));
    }

    if lower.ends_with('s') && !lower.ends_with("ss") {
        return (word[..word.len() - 1].to_string(), Inflection::Suffix("s"));
    }

    (word.to_string(), Inflection::Unchanged)
}

fn lookup(table: &'static [(&'static str, &'static str)], key: &str) -> Option<&'static str> {
    table.iter().find(|(p, _)| *p == key).map(|(_, s)| *s)
}

fn is_vowel(c: char) -> bool {
    matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')
}

/// Carries the leading capital of `original` over to `replacement`.
fn match_case(original: &str, replacement: &str) -> String {
    if original.starts_with(|c: char| c.is_ascii_uppercase()) {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

/// Splits an identifier before its last word: after the final `_`, or at
/// the start of the last camelCase hump (`lessonNames` → `lesson`, `Names`).
fn split_last_word(name: &str) -> (&str, &str) {
    let mut start = 0;
    let mut prev: Option<char> = None;
    for (i, c) in name.char_indices() {
        if c == '_' {
            start = i + 1;
        } else if i > 0
            && c.is_ascii_uppercase()
            && prev.is_some_and(|p| !p.is_ascii_uppercase() && p != '_')
        {
            start = i;
        }
        prev = Some(c);
    }
    name.split_at(start)
}

pub(crate) fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub(crate) fn is_camel_case(name: &str) -> bool {
    !name.contains('_') && name.chars().any(|c| c.is_ascii_uppercase())
}

/// Joins a prefix onto a method name in the name's own style:
/// `with` + `teacher` → `with_teacher`, `with` + `teacherName` → `withTeacherName`.
pub(crate) fn prefixed(prefix: &str, name: &str) -> String {
    if prefix.ends_with('_') {
        format!("{}{}", prefix, name)
    } else if is_camel_case(name) {
        format!("{}{}", prefix, capitalize(name))
    } else {
        format!("{}_{}", prefix, name)
    }
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_alphabetic() || first == '_' => {
            chars.all(|c| c.is_alphanumeric() || c == '_')
        }
        _ => false,
    }
}
