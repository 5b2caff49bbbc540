/// Maps between singular and plural entity names.
///
/// The default implementation covers regular English suffixes only.
/// Schemas with irregular table names should supply their own impl
/// through `Base::with_inflector`.
pub trait Inflector {
    fn singularize(&self, word: &str) -> String;
    fn pluralize(&self, word: &str) -> String;
}

/// Suffix-heuristic inflector used unless the caller installs another.
#[derive(Debug, Default, Clone)]
pub struct DefaultInflector;

impl Inflector for DefaultInflector {
    fn singularize(&self, word: &str) -> String {
        if word.len() > 3 && word.ends_with("ies") {
            let mut s = word[..word.len() - 3].to_string();
            s.push('y');
            return s;
        }
        for suffix in ["ses", "xes", "zes", "ches", "shes"] {
            if word.ends_with(suffix) {
                return word[..word.len() - 2].to_string();
            }
        }
        if word.ends_with('s') && !word.ends_with("ss") {
            return word[..word.len() - 1].to_string();
        }
        word.to_string()
    }

    fn pluralize(&self, word: &str) -> String {
        if let Some(stem) = word.strip_suffix('y') {
            let penultimate = stem.chars().last();
            let is_vowel = matches!(penultimate, Some('a' | 'e' | 'i' | 'o' | 'u'));
            if !is_vowel && !stem.is_empty() {
                return format!("{stem}ies");
            }
        }
        let needs_es = word.ends_with('s')
            || word.ends_with('x')
            || word.ends_with('z')
            || word.ends_with("ch")
            || word.ends_with("sh");
        if needs_es {
            return format!("{word}es");
        }
        format!("{word}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn singularizes_regular_suffixes() {
        let inf = DefaultInflector;
        assert_eq!(inf.singularize("posts"), "post");
        assert_eq!(inf.singularize("comments"), "comment");
        assert_eq!(inf.singularize("stories"), "story");
        assert_eq!(inf.singularize("boxes"), "box");
        assert_eq!(inf.singularize("statuses"), "status");
        assert_eq!(inf.singularize("branches"), "branch");
    }

    #[test]
    fn leaves_non_plural_words_alone() {
        let inf = DefaultInflector;
        assert_eq!(inf.singularize("address"), "address");
        assert_eq!(inf.singularize("post"), "post");
    }

    #[test]
    fn pluralizes_regular_suffixes() {
        let inf = DefaultInflector;
        assert_eq!(inf.pluralize("post"), "posts");
        assert_eq!(inf.pluralize("story"), "stories");
        assert_eq!(inf.pluralize("day"), "days");
        assert_eq!(inf.pluralize("box"), "boxes");
        assert_eq!(inf.pluralize("status"), "statuses");
        assert_eq!(inf.pluralize("branch"), "branches");
    }

    #[test]
    fn round_trips_common_table_names() {
        let inf = DefaultInflector;
        for table in ["posts", "comments", "tags", "authors", "stories"] {
            assert_eq!(inf.pluralize(&inf.singularize(table)), table);
        }
    }
}
