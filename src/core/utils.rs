//! String transformation utilities shared by transforms and generators

/// Converts a string to snake_case.
///
/// Handles camelCase, PascalCase, kebab-case and space separated input.
/// Acronyms are kept together: `getHTTPResponse` becomes `get_http_response`.
///
/// # Examples
/// ```
/// use specweave::core::utils::to_snake_case;
///
/// assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
/// assert_eq!(to_snake_case("FindPetsByStatus"), "find_pets_by_status");
/// assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
/// assert_eq!(to_snake_case("get HTTP Response"), "get_http_response");
/// ```
pub fn to_snake_case(s: &str) -> String {
    let chars: Vec<char> = s.chars().collect();
    let mut result = String::with_capacity(s.len() + 4);

    for (i, &ch) in chars.iter().enumerate() {
        if ch.is_uppercase() {
            let prev = if i > 0 { Some(chars[i - 1]) } else { None };
            let next_is_lower = chars.get(i + 1).is_some_and(|c| c.is_lowercase());
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => next_is_lower,
                _ => false,
            };
            if boundary && !result.ends_with('_') {
                result.push('_');
            }
            result.extend(ch.to_lowercase());
        } else if ch.is_alphanumeric() {
            result.push(ch);
        } else if !result.is_empty() && !result.ends_with('_') {
            result.push('_');
        }
    }

    result.trim_matches('_').to_string()
}

/// Converts a string to PascalCase by normalizing through snake_case first.
///
/// # Examples
/// ```
/// use specweave::core::utils::to_pascal_case;
///
/// assert_eq!(to_pascal_case("find_pets_by_status"), "FindPetsByStatus");
/// assert_eq!(to_pascal_case("getBookByIdV1"), "GetBookByIdV1");
/// ```
pub fn to_pascal_case(s: &str) -> String {
    to_snake_case(s)
        .split('_')
        .filter(|w| !w.is_empty())
        .map(upper_first)
        .collect()
}

/// Converts a string to camelCase.
pub fn to_camel_case(s: &str) -> String {
    let pascal = to_pascal_case(s);
    let mut chars = pascal.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Converts a string to UPPER_SNAKE_CASE.
pub fn to_upper_snake_case(s: &str) -> String {
    to_snake_case(s).to_uppercase()
}

/// Upper-cases the first character and leaves the rest untouched.
pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

/// Removes every occurrence of `separators` and upper-cases the character that
/// followed each one. With `capitalize_first` the first character is
/// upper-cased too.
///
/// ```
/// use specweave::core::utils::capitalize_after_chars;
///
/// assert_eq!(capitalize_after_chars("/book/ByBookId/file", &['/'], false), "BookByBookIdFile");
/// assert_eq!(capitalize_after_chars("my-api:v2", &['-', ':'], true), "MyApiV2");
/// ```
pub fn capitalize_after_chars(s: &str, separators: &[char], capitalize_first: bool) -> String {
    let mut result = String::with_capacity(s.len());
    let mut capitalize_next = capitalize_first;

    for ch in s.chars() {
        if separators.contains(&ch) {
            capitalize_next = true;
            continue;
        }
        if capitalize_next {
            result.extend(ch.to_uppercase());
            capitalize_next = false;
        } else {
            result.push(ch);
        }
    }
    result
}

/// Returns the longest prefix shared by every string. One or zero inputs have
/// no common prefix.
pub fn common_prefix<S: AsRef<str>>(values: &[S]) -> String {
    if values.len() <= 1 {
        return String::new();
    }
    let first = values[0].as_ref();
    let mut end = first.len();
    for value in &values[1..] {
        let value = value.as_ref();
        end = first
            .char_indices()
            .zip(value.chars())
            .take_while(|((_, a), b)| a == b)
            .map(|((i, a), _)| i + a.len_utf8())
            .last()
            .unwrap_or(0)
            .min(end);
        if end == 0 {
            break;
        }
    }
    first[..end].to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("findPetsByStatus"), "find_pets_by_status");
        assert_eq!(to_snake_case("FindPetsByStatus"), "find_pets_by_status");
        assert_eq!(to_snake_case("find-pets-by-status"), "find_pets_by_status");
        assert_eq!(to_snake_case("find_pets_by_status"), "find_pets_by_status");
        assert_eq!(to_snake_case("HTTPResponse"), "http_response");
        assert_eq!(to_snake_case("getHTTPResponse"), "get_http_response");
        assert_eq!(to_snake_case("getV12UpdateV1"), "get_v12_update_v1");
        assert_eq!(to_snake_case("  spaced  out "), "spaced_out");
    }

    #[test]
    fn test_to_pascal_case() {
        assert_eq!(to_pascal_case("find_pets_by_status"), "FindPetsByStatus");
        assert_eq!(to_pascal_case("findPetsByStatus"), "FindPetsByStatus");
        assert_eq!(to_pascal_case("FIND_PETS_BY_STATUS"), "FindPetsByStatus");
        assert_eq!(to_pascal_case("postBooksV2"), "PostBooksV2");
        assert_eq!(to_pascal_case(""), "");
    }

    #[test]
    fn test_to_camel_and_upper_snake() {
        assert_eq!(to_camel_case("Find-Pets"), "findPets");
        assert_eq!(to_upper_snake_case("maxPageSize"), "MAX_PAGE_SIZE");
    }

    #[test]
    fn test_capitalize_after_chars() {
        assert_eq!(
            capitalize_after_chars("/pets/ByPetId", &['/', '-', ':'], true),
            "PetsByPetId"
        );
        assert_eq!(capitalize_after_chars("a-b", &['-'], false), "aB");
    }

    #[test]
    fn test_common_prefix() {
        assert_eq!(common_prefix(&["apiGetPet", "apiListPets"]), "api");
        assert_eq!(common_prefix(&["getPet"]), "");
        assert_eq!(common_prefix::<&str>(&[]), "");
        assert_eq!(common_prefix(&["abc", "xyz"]), "");
    }
}
