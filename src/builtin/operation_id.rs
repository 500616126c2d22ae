//! Operation id derivation from method and path.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{trace, warn};

use super::{get_optional_string_config, BuiltinPatch};
use crate::core::error::Result;
use crate::core::utils::{capitalize_after_chars, common_prefix, upper_first};
use crate::openapi::Document;
use crate::patch::PatchConfig;

static VERSION_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"/[vV]([0-9]+)/").unwrap());
static PATH_PARAM_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^}]+)\}").unwrap());

/// Words whose singular and plural forms are the same.
const UNCOUNTABLE: &[&str] = &[
    "adulthood", "advice", "agenda", "aid", "aircraft", "alcohol", "ammo", "analytics", "anime",
    "athletics", "audio", "bison", "blood", "bream", "buffalo", "butter", "carp", "cash",
    "chassis", "chess", "clothing", "cod", "commerce", "cooperation", "corps", "debris",
    "diabetes", "digestion", "elk", "energy", "equipment", "excretion", "expertise", "firmware",
    "flounder", "fun", "gallows", "garbage", "graffiti", "hardware", "headquarters", "health",
    "herpes", "highjinks", "homework", "housework", "information", "jeans", "justice", "kudos",
    "labour", "literature", "machinery", "mackerel", "mail", "media", "mews", "moose", "music",
    "mud", "manga", "news", "only", "personnel", "pike", "plankton", "pliers", "police",
    "pollution", "premises", "rain", "research", "rice", "salmon", "scissors", "series",
    "sewage", "shambles", "shrimp", "software", "staff", "swine", "tennis", "traffic",
    "transportation", "trout", "tuna", "wealth", "welfare", "whiting", "wildebeest", "wildlife",
    "you",
];

/// Checked in order; the first matching suffix wins.
const PLURAL_SUFFIXES: &[(&str, &str)] = &[
    ("ies", "y"),
    ("ves", "f"),
    ("oes", "o"),
    ("ses", "s"),
    ("xes", "x"),
    ("ches", "ch"),
    ("shes", "sh"),
    ("s", ""),
];

pub fn to_singular(word: &str) -> String {
    if UNCOUNTABLE.contains(&word) {
        return word.to_string();
    }
    for (suffix, replacement) in PLURAL_SUFFIXES {
        if let Some(stem) = word.strip_suffix(suffix) {
            return format!("{stem}{replacement}");
        }
    }
    word.to_string()
}

/// Major API version from a `/v<N>/` segment, `1` when absent.
pub fn parse_api_version(url: &str) -> String {
    VERSION_RE
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| "1".to_string())
}

fn singularize_before_params(path: &str) -> String {
    let mut sections: Vec<String> = path.split('/').map(str::to_string).collect();
    for i in 0..sections.len().saturating_sub(1) {
        if sections[i + 1].starts_with('{') {
            sections[i] = to_singular(&sections[i]);
        }
    }
    sections.join("/")
}

/// Derives a deterministic operation id, e.g.
/// `GET /api/v1/books/{bookId}/file/*` gives `getBookByBookIdFileV1`.
pub fn to_operation_id(method: &str, url: &str) -> String {
    let id = url.replacen("/api/", "", 1);
    let id = id.replacen("/rest/", "", 1);
    let id = id.replacen("/oauth2/", "/OAuth2/", 1);
    let id = singularize_before_params(&id);
    let id = PATH_PARAM_RE
        .replace_all(&id, |caps: &regex::Captures| format!("By{}", upper_first(&caps[1])))
        .into_owned();

    let version = parse_api_version(url);
    let id = id.replacen(&format!("v{version}/"), "", 1);
    let id = id.replacen(&format!("api/{version}/"), "", 1);
    let id = id.replacen('*', "", 1);
    let id = id.replace('.', "");

    format!(
        "{}{}V{}",
        method.to_lowercase(),
        capitalize_after_chars(&id, &['/', '-', ':'], true),
        version
    )
}

fn trimmed_url<'a>(url: &'a str, trim_prefix: Option<&str>) -> &'a str {
    match trim_prefix {
        Some(prefix) if !prefix.is_empty() => url.strip_prefix(prefix).unwrap_or(url),
        _ => url,
    }
}

/// Overwrites every operation id. Config: optional `trim-prefix`.
pub fn generate_operation_ids(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    let trim_prefix = get_optional_string_config(config, "trim-prefix");
    let mut seen = HashSet::new();
    doc.for_each_operation_mut(|path, method, op| {
        let generated = to_operation_id(method.as_str(), trimmed_url(path, trim_prefix.as_deref()));
        trace!(
            path = %format!("{method} {path}"),
            operation_id = %generated,
            original_operation_id = %op.operation_id,
            "Replacing operation id with generated id"
        );
        if !seen.insert(generated.clone()) {
            warn!(operation_id = %generated, path = %path, "Duplicate generated operation id");
        }
        op.operation_id = generated;
    });
    Ok(())
}

/// Fills blank operation ids only. Existing ids are reserved; a generated id
/// that clashes gets a numeric suffix.
pub fn generate_missing_operation_ids(doc: &mut Document, config: &PatchConfig) -> Result<()> {
    let trim_prefix = get_optional_string_config(config, "trim-prefix");
    let mut reserved: HashSet<String> = doc
        .operations()
        .map(|(_, _, op)| op.operation_id.clone())
        .filter(|id| !id.is_empty())
        .collect();

    doc.for_each_operation_mut(|path, method, op| {
        if !op.operation_id.is_empty() {
            return;
        }
        let base = to_operation_id(method.as_str(), trimmed_url(path, trim_prefix.as_deref()));
        let mut candidate = base.clone();
        let mut counter = 2;
        while reserved.contains(&candidate) {
            candidate = format!("{base}{counter}");
            counter += 1;
        }
        trace!(path = %path, operation_id = %candidate, "Generated missing operation id");
        reserved.insert(candidate.clone());
        op.operation_id = candidate;
    });
    Ok(())
}

/// Strips the longest prefix shared by every operation id. An id equal to
/// the prefix is kept whole.
pub fn remove_common_operation_id_prefix(doc: &mut Document, _config: &PatchConfig) -> Result<()> {
    let ids: Vec<String> = doc
        .operations()
        .map(|(_, _, op)| op.operation_id.clone())
        .collect();
    let prefix = common_prefix(&ids);
    if prefix.is_empty() {
        return Ok(());
    }
    doc.for_each_operation_mut(|_, _, op| {
        match op.operation_id.strip_prefix(&prefix) {
            Some(rest) if !rest.is_empty() => op.operation_id = rest.to_string(),
            _ => {}
        }
    });
    Ok(())
}

pub(super) fn patches() -> Vec<BuiltinPatch> {
    vec![
        BuiltinPatch {
            id: "generate-operation-id",
            description: "Generates operation IDs for all operations (overwrites existing IDs)",
            affects_codegen: true,
            apply: generate_operation_ids,
        },
        BuiltinPatch {
            id: "generate-missing-operation-id",
            description: "Generates operation IDs for all operations that are missing an ID (does not overwrite existing IDs)",
            affects_codegen: true,
            apply: generate_missing_operation_ids,
        },
        BuiltinPatch {
            id: "fix-remove-common-operation-id-prefix",
            description: "Removes common prefixes from operation IDs",
            affects_codegen: false,
            apply: remove_common_operation_id_prefix,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openapi::parse_document;
    use serde_json::json;

    #[test]
    fn test_to_operation_id() {
        let cases = [
            ("GET", "/api/users", "getUsersV1"),
            ("GET", "/api/users/{id}", "getUserByIdV1"),
            ("POST", "/api/posts/{id}/comments", "postPostByIdCommentsV1"),
            ("PUT", "/api/v1/updates/{id}", "putUpdateByIdV1"),
            ("DELETE", "/api/v2/posts/{id}", "deletePostByIdV2"),
            ("PATCH", "/api/v1/items/{id}/update", "patchItemByIdUpdateV1"),
            ("GET", "/api/v1/books/{bookId}/file/*", "getBookByBookIdFileV1"),
            (
                "PUT",
                "/api/v2/series/{seriesId}/read-progress/tachiyomi",
                "putSeriesBySeriesIdReadProgressTachiyomiV2",
            ),
            ("PUT", "/api/v1.2/updates/{id}", "putV12UpdateByIdV1"),
            ("POST", "/api/v2/books", "postBooksV2"),
            ("PATCH", "/api/v1/oauth2/providers", "patchOAuth2ProvidersV1"),
        ];
        for (method, url, expected) in cases {
            assert_eq!(to_operation_id(method, url), expected, "{method} {url}");
        }
    }

    #[test]
    fn test_to_singular() {
        assert_eq!(to_singular("cities"), "city");
        assert_eq!(to_singular("wolves"), "wolf");
        assert_eq!(to_singular("batches"), "batch");
        assert_eq!(to_singular("cats"), "cat");
        assert_eq!(to_singular("news"), "news");
        assert_eq!(to_singular("data"), "data");
    }

    #[test]
    fn test_parse_api_version() {
        assert_eq!(parse_api_version("/api/v1/books"), "1");
        assert_eq!(parse_api_version("/api/V2/books"), "2");
        assert_eq!(parse_api_version("/user/details"), "1");
        assert_eq!(parse_api_version("/order/v10/submit"), "10");
        assert_eq!(parse_api_version(""), "1");
    }

    fn doc() -> Document {
        parse_document(
            br#"
openapi: 3.0.3
info: {title: t, version: "1"}
paths:
  /svc/pets:
    get: {operationId: listPets, responses: {}}
    post: {responses: {}}
  /svc/pets/{id}:
    get: {responses: {}}
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_generate_all_overwrites_with_trimmed_prefix() {
        let mut doc = doc();
        let mut config = PatchConfig::new();
        config.insert("trim-prefix".into(), json!("/svc"));
        generate_operation_ids(&mut doc, &config).unwrap();
        let ids: Vec<_> = doc.operations().map(|(_, _, op)| op.operation_id.clone()).collect();
        assert_eq!(ids, vec!["getPetsV1", "postPetsV1", "getPetByIdV1"]);
    }

    #[test]
    fn test_generate_missing_respects_reserved() {
        let mut doc = doc();
        doc.paths["/svc/pets"].get.as_mut().unwrap().operation_id = "postSvcPetsV1".into();
        generate_missing_operation_ids(&mut doc, &PatchConfig::new()).unwrap();
        let ids: Vec<_> = doc.operations().map(|(_, _, op)| op.operation_id.clone()).collect();
        assert_eq!(ids, vec!["postSvcPetsV1", "postSvcPetsV12", "getSvcPetByIdV1"]);
    }

    #[test]
    fn test_remove_common_prefix() {
        let mut doc = doc();
        let mut ids = ["petsApiList", "petsApiCreate", "petsApiGet"].into_iter();
        doc.for_each_operation_mut(|_, _, op| {
            op.operation_id = ids.next().unwrap().to_string();
        });
        remove_common_operation_id_prefix(&mut doc, &PatchConfig::new()).unwrap();
        let ids: Vec<_> = doc.operations().map(|(_, _, op)| op.operation_id.clone()).collect();
        assert_eq!(ids, vec!["List", "Create", "Get"]);
    }

    #[test]
    fn test_remove_common_prefix_never_empties_an_id() {
        let mut doc = doc();
        let mut ids = ["list", "listPets", "listPetsById"].into_iter();
        doc.for_each_operation_mut(|_, _, op| {
            op.operation_id = ids.next().unwrap().to_string();
        });
        remove_common_operation_id_prefix(&mut doc, &PatchConfig::new()).unwrap();
        let ids: Vec<_> = doc.operations().map(|(_, _, op)| op.operation_id.clone()).collect();
        assert_eq!(ids, vec!["list", "Pets", "PetsById"]);
    }
}
