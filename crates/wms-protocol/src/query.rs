//! Query string helpers shared by the request builders.

use url::Url;

/// Set KVP parameters on `url`, replacing any existing parameter of the same
/// name. WMS parameter names are case-insensitive, so `request=foo` on the
/// base URL is replaced by `REQUEST=...`. Other parameters keep their order.
pub(crate) fn set_params(url: &mut Url, params: &[(&str, String)]) {
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| !params.iter().any(|(name, _)| key.eq_ignore_ascii_case(name)))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    let mut pairs = url.query_pairs_mut();
    pairs.clear();
    for (key, value) in &kept {
        pairs.append_pair(key, value);
    }
    for (key, value) in params {
        pairs.append_pair(key, value);
    }
}
