//! URL canonicalization so equivalent URLs collapse to one frontier entry.

use url::Url;

/// Canonicalizes a URL. Total and deterministic: on parse failure (or a
/// host-less URL like `mailto:`) the input comes back unchanged.
///
/// Steps, in order: strip fragment, lowercase host, strip leading `www.`,
/// drop the scheme's default port, resolve `.`/`..` segments, strip a
/// single trailing slash (root `/` becomes empty), percent-decode
/// unreserved characters, sort query parameters by key (stable, so
/// duplicate keys keep their value order).
pub fn normalize(url: &str) -> String {
    let Ok(mut parsed) = Url::parse(url.trim()) else {
        return url.to_string();
    };
    if parsed.host_str().is_none() {
        return url.to_string();
    }

    parsed.set_fragment(None);

    // Host case and default ports are handled by the parser itself.
    if let Some(host) = parsed.host_str()
        && let Some(stripped) = host.strip_prefix("www.")
    {
        let stripped = stripped.to_string();
        let _ = parsed.set_host(Some(&stripped));
    }

    let mut path = decode_unreserved(parsed.path());
    if path.len() > 1 && path.ends_with('/') {
        path.pop();
    }

    let query = parsed
        .query()
        .filter(|q| !q.is_empty())
        .map(|q| sort_query(&decode_unreserved(q)));

    let mut out = format!("{}://{}", parsed.scheme(), parsed.authority());
    if !path.is_empty() && path != "/" {
        out.push_str(&path);
    }
    if let Some(query) = query {
        out.push('?');
        out.push_str(&query);
    }
    out
}

/// True when both URLs canonicalize to the same form.
pub fn are_equivalent(a: &str, b: &str) -> bool {
    normalize(a) == normalize(b)
}

/// Picks the best representative among equivalent URLs: HTTPS first, then
/// no query string, then shortest path, then lexicographically smallest.
pub fn canonical_of(urls: &[&str]) -> Option<String> {
    urls.iter()
        .min_by(|a, b| canonical_rank(a).cmp(&canonical_rank(b)))
        .map(|url| url.to_string())
}

fn canonical_rank(url: &str) -> (u8, u8, usize, &str) {
    match Url::parse(url) {
        Ok(parsed) => (
            u8::from(parsed.scheme() != "https"),
            u8::from(parsed.query().is_some()),
            parsed.path().len(),
            url,
        ),
        Err(_) => (u8::MAX, u8::MAX, usize::MAX, url),
    }
}

/// Decodes %XX sequences whose byte is unreserved (letters, digits,
/// `-._~`). Everything else, encoded spaces included, is left intact.
fn decode_unreserved(input: &str) -> String {
    let bytes = input.as_bytes();
    let mut out = String::with_capacity(input.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%'
            && i + 2 < bytes.len()
            && let (Some(hi), Some(lo)) = (hex_value(bytes[i + 1]), hex_value(bytes[i + 2]))
        {
            let decoded = hi * 16 + lo;
            if decoded.is_ascii_alphanumeric() || matches!(decoded, b'-' | b'.' | b'_' | b'~') {
                out.push(decoded as char);
                i += 3;
                continue;
            }
        }
        if bytes[i].is_ascii() {
            out.push(bytes[i] as char);
            i += 1;
        } else {
            // Serialized URLs are ASCII, but stay safe on arbitrary input.
            let ch = input[i..].chars().next().unwrap_or('\u{fffd}');
            out.push(ch);
            i += ch.len_utf8();
        }
    }
    out
}

fn hex_value(byte: u8) -> Option<u8> {
    match byte {
        b'0'..=b'9' => Some(byte - b'0'),
        b'a'..=b'f' => Some(byte - b'a' + 10),
        b'A'..=b'F' => Some(byte - b'A' + 10),
        _ => None,
    }
}

fn sort_query(query: &str) -> String {
    let mut params: Vec<&str> = query.split('&').filter(|p| !p.is_empty()).collect();
    params.sort_by(|a, b| {
        let key_a = a.split('=').next().unwrap_or(a);
        let key_b = b.split('=').next().unwrap_or(b);
        key_a.cmp(key_b)
    });
    params.join("&")
}
