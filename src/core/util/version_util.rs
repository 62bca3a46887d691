/// Version assumed for an upstream that does not report one.
pub const ASSUMED_UPSTREAM_VERSION: &str = "0.22.0";

/// Parse `major.minor.patch`, tolerating a leading `v` and anything after
/// the first `-` or `+` (pre-release and build metadata are ignored).
pub fn parse_semver(version: &str) -> Option<(u64, u64, u64)> {
    let version = version.trim();
    let version = version.strip_prefix('v').unwrap_or(version);
    let core = version
        .split(|c| c == '-' || c == '+')
        .next()
        .unwrap_or_default();

    let mut parts = core.split('.');
    let major = parts.next()?.parse().ok()?;
    let minor = parts.next()?.parse().ok()?;
    let patch = parts.next()?.parse().ok()?;
    if parts.next().is_some() {
        return None;
    }
    Some((major, minor, patch))
}

/// Lowest version out of `versions`. Empty or unparseable entries count as
/// [`ASSUMED_UPSTREAM_VERSION`]; with no entries at all that is the result too.
pub fn min_version<'a, I>(versions: I) -> String
where
    I: IntoIterator<Item = &'a str>,
{
    let assumed = parse_semver(ASSUMED_UPSTREAM_VERSION).unwrap_or((0, 22, 0));

    versions
        .into_iter()
        .map(|v| {
            let short = v.split('-').next().unwrap_or_default();
            match parse_semver(short) {
                Some(parsed) => (parsed, short.to_string()),
                None => (assumed, ASSUMED_UPSTREAM_VERSION.to_string()),
            }
        })
        .min_by_key(|(parsed, _)| *parsed)
        .map(|(_, text)| text)
        .unwrap_or_else(|| ASSUMED_UPSTREAM_VERSION.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_and_prefixed_versions() {
        assert_eq!(parse_semver("0.21.0"), Some((0, 21, 0)));
        assert_eq!(parse_semver("v1.2.3"), Some((1, 2, 3)));
        assert_eq!(parse_semver("0.24.0-rc.1"), Some((0, 24, 0)));
        assert_eq!(parse_semver(""), None);
        assert_eq!(parse_semver("1.2"), None);
    }

    #[test]
    fn compares_numerically_not_lexicographically() {
        assert_eq!(min_version(["0.10.0", "0.9.0"]), "0.9.0");
        assert_eq!(min_version(["0.21.0-abc", "0.22.1"]), "0.21.0");
    }

    #[test]
    fn empty_versions_count_as_assumed() {
        assert_eq!(min_version(std::iter::empty()), "0.22.0");
        assert_eq!(min_version([""]), "0.22.0");
        assert_eq!(min_version(["", "0.23.0"]), "0.22.0");
    }
}
