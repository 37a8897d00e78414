//! Best-effort `robots.txt` parsing.
//!
//! Deliberately minimal: a flat list of `Disallow`/`Allow` prefixes under
//! the `User-agent: *` group (and a group matching our own agent string,
//! if present). No crawl-delay, sitemap, or wildcard/`$` support — this is
//! a politeness signal, not a compliance engine, and the frontier's own
//! per-host rate limiting is the hard guarantee (§4.3).
pub struct RobotsRules {
    disallow: Vec<String>,
    allow: Vec<String>,
}

impl RobotsRules {
    pub fn allow_all() -> Self {
        RobotsRules { disallow: Vec::new(), allow: Vec::new() }
    }

    /// Parse a `robots.txt` body, collecting rules from the `*` group and
    /// any group matching `user_agent` (case-insensitive, by prefix).
    pub fn parse(body: &str, user_agent: &str) -> Self {
        let mut disallow = Vec::new();
        let mut allow = Vec::new();
        let mut applies = false;

        for line in body.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let Some((key, value)) = line.split_once(':') else { continue };
            let key = key.trim().to_ascii_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    applies = value == "*" || user_agent.to_ascii_lowercase().starts_with(&value.to_ascii_lowercase());
                }
                "disallow" if applies && !value.is_empty() => disallow.push(value.to_string()),
                "allow" if applies && !value.is_empty() => allow.push(value.to_string()),
                _ => {}
            }
        }

        RobotsRules { disallow, allow }
    }

    /// `true` unless `path` matches a `Disallow` prefix with no more
    /// specific (longer) `Allow` prefix overriding it.
    pub fn is_allowed(&self, path: &str) -> bool {
        let best_disallow = self.disallow.iter().filter(|p| path.starts_with(p.as_str())).map(|p| p.len()).max();
        let best_allow = self.allow.iter().filter(|p| path.starts_with(p.as_str())).map(|p| p.len()).max();
        match (best_disallow, best_allow) {
            (Some(d), Some(a)) => a >= d,
            (Some(_), None) => false,
            _ => true,
        }
    }
}
