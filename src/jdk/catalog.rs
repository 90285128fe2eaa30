use anyhow::{bail, Context, Result};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use super::JdkSource;
use crate::arch::Architecture;

pub const DISTRIBUTION_URL_KEY: &str = "distributionUrl";

/// File under the catalog root naming the release upstream currently pins.
const CURRENT_RELEASE_FILE: &str = "current";

/// Lookup table laid out as `<root>/<release>/<arch>`, each file a
/// properties file with a `distributionUrl` entry.
#[derive(Debug, Clone)]
pub struct JdkCatalog {
    root: PathBuf,
    release_override: Option<String>,
}

impl JdkCatalog {
    pub fn new(root: impl Into<PathBuf>, release_override: Option<String>) -> Self {
        Self {
            root: root.into(),
            release_override,
        }
    }
}

impl JdkSource for JdkCatalog {
    fn release(&self) -> Result<String> {
        let release = match &self.release_override {
            Some(release) => release.trim().to_string(),
            None => {
                let path = self.root.join(CURRENT_RELEASE_FILE);
                fs::read_to_string(&path)
                    .with_context(|| format!("reading pinned JDK release '{}'", path.display()))?
                    .trim()
                    .to_string()
            }
        };
        ensure_single_component(&release)?;
        Ok(release)
    }

    fn download_link(&self, release: &str, arch: Architecture) -> Result<String> {
        ensure_single_component(release)?;
        let path = self.root.join(release).join(arch.as_str());
        if !path.is_file() {
            bail!(
                "JDK release '{}' has no {} distribution ({} not found)",
                release,
                arch,
                path.display()
            );
        }
        let raw = fs::read_to_string(&path)
            .with_context(|| format!("reading JDK descriptor '{}'", path.display()))?;
        parse_properties(&raw)
            .remove(DISTRIBUTION_URL_KEY)
            .filter(|url| !url.is_empty())
            .with_context(|| {
                format!(
                    "JDK descriptor '{}' has no {} entry",
                    path.display(),
                    DISTRIBUTION_URL_KEY
                )
            })
    }
}

/// Release ids become directory names; reject anything that could escape the catalog.
fn ensure_single_component(release: &str) -> Result<()> {
    let mut components = Path::new(release).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => bail!("invalid JDK release identifier '{}'", release),
    }
}

/// Parse Java properties text: `#`/`!` comments, `=`/`:` separators,
/// backslash line continuations, `\t`-style and `\uXXXX` escapes.
pub fn parse_properties(raw: &str) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    let mut logical = String::new();

    for line in raw.lines() {
        let line = line.trim_start();
        if logical.is_empty() && (line.is_empty() || line.starts_with('#') || line.starts_with('!'))
        {
            continue;
        }
        if ends_with_continuation(line) {
            logical.push_str(&line[..line.len() - 1]);
            continue;
        }
        logical.push_str(line);
        insert_entry(&mut entries, &logical);
        logical.clear();
    }
    if !logical.is_empty() {
        insert_entry(&mut entries, &logical);
    }
    entries
}

fn ends_with_continuation(line: &str) -> bool {
    line.chars().rev().take_while(|c| *c == '\\').count() % 2 == 1
}

fn insert_entry(entries: &mut BTreeMap<String, String>, logical: &str) {
    let mut key = String::new();
    let mut chars = logical.chars();
    let mut found_separator = false;
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                push_unescaped(&mut key, next, &mut chars);
            }
        } else if c == '=' || c == ':' || c.is_whitespace() {
            found_separator = true;
            break;
        } else {
            key.push(c);
        }
    }
    let rest: String = chars.collect();
    let value = if found_separator {
        let rest = rest.trim_start();
        let rest = rest
            .strip_prefix('=')
            .or_else(|| rest.strip_prefix(':'))
            .unwrap_or(rest);
        unescape_all(rest.trim())
    } else {
        String::new()
    };
    if !key.is_empty() {
        entries.insert(key, value);
    }
}

/// Decode the escape whose introducing backslash was already consumed.
/// A malformed `\uXXXX` is kept as literal text.
fn push_unescaped(out: &mut String, c: char, chars: &mut std::str::Chars<'_>) {
    match c {
        't' => out.push('\t'),
        'n' => out.push('\n'),
        'r' => out.push('\r'),
        'f' => out.push('\x0c'),
        'u' => {
            let digits: String = chars.clone().take(4).collect();
            let decoded = (digits.len() == 4 && digits.chars().all(|d| d.is_ascii_hexdigit()))
                .then(|| u32::from_str_radix(&digits, 16).ok())
                .flatten()
                .and_then(char::from_u32);
            match decoded {
                Some(decoded) => {
                    out.push(decoded);
                    for _ in 0..4 {
                        chars.next();
                    }
                }
                None => out.push('u'),
            }
        }
        other => out.push(other),
    }
}

fn unescape_all(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut chars = value.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            if let Some(next) = chars.next() {
                push_unescaped(&mut out, next, &mut chars);
            }
        } else {
            out.push(c);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const RELEASE: &str = "jdk-22.0.1+8";

    fn catalog_with(archs: &[&str]) -> TempDir {
        let temp = TempDir::new().unwrap();
        fs::write(temp.path().join("current"), format!("{RELEASE}\n")).unwrap();
        let release_dir = temp.path().join(RELEASE);
        fs::create_dir_all(&release_dir).unwrap();
        for arch in archs {
            fs::write(
                release_dir.join(arch),
                format!(
                    "# Temurin {arch}\ndistributionUrl=https://github.com/adoptium/{arch}.tar.gz\n\
                     distributionSha256Sum=abc\n"
                ),
            )
            .unwrap();
        }
        temp
    }

    #[test]
    fn release_defaults_to_pinned_current() {
        let temp = catalog_with(&[]);
        let catalog = JdkCatalog::new(temp.path(), None);
        assert_eq!(catalog.release().unwrap(), RELEASE);
    }

    #[test]
    fn release_override_skips_current_file() {
        let temp = TempDir::new().unwrap();
        let catalog = JdkCatalog::new(temp.path(), Some("jdk-21.0.3+9".to_string()));
        assert_eq!(catalog.release().unwrap(), "jdk-21.0.3+9");
    }

    #[test]
    fn release_override_cannot_escape_catalog() {
        let temp = TempDir::new().unwrap();
        let catalog = JdkCatalog::new(temp.path(), Some("../etc".to_string()));
        assert!(catalog.release().is_err());
    }

    #[test]
    fn every_listed_architecture_resolves_to_its_url() {
        let temp = catalog_with(&["amd64", "arm64", "ppc64le"]);
        let catalog = JdkCatalog::new(temp.path(), None);
        for arch in [
            Architecture::Amd64,
            Architecture::Arm64,
            Architecture::Ppc64le,
        ] {
            assert_eq!(
                catalog.download_link(RELEASE, arch).unwrap(),
                format!("https://github.com/adoptium/{arch}.tar.gz")
            );
        }
    }

    #[test]
    fn missing_architecture_file_fails() {
        let temp = catalog_with(&["amd64", "arm64"]);
        let catalog = JdkCatalog::new(temp.path(), None);
        let err = catalog
            .download_link(RELEASE, Architecture::Ppc64le)
            .unwrap_err();
        assert!(err.to_string().contains("no ppc64le distribution"));
    }

    #[test]
    fn descriptor_without_url_fails() {
        let temp = catalog_with(&[]);
        fs::write(temp.path().join(RELEASE).join("amd64"), "other=1\n").unwrap();
        let catalog = JdkCatalog::new(temp.path(), None);
        assert!(catalog.download_link(RELEASE, Architecture::Amd64).is_err());
    }

    #[test]
    fn properties_decode_unicode_escapes() {
        let parsed = parse_properties(
            "distribution\\u0055rl=https\\u003a//example.com/jdk\\u002Dx64.tar.gz\n\
             broken=a\\u12zz\n",
        );
        assert_eq!(
            parsed.get("distributionUrl").map(String::as_str),
            Some("https://example.com/jdk-x64.tar.gz")
        );
        assert_eq!(parsed.get("broken").map(String::as_str), Some("au12zz"));
    }

    #[test]
    fn properties_handle_escapes_separators_and_continuations() {
        let parsed = parse_properties(
            "! comment\n\
             distributionUrl = https\\://example.com/jdk.tar.gz\n\
             name: temurin\n\
             long=first,\\\n    second\n",
        );
        assert_eq!(
            parsed.get("distributionUrl").map(String::as_str),
            Some("https://example.com/jdk.tar.gz")
        );
        assert_eq!(parsed.get("name").map(String::as_str), Some("temurin"));
        assert_eq!(parsed.get("long").map(String::as_str), Some("first,second"));
    }
}
