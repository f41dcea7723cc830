use std::{any::type_name, collections::BTreeMap, fs, path::Path, str::FromStr};
use tracing::debug;

use crate::errors::PropertiesErrorKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `key=value` or `key: value` lines, `#` and `!` start a comment
    Properties,
    /// Tables are flattened into dotted keys, array items into `key[i]`
    Toml,
}

impl Format {
    #[must_use]
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::Toml,
            _ => Self::Properties,
        }
    }
}

/// Flat property store consulted by conditions and injected into constructors.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
    map: BTreeMap<String, String>,
}

impl Properties {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// # Errors
    /// Returns [`PropertiesErrorKind`] if the file can't be read or parsed.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), PropertiesErrorKind> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| PropertiesErrorKind::Io {
            path: path.to_path_buf(),
            source,
        })?;
        self.load_str(&content, Format::from_path(path))?;

        debug!(path = %path.display(), "Properties loaded");
        Ok(())
    }

    /// # Errors
    /// Returns [`PropertiesErrorKind`] if the content can't be parsed.
    pub fn load_str(&mut self, content: &str, format: Format) -> Result<(), PropertiesErrorKind> {
        match format {
            Format::Properties => self.load_lines(content),
            Format::Toml => {
                let table = content.parse::<toml::Table>()?;
                for (key, value) in table {
                    self.flatten(key, value);
                }
                Ok(())
            }
        }
    }

    fn load_lines(&mut self, content: &str) -> Result<(), PropertiesErrorKind> {
        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
                continue;
            }

            let Some(pos) = line.find(['=', ':']) else {
                return Err(PropertiesErrorKind::Syntax {
                    line: index + 1,
                    content: line.to_owned(),
                });
            };
            let (key, value) = (line[..pos].trim(), line[pos + 1..].trim());
            if key.is_empty() {
                return Err(PropertiesErrorKind::Syntax {
                    line: index + 1,
                    content: line.to_owned(),
                });
            }
            self.set(key, value);
        }
        Ok(())
    }

    fn flatten(&mut self, key: String, value: toml::Value) {
        use toml::Value as V;

        match value {
            V::Table(table) => {
                for (child, value) in table {
                    self.flatten(format!("{key}.{child}"), value);
                }
            }
            V::Array(items) => {
                for (index, value) in items.into_iter().enumerate() {
                    self.flatten(format!("{key}[{index}]"), value);
                }
            }
            V::String(value) => self.set(key, value),
            V::Integer(value) => self.set(key, value),
            V::Float(value) => self.set(key, value),
            V::Boolean(value) => self.set(key, value),
            V::Datetime(value) => self.set(key, value),
        }
    }

    #[inline]
    pub fn set(&mut self, key: impl Into<String>, value: impl ToString) {
        self.map.insert(key.into(), value.to_string());
    }

    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.map.get(key).map(String::as_str)
    }

    /// # Errors
    /// Returns [`PropertiesErrorKind::Parse`] if the value exists but isn't a valid `T`.
    pub fn get_as<T: FromStr>(&self, key: &str) -> Result<Option<T>, PropertiesErrorKind> {
        let Some(value) = self.get(key) else {
            return Ok(None);
        };
        value.parse().map(Some).map_err(|_| PropertiesErrorKind::Parse {
            key: key.to_owned(),
            value: value.to_owned(),
            type_name: type_name::<T>(),
        })
    }

    #[inline]
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.map.keys().map(String::as_str)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.map.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::{Format, Properties};
    use crate::errors::PropertiesErrorKind;

    use std::io::Write as _;
    use tracing_test::traced_test;

    #[test]
    fn test_load_lines() {
        let mut props = Properties::new();
        props
            .load_str(
                "# comment\n! another\n\nserver.port = 8080\nserver.host: localhost\nempty=\n",
                Format::Properties,
            )
            .unwrap();

        assert_eq!(props.len(), 3);
        assert_eq!(props.get("server.port"), Some("8080"));
        assert_eq!(props.get("server.host"), Some("localhost"));
        assert_eq!(props.get("empty"), Some(""));
        assert_eq!(props.get_as::<u16>("server.port").unwrap(), Some(8080));
        assert_eq!(props.get_as::<u16>("missing").unwrap(), None);
    }

    #[test]
    fn test_load_lines_syntax_error() {
        let mut props = Properties::new();
        let err = props.load_str("valid=1\ninvalid line\n", Format::Properties).unwrap_err();

        assert!(matches!(err, PropertiesErrorKind::Syntax { line: 2, .. }));
    }

    #[test]
    fn test_load_toml() {
        let mut props = Properties::new();
        props
            .load_str(
                r#"
                name = "app"

                [db]
                pool = 4
                ratio = 0.5
                enabled = true
                hosts = ["a", "b"]
                "#,
                Format::Toml,
            )
            .unwrap();

        assert_eq!(props.get("name"), Some("app"));
        assert_eq!(props.get_as::<u32>("db.pool").unwrap(), Some(4));
        assert_eq!(props.get_as::<bool>("db.enabled").unwrap(), Some(true));
        assert_eq!(props.get("db.ratio"), Some("0.5"));
        assert_eq!(props.get("db.hosts[1]"), Some("b"));
    }

    #[test]
    fn test_parse_error() {
        let mut props = Properties::new();
        props.set("port", "eighty");

        let err = props.get_as::<u16>("port").unwrap_err();
        assert!(matches!(err, PropertiesErrorKind::Parse { ref key, .. } if key == "port"));
    }

    #[test]
    #[traced_test]
    fn test_load_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[server]\nport = 9000").unwrap();

        let mut props = Properties::new();
        props.load(file.path()).unwrap();

        assert_eq!(props.get("server.port"), Some("9000"));
        assert!(props.load("/definitely/not/here.properties").is_err());
    }
}
