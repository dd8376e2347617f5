//! Provides [`ParamList`], an already parsed definition.
use std::str::FromStr;

use crate::{Error, Result};

/// The parameters of a transformation object definition.
///
/// This is the parsed form of a definition, a sequence of keys
/// each with optional value; the first occurrence of a key wins.
///
/// # Example
///
/// ```
/// # use gridtrans::ParamList;
/// #
/// let params = ParamList::new()
///     .set("proj", "utm")
///     .set("zone", 32)
///     .flag("south");
///
/// assert_eq!(params.get("proj"), Some("utm"));
/// assert_eq!(params.get_parsed::<u8>("zone")?, Some(32));
/// assert!(params.get_bool("south"));
/// assert!(!params.get_bool("over"));
/// # Ok::<(), gridtrans::Error>(())
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ParamList {
    params: Vec<(String, Option<String>)>,
    steps: Vec<ParamList>,
}

impl ParamList {
    /// Makes an empty [`ParamList`].
    #[inline]
    pub const fn new() -> Self {
        Self {
            params: Vec::new(),
            steps: Vec::new(),
        }
    }

    /// Adds `key=value`.
    #[inline]
    pub fn set(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.push((key.into(), Some(value.to_string())));
        self
    }

    /// Adds a flag `key`, a key with no value.
    #[inline]
    pub fn flag(mut self, key: impl Into<String>) -> Self {
        self.params.push((key.into(), None));
        self
    }

    /// Appends a pipeline step.
    #[inline]
    pub fn step(mut self, step: ParamList) -> Self {
        self.steps.push(step);
        self
    }

    /// Returns the pipeline steps in order.
    #[inline]
    pub fn steps(&self) -> &[ParamList] {
        &self.steps
    }

    /// Returns `true` if `key` present.
    #[inline]
    pub fn has(&self, key: &str) -> bool {
        self.params.iter().any(|(k, _)| k.eq(key))
    }

    /// Returns the value of `key`, [`None`] if absent or a flag.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k.eq(key))
            .and_then(|(_, v)| v.as_deref())
    }

    /// Returns the value of `key` parsed.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when the value could not be parsed.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
    {
        self.get(key)
            .map(|s| {
                s.trim()
                    .parse()
                    .map_err(|_| Error::new_invalid_parameter(key, s))
            })
            .transpose()
    }

    /// Returns the value of `key` parsed, `default` if absent.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when the value could not be parsed.
    #[inline]
    pub fn get_parsed_or<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromStr,
    {
        self.get_parsed(key).map(|v| v.unwrap_or(default))
    }

    /// Returns the value of `key` in degree converted into radians.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when the value could not be parsed.
    #[inline]
    pub fn get_radians(&self, key: &str) -> Result<Option<f64>> {
        self.get_parsed::<f64>(key)
            .map(|v| v.map(crate::utils::to_radians))
    }

    /// Returns `true` if `key` present as a flag,
    /// or with a value other than `false`, `no` or `0`.
    pub fn get_bool(&self, key: &str) -> bool {
        match self.params.iter().find(|(k, _)| k.eq(key)) {
            None => false,
            Some((_, None)) => true,
            Some((_, Some(v))) => !matches!(v.trim(), "false" | "no" | "0"),
        }
    }

    /// Returns the value of `key`.
    ///
    /// # Errors
    ///
    /// Returns [`Err`] when `key` is absent.
    #[inline]
    pub fn require(&self, key: &str) -> Result<&str> {
        self.get(key).ok_or_else(|| Error::new_missing_parameter(key))
    }

    /// Returns an iterator over the entries.
    #[inline]
    pub fn iter(&self) -> impl Iterator<Item = (&str, Option<&str>)> {
        self.params.iter().map(|(k, v)| (k.as_str(), v.as_deref()))
    }

    /// Returns the number of entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.params.len()
    }

    /// Returns `true` if no entry.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for ParamList
where
    K: Into<String>,
    V: ToString,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        iter.into_iter()
            .fold(Self::new(), |params, (k, v)| params.set(k, v))
    }
}

#[cfg(test)]
mod test {
    use crate::Errno;

    use super::*;

    #[test]
    fn test_first_wins() {
        let params: ParamList = [("k_0", "0.9996"), ("k_0", "1.0")].into_iter().collect();
        assert_eq!(params.get("k_0"), Some("0.9996"));
        assert_eq!(params.len(), 2);
    }

    #[test]
    fn test_parsed() {
        let params = ParamList::new()
            .set("x_0", " 500000 ")
            .set("zone", "x")
            .set("lon_0", 9);

        assert_eq!(params.get_parsed::<f64>("x_0").unwrap(), Some(500000.0));
        assert_eq!(params.get_parsed::<f64>("y_0").unwrap(), None);
        assert_eq!(params.get_parsed_or("y_0", 1.5).unwrap(), 1.5);
        assert_eq!(
            params.get_parsed::<u8>("zone").unwrap_err().errno(),
            Errno::InvalidArgument
        );
        assert_eq!(
            params.get_radians("lon_0").unwrap(),
            Some(9.0 * std::f64::consts::PI / 180.0)
        );
    }

    #[test]
    fn test_bool() {
        let params = ParamList::new()
            .flag("over")
            .set("south", "false")
            .set("inv", "true");
        assert!(params.get_bool("over"));
        assert!(!params.get_bool("south"));
        assert!(params.get_bool("inv"));
        assert!(!params.get_bool("missing"));
        assert!(params.has("over"));
        assert_eq!(params.get("over"), None);
    }

    #[test]
    fn test_steps() {
        let params = ParamList::new()
            .set("proj", "pipeline")
            .step(ParamList::new().set("proj", "cart"))
            .step(ParamList::new().set("proj", "cart").flag("inv"));

        assert_eq!(params.steps().len(), 2);
        assert!(params.steps()[1].get_bool("inv"));
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn test_require() {
        let params = ParamList::new().set("proj", "merc");
        assert_eq!(params.require("proj").unwrap(), "merc");
        assert_eq!(
            params.require("zone").unwrap_err().errno(),
            Errno::MissingParameter
        );
    }
}
