//! The station identifier shared by every CAMELS table.

use std::borrow::Borrow;
use std::fmt;
use std::fmt::{Display, Formatter};

/// Width of a USGS gauge identifier in the CAMELS files.
pub const STATION_ID_WIDTH: usize = 8;

/// A zero-padded USGS gauge identifier, e.g. `"01013500"`.
///
/// This is the join key between the basin geometries, the attribute tables
/// and the streamflow files. Identifiers shorter than [`STATION_ID_WIDTH`] are
/// left-padded with `'0'`; longer ones are kept as they are.
///
/// # Examples
///
/// ```
/// use camels_convert::StationId;
///
/// assert_eq!(StationId::new("1013500").as_str(), "01013500");
/// assert_eq!(StationId::from_numeric(1013500.0).as_str(), "01013500");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StationId(String);

impl StationId {
    pub fn new(raw: &str) -> Self {
        Self(format!("{:0>width$}", raw.trim(), width = STATION_ID_WIDTH))
    }

    /// Builds an identifier from a numeric shapefile field (`hru_id` is stored as `N`).
    pub fn from_numeric(raw: f64) -> Self {
        Self::new(&format!("{}", raw.round() as i64))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for StationId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for StationId {
    fn from(raw: &str) -> Self {
        Self::new(raw)
    }
}

impl Borrow<str> for StationId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for StationId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pads_short_identifiers_with_zeros() {
        for raw in ["1", "1013500", "12345678", "  2046000 "] {
            let id = StationId::new(raw);
            assert_eq!(id.as_str().len(), STATION_ID_WIDTH, "id {raw:?}");
            assert!(id.as_str().ends_with(raw.trim()));
            assert!(id.as_str()[..STATION_ID_WIDTH - raw.trim().len()]
                .chars()
                .all(|c| c == '0'));
        }
    }

    #[test]
    fn keeps_long_identifiers() {
        assert_eq!(StationId::new("123456789").as_str(), "123456789");
    }

    #[test]
    fn numeric_ids_drop_the_fraction() {
        assert_eq!(StationId::from_numeric(2_046_000.0).as_str(), "02046000");
        assert_eq!(StationId::from_numeric(14_400_000.0).as_str(), "14400000");
    }
}
