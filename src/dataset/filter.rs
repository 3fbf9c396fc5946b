//! Boolean event filters
//!
//! All masks have one entry per event and start out all-true. Masks are only
//! recomputed by [`Filter::update`], which reads the `filtering` section of
//! the dataset configuration.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use super::config::{Configuration, FILTERING};
use super::features::FeatureDirectory;
use crate::definitions;
use crate::error::{DcorError, Result};

#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    size: usize,
    /// Combination of all other masks
    all: Vec<bool>,
    /// Events without NaN/inf in any scalar feature
    invalid: Vec<bool>,
    /// Reserved for the caller
    manual: Vec<bool>,
    /// Box filters by feature name
    features: BTreeMap<String, Vec<bool>>,
    ones: Vec<bool>,
}

impl Filter {
    pub fn new(size: usize) -> Self {
        let ones = vec![true; size];
        Self {
            size,
            all: ones.clone(),
            invalid: ones.clone(),
            manual: ones.clone(),
            features: BTreeMap::new(),
            ones,
        }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn all(&self) -> &[bool] {
        &self.all
    }

    pub fn invalid(&self) -> &[bool] {
        &self.invalid
    }

    pub fn manual(&self) -> &[bool] {
        &self.manual
    }

    /// Manual mask; takes effect on the next [`Filter::update`]
    pub fn manual_mut(&mut self) -> &mut [bool] {
        &mut self.manual
    }

    /// Box filter mask of one feature
    pub fn feature_mask(&self, name: &str) -> Result<&[bool]> {
        if !definitions::is_feature(name) {
            return Err(DcorError::UnknownFeature(name.to_string()));
        }
        Ok(self.features.get(name).unwrap_or(&self.ones))
    }

    /// Number of events passing all filters
    pub fn included(&self) -> usize {
        self.all.iter().filter(|&&keep| keep).count()
    }

    /// Recompute all masks from the `filtering` configuration section
    ///
    /// Downloads the scalar columns needed for box filters and, when invalid
    /// events are removed, every available scalar column.
    pub fn update(&mut self, config: &Configuration, directory: &FeatureDirectory) -> Result<()> {
        let scalars: Vec<&str> = directory
            .iter()
            .filter(|name| definitions::is_scalar(name))
            .collect();

        // 1. box filters
        for &name in &scalars {
            let lower = format!("{} min", name);
            let upper = format!("{} max", name);
            let bounds = if config.contains(FILTERING, &lower) && config.contains(FILTERING, &upper) {
                let lo = config.get_f64(FILTERING, &lower)?;
                let hi = config.get_f64(FILTERING, &upper)?;
                // equal bounds (numerically, so 0 == 0.0) disable the filter
                (lo != hi).then_some((lo, hi))
            } else {
                None
            };
            match bounds {
                Some((lo, hi)) => {
                    let column = self.column(directory, name)?;
                    let mask = column.iter().map(|&x| lo <= x && x <= hi).collect();
                    debug!(feature = name, min = lo, max = hi, "Applied box filter");
                    self.features.insert(name.to_string(), mask);
                }
                None => {
                    self.features.remove(name);
                }
            }
        }

        // 2. invalid events
        self.invalid = self.ones.clone();
        if config.get_bool(FILTERING, "remove invalid events")? {
            for &name in &scalars {
                let column = self.column(directory, name)?;
                for (keep, x) in self.invalid.iter_mut().zip(column.iter()) {
                    *keep &= x.is_finite();
                }
            }
        }

        // 3. combination
        self.all = self.ones.clone();
        if config.get_bool(FILTERING, "enable filters")? {
            let masks = self
                .features
                .values()
                .chain([&self.invalid, &self.manual]);
            for mask in masks {
                for (keep, &m) in self.all.iter_mut().zip(mask) {
                    *keep &= m;
                }
            }

            let limit = config.get_int(FILTERING, "limit events")?;
            if limit > 0 {
                let mut remaining = limit as usize;
                for keep in self.all.iter_mut().filter(|keep| **keep) {
                    if remaining == 0 {
                        *keep = false;
                    } else {
                        remaining -= 1;
                    }
                }
            }
        }

        debug!(included = self.included(), size = self.size, "Updated filters");
        Ok(())
    }

    fn column(&self, directory: &FeatureDirectory, name: &str) -> Result<Arc<[f64]>> {
        let column = directory
            .get(name)?
            .into_scalar()
            .ok_or_else(|| DcorError::Config(format!("Feature '{}' is not scalar", name)))?;
        if column.len() != self.size {
            return Err(DcorError::remote(
                directory.endpoint().as_str(),
                format!(
                    "feature '{}' has {} events, expected {}",
                    name,
                    column.len(),
                    self.size
                ),
            ));
        }
        Ok(column)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::{MockTransport, QueryCache};
    use serde_json::json;

    fn setup() -> (Configuration, FeatureDirectory) {
        let mock = MockTransport::new("abc123");
        mock.set_feature_list(&["area_um", "deform", "image"]);
        mock.set_scalar_feature("area_um", &[10.0, 20.0, 30.0, 40.0]);
        mock.set_scalar_feature("deform", &[0.1, f64::NAN, 0.3, 0.4]);
        let directory = FeatureDirectory::new(Arc::new(QueryCache::new(Box::new(mock)))).unwrap();
        let config = Configuration::new(&json!({"experiment": {}})).unwrap();
        (config, directory)
    }

    #[test]
    fn test_new_is_all_true() {
        let filter = Filter::new(4);
        assert_eq!(filter.all(), &[true; 4]);
        assert_eq!(filter.included(), 4);
        assert_eq!(filter.feature_mask("area_um").unwrap(), &[true; 4]);
    }

    #[test]
    fn test_feature_mask_unknown() {
        let filter = Filter::new(4);
        assert!(matches!(
            filter.feature_mask("peter"),
            Err(DcorError::UnknownFeature(_))
        ));
    }

    #[test]
    fn test_box_filter() {
        let (mut config, directory) = setup();
        config.set(FILTERING, "area_um min", 15.0);
        config.set(FILTERING, "area_um max", 35.0);

        let mut filter = Filter::new(4);
        filter.update(&config, &directory).unwrap();
        assert_eq!(
            filter.feature_mask("area_um").unwrap(),
            &[false, true, true, false]
        );
        assert_eq!(filter.all(), &[false, true, true, false]);
    }

    #[test]
    fn test_equal_bounds_disable_box_filter() {
        let (mut config, directory) = setup();
        config.set(FILTERING, "area_um min", 0.0);
        config.set(FILTERING, "area_um max", 0.0);

        let mut filter = Filter::new(4);
        filter.update(&config, &directory).unwrap();
        assert_eq!(filter.included(), 4);
    }

    #[test]
    fn test_equal_bounds_of_mixed_number_types() {
        let (mut config, directory) = setup();
        config.set(FILTERING, "area_um min", 0);
        config.set(FILTERING, "area_um max", 0.0);

        let mut filter = Filter::new(4);
        filter.update(&config, &directory).unwrap();
        assert_eq!(filter.included(), 4);
        assert_eq!(filter.feature_mask("area_um").unwrap(), &[true; 4]);
    }

    #[test]
    fn test_remove_invalid_events() {
        let (mut config, directory) = setup();
        config.set(FILTERING, "remove invalid events", true);

        let mut filter = Filter::new(4);
        filter.update(&config, &directory).unwrap();
        assert_eq!(filter.invalid(), &[true, false, true, true]);
        assert_eq!(filter.included(), 3);
    }

    #[test]
    fn test_manual_and_disabled_filters() {
        let (mut config, directory) = setup();
        let mut filter = Filter::new(4);
        filter.manual_mut()[0] = false;
        filter.update(&config, &directory).unwrap();
        assert_eq!(filter.all(), &[false, true, true, true]);

        config.set(FILTERING, "enable filters", false);
        filter.update(&config, &directory).unwrap();
        assert_eq!(filter.included(), 4);
    }

    #[test]
    fn test_limit_events_keeps_first() {
        let (mut config, directory) = setup();
        config.set(FILTERING, "limit events", 2);
        let mut filter = Filter::new(4);
        filter.manual_mut()[0] = false;
        filter.update(&config, &directory).unwrap();
        assert_eq!(filter.all(), &[false, true, true, false]);
    }

    #[test]
    fn test_box_filter_removed_when_bounds_cleared() {
        let (mut config, directory) = setup();
        config.set(FILTERING, "deform min", 0.2);
        config.set(FILTERING, "deform max", 1.0);
        let mut filter = Filter::new(4);
        filter.update(&config, &directory).unwrap();
        assert_eq!(filter.included(), 2);

        config.set(FILTERING, "deform max", 0.2);
        filter.update(&config, &directory).unwrap();
        assert_eq!(filter.included(), 4);
    }
}
