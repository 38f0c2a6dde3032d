//! Site settings served by `settings/`

use serde::{Deserialize, Serialize};

use crate::config::SiteConfig;

/// Site-wide settings
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SiteSettings {
    #[serde(default)]
    pub site_name: Option<String>,
    #[serde(default)]
    pub site_description: Option<String>,
    /// Logo URL
    #[serde(default)]
    pub logo: Option<String>,
    #[serde(default)]
    pub contact_email: Option<String>,
}

impl SiteSettings {
    /// Fill missing values from the local site configuration
    pub fn with_defaults(self, defaults: &SiteConfig) -> Self {
        let non_empty = |value: Option<String>| value.filter(|s| !s.trim().is_empty());
        Self {
            site_name: non_empty(self.site_name).or_else(|| Some(defaults.name.clone())),
            site_description: non_empty(self.site_description)
                .or_else(|| Some(defaults.description.clone())),
            logo: non_empty(self.logo),
            contact_email: non_empty(self.contact_email),
        }
    }

    pub fn name(&self) -> &str {
        self.site_name.as_deref().unwrap_or("C-News")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_defaults_fills_gaps() {
        let defaults = SiteConfig::default();
        let settings = SiteSettings {
            site_name: Some("  ".to_string()),
            site_description: Some("Daily news".to_string()),
            ..SiteSettings::default()
        }
        .with_defaults(&defaults);

        assert_eq!(settings.name(), defaults.name);
        assert_eq!(settings.site_description.as_deref(), Some("Daily news"));
        assert!(settings.logo.is_none());
    }
}
