use serde::{Deserialize, Serialize};

use crate::error::DashboardError;

/// DOM id of the embedded JSON blob carrying page options.
pub const OPTIONS_ELEMENT_ID: &str = "measure-options";

/// Organisation granularity the page is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrgType {
    Practice,
    #[serde(alias = "CCG", alias = "sicbl")]
    Ccg,
    #[serde(alias = "PCN")]
    Pcn,
    #[serde(alias = "STP", alias = "icb")]
    Stp,
    RegionalTeam,
}

impl OrgType {
    /// Key used for this org type inside global `percentiles`/`cost_savings` maps.
    pub const fn api_key(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Ccg => "ccg",
            Self::Pcn => "pcn",
            Self::Stp => "stp",
            Self::RegionalTeam => "regional_team",
        }
    }

    pub const fn human(self) -> &'static str {
        match self {
            Self::Practice => "practice",
            Self::Ccg => "Sub-ICB location",
            Self::Pcn => "PCN",
            Self::Stp => "ICB",
            Self::RegionalTeam => "regional team",
        }
    }

    /// Upper zoom bound when fitting the map to this org type's features.
    pub const fn map_max_zoom(self) -> u8 {
        match self {
            Self::Practice => 12,
            _ => 5,
        }
    }
}

/// Page layout mode: one org across many measures, or one measure across many orgs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RollUpBy {
    #[serde(rename = "measure_id")]
    Measure,
    #[serde(rename = "org_id")]
    Org,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Options {
    pub panel_measures_url: String,
    pub global_measures_url: String,
    #[serde(default)]
    pub org_location_url: Option<String>,
    pub org_type: OrgType,
    pub roll_up_by: RollUpBy,
    #[serde(default)]
    pub org_id: Option<String>,
    #[serde(default)]
    pub org_name: Option<String>,
    #[serde(default)]
    pub measure: Option<String>,
    /// Link template for a single org/measure page; `{org}` and `{measure}` are substituted.
    #[serde(default)]
    pub one_entity_url: Option<String>,
    #[serde(default)]
    pub map_access_token: Option<String>,
}

impl Options {
    pub fn from_json(text: &str) -> Result<Self, DashboardError> {
        serde_json::from_str(text).map_err(DashboardError::Options)
    }

    pub fn sort_toggle_enabled(&self) -> bool {
        self.roll_up_by == RollUpBy::Measure
    }

    pub fn entity_url(&self, org_id: &str, measure_id: &str) -> Option<String> {
        self.one_entity_url.as_ref().map(|template| {
            template
                .replace("{org}", org_id)
                .replace("{measure}", measure_id)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{OrgType, Options, RollUpBy};

    const BLOB: &str = r#"{
        "panelMeasuresUrl": "/api/1.0/measure_by_practice/?org=A81001",
        "globalMeasuresUrl": "/api/1.0/measure/",
        "orgLocationUrl": "/api/1.0/org_location/?q=A81001",
        "orgType": "practice",
        "rollUpBy": "measure_id",
        "orgId": "A81001",
        "oneEntityUrl": "/measure/{measure}/practice/{org}/"
    }"#;

    #[test]
    fn parses_embedded_blob() {
        let options = Options::from_json(BLOB).expect("options");
        assert_eq!(options.org_type, OrgType::Practice);
        assert_eq!(options.roll_up_by, RollUpBy::Measure);
        assert_eq!(
            options.org_location_url.as_deref(),
            Some("/api/1.0/org_location/?q=A81001")
        );
        assert!(options.sort_toggle_enabled());
        assert_eq!(options.org_name, None);
    }

    #[test]
    fn accepts_legacy_org_type_spellings() {
        let blob = BLOB.replace("\"practice\"", "\"CCG\"");
        let options = Options::from_json(&blob).expect("options");
        assert_eq!(options.org_type, OrgType::Ccg);
        assert_eq!(options.org_type.api_key(), "ccg");
    }

    #[test]
    fn org_roll_up_disables_sort_toggle() {
        let blob = BLOB.replace("measure_id", "org_id");
        let options = Options::from_json(&blob).expect("options");
        assert_eq!(options.roll_up_by, RollUpBy::Org);
        assert!(!options.sort_toggle_enabled());
    }

    #[test]
    fn map_zoom_cap_depends_on_granularity() {
        assert_eq!(OrgType::Practice.map_max_zoom(), 12);
        assert_eq!(OrgType::Ccg.map_max_zoom(), 5);
        assert_eq!(OrgType::RegionalTeam.map_max_zoom(), 5);
    }

    #[test]
    fn builds_entity_url() {
        let options = Options::from_json(BLOB).expect("options");
        assert_eq!(
            options.entity_url("A81001", "ace").as_deref(),
            Some("/measure/ace/practice/A81001/")
        );
    }

    #[test]
    fn rejects_missing_urls() {
        assert!(Options::from_json(r#"{"orgType":"practice","rollUpBy":"org_id"}"#).is_err());
    }
}
