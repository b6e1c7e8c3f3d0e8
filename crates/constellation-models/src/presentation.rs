//! Display lookups for asset categories.
//!
//! Each lookup is a plain match over a closed vocabulary with an explicit
//! default arm for values the table does not cover.

use crate::item::{Criticality, Environment, IntangibleType, Item};

/// Colour used when no specific colour is defined.
pub const DEFAULT_COLOR: &str = "#6B7280";

/// Returns the display colour (hex) for an item.
///
/// Intangible assets are coloured by sub-type, tangible ones by CI type.
pub fn asset_color(item: &Item) -> &'static str {
    if item.is_intangible() {
        return item
            .intangible_type
            .as_ref()
            .map_or(DEFAULT_COLOR, intangible_color);
    }

    match item.ci_type.as_str().to_ascii_lowercase().as_str() {
        "server" | "hardware" => "#3B82F6",
        "database" => "#10B981",
        "application" => "#8B5CF6",
        "network" => "#F59E0B",
        "storage" => "#EF4444",
        "service" => "#06B6D4",
        _ => DEFAULT_COLOR,
    }
}

fn intangible_color(kind: &IntangibleType) -> &'static str {
    match kind {
        IntangibleType::Human => "#8B5CF6",
        IntangibleType::Team => "#6366F1",
        IntangibleType::Role => "#7C3AED",
        IntangibleType::Policy => "#DC2626",
        IntangibleType::Procedure => "#EA580C",
        IntangibleType::Standard => "#D97706",
        IntangibleType::License => "#059669",
        IntangibleType::Contract => "#0D9488",
        IntangibleType::Sla => "#0891B2",
        IntangibleType::Process => "#1D4ED8",
        IntangibleType::Workflow => "#2563EB",
        IntangibleType::Knowledge => "#7C2D12",
        IntangibleType::Documentation => "#92400E",
        IntangibleType::VirtualMachine => "#3B82F6",
        IntangibleType::Container => "#06B6D4",
        IntangibleType::Software => "#8B5CF6",
        IntangibleType::Api => "#10B981",
        IntangibleType::Microservice => "#F59E0B",
        IntangibleType::Other(_) => DEFAULT_COLOR,
    }
}

/// Returns a human readable kind for an item ("Person", "SLA", or the CI type).
pub fn asset_display_name(item: &Item) -> String {
    let label = match (item.is_intangible(), &item.intangible_type) {
        (true, Some(kind)) => intangible_label(kind),
        _ => None,
    };
    label.map_or_else(|| item.ci_type.to_string(), str::to_string)
}

fn intangible_label(kind: &IntangibleType) -> Option<&'static str> {
    let label = match kind {
        IntangibleType::Human => "Person",
        IntangibleType::Team => "Team",
        IntangibleType::Role => "Role",
        IntangibleType::Policy => "Policy",
        IntangibleType::Procedure => "Procedure",
        IntangibleType::Standard => "Standard",
        IntangibleType::License => "License",
        IntangibleType::Contract => "Contract",
        IntangibleType::Sla => "SLA",
        IntangibleType::Process => "Process",
        IntangibleType::Workflow => "Workflow",
        IntangibleType::Knowledge => "Knowledge",
        IntangibleType::Documentation => "Documentation",
        IntangibleType::VirtualMachine => "Virtual Machine",
        IntangibleType::Container => "Container",
        IntangibleType::Software => "Software",
        IntangibleType::Api => "API",
        IntangibleType::Microservice => "Microservice",
        IntangibleType::Other(_) => return None,
    };
    Some(label)
}

/// Environments an item may be placed in.
///
/// Intangible assets use organisational scopes instead of deployment stages.
pub fn valid_environments(item: &Item) -> Vec<Environment> {
    if item.is_intangible() {
        return vec![
            Environment::Production,
            Environment::Other("GLOBAL".to_string()),
            Environment::Other("CORPORATE".to_string()),
        ];
    }
    vec![
        Environment::Production,
        Environment::Staging,
        Environment::Development,
        Environment::Testing,
    ]
}

/// Criticality levels an item may be assigned.
///
/// Policies and licenses are never LOW.
pub fn valid_criticalities(item: &Item) -> Vec<Criticality> {
    match &item.intangible_type {
        Some(IntangibleType::Policy | IntangibleType::License) if item.is_intangible() => vec![
            Criticality::Critical,
            Criticality::High,
            Criticality::Medium,
        ],
        _ => Criticality::ALL.to_vec(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::item::{AssetCategory, CiType};

    fn item(ci_type: &str) -> Item {
        Item::new("ci-1", "x", Criticality::Medium).with_ci_type(ci_type)
    }

    #[test]
    fn test_tangible_colors() {
        assert_eq!(asset_color(&item("DATABASE")), "#10B981");
        assert_eq!(asset_color(&item("server")), "#3B82F6");
        assert_eq!(asset_color(&item("DATASET")), DEFAULT_COLOR);
    }

    #[test]
    fn test_intangible_colors_and_fallback() {
        let policy = item("GENERIC").with_intangible_type(IntangibleType::Policy);
        assert_eq!(asset_color(&policy), "#DC2626");

        let unknown = item("GENERIC").with_intangible_type(IntangibleType::from("guild"));
        assert_eq!(asset_color(&unknown), DEFAULT_COLOR);

        let mut no_subtype = item("GENERIC");
        no_subtype.category = Some(AssetCategory::Intangible);
        assert_eq!(asset_color(&no_subtype), DEFAULT_COLOR);
    }

    #[test]
    fn test_display_names() {
        let person = item("GENERIC").with_intangible_type(IntangibleType::Human);
        assert_eq!(asset_display_name(&person), "Person");
        assert_eq!(asset_display_name(&item("APPLICATION")), "APPLICATION");

        let unknown = item("IDENTITY").with_intangible_type(IntangibleType::from("guild"));
        assert_eq!(asset_display_name(&unknown), CiType::Identity.to_string());
    }

    #[test]
    fn test_valid_environments() {
        assert_eq!(valid_environments(&item("SERVICE")).len(), 4);

        let team = item("GENERIC").with_intangible_type(IntangibleType::Team);
        assert!(valid_environments(&team).contains(&Environment::Other("GLOBAL".to_string())));
    }

    #[test]
    fn test_valid_criticalities() {
        let license = item("GENERIC").with_intangible_type(IntangibleType::License);
        assert!(!valid_criticalities(&license).contains(&Criticality::Low));

        let human = item("GENERIC").with_intangible_type(IntangibleType::Human);
        assert_eq!(valid_criticalities(&human).len(), 4);
    }
}
