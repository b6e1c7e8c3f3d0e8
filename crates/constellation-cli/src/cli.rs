//! Command-line interface definition using clap.

use std::time::Duration;

use clap::{Parser, Subcommand};

use constellation_client::{ClientConfig, API_TIMEOUT_ENV, API_URL_ENV};
use constellation_models::{
    CiType, Criticality, DirectionFilter, Environment, LifecycleState, RelationshipSpec,
    RelationshipType,
};

/// Constellation - browse and edit the CMDB from the terminal
#[derive(Parser, Debug)]
#[command(name = "constellation")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Base URL of the CMDB API
    #[arg(long, env = API_URL_ENV, global = true)]
    pub api_url: Option<String>,

    /// Request timeout in seconds
    #[arg(long, env = API_TIMEOUT_ENV, global = true)]
    pub timeout: Option<u64>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List configuration items
    List {
        /// Free-text search
        search: Option<String>,

        /// Filter by CI type
        #[arg(short = 't', long = "type")]
        ci_type: Option<CiType>,

        /// Filter by environment
        #[arg(short, long)]
        environment: Option<Environment>,

        /// Filter by criticality
        #[arg(short, long)]
        criticality: Option<Criticality>,

        /// Page size
        #[arg(short, long)]
        limit: Option<u32>,

        /// Page offset
        #[arg(long)]
        offset: Option<u32>,

        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show one configuration item
    Show {
        /// Item ID
        #[arg(required = true)]
        id: String,

        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Create a configuration item
    Create {
        /// Item name
        #[arg(required = true)]
        name: String,

        /// CI type
        #[arg(short = 't', long = "type")]
        ci_type: Option<CiType>,

        /// Criticality
        #[arg(short, long)]
        criticality: Option<Criticality>,

        /// Environment
        #[arg(short, long)]
        environment: Option<Environment>,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Relationship to create with the item, as TARGET_ID:TYPE (repeatable)
        #[arg(short, long = "relate", value_parser = parse_relation)]
        relate: Vec<RelationshipSpec>,
    },

    /// Update fields of a configuration item
    Update {
        /// Item ID
        #[arg(required = true)]
        id: String,

        /// New name
        #[arg(short, long)]
        name: Option<String>,

        /// New CI type
        #[arg(short = 't', long = "type")]
        ci_type: Option<CiType>,

        /// New criticality
        #[arg(short, long)]
        criticality: Option<Criticality>,

        /// New environment
        #[arg(short, long)]
        environment: Option<Environment>,

        /// New lifecycle state
        #[arg(short, long)]
        lifecycle: Option<LifecycleState>,

        /// New description
        #[arg(short, long)]
        description: Option<String>,
    },

    /// Delete a configuration item
    Delete {
        /// Item ID
        #[arg(required = true)]
        id: String,
    },

    /// List relationships of one item, or all relationships
    Relationships {
        /// Item ID (lists every relationship if omitted)
        id: Option<String>,

        /// Direction relative to the item (incoming, outgoing, both)
        #[arg(short, long, default_value = "both")]
        direction: DirectionFilter,

        /// Maximum relationships when listing all
        #[arg(short, long)]
        limit: Option<u32>,

        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Create a relationship between two items
    Link {
        /// Source item ID
        #[arg(required = true)]
        from: String,

        /// Target item ID
        #[arg(required = true)]
        to: String,

        /// Relationship type (e.g. DEPENDS_ON)
        #[arg(short = 't', long = "type", default_value = "DEPENDS_ON")]
        relationship_type: RelationshipType,

        /// Description
        #[arg(short, long)]
        description: Option<String>,

        /// Item whose relationships to show after linking
        #[arg(long)]
        select: Option<String>,
    },

    /// Delete a relationship
    Unlink {
        /// Relationship ID
        #[arg(required = true)]
        id: String,
    },

    /// Show what is impacted if an item fails
    Impact {
        /// Item ID
        #[arg(required = true)]
        id: String,

        /// Maximum traversal depth
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show what an item depends on
    Dependencies {
        /// Item ID
        #[arg(required = true)]
        id: String,

        /// Maximum traversal depth
        #[arg(short, long)]
        depth: Option<u32>,

        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show items with concentrated dependency risk
    BusFactor {
        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Show graph statistics
    Stats {
        /// Output format (table, json, brief)
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Check API health
    Health,
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Brief,
}

/// Parses `TARGET_ID:TYPE`.
fn parse_relation(value: &str) -> Result<RelationshipSpec, String> {
    let (target, kind) = value
        .rsplit_once(':')
        .ok_or_else(|| format!("expected TARGET_ID:TYPE, got '{}'", value))?;
    if target.is_empty() {
        return Err(format!("missing target id in '{}'", value));
    }
    let relationship_type: RelationshipType = kind.parse().map_err(|e| format!("{}", e))?;
    Ok(RelationshipSpec::new(target, relationship_type))
}

impl Cli {
    /// Returns the log level based on verbosity.
    pub fn log_level(&self) -> tracing::Level {
        match self.verbose {
            0 => tracing::Level::WARN,
            1 => tracing::Level::INFO,
            2 => tracing::Level::DEBUG,
            _ => tracing::Level::TRACE,
        }
    }

    /// Builds the client configuration from flags, falling back to defaults.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::default();
        if let Some(url) = self.api_url.as_deref().filter(|u| !u.trim().is_empty()) {
            config.base_url = url.to_string();
        }
        if let Some(secs) = self.timeout {
            config = config.with_timeout(Duration::from_secs(secs));
        }
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_list() {
        let cli = Cli::parse_from([
            "constellation",
            "list",
            "web",
            "--criticality",
            "high",
            "--limit",
            "20",
            "--format",
            "json",
        ]);
        match cli.command {
            Commands::List {
                search,
                criticality,
                limit,
                format,
                ..
            } => {
                assert_eq!(search.as_deref(), Some("web"));
                assert_eq!(criticality, Some(Criticality::High));
                assert_eq!(limit, Some(20));
                assert_eq!(format, OutputFormat::Json);
            }
            _ => panic!("Expected List command"),
        }
    }

    #[test]
    fn test_cli_parse_create_with_relations() {
        let cli = Cli::parse_from([
            "constellation",
            "create",
            "orders-api",
            "--type",
            "APPLICATION",
            "--relate",
            "ci-db:DEPENDS_ON",
            "--relate",
            "ci-host:runs_on",
        ]);
        match cli.command {
            Commands::Create {
                name,
                ci_type,
                relate,
                ..
            } => {
                assert_eq!(name, "orders-api");
                assert_eq!(ci_type, Some(CiType::Application));
                assert_eq!(relate.len(), 2);
                assert_eq!(relate[0].target_ci_id, "ci-db");
                assert_eq!(relate[1].relationship_type, RelationshipType::RunsOn);
            }
            _ => panic!("Expected Create command"),
        }
    }

    #[test]
    fn test_cli_rejects_bad_relation() {
        assert!(Cli::try_parse_from(["constellation", "create", "x", "--relate", "ci-1"]).is_err());
        assert!(
            Cli::try_parse_from(["constellation", "create", "x", "--relate", "ci-1:LIKES"]).is_err()
        );
    }

    #[test]
    fn test_cli_parse_link_defaults() {
        let cli = Cli::parse_from(["constellation", "link", "ci-1", "ci-2"]);
        match cli.command {
            Commands::Link {
                from,
                to,
                relationship_type,
                ..
            } => {
                assert_eq!(from, "ci-1");
                assert_eq!(to, "ci-2");
                assert_eq!(relationship_type, RelationshipType::DependsOn);
            }
            _ => panic!("Expected Link command"),
        }
    }

    #[test]
    fn test_cli_parse_relationships_direction() {
        let cli = Cli::parse_from(["constellation", "relationships", "ci-1", "-d", "incoming"]);
        match cli.command {
            Commands::Relationships { id, direction, .. } => {
                assert_eq!(id.as_deref(), Some("ci-1"));
                assert_eq!(direction, DirectionFilter::Incoming);
            }
            _ => panic!("Expected Relationships command"),
        }
    }

    #[test]
    fn test_client_config_from_flags() {
        let cli = Cli::parse_from([
            "constellation",
            "--api-url",
            "https://cmdb.example.com",
            "--timeout",
            "3",
            "health",
        ]);
        let config = cli.client_config();
        assert_eq!(config.base_url, "https://cmdb.example.com");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_cli_verbose() {
        let cli = Cli::parse_from(["constellation", "-vv", "stats"]);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.log_level(), tracing::Level::DEBUG);
    }

    #[test]
    fn test_cli_help() {
        Cli::command().debug_assert();
    }
}
