//! Command handlers for CLI subcommands.
//!
//! Every handler runs one or more store actions and renders the resulting
//! store state. Rendering is split into `render_*` functions that return the
//! text so it can be checked without a terminal.

use std::fmt::Write as _;

use tracing::{info, warn};

use constellation_client::CmdbApi;
use constellation_models::presentation::{asset_color, asset_display_name, valid_criticalities};
use constellation_models::{
    BusFactorAnalysis, DependencyAnalysis, Direction, Endpoints, GraphStats, ImpactAnalysis, Item,
    ItemDraft, ItemId, ItemQuery, ItemWithRelationshipsDraft, NewRelationship, ReachedItem,
    Relationship, RelationshipId,
};
use constellation_store::{CmdbStore, StoreSnapshot};

use crate::cli::{Commands, OutputFormat};

/// Result type for command operations.
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;

/// Execute a CLI command against the store.
pub async fn execute(command: Commands, store: &CmdbStore) -> Result<()> {
    match command {
        Commands::List {
            search,
            ci_type,
            environment,
            criticality,
            limit,
            offset,
            format,
        } => {
            let query = ItemQuery {
                search,
                ci_type,
                environment,
                criticality,
                limit,
                offset,
            };
            cmd_list(store, &query, format).await
        }
        Commands::Show { id, format } => cmd_show(store, &ItemId::from(id), format).await,
        Commands::Create {
            name,
            ci_type,
            criticality,
            environment,
            description,
            relate,
        } => {
            let mut draft = ItemDraft::named(name);
            draft.ci_type = ci_type;
            draft.criticality = criticality;
            draft.environment = environment;
            draft.description = description;
            cmd_create(store, draft, relate).await
        }
        Commands::Update {
            id,
            name,
            ci_type,
            criticality,
            environment,
            lifecycle,
            description,
        } => {
            let draft = ItemDraft {
                name,
                ci_type,
                criticality,
                environment,
                lifecycle_state: lifecycle,
                description,
                ..ItemDraft::default()
            };
            cmd_update(store, &ItemId::from(id), &draft).await
        }
        Commands::Delete { id } => cmd_delete(store, &ItemId::from(id)).await,
        Commands::Relationships {
            id,
            direction,
            limit,
            format,
        } => {
            match id {
                Some(id) => {
                    store
                        .fetch_relationships(&ItemId::from(id), direction)
                        .await?;
                }
                None => {
                    store.fetch_all_relationships(limit).await?;
                }
            }
            print!("{}", render_relationships(&store.relationships().await, format)?);
            Ok(())
        }
        Commands::Link {
            from,
            to,
            relationship_type,
            description,
            select,
        } => {
            let mut request = NewRelationship::new(from, to, relationship_type);
            request.description = description;
            cmd_link(store, &request, select.map(ItemId::from)).await
        }
        Commands::Unlink { id } => {
            store
                .delete_relationship(&RelationshipId::from(id.as_str()))
                .await?;
            println!("Deleted relationship {}", id);
            Ok(())
        }
        Commands::Impact { id, depth, format } => {
            let analysis = store
                .fetch_impact_analysis(&ItemId::from(id), depth)
                .await?;
            print!("{}", render_impact(&analysis, format)?);
            Ok(())
        }
        Commands::Dependencies { id, depth, format } => {
            let analysis = store
                .fetch_dependency_analysis(&ItemId::from(id), depth)
                .await?;
            print!("{}", render_dependencies(&analysis, format)?);
            Ok(())
        }
        Commands::BusFactor { format } => {
            let analysis = store.fetch_bus_factor_analysis().await?;
            print!("{}", render_bus_factor(&analysis, format)?);
            Ok(())
        }
        Commands::Stats { format } => {
            let stats = store.fetch_graph_stats().await?;
            print!("{}", render_stats(&stats, format)?);
            Ok(())
        }
        Commands::Health => cmd_health(store).await,
    }
}

async fn cmd_list(store: &CmdbStore, query: &ItemQuery, format: OutputFormat) -> Result<()> {
    let page = store.fetch_items(query).await?;
    info!(returned = page.cis.len(), total = page.total_count, "Listed items");
    let snapshot = store.snapshot().await;
    print!("{}", render_items(&snapshot, page.total_count, format)?);
    Ok(())
}

async fn cmd_show(store: &CmdbStore, id: &ItemId, format: OutputFormat) -> Result<()> {
    let item = store.fetch_item(id).await?;
    print!("{}", render_item(&item, format)?);
    Ok(())
}

async fn cmd_create(
    store: &CmdbStore,
    draft: ItemDraft,
    relate: Vec<constellation_models::RelationshipSpec>,
) -> Result<()> {
    if relate.is_empty() {
        let item = store.create_item(&draft).await?;
        println!("Created item '{}' ({})", item.name, item.id);
        return Ok(());
    }

    let mut request = ItemWithRelationshipsDraft::new(draft);
    request.relationships = relate;
    let result = store.create_item_with_relationships(&request).await?;

    println!("Created item '{}' ({})", result.ci.name, result.ci.id);
    for created in &result.created_relationships {
        println!(
            "  + {} -> {}",
            created.relationship_type, created.target_ci_id
        );
    }
    for failed in &result.failed_relationships {
        warn!(target_ci = %failed.target_ci_id, error = %failed.error, "Relationship not created");
        println!(
            "  ! {} -> {}: {}",
            failed.relationship_type, failed.target_ci_id, failed.error
        );
    }
    Ok(())
}

async fn cmd_update(store: &CmdbStore, id: &ItemId, draft: &ItemDraft) -> Result<()> {
    if draft.is_empty() {
        return Err("Nothing to update: pass at least one field".into());
    }
    let item = store.update_item(id, draft).await?;
    println!("Updated item '{}' ({})", item.name, item.id);
    Ok(())
}

async fn cmd_delete(store: &CmdbStore, id: &ItemId) -> Result<()> {
    store.delete_item(id).await?;
    println!("Deleted item {}", id);
    Ok(())
}

async fn cmd_link(
    store: &CmdbStore,
    request: &NewRelationship,
    select: Option<ItemId>,
) -> Result<()> {
    if let Some(id) = &select {
        store.fetch_item(id).await?;
    }
    let created = store.create_relationship(request).await?;
    println!(
        "Linked {} -[{}]-> {}",
        created.from_ci, created.relationship_type, created.to_ci
    );

    if select.is_some() {
        let relationships = store.relationships().await;
        if !relationships.is_empty() {
            print!("{}", render_relationships(&relationships, OutputFormat::Table)?);
        }
    }
    Ok(())
}

async fn cmd_health(store: &CmdbStore) -> Result<()> {
    let health = store.api().health().await?;
    let service = health.service.as_deref().unwrap_or("constellation-api");
    let version = health.version.as_deref().unwrap_or("unknown");
    if health.is_healthy() {
        println!("{} {} is {}", service, version, health.status);
        Ok(())
    } else {
        Err(format!("{} reported status '{}'", service, health.status).into())
    }
}

// ----------------------------------------------------------------------
// Rendering
// ----------------------------------------------------------------------

/// Renders the mirrored item collection with derived counts.
pub fn render_items(snapshot: &StoreSnapshot, total: u64, format: OutputFormat) -> Result<String> {
    let items = &snapshot.items;
    let mut out = String::new();
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                writeln!(out, "No items found.")?;
                return Ok(out);
            }
            writeln!(
                out,
                "{:<36}  {:<24}  {:<18}  {:<9}  ENV",
                "ID", "NAME", "TYPE", "CRIT"
            )?;
            writeln!(out, "{}", "-".repeat(100))?;
            for item in items {
                writeln!(
                    out,
                    "{:<36}  {:<24}  {:<18}  {:<9}  {}",
                    truncate(item.id.as_str(), 36),
                    truncate(&item.name, 24),
                    truncate(&asset_display_name(item), 18),
                    item.criticality,
                    item.environment
                )?;
            }
            writeln!(
                out,
                "\n{} of {} item(s): {} critical, {} high",
                snapshot.item_count(),
                total,
                snapshot.critical_items().len(),
                snapshot.high_items().len()
            )?;
        }
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(items)?)?;
        }
        OutputFormat::Brief => {
            for item in items {
                writeln!(out, "{}\t{}", item.id, item.name)?;
            }
        }
    }
    Ok(out)
}

/// Renders one item.
pub fn render_item(item: &Item, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(item)?)?,
        OutputFormat::Brief => writeln!(out, "{}\t{}\t{}", item.id, item.name, item.criticality)?,
        OutputFormat::Table => {
            writeln!(out, "Item: {} ({})", item.name, item.id)?;
            writeln!(out, "  Type: {} [{}]", asset_display_name(item), asset_color(item))?;
            writeln!(out, "  Criticality: {}", item.criticality)?;
            writeln!(out, "  Environment: {}", item.environment)?;
            writeln!(out, "  Lifecycle: {}", item.lifecycle_state)?;
            if let Some(description) = &item.description {
                writeln!(out, "  Description: {}", description)?;
            }
            for (label, value) in [
                ("Hostname", &item.hostname),
                ("IP", &item.ip_address),
                ("Owner", &item.owner),
                ("Location", &item.location),
            ] {
                if let Some(value) = value {
                    writeln!(out, "  {}: {}", label, value)?;
                }
            }
            let allowed: Vec<&str> = valid_criticalities(item).iter().map(|c| c.as_str()).collect();
            writeln!(out, "  Allowed criticality: {}", allowed.join(", "))?;
            if let Some(created) = &item.created_at {
                writeln!(out, "  Created: {}", created)?;
            }
        }
    }
    Ok(out)
}

/// Renders relationships in either endpoint shape.
pub fn render_relationships(relationships: &[Relationship], format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => {
            writeln!(out, "{}", serde_json::to_string_pretty(relationships)?)?;
        }
        OutputFormat::Brief => {
            for rel in relationships {
                writeln!(out, "{}\t{}\t{}", rel.id, rel.relationship_type, endpoints_label(rel))?;
            }
        }
        OutputFormat::Table => {
            if relationships.is_empty() {
                writeln!(out, "No relationships found.")?;
                return Ok(out);
            }
            writeln!(out, "{:<36}  {:<16}  ENDPOINTS", "ID", "TYPE")?;
            writeln!(out, "{}", "-".repeat(90))?;
            for rel in relationships {
                writeln!(
                    out,
                    "{:<36}  {:<16}  {}",
                    truncate(rel.id.as_str(), 36),
                    rel.relationship_type,
                    endpoints_label(rel)
                )?;
            }
            writeln!(out, "\n{} relationship(s)", relationships.len())?;
        }
    }
    Ok(out)
}

fn endpoints_label(rel: &Relationship) -> String {
    match &rel.endpoints {
        Endpoints::Relative {
            direction,
            related_ci,
        } => {
            let arrow = match direction {
                Direction::Incoming => "<-",
                Direction::Outgoing => "->",
            };
            format!("{} {}", arrow, related_ci.label())
        }
        Endpoints::Absolute { from_ci, to_ci } => {
            format!("{} -> {}", from_ci.label(), to_ci.label())
        }
    }
}

/// Renders an impact analysis.
pub fn render_impact(analysis: &ImpactAnalysis, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(analysis)?));
    }
    let mut out = String::new();
    writeln!(
        out,
        "Impact of {}: {} item(s) within depth {}, risk score {:.1}",
        analysis.source_ci,
        analysis.total_impacted,
        analysis.max_depth_analyzed,
        analysis.risk_score
    )?;
    if format == OutputFormat::Table {
        for (level, count) in &analysis.criticality_breakdown {
            writeln!(out, "  {:<9} {}", level, count)?;
        }
    }
    write_reached(&mut out, &analysis.impacted_cis, format)?;
    Ok(out)
}

/// Renders a dependency analysis.
pub fn render_dependencies(analysis: &DependencyAnalysis, format: OutputFormat) -> Result<String> {
    if format == OutputFormat::Json {
        return Ok(format!("{}\n", serde_json::to_string_pretty(analysis)?));
    }
    let mut out = String::new();
    writeln!(
        out,
        "{} depends on {} item(s) within depth {}",
        analysis.source_ci, analysis.total_dependencies, analysis.max_depth_analyzed
    )?;
    write_reached(&mut out, &analysis.dependencies, format)?;
    Ok(out)
}

fn write_reached(out: &mut String, reached: &[ReachedItem], format: OutputFormat) -> Result<()> {
    for entry in reached {
        match format {
            OutputFormat::Brief => writeln!(out, "{}\t{}", entry.ci_id, entry.distance)?,
            _ => writeln!(
                out,
                "  [{}] {:<24} {:<9} via {}",
                entry.distance,
                truncate(&entry.ci_name, 24),
                or_dash(entry.criticality.as_ref()),
                entry.relationship_chain.join(" > ")
            )?,
        }
    }
    Ok(())
}

/// Renders a bus-factor analysis.
pub fn render_bus_factor(analysis: &BusFactorAnalysis, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(analysis)?)?,
        OutputFormat::Brief => {
            for entry in &analysis.high_risk_cis {
                writeln!(out, "{}\t{:.1}", entry.ci_id, entry.risk_score)?;
            }
        }
        OutputFormat::Table => {
            writeln!(
                out,
                "{} high-risk item(s) out of {} analysed",
                analysis.high_risk_cis.len(),
                analysis.total_analyzed
            )?;
            for entry in &analysis.high_risk_cis {
                writeln!(
                    out,
                    "  {:<24} {:<12} {:<9} {:>4} dependents  risk {:.1}",
                    truncate(&entry.ci_name, 24),
                    or_dash(entry.ci_type.as_ref()),
                    or_dash(entry.criticality.as_ref()),
                    entry.dependency_count,
                    entry.risk_score
                )?;
            }
        }
    }
    Ok(out)
}

/// Renders graph statistics.
pub fn render_stats(stats: &GraphStats, format: OutputFormat) -> Result<String> {
    let mut out = String::new();
    match format {
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string_pretty(stats)?)?,
        OutputFormat::Brief => writeln!(
            out,
            "{}\t{}\t{}",
            stats.total_cis, stats.total_relationships, stats.unique_relationship_types
        )?,
        OutputFormat::Table => {
            writeln!(out, "Items:              {}", stats.total_cis)?;
            writeln!(out, "Relationships:      {}", stats.total_relationships)?;
            writeln!(out, "Relationship types: {}", stats.unique_relationship_types)?;
            for (kind, count) in &stats.relationship_type_breakdown {
                writeln!(out, "  {:<20} {}", kind, count)?;
            }
        }
    }
    Ok(out)
}

fn or_dash<T: std::fmt::Display>(value: Option<&T>) -> String {
    value.map_or_else(|| "-".to_string(), ToString::to_string)
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
