use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use fleetsync_core::map::{format_address, AddressState};
use fleetsync_core::modules::config::{save_config, CONFIG_FILE};
use fleetsync_core::FleetSnapshot;
use fleetsync_types::FocusQuery;

use crate::context::AppContext;

pub async fn watch(mut ctx: AppContext, json: bool) -> Result<()> {
    let handle = ctx.poller.start();

    loop {
        tokio::select! {
            update = ctx.dashboard.next_update() => {
                let Some((snapshot, motion)) = update else {
                    break;
                };
                if snapshot.loading {
                    continue;
                }
                tracing::debug!(
                    "Cycle {}: {} animated, {} placed, {} removed",
                    snapshot.cycle,
                    motion.animated,
                    motion.placed,
                    motion.removed
                );
                print_snapshot(&snapshot, json)?;
            },
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, stopping");
                break;
            },
        }
    }

    handle.shutdown().await;
    ctx.shutdown().await;
    Ok(())
}

pub async fn once(ctx: AppContext, json: bool) -> Result<()> {
    ctx.poller.refresh().await;
    print_snapshot(&ctx.poller.snapshot(), json)?;
    ctx.shutdown().await;
    Ok(())
}

pub async fn focus(ctx: AppContext, label: Option<String>, imei: Option<String>, zoom: u8) -> Result<()> {
    if label.is_none() && imei.is_none() {
        anyhow::bail!("Specify --label or --imei");
    }

    ctx.poller.refresh().await;
    let outcome = ctx.dashboard.focus(&FocusQuery { label, imei }, zoom);

    match outcome.target {
        Some(target) => {
            println!("{} {}", "✓".green(), target.entity_id.green());
            println!("  lat {:.6}  lng {:.6}  zoom {}", target.lat, target.lng, target.zoom);
        },
        None => {
            let selection = outcome.selection.unwrap_or_default();
            println!("{}", format!("No entity with a position matches {selection:?}").yellow());
        },
    }

    ctx.shutdown().await;
    Ok(())
}

pub async fn address(ctx: AppContext, entity_id: &str) -> Result<()> {
    ctx.poller.refresh().await;

    match ctx.dashboard.address_for(entity_id).await {
        None => println!("{}", format!("Entity {entity_id} is not on the map").yellow()),
        Some(AddressState::Resolved(record)) => {
            let mut table = Table::new();
            table.load_preset(UTF8_FULL);
            for row in format_address(&record) {
                table.add_row(vec![Cell::new(row.label), Cell::new(row.value)]);
            }
            println!("{table}");
        },
        Some(AddressState::Failed(e)) => println!("{}", e.to_string().red()),
        Some(AddressState::Loading) => println!("{}", "Lookup already in progress".cyan()),
    }

    ctx.shutdown().await;
    Ok(())
}

pub fn show_config(ctx: &AppContext, json: bool) -> Result<()> {
    let mut config = ctx.config.clone();
    for creds in [&mut config.account_a, &mut config.account_b] {
        if !creds.password.is_empty() {
            creds.password = "********".to_string();
        }
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&config)?);
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Setting", "Value"]);
    let rows = [
        ("data_dir", ctx.data_dir.display().to_string()),
        ("base_url", config.base_url.clone()),
        ("account A", config.account_a.login.clone()),
        ("account B", config.account_b.login.clone()),
        ("poll_interval_ms", config.poll_interval_ms.to_string()),
        ("request_timeout_ms", config.request_timeout_ms.to_string()),
        ("animation_ms", config.animation_ms.to_string()),
        ("frame_interval_ms", config.frame_interval_ms.to_string()),
        ("persist_debounce_ms", config.persist_debounce_ms.to_string()),
        ("geocode_url", config.geocode_url.clone()),
        ("geocode_ttl_secs", config.geocode_ttl_secs.to_string()),
        ("geocode_language", config.geocode_language.clone()),
    ];
    for (key, value) in rows {
        table.add_row(vec![Cell::new(key), Cell::new(if value.is_empty() { "-".to_string() } else { value })]);
    }
    println!("{table}");
    Ok(())
}

pub fn write_config(ctx: &AppContext) -> Result<()> {
    save_config(&ctx.data_dir, &ctx.config)?;
    println!("{} Configuration saved to {}", "✓".green(), ctx.data_dir.join(CONFIG_FILE).display());
    Ok(())
}

/// One JSON line per snapshot; timestamps are RFC 3339 strings.
fn snapshot_json(snapshot: &FleetSnapshot) -> serde_json::Value {
    serde_json::json!({
        "cycle": snapshot.cycle,
        "completedAt": snapshot.completed_at.map(|t| t.to_rfc3339()),
        "entities": &*snapshot.entities,
        "error": snapshot.error,
    })
}

fn print_snapshot(snapshot: &FleetSnapshot, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string(&snapshot_json(snapshot))?);
        return Ok(());
    }

    let stamp = snapshot
        .completed_at
        .map(|t| t.with_timezone(&chrono::Local).format("%H:%M:%S").to_string())
        .unwrap_or_else(|| "-".to_string());
    println!("{}", format!("Cycle {} at {}", snapshot.cycle, stamp).bold());

    if snapshot.entities.is_empty() {
        println!("{}", "No entities.".yellow());
    } else {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Id", "Name", "Position", "Speed", "Heading"]);
        for entity in snapshot.entities.iter() {
            let position = if entity.is_renderable() {
                Cell::new(format!("{:.6}, {:.6}", entity.lat, entity.lng))
            } else {
                Cell::new("no fix").fg(Color::DarkGrey)
            };
            let heading = entity.heading.map_or_else(|| "-".to_string(), |h| format!("{h:.0}°"));
            table.add_row(vec![
                Cell::new(&entity.id),
                Cell::new(&entity.name),
                position,
                Cell::new(&entity.description),
                Cell::new(heading),
            ]);
        }
        println!("{table}");
    }

    if let Some(error) = &snapshot.error {
        println!("{} {}", "✗".red(), error.red());
    }
    Ok(())
}
