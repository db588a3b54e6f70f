use anyhow::Result;
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, Color, Table};
use fleetsync_types::AccountConfig;

use crate::context::AppContext;

pub async fn list_accounts(ctx: AppContext, json: bool) -> Result<()> {
    let registry = ctx.dashboard.registry();
    let statics = registry.static_accounts().to_vec();
    let dynamic = registry.dynamic_accounts();

    if json {
        let rows: Vec<_> = statics
            .iter()
            .map(|a| (a, "static"))
            .chain(dynamic.iter().map(|a| (a, "added")))
            .map(|(a, kind)| {
                serde_json::json!({
                    "label": a.label,
                    "imei": a.account_id,
                    "color": a.color,
                    "kind": kind,
                    "configured": a.has_credentials(),
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
        ctx.shutdown().await;
        return Ok(());
    }

    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_header(vec!["Label", "Login / IMEI", "Color", "Kind", "Status"]);

    for (account, kind) in statics.iter().map(|a| (a, "static")).chain(dynamic.iter().map(|a| (a, "added"))) {
        let status = if account.has_credentials() {
            Cell::new("Polled").fg(Color::Green)
        } else {
            Cell::new("No credentials").fg(Color::Yellow)
        };
        table.add_row(vec![
            Cell::new(&account.label),
            Cell::new(if account.account_id.is_empty() { "-" } else { &account.account_id }),
            Cell::new(account.color.as_deref().unwrap_or("-")),
            Cell::new(kind),
            status,
        ]);
    }

    println!("{table}");
    println!("\n{} accounts total", statics.len() + dynamic.len());
    ctx.shutdown().await;
    Ok(())
}

pub async fn add_account(
    ctx: AppContext,
    imei: String,
    password: String,
    label: String,
    color: Option<String>,
) -> Result<()> {
    let mut account = AccountConfig::new(imei, password, label);
    if let Some(color) = color {
        account = account.with_color(color);
    }

    let result = ctx.dashboard.add_account(account);
    ctx.shutdown().await;
    let added = result?;

    println!("{} Tracker {} ({}) saved", "✓".green(), added.label.green(), added.account_id);
    Ok(())
}

pub async fn remove_account(ctx: AppContext, label: &str) -> Result<()> {
    let result = ctx.dashboard.remove_account(label);
    ctx.shutdown().await;
    let removed = result?;

    println!("{} Tracker {} removed", "✓".green(), removed.label.green());
    Ok(())
}
