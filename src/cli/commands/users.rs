use serde_json::json;

use crate::cli::utils::output_success;
use crate::cli::OutputFormat;
use crate::database::models::UserStatus;
use crate::database::Store;
use crate::services::admin;

pub async fn list(store: &dyn Store, output_format: OutputFormat) -> anyhow::Result<()> {
    let users = admin::list_users(store).await?;
    let mut rows = Vec::with_capacity(users.len());
    for user in users {
        rows.push(admin::get_user(store, user.user_id).await?);
    }

    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({ "users": rows }))?);
        }
        OutputFormat::Text => {
            if rows.is_empty() {
                println!("No users registered");
                return Ok(());
            }
            println!("{:<6} {:<20} {:<30} {:<8} {}", "ID", "USERNAME", "EMAIL", "STATUS", "ROLES");
            println!("{}", "-".repeat(80));
            for row in &rows {
                println!(
                    "{:<6} {:<20} {:<30} {:<8} {}",
                    row.user.user_id,
                    row.user.username,
                    row.user.email,
                    row.user.status.as_str(),
                    row.roles.join(",")
                );
            }
        }
    }
    Ok(())
}

pub async fn promote(store: &dyn Store, username: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let user = admin::find_user_by_username(store, username).await?;
    admin::grant_admin(store, user.user_id).await?;
    output_success(
        output_format,
        &format!("Granted Admin to {}", user.username),
        Some(json!({ "userId": user.user_id })),
    )
}

pub async fn demote(store: &dyn Store, username: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let user = admin::find_user_by_username(store, username).await?;
    admin::revoke_admin(store, user.user_id).await?;
    output_success(
        output_format,
        &format!("Revoked Admin from {}", user.username),
        Some(json!({ "userId": user.user_id })),
    )
}

pub async fn block(store: &dyn Store, username: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let user = admin::find_user_by_username(store, username).await?;
    admin::set_status(store, user.user_id, UserStatus::Blocked).await?;
    output_success(output_format, &format!("Blocked {}", user.username), None)
}

pub async fn unblock(store: &dyn Store, username: &str, output_format: OutputFormat) -> anyhow::Result<()> {
    let user = admin::find_user_by_username(store, username).await?;
    admin::set_status(store, user.user_id, UserStatus::Active).await?;
    output_success(output_format, &format!("Unblocked {}", user.username), None)
}
