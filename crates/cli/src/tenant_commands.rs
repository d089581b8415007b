use {anyhow::Result, clap::Subcommand};

use crate::context::{Context, TenantSource};

#[derive(Subcommand)]
pub enum TenantAction {
    /// Store the tenant id sent with every backend request.
    Set {
        /// Company UUID; pass an empty string to clear it.
        company_uuid: String,
    },
    /// Show the tenant id in effect and where it came from.
    Show,
}

pub fn handle_tenant(ctx: &Context, action: TenantAction) -> Result<()> {
    match action {
        TenantAction::Set { company_uuid } => {
            ctx.gateway.set_company_uuid(&company_uuid)?;
            let stored = ctx.gateway.company_uuid();
            if stored.is_empty() {
                println!("Tenant cleared.");
            } else {
                println!("Tenant set to {stored}.");
            }
            if matches!(ctx.tenant_source, TenantSource::Flag | TenantSource::Config) {
                println!("Note: a --company-uuid flag or configured value still takes precedence.");
            }
        },
        TenantAction::Show => {
            let company_uuid = ctx.gateway.company_uuid();
            let source = match ctx.tenant_source {
                TenantSource::Flag => "--company-uuid",
                TenantSource::Config => "configuration",
                TenantSource::Stored => "stored",
                TenantSource::Unset => "unset",
            };
            if company_uuid.is_empty() {
                println!("No tenant set; requests are scoped to the session.");
            } else {
                println!("{company_uuid} ({source})");
            }
        },
    }
    Ok(())
}
